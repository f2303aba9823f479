//! Generic font table manipulation utilities.

pub mod kern;

use anyhow::Result;
use read_fonts::{FontRef, TableProvider, types::Tag};
use write_fonts::FontBuilder;

/// `OS/2.fsType` value for "Restricted License embedding".
pub const FS_TYPE_RESTRICTED_LICENSE: u16 = 0x0002;

/// Low nibble of `fsType`, holding the mutually exclusive usage permissions.
const FS_TYPE_USAGE_MASK: u16 = 0x000F;

/// Rewrite font data by applying a transformation function.
///
/// Copies all tables from the source font except those listed in `skip`, then
/// calls `f` to modify or add tables. The function receives a reference to the
/// source font and a mutable builder that already contains the copied tables.
pub fn rewrite_font(
    data: &[u8],
    skip: &[Tag],
    f: impl FnOnce(&FontRef, &mut FontBuilder) -> Result<()>,
) -> Result<Vec<u8>> {
    let font = FontRef::new(data)?;
    let mut builder = FontBuilder::new();

    for record in font.table_directory.table_records() {
        let tag = record.tag();
        if skip.contains(&tag) {
            continue;
        }
        if let Some(table_data) = font.table_data(tag) {
            builder.add_raw(tag, table_data.as_bytes().to_vec());
        }
    }

    f(&font, &mut builder)?;
    Ok(builder.build())
}

/// Replace (or remove) a single table in the target font.
///
/// With `Some(bytes)` the table is added or overwritten; with `None` it is
/// removed. All other tables are copied unchanged.
pub fn replace_table(target_data: &[u8], tag: Tag, table: Option<&[u8]>) -> Result<Vec<u8>> {
    rewrite_font(target_data, &[tag], |_, builder| {
        if let Some(bytes) = table {
            builder.add_raw(tag, bytes.to_vec());
        }
        Ok(())
    })
}

/// Raw bytes of a table, if the font carries it.
pub fn table_bytes(data: &[u8], tag: Tag) -> Result<Option<Vec<u8>>> {
    let font = FontRef::new(data)?;
    Ok(font.table_data(tag).map(|d| d.as_bytes().to_vec()))
}

/// Embedding permissions declared by `OS/2.fsType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbeddingPermissions(u16);

impl EmbeddingPermissions {
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Read the permissions of a font; a font without `OS/2` is installable.
    pub fn of(font: &FontRef) -> Self {
        Self(font.os2().map(|os2| os2.fs_type()).unwrap_or(0))
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// The font may not be modified or embedded without the vendor's permission.
    pub const fn is_restricted(self) -> bool {
        self.0 & FS_TYPE_USAGE_MASK == FS_TYPE_RESTRICTED_LICENSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_license() {
        assert!(EmbeddingPermissions::from_bits(0x0002).is_restricted());
        // bitmap-only flag does not change the usage permission
        assert!(EmbeddingPermissions::from_bits(0x0202).is_restricted());
        assert!(!EmbeddingPermissions::from_bits(0x0004).is_restricted());
        assert!(!EmbeddingPermissions::from_bits(0x0008).is_restricted());
    }

    #[test]
    fn test_rewrite_keeps_tables() {
        let data = font_test_data::CMAP12_FONT1;
        let before = FontRef::new(data).unwrap().table_directory.num_tables();
        let rewritten = rewrite_font(data, &[], |_, _| Ok(())).unwrap();
        let after = FontRef::new(&rewritten).unwrap().table_directory.num_tables();
        assert_eq!(before, after);
    }

    #[test]
    fn test_replace_table_removes() {
        let data = font_test_data::CMAP12_FONT1;
        let tag = Tag::new(b"cmap");
        let removed = replace_table(data, tag, None).unwrap();
        assert!(table_bytes(&removed, tag).unwrap().is_none());
    }
}
