//! Font naming metadata (the `name` table).

use std::fmt::{self, Display, Formatter};

use anyhow::Result;
use read_fonts::{FontRef, TableProvider, types::{NameId, Tag}};
use write_fonts::tables::name::{Name, NameRecord};

use fontfill_font_ops::{replace_table, rewrite_font, table_bytes};

const NAME: Tag = Tag::new(b"name");

const PLATFORM_WINDOWS: u16 = 3;

/// One record of the name table, decoded to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameEntry {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub value: String,
}

impl NameEntry {
    /// Name ID 1.
    pub const FAMILY: u16 = 1;
    /// Name ID 2.
    pub const SUBFAMILY: u16 = 2;
    /// Name ID 4.
    pub const FULL_NAME: u16 = 4;

    /// A Windows/Unicode BMP/en-US record.
    pub fn windows(name_id: u16, value: impl Into<String>) -> Self {
        Self {
            platform_id: PLATFORM_WINDOWS,
            encoding_id: 1,
            language_id: 0x409,
            name_id,
            value: value.into(),
        }
    }
}

impl Display for NameEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}/{:#06x}] {}: {}",
            self.platform_id, self.encoding_id, self.language_id, self.name_id, self.value
        )
    }
}

/// Decode every name record of a font, in table order.
///
/// Records whose strings cannot be decoded are skipped. A font without a name
/// table yields an empty list.
pub fn name_entries(data: &[u8]) -> Result<Vec<NameEntry>> {
    let font = FontRef::new(data)?;
    let Ok(name) = font.name() else {
        return Ok(Vec::new());
    };

    Ok(name
        .name_record()
        .iter()
        .filter_map(|record| {
            let value = record.string(name.string_data()).ok()?.chars().collect();
            Some(NameEntry {
                platform_id: record.platform_id(),
                encoding_id: record.encoding_id(),
                language_id: record.language_id(),
                name_id: record.name_id().to_u16(),
                value,
            })
        })
        .collect())
}

/// The best display name for logs: Windows full name, then any full name,
/// then the family name.
pub fn display_name(entries: &[NameEntry]) -> Option<&str> {
    let by_id = |id: u16| {
        entries
            .iter()
            .filter(|e| e.name_id == id)
            .max_by_key(|e| e.platform_id == PLATFORM_WINDOWS)
    };
    by_id(NameEntry::FULL_NAME)
        .or_else(|| by_id(NameEntry::FAMILY))
        .map(|e| e.value.as_str())
}

/// Replace the target's whole name table with the source's.
///
/// The source table is copied byte for byte, so every platform, encoding and
/// language survives, including records this crate cannot decode. When the
/// source has no name table the target ends up with an empty one.
pub fn copy_name_table(source_data: &[u8], target_data: &[u8]) -> Result<Vec<u8>> {
    match table_bytes(source_data, NAME)? {
        Some(bytes) => replace_table(target_data, NAME, Some(&bytes)),
        None => set_name_entries(target_data, &[]),
    }
}

/// Replace the target's name table with one built from `entries`.
pub fn set_name_entries(data: &[u8], entries: &[NameEntry]) -> Result<Vec<u8>> {
    let records: Vec<NameRecord> = entries
        .iter()
        .map(|e| {
            NameRecord::new(
                e.platform_id,
                e.encoding_id,
                e.language_id,
                NameId::new(e.name_id),
                e.value.clone().into(),
            )
        })
        .collect();
    let name = Name::new(records);

    rewrite_font(data, &[NAME], |_, builder| {
        builder.add_table(&name)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use write_fonts::FontBuilder;

    use super::*;

    fn font_with_names(entries: &[NameEntry]) -> Vec<u8> {
        let bare = {
            let mut builder = FontBuilder::new();
            builder.add_raw(Tag::new(b"cvt "), vec![0u8, 0]);
            builder.build()
        };
        set_name_entries(&bare, entries).unwrap()
    }

    #[test]
    fn test_name_entries_read_back() {
        let entries = vec![
            NameEntry::windows(NameEntry::FAMILY, "Source Han"),
            NameEntry::windows(NameEntry::SUBFAMILY, "Regular"),
        ];
        let font = font_with_names(&entries);
        assert_eq!(name_entries(&font).unwrap(), entries);
    }

    #[test]
    fn test_copy_name_table_replaces_everything() {
        let source = font_with_names(&[NameEntry::windows(NameEntry::FAMILY, "Donor")]);
        let target = font_with_names(&[
            NameEntry::windows(NameEntry::FAMILY, "Base"),
            NameEntry::windows(NameEntry::FULL_NAME, "Base Regular"),
        ]);

        let copied = copy_name_table(&source, &target).unwrap();
        assert_eq!(name_entries(&copied).unwrap(), name_entries(&source).unwrap());
        assert_eq!(
            table_bytes(&copied, NAME).unwrap(),
            table_bytes(&source, NAME).unwrap()
        );
    }

    #[test]
    fn test_copy_from_font_without_names() {
        let mut builder = FontBuilder::new();
        builder.add_raw(Tag::new(b"cvt "), vec![0u8, 0]);
        let source = builder.build();
        let target = font_with_names(&[NameEntry::windows(NameEntry::FAMILY, "Base")]);

        let copied = copy_name_table(&source, &target).unwrap();
        assert!(name_entries(&copied).unwrap().is_empty());
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let entries = vec![
            NameEntry::windows(NameEntry::FAMILY, "Base"),
            NameEntry::windows(NameEntry::FULL_NAME, "Base Bold"),
        ];
        assert_eq!(display_name(&entries), Some("Base Bold"));
        assert_eq!(display_name(&entries[..1]), Some("Base"));
        assert_eq!(display_name(&[]), None);
    }

    #[test]
    fn test_entry_display() {
        let entry = NameEntry::windows(NameEntry::FAMILY, "Base");
        assert_eq!(entry.to_string(), "[3/1/0x0409] 1: Base");
    }
}
