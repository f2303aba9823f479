//! Newtypes for the two id spaces involved in a merge.
//!
//! A donor glyph id and a merged glyph id are both `u16` on disk; keeping them
//! apart stops a donor id from being written into the merged font unmapped.

use std::fmt::{self, Display, Formatter};

use read_fonts::types::{GlyphId16, Tag};

macro_rules! u16_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u16);

        impl $name {
            pub const fn new(id: u16) -> Self {
                Self(id)
            }

            pub const fn to_u16(self) -> u16 {
                self.0
            }

            pub const fn to_u32(self) -> u32 {
                self.0 as u32
            }

            pub fn to_glyph_id16(self) -> GlyphId16 {
                GlyphId16::new(self.0)
            }
        }

        impl From<GlyphId16> for $name {
            fn from(id: GlyphId16) -> Self {
                Self(id.to_u16())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $label, self.0)
            }
        }
    };
}

u16_id!(
    /// A glyph id in one of the input fonts
    GlyphId,
    "GID"
);

u16_id!(
    /// A glyph id in the merged font
    MergedGlyphId,
    "MGID"
);

impl MergedGlyphId {
    /// Base glyphs keep their ids in the merged font.
    pub const fn from_base(gid: GlyphId) -> Self {
        Self(gid.0)
    }
}

/// A Unicode codepoint
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Codepoint(pub u32);

impl Codepoint {
    pub const fn new(cp: u32) -> Self {
        Self(cp)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl Display for Codepoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "U+{:04X}", self.0)
    }
}

/// A font table tag parsed from user input.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableTag(Tag);

impl TableTag {
    /// Shorter strings are padded with spaces; longer ones are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        (bytes.len() <= 4).then(|| {
            let mut arr = [b' '; 4];
            arr[..bytes.len()].copy_from_slice(bytes);
            Self(Tag::new(&arr))
        })
    }

    pub fn tag(self) -> Tag {
        self.0
    }
}

impl Display for TableTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display() {
        assert_eq!(GlyphId::new(42).to_string(), "GID42");
        assert_eq!(MergedGlyphId::from_base(GlyphId::new(7)).to_string(), "MGID7");
    }

    #[test]
    fn test_codepoint() {
        let cp = Codepoint::new(0x4E00);
        assert_eq!(cp.to_char(), Some('一'));
        assert_eq!(cp.to_string(), "U+4E00");
        assert_eq!(Codepoint::new(0xD800).to_char(), None);
    }

    #[test]
    fn test_table_tag() {
        assert_eq!(TableTag::parse("cvt").unwrap().to_string(), "cvt ");
        assert_eq!(TableTag::parse("OS/2").unwrap().tag(), Tag::new(b"OS/2"));
        assert!(TableTag::parse("toolong").is_none());
    }
}
