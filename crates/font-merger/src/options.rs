//! Options for merging a donor font into a base font

use read_fonts::types::Tag;

use crate::types::TableTag;

#[derive(Debug, Clone)]
pub struct Options {
    /// Keep donor kerning pairs that touch glyphs the base already owned
    pub preserve_cross_font_kerning: bool,

    /// Merge fonts with different unitsPerEm, keeping the base's units
    pub allow_mismatched_units: bool,

    /// Tables to drop from the merged font
    pub drop_tables: Vec<TableTag>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            preserve_cross_font_kerning: true,
            allow_mismatched_units: false,
            drop_tables: Vec::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preserve_cross_font_kerning(mut self, preserve: bool) -> Self {
        self.preserve_cross_font_kerning = preserve;
        self
    }

    pub fn allow_mismatched_units(mut self, allow: bool) -> Self {
        self.allow_mismatched_units = allow;
        self
    }

    /// Add tables to drop (accepts any iterable of string-like values)
    pub fn drop_tables(mut self, tables: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.drop_tables = tables
            .into_iter()
            .filter_map(|s| TableTag::parse(s.as_ref()))
            .collect();
        self
    }

    pub fn should_drop_tag(&self, tag: Tag) -> bool {
        self.drop_tables.iter().any(|t| t.tag() == tag)
    }
}
