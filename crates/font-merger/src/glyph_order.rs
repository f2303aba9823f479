//! Glyph names and the names each input font gives its glyphs.

use std::{
    borrow::Borrow,
    fmt::{Display, Formatter, Result},
    ops::Deref,
};

use read_fonts::{FontRef, TableProvider, types::GlyphId16};

/// A glyph name as written to the merged `post` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphName(String);

impl GlyphName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name used for glyphs the font leaves unnamed.
    pub fn synthesized(gid: u16) -> Self {
        Self(format!("glyph{gid:05}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `name.N`, used to keep names unique in the merged font.
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}.{n}", self.0))
    }
}

impl Deref for GlyphName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for GlyphName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for GlyphName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Display for GlyphName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GlyphName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Names from the font's `post` table, one per glyph.
///
/// `None` marks a glyph without a real name (`post` version 3, missing
/// table or out-of-range index). Such glyphs never match by name.
pub fn post_glyph_names(font: &FontRef) -> Vec<Option<GlyphName>> {
    let num_glyphs = font.maxp().map(|m| m.num_glyphs()).unwrap_or_default();
    let post = font.post().ok();

    (0..num_glyphs)
        .map(|gid| {
            post.as_ref()
                .and_then(|p| p.glyph_name(GlyphId16::new(gid)))
                .filter(|name| !name.is_empty())
                .map(GlyphName::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_synthesized_name() {
        assert_eq!(GlyphName::synthesized(42), "glyph00042");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(GlyphName::new("A").with_suffix(1), "A.1");
    }

    #[test]
    fn test_glyph_name_borrow_lookup() {
        let mut map: HashMap<GlyphName, i32> = HashMap::new();
        map.insert(GlyphName::new("uni4E00"), 1);
        assert_eq!(map.get("uni4E00"), Some(&1));
    }

    #[test]
    fn test_post_names_of_font_without_post() {
        let font = FontRef::new(font_test_data::CMAP12_FONT1).unwrap();
        let names = post_glyph_names(&font);
        assert_eq!(names.len(), font.maxp().unwrap().num_glyphs() as usize);
    }
}
