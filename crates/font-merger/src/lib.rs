mod context;
mod error;
mod glyph_order;
mod merger;
mod options;
mod tables;
mod types;

pub use context::{DonorGlyph, GlyphPlan, MergeContext};
pub use error::{MergeError, Result};
pub use glyph_order::{GlyphName, post_glyph_names};
pub use merger::{MergeSummary, Merger};
pub use options::Options;
pub use tables::cmap::read_mappings;
pub use types::{Codepoint, GlyphId, MergedGlyphId, TableTag};

/// Merge `donor` into `base` with default options.
///
/// # Example
///
/// ```no_run
/// use fontfill_font_merger::merge_fonts_bytes;
///
/// let base = std::fs::read("NotoSansJP-Regular.ttf").unwrap();
/// let donor = std::fs::read("SourceCodePro-Regular.ttf").unwrap();
/// let merged = merge_fonts_bytes(&base, &donor).unwrap();
/// ```
pub fn merge_fonts_bytes(base: &[u8], donor: &[u8]) -> Result<Vec<u8>> {
    Merger::default().merge(base, donor)
}
