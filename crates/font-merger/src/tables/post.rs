//! post table merging

use read_fonts::{FontRef, TableProvider};
use write_fonts::tables::post::Post;

use crate::{Result, context::GlyphPlan};

/// A version 2.0 post table carrying the merged glyph names, with the base's
/// metrics and flags.
pub fn merge_post(base: &FontRef, plan: &GlyphPlan) -> Result<Post> {
    let mut post = Post::new_v2(plan.names().iter().map(|n| n.as_str()));

    if let Ok(base_post) = base.post() {
        post.italic_angle = base_post.italic_angle();
        post.underline_position = base_post.underline_position();
        post.underline_thickness = base_post.underline_thickness();
        post.is_fixed_pitch = base_post.is_fixed_pitch();
        post.min_mem_type42 = base_post.min_mem_type42();
        post.max_mem_type42 = base_post.max_mem_type42();
        post.min_mem_type1 = base_post.min_mem_type1();
        post.max_mem_type1 = base_post.max_mem_type1();
    }

    Ok(post)
}
