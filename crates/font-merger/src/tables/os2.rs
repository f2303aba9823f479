//! OS/2 table merging

use read_fonts::{FontRef, TableProvider};
use write_fonts::{from_obj::ToOwnedTable, tables::os2::Os2};

use crate::context::GlyphPlan;

/// The base OS/2 with Unicode and code page coverage OR-ed with the donor's
/// and the char index range recomputed from the merged cmap.
pub fn merge_os2(base: &FontRef, donor: &FontRef, plan: &GlyphPlan) -> Option<Os2> {
    let mut os2: Os2 = base.os2().ok()?.to_owned_table();

    if let Ok(donor_os2) = donor.os2() {
        os2.ul_unicode_range_1 |= donor_os2.ul_unicode_range_1();
        os2.ul_unicode_range_2 |= donor_os2.ul_unicode_range_2();
        os2.ul_unicode_range_3 |= donor_os2.ul_unicode_range_3();
        os2.ul_unicode_range_4 |= donor_os2.ul_unicode_range_4();

        let or = |a: Option<u32>, b: Option<u32>| match (a, b) {
            (Some(a), Some(b)) => Some(a | b),
            (a, _) => a,
        };
        os2.ul_code_page_range_1 = or(os2.ul_code_page_range_1, donor_os2.ul_code_page_range_1());
        os2.ul_code_page_range_2 = or(os2.ul_code_page_range_2, donor_os2.ul_code_page_range_2());
    }

    let codepoints = plan.mappings().iter().map(|(cp, _)| cp.to_u32());
    if let (Some(first), Some(last)) = (codepoints.clone().min(), codepoints.max()) {
        os2.us_first_char_index = first.min(0xFFFF) as u16;
        os2.us_last_char_index = last.min(0xFFFF) as u16;
    }

    Some(os2)
}
