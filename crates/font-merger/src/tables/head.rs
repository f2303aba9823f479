//! head and maxp merging

use read_fonts::{FontRef, TableProvider, types::Version16Dot16};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{glyf::Bbox, head::Head, loca::LocaFormat, maxp::Maxp},
};

use crate::{
    Result,
    tables::glyf::{MergedGlyf, union_bbox},
};

/// The base head with its bounding box grown to cover imported glyphs.
pub fn merge_head(base: &FontRef, glyf: &MergedGlyf) -> Result<Head> {
    let mut head: Head = base.head()?.to_owned_table();

    if let Some(imported) = glyf.imported_bbox {
        let current =
            Bbox { x_min: head.x_min, y_min: head.y_min, x_max: head.x_max, y_max: head.y_max };
        let merged = union_bbox(current, imported);
        head.x_min = merged.x_min;
        head.y_min = merged.y_min;
        head.x_max = merged.x_max;
        head.y_max = merged.y_max;
    }

    head.index_to_loc_format = match glyf.format {
        LocaFormat::Short => 0,
        LocaFormat::Long => 1,
    };

    Ok(head)
}

/// Structural limits are the max over both fonts; hinting limits stay the
/// base's since donor instructions are not imported.
pub fn merge_maxp(
    base: &FontRef,
    donor: &FontRef,
    glyf: &MergedGlyf,
    total_glyphs: u16,
) -> Result<Maxp> {
    let mut maxp: Maxp = base.maxp()?.to_owned_table();
    maxp.num_glyphs = total_glyphs;

    let donor_maxp = donor.maxp()?;
    if donor_maxp.version() != Version16Dot16::VERSION_1_0 {
        return Ok(maxp);
    }

    let widen = |base: Option<u16>, donor: Option<u16>| match (base, donor) {
        (Some(b), Some(d)) => Some(b.max(d)),
        (b, d) => b.or(d),
    };

    maxp.max_points = widen(maxp.max_points, Some(glyf.imported_max_points));
    maxp.max_contours = widen(maxp.max_contours, Some(glyf.imported_max_contours));
    maxp.max_composite_points = widen(maxp.max_composite_points, donor_maxp.max_composite_points());
    maxp.max_composite_contours =
        widen(maxp.max_composite_contours, donor_maxp.max_composite_contours());
    maxp.max_component_elements =
        widen(maxp.max_component_elements, donor_maxp.max_component_elements());
    maxp.max_component_depth = widen(maxp.max_component_depth, donor_maxp.max_component_depth());

    Ok(maxp)
}
