//! vmtx and vhea merging
//!
//! Only done when the base has vertical metrics. Imported glyphs without
//! donor vertical metrics advance by one em.

use read_fonts::TableProvider;
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        vhea::Vhea,
        vmtx::{LongMetric, Vmtx},
    },
};

use crate::{Result, context::MergeContext, tables::hmtx::Metrics, types::GlyphId};

pub fn merge_vmtx(ctx: &MergeContext) -> Result<Option<(Vhea, Vmtx)>> {
    let (Ok(base_vhea), Ok(base_vmtx)) = (ctx.base().vhea(), ctx.base().vmtx()) else {
        return Ok(None);
    };
    let em = ctx.base().head()?.units_per_em();

    let base = Metrics::vertical(&base_vmtx);
    let donor = ctx.donor().vmtx().ok().map(|m| Metrics::vertical(&m));

    let mut v_metrics: Vec<LongMetric> = (0..ctx.plan().base_glyph_count())
        .map(|gid| to_vertical(base.get(GlyphId::new(gid))))
        .collect();
    v_metrics.extend(ctx.plan().imported().iter().map(|&gid| match &donor {
        Some(d) => to_vertical(d.get(gid)),
        None => LongMetric { advance: em, side_bearing: 0 },
    }));

    let mut vhea: Vhea = base_vhea.to_owned_table();
    vhea.number_of_long_ver_metrics = v_metrics.len() as u16;
    vhea.advance_height_max =
        v_metrics.iter().map(|m| m.advance).max().unwrap_or_default().into();
    if let Ok(donor_vhea) = ctx.donor().vhea() {
        vhea.min_top_side_bearing = vhea
            .min_top_side_bearing
            .to_i16()
            .min(donor_vhea.min_top_side_bearing().to_i16())
            .into();
        vhea.min_bottom_side_bearing = vhea
            .min_bottom_side_bearing
            .to_i16()
            .min(donor_vhea.min_bottom_side_bearing().to_i16())
            .into();
        vhea.y_max_extent =
            vhea.y_max_extent.to_i16().max(donor_vhea.y_max_extent().to_i16()).into();
    }

    Ok(Some((vhea, Vmtx { v_metrics, top_side_bearings: Vec::new() })))
}

fn to_vertical(m: write_fonts::tables::hmtx::LongMetric) -> LongMetric {
    LongMetric { advance: m.advance, side_bearing: m.side_bearing }
}
