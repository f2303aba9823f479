//! hmtx and hhea merging

use read_fonts::{
    FontRef, TableProvider,
    tables::{hmtx::Hmtx as ReadHmtx, vmtx::Vmtx as ReadVmtx},
};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
    },
};

use crate::{Result, context::MergeContext, types::GlyphId};

/// `(advance, side bearing)` pairs as read from the font.
pub(crate) type LongMetricRead = (u16, i16);

/// Advance and side bearing of a glyph, repeating the last advance for
/// glyphs past the long metrics array.
pub(crate) fn glyph_metric(
    long: &[LongMetricRead],
    side_bearings: &[i16],
    gid: GlyphId,
) -> LongMetric {
    let gid = gid.to_u16() as usize;
    if let Some(&(advance, side_bearing)) = long.get(gid) {
        return LongMetric { advance, side_bearing };
    }
    let advance = long.last().map(|m| m.0).unwrap_or(0);
    let side_bearing = side_bearings.get(gid - long.len()).copied().unwrap_or(0);
    LongMetric { advance, side_bearing }
}

pub(crate) struct Metrics {
    long: Vec<LongMetricRead>,
    side_bearings: Vec<i16>,
}

impl Metrics {
    pub(crate) fn horizontal(hmtx: &ReadHmtx) -> Self {
        Self {
            long: hmtx
                .h_metrics()
                .iter()
                .map(|m| (m.advance.get(), m.side_bearing.get()))
                .collect(),
            side_bearings: hmtx.left_side_bearings().iter().map(|b| b.get()).collect(),
        }
    }

    pub(crate) fn vertical(vmtx: &ReadVmtx) -> Self {
        Self {
            long: vmtx
                .v_metrics()
                .iter()
                .map(|m| (m.advance.get(), m.side_bearing.get()))
                .collect(),
            side_bearings: vmtx.top_side_bearings().iter().map(|b| b.get()).collect(),
        }
    }

    pub(crate) fn get(&self, gid: GlyphId) -> LongMetric {
        glyph_metric(&self.long, &self.side_bearings, gid)
    }
}

/// Base metrics for base glyphs, donor metrics for imported glyphs.
///
/// Every glyph gets a long metric, so `numberOfHMetrics` equals the glyph count.
pub fn merge_hmtx(ctx: &MergeContext) -> Result<Hmtx> {
    let base = Metrics::horizontal(&ctx.base().hmtx()?);
    let donor = ctx.donor().hmtx().ok().map(|m| Metrics::horizontal(&m));

    let mut h_metrics = Vec::with_capacity(ctx.plan().total_glyphs() as usize);
    h_metrics.extend((0..ctx.plan().base_glyph_count()).map(|gid| base.get(GlyphId::new(gid))));
    h_metrics.extend(ctx.plan().imported().iter().map(|&gid| {
        donor
            .as_ref()
            .map(|d| d.get(gid))
            .unwrap_or(LongMetric { advance: 0, side_bearing: 0 })
    }));

    Ok(Hmtx::new(h_metrics, Vec::new()))
}

/// The base hhea, with its extents widened to cover imported glyphs.
pub fn merge_hhea(base: &FontRef, donor: &FontRef, hmtx: &Hmtx) -> Result<Hhea> {
    let mut hhea: Hhea = base.hhea()?.to_owned_table();

    hhea.number_of_h_metrics = hmtx.h_metrics.len() as u16;
    hhea.advance_width_max = hmtx
        .h_metrics
        .iter()
        .map(|m| m.advance)
        .max()
        .unwrap_or_default()
        .into();

    if let Ok(donor_hhea) = donor.hhea() {
        hhea.min_left_side_bearing = hhea
            .min_left_side_bearing
            .to_i16()
            .min(donor_hhea.min_left_side_bearing().to_i16())
            .into();
        hhea.min_right_side_bearing = hhea
            .min_right_side_bearing
            .to_i16()
            .min(donor_hhea.min_right_side_bearing().to_i16())
            .into();
        hhea.x_max_extent =
            hhea.x_max_extent.to_i16().max(donor_hhea.x_max_extent().to_i16()).into();
    }

    Ok(hhea)
}
