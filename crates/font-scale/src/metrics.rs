//! Font-wide and per-glyph metric scaling.

use anyhow::Result;
use log::warn;
use read_fonts::{FontRef, TableProvider, types::Tag};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        os2::Os2,
        post::Post,
        vhea::Vhea,
        vmtx::{LongMetric as VerticalMetric, Vmtx},
    },
};

use fontfill_font_ops::kern::{KernPair, KernTable};

use crate::Scale;

pub(crate) fn scale_head(
    font: &FontRef,
    scale: Scale,
    loca_format: Option<LocaFormat>,
) -> Result<Head> {
    let mut head: Head = font.head()?.to_owned_table();
    head.units_per_em = scale.to_units();
    head.x_min = scale.apply(head.x_min);
    head.y_min = scale.apply(head.y_min);
    head.x_max = scale.apply(head.x_max);
    head.y_max = scale.apply(head.y_max);
    if let Some(format) = loca_format {
        head.index_to_loc_format = match format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        };
    }
    Ok(head)
}

pub(crate) fn scale_hhea(font: &FontRef, scale: Scale) -> Option<Hhea> {
    let mut hhea: Hhea = font.hhea().ok()?.to_owned_table();
    hhea.ascender = scale.apply(hhea.ascender.to_i16()).into();
    hhea.descender = scale.apply(hhea.descender.to_i16()).into();
    hhea.line_gap = scale.apply(hhea.line_gap.to_i16()).into();
    hhea.advance_width_max = scale.apply_u16(hhea.advance_width_max.to_u16()).into();
    hhea.min_left_side_bearing = scale.apply(hhea.min_left_side_bearing.to_i16()).into();
    hhea.min_right_side_bearing = scale.apply(hhea.min_right_side_bearing.to_i16()).into();
    hhea.x_max_extent = scale.apply(hhea.x_max_extent.to_i16()).into();
    hhea.caret_offset = scale.apply(hhea.caret_offset);
    Some(hhea)
}

pub(crate) fn scale_hmtx(font: &FontRef, scale: Scale) -> Option<Hmtx> {
    let hmtx = font.hmtx().ok()?;
    let h_metrics = hmtx
        .h_metrics()
        .iter()
        .map(|m| LongMetric {
            advance: scale.apply_u16(m.advance.get()),
            side_bearing: scale.apply(m.side_bearing.get()),
        })
        .collect();
    let left_side_bearings =
        hmtx.left_side_bearings().iter().map(|b| scale.apply(b.get())).collect();
    Some(Hmtx::new(h_metrics, left_side_bearings))
}

pub(crate) fn scale_vhea(font: &FontRef, scale: Scale) -> Option<Vhea> {
    let mut vhea: Vhea = font.vhea().ok()?.to_owned_table();
    vhea.ascender = scale.apply(vhea.ascender.to_i16()).into();
    vhea.descender = scale.apply(vhea.descender.to_i16()).into();
    vhea.line_gap = scale.apply(vhea.line_gap.to_i16()).into();
    vhea.advance_height_max = scale.apply_u16(vhea.advance_height_max.to_u16()).into();
    vhea.min_top_side_bearing = scale.apply(vhea.min_top_side_bearing.to_i16()).into();
    vhea.min_bottom_side_bearing = scale.apply(vhea.min_bottom_side_bearing.to_i16()).into();
    vhea.y_max_extent = scale.apply(vhea.y_max_extent.to_i16()).into();
    vhea.caret_offset = scale.apply(vhea.caret_offset);
    Some(vhea)
}

pub(crate) fn scale_vmtx(font: &FontRef, scale: Scale) -> Option<Vmtx> {
    let vmtx = font.vmtx().ok()?;
    let v_metrics = vmtx
        .v_metrics()
        .iter()
        .map(|m| VerticalMetric {
            advance: scale.apply_u16(m.advance.get()),
            side_bearing: scale.apply(m.side_bearing.get()),
        })
        .collect();
    let top_side_bearings = vmtx.top_side_bearings().iter().map(|b| scale.apply(b.get())).collect();
    Some(Vmtx { v_metrics, top_side_bearings })
}

pub(crate) fn scale_os2(font: &FontRef, scale: Scale) -> Option<Os2> {
    let mut os2: Os2 = font.os2().ok()?.to_owned_table();
    let s = |v: i16| scale.apply(v);

    os2.x_avg_char_width = s(os2.x_avg_char_width);
    os2.y_subscript_x_size = s(os2.y_subscript_x_size);
    os2.y_subscript_y_size = s(os2.y_subscript_y_size);
    os2.y_subscript_x_offset = s(os2.y_subscript_x_offset);
    os2.y_subscript_y_offset = s(os2.y_subscript_y_offset);
    os2.y_superscript_x_size = s(os2.y_superscript_x_size);
    os2.y_superscript_y_size = s(os2.y_superscript_y_size);
    os2.y_superscript_x_offset = s(os2.y_superscript_x_offset);
    os2.y_superscript_y_offset = s(os2.y_superscript_y_offset);
    os2.y_strikeout_size = s(os2.y_strikeout_size);
    os2.y_strikeout_position = s(os2.y_strikeout_position);
    os2.s_typo_ascender = s(os2.s_typo_ascender);
    os2.s_typo_descender = s(os2.s_typo_descender);
    os2.s_typo_line_gap = s(os2.s_typo_line_gap);
    os2.us_win_ascent = scale.apply_u16(os2.us_win_ascent);
    os2.us_win_descent = scale.apply_u16(os2.us_win_descent);
    os2.sx_height = os2.sx_height.map(s);
    os2.s_cap_height = os2.s_cap_height.map(s);
    Some(os2)
}

pub(crate) fn scale_post(font: &FontRef, scale: Scale) -> Option<Post> {
    let mut post: Post = font.post().ok()?.to_owned_table();
    post.underline_position = scale.apply(post.underline_position.to_i16()).into();
    post.underline_thickness = scale.apply(post.underline_thickness.to_i16()).into();
    Some(post)
}

/// `cvt ` is a bare array of FWORDs.
pub(crate) fn scale_cvt(font: &FontRef, scale: Scale) -> Option<Vec<u8>> {
    let data = font.table_data(Tag::new(b"cvt "))?;
    Some(
        data.as_bytes()
            .chunks_exact(2)
            .flat_map(|c| scale.apply(i16::from_be_bytes([c[0], c[1]])).to_be_bytes())
            .collect(),
    )
}

pub(crate) fn scale_kern(font: &FontRef, scale: Scale) -> Result<Option<Vec<u8>>> {
    let Some(data) = font.table_data(Tag::new(b"kern")) else {
        return Ok(None);
    };
    match KernTable::parse(data.as_bytes())? {
        Some(mut kern) => {
            kern.filter_map_pairs(|pair| {
                Some(KernPair { value: scale.apply(pair.value), ..pair })
            });
            Ok(Some(kern.to_bytes()))
        }
        None => {
            warn!("AAT kern table is copied without rescaling");
            Ok(Some(data.as_bytes().to_vec()))
        }
    }
}
