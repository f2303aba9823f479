//! Outline scaling.

use anyhow::{Context, Result};
use read_fonts::{
    FontData, FontRead, FontRef, TableProvider,
    tables::glyf::{
        Anchor as ReadAnchor, CompositeGlyph as ReadCompositeGlyph, CompositeGlyphFlags,
        CurvePoint, Glyph as ReadGlyph, SimpleGlyph as ReadSimpleGlyph,
    },
    types::GlyphId,
};
use write_fonts::{
    dump_table,
    tables::{
        glyf::{
            Anchor, Bbox, Component, CompositeGlyph, Contour, Glyf, GlyfLocaBuilder, Glyph,
            SimpleGlyph, Transform,
        },
        loca::{Loca, LocaFormat},
    },
};

use crate::Scale;

/// Rebuild `glyf`/`loca` with every coordinate scaled.
///
/// Returns `None` for fonts without TrueType outlines.
pub(crate) fn scale_glyf(
    font: &FontRef,
    scale: Scale,
) -> Result<Option<(Glyf, Loca, LocaFormat)>> {
    let (Ok(glyf), Ok(loca)) = (font.glyf(), font.loca(None)) else {
        return Ok(None);
    };
    let num_glyphs = font.maxp()?.num_glyphs();

    let mut builder = GlyfLocaBuilder::new();
    for gid in 0..num_glyphs {
        let glyph = match loca.get_glyf(GlyphId::new(gid as u32), &glyf)? {
            Some(ReadGlyph::Simple(simple)) => Glyph::Simple(scale_simple_glyph(&simple, scale)),
            Some(ReadGlyph::Composite(composite)) => scale_composite_glyph(&composite, scale)?
                .map(Glyph::Composite)
                .unwrap_or(Glyph::Empty),
            None => Glyph::Empty,
        };
        builder.add_glyph(&glyph)?;
    }

    Ok(Some(builder.build()))
}

fn scale_bbox(x_min: i16, y_min: i16, x_max: i16, y_max: i16, scale: Scale) -> Bbox {
    Bbox {
        x_min: scale.apply(x_min),
        y_min: scale.apply(y_min),
        x_max: scale.apply(x_max),
        y_max: scale.apply(y_max),
    }
}

/// Tight bounds of a point set.
fn points_bbox(points: &[CurvePoint]) -> Option<Bbox> {
    let first = points.first()?;
    let init = Bbox { x_min: first.x, y_min: first.y, x_max: first.x, y_max: first.y };
    Some(points.iter().fold(init, |b, p| Bbox {
        x_min: b.x_min.min(p.x),
        y_min: b.y_min.min(p.y),
        x_max: b.x_max.max(p.x),
        y_max: b.y_max.max(p.y),
    }))
}

pub(crate) fn scale_simple_glyph(glyph: &ReadSimpleGlyph, scale: Scale) -> SimpleGlyph {
    let points: Vec<CurvePoint> = glyph
        .points()
        .map(|p| CurvePoint::new(scale.apply(p.x), scale.apply(p.y), p.on_curve))
        .collect();

    let mut contours = Vec::new();
    let mut start = 0usize;
    for end in glyph.end_pts_of_contours() {
        let end = end.get() as usize + 1;
        let contour = points.get(start..end).map(<[CurvePoint]>::to_vec).unwrap_or_default();
        contours.push(Contour::from(contour));
        start = end;
    }

    let bbox = points_bbox(&points).unwrap_or_else(|| {
        scale_bbox(glyph.x_min(), glyph.y_min(), glyph.x_max(), glyph.y_max(), scale)
    });

    SimpleGlyph { bbox, contours, instructions: glyph.instructions().to_vec() }
}

fn scale_composite_glyph(
    glyph: &ReadCompositeGlyph,
    scale: Scale,
) -> Result<Option<CompositeGlyph>> {
    let bbox = scale_bbox(glyph.x_min(), glyph.y_min(), glyph.x_max(), glyph.y_max(), scale);

    let mut components = glyph.components().map(|c| Component {
        glyph: c.glyph,
        anchor: match c.anchor {
            ReadAnchor::Offset { x, y } => {
                Anchor::Offset { x: scale.apply(x), y: scale.apply(y) }
            }
            // point-matched components follow their points
            ReadAnchor::Point { base, component } => Anchor::Point { base, component },
        },
        flags: c.flags.into(),
        transform: Transform {
            xx: c.transform.xx,
            yx: c.transform.yx,
            xy: c.transform.xy,
            yy: c.transform.yy,
        },
    });

    let Some(first) = components.next() else {
        return Ok(None);
    };
    let mut composite = CompositeGlyph::new(first, bbox);
    for component in components {
        composite.add_component(component, bbox);
    }
    let instructions = glyph.instructions().unwrap_or_default();
    with_instructions(composite, instructions).map(Some)
}

/// Attach TrueType instructions to a rebuilt composite glyph.
///
/// `CompositeGlyph` only keeps instructions when it is read from glyph data,
/// so the glyph is written out, given the instruction block, and read back.
pub(crate) fn with_instructions(
    composite: CompositeGlyph,
    instructions: &[u8],
) -> Result<CompositeGlyph> {
    if instructions.is_empty() {
        return Ok(composite);
    }
    let mut data = dump_table(&composite)?;
    let (flags_at, end) = last_component(&data).context("composite glyph without components")?;

    let flags = u16::from_be_bytes([data[flags_at], data[flags_at + 1]])
        | CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS.bits();
    data[flags_at..flags_at + 2].copy_from_slice(&flags.to_be_bytes());
    data.truncate(end);
    data.extend_from_slice(&u16::try_from(instructions.len())?.to_be_bytes());
    data.extend_from_slice(instructions);

    Ok(CompositeGlyph::read(FontData::new(&data))?)
}

/// Offset of the last component's flags and the end of its record.
fn last_component(glyph: &[u8]) -> Option<(usize, usize)> {
    // numberOfContours and the bounding box
    let mut pos = 10;
    loop {
        let raw = glyph.get(pos..pos + 2)?;
        let flags = CompositeGlyphFlags::from_bits_truncate(u16::from_be_bytes([raw[0], raw[1]]));
        let args = if flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) { 4 } else { 2 };
        let transform = if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
            2
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            4
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
            8
        } else {
            0
        };
        let next = pos + 4 + args + transform;
        if next > glyph.len() {
            return None;
        }
        if !flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
            return Some((pos, next));
        }
        pos = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_bbox() {
        let points = vec![
            CurvePoint::new(10, -20, true),
            CurvePoint::new(300, 700, false),
            CurvePoint::new(-5, 40, true),
        ];
        let bbox = points_bbox(&points).unwrap();
        assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (-5, -20, 300, 700));
    }

    #[test]
    fn test_points_bbox_empty() {
        assert!(points_bbox(&[]).is_none());
    }

    fn component(gid: u16, x: i16) -> Component {
        Component {
            glyph: read_fonts::types::GlyphId16::new(gid),
            anchor: Anchor::Offset { x, y: 0 },
            flags: Default::default(),
            transform: Transform::default(),
        }
    }

    #[test]
    fn test_with_instructions() {
        let bbox = Bbox { x_min: 0, y_min: 0, x_max: 900, y_max: 700 };
        let mut composite = CompositeGlyph::new(component(1, 0), bbox);
        // word-sized offset on the last component
        composite.add_component(component(2, 400), bbox);

        let hinted = with_instructions(composite.clone(), &[0xB0, 0x01, 0x2F]).unwrap();
        assert_eq!(hinted.components(), composite.components());
        assert_eq!(hinted.bbox, bbox);

        let data = dump_table(&hinted).unwrap();
        let read = ReadCompositeGlyph::read(FontData::new(&data)).unwrap();
        assert_eq!(read.instructions(), Some(&[0xB0, 0x01, 0x2F][..]));
        assert_eq!(read.components().count(), 2);
    }

    #[test]
    fn test_without_instructions_is_unchanged() {
        let bbox = Bbox { x_min: 0, y_min: 0, x_max: 500, y_max: 500 };
        let composite = CompositeGlyph::new(component(1, 10), bbox);
        assert_eq!(with_instructions(composite.clone(), &[]).unwrap(), composite);
    }
}
