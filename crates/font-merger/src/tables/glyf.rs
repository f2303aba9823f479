//! glyf table merging (TrueType outlines)
//!
//! Base glyphs keep their glyph ids, so they are carried over whole, instructions
//! included. Imported donor glyphs lose their per-glyph instructions, since
//! those may call `fpgm` functions or read `cvt` entries that only exist in the
//! donor.

use read_fonts::{
    FontRef, TableProvider,
    tables::{
        glyf::{Anchor as ReadAnchor, CurvePoint, Glyf as ReadGlyf, Glyph as ReadGlyph},
        loca::Loca as ReadLoca,
    },
    types,
};
use write_fonts::{
    from_obj::ToOwnedTable,
    tables::{
        glyf::{
            Anchor, Bbox, Component, CompositeGlyph, Contour, Glyf, GlyfLocaBuilder, Glyph,
            SimpleGlyph, Transform,
        },
        loca::{Loca, LocaFormat},
    },
};

use crate::{
    MergeError, Result,
    context::MergeContext,
    types::{GlyphId, MergedGlyphId},
};

pub struct MergedGlyf {
    pub glyf: Glyf,
    pub loca: Loca,
    pub format: LocaFormat,
    /// Union of the bounding boxes of imported glyphs
    pub imported_bbox: Option<Bbox>,
    /// Largest point and contour counts among imported simple glyphs
    pub imported_max_points: u16,
    pub imported_max_contours: u16,
}

pub fn merge_glyf(ctx: &MergeContext) -> Result<MergedGlyf> {
    let (base_glyf, base_loca) = outlines(ctx.base(), "base")?;
    let (donor_glyf, donor_loca) = outlines(ctx.donor(), "donor")?;

    let mut builder = GlyfLocaBuilder::new();

    for gid in 0..ctx.plan().base_glyph_count() {
        let glyph = base_loca.get_glyf(types::GlyphId::new(gid as u32), &base_glyf)?;
        let owned: Glyph = glyph.map(|g| g.to_owned_table()).unwrap_or(Glyph::Empty);
        builder.add_glyph(&owned)?;
    }

    let mut imported_bbox: Option<Bbox> = None;
    let mut imported_max_points = 0u16;
    let mut imported_max_contours = 0u16;

    for &gid in ctx.plan().imported() {
        let glyph = donor_loca.get_glyf(types::GlyphId::new(gid.to_u32()), &donor_glyf)?;
        let Some(glyph) = glyph else {
            builder.add_glyph(&Glyph::Empty)?;
            continue;
        };

        let bbox = glyph_bbox(&glyph);
        imported_bbox = Some(imported_bbox.map_or(bbox, |b| union_bbox(b, bbox)));
        if let ReadGlyph::Simple(simple) = &glyph {
            imported_max_points = imported_max_points.max(simple.num_points() as u16);
            imported_max_contours =
                imported_max_contours.max(simple.end_pts_of_contours().len() as u16);
        }

        let converted = convert_glyph(&glyph, |c| ctx.remap_donor(c));
        builder.add_glyph(&converted)?;
    }

    let (glyf, loca, format) = builder.build();
    Ok(MergedGlyf { glyf, loca, format, imported_bbox, imported_max_points, imported_max_contours })
}

fn glyph_bbox(glyph: &ReadGlyph) -> Bbox {
    match glyph {
        ReadGlyph::Simple(g) => {
            Bbox { x_min: g.x_min(), y_min: g.y_min(), x_max: g.x_max(), y_max: g.y_max() }
        }
        ReadGlyph::Composite(g) => {
            Bbox { x_min: g.x_min(), y_min: g.y_min(), x_max: g.x_max(), y_max: g.y_max() }
        }
    }
}

pub(crate) fn union_bbox(a: Bbox, b: Bbox) -> Bbox {
    Bbox {
        x_min: a.x_min.min(b.x_min),
        y_min: a.y_min.min(b.y_min),
        x_max: a.x_max.max(b.x_max),
        y_max: a.y_max.max(b.y_max),
    }
}

fn outlines<'a>(
    font: &FontRef<'a>,
    role: &'static str,
) -> Result<(ReadGlyf<'a>, ReadLoca<'a>)> {
    match (font.glyf(), font.loca(None)) {
        (Ok(glyf), Ok(loca)) => Ok((glyf, loca)),
        _ => Err(MergeError::UnsupportedOutlines { role }),
    }
}

/// Convert a donor glyph to a write-fonts glyph without its instructions
///
/// Component ids go through `remap`; components that do not survive the merge
/// are dropped, and a composite left without components becomes empty.
fn convert_glyph(glyph: &ReadGlyph, remap: impl Fn(GlyphId) -> Option<MergedGlyphId>) -> Glyph {
    match glyph {
        ReadGlyph::Simple(simple) => {
            let mut contours: Vec<Contour> = Vec::new();
            let mut points = simple.points();
            let mut current = 0usize;

            for end_pt in simple.end_pts_of_contours() {
                let end = end_pt.get() as usize;
                let mut contour: Vec<CurvePoint> = Vec::new();
                while current <= end {
                    if let Some(pt) = points.next() {
                        contour.push(CurvePoint::new(pt.x, pt.y, pt.on_curve));
                    }
                    current += 1;
                }
                contours.push(Contour::from(contour));
            }

            let bbox = glyph_bbox(glyph);
            Glyph::Simple(SimpleGlyph { bbox, contours, instructions: vec![] })
        }
        ReadGlyph::Composite(composite) => {
            let bbox = glyph_bbox(glyph);

            let mut components = composite.components().filter_map(|comp| {
                let new_gid = remap(GlyphId::from(comp.glyph))?;
                Some(Component {
                    glyph: new_gid.to_glyph_id16(),
                    anchor: match comp.anchor {
                        ReadAnchor::Offset { x, y } => Anchor::Offset { x, y },
                        ReadAnchor::Point { base, component } => {
                            Anchor::Point { base, component }
                        }
                    },
                    flags: comp.flags.into(),
                    transform: Transform {
                        xx: comp.transform.xx,
                        yx: comp.transform.yx,
                        xy: comp.transform.xy,
                        yy: comp.transform.yy,
                    },
                })
            });

            let Some(first) = components.next() else {
                return Glyph::Empty;
            };
            let mut composite_glyph = CompositeGlyph::new(first, bbox);
            for comp in components {
                composite_glyph.add_component(comp, bbox);
            }

            Glyph::Composite(composite_glyph)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_bbox() {
        let a = Bbox { x_min: 0, y_min: -100, x_max: 500, y_max: 700 };
        let b = Bbox { x_min: -20, y_min: 0, x_max: 900, y_max: 600 };
        let u = union_bbox(a, b);
        assert_eq!((u.x_min, u.y_min, u.x_max, u.y_max), (-20, -100, 900, 700));
    }
}
