//! Rescale a TrueType font to a different units-per-em.
//!
//! Every design-unit value the workspace knows how to rewrite is multiplied by
//! `new_upem / old_upem` and rounded: outlines and composite offsets in `glyf`,
//! advances and side bearings in `hmtx`/`vmtx`, the font-wide extents in
//! `head`/`hhea`/`vhea`/`OS/2`/`post`, control values in `cvt `, format 0
//! pairs in `kern`, and the layout coordinates of `GPOS`, `BASE` and `GDEF`.
//! Device metric tables (`hdmx`, `LTSH`, `VDMX`) describe rasterization at the
//! old scale and are dropped. Fonts carrying design-unit tables outside that
//! set are refused rather than left half scaled.

mod glyf;
mod layout;
mod metrics;

use anyhow::{Result, bail};
use log::debug;
use read_fonts::{FontRef, TableProvider, types::Tag};

use fontfill_font_ops::rewrite_font;

pub const MIN_UNITS_PER_EM: u16 = 16;
pub const MAX_UNITS_PER_EM: u16 = 16384;

/// Tables holding per-ppem device metrics, invalid after a rescale.
const DEVICE_METRIC_TABLES: &[[u8; 4]] = &[*b"hdmx", *b"LTSH", *b"VDMX"];

/// Tables with design-unit values this crate cannot rewrite.
const UNSUPPORTED_TABLES: &[[u8; 4]] = &[
    *b"CFF ", *b"CFF2", *b"JSTF", *b"MATH", *b"gvar", *b"HVAR", *b"VVAR", *b"MVAR",
];

/// Tables rebuilt by the scaler.
const SCALED_TABLES: &[[u8; 4]] = &[
    *b"glyf", *b"loca", *b"head", *b"hhea", *b"hmtx", *b"vhea", *b"vmtx", *b"OS/2", *b"post",
    *b"kern", *b"cvt ", *b"GPOS", *b"BASE", *b"GDEF",
];

/// A units-per-em change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    from: u16,
    to: u16,
}

impl Scale {
    pub fn new(from: u16, to: u16) -> Result<Self> {
        for upem in [from, to] {
            if !(MIN_UNITS_PER_EM..=MAX_UNITS_PER_EM).contains(&upem) {
                bail!(
                    "unitsPerEm {upem} is outside {MIN_UNITS_PER_EM}..={MAX_UNITS_PER_EM}"
                );
            }
        }
        Ok(Self { from, to })
    }

    pub fn to_units(self) -> u16 {
        self.to
    }

    pub fn factor(self) -> f64 {
        self.to as f64 / self.from as f64
    }

    pub fn is_identity(self) -> bool {
        self.from == self.to
    }

    pub fn apply(self, value: i16) -> i16 {
        (value as f64 * self.factor()).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
    }

    pub fn apply_u16(self, value: u16) -> u16 {
        (value as f64 * self.factor()).round().clamp(0.0, u16::MAX as f64) as u16
    }
}

/// Rescale font data so that `head.unitsPerEm` becomes `units_per_em`.
///
/// Returns the input unchanged when the font already uses that value.
pub fn scale_units_per_em(data: &[u8], units_per_em: u16) -> Result<Vec<u8>> {
    let font = FontRef::new(data)?;
    let scale = Scale::new(font.head()?.units_per_em(), units_per_em)?;
    if scale.is_identity() {
        return Ok(data.to_vec());
    }

    let unsupported =
        UNSUPPORTED_TABLES.iter().map(Tag::new).find(|tag| font.table_data(*tag).is_some());
    if let Some(tag) = unsupported {
        bail!("rescaling fonts with a '{tag}' table is not supported");
    }

    debug!("Rescaling font from {} to {} units per em", scale.from, scale.to);

    let skip: Vec<Tag> =
        SCALED_TABLES.iter().chain(DEVICE_METRIC_TABLES).map(Tag::new).collect();

    rewrite_font(data, &skip, |font, builder| {
        let loca_format = match glyf::scale_glyf(font, scale)? {
            Some((glyf, loca, format)) => {
                builder.add_table(&glyf)?;
                builder.add_table(&loca)?;
                Some(format)
            }
            None => None,
        };

        builder.add_table(&metrics::scale_head(font, scale, loca_format)?)?;

        if let Some(hhea) = metrics::scale_hhea(font, scale) {
            builder.add_table(&hhea)?;
        }
        if let Some(hmtx) = metrics::scale_hmtx(font, scale) {
            builder.add_table(&hmtx)?;
        }
        if let Some(vhea) = metrics::scale_vhea(font, scale) {
            builder.add_table(&vhea)?;
        }
        if let Some(vmtx) = metrics::scale_vmtx(font, scale) {
            builder.add_table(&vmtx)?;
        }
        if let Some(os2) = metrics::scale_os2(font, scale) {
            builder.add_table(&os2)?;
        }
        if let Some(post) = metrics::scale_post(font, scale) {
            builder.add_table(&post)?;
        }
        if let Some(cvt) = metrics::scale_cvt(font, scale) {
            builder.add_raw(Tag::new(b"cvt "), cvt);
        }
        if let Some(kern) = metrics::scale_kern(font, scale)? {
            builder.add_raw(Tag::new(b"kern"), kern);
        }
        if let Some(gpos) = layout::scale_gpos(font, scale)? {
            builder.add_table(&gpos)?;
        }
        if let Some(base) = layout::scale_base(font, scale)? {
            builder.add_table(&base)?;
        }
        if let Some(gdef) = layout::scale_gdef(font, scale)? {
            builder.add_table(&gdef)?;
        }

        Ok(())
    })
}
