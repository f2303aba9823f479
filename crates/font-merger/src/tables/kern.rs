//! Legacy kern merging
//!
//! Donor format 0 pairs are remapped into merged glyph ids and appended after
//! the base's pairs in the base's first horizontal format 0 subtable, so the
//! base wins on duplicates.

use log::{debug, warn};
use read_fonts::{FontRef, types::Tag};

use fontfill_font_ops::kern::{KernBody, KernPair, KernSubtable, KernTable};

use crate::{
    MergeError, Result,
    context::{DonorGlyph, MergeContext},
    types::GlyphId,
};

pub const KERN: Tag = Tag::new(b"kern");

const COVERAGE_HORIZONTAL: u16 = 0x0001;
const COVERAGE_MINIMUM: u16 = 0x0002;
const COVERAGE_CROSS_STREAM: u16 = 0x0004;

#[derive(Debug, Default)]
pub struct MergedKern {
    /// Raw table to write, `None` to leave the font without a kern table
    pub data: Option<Vec<u8>>,
    pub pairs_added: usize,
}

pub fn merge_kern(ctx: &MergeContext) -> Result<MergedKern> {
    let base_raw = raw_kern(ctx.base());
    let donor_pairs = donor_pairs(ctx)?;

    if donor_pairs.is_empty() {
        return Ok(MergedKern { data: base_raw, pairs_added: 0 });
    }

    let mut table = match &base_raw {
        Some(bytes) => match KernTable::parse(bytes).map_err(MergeError::Kern)? {
            Some(table) => table,
            None => {
                warn!("base has an AAT kern table; donor kerning is not merged");
                return Ok(MergedKern { data: base_raw, pairs_added: 0 });
            }
        },
        None => KernTable::default(),
    };

    let pairs_added = donor_pairs.len();
    match table
        .subtables
        .iter_mut()
        .filter(|s| is_plain_horizontal(s))
        .find_map(KernSubtable::pairs_mut)
    {
        Some(pairs) => pairs.extend(donor_pairs),
        None => table.subtables.push(KernSubtable::pairs(COVERAGE_HORIZONTAL as u8, donor_pairs)),
    }

    Ok(MergedKern { data: Some(table.to_bytes()), pairs_added })
}

fn raw_kern(font: &FontRef) -> Option<Vec<u8>> {
    font.table_data(KERN).map(|d| d.as_bytes().to_vec())
}

fn is_plain_horizontal(subtable: &KernSubtable) -> bool {
    subtable.coverage & (COVERAGE_HORIZONTAL | COVERAGE_MINIMUM | COVERAGE_CROSS_STREAM)
        == COVERAGE_HORIZONTAL
}

/// Donor pairs that survive the merge, in merged glyph ids.
fn donor_pairs(ctx: &MergeContext) -> Result<Vec<KernPair>> {
    let Some(bytes) = raw_kern(ctx.donor()) else {
        return Ok(Vec::new());
    };
    let Some(table) = KernTable::parse(&bytes).map_err(MergeError::Kern)? else {
        warn!("donor has an AAT kern table; its kerning is not merged");
        return Ok(Vec::new());
    };

    let preserve = ctx.options().preserve_cross_font_kerning;
    let plan = ctx.plan();
    let map = |gid: u16| -> Option<(u16, bool)> {
        match plan.donor_glyph(GlyphId::new(gid))? {
            DonorGlyph::Imported(m) => Some((m.to_u16(), false)),
            DonorGlyph::Redirected(m) => Some((m.to_u16(), true)),
        }
    };

    let mut dropped = 0usize;
    let mut pairs = Vec::new();
    for subtable in table.subtables.iter().filter(|s| is_plain_horizontal(s)) {
        let KernBody::Pairs(source) = &subtable.body else {
            continue;
        };

        for pair in source {
            let (Some((left, left_base)), Some((right, right_base))) =
                (map(pair.left), map(pair.right))
            else {
                dropped += 1;
                continue;
            };
            if !preserve && (left_base || right_base) {
                dropped += 1;
                continue;
            }
            pairs.push(KernPair::new(left, right, pair.value));
        }
    }

    if dropped > 0 {
        debug!("dropped {dropped} donor kern pairs");
    }
    Ok(pairs)
}
