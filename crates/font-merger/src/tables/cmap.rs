//! cmap reading and rebuilding
//!
//! The merged cmap keeps the base's encoding records. Unicode subtables are
//! regenerated from the merged mappings in their original format; everything
//! else (variation sequences, Macintosh and symbol subtables) is carried over
//! as is, since base glyph ids never move.

use read_fonts::{
    FontRef, TableProvider,
    tables::cmap::{Cmap as ReadCmap, CmapSubtable, PlatformId},
    types,
};
use write_fonts::{
    from_obj::FromTableRef,
    tables::cmap::{
        Cmap, Cmap4, Cmap12, CmapSubtable as WriteCmapSubtable, EncodingRecord,
        SequentialMapGroup,
    },
};

use crate::{
    Result,
    types::{Codepoint, GlyphId, MergedGlyphId},
};

/// Unicode mappings of a font, from its best Unicode subtable.
///
/// A font without a cmap maps nothing.
pub fn read_mappings(font: &FontRef) -> Vec<(Codepoint, GlyphId)> {
    let Ok(cmap) = font.cmap() else {
        return Vec::new();
    };
    find_best_subtable(&cmap).map(|s| iter_cmap_subtable(&s)).unwrap_or_default()
}

/// Build the merged cmap on top of the base font's encoding records.
///
/// A format 4 subtable is written for the Basic Multilingual Plane whenever
/// it fits, and format 12 subtables whenever the mappings need them (characters
/// beyond the BMP, or too many segments for format 4).
pub fn build_cmap(base: &FontRef, mappings: &[(Codepoint, MergedGlyphId)]) -> Result<Cmap> {
    let chars = mappings.iter().filter_map(|(cp, gid)| {
        Some((char::from_u32(cp.to_u32())?, types::GlyphId::new(gid.to_u32())))
    });
    let bmp = Cmap::from_mappings(chars)?
        .encoding_records
        .into_iter()
        .find_map(|record| match &*record.subtable {
            WriteCmapSubtable::Format4(cmap4) if format4_fits(cmap4) => Some(cmap4.clone()),
            _ => None,
        });

    let mut sorted: Vec<(u32, u32)> =
        mappings.iter().map(|(cp, gid)| (cp.to_u32(), gid.to_u32())).collect();
    sorted.sort_by_key(|(cp, _)| *cp);
    sorted.dedup_by_key(|(cp, _)| *cp);
    let full = Cmap12 { language: 0, groups: build_sequential_groups(&sorted) };
    let needs_full = bmp.is_none() || sorted.last().is_some_and(|(cp, _)| *cp > 0xFFFF);

    let base_records = match base.cmap() {
        Ok(cmap) => Cmap::from_table_ref(&cmap).encoding_records,
        Err(_) => Vec::new(),
    };
    let mut records: Vec<EncodingRecord> = Vec::with_capacity(base_records.len() + 4);
    for record in base_records {
        let unicode = is_unicode(record.platform_id, record.encoding_id);
        let subtable = match &*record.subtable {
            WriteCmapSubtable::Format4(_) | WriteCmapSubtable::Format6(_) if unicode => {
                match &bmp {
                    Some(cmap4) => WriteCmapSubtable::Format4(cmap4.clone()),
                    None => continue,
                }
            }
            WriteCmapSubtable::Format12(_) if unicode => WriteCmapSubtable::Format12(full.clone()),
            _ => {
                records.push(record);
                continue;
            }
        };
        records.push(EncodingRecord::new(record.platform_id, record.encoding_id, subtable));
    }

    let has = |records: &[EncodingRecord], format12: bool| {
        records.iter().any(|r| {
            is_unicode(r.platform_id, r.encoding_id)
                && match &*r.subtable {
                    WriteCmapSubtable::Format4(_) => !format12,
                    WriteCmapSubtable::Format12(_) => format12,
                    _ => false,
                }
        })
    };
    if let Some(cmap4) = bmp.filter(|_| !has(&records, false)) {
        for (platform, encoding) in [(PlatformId::Unicode, 3), (PlatformId::Windows, 1)] {
            let subtable = WriteCmapSubtable::Format4(cmap4.clone());
            push_missing(&mut records, platform, encoding, subtable);
        }
    }
    if needs_full && !has(&records, true) {
        for (platform, encoding) in [(PlatformId::Unicode, 4), (PlatformId::Windows, 10)] {
            let subtable = WriteCmapSubtable::Format12(full.clone());
            push_missing(&mut records, platform, encoding, subtable);
        }
    }

    records.sort_by_key(|r| (r.platform_id, r.encoding_id));
    Ok(Cmap::new(records))
}

/// Unicode platform subtables other than variation sequences, and the
/// Windows Unicode encodings.
fn is_unicode(platform: PlatformId, encoding: u16) -> bool {
    match platform {
        PlatformId::Unicode => encoding != 5,
        PlatformId::Windows => encoding == 1 || encoding == 10,
        _ => false,
    }
}

fn push_missing(
    records: &mut Vec<EncodingRecord>,
    platform: PlatformId,
    encoding: u16,
    subtable: WriteCmapSubtable,
) {
    if !records.iter().any(|r| r.platform_id == platform && r.encoding_id == encoding) {
        records.push(EncodingRecord::new(platform, encoding, subtable));
    }
}

/// The subtable length field of format 4 is 16 bits.
fn format4_fits(cmap4: &Cmap4) -> bool {
    let len = 16 + 8 * cmap4.end_code.len() + 2 * cmap4.glyph_id_array.len();
    len <= u16::MAX as usize
}

/// Groups consecutive codepoints that map to consecutive glyph ids.
fn build_sequential_groups(mappings: &[(u32, u32)]) -> Vec<SequentialMapGroup> {
    let Some((&(first_cp, first_gid), rest)) = mappings.split_first() else {
        return Vec::new();
    };

    let mut groups = Vec::new();
    let (mut start_cp, mut start_gid) = (first_cp, first_gid);
    let (mut prev_cp, mut prev_gid) = (first_cp, first_gid);

    for &(cp, gid) in rest {
        if cp == prev_cp + 1 && gid == prev_gid + 1 {
            prev_cp = cp;
            prev_gid = gid;
        } else {
            groups.push(SequentialMapGroup::new(start_cp, prev_cp, start_gid));
            (start_cp, start_gid) = (cp, gid);
            (prev_cp, prev_gid) = (cp, gid);
        }
    }
    groups.push(SequentialMapGroup::new(start_cp, prev_cp, start_gid));

    groups
}

fn find_best_subtable<'a>(cmap: &'a ReadCmap<'a>) -> Option<CmapSubtable<'a>> {
    let records = cmap.encoding_records();

    let pick = |encoding: u16, want_format12: bool| {
        records.iter().find_map(|record| {
            let unicode = record.platform_id() == PlatformId::Unicode
                || (record.platform_id() == PlatformId::Windows
                    && record.encoding_id() == encoding);
            let subtable = record.subtable(cmap.offset_data()).ok()?;
            let format_ok = if want_format12 {
                matches!(subtable, CmapSubtable::Format12(_))
            } else {
                matches!(subtable, CmapSubtable::Format4(_))
            };
            (unicode && format_ok).then_some(subtable)
        })
    };

    pick(10, true)
        .or_else(|| pick(1, false))
        .or_else(|| records.iter().find_map(|r| r.subtable(cmap.offset_data()).ok()))
}

fn iter_cmap_subtable(subtable: &CmapSubtable) -> Vec<(Codepoint, GlyphId)> {
    let mut mappings = Vec::new();

    match subtable {
        CmapSubtable::Format4(f4) => {
            let end_codes = f4.end_code();
            let start_codes = f4.start_code();
            let id_deltas = f4.id_delta();
            let id_range_offsets = f4.id_range_offsets();
            let glyph_id_array = f4.glyph_id_array();

            let seg_count = f4.seg_count_x2() as usize / 2;
            for seg in 0..seg_count {
                let end_code = end_codes.get(seg).map(|v| v.get()).unwrap_or(0xFFFF);
                let start_code = start_codes.get(seg).map(|v| v.get()).unwrap_or(0xFFFF);
                let id_delta = id_deltas.get(seg).map(|v| v.get()).unwrap_or(0);
                let id_range_offset = id_range_offsets.get(seg).map(|v| v.get()).unwrap_or(0);

                if start_code == 0xFFFF {
                    continue;
                }

                for cp in start_code..=end_code {
                    let gid = if id_range_offset == 0 {
                        ((cp as i32 + id_delta as i32) & 0xFFFF) as u16
                    } else {
                        let glyph_idx = (id_range_offset as usize / 2 + (cp - start_code) as usize)
                            .checked_sub(seg_count - seg);
                        match glyph_idx.and_then(|i| glyph_id_array.get(i)).map(|g| g.get()) {
                            Some(0) | None => 0,
                            Some(gid) => ((gid as i32 + id_delta as i32) & 0xFFFF) as u16,
                        }
                    };

                    if gid != 0 {
                        mappings.push((Codepoint::new(cp as u32), GlyphId::new(gid)));
                    }
                }
            }
        }
        CmapSubtable::Format12(f12) => {
            for group in f12.groups() {
                let mut gid = group.start_glyph_id();
                for cp in group.start_char_code()..=group.end_char_code() {
                    if gid != 0 && gid <= u16::MAX as u32 {
                        mappings.push((Codepoint::new(cp), GlyphId::new(gid as u16)));
                    }
                    gid += 1;
                }
            }
        }
        CmapSubtable::Format6(f6) => {
            let first = f6.first_code() as u32;
            for (i, gid) in f6.glyph_id_array().iter().enumerate() {
                let gid = gid.get();
                if gid != 0 {
                    mappings.push((Codepoint::new(first + i as u32), GlyphId::new(gid)));
                }
            }
        }
        _ => {}
    }

    mappings
}
