//! Legacy `kern` table (OpenType version 0) codec.
//!
//! Format 0 subtables are decoded into pairs so they can be rescaled and
//! remapped; subtables in any other format are carried through as raw bytes.

use anyhow::{Result, bail};
use read_fonts::FontData;

const HEADER_LEN: usize = 4;
const SUBTABLE_HEADER_LEN: usize = 6;
const FORMAT0_HEADER_LEN: usize = 8;
const PAIR_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernPair {
    pub left: u16,
    pub right: u16,
    pub value: i16,
}

impl KernPair {
    pub const fn new(left: u16, right: u16, value: i16) -> Self {
        Self { left, right, value }
    }

    fn key(&self) -> u32 {
        (self.left as u32) << 16 | self.right as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernBody {
    Pairs(Vec<KernPair>),
    /// Subtable payload after the 6-byte header, for formats other than 0.
    Raw { format: u8, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernSubtable {
    pub version: u16,
    /// Coverage flags in the low byte; the format lives in the high byte.
    pub coverage: u16,
    pub body: KernBody,
}

impl KernSubtable {
    pub fn pairs(coverage_flags: u8, pairs: Vec<KernPair>) -> Self {
        Self { version: 0, coverage: coverage_flags as u16, body: KernBody::Pairs(pairs) }
    }

    pub fn pairs_mut(&mut self) -> Option<&mut Vec<KernPair>> {
        match &mut self.body {
            KernBody::Pairs(pairs) => Some(pairs),
            KernBody::Raw { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernTable {
    pub subtables: Vec<KernSubtable>,
}

impl KernTable {
    /// Decode a version 0 `kern` table.
    ///
    /// Returns `Ok(None)` for the Apple variant (version 1.0), which is left
    /// to callers to copy verbatim.
    pub fn parse(bytes: &[u8]) -> Result<Option<Self>> {
        let data = FontData::new(bytes);
        let version: u16 = data.read_at(0)?;
        if version != 0 {
            return Ok(None);
        }
        let n_tables: u16 = data.read_at(2)?;

        let mut offset = HEADER_LEN;
        let mut subtables = Vec::with_capacity(n_tables as usize);
        for _ in 0..n_tables {
            let sub_version: u16 = data.read_at(offset)?;
            let coverage: u16 = data.read_at(offset + 4)?;
            let format = (coverage >> 8) as u8;

            if format == 0 {
                let n_pairs: u16 = data.read_at(offset + SUBTABLE_HEADER_LEN)?;
                let pairs_start = offset + SUBTABLE_HEADER_LEN + FORMAT0_HEADER_LEN;
                let pairs = (0..n_pairs as usize)
                    .map(|i| {
                        let at = pairs_start + i * PAIR_LEN;
                        Ok(KernPair {
                            left: data.read_at(at)?,
                            right: data.read_at(at + 2)?,
                            value: data.read_at(at + 4)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                offset = pairs_start + n_pairs as usize * PAIR_LEN;
                subtables.push(KernSubtable {
                    version: sub_version,
                    coverage,
                    body: KernBody::Pairs(pairs),
                });
            } else {
                // the stored length is 16-bit and may have wrapped, so only trust
                // it for non-format-0 subtables which are expected to be small
                let length: u16 = data.read_at(offset + 2)?;
                let end = offset + length as usize;
                if length as usize <= SUBTABLE_HEADER_LEN || end > bytes.len() {
                    bail!("kern subtable format {format} has invalid length {length}");
                }
                let raw = bytes[offset + SUBTABLE_HEADER_LEN..end].to_vec();
                offset = end;
                subtables.push(KernSubtable {
                    version: sub_version,
                    coverage,
                    body: KernBody::Raw { format, data: raw },
                });
            }
        }

        Ok(Some(Self { subtables }))
    }

    /// Encode as a version 0 table. Format 0 pairs are sorted on the way out.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&(self.subtables.len() as u16).to_be_bytes());

        for subtable in &self.subtables {
            let body = match &subtable.body {
                KernBody::Pairs(pairs) => encode_format0(pairs),
                KernBody::Raw { data, .. } => data.clone(),
            };
            let length = (SUBTABLE_HEADER_LEN + body.len()) & 0xFFFF;
            out.extend_from_slice(&subtable.version.to_be_bytes());
            out.extend_from_slice(&(length as u16).to_be_bytes());
            out.extend_from_slice(&subtable.coverage.to_be_bytes());
            out.extend_from_slice(&body);
        }

        out
    }

    /// Apply `f` to every format 0 pair, dropping pairs for which it returns `None`.
    pub fn filter_map_pairs(&mut self, mut f: impl FnMut(KernPair) -> Option<KernPair>) {
        for subtable in &mut self.subtables {
            if let Some(pairs) = subtable.pairs_mut() {
                *pairs = pairs.iter().copied().filter_map(&mut f).collect();
            }
        }
    }
}

fn encode_format0(pairs: &[KernPair]) -> Vec<u8> {
    let mut sorted = pairs.to_vec();
    sorted.sort_by_key(KernPair::key);
    sorted.dedup_by_key(|p| p.key());

    let n_pairs = sorted.len() as u16;
    let (search_range, entry_selector) = binary_search_params(n_pairs);
    let range_shift = (n_pairs as u32 * PAIR_LEN as u32).saturating_sub(search_range as u32) as u16;

    let mut out = Vec::with_capacity(FORMAT0_HEADER_LEN + sorted.len() * PAIR_LEN);
    out.extend_from_slice(&n_pairs.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());
    for pair in &sorted {
        out.extend_from_slice(&pair.left.to_be_bytes());
        out.extend_from_slice(&pair.right.to_be_bytes());
        out.extend_from_slice(&pair.value.to_be_bytes());
    }
    out
}

fn binary_search_params(n_pairs: u16) -> (u16, u16) {
    if n_pairs == 0 {
        return (0, 0);
    }
    let entry_selector = 15 - n_pairs.leading_zeros() as u16;
    let search_range = ((1u32 << entry_selector) * PAIR_LEN as u32).min(u16::MAX as u32) as u16;
    (search_range, entry_selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encoded_table() {
        let table = KernTable {
            subtables: vec![KernSubtable::pairs(
                0x01,
                vec![KernPair::new(3, 1, -40), KernPair::new(1, 2, -20)],
            )],
        };
        let parsed = KernTable::parse(&table.to_bytes()).unwrap().unwrap();
        let pairs = match &parsed.subtables[0].body {
            KernBody::Pairs(pairs) => pairs.clone(),
            other => panic!("unexpected body {other:?}"),
        };
        // sorted by (left, right)
        assert_eq!(pairs, vec![KernPair::new(1, 2, -20), KernPair::new(3, 1, -40)]);
        assert_eq!(parsed.subtables[0].coverage, 0x0001);
    }

    #[test]
    fn test_apple_kern_is_skipped() {
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(KernTable::parse(&bytes).unwrap().is_none());
    }

    #[test]
    fn test_binary_search_params() {
        assert_eq!(binary_search_params(1), (6, 0));
        assert_eq!(binary_search_params(5), (24, 2));
        assert_eq!(binary_search_params(8), (48, 3));
    }

    #[test]
    fn test_filter_map_pairs() {
        let mut table = KernTable {
            subtables: vec![KernSubtable::pairs(
                0x01,
                vec![KernPair::new(1, 2, -20), KernPair::new(2, 3, 10)],
            )],
        };
        table.filter_map_pairs(|p| (p.left != 2).then_some(KernPair { value: p.value * 2, ..p }));
        assert_eq!(table.subtables[0].body, KernBody::Pairs(vec![KernPair::new(1, 2, -40)]));
    }
}
