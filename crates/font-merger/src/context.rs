//! Merge plan and context
//!
//! - `GlyphPlan`: which donor glyphs are imported, where every donor glyph
//!   lands in the merged font, and the merged glyph names
//! - `MergeContext`: the two fonts, the plan and the options, passed to all
//!   table mergers

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;
use read_fonts::{FontRef, TableProvider, tables::glyf::Glyph as ReadGlyph, types};

use crate::{
    MergeError, Result,
    glyph_order::{GlyphName, post_glyph_names},
    options::Options,
    tables::cmap::read_mappings,
    types::{Codepoint, GlyphId, MergedGlyphId},
};

/// How a donor glyph is represented in the merged font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonorGlyph {
    /// The base already has it; references go to the base glyph.
    Redirected(MergedGlyphId),
    /// Copied into the merged font at the given id.
    Imported(MergedGlyphId),
}

impl DonorGlyph {
    pub fn merged_id(self) -> MergedGlyphId {
        match self {
            Self::Redirected(gid) | Self::Imported(gid) => gid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlyphPlan {
    base_glyph_count: u16,
    names: Vec<GlyphName>,
    imported: Vec<GlyphId>,
    donor_map: HashMap<GlyphId, DonorGlyph>,
    mappings: Vec<(Codepoint, MergedGlyphId)>,
    added_codepoints: usize,
}

impl GlyphPlan {
    pub fn compute(base: &FontRef, donor: &FontRef) -> Result<Self> {
        let base_names = post_glyph_names(base);
        let donor_names = post_glyph_names(donor);
        let base_glyph_count = base_names.len() as u16;

        let base_cmap = read_mappings(base);
        let donor_cmap = read_mappings(donor);

        let base_by_cp: HashMap<Codepoint, GlyphId> = base_cmap.iter().copied().collect();
        let mut base_by_name: HashMap<&GlyphName, GlyphId> = HashMap::new();
        for (gid, name) in base_names.iter().enumerate() {
            if let Some(name) = name {
                base_by_name.entry(name).or_insert(GlyphId::new(gid as u16));
            }
        }

        let mut donor_cps: BTreeMap<GlyphId, Vec<Codepoint>> = BTreeMap::new();
        for &(cp, gid) in &donor_cmap {
            donor_cps.entry(gid).or_default().push(cp);
        }

        let mut donor_map = HashMap::new();
        let mut to_import = BTreeSet::new();

        for (gid, name) in donor_names.iter().enumerate() {
            let gid = GlyphId::new(gid as u16);
            let cps = donor_cps.get(&gid).map(Vec::as_slice).unwrap_or_default();

            let present = if gid.to_u16() == 0 {
                Some(GlyphId::new(0))
            } else if let Some(&base_gid) = name.as_ref().and_then(|n| base_by_name.get(n)) {
                Some(base_gid)
            } else if !cps.is_empty() && cps.iter().all(|cp| base_by_cp.contains_key(cp)) {
                base_by_cp.get(&cps[0]).copied()
            } else {
                None
            };

            match present {
                Some(base_gid) => {
                    let redirected = DonorGlyph::Redirected(MergedGlyphId::from_base(base_gid));
                    donor_map.insert(gid, redirected);
                }
                None if name.is_some() || !cps.is_empty() => {
                    to_import.insert(gid);
                }
                None => {}
            }
        }

        // composites pull in their components
        let mut pending: Vec<GlyphId> = to_import.iter().copied().collect();
        while let Some(gid) = pending.pop() {
            for component in composite_components(donor, gid)? {
                if !donor_map.contains_key(&component) && to_import.insert(component) {
                    pending.push(component);
                }
            }
        }

        let total = base_glyph_count as usize + to_import.len();
        if total > u16::MAX as usize {
            return Err(MergeError::TooManyGlyphs(total));
        }

        let mut used: HashSet<GlyphName> = HashSet::new();
        let mut names = Vec::with_capacity(total);
        for (gid, name) in base_names.iter().enumerate() {
            let name = name.clone().unwrap_or_else(|| GlyphName::synthesized(gid as u16));
            names.push(unique_name(name, &mut used));
        }

        let imported: Vec<GlyphId> = to_import.into_iter().collect();
        for (i, &gid) in imported.iter().enumerate() {
            let merged = MergedGlyphId::new(base_glyph_count + i as u16);
            donor_map.insert(gid, DonorGlyph::Imported(merged));

            let name = donor_names[gid.to_u16() as usize]
                .clone()
                .unwrap_or_else(|| GlyphName::synthesized(merged.to_u16()));
            names.push(unique_name(name, &mut used));
        }

        let mut mappings: Vec<(Codepoint, MergedGlyphId)> = base_cmap
            .iter()
            .map(|&(cp, gid)| (cp, MergedGlyphId::from_base(gid)))
            .collect();
        let mut added = HashSet::new();
        for &(cp, gid) in &donor_cmap {
            if base_by_cp.contains_key(&cp) || !added.insert(cp) {
                continue;
            }
            if let Some(target) = donor_map.get(&gid) {
                mappings.push((cp, target.merged_id()));
            }
        }

        debug!(
            "glyph plan: {} base glyphs, {} imported, {} redirected, {} codepoints added",
            base_glyph_count,
            imported.len(),
            donor_map.len() - imported.len(),
            added.len()
        );

        Ok(Self {
            base_glyph_count,
            names,
            imported,
            donor_map,
            mappings,
            added_codepoints: added.len(),
        })
    }

    pub fn base_glyph_count(&self) -> u16 {
        self.base_glyph_count
    }

    pub fn total_glyphs(&self) -> u16 {
        self.names.len() as u16
    }

    /// Merged glyph names, in merged glyph id order.
    pub fn names(&self) -> &[GlyphName] {
        &self.names
    }

    /// Donor glyphs copied into the merged font, in merged order.
    pub fn imported(&self) -> &[GlyphId] {
        &self.imported
    }

    pub fn donor_glyph(&self, gid: GlyphId) -> Option<DonorGlyph> {
        self.donor_map.get(&gid).copied()
    }

    pub fn redirected_count(&self) -> usize {
        self.donor_map.len() - self.imported.len()
    }

    /// Every codepoint of the merged cmap.
    pub fn mappings(&self) -> &[(Codepoint, MergedGlyphId)] {
        &self.mappings
    }

    pub fn added_codepoints(&self) -> usize {
        self.added_codepoints
    }

    /// Whether the merged font would be identical to the base.
    pub fn is_noop(&self) -> bool {
        self.imported.is_empty() && self.added_codepoints == 0
    }
}

fn unique_name(name: GlyphName, used: &mut HashSet<GlyphName>) -> GlyphName {
    let name = if used.contains(&name) {
        (1..)
            .map(|n| name.with_suffix(n))
            .find(|candidate| !used.contains(candidate))
            .unwrap_or(name)
    } else {
        name
    };
    used.insert(name.clone());
    name
}

fn composite_components(font: &FontRef, gid: GlyphId) -> Result<Vec<GlyphId>> {
    let (Ok(glyf), Ok(loca)) = (font.glyf(), font.loca(None)) else {
        return Ok(Vec::new());
    };
    match loca.get_glyf(types::GlyphId::new(gid.to_u32()), &glyf)? {
        Some(ReadGlyph::Composite(composite)) => Ok(composite
            .components()
            .map(|c| GlyphId::from(c.glyph))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Central context passed to all table mergers
pub struct MergeContext<'a> {
    base: &'a FontRef<'a>,
    donor: &'a FontRef<'a>,
    plan: GlyphPlan,
    options: &'a Options,
}

impl<'a> MergeContext<'a> {
    pub fn new(
        base: &'a FontRef<'a>,
        donor: &'a FontRef<'a>,
        plan: GlyphPlan,
        options: &'a Options,
    ) -> Self {
        Self { base, donor, plan, options }
    }

    pub fn base(&self) -> &FontRef<'a> {
        self.base
    }

    pub fn donor(&self) -> &FontRef<'a> {
        self.donor
    }

    pub fn plan(&self) -> &GlyphPlan {
        &self.plan
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Merged id of a donor glyph, if it survives the merge.
    pub fn remap_donor(&self, gid: GlyphId) -> Option<MergedGlyphId> {
        self.plan.donor_glyph(gid).map(DonorGlyph::merged_id)
    }
}
