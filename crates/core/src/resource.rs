//! Open fonts and the operations the pipeline runs on them.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};
use read_fonts::{FontRef, TableProvider};

use fontfill_font_merger::{
    Codepoint, GlyphName, Merger, Options, post_glyph_names, read_mappings,
};
use fontfill_font_metadata::{NameEntry, copy_name_table, display_name, name_entries};
use fontfill_font_ops::EmbeddingPermissions;
use fontfill_font_scale::scale_units_per_em;

use crate::{error::OpenError, io::FontFile};

/// One glyph of a [`GlyphSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphEntry {
    pub name: GlyphName,
    pub codepoints: Vec<Codepoint>,
}

/// The glyphs of a font in glyph order, with the codepoints mapped to each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphSet {
    entries: Vec<GlyphEntry>,
}

impl GlyphSet {
    pub fn new(entries: Vec<GlyphEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[GlyphEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GlyphEntry> {
        self.entries.iter().find(|e| e.name.as_str() == name)
    }

    /// Every glyph of `other` is present here under the same name, mapped from
    /// at least the same codepoints.
    pub fn is_superset_of(&self, other: &GlyphSet) -> bool {
        other.entries.iter().all(|theirs| {
            self.get(&theirs.name)
                .is_some_and(|ours| theirs.codepoints.iter().all(|c| ours.codepoints.contains(c)))
        })
    }
}

/// An open, mutable font owned by the pipeline for one pair.
pub trait FontResource: Sized {
    /// Where the font was loaded from.
    fn path(&self) -> &Path;

    /// Units per em.
    fn em(&self) -> u16;

    /// Rescale every coordinate so the font uses `em` units per em.
    fn set_em(&mut self, em: u16) -> Result<()>;

    fn name_entries(&self) -> Result<Vec<NameEntry>>;

    /// Replace this font's naming metadata with an exact copy of `source`'s.
    fn copy_metadata_from(&mut self, source: &Self) -> Result<()>;

    fn glyph_set(&self) -> Result<GlyphSet>;

    /// Import the glyphs of `source` this font lacks. Existing glyphs are
    /// never overwritten.
    fn merge_from(&mut self, source: &Self, preserve_cross_font_kerning: bool) -> Result<()>;

    /// Write the font to `path`.
    fn generate(&self, path: &Path) -> Result<()>;

    /// Release the font.
    fn close(self) {
        debug!("Closed {}", self.path().display());
    }
}

/// Opens fonts for the pipeline.
pub trait FontLoader {
    type Font: FontResource;

    /// Open the font at `path`. Fonts with restricted embedding permissions
    /// are refused unless `fstype_permitted` is set.
    fn open(
        &self,
        path: &Path,
        fstype_permitted: bool,
    ) -> std::result::Result<Self::Font, OpenError>;
}

/// A TrueType font held in memory.
#[derive(Clone)]
pub struct SfntFont {
    path: PathBuf,
    data: Vec<u8>,
    em: u16,
}

impl Debug for SfntFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfntFont")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .field("em", &self.em)
            .finish()
    }
}

impl SfntFont {
    /// Parse `data`, checking embedding permissions.
    pub fn from_bytes(
        path: impl Into<PathBuf>,
        data: Vec<u8>,
        fstype_permitted: bool,
    ) -> std::result::Result<Self, OpenError> {
        let font = FontRef::new(&data)?;
        let permissions = EmbeddingPermissions::of(&font);
        if permissions.is_restricted() && !fstype_permitted {
            return Err(OpenError::EmbeddingRestricted { fs_type: permissions.bits() });
        }
        let em = font.head()?.units_per_em();
        Ok(Self { path: path.into(), data, em })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn font(&self) -> Result<FontRef<'_>> {
        FontRef::new(&self.data)
            .with_context(|| format!("{} is no longer a valid font", self.path.display()))
    }
}

impl FontResource for SfntFont {
    fn path(&self) -> &Path {
        &self.path
    }

    fn em(&self) -> u16 {
        self.em
    }

    fn set_em(&mut self, em: u16) -> Result<()> {
        if em == self.em {
            return Ok(());
        }
        self.data = scale_units_per_em(&self.data, em)?;
        info!("Rescaled {} from {} to {em} units per em", self.path.display(), self.em);
        self.em = em;
        Ok(())
    }

    fn name_entries(&self) -> Result<Vec<NameEntry>> {
        name_entries(&self.data)
    }

    fn copy_metadata_from(&mut self, source: &Self) -> Result<()> {
        self.data = copy_name_table(&source.data, &self.data)?;
        Ok(())
    }

    fn glyph_set(&self) -> Result<GlyphSet> {
        let font = self.font()?;
        let names = post_glyph_names(&font);
        let mut codepoints: Vec<Vec<Codepoint>> = vec![Vec::new(); names.len()];
        for (cp, gid) in read_mappings(&font) {
            if let Some(list) = codepoints.get_mut(gid.to_u16() as usize) {
                list.push(cp);
            }
        }

        let entries = names
            .into_iter()
            .zip(codepoints)
            .enumerate()
            .map(|(gid, (name, codepoints))| GlyphEntry {
                name: name.unwrap_or_else(|| GlyphName::synthesized(gid as u16)),
                codepoints,
            })
            .collect();
        Ok(GlyphSet::new(entries))
    }

    fn merge_from(&mut self, source: &Self, preserve_cross_font_kerning: bool) -> Result<()> {
        // Units were settled (or deliberately left) by the reconciler.
        let options = Options::new()
            .preserve_cross_font_kerning(preserve_cross_font_kerning)
            .allow_mismatched_units(true);
        let (merged, summary) = Merger::new(options).merge_with_summary(&self.data, &source.data)?;
        info!(
            "Merged {} into {}: {} glyphs imported, {} codepoints added, {} kern pairs added",
            source.path.display(),
            self.path.display(),
            summary.imported_glyphs,
            summary.added_codepoints,
            summary.kern_pairs_added
        );
        self.data = merged;
        Ok(())
    }

    fn generate(&self, path: &Path) -> Result<()> {
        FontFile::new(path)
            .write(&self.data)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Loads [`SfntFont`]s from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct SfntLoader;

impl FontLoader for SfntLoader {
    type Font = SfntFont;

    fn open(
        &self,
        path: &Path,
        fstype_permitted: bool,
    ) -> std::result::Result<SfntFont, OpenError> {
        let data = FontFile::new(path).read()?;
        let font = SfntFont::from_bytes(path, data, fstype_permitted)?;
        if let Ok(entries) = name_entries(&font.data) {
            debug!(
                "Opened {} ({}, {} units per em)",
                path.display(),
                display_name(&entries).unwrap_or("unnamed"),
                font.em
            );
        }
        Ok(font)
    }
}
