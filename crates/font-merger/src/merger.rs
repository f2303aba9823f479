//! Main Merger implementation

use std::collections::HashSet;

use log::{info, warn};
use read_fonts::{FontRef, TableProvider, types::Tag};
use write_fonts::FontBuilder;

use crate::{
    MergeError, Result,
    context::{GlyphPlan, MergeContext},
    options::Options,
    tables::{
        cmap::build_cmap,
        glyf::merge_glyf,
        head::{merge_head, merge_maxp},
        hmtx::{merge_hhea, merge_hmtx},
        kern::{KERN, merge_kern},
        os2::merge_os2,
        post::merge_post,
        vmtx::merge_vmtx,
    },
};

/// Tables rebuilt by the merger rather than copied from the base
const HANDLED_TABLES: &[[u8; 4]] = &[
    *b"head", *b"maxp", *b"cmap", *b"hmtx", *b"hhea", *b"post", *b"OS/2", *b"vhea", *b"vmtx",
    *b"glyf", *b"loca", *b"kern",
];

/// Per-glyph device tables that go stale once glyphs are added
const PER_GLYPH_TABLES: &[[u8; 4]] = &[*b"hdmx", *b"LTSH", *b"VDMX"];

/// Always dropped: the signature no longer matches
const DSIG: Tag = Tag::new(b"DSIG");

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub imported_glyphs: usize,
    pub redirected_glyphs: usize,
    pub added_codepoints: usize,
    pub kern_pairs_added: usize,
}

impl MergeSummary {
    pub fn is_empty(&self) -> bool {
        self.imported_glyphs == 0 && self.added_codepoints == 0
    }
}

/// Imports glyphs from a donor font into a base font.
///
/// Base glyphs keep their ids and outlines; donor glyphs the base lacks are
/// appended after them.
#[derive(Default)]
pub struct Merger {
    options: Options,
}

impl Merger {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Merge `donor` into `base`, returning the merged font data.
    pub fn merge(&self, base: &[u8], donor: &[u8]) -> Result<Vec<u8>> {
        self.merge_with_summary(base, donor).map(|(data, _)| data)
    }

    pub fn merge_with_summary(&self, base: &[u8], donor: &[u8]) -> Result<(Vec<u8>, MergeSummary)> {
        let base_font = FontRef::new(base)?;
        let donor_font = FontRef::new(donor)?;

        self.validate_units_per_em(&base_font, &donor_font)?;
        if base_font.table_data(Tag::new(b"gvar")).is_some() {
            return Err(MergeError::VariableBase);
        }

        let plan = GlyphPlan::compute(&base_font, &donor_font)?;
        let mut summary = MergeSummary {
            imported_glyphs: plan.imported().len(),
            redirected_glyphs: plan.redirected_count(),
            added_codepoints: plan.added_codepoints(),
            kern_pairs_added: 0,
        };

        if plan.is_noop() && self.options.drop_tables.is_empty() {
            info!("donor adds no glyphs or codepoints; base left unchanged");
            return Ok((base.to_vec(), summary));
        }

        info!(
            "Merging {} donor glyphs into {} base glyphs ({} codepoints added)",
            plan.imported().len(),
            plan.base_glyph_count(),
            plan.added_codepoints()
        );

        let ctx = MergeContext::new(&base_font, &donor_font, plan, &self.options);

        let glyf = merge_glyf(&ctx)?;
        let head = merge_head(ctx.base(), &glyf)?;
        let maxp = merge_maxp(ctx.base(), ctx.donor(), &glyf, ctx.plan().total_glyphs())?;
        let cmap = build_cmap(ctx.base(), ctx.plan().mappings())?;
        let hmtx = merge_hmtx(&ctx)?;
        let hhea = merge_hhea(ctx.base(), ctx.donor(), &hmtx)?;
        let post = merge_post(ctx.base(), ctx.plan())?;
        let os2 = merge_os2(ctx.base(), ctx.donor(), ctx.plan());
        let vertical = merge_vmtx(&ctx)?;
        let kern = merge_kern(&ctx)?;
        summary.kern_pairs_added = kern.pairs_added;

        let mut builder = FontBuilder::new();
        builder.add_table(&head)?;
        builder.add_table(&maxp)?;
        builder.add_table(&cmap)?;
        builder.add_table(&hhea)?;
        builder.add_table(&hmtx)?;
        builder.add_table(&post)?;
        builder.add_table(&glyf.glyf)?;
        builder.add_table(&glyf.loca)?;

        if let Some(os2) = os2.filter(|_| !self.options.should_drop_tag(Tag::new(b"OS/2"))) {
            builder.add_table(&os2)?;
        }
        if let Some((vhea, vmtx)) = vertical {
            builder.add_table(&vhea)?;
            builder.add_table(&vmtx)?;
        }
        if let Some(data) = kern.data.filter(|_| !self.options.should_drop_tag(KERN)) {
            builder.add_raw(KERN, data);
        }

        self.copy_other_tables(&mut builder, ctx.base(), ctx.plan().imported().is_empty());

        Ok((builder.build(), summary))
    }

    fn validate_units_per_em(&self, base: &FontRef, donor: &FontRef) -> Result<()> {
        let base_upem = base.head()?.units_per_em();
        let donor_upem = donor.head()?.units_per_em();
        if base_upem == donor_upem {
            return Ok(());
        }
        if self.options.allow_mismatched_units {
            warn!(
                "unitsPerEm differ (base {base_upem}, donor {donor_upem}); \
                 donor outlines are copied unscaled"
            );
            Ok(())
        } else {
            Err(MergeError::IncompatibleUnitsPerEm { base: base_upem, donor: donor_upem })
        }
    }

    fn copy_other_tables(&self, builder: &mut FontBuilder, font: &FontRef, glyphs_unchanged: bool) {
        let handled: HashSet<Tag> = HANDLED_TABLES.iter().map(Tag::new).collect();
        let per_glyph: HashSet<Tag> = PER_GLYPH_TABLES.iter().map(Tag::new).collect();

        for record in font.table_directory.table_records() {
            let tag = record.tag();
            if handled.contains(&tag)
                || tag == DSIG
                || (!glyphs_unchanged && per_glyph.contains(&tag))
                || self.options.should_drop_tag(tag)
                || builder.contains(tag)
            {
                continue;
            }
            if let Some(data) = font.table_data(tag) {
                builder.add_raw(tag, data.as_bytes().to_vec());
            }
        }
    }
}
