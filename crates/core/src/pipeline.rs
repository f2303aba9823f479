//! Pairing of target fonts with source fonts and the per-pair pipeline.

use std::{
    collections::HashMap,
    ffi::OsStr,
    fmt::{self, Display, Formatter},
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use anyhow::anyhow;
use log::{error, info, warn};

use crate::{
    config::{FONT_EXTENSION, MergeConfig},
    error::{BatchError, PairError},
    io::locate_fonts,
    reconcile::{Reconciliation, Side, UnitDecider, reconcile},
    report::{BatchReport, PairOutcome, PairReport},
    resource::{FontLoader, FontResource},
};

/// Source kerning pairs are kept even when they touch glyphs the target
/// already had.
const PRESERVE_CROSS_FONT_KERNING: bool = true;

/// Progress of a run, reported as it happens.
#[derive(Debug)]
pub enum PipelineEvent<'a> {
    Loaded { side: Side, path: &'a Path },
    Reconciled(Reconciliation),
    GlyphsMerged,
    MetadataCopied,
    Saved { path: &'a Path },
    Skipped { target: &'a Path },
    Failed { target: &'a Path, error: &'a PairError },
}

impl Display for PipelineEvent<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded { side, path } => write!(f, "Loaded {side} font: {}", path.display()),
            Self::Reconciled(r) => write!(f, "*** {r}"),
            Self::GlyphsMerged => write!(f, "*** merged glyphs"),
            Self::MetadataCopied => write!(f, "*** copied meta data"),
            Self::Saved { path } => write!(f, "Saved modified font to: {}", path.display()),
            Self::Skipped { target } => write!(
                f,
                "{} has no corresponding source .{FONT_EXTENSION} file, skipping.",
                target.display()
            ),
            Self::Failed { error, .. } => {
                write!(f, "An error occurred: [{}] {error}", error.kind())
            }
        }
    }
}

/// Matching key of a font: its file name.
pub fn pairing_key(path: &Path) -> Option<&OsStr> {
    path.file_name()
}

/// Index sources by file name. `sources` must be sorted; the first path with
/// a given name wins.
fn index_by_name(sources: &[PathBuf]) -> HashMap<&OsStr, &Path> {
    let mut index = HashMap::new();
    for source in sources {
        let Some(key) = pairing_key(source) else {
            continue;
        };
        index
            .entry(key)
            .and_modify(|kept: &mut &Path| {
                warn!("Duplicate source {}; using {}", source.display(), kept.display())
            })
            .or_insert(source.as_path());
    }
    index
}

/// Drives a batch: every target is paired, processed and reported.
pub struct Pipeline<'a, L, D> {
    config: &'a MergeConfig,
    loader: L,
    decider: D,
}

impl<'a, L: FontLoader, D: UnitDecider> Pipeline<'a, L, D> {
    pub fn new(config: &'a MergeConfig, loader: L, decider: D) -> Self {
        Self { config, loader, decider }
    }

    pub fn config(&self) -> &MergeConfig {
        self.config
    }

    /// Process every target font under the target directory.
    ///
    /// Pair failures are recorded and the batch moves on; only enumeration
    /// and output directory errors abort it.
    pub fn run(
        &mut self,
        mut on_event: impl FnMut(&PipelineEvent<'_>),
    ) -> Result<BatchReport, BatchError> {
        let sources = locate_fonts(&self.config.source_dir)?;
        let targets = locate_fonts(&self.config.target_dir)?;
        info!(
            "Found {} source and {} target fonts",
            sources.len(),
            targets.len()
        );

        create_dir_all(&self.config.output_dir).map_err(|source| BatchError::OutputDir {
            path: self.config.output_dir.clone(),
            source,
        })?;

        let index = index_by_name(&sources);
        let mut report = BatchReport::default();

        for target in targets {
            let source = pairing_key(&target).and_then(|key| index.get(key)).copied();
            let outcome = match source {
                None => {
                    on_event(&PipelineEvent::Skipped { target: &target });
                    PairOutcome::SkippedNoSource
                }
                Some(source) => match self.process_pair(source, &target, &mut on_event) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("{}: {e}", target.display());
                        on_event(&PipelineEvent::Failed { target: &target, error: &e });
                        PairOutcome::Failed(e)
                    }
                },
            };
            report.push(PairReport {
                source: source.map(Path::to_path_buf),
                target,
                outcome,
            });
        }

        info!("{}", report.summary());
        Ok(report)
    }

    /// Run one pair: open both fonts, reconcile units, merge glyphs, copy
    /// metadata and write the target to the output directory.
    ///
    /// Both fonts are closed whatever the result.
    pub fn process_pair(
        &mut self,
        source: &Path,
        target: &Path,
        on_event: &mut impl FnMut(&PipelineEvent<'_>),
    ) -> Result<PairOutcome, PairError> {
        let fstype_permitted = self.config.fstype_permitted;
        let open = |path: &Path| {
            self.loader
                .open(path, fstype_permitted)
                .map_err(|source| PairError::Open { path: path.to_path_buf(), source })
        };

        let mut source_font = open(source)?;
        on_event(&PipelineEvent::Loaded { side: Side::Source, path: source });

        let mut target_font = match open(target) {
            Ok(font) => font,
            Err(e) => {
                source_font.close();
                return Err(e);
            }
        };
        on_event(&PipelineEvent::Loaded { side: Side::Target, path: target });

        let result = self.apply(&mut source_font, &mut target_font, on_event);
        source_font.close();
        target_font.close();
        result
    }

    fn apply(
        &mut self,
        source: &mut L::Font,
        target: &mut L::Font,
        on_event: &mut impl FnMut(&PipelineEvent<'_>),
    ) -> Result<PairOutcome, PairError> {
        let config = self.config;

        let reconciliation = if config.merge_glyphs {
            let reconciliation =
                reconcile(source, target, config.unify_units, &mut self.decider)?;
            if reconciliation != Reconciliation::AlreadyEqual {
                on_event(&PipelineEvent::Reconciled(reconciliation));
            }
            target
                .merge_from(source, PRESERVE_CROSS_FONT_KERNING)
                .map_err(PairError::Merge)?;
            on_event(&PipelineEvent::GlyphsMerged);
            Some(reconciliation)
        } else {
            None
        };

        if config.copy_metadata {
            target.copy_metadata_from(source).map_err(PairError::Metadata)?;
            on_event(&PipelineEvent::MetadataCopied);
        }

        let output = match pairing_key(target.path()) {
            Some(name) => config.output_dir.join(name),
            None => {
                return Err(PairError::Generate {
                    path: target.path().to_path_buf(),
                    error: anyhow!("target path has no file name"),
                });
            }
        };
        target
            .generate(&output)
            .map_err(|error| PairError::Generate { path: output.clone(), error })?;
        on_event(&PipelineEvent::Saved { path: &output });

        Ok(PairOutcome::Merged { output, reconciliation })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::BTreeMap,
        fs::{create_dir_all, write},
        io,
        rc::Rc,
    };

    use anyhow::{Result, bail};
    use fontfill_font_merger::{Codepoint, GlyphName};
    use fontfill_font_metadata::NameEntry;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        config::UnifyUnitsMode,
        error::{OpenError, ReconcileError},
        reconcile::{Decision, FailFast, LeaveUnresolved},
        resource::{GlyphEntry, GlyphSet},
    };

    /// Glyphs keyed by name, plus naming and units.
    #[derive(Debug, Clone)]
    struct FakeFont {
        path: PathBuf,
        em: u16,
        glyphs: BTreeMap<String, Vec<u32>>,
        names: Vec<NameEntry>,
        fail_merge: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl FontResource for FakeFont {
        fn path(&self) -> &Path {
            &self.path
        }
        fn em(&self) -> u16 {
            self.em
        }
        fn set_em(&mut self, em: u16) -> Result<()> {
            self.em = em;
            Ok(())
        }
        fn name_entries(&self) -> Result<Vec<NameEntry>> {
            Ok(self.names.clone())
        }
        fn copy_metadata_from(&mut self, source: &Self) -> Result<()> {
            self.names = source.names.clone();
            Ok(())
        }
        fn glyph_set(&self) -> Result<GlyphSet> {
            Ok(GlyphSet::new(
                self.glyphs
                    .iter()
                    .map(|(name, cps)| GlyphEntry {
                        name: GlyphName::new(name.as_str()),
                        codepoints: cps.iter().map(|&c| Codepoint(c)).collect(),
                    })
                    .collect(),
            ))
        }
        fn merge_from(&mut self, source: &Self, _: bool) -> Result<()> {
            if self.fail_merge || source.fail_merge {
                bail!("corrupt glyph data");
            }
            for (name, cps) in &source.glyphs {
                self.glyphs.entry(name.clone()).or_insert_with(|| cps.clone());
            }
            Ok(())
        }
        fn generate(&self, path: &Path) -> Result<()> {
            let body: Vec<String> = self.glyphs.keys().cloned().collect();
            write(path, format!("{}\n{}", self.em, body.join(",")))?;
            Ok(())
        }
        fn close(self) {
            self.log.borrow_mut().push(format!("close {}", self.path.display()));
        }
    }

    /// Reads a text file: units per em on the first line, then comma
    /// separated glyph names. `name=...` adds a family name, `fail` makes
    /// merges fail and `restricted` refuses the open.
    #[derive(Default)]
    struct FakeLoader {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl FontLoader for FakeLoader {
        type Font = FakeFont;

        fn open(
            &self,
            path: &Path,
            fstype_permitted: bool,
        ) -> std::result::Result<FakeFont, OpenError> {
            let text = std::fs::read_to_string(path)?;
            let mut lines = text.lines();
            let em = lines
                .next()
                .and_then(|l| l.trim().parse().ok())
                .ok_or_else(|| OpenError::Io(io::Error::other("missing em")))?;
            let mut font = FakeFont {
                path: path.to_path_buf(),
                em,
                glyphs: BTreeMap::new(),
                names: Vec::new(),
                fail_merge: false,
                log: self.log.clone(),
            };
            for line in lines {
                match line.trim() {
                    "fail" => font.fail_merge = true,
                    "restricted" if !fstype_permitted => {
                        return Err(OpenError::EmbeddingRestricted { fs_type: 2 });
                    }
                    "restricted" => {}
                    l if l.starts_with("name=") => {
                        font.names.push(NameEntry::windows(NameEntry::FAMILY, &l[5..]))
                    }
                    l => {
                        for glyph in l.split(',').filter(|g| !g.is_empty()) {
                            font.glyphs.insert(glyph.to_string(), Vec::new());
                        }
                    }
                }
            }
            self.log.borrow_mut().push(format!("open {}", path.display()));
            Ok(font)
        }
    }

    struct Fixture {
        _dir: TempDir,
        config: MergeConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = MergeConfig::new().with_dirs(
                dir.path().join("src"),
                dir.path().join("tgt"),
                dir.path().join("out"),
            );
            create_dir_all(&config.source_dir).unwrap();
            create_dir_all(&config.target_dir).unwrap();
            Self { _dir: dir, config }
        }

        fn source(&self, name: &str, content: &str) {
            let path = self.config.source_dir.join(name);
            create_dir_all(path.parent().unwrap()).unwrap();
            write(path, content).unwrap();
        }

        fn target(&self, name: &str, content: &str) {
            let path = self.config.target_dir.join(name);
            create_dir_all(path.parent().unwrap()).unwrap();
            write(path, content).unwrap();
        }

        fn output(&self, name: &str) -> Option<String> {
            std::fs::read_to_string(self.config.output_dir.join(name)).ok()
        }
    }

    fn run_with<D: UnitDecider>(
        config: &MergeConfig,
        decider: D,
    ) -> (BatchReport, Vec<String>, Vec<String>) {
        let loader = FakeLoader::default();
        let log = loader.log.clone();
        let mut events = Vec::new();
        let report = Pipeline::new(config, loader, decider)
            .run(|e| events.push(e.to_string()))
            .unwrap();
        let log = log.borrow().clone();
        (report, events, log)
    }

    #[test]
    fn test_merges_matching_pair() {
        let fx = Fixture::new();
        fx.source("Sans.ttf", "1000\nA,B,C\nname=Source");
        fx.target("Sans.ttf", "1000\nA\nname=Target");

        let (report, events, _) = run_with(&fx.config, FailFast);

        assert_eq!(report.merged(), 1);
        assert_eq!(fx.output("Sans.ttf").unwrap(), "1000\nA,B,C");
        assert!(events[0].starts_with("Loaded source font: "));
        assert!(events[1].starts_with("Loaded target font: "));
        assert_eq!(events[2], "*** merged glyphs");
        assert_eq!(events[3], "*** copied meta data");
        assert!(events[4].starts_with("Saved modified font to: "));
    }

    #[test]
    fn test_skips_target_without_source() {
        let fx = Fixture::new();
        fx.source("Other.ttf", "1000\nA");
        fx.target("Lonely.ttf", "1000\nA");

        let (report, events, log) = run_with(&fx.config, FailFast);

        assert_eq!(report.skipped(), 1);
        assert!(!report.has_failures());
        assert!(fx.output("Lonely.ttf").is_none());
        assert!(events[0].ends_with("Lonely.ttf has no corresponding source .ttf file, skipping."));
        assert!(log.is_empty());
    }

    #[test]
    fn test_failure_is_isolated() {
        let fx = Fixture::new();
        fx.source("A.ttf", "1000\nx\nfail");
        fx.target("A.ttf", "1000\ny");
        fx.source("B.ttf", "1000\nx");
        fx.target("B.ttf", "1000\ny");

        let (report, events, log) = run_with(&fx.config, FailFast);

        assert_eq!(report.failed(), 1);
        assert_eq!(report.merged(), 1);
        assert!(fx.output("A.ttf").is_none());
        assert_eq!(fx.output("B.ttf").unwrap(), "1000\nx,y");
        let expected = "An error occurred: [MergeFailure] glyph merge failed: corrupt glyph data";
        assert!(events.iter().any(|e| e == expected));

        let opens = log.iter().filter(|l| l.starts_with("open")).count();
        let closes = log.iter().filter(|l| l.starts_with("close")).count();
        assert_eq!(opens, 4);
        assert_eq!(closes, 4);
    }

    #[test]
    fn test_open_failure_closes_source() {
        let fx = Fixture::new();
        fx.source("R.ttf", "1000\nA");
        fx.target("R.ttf", "1000\nB\nrestricted");

        let (report, _, log) = run_with(&fx.config, FailFast);

        let (_, err) = report.failures().next().unwrap();
        assert!(matches!(
            err,
            PairError::Open { source: OpenError::EmbeddingRestricted { .. }, .. }
        ));
        assert_eq!(log.iter().filter(|l| l.starts_with("close")).count(), 1);
    }

    #[test]
    fn test_fstype_permitted_opens_restricted() {
        let mut fx = Fixture::new();
        fx.config = fx.config.clone().fstype_permitted(true);
        fx.source("R.ttf", "1000\nA\nrestricted");
        fx.target("R.ttf", "1000\nB");

        let (report, _, _) = run_with(&fx.config, FailFast);
        assert_eq!(report.merged(), 1);
    }

    #[test]
    fn test_merge_disabled_keeps_glyphs() {
        let mut fx = Fixture::new();
        fx.config = fx.config.clone().merge_glyphs(false);
        fx.source("S.ttf", "2048\nA,B");
        fx.target("S.ttf", "1000\nC");

        let (report, events, _) = run_with(&fx.config, FailFast);

        assert_eq!(report.merged(), 1);
        assert_eq!(fx.output("S.ttf").unwrap(), "1000\nC");
        assert!(!events.iter().any(|e| e == "*** merged glyphs"));
    }

    #[test]
    fn test_unit_reconciliation_in_pipeline() {
        let mut fx = Fixture::new();
        fx.config = fx.config.clone().unify_units(UnifyUnitsMode::TargetToSource);
        fx.source("S.ttf", "2048\nA");
        fx.target("S.ttf", "1000\nB");

        let (report, events, _) = run_with(&fx.config, FailFast);

        assert_eq!(fx.output("S.ttf").unwrap(), "2048\nA,B");
        assert!(events.contains(&"*** rescaled target from 1000 to 2048".to_string()));
        match &report.pairs[0].outcome {
            PairOutcome::Merged { reconciliation, .. } => assert_eq!(
                *reconciliation,
                Some(Reconciliation::Rescaled { side: Side::Target, from: 1000, to: 2048 })
            ),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_fail_fast_decider_fails_pair() {
        let fx = Fixture::new();
        fx.source("S.ttf", "2048\nA");
        fx.target("S.ttf", "1000\nB");

        let (report, _, _) = run_with(&fx.config, FailFast);
        let (_, err) = report.failures().next().unwrap();
        assert!(matches!(err, PairError::Reconcile(ReconcileError::Undecided { .. })));
        assert_eq!(err.kind(), "ReconcileFailure");
    }

    #[test]
    fn test_decider_is_asked_per_pair() {
        struct Answers(Vec<Decision>);
        impl UnitDecider for Answers {
            fn decide(&mut self, _: u16, _: u16) -> std::result::Result<Decision, ReconcileError> {
                Ok(self.0.remove(0))
            }
        }

        let fx = Fixture::new();
        fx.source("A.ttf", "2048\nx");
        fx.target("A.ttf", "1000\ny");
        fx.source("B.ttf", "2048\nx");
        fx.target("B.ttf", "1000\ny");

        let answers = Answers(vec![
            Decision::Rescale(crate::reconcile::Direction::SourceToTarget),
            Decision::Leave,
        ]);
        let (report, _, _) = run_with(&fx.config, answers);

        assert_eq!(report.merged(), 2);
        assert_eq!(fx.output("A.ttf").unwrap(), "1000\nx,y");
        assert_eq!(fx.output("B.ttf").unwrap(), "1000\nx,y");
        match &report.pairs[1].outcome {
            PairOutcome::Merged { reconciliation, .. } => assert_eq!(
                *reconciliation,
                Some(Reconciliation::LeftUnresolved { source: 2048, target: 1000 })
            ),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_source_names_pick_smallest_path() {
        let fx = Fixture::new();
        fx.source("b/F.ttf", "1000\nfromB");
        fx.source("a/F.ttf", "1000\nfromA");
        fx.target("F.ttf", "1000\nT");

        let (report, _, _) = run_with(&fx.config, LeaveUnresolved);

        assert!(report.pairs[0].source.as_ref().unwrap().ends_with("a/F.ttf"));
        assert_eq!(fx.output("F.ttf").unwrap(), "1000\nT,fromA");
    }

    #[test]
    fn test_nested_targets_write_flat_output() {
        let fx = Fixture::new();
        fx.source("deep/dir/N.ttf", "1000\nA");
        fx.target("other/N.ttf", "1000\nB");

        let (report, _, _) = run_with(&fx.config, LeaveUnresolved);
        assert_eq!(report.merged(), 1);
        assert!(fx.output("N.ttf").is_some());
    }

    #[test]
    fn test_metadata_only() {
        let mut fx = Fixture::new();
        fx.config = fx.config.clone().merge_glyphs(false);
        fx.source("M.ttf", "1000\nA\nname=Source");
        fx.target("M.ttf", "1000\nB\nname=Target");

        let loader = FakeLoader::default();
        let mut pipeline = Pipeline::new(&fx.config, loader, FailFast);
        let mut events = Vec::new();
        let outcome = pipeline
            .process_pair(
                &fx.config.source_dir.join("M.ttf"),
                &fx.config.target_dir.join("M.ttf"),
                &mut |e: &PipelineEvent<'_>| events.push(e.to_string()),
            );
        // The output directory is only created by `run`.
        assert!(matches!(outcome, Err(PairError::Generate { .. })));
        assert!(events.contains(&"*** copied meta data".to_string()));
    }
}
