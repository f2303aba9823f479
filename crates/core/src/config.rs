//! Run configuration.

use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

/// Default directory scanned for source (donor) fonts.
pub const DEFAULT_SOURCE_DIR: &str = "./src_fonts";

/// Default directory scanned for target fonts.
pub const DEFAULT_TARGET_DIR: &str = "./tgt_fonts";

/// Default directory receiving the output fonts.
pub const DEFAULT_OUTPUT_DIR: &str = "./out_fonts";

/// File extension of the fonts picked up from the directories.
pub const FONT_EXTENSION: &str = "ttf";

/// Which side is rescaled when source and target units-per-em differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnifyUnitsMode {
    /// Rescale the source to the target's units.
    SourceToTarget,
    /// Rescale the target to the source's units.
    TargetToSource,
    /// Ask the decision provider for every mismatched pair.
    #[default]
    Unset,
}

impl Display for UnifyUnitsMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceToTarget => "s2t",
            Self::TargetToSource => "t2s",
            Self::Unset => "unset",
        })
    }
}

/// Settings for one run, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub output_dir: PathBuf,
    pub merge_glyphs: bool,
    pub copy_metadata: bool,
    pub unify_units: UnifyUnitsMode,
    /// Open fonts whose embedding permissions are restricted
    pub fstype_permitted: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            merge_glyphs: true,
            copy_metadata: true,
            unify_units: UnifyUnitsMode::Unset,
            fstype_permitted: false,
        }
    }
}

impl MergeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dirs(
        mut self,
        source_dir: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        self.source_dir = source_dir.into();
        self.target_dir = target_dir.into();
        self.output_dir = output_dir.into();
        self
    }

    pub fn merge_glyphs(mut self, merge: bool) -> Self {
        self.merge_glyphs = merge;
        self
    }

    pub fn copy_metadata(mut self, copy: bool) -> Self {
        self.copy_metadata = copy;
        self
    }

    pub fn unify_units(mut self, mode: UnifyUnitsMode) -> Self {
        self.unify_units = mode;
        self
    }

    pub fn fstype_permitted(mut self, permitted: bool) -> Self {
        self.fstype_permitted = permitted;
        self
    }
}

impl Display for MergeConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "  source_dir:       {}", self.source_dir.display())?;
        writeln!(f, "  target_dir:       {}", self.target_dir.display())?;
        writeln!(f, "  output_dir:       {}", self.output_dir.display())?;
        writeln!(f, "  merge_glyphs:     {}", self.merge_glyphs)?;
        writeln!(f, "  copy_metadata:    {}", self.copy_metadata)?;
        writeln!(f, "  unify_units:      {}", self.unify_units)?;
        write!(f, "  fstype_permitted: {}", self.fstype_permitted)
    }
}
