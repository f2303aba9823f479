//! CLI definitions and the batch run.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::debug;

use fontfill_core::{
    FailFast, LeaveUnresolved, MergeConfig, Pipeline, Prompt, SfntLoader, UnifyUnitsMode,
    UnitDecider,
};

fn default_config_help() -> String {
    format!("Default configuration:\n{}", MergeConfig::default())
}

#[derive(Parser)]
#[command(name = "fontfill")]
#[command(
    about = "Fill the glyphs missing from target fonts with glyphs from same-named source fonts"
)]
#[command(after_help = default_config_help())]
pub struct Cli {
    /// Directory of source fonts
    pub source_dir: Option<PathBuf>,

    /// Directory of target fonts
    pub target_dir: Option<PathBuf>,

    /// Directory receiving the merged fonts
    pub output_dir: Option<PathBuf>,

    /// Keep the target's naming metadata
    #[arg(long, alias = "nocpmetadata")]
    pub no_copy_metadata: bool,

    /// Only copy naming metadata
    #[arg(long, alias = "nomergeglyphs")]
    pub no_merge_glyphs: bool,

    /// Rescale one side when em sizes differ, without asking
    #[arg(long, alias = "unifyemsize", value_enum)]
    pub unify_em_size: Option<UnifyArg>,

    /// Open fonts whose embedding permissions are restricted
    #[arg(long, alias = "fstypepermitted")]
    pub fstype_permitted: bool,

    /// Answer em size mismatches without prompting
    #[arg(long, value_enum)]
    pub non_interactive: Option<NonInteractive>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnifyArg {
    /// Scale the source to the target's em size
    #[value(name = "s2t", alias = "1")]
    SourceToTarget,
    /// Scale the target to the source's em size
    #[value(name = "t2s", alias = "2")]
    TargetToSource,
}

impl From<UnifyArg> for UnifyUnitsMode {
    fn from(arg: UnifyArg) -> Self {
        match arg {
            UnifyArg::SourceToTarget => Self::SourceToTarget,
            UnifyArg::TargetToSource => Self::TargetToSource,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NonInteractive {
    /// Merge with mismatched em sizes
    Leave,
    /// Fail the pair
    Fail,
}

/// `arg` when it names an existing directory, else `default` with a warning.
fn resolve_dir(label: &str, arg: Option<PathBuf>, default: PathBuf) -> PathBuf {
    match arg {
        Some(path) if path.is_dir() => path,
        Some(path) => {
            println!(
                "[{label}] Path {} is not a valid path. Using default {}",
                path.display(),
                default.display()
            );
            default
        }
        None => default,
    }
}

impl Cli {
    /// Build the run configuration, echoing each override.
    pub fn config(&self) -> MergeConfig {
        let defaults = MergeConfig::default();
        let mut config = MergeConfig::new()
            .with_dirs(
                resolve_dir("Source fonts dir", self.source_dir.clone(), defaults.source_dir),
                resolve_dir("Target fonts dir", self.target_dir.clone(), defaults.target_dir),
                resolve_dir("Output fonts dir", self.output_dir.clone(), defaults.output_dir),
            )
            .fstype_permitted(self.fstype_permitted);

        if self.no_copy_metadata {
            println!("no copy metadata");
            config = config.copy_metadata(false);
        }
        if self.no_merge_glyphs {
            println!("no merge glyphs");
            config = config.merge_glyphs(false);
        }
        if let Some(unify) = self.unify_em_size {
            let mode = UnifyUnitsMode::from(unify);
            println!("unify em size: {mode}");
            config = config.unify_units(mode);
        }
        if self.fstype_permitted {
            println!("fstype permitted");
        }
        config
    }

    fn decider(&self) -> Box<dyn UnitDecider> {
        match self.non_interactive {
            Some(NonInteractive::Leave) => Box::new(LeaveUnresolved),
            Some(NonInteractive::Fail) => Box::new(FailFast),
            None => Box::new(Prompt::stdio()),
        }
    }

    pub fn run(self) -> Result<ExitCode> {
        let config = self.config();
        debug!("Configuration:\n{config}");

        let mut pipeline = Pipeline::new(&config, SfntLoader, self.decider());
        let report = pipeline.run(|event| println!("{event}"))?;

        println!("{}", report.summary());
        Ok(if report.has_failures() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
    }
}
