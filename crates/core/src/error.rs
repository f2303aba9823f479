use std::{io, path::PathBuf};

use read_fonts::ReadError;
use thiserror::Error;

/// Failure to open a font file.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("could not read file: {0}")]
    Io(#[from] io::Error),

    #[error("not a valid font: {0}")]
    Read(#[from] ReadError),

    #[error("embedding is restricted (fsType {fs_type:#06x}); pass --fstype-permitted to open it")]
    EmbeddingRestricted { fs_type: u16 },
}

/// The units-per-em reconciliation could not be settled.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(
        "units per em differ (source {source_em}, target {target_em}) and no direction was chosen"
    )]
    Undecided { source_em: u16, target_em: u16 },

    #[error("failed to read the answer: {0}")]
    Input(#[from] io::Error),

    #[error("failed to rescale the {side} font: {error:#}")]
    Rescale { side: &'static str, error: anyhow::Error },
}

/// Failure of one source/target pair. Other pairs are unaffected.
#[derive(Debug, Error)]
pub enum PairError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: OpenError,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("glyph merge failed: {0:#}")]
    Merge(anyhow::Error),

    #[error("metadata copy failed: {0:#}")]
    Metadata(anyhow::Error),

    #[error("failed to generate {}: {error:#}", path.display())]
    Generate { path: PathBuf, error: anyhow::Error },
}

impl PairError {
    /// Short name of the failing stage.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open { .. } => "OpenFailure",
            Self::Reconcile(_) => "ReconcileFailure",
            Self::Merge(_) => "MergeFailure",
            Self::Metadata(_) => "MetadataFailure",
            Self::Generate { .. } => "GenerateFailure",
        }
    }
}

/// Errors that abort the whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("directory path is not valid UTF-8: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("invalid font pattern under {}: {source}", dir.display())]
    Pattern {
        dir: PathBuf,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_error_kinds() {
        let open = PairError::Open {
            path: PathBuf::from("a.ttf"),
            source: OpenError::EmbeddingRestricted { fs_type: 2 },
        };
        assert_eq!(open.kind(), "OpenFailure");
        assert!(open.to_string().contains("a.ttf"));
        assert!(open.to_string().contains("0x0002"));

        let merge = PairError::Merge(anyhow::anyhow!("boom"));
        assert_eq!(merge.kind(), "MergeFailure");
        assert_eq!(merge.to_string(), "glyph merge failed: boom");
    }

    #[test]
    fn test_undecided_message() {
        let err = ReconcileError::Undecided { source_em: 1000, target_em: 2048 };
        assert_eq!(
            err.to_string(),
            "units per em differ (source 1000, target 2048) and no direction was chosen"
        );
    }
}
