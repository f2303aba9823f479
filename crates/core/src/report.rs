//! Per-pair outcomes and the batch summary.

use std::path::PathBuf;

use crate::{error::PairError, reconcile::Reconciliation};

/// What happened to one target font.
#[derive(Debug)]
pub enum PairOutcome {
    Merged {
        output: PathBuf,
        /// `None` when glyph merging was disabled.
        reconciliation: Option<Reconciliation>,
    },
    SkippedNoSource,
    Failed(PairError),
}

impl PairOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug)]
pub struct PairReport {
    pub target: PathBuf,
    pub source: Option<PathBuf>,
    pub outcome: PairOutcome,
}

/// Outcomes of a whole run, in target order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub pairs: Vec<PairReport>,
}

impl BatchReport {
    pub fn push(&mut self, report: PairReport) {
        self.pairs.push(report);
    }

    pub fn total(&self) -> usize {
        self.pairs.len()
    }

    pub fn merged(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::Merged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PairOutcome::SkippedNoSource))
    }

    pub fn failed(&self) -> usize {
        self.count(PairOutcome::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &PairError)> {
        self.pairs.iter().filter_map(|p| match &p.outcome {
            PairOutcome::Failed(e) => Some((&p.target, e)),
            _ => None,
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "{} targets: {} merged, {} skipped, {} failed",
            self.total(),
            self.merged(),
            self.skipped(),
            self.failed()
        )
    }

    fn count(&self, f: impl Fn(&PairOutcome) -> bool) -> usize {
        self.pairs.iter().filter(|p| f(&p.outcome)).count()
    }
}
