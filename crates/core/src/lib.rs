//! Fill missing glyphs of target fonts from same-named source fonts and copy
//! their naming metadata.

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod resource;

pub use config::{MergeConfig, UnifyUnitsMode};
pub use error::{BatchError, OpenError, PairError, ReconcileError};
pub use pipeline::{Pipeline, PipelineEvent};
pub use reconcile::{
    Decision, Direction, FailFast, Fixed, LeaveUnresolved, Prompt, Reconciliation, UnitDecider,
};
pub use report::{BatchReport, PairOutcome};
pub use resource::{FontLoader, FontResource, GlyphSet, SfntFont, SfntLoader};
