//! Units-per-em reconciliation between a source and a target font.

use std::{
    fmt::{self, Display, Formatter},
    io::{BufRead, Write},
};

use log::{info, warn};

use crate::{config::UnifyUnitsMode, error::ReconcileError, resource::FontResource};

/// Which font gets rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The source adopts the target's units.
    SourceToTarget,
    /// The target adopts the source's units.
    TargetToSource,
}

impl Direction {
    pub fn from_mode(mode: UnifyUnitsMode) -> Option<Self> {
        match mode {
            UnifyUnitsMode::SourceToTarget => Some(Self::SourceToTarget),
            UnifyUnitsMode::TargetToSource => Some(Self::TargetToSource),
            UnifyUnitsMode::Unset => None,
        }
    }
}

/// Answer of a [`UnitDecider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Rescale(Direction),
    /// Merge with mismatched units.
    Leave,
}

/// Chooses what to do when a pair's units per em differ and no direction
/// was configured.
pub trait UnitDecider {
    fn decide(&mut self, source_em: u16, target_em: u16) -> Result<Decision, ReconcileError>;
}

impl<D: UnitDecider + ?Sized> UnitDecider for &mut D {
    fn decide(&mut self, source_em: u16, target_em: u16) -> Result<Decision, ReconcileError> {
        (**self).decide(source_em, target_em)
    }
}

impl<D: UnitDecider + ?Sized> UnitDecider for Box<D> {
    fn decide(&mut self, source_em: u16, target_em: u16) -> Result<Decision, ReconcileError> {
        (**self).decide(source_em, target_em)
    }
}

/// Asks the operator, one line of input per mismatched pair.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl Prompt<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the terminal.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

/// Interpret one line of prompt input.
pub fn parse_answer(answer: &str) -> Decision {
    match answer.trim() {
        "1" | "s2t" => Decision::Rescale(Direction::SourceToTarget),
        "2" | "t2s" => Decision::Rescale(Direction::TargetToSource),
        _ => Decision::Leave,
    }
}

impl<R: BufRead, W: Write> UnitDecider for Prompt<R, W> {
    fn decide(&mut self, source_em: u16, target_em: u16) -> Result<Decision, ReconcileError> {
        writeln!(
            self.output,
            "Source font em size {source_em} does not match target font em size {target_em}. \
             Unify them?"
        )?;
        writeln!(self.output, "  s2t (1) - scale the source to {target_em}")?;
        writeln!(self.output, "  t2s (2) - scale the target to {source_em}")?;
        writeln!(self.output, "  anything else - leave them be (not recommended)")?;
        write!(self.output, "Enter your choice: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(parse_answer(&line))
    }
}

/// Always answers with the same direction.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub Direction);

impl UnitDecider for Fixed {
    fn decide(&mut self, _: u16, _: u16) -> Result<Decision, ReconcileError> {
        Ok(Decision::Rescale(self.0))
    }
}

/// Never rescales.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveUnresolved;

impl UnitDecider for LeaveUnresolved {
    fn decide(&mut self, _: u16, _: u16) -> Result<Decision, ReconcileError> {
        Ok(Decision::Leave)
    }
}

/// Fails every mismatched pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl UnitDecider for FailFast {
    fn decide(&mut self, source_em: u16, target_em: u16) -> Result<Decision, ReconcileError> {
        Err(ReconcileError::Undecided { source_em, target_em })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What reconciliation did to a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    AlreadyEqual,
    Rescaled { side: Side, from: u16, to: u16 },
    LeftUnresolved { source: u16, target: u16 },
}

impl Display for Reconciliation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyEqual => write!(f, "em sizes already match"),
            Self::Rescaled { side, from, to } => write!(f, "rescaled {side} from {from} to {to}"),
            Self::LeftUnresolved { source, target } => {
                write!(f, "em sizes left mismatched (source {source}, target {target})")
            }
        }
    }
}

/// Make `source` and `target` share units per em.
///
/// A configured `mode` wins; otherwise `decider` is asked. Only the pair at
/// hand is affected by the answer.
pub fn reconcile<F: FontResource>(
    source: &mut F,
    target: &mut F,
    mode: UnifyUnitsMode,
    decider: &mut impl UnitDecider,
) -> Result<Reconciliation, ReconcileError> {
    let (source_em, target_em) = (source.em(), target.em());
    if source_em == target_em {
        return Ok(Reconciliation::AlreadyEqual);
    }

    let decision = match Direction::from_mode(mode) {
        Some(direction) => Decision::Rescale(direction),
        None => decider.decide(source_em, target_em)?,
    };

    let (side, font, from, to) = match decision {
        Decision::Leave => {
            warn!(
                "Leaving em sizes mismatched ({source_em} vs {target_em}); \
                 glyphs keep their source coordinates"
            );
            return Ok(Reconciliation::LeftUnresolved { source: source_em, target: target_em });
        }
        Decision::Rescale(Direction::SourceToTarget) => {
            (Side::Source, source, source_em, target_em)
        }
        Decision::Rescale(Direction::TargetToSource) => {
            (Side::Target, target, target_em, source_em)
        }
    };

    font.set_em(to)
        .map_err(|error| ReconcileError::Rescale { side: side.as_str(), error })?;
    info!("Unified em size: {side} {from} -> {to}");
    Ok(Reconciliation::Rescaled { side, from, to })
}
