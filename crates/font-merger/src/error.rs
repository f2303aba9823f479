use std::{io, result};

use read_fonts::ReadError;
use thiserror::Error;
use write_fonts::{BuilderError, error, tables::cmap::CmapConflict};

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("failed to read font: {0}")]
    ReadError(#[from] ReadError),

    #[error("failed to write font: {0}")]
    WriteError(#[from] error::Error),

    #[error("failed to build font: {0}")]
    BuilderError(#[from] BuilderError),

    #[error("fonts have incompatible unitsPerEm: base {base}, donor {donor}")]
    IncompatibleUnitsPerEm { base: u16, donor: u16 },

    #[error("{role} font has no TrueType outlines (CFF fonts are not supported)")]
    UnsupportedOutlines { role: &'static str },

    #[error("base font is a variable font; glyphs cannot be added without gvar support")]
    VariableBase,

    #[error("merged font would have {0} glyphs, more than 65535")]
    TooManyGlyphs(usize),

    #[error("invalid kern table: {0:#}")]
    Kern(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to build cmap table: {0}")]
    CmapBuildError(#[from] CmapConflict),
}

pub type Result<T> = result::Result<T, MergeError>;
