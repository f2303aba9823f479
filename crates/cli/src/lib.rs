//! fontfill command line.

pub mod cli;
