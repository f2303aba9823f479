use std::{
    fs::{read, write},
    path::PathBuf,
};

use clap::Parser;
use fontfill_font_merger::{MergeError, Merger, Options, Result};

#[derive(Parser)]
#[command(name = "font-merger")]
#[command(
    about = "Fill the glyphs missing from a font with glyphs from another",
    long_about = None
)]
struct Cli {
    /// Font whose glyphs take priority
    target: PathBuf,

    /// Font that supplies the missing glyphs
    source: PathBuf,

    /// Output font file
    #[arg(short, long, default_value = "merged.ttf")]
    output: PathBuf,

    /// Drop source kerning pairs that involve glyphs the target already has
    #[arg(long)]
    no_cross_font_kerning: bool,

    /// Merge even when unitsPerEm differ, keeping the target's units
    #[arg(long)]
    allow_mismatched_units: bool,

    /// Comma-separated list of tables to drop
    #[arg(long, value_delimiter = ',')]
    drop_tables: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let target = read(&cli.target).map_err(MergeError::Io)?;
    let source = read(&cli.source).map_err(MergeError::Io)?;

    let options = Options::new()
        .preserve_cross_font_kerning(!cli.no_cross_font_kerning)
        .allow_mismatched_units(cli.allow_mismatched_units)
        .drop_tables(cli.drop_tables);

    let (merged, summary) = Merger::new(options).merge_with_summary(&target, &source)?;
    write(&cli.output, &merged)?;

    if cli.verbose {
        eprintln!(
            "Imported {} glyphs ({} already present), added {} codepoints and {} kern pairs",
            summary.imported_glyphs,
            summary.redirected_glyphs,
            summary.added_codepoints,
            summary.kern_pairs_added
        );
        eprintln!("Wrote {} bytes to {}", merged.len(), cli.output.display());
    } else {
        println!("{}", cli.output.display());
    }

    Ok(())
}
