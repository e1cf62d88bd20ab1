use std::{fs, path::PathBuf};

use anyhow::Context;
use hamlet_grid::distinct_variants;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AugmentArg {
    /// Grid CSV file
    grid: PathBuf,
    /// Directory receiving one CSV file per distinct variant
    #[arg(long)]
    output_dir: PathBuf,
    /// File name prefix of the written variants
    #[arg(long, default_value = "grid_")]
    prefix: String,
}

pub(crate) fn run(arg: &AugmentArg) -> anyhow::Result<()> {
    let AugmentArg {
        grid,
        output_dir,
        prefix,
    } = arg;
    let grid = util::read_grid_csv(grid)?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let variants = distinct_variants(&grid);
    for (symmetry, variant) in &variants {
        let path = output_dir.join(format!("{prefix}{symmetry}.csv"));
        util::write_grid_csv(variant, &path)?;
        eprintln!("Saved: {}", path.display());
    }
    eprintln!(
        "{} distinct variant(s) of {} written to {}",
        variants.len(),
        arg.grid.display(),
        output_dir.display()
    );
    Ok(())
}
