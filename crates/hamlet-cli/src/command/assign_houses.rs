use std::path::PathBuf;

use hamlet_grid::{HouseKind, HousePricing, ProfitSummary, assign_house_types};

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AssignHousesArg {
    /// Grid CSV file
    grid: PathBuf,
    /// House pricing JSON file
    #[arg(long)]
    pricing: Option<PathBuf>,
    /// Write the typed grid to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &AssignHousesArg) -> anyhow::Result<()> {
    let AssignHousesArg {
        grid,
        pricing,
        output,
    } = arg;
    let pricing: HousePricing = util::read_config("pricing", pricing.as_ref())?;
    let mut grid = util::read_grid_csv(grid)?;
    assign_house_types(&mut grid, &pricing);

    util::print_grid(&grid);
    print_profit(&ProfitSummary::from_grid(&grid, &pricing));

    if let Some(path) = output {
        util::write_grid_csv(&grid, path)?;
        eprintln!("Saved: {}", path.display());
    }
    Ok(())
}

pub(crate) fn print_profit(summary: &ProfitSummary) {
    eprintln!("Houses:");
    for kind in HouseKind::ALL {
        eprintln!("  {kind}: {}", summary.houses[kind.index()]);
    }
    if summary.untyped_houses > 0 {
        eprintln!("  untyped: {}", summary.untyped_houses);
    }
    eprintln!("Total cost: {:>14}", summary.total_cost);
    eprintln!("Total sale: {:>14}", summary.total_sale);
    eprintln!("Profit:     {:>14}", summary.profit);
}
