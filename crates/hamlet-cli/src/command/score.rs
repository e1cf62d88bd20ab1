use std::path::PathBuf;

use hamlet_evaluator::{
    grid_analysis::GridAnalysis,
    layout_check::check_layout,
    reward::{RewardConfig, RewardEvaluator},
};
use hamlet_grid::Traversal;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum TraversalArg {
    #[default]
    Bfs,
    Dfs,
}

impl From<TraversalArg> for Traversal {
    fn from(arg: TraversalArg) -> Self {
        match arg {
            TraversalArg::Bfs => Traversal::BreadthFirst,
            TraversalArg::Dfs => Traversal::DepthFirst,
        }
    }
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ScoreArg {
    /// Grid CSV file
    grid: PathBuf,
    /// Reward configuration JSON file
    #[arg(long)]
    reward_config: Option<PathBuf>,
    /// Flood-fill discipline for road clusters
    #[arg(long, default_value = "bfs")]
    traversal: TraversalArg,
    /// Write the breakdown as JSON to this file ("-" for stdout)
    #[arg(long)]
    json: Option<PathBuf>,
}

pub(crate) fn run(arg: &ScoreArg) -> anyhow::Result<()> {
    let ScoreArg {
        grid,
        reward_config,
        traversal,
        json,
    } = arg;
    let config: RewardConfig = util::read_config("reward config", reward_config.as_ref())?;
    let grid = util::read_grid_csv(grid)?;
    let evaluator = RewardEvaluator::new(config).with_traversal((*traversal).into());
    let breakdown = evaluator.breakdown(&grid);
    let analysis = GridAnalysis::from_grid(&grid, (*traversal).into());

    eprintln!("Grid ({}x{}):", grid.rows(), grid.cols());
    util::print_grid(&grid);
    eprintln!();
    eprint!("{breakdown}");
    eprintln!("Road clusters: {}", analysis.road_clusters);
    eprintln!("Green ratio:   {:.3}", analysis.green_ratio());

    let violations = check_layout(&grid);
    if violations.is_empty() {
        eprintln!("Layout check:  passed");
    } else {
        eprintln!("Layout check:  {} violation(s)", violations.len());
        for violation in &violations {
            eprintln!("  - {violation}");
        }
    }

    if let Some(path) = json {
        let path = (path.as_os_str() != "-").then(|| path.clone());
        Output::save_json(&breakdown, path)?;
    }
    Ok(())
}
