use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use hamlet_evaluator::reward::{RewardConfig, RewardEvaluator};
use hamlet_grid::{Grid, HousePricing, Position, ProfitSummary, assign_house_types};
use hamlet_training::{
    observer::TracingObserver,
    parallel::{ParallelResult, train_edge_entries, train_entry_positions, train_grid_sizes},
    q_table::QTable,
    schedule::ExplorationSchedule,
    seed::{SeedSource, seed_grid},
    session::{StateEncoding, TrainingConfig, TrainingReport, TrainingSession},
    store::{JsonFileStore, TableStore as _},
};
use tracing::info;

use crate::{
    command::assign_houses::print_profit,
    schema::training_result::{EntryResult, TrainingResult, TypedLayout},
    util::{self, GridSize, OneBasedPosition, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Grid rows
    #[arg(long, default_value_t = 5)]
    rows: usize,
    /// Grid columns
    #[arg(long, default_value_t = 5)]
    cols: usize,
    /// Entry position as ROW,COL counting from 1; repeat to train several
    /// entries in parallel
    #[arg(long, default_values = ["1,1"])]
    entry: Vec<OneBasedPosition>,
    /// Train once for every border cell as the entry
    #[arg(long, conflicts_with = "entry")]
    all_edges: bool,
    /// Grid size as ROWSxCOLS; repeat to train several sizes in parallel,
    /// each with every border entry
    #[arg(
        long,
        value_name = "ROWSxCOLS",
        conflicts_with_all = ["rows", "cols", "entry", "all_edges"]
    )]
    size: Vec<GridSize>,
    /// Training configuration JSON file; the flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reward configuration JSON file
    #[arg(long)]
    reward_config: Option<PathBuf>,
    /// House pricing JSON file used for the typed best layout
    #[arg(long)]
    pricing: Option<PathBuf>,
    #[arg(long)]
    episodes: Option<usize>,
    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,
    /// Use a constant exploration rate in [0, 1] instead of the decaying schedule
    #[arg(long, value_parser = util::parse_rate)]
    exploration: Option<f32>,
    /// Encode states as a SIZE x SIZE window around the placed cell
    #[arg(long, value_name = "SIZE")]
    window: Option<usize>,
    /// Folder searched recursively for seed grid CSV files
    #[arg(long)]
    seed_dir: Option<PathBuf>,
    /// Q-table JSON file to resume from and snapshot to
    #[arg(long)]
    table: Option<PathBuf>,
    /// Print every placement
    #[arg(long)]
    log_actions: bool,
    /// Output file path for the training result
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn training_config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config: TrainingConfig =
            util::read_config("training config", self.config.as_ref())?;
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(rate) = self.exploration {
            config.exploration = ExplorationSchedule::Constant { rate };
        }
        if let Some(size) = self.window {
            config.state_encoding = StateEncoding::Window { size };
        }
        config.log_actions |= self.log_actions;
        Ok(config)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.training_config()?;
    let reward: RewardConfig = util::read_config("reward config", arg.reward_config.as_ref())?;
    let pricing: HousePricing = util::read_config("pricing", arg.pricing.as_ref())?;
    let candidates = match &arg.seed_dir {
        Some(dir) => util::load_grid_folder(dir)?,
        None => vec![],
    };
    info!("Loaded {} seed grid candidate(s)", candidates.len());

    let runs = if !arg.size.is_empty() {
        let sizes = arg.size.iter().map(|size| (size.rows, size.cols)).collect::<Vec<_>>();
        let results = train_grid_sizes(&candidates, &sizes, &config, &reward)
            .context("Failed to start training")?;
        finish_parallel(arg, &config, results)?
    } else if arg.all_edges {
        let result = train_edge_entries(&candidates, arg.rows, arg.cols, &config, &reward)
            .context("Failed to start training")?;
        finish_parallel(arg, &config, vec![result])?
    } else if let [entry] = arg.entry.as_slice() {
        vec![train_single(arg, entry.0, &candidates, config.clone(), &reward)?]
    } else {
        let entries = arg.entry.iter().map(|e| e.0).collect::<Vec<_>>();
        let result =
            train_entry_positions(&candidates, arg.rows, arg.cols, &entries, &config, &reward)
                .context("Failed to start training")?;
        finish_parallel(arg, &config, vec![result])?
    };

    let runs = runs
        .into_iter()
        .map(|run| {
            let typed_best = run
                .report
                .best
                .as_ref()
                .map(|best| typed_layout(&best.grid, &pricing));
            print_run(&run, typed_best.as_ref());
            EntryResult {
                rows: run.rows,
                cols: run.cols,
                entry: run.entry.one_based(),
                seed_source: run.source,
                report: run.report,
                typed_best,
            }
        })
        .collect();

    let result = TrainingResult {
        trained_at: Utc::now(),
        config,
        reward,
        runs,
    };
    Output::save_json(&result, arg.output.clone())?;
    Ok(())
}

#[derive(Debug)]
struct Run {
    rows: usize,
    cols: usize,
    /// Entry position as requested.
    entry: Position,
    source: SeedSource,
    report: TrainingReport,
}

/// Loads the stored table and prunes it before training resumes from it.
fn load_table(path: &Path, percentile: f32) -> anyhow::Result<(JsonFileStore, QTable)> {
    let store = JsonFileStore::new(path);
    let mut table = store.load()?;
    let pruned = table.prune(percentile);
    info!(
        removed = pruned.states_removed(),
        kept = pruned.states_after,
        "Pruned stored table"
    );
    eprintln!("Resuming from {} state(s) in {}", table.len(), path.display());
    Ok((store, table))
}

fn train_single(
    arg: &TrainArg,
    entry: Position,
    candidates: &[Grid],
    config: TrainingConfig,
    reward: &RewardConfig,
) -> anyhow::Result<Run> {
    let evaluator = RewardEvaluator::new(reward.clone());
    let seed = seed_grid(candidates, arg.rows, arg.cols, entry, &evaluator)
        .context("Failed to prepare the seed grid")?;
    eprintln!("Seed grid ({:?}):", seed.source);
    util::print_grid(&seed.grid);

    let stored = arg
        .table
        .as_deref()
        .map(|path| load_table(path, config.prune_percentile))
        .transpose()?;
    let mut session =
        TrainingSession::with_scorer(seed.grid, seed.entry, config, Box::new(evaluator))
            .context("Failed to start training")?
            .with_observer(Box::new(TracingObserver::default()));
    if let Some((store, table)) = stored {
        session = session.with_table(table).with_store(Box::new(store));
    }

    let report = session.run();
    for logged in session.action_log() {
        eprintln!("{logged}");
    }
    if let Some(path) = &arg.table {
        JsonFileStore::new(path).save(session.table())?;
    }
    Ok(Run {
        rows: arg.rows,
        cols: arg.cols,
        entry,
        source: seed.source,
        report,
    })
}

/// Folds the averaged tables into the stored one, if any, and flattens the runs.
fn finish_parallel(
    arg: &TrainArg,
    config: &TrainingConfig,
    results: Vec<ParallelResult>,
) -> anyhow::Result<Vec<Run>> {
    if let Some(first) = results.first() {
        eprintln!(
            "Trained {} run(s) over {} grid size(s) from base seed {}",
            results.iter().map(|result| result.runs.len()).sum::<usize>(),
            results.len(),
            first.base_seed
        );
    }

    if let Some(path) = &arg.table {
        let (mut store, mut table) = load_table(path, config.prune_percentile)?;
        for result in &results {
            table.merge(&result.merged);
        }
        store.save(&table)?;
        eprintln!("Saved {} merged state(s) to {}", table.len(), path.display());
    } else {
        for result in &results {
            report_table(result.rows, result.cols, &result.merged);
        }
    }

    Ok(results
        .into_iter()
        .flat_map(|result| {
            let (rows, cols) = (result.rows, result.cols);
            result.runs.into_iter().map(move |run| Run {
                rows,
                cols,
                entry: run.requested,
                source: run.source,
                report: run.report,
            })
        })
        .collect())
}

fn report_table(rows: usize, cols: usize, table: &QTable) {
    eprintln!(
        "Merged {rows}x{cols} table: {} state(s), {} entries",
        table.len(),
        table.entry_count()
    );
}

fn typed_layout(grid: &Grid, pricing: &HousePricing) -> TypedLayout {
    let mut grid = grid.clone();
    assign_house_types(&mut grid, pricing);
    let profit = ProfitSummary::from_grid(&grid, pricing);
    TypedLayout { grid, profit }
}

fn print_run(run: &Run, typed: Option<&TypedLayout>) {
    let report = &run.report;
    eprintln!();
    eprintln!(
        "{}x{} entry {}: {} episode(s), seed {}",
        run.rows,
        run.cols,
        run.entry.display_one_based(),
        report.episodes,
        report.seed
    );
    if let Some(scores) = &report.scores {
        eprintln!(
            "  Scores: mean {:.1}, median {:.1}, min {:.1}, max {:.1}, std dev {:.1}",
            scores.mean, scores.median, scores.min, scores.max, scores.std_dev
        );
    }
    eprintln!(
        "  Table: {} state(s), {} entries, {} prune(s)",
        report.table_states, report.table_entries, report.prunes
    );
    for (rank, record) in report.top.iter().enumerate() {
        eprintln!(
            "  #{} episode {} score {:.1}",
            rank + 1,
            record.episode + 1,
            record.score
        );
        util::print_grid(&record.grid);
    }
    if let Some(typed) = typed {
        eprintln!("  Best layout with house types:");
        util::print_grid(&typed.grid);
        print_profit(&typed.profit);
    }
}
