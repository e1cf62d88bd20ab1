//! Independent training runs, one per grid size and entry position.
//!
//! Each run owns its session, table and RNG and runs on its own scoped
//! thread. Run `i` is seeded with `base_seed + i`, counting runs in the order
//! they were requested, so results depend only on the base seed and that
//! order, never on thread scheduling. Afterwards the tables of each grid size
//! are averaged entry by entry, every run weighing the same.

use std::thread;

use hamlet_evaluator::reward::{RewardConfig, RewardEvaluator};
use hamlet_grid::{Grid, Position};
use rand::Rng as _;
use tracing::{Level, info, span};

use crate::{
    observer::TracingObserver,
    q_table::QTable,
    seed::{SeedSource, seed_grid},
    session::{SessionError, TrainingConfig, TrainingReport, TrainingSession},
};

#[derive(Debug, Clone)]
pub struct EntryRun {
    /// Entry position as requested.
    pub requested: Position,
    /// Entry position actually trained, after nudging blank seeds to the edge.
    pub entry: Position,
    pub source: SeedSource,
    pub report: TrainingReport,
    pub table: QTable,
}

/// Runs for one grid size.
#[derive(Debug, Clone)]
pub struct ParallelResult {
    pub base_seed: u64,
    pub rows: usize,
    pub cols: usize,
    /// One run per requested entry, in input order.
    pub runs: Vec<EntryRun>,
    pub merged: QTable,
}

impl ParallelResult {
    /// Run with the highest best score; earlier runs win ties.
    #[must_use]
    pub fn best(&self) -> Option<&EntryRun> {
        let mut best: Option<(&EntryRun, f32)> = None;
        for run in &self.runs {
            if let Some(record) = &run.report.best
                && best.is_none_or(|(_, score)| record.score > score)
            {
                best = Some((run, record.score));
            }
        }
        best.map(|(run, _)| run)
    }
}

struct Job {
    requested: Position,
    source: SeedSource,
    session: TrainingSession,
    report: Option<TrainingReport>,
}

/// Trains a `rows x cols` layout once per entry position, concurrently.
///
/// Seed grids come from [`seed_grid`] over `candidates`. Every run uses
/// `config` except for its seed.
pub fn train_entry_positions(
    candidates: &[Grid],
    rows: usize,
    cols: usize,
    entries: &[Position],
    config: &TrainingConfig,
    reward: &RewardConfig,
) -> Result<ParallelResult, SessionError> {
    let base_seed = base_seed(config);
    let targets = [(rows, cols, entries.to_vec())];
    let mut results = train_all(candidates, &targets, base_seed, config, reward)?;
    Ok(results.remove(0))
}

/// Trains a `rows x cols` layout once for every border cell as the entry.
pub fn train_edge_entries(
    candidates: &[Grid],
    rows: usize,
    cols: usize,
    config: &TrainingConfig,
    reward: &RewardConfig,
) -> Result<ParallelResult, SessionError> {
    let entries = Grid::new(rows, cols)?.edge_positions().collect::<Vec<_>>();
    train_entry_positions(candidates, rows, cols, &entries, config, reward)
}

/// Trains every border entry of every `(rows, cols)` size, all concurrently.
///
/// Results come back in the order of `sizes`. Seeds continue across sizes, so
/// the first run of the second size follows the last run of the first.
pub fn train_grid_sizes(
    candidates: &[Grid],
    sizes: &[(usize, usize)],
    config: &TrainingConfig,
    reward: &RewardConfig,
) -> Result<Vec<ParallelResult>, SessionError> {
    let targets = sizes
        .iter()
        .map(|&(rows, cols)| {
            let entries: Vec<Position> = Grid::new(rows, cols)?.edge_positions().collect();
            Ok((rows, cols, entries))
        })
        .collect::<Result<Vec<_>, SessionError>>()?;
    train_all(candidates, &targets, base_seed(config), config, reward)
}

fn base_seed(config: &TrainingConfig) -> u64 {
    config.seed.unwrap_or_else(|| rand::rng().random())
}

fn train_all(
    candidates: &[Grid],
    targets: &[(usize, usize, Vec<Position>)],
    base_seed: u64,
    config: &TrainingConfig,
    reward: &RewardConfig,
) -> Result<Vec<ParallelResult>, SessionError> {
    let evaluator = RewardEvaluator::new(reward.clone());

    let mut seeds = 0_u64..;
    let mut groups = targets
        .iter()
        .map(|(rows, cols, entries)| {
            let jobs = entries
                .iter()
                .zip(&mut seeds)
                .map(|(&requested, index)| {
                    let seed = seed_grid(candidates, *rows, *cols, requested, &evaluator)?;
                    let config = TrainingConfig {
                        seed: Some(base_seed.wrapping_add(index)),
                        ..config.clone()
                    };
                    let scorer = Box::new(evaluator.clone());
                    let session =
                        TrainingSession::with_scorer(seed.grid, seed.entry, config, scorer)?
                            .with_observer(Box::new(TracingObserver::default()));
                    Ok(Job {
                        requested,
                        source: seed.source,
                        session,
                        report: None,
                    })
                })
                .collect::<Result<Vec<_>, SessionError>>()?;
            Ok((*rows, *cols, jobs))
        })
        .collect::<Result<Vec<_>, SessionError>>()?;

    info!(
        sizes = groups.len(),
        runs = groups.iter().map(|(_, _, jobs)| jobs.len()).sum::<usize>(),
        base_seed,
        "Starting parallel training"
    );
    thread::scope(|s| {
        for (rows, cols, jobs) in &mut groups {
            let (rows, cols) = (*rows, *cols);
            for job in jobs {
                s.spawn(move || {
                    let (row, col) = job.session.entry().one_based();
                    let span = span!(Level::INFO, "entry", rows, cols, row, col);
                    let _enter = span.enter();
                    job.report = Some(job.session.run());
                });
            }
        }
    });

    Ok(groups
        .into_iter()
        .map(|(rows, cols, jobs)| {
            let runs = jobs
                .into_iter()
                .map(|job| {
                    let report = job.report.expect("every scoped run has finished");
                    let entry = job.session.entry();
                    EntryRun {
                        requested: job.requested,
                        entry,
                        source: job.source,
                        report,
                        table: job.session.into_table(),
                    }
                })
                .collect::<Vec<_>>();
            let merged = QTable::average(runs.iter().map(|run| &run.table));
            ParallelResult {
                base_seed,
                rows,
                cols,
                runs,
                merged,
            }
        })
        .collect())
}
