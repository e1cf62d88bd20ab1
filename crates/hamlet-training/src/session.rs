//! The Q-learning training loop.
//!
//! A [`TrainingSession`] owns everything a run mutates: the value table, the
//! random number generator, the leaderboard and the bookkeeping for
//! snapshots and pruning. Nothing is global, so independent sessions can run
//! side by side (see [`crate::parallel`]).
//!
//! # Episode
//!
//! 1. Start from a copy of the seed grid with the entry restored.
//! 2. Up to `rows * cols` times, ask the [`ActionSelector`] for a placement,
//!    apply it, score the resulting grid and feed
//!    `(state, action, reward, next_state)` to [`QTable::learn`].
//!    The state is encoded before the placement and the next state after it,
//!    both centred on the placed cell when a window encoding is used.
//! 3. Score the final grid and offer it to the [`Leaderboard`].
//! 4. At episode boundaries, prune the table every `prune_interval` episodes
//!    and push a snapshot to the [`TableStore`] every `snapshot_interval`
//!    episodes. A failed snapshot is logged and skipped.

use std::fmt;

use hamlet_evaluator::{
    action_selector::{ActionSelector, SelectorConfig, SelectorError},
    reward::{GridScorer, RewardEvaluator},
};
use hamlet_grid::{Action, Grid, GridError, Position, StateKey, Tile};
use hamlet_stats::descriptive::DescriptiveStats;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    leaderboard::{EpisodeRecord, Leaderboard},
    observer::{NoopObserver, TrainingObserver},
    q_table::QTable,
    schedule::{ExplorationSchedule, LearningRateSchedule},
    store::TableStore,
};

/// How a grid is turned into a [`StateKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateEncoding {
    /// The whole grid.
    #[default]
    FullGrid,
    /// A `size x size` window centred on the placed cell. Even sizes are
    /// rounded up to the next odd size.
    Window { size: usize },
}

impl StateEncoding {
    #[must_use]
    pub fn encode(&self, grid: &Grid, center: Position) -> StateKey {
        match *self {
            Self::FullGrid => StateKey::from_grid(grid),
            Self::Window { size } => StateKey::window(grid, center, size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    pub learning_rate: LearningRateSchedule,
    /// Discount factor γ.
    pub discount: f32,
    pub exploration: ExplorationSchedule,
    /// Prune every this many episodes; 0 disables pruning.
    pub prune_interval: usize,
    pub prune_percentile: f32,
    /// Push a table snapshot every this many episodes; 0 disables snapshots.
    pub snapshot_interval: usize,
    pub top_k: usize,
    pub state_encoding: StateEncoding,
    /// RNG seed; a random seed is drawn when absent.
    pub seed: Option<u64>,
    pub log_actions: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 100,
            learning_rate: LearningRateSchedule::default(),
            discount: 0.9,
            exploration: ExplorationSchedule::default(),
            prune_interval: 500,
            prune_percentile: 35.0,
            snapshot_interval: 10,
            top_k: 3,
            state_encoding: StateEncoding::default(),
            seed: None,
            log_actions: false,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SessionError {
    #[display("invalid seed grid: {_0}")]
    #[from]
    Grid(GridError),
    #[display("invalid action selector: {_0}")]
    #[from]
    Selector(SelectorError),
    #[display("entry {} lies outside the {rows}x{cols} grid", entry.display_one_based())]
    EntryOutOfBounds {
        entry: Position,
        rows: usize,
        cols: usize,
    },
    #[display("exploration schedule {schedule:?} has a non-finite parameter")]
    InvalidExploration { schedule: ExplorationSchedule },
}

/// One placement made during training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub episode: usize,
    pub step: usize,
    pub action: Action,
    pub previous: Tile,
    pub reward: f32,
}

impl fmt::Display for ActionLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "episode {} step {}: {} at {} (was {}), reward {:.1}",
            self.episode + 1,
            self.step + 1,
            self.action.tile,
            self.action.position.display_one_based(),
            self.previous,
            self.reward
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Zero-based episode index.
    pub episode: usize,
    pub score: f32,
    pub best_score: f32,
    pub new_best: bool,
    pub exploration_rate: f32,
    pub learning_rate: f32,
    pub steps: usize,
    pub table_states: usize,
}

/// Summary of the final scores of all episodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub mean: f32,
    pub median: f32,
    pub min: f32,
    pub max: f32,
    pub std_dev: f32,
}

impl ScoreSummary {
    #[must_use]
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        let stats = DescriptiveStats::new(scores.iter().copied())?;
        Some(Self {
            mean: stats.mean,
            median: stats.median,
            min: stats.min,
            max: stats.max,
            std_dev: stats.std_dev,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub seed: u64,
    pub episodes: usize,
    pub best: Option<EpisodeRecord>,
    pub top: Vec<EpisodeRecord>,
    pub scores: Option<ScoreSummary>,
    pub table_states: usize,
    pub table_entries: usize,
    pub prunes: usize,
    pub snapshots: usize,
    pub failed_snapshots: usize,
}

pub struct TrainingSession {
    config: TrainingConfig,
    seed_grid: Grid,
    entry: Position,
    seed: u64,
    rng: Pcg32,
    table: QTable,
    selector: ActionSelector,
    observer: Box<dyn TrainingObserver>,
    store: Option<Box<dyn TableStore>>,
    leaderboard: Leaderboard,
    scores: Vec<f32>,
    action_log: Vec<ActionLogEntry>,
    prunes: usize,
    snapshots: usize,
    failed_snapshots: usize,
}

impl fmt::Debug for TrainingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingSession")
            .field("config", &self.config)
            .field("entry", &self.entry)
            .field("seed", &self.seed)
            .field("episodes", &self.scores.len())
            .field("table_states", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl TrainingSession {
    /// Session scoring with the default [`RewardEvaluator`].
    pub fn new(
        seed_grid: Grid,
        entry: Position,
        config: TrainingConfig,
    ) -> Result<Self, SessionError> {
        Self::with_scorer(seed_grid, entry, config, Box::new(RewardEvaluator::default()))
    }

    /// Builds the seed grid from nested rows first.
    pub fn from_rows<R>(
        rows: &[R],
        entry: Position,
        config: TrainingConfig,
    ) -> Result<Self, SessionError>
    where
        R: AsRef<[Tile]>,
    {
        Self::new(Grid::from_rows(rows)?, entry, config)
    }

    pub fn with_scorer(
        seed_grid: Grid,
        entry: Position,
        config: TrainingConfig,
        scorer: Box<dyn GridScorer>,
    ) -> Result<Self, SessionError> {
        let selector = ActionSelector::new(scorer, SelectorConfig::default())?;
        Self::with_selector(seed_grid, entry, config, selector)
    }

    pub fn with_selector(
        seed_grid: Grid,
        entry: Position,
        config: TrainingConfig,
        selector: ActionSelector,
    ) -> Result<Self, SessionError> {
        if !seed_grid.contains(entry) {
            let (rows, cols) = seed_grid.dimensions();
            return Err(SessionError::EntryOutOfBounds { entry, rows, cols });
        }
        if !config.exploration.is_finite() {
            return Err(SessionError::InvalidExploration {
                schedule: config.exploration,
            });
        }
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Ok(Self {
            leaderboard: Leaderboard::new(config.top_k),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            config,
            seed_grid,
            entry,
            table: QTable::new(),
            selector,
            observer: Box::new(NoopObserver),
            store: None,
            scores: vec![],
            action_log: vec![],
            prunes: 0,
            snapshots: 0,
            failed_snapshots: 0,
        })
    }

    /// Continues learning from an existing table.
    #[must_use]
    pub fn with_table(mut self, table: QTable) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Box<dyn TableStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn entry(&self) -> Position {
        self.entry
    }

    /// Seed actually used for the RNG.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn table(&self) -> &QTable {
        &self.table
    }

    #[must_use]
    pub fn into_table(self) -> QTable {
        self.table
    }

    #[must_use]
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    #[must_use]
    pub fn action_log(&self) -> &[ActionLogEntry] {
        &self.action_log
    }

    /// Final scores of the episodes run so far.
    #[must_use]
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Grid every episode starts from.
    #[must_use]
    pub fn start_grid(&self) -> Grid {
        let mut grid = self.seed_grid.clone();
        grid.set(self.entry, Tile::Entry);
        grid
    }

    /// Runs the configured number of episodes.
    pub fn run(&mut self) -> TrainingReport {
        for _ in 0..self.config.episodes {
            self.run_episode();
        }
        let report = self.report();
        self.observer.on_finish(&report);
        report
    }

    /// Runs a single episode, including the maintenance due after it.
    ///
    /// # Panics
    ///
    /// Panics if the selector proposes a placement on an occupied cell.
    pub fn run_episode(&mut self) -> EpisodeSummary {
        let episode = self.scores.len();
        let exploration_rate = self.config.exploration.rate(episode);
        let learning_rate = self.config.learning_rate.rate(episode);

        let mut grid = self.start_grid();
        let mut steps = 0;
        for step in 0..grid.area() {
            let Some(action) = self
                .selector
                .choose(&grid, self.entry, exploration_rate, &mut self.rng)
            else {
                if grid.is_full() {
                    break;
                }
                continue;
            };
            let state = self.config.state_encoding.encode(&grid, action.position);
            let previous = grid
                .place(action)
                .unwrap_or_else(|e| panic!("selector proposed an illegal action {action}: {e}"));
            let reward = self.selector.scorer().score(&grid);
            let next_state = self.config.state_encoding.encode(&grid, action.position);
            self.table.learn(
                state,
                action,
                reward,
                &next_state,
                learning_rate,
                self.config.discount,
            );
            if self.config.log_actions {
                self.action_log.push(ActionLogEntry {
                    episode,
                    step,
                    action,
                    previous,
                    reward,
                });
            }
            steps += 1;
        }

        let score = self.selector.scorer().score(&grid);
        self.scores.push(score);
        let changed = self.leaderboard.offer(EpisodeRecord {
            episode,
            score,
            grid,
        });
        let best = self.leaderboard.best();
        let summary = EpisodeSummary {
            episode,
            score,
            best_score: best.map_or(score, |r| r.score),
            new_best: changed && best.is_some_and(|r| r.episode == episode),
            exploration_rate,
            learning_rate,
            steps,
            table_states: self.table.len(),
        };
        self.observer.on_episode(&summary);

        let completed = episode + 1;
        if self.config.prune_interval > 0 && completed % self.config.prune_interval == 0 {
            let report = self.table.prune(self.config.prune_percentile);
            self.prunes += 1;
            self.observer.on_prune(episode, &report);
        }
        if self.config.snapshot_interval > 0 && completed % self.config.snapshot_interval == 0 {
            self.push_snapshot(episode);
        }
        summary
    }

    fn push_snapshot(&mut self, episode: usize) {
        let Some(store) = &mut self.store else {
            return;
        };
        match store.save(&self.table) {
            Ok(()) => {
                self.snapshots += 1;
                debug!(episode = episode + 1, states = self.table.len(), "Table snapshot saved");
            }
            Err(e) => {
                self.failed_snapshots += 1;
                warn!(episode = episode + 1, "Skipping table snapshot: {e}");
            }
        }
    }

    #[must_use]
    pub fn report(&self) -> TrainingReport {
        TrainingReport {
            seed: self.seed,
            episodes: self.scores.len(),
            best: self.leaderboard.best().cloned(),
            top: self.leaderboard.records().to_vec(),
            scores: ScoreSummary::from_scores(&self.scores),
            table_states: self.table.len(),
            table_entries: self.table.entry_count(),
            prunes: self.prunes,
            snapshots: self.snapshots,
            failed_snapshots: self.failed_snapshots,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        q_table::PruneReport,
        store::{MemoryStore, StoreError},
    };

    fn config(episodes: usize, seed: u64) -> TrainingConfig {
        TrainingConfig {
            episodes,
            seed: Some(seed),
            ..TrainingConfig::default()
        }
    }

    fn blank(rows: usize, cols: usize) -> Grid {
        Grid::new(rows, cols).unwrap()
    }

    #[derive(Debug, Default, Clone)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl TrainingObserver for Recorder {
        fn on_episode(&mut self, summary: &EpisodeSummary) {
            self.events.lock().unwrap().push(format!("episode {}", summary.episode));
        }

        fn on_prune(&mut self, episode: usize, _report: &PruneReport) {
            self.events.lock().unwrap().push(format!("prune {episode}"));
        }

        fn on_finish(&mut self, report: &TrainingReport) {
            self.events.lock().unwrap().push(format!("finish {}", report.episodes));
        }
    }

    #[derive(Debug)]
    struct FailingStore;

    impl TableStore for FailingStore {
        fn save(&mut self, _table: &QTable) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: "unreachable.json".into(),
                source: std::io::Error::other("disk full"),
            })
        }

        fn load(&self) -> Result<QTable, StoreError> {
            Ok(QTable::new())
        }
    }

    #[test]
    fn test_rejects_entry_outside_grid() {
        let err = TrainingSession::new(blank(3, 3), Position::new(3, 0), config(1, 0)).unwrap_err();
        assert!(matches!(err, SessionError::EntryOutOfBounds { rows: 3, cols: 3, .. }));
        assert_eq!(err.to_string(), "entry (4, 1) lies outside the 3x3 grid");
    }

    #[test]
    fn test_rejects_non_finite_exploration() {
        let config = TrainingConfig {
            exploration: ExplorationSchedule::Constant { rate: f32::NAN },
            ..config(1, 0)
        };
        let err = TrainingSession::new(blank(3, 3), Position::new(0, 0), config).unwrap_err();
        assert!(matches!(err, SessionError::InvalidExploration { .. }));
    }

    #[test]
    fn test_rejects_zero_sized_rows() {
        let rows: Vec<Vec<Tile>> = vec![];
        let err = TrainingSession::from_rows(&rows, Position::new(0, 0), config(1, 0)).unwrap_err();
        assert!(matches!(err, SessionError::Grid(GridError::NoRows)));
        let rows: Vec<Vec<Tile>> = vec![vec![]];
        let err = TrainingSession::from_rows(&rows, Position::new(0, 0), config(1, 0)).unwrap_err();
        assert!(matches!(err, SessionError::Grid(GridError::NoColumns)));
    }

    #[test]
    fn test_episode_fills_grid_and_learns() {
        let mut session =
            TrainingSession::new(blank(3, 3), Position::new(0, 0), config(1, 7)).unwrap();
        let summary = session.run_episode();
        assert_eq!(summary.steps, 8);
        assert!(summary.new_best);
        let best = session.leaderboard().best().unwrap();
        assert!(best.grid.is_full());
        assert_eq!(best.grid.get(Position::new(0, 0)), Tile::Entry);
        // One full-grid state per step, all distinct.
        assert_eq!(session.table().len(), 8);
        assert_eq!(session.scores(), [summary.score]);
    }

    #[test]
    fn test_entry_is_restored_each_episode() {
        let seed: Grid = "0 0 0\nH 0 0\n0 0 G".parse().unwrap();
        let mut session = TrainingSession::new(seed, Position::new(1, 0), config(3, 1)).unwrap();
        let report = session.run();
        for record in &report.top {
            assert_eq!(record.grid.get(Position::new(1, 0)), Tile::Entry);
            assert_eq!(record.grid.get(Position::new(2, 2)), Tile::Green);
        }
    }

    #[test]
    fn test_action_log_is_one_based_when_printed() {
        let mut session = TrainingSession::new(
            blank(2, 2),
            Position::new(0, 0),
            TrainingConfig {
                log_actions: true,
                ..config(2, 3)
            },
        )
        .unwrap();
        session.run();
        let log = session.action_log();
        assert_eq!(log.len(), 6);
        assert!(log.iter().all(|entry| entry.previous == Tile::Empty));
        assert_eq!(log[3].episode, 1);
        assert_eq!(log[3].step, 0);
        assert!(log[3].to_string().starts_with("episode 2 step 1: "));
    }

    #[test]
    fn test_window_encoding_keys_have_window_size() {
        let mut session = TrainingSession::new(
            blank(5, 5),
            Position::new(0, 2),
            TrainingConfig {
                state_encoding: StateEncoding::Window { size: 3 },
                ..config(2, 5)
            },
        )
        .unwrap();
        session.run();
        assert!(!session.table().is_empty());
        assert!(session.table().iter().all(|(key, _)| key.dimensions() == (3, 3)));
    }

    #[test]
    fn test_prune_and_observer_order() {
        let recorder = Recorder::default();
        let mut session = TrainingSession::new(
            blank(3, 3),
            Position::new(0, 0),
            TrainingConfig {
                prune_interval: 2,
                ..config(4, 11)
            },
        )
        .unwrap()
        .with_observer(Box::new(recorder.clone()));
        let report = session.run();
        assert_eq!(report.prunes, 2);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            [
                "episode 0",
                "episode 1",
                "prune 1",
                "episode 2",
                "episode 3",
                "prune 3",
                "finish 4"
            ]
        );
    }

    #[test]
    fn test_snapshots_are_rate_limited() {
        let store = MemoryStore::new();
        let mut session = TrainingSession::new(
            blank(3, 3),
            Position::new(0, 0),
            TrainingConfig {
                snapshot_interval: 3,
                ..config(7, 2)
            },
        )
        .unwrap()
        .with_store(Box::new(store.clone()));
        let report = session.run();
        assert_eq!(report.snapshots, 2);
        assert_eq!(store.saves(), 2);
        assert!(!store.load().unwrap().is_empty());
    }

    #[test]
    fn test_failed_snapshot_does_not_stop_training() {
        let mut session = TrainingSession::new(
            blank(2, 3),
            Position::new(0, 0),
            TrainingConfig {
                snapshot_interval: 1,
                ..config(4, 9)
            },
        )
        .unwrap()
        .with_store(Box::new(FailingStore));
        let report = session.run();
        assert_eq!(report.episodes, 4);
        assert_eq!(report.failed_snapshots, 4);
        assert_eq!(report.snapshots, 0);
    }

    #[test]
    fn test_report_statistics() {
        let mut session =
            TrainingSession::new(blank(3, 3), Position::new(0, 0), config(5, 4)).unwrap();
        let report = session.run();
        let scores = report.scores.unwrap();
        let best = report.best.unwrap();
        assert_eq!(scores.max, best.score);
        assert!(scores.min <= scores.mean && scores.mean <= scores.max);
        assert!(report.top.len() <= 3);
        assert!(report.top.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(report.seed, 4);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: TrainingConfig = serde_json::from_str(
            r#"{"episodes": 20, "state_encoding": {"kind": "window", "size": 3}, "seed": 42}"#,
        )
        .unwrap();
        assert_eq!(config.episodes, 20);
        assert_eq!(config.state_encoding, StateEncoding::Window { size: 3 });
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.prune_interval, 500);
        assert_eq!(config.top_k, 3);
    }
}
