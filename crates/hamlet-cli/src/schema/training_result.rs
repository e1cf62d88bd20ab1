use chrono::{DateTime, Utc};
use hamlet_evaluator::reward::RewardConfig;
use hamlet_grid::{Grid, ProfitSummary};
use hamlet_training::{
    seed::SeedSource,
    session::{TrainingConfig, TrainingReport},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingResult {
    pub trained_at: DateTime<Utc>,
    pub config: TrainingConfig,
    pub reward: RewardConfig,
    pub runs: Vec<EntryResult>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntryResult {
    pub rows: usize,
    pub cols: usize,
    /// Entry position, counting from 1.
    pub entry: (usize, usize),
    pub seed_source: SeedSource,
    pub report: TrainingReport,
    /// Best layout with house types assigned.
    pub typed_best: Option<TypedLayout>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TypedLayout {
    pub grid: Grid,
    pub profit: ProfitSummary,
}
