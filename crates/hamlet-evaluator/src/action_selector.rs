//! Choosing the next placement.
//!
//! With probability equal to the exploration rate, the selector picks a
//! uniformly random empty cell and samples a tile from the exploration
//! weights (house 0.5, road 0.3, green 0.2 by default). Otherwise it
//! exploits: every placeable tile is tried on every empty candidate and the
//! placement with the strictly highest reward wins, so ties go to the
//! candidate seen first.
//!
//! Candidates are visited breadth-first from an anchor cell (usually the
//! entry) across the whole grid, which makes tie-breaking favour cells near
//! the anchor. Row-major order is available as an alternative and is used
//! whenever the anchor lies outside the grid.

use hamlet_grid::{Action, Grid, Position, Tile, flood_order};
use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
    seq::IndexedRandom,
};
use serde::{Deserialize, Serialize};

use crate::reward::GridScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Breadth-first from the anchor over the whole grid.
    #[default]
    FloodFromAnchor,
    RowMajor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub candidate_order: CandidateOrder,
    /// Tiles tried on each candidate during exploitation, in order.
    pub placeable: Vec<Tile>,
    /// Exploration sampling weights, one per entry of `placeable`.
    pub exploration_weights: Vec<f32>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            candidate_order: CandidateOrder::default(),
            placeable: Tile::PLACEABLE.to_vec(),
            exploration_weights: vec![0.5, 0.3, 0.2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SelectorError {
    #[display("no placeable tiles configured")]
    NoPlaceableTiles,
    #[display("tile {_0} cannot be placed by the agent")]
    NotPlaceable(#[error(not(source))] Tile),
    #[display("{weights} exploration weights given for {tiles} placeable tiles")]
    WeightCount { tiles: usize, weights: usize },
    #[display("invalid exploration weights: {_0}")]
    #[from]
    InvalidWeights(rand::distr::weighted::Error),
}

/// Picks actions for the training loop.
///
/// # Example
///
/// ```
/// use hamlet_evaluator::{
///     action_selector::{ActionSelector, SelectorConfig},
///     reward::RewardEvaluator,
/// };
/// use hamlet_grid::{Grid, Position, Tile};
/// use rand::SeedableRng;
///
/// let selector =
///     ActionSelector::new(Box::new(RewardEvaluator::default()), SelectorConfig::default())
///         .unwrap();
/// let grid: Grid = "E 0\n0 0".parse().unwrap();
/// let mut rng = rand_pcg::Pcg32::seed_from_u64(0);
///
/// // Greedy: the best single placement next to the entry is a road.
/// let action = selector.choose(&grid, Position::new(0, 0), 0.0, &mut rng).unwrap();
/// assert_eq!(action.tile, Tile::Road);
/// assert!(grid.get(action.position).is_empty());
/// ```
#[derive(Debug)]
pub struct ActionSelector {
    scorer: Box<dyn GridScorer>,
    config: SelectorConfig,
    tile_distr: WeightedIndex<f32>,
}

impl ActionSelector {
    pub fn new(scorer: Box<dyn GridScorer>, config: SelectorConfig) -> Result<Self, SelectorError> {
        if config.placeable.is_empty() {
            return Err(SelectorError::NoPlaceableTiles);
        }
        if let Some(&tile) = config
            .placeable
            .iter()
            .find(|tile| matches!(tile, Tile::Empty | Tile::Entry))
        {
            return Err(SelectorError::NotPlaceable(tile));
        }
        if config.placeable.len() != config.exploration_weights.len() {
            return Err(SelectorError::WeightCount {
                tiles: config.placeable.len(),
                weights: config.exploration_weights.len(),
            });
        }
        let tile_distr = WeightedIndex::new(&config.exploration_weights)?;
        Ok(Self {
            scorer,
            config,
            tile_distr,
        })
    }

    #[must_use]
    pub fn scorer(&self) -> &dyn GridScorer {
        self.scorer.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Empty cells in the order exploitation visits them.
    #[must_use]
    pub fn candidates(&self, grid: &Grid, anchor: Position) -> Vec<Position> {
        let order = match self.config.candidate_order {
            CandidateOrder::FloodFromAnchor => flood_order(grid, anchor),
            CandidateOrder::RowMajor => grid.positions().collect(),
        };
        order
            .into_iter()
            .filter(|&pos| grid.get(pos).is_empty())
            .collect()
    }

    /// Chooses the next placement, or `None` when no empty cell remains.
    ///
    /// `exploration_rate` is clamped to `[0, 1]`.
    pub fn choose<R>(
        &self,
        grid: &Grid,
        anchor: Position,
        exploration_rate: f32,
        rng: &mut R,
    ) -> Option<Action>
    where
        R: Rng + ?Sized,
    {
        let candidates = self.candidates(grid, anchor);
        if candidates.is_empty() {
            return None;
        }
        // NaN never explores.
        let exploration_rate = if exploration_rate.is_nan() {
            0.0
        } else {
            exploration_rate.clamp(0.0, 1.0)
        };
        if rng.random_bool(f64::from(exploration_rate)) {
            let position = *candidates.choose(rng)?;
            let tile = self.config.placeable[self.tile_distr.sample(rng)];
            return Some(Action::new(position, tile));
        }
        self.best_of(grid, &candidates).map(|(action, _)| action)
    }

    /// Highest-scoring placement over all empty cells, with its score.
    #[must_use]
    pub fn exploit(&self, grid: &Grid, anchor: Position) -> Option<(Action, f32)> {
        self.best_of(grid, &self.candidates(grid, anchor))
    }

    fn best_of(&self, grid: &Grid, candidates: &[Position]) -> Option<(Action, f32)> {
        let mut scratch = grid.clone();
        let mut best: Option<(Action, f32)> = None;
        for &position in candidates {
            for &tile in &self.config.placeable {
                scratch.set(position, tile);
                let score = self.scorer.score(&scratch);
                if best.is_none_or(|(_, best_score)| score > best_score) {
                    best = Some((Action::new(position, tile), score));
                }
            }
            scratch.set(position, Tile::Empty);
        }
        best
    }
}
