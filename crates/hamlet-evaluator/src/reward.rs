//! The reward signal: a pure function from a grid to a scalar score.
//!
//! ```text
//! score = base + bonuses - penalties
//! ```
//!
//! - **Base**: a value per tile (entry 50, green 15, house 20, road 10, empty -50).
//! - **Bonuses**: horizontal house and road triples, vertical house-road-house
//!   stacks, 2x2 house/road blocks, all houses served by a road, and houses on
//!   the border.
//! - **Penalties**: houses with no road around them, entries with no adjacent
//!   road, disconnected roads (or no road at all), too little or too much green
//!   space, and repeated mixed road/house pairs.
//!
//! Every constant lives in [`RewardConfig`]; the defaults reproduce the values
//! above. [`RewardEvaluator::breakdown`] exposes each term for reporting.

use std::fmt;

use hamlet_grid::{Grid, Tile, Traversal};
use serde::{Deserialize, Serialize};

use crate::grid_analysis::GridAnalysis;

/// Scores grids. Higher is better.
pub trait GridScorer: fmt::Debug + Send + Sync {
    /// Must not modify global state: equal grids always get equal scores.
    fn score(&self, grid: &Grid) -> f32;
}

/// Base value of each tile kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileValues {
    pub entry: f32,
    pub green: f32,
    pub house: f32,
    pub road: f32,
    pub empty: f32,
}

impl Default for TileValues {
    fn default() -> Self {
        Self {
            entry: 50.0,
            green: 15.0,
            house: 20.0,
            road: 10.0,
            empty: -50.0,
        }
    }
}

impl TileValues {
    #[must_use]
    pub fn value(&self, tile: Tile) -> f32 {
        match tile.kind() {
            Tile::Empty => self.empty,
            Tile::Entry => self.entry,
            Tile::Road => self.road,
            Tile::Green => self.green,
            Tile::House | Tile::HouseType(_) => self.house,
        }
    }
}

/// Reward constants. Penalties are positive magnitudes that get subtracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub tile_values: TileValues,
    pub house_triple_bonus: f32,
    pub road_triple_bonus: f32,
    pub house_road_house_bonus: f32,
    pub house_road_block_bonus: f32,
    pub all_houses_served_bonus: f32,
    pub edge_house_bonus: f32,
    pub house_without_road_penalty: f32,
    pub entry_without_road_penalty: f32,
    pub extra_road_cluster_penalty: f32,
    pub no_road_penalty: f32,
    pub green_ratio_min: f32,
    pub green_ratio_max: f32,
    pub green_ratio_penalty: f32,
    pub repeated_mixed_pair_penalty: f32,
    /// Shape of the all-empty grid scored in place of malformed input.
    pub fallback_rows: usize,
    pub fallback_cols: usize,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            tile_values: TileValues::default(),
            house_triple_bonus: 100.0,
            road_triple_bonus: 100.0,
            house_road_house_bonus: 100.0,
            house_road_block_bonus: 100.0,
            all_houses_served_bonus: 100.0,
            edge_house_bonus: 50.0,
            house_without_road_penalty: 300.0,
            entry_without_road_penalty: 1000.0,
            extra_road_cluster_penalty: 500.0,
            no_road_penalty: 1000.0,
            green_ratio_min: 0.05,
            green_ratio_max: 0.20,
            green_ratio_penalty: 500.0,
            repeated_mixed_pair_penalty: 50.0,
            fallback_rows: 5,
            fallback_cols: 5,
        }
    }
}

/// Every term of a score. Penalties are stored as positive magnitudes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub base: f32,
    pub triple_bonus: f32,
    pub house_road_house_bonus: f32,
    pub block_bonus: f32,
    pub all_houses_served_bonus: f32,
    pub edge_house_bonus: f32,
    pub house_without_road_penalty: f32,
    pub entry_without_road_penalty: f32,
    pub road_connectivity_penalty: f32,
    pub green_ratio_penalty: f32,
    pub repeated_mixed_pair_penalty: f32,
}

impl RewardBreakdown {
    #[must_use]
    pub fn bonus(&self) -> f32 {
        self.triple_bonus
            + self.house_road_house_bonus
            + self.block_bonus
            + self.all_houses_served_bonus
            + self.edge_house_bonus
    }

    #[must_use]
    pub fn penalty(&self) -> f32 {
        self.house_without_road_penalty
            + self.entry_without_road_penalty
            + self.road_connectivity_penalty
            + self.green_ratio_penalty
            + self.repeated_mixed_pair_penalty
    }

    #[must_use]
    pub fn total(&self) -> f32 {
        self.base + self.bonus() - self.penalty()
    }
}

impl fmt::Display for RewardBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "base                        {:>8.1}", self.base)?;
        writeln!(f, "+ triples                   {:>8.1}", self.triple_bonus)?;
        writeln!(f, "+ house-road-house          {:>8.1}", self.house_road_house_bonus)?;
        writeln!(f, "+ house/road blocks         {:>8.1}", self.block_bonus)?;
        writeln!(f, "+ all houses served         {:>8.1}", self.all_houses_served_bonus)?;
        writeln!(f, "+ edge houses               {:>8.1}", self.edge_house_bonus)?;
        writeln!(f, "- houses without road       {:>8.1}", self.house_without_road_penalty)?;
        writeln!(f, "- entries without road      {:>8.1}", self.entry_without_road_penalty)?;
        writeln!(f, "- road connectivity         {:>8.1}", self.road_connectivity_penalty)?;
        writeln!(f, "- green ratio               {:>8.1}", self.green_ratio_penalty)?;
        writeln!(f, "- repeated mixed pairs      {:>8.1}", self.repeated_mixed_pair_penalty)?;
        write!(f, "= total                     {:>8.1}", self.total())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RewardEvaluator {
    config: RewardConfig,
    traversal: Traversal,
}

impl RewardEvaluator {
    #[must_use]
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config,
            traversal: Traversal::default(),
        }
    }

    /// Selects the flood-fill discipline used to count road clusters.
    /// Scores do not depend on it.
    #[must_use]
    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn breakdown(&self, grid: &Grid) -> RewardBreakdown {
        let c = &self.config;
        let analysis = GridAnalysis::from_grid(grid, self.traversal);
        let times = |count: usize, value: f32| count as f32 * value;

        let base = grid
            .iter()
            .map(|(_, tile)| c.tile_values.value(tile))
            .sum();

        let road_connectivity_penalty = match analysis.road_clusters {
            0 => c.no_road_penalty,
            n => times(n - 1, c.extra_road_cluster_penalty),
        };
        let green_ratio = analysis.green_ratio();
        let green_range = c.green_ratio_min..=c.green_ratio_max;
        let green_ratio_penalty = if green_range.contains(&green_ratio) {
            0.0
        } else {
            c.green_ratio_penalty
        };

        RewardBreakdown {
            base,
            triple_bonus: times(analysis.house_triples, c.house_triple_bonus)
                + times(analysis.road_triples, c.road_triple_bonus),
            house_road_house_bonus: times(
                analysis.house_road_house_columns,
                c.house_road_house_bonus,
            ),
            block_bonus: times(
                analysis.houses_over_roads + analysis.roads_over_houses,
                c.house_road_block_bonus,
            ),
            all_houses_served_bonus: if analysis.all_houses_served() {
                c.all_houses_served_bonus
            } else {
                0.0
            },
            edge_house_bonus: times(analysis.edge_houses, c.edge_house_bonus),
            house_without_road_penalty: times(
                analysis.houses_without_nearby_road,
                c.house_without_road_penalty,
            ),
            entry_without_road_penalty: times(
                analysis.entries_without_road,
                c.entry_without_road_penalty,
            ),
            road_connectivity_penalty,
            green_ratio_penalty,
            repeated_mixed_pair_penalty: times(
                analysis.repeated_mixed_pairs,
                c.repeated_mixed_pair_penalty,
            ),
        }
    }

    /// Grid substituted for malformed input.
    #[must_use]
    pub fn fallback_grid(&self) -> Grid {
        Grid::new(self.config.fallback_rows.max(1), self.config.fallback_cols.max(1))
            .expect("fallback dimensions are clamped to at least 1")
    }

    /// Scores raw rows. Empty or jagged input is replaced by an all-empty
    /// fallback grid, so this never fails.
    #[must_use]
    pub fn score_rows<R>(&self, rows: &[R]) -> f32
    where
        R: AsRef<[Tile]>,
    {
        match Grid::from_rows(rows) {
            Ok(grid) => self.score(&grid),
            Err(_) => self.score(&self.fallback_grid()),
        }
    }
}

impl GridScorer for RewardEvaluator {
    fn score(&self, grid: &Grid) -> f32 {
        self.breakdown(grid).total()
    }
}
