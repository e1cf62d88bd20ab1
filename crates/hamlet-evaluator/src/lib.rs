//! Scoring and move selection for village layouts.
//!
//! The crate is layered:
//!
//! ```text
//! Action Selection (pick the next placement)
//!     ↓ scores candidates with
//! Reward Evaluation (grid → scalar reward)
//!     ↓ reads metrics from
//! Grid Analysis (pattern counts, road access, clusters)
//! ```
//!
//! - [`cluster_analysis`] counts 4-connected groups of one tile kind.
//! - [`grid_analysis`] extracts every metric the reward needs in one pass over the grid.
//! - [`reward`] turns those metrics into a score via the constants of [`reward::RewardConfig`].
//! - [`action_selector`] balances random exploration with reward-greedy exploitation.
//! - [`layout_check`] is a stricter pass/fail rule set used when reporting finished layouts.
//!
//! Scoring is pure: the same grid always gets the same score and is never modified.
//!
//! # Example
//!
//! ```
//! use hamlet_evaluator::reward::{GridScorer, RewardEvaluator};
//! use hamlet_grid::Grid;
//!
//! let evaluator = RewardEvaluator::default();
//! let near: Grid = "E R\n0 0".parse().unwrap();
//! let far: Grid = "E 0\n0 R".parse().unwrap();
//! assert!(evaluator.score(&near) > evaluator.score(&far));
//! ```

pub mod action_selector;
pub mod cluster_analysis;
pub mod grid_analysis;
pub mod layout_check;
pub mod reward;
