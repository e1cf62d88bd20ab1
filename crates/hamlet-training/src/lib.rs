//! Tabular Q-learning over village layouts.
//!
//! - [`q_table`]: the `(state, action) -> value` table, temporal-difference
//!   updates, per-size-class pruning and merging.
//! - [`schedule`]: per-episode exploration and learning rates.
//! - [`session`]: the training loop ([`TrainingSession`](session::TrainingSession)).
//! - [`leaderboard`]: best distinct layouts found.
//! - [`observer`] and [`store`]: progress hooks and table persistence.
//! - [`seed`]: starting-grid selection.
//! - [`parallel`]: concurrent runs over several entry positions and grid sizes.
//!
//! # Example
//!
//! ```
//! use hamlet_grid::{Grid, Position, Tile};
//! use hamlet_training::session::{TrainingConfig, TrainingSession};
//!
//! let config = TrainingConfig {
//!     episodes: 5,
//!     seed: Some(1),
//!     ..TrainingConfig::default()
//! };
//! let mut session = TrainingSession::new(Grid::new(3, 3).unwrap(), Position::new(0, 0), config)
//!     .unwrap();
//! let report = session.run();
//!
//! let best = report.best.unwrap();
//! assert!(best.grid.is_full());
//! assert_eq!(best.grid.get(Position::new(0, 0)), Tile::Entry);
//! ```

pub mod leaderboard;
pub mod observer;
pub mod parallel;
pub mod q_table;
pub mod schedule;
pub mod seed;
pub mod session;
pub mod store;
