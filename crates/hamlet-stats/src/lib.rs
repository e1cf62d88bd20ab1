//! Small statistics toolkit shared by the hamlet crates.
//!
//! - [`percentiles`]: linearly interpolated percentiles. Value-table pruning uses
//!   them to derive per-size-class thresholds.
//! - [`descriptive`]: min/max/mean/median/spread summaries, used for episode score reports.
//!
//! # Examples
//!
//! ```
//! use hamlet_stats::{descriptive::DescriptiveStats, percentiles::compute_percentile_linear};
//!
//! let scores = [-120.0, 40.0, 310.0, 95.0];
//! let stats = DescriptiveStats::new(scores).unwrap();
//! assert_eq!(stats.max, 310.0);
//!
//! let mut sorted = scores.to_vec();
//! sorted.sort_by(f32::total_cmp);
//! assert_eq!(compute_percentile_linear(&sorted, 0.0), -120.0);
//! ```

pub mod descriptive;
pub mod percentiles;
