//! Progress hooks for a training run.

use std::fmt;

use tracing::{debug, info};

use crate::{
    q_table::PruneReport,
    session::{EpisodeSummary, TrainingReport},
};

/// Receives progress from [`TrainingSession::run`](crate::session::TrainingSession::run).
///
/// Every method has an empty default, so observers implement only what they
/// need.
pub trait TrainingObserver: fmt::Debug + Send {
    fn on_episode(&mut self, _summary: &EpisodeSummary) {}
    fn on_prune(&mut self, _episode: usize, _report: &PruneReport) {}
    fn on_finish(&mut self, _report: &TrainingReport) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TrainingObserver for NoopObserver {}

/// Emits `tracing` events.
///
/// Every `progress_interval`-th episode and every new best layout is logged at
/// `INFO`; the remaining episodes at `DEBUG`.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    progress_interval: usize,
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(10)
    }
}

impl TracingObserver {
    #[must_use]
    pub fn new(progress_interval: usize) -> Self {
        Self {
            progress_interval: progress_interval.max(1),
        }
    }
}

impl TrainingObserver for TracingObserver {
    fn on_episode(&mut self, summary: &EpisodeSummary) {
        if summary.new_best || (summary.episode + 1) % self.progress_interval == 0 {
            info!(
                episode = summary.episode + 1,
                score = summary.score,
                best = summary.best_score,
                epsilon = summary.exploration_rate,
                alpha = summary.learning_rate,
                states = summary.table_states,
                "Episode {} finished with score {:.1}",
                summary.episode + 1,
                summary.score
            );
        } else {
            debug!(
                episode = summary.episode + 1,
                score = summary.score,
                steps = summary.steps,
                "Episode finished"
            );
        }
    }

    fn on_prune(&mut self, episode: usize, report: &PruneReport) {
        info!(
            episode = episode + 1,
            before = report.states_before,
            after = report.states_after,
            "Pruned {} states",
            report.states_removed()
        );
        for class in &report.classes {
            debug!(
                rows = class.rows,
                cols = class.cols,
                threshold = class.threshold,
                removed = class.states_removed,
                "Size class pruned"
            );
        }
    }

    fn on_finish(&mut self, report: &TrainingReport) {
        info!(
            episodes = report.episodes,
            states = report.table_states,
            "Training finished, best score {:.1}",
            report.best.as_ref().map_or(f32::NAN, |r| r.score)
        );
    }
}
