//! Per-episode exploration and learning rates.

use serde::{Deserialize, Serialize};

/// Probability of taking a random action in a given episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExplorationSchedule {
    Constant { rate: f32 },
    /// `max(end, start * decay^episode)`
    Exponential { start: f32, end: f32, decay: f32 },
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self::Exponential {
            start: 0.7,
            end: 0.01,
            decay: 0.95,
        }
    }
}

impl ExplorationSchedule {
    /// Whether every parameter is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Constant { rate } => rate.is_finite(),
            Self::Exponential { start, end, decay } => {
                start.is_finite() && end.is_finite() && decay.is_finite()
            }
        }
    }

    /// Rate for `episode`, clamped to `[0, 1]`. NaN maps to 0.
    #[must_use]
    pub fn rate(&self, episode: usize) -> f32 {
        let rate = match *self {
            Self::Constant { rate } => rate,
            Self::Exponential { start, end, decay } => {
                let exponent = i32::try_from(episode).unwrap_or(i32::MAX);
                (start * decay.powi(exponent)).max(end)
            }
        };
        if rate.is_nan() {
            0.0
        } else {
            rate.clamp(0.0, 1.0)
        }
    }
}

/// Step size α, decayed hyperbolically: `max(min, start / (1 + episode * decay))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningRateSchedule {
    pub start: f32,
    pub min: f32,
    pub decay: f32,
}

impl Default for LearningRateSchedule {
    fn default() -> Self {
        Self {
            start: 0.1,
            min: 0.01,
            decay: 0.001,
        }
    }
}

impl LearningRateSchedule {
    /// A schedule that never decays.
    #[must_use]
    pub const fn constant(rate: f32) -> Self {
        Self {
            start: rate,
            min: rate,
            decay: 0.0,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn rate(&self, episode: usize) -> f32 {
        (self.start / (1.0 + episode as f32 * self.decay)).max(self.min)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_exponential_exploration_decays_to_floor() {
        let schedule = ExplorationSchedule::default();
        assert_abs_diff_eq!(schedule.rate(0), 0.7);
        assert_abs_diff_eq!(schedule.rate(1), 0.665, epsilon = 1e-5);
        let mut previous = schedule.rate(0);
        for episode in 1..300 {
            let rate = schedule.rate(episode);
            assert!(rate <= previous);
            assert!(rate >= 0.01);
            previous = rate;
        }
        assert_abs_diff_eq!(schedule.rate(10_000), 0.01);
        assert_abs_diff_eq!(schedule.rate(usize::MAX), 0.01);
    }

    #[test]
    fn test_constant_exploration_is_clamped() {
        assert_eq!(ExplorationSchedule::Constant { rate: 0.3 }.rate(99), 0.3);
        assert_eq!(ExplorationSchedule::Constant { rate: 1.5 }.rate(0), 1.0);
    }

    #[test]
    fn test_non_finite_exploration() {
        let nan = ExplorationSchedule::Constant { rate: f32::NAN };
        assert!(!nan.is_finite());
        assert_eq!(nan.rate(0), 0.0);
        let runaway = ExplorationSchedule::Exponential {
            start: f32::INFINITY,
            end: 0.01,
            decay: 0.95,
        };
        assert!(!runaway.is_finite());
        assert!(ExplorationSchedule::default().is_finite());
    }

    #[test]
    fn test_learning_rate_is_bounded_and_monotone() {
        let schedule = LearningRateSchedule::default();
        assert_abs_diff_eq!(schedule.rate(0), 0.1);
        assert_abs_diff_eq!(schedule.rate(1000), 0.05, epsilon = 1e-6);
        let mut previous = schedule.rate(0);
        for episode in (0..100_000).step_by(500) {
            let rate = schedule.rate(episode);
            assert!(rate <= previous && rate >= schedule.min);
            previous = rate;
        }
        assert_abs_diff_eq!(schedule.rate(1_000_000), 0.01);
        assert_eq!(LearningRateSchedule::constant(0.5).rate(123), 0.5);
    }

    #[test]
    fn test_schedule_json() {
        let json = serde_json::to_string(&ExplorationSchedule::Constant { rate: 1.0 }).unwrap();
        assert_eq!(json, r#"{"kind":"constant","rate":1.0}"#);
        let partial: LearningRateSchedule = serde_json::from_str(r#"{"start":0.2}"#).unwrap();
        assert_eq!(partial.min, 0.01);
    }
}
