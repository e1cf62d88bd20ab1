//! Tabular action values.
//!
//! A [`QTable`] maps a [`StateKey`] and an [`Action`] to a learned value.
//! Entries are created lazily at 0 and updated with the temporal-difference
//! rule:
//!
//! ```text
//! Q(s, a) <- (1 - α) Q(s, a) + α (r + γ max_a' Q(s', a'))
//! ```
//!
//! Both levels are ordered maps, so iteration and the JSON form
//! (`{"states": {"<key>": {"<row>,<col>,<tile>": value}}}`) are deterministic.
//!
//! The table grows by one state per new layout seen, so training prunes it
//! periodically: states are grouped by the dimensions of their key, the
//! 35th percentile (by default) of each group's per-state best values becomes
//! that group's threshold, and every state whose *mean* value falls below its
//! group's threshold is dropped. Groups never share a threshold, so small
//! windows and whole grids do not compete.

use std::collections::{BTreeMap, btree_map};

use hamlet_grid::{Action, StateKey};
use hamlet_stats::percentiles::compute_percentile_linear;
use serde::{Deserialize, Serialize};

pub type ActionValues = BTreeMap<Action, f32>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    states: BTreeMap<StateKey, ActionValues>,
}

impl QTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of state-action entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.states.values().map(BTreeMap::len).sum()
    }

    /// Value of `action` in `state`, 0 if never set.
    #[must_use]
    pub fn get(&self, state: &StateKey, action: &Action) -> f32 {
        self.states
            .get(state)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn update(&mut self, state: StateKey, action: Action, value: f32) {
        self.states.entry(state).or_default().insert(action, value);
    }

    #[must_use]
    pub fn actions(&self, state: &StateKey) -> Option<&ActionValues> {
        self.states.get(state)
    }

    /// Best known value in `state`, 0 if the state is unseen.
    #[must_use]
    pub fn max_value_for(&self, state: &StateKey) -> f32 {
        self.states
            .get(state)
            .and_then(|actions| actions.values().copied().reduce(f32::max))
            .unwrap_or(0.0)
    }

    /// Applies one temporal-difference update and returns the new value.
    ///
    /// For `0 <= alpha <= 1` the result lies between the old value and the
    /// target `reward + discount * max_value_for(next_state)`.
    pub fn learn(
        &mut self,
        state: StateKey,
        action: Action,
        reward: f32,
        next_state: &StateKey,
        alpha: f32,
        discount: f32,
    ) -> f32 {
        let target = reward + discount * self.max_value_for(next_state);
        let old = self.get(&state, &action);
        let value = (1.0 - alpha) * old + alpha * target;
        self.update(state, action, value);
        value
    }

    pub fn iter(&self) -> btree_map::Iter<'_, StateKey, ActionValues> {
        self.states.iter()
    }

    /// Keeps only the states for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&StateKey, &ActionValues) -> bool,
    {
        self.states.retain(|state, actions| keep(state, actions));
    }

    /// Folds an independently trained table into this one.
    ///
    /// Entries present in both tables are averaged; the rest are copied.
    pub fn merge(&mut self, other: &QTable) {
        for (state, other_actions) in &other.states {
            let actions = self.states.entry(state.clone()).or_default();
            for (action, &value) in other_actions {
                actions
                    .entry(*action)
                    .and_modify(|v| *v = (*v + value) / 2.0)
                    .or_insert(value);
            }
        }
    }

    /// Entry-wise mean of independently trained tables, each weighing the same.
    ///
    /// An entry held by only some of the tables is averaged over those.
    #[must_use]
    pub fn average<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a QTable>,
    {
        let mut sums = BTreeMap::<StateKey, BTreeMap<Action, (f32, f32)>>::new();
        for table in tables {
            for (state, actions) in &table.states {
                let slots = sums.entry(state.clone()).or_default();
                for (action, &value) in actions {
                    let (sum, count) = slots.entry(*action).or_insert((0.0, 0.0));
                    *sum += value;
                    *count += 1.0;
                }
            }
        }
        let states = sums
            .into_iter()
            .map(|(state, slots)| {
                let actions = slots
                    .into_iter()
                    .map(|(action, (sum, count))| (action, sum / count))
                    .collect();
                (state, actions)
            })
            .collect();
        Self { states }
    }

    /// Drops low-value states, thresholded per key-dimension class.
    ///
    /// States without any action values are dropped as well.
    pub fn prune(&mut self, percentile: f32) -> PruneReport {
        let states_before = self.states.len();

        let mut maxima = BTreeMap::<(usize, usize), Vec<f32>>::new();
        for (state, actions) in &self.states {
            if let Some(max) = actions.values().copied().reduce(f32::max) {
                maxima.entry(state.dimensions()).or_default().push(max);
            }
        }
        let mut classes = maxima
            .into_iter()
            .map(|((rows, cols), mut values)| {
                values.sort_by(f32::total_cmp);
                SizeClassPrune {
                    rows,
                    cols,
                    threshold: compute_percentile_linear(&values, percentile),
                    states_before: values.len(),
                    states_removed: 0,
                }
            })
            .collect::<Vec<_>>();

        self.states.retain(|state, actions| {
            let Some(mean) = mean(actions) else {
                return false;
            };
            let dims = state.dimensions();
            let class = classes
                .iter_mut()
                .find(|c| (c.rows, c.cols) == dims)
                .expect("every state with values has a size class");
            let keep = mean >= class.threshold;
            if !keep {
                class.states_removed += 1;
            }
            keep
        });

        PruneReport {
            percentile,
            states_before,
            states_after: self.states.len(),
            classes,
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean(actions: &ActionValues) -> Option<f32> {
    (!actions.is_empty()).then(|| actions.values().sum::<f32>() / actions.len() as f32)
}

/// Outcome of pruning one key-dimension class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeClassPrune {
    pub rows: usize,
    pub cols: usize,
    pub threshold: f32,
    pub states_before: usize,
    pub states_removed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruneReport {
    pub percentile: f32,
    pub states_before: usize,
    pub states_after: usize,
    pub classes: Vec<SizeClassPrune>,
}

impl PruneReport {
    #[must_use]
    pub fn states_removed(&self) -> usize {
        self.states_before - self.states_after
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use hamlet_grid::{Grid, Tile};

    use super::*;

    fn key(text: &str) -> StateKey {
        text.parse().unwrap()
    }

    fn road(row: usize, col: usize) -> Action {
        Action::at(row, col, Tile::Road)
    }

    #[test]
    fn test_unseen_entries_are_zero() {
        let table = QTable::new();
        assert_eq!(table.get(&key("E0"), &road(0, 1)), 0.0);
        assert_eq!(table.max_value_for(&key("E0")), 0.0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_max_value_for_negative_values() {
        let mut table = QTable::new();
        table.update(key("E0"), road(0, 1), -5.0);
        table.update(key("E0"), Action::at(0, 1, Tile::House), -2.0);
        assert_eq!(table.max_value_for(&key("E0")), -2.0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.entry_count(), 2);
    }

    #[test]
    fn test_learn_applies_td_rule() {
        let mut table = QTable::new();
        table.update(key("ER"), road(0, 1), 10.0);
        table.update(key("E0"), road(0, 1), 4.0);
        // target = 2 + 0.9 * 10 = 11; new = 0.5 * 4 + 0.5 * 11
        let value = table.learn(key("E0"), road(0, 1), 2.0, &key("ER"), 0.5, 0.9);
        assert_abs_diff_eq!(value, 7.5, epsilon = 1e-5);
        assert_eq!(table.get(&key("E0"), &road(0, 1)), value);
    }

    #[test]
    fn test_learn_stays_between_old_value_and_target() {
        let mut table = QTable::new();
        let next = key("ER");
        table.update(next.clone(), road(0, 1), 30.0);
        for (old, reward) in [(0.0, -100.0), (50.0, 10.0), (-20.0, 500.0)] {
            for alpha in [0.0, 0.01, 0.3, 1.0] {
                table.update(key("E0"), road(0, 1), old);
                let target = reward + 0.9 * 30.0;
                let new = table.learn(key("E0"), road(0, 1), reward, &next, alpha, 0.9);
                let (lo, hi) = if old <= target { (old, target) } else { (target, old) };
                assert!(lo - 1e-3 <= new && new <= hi + 1e-3, "{new} not in [{lo}, {hi}]");
            }
        }
    }

    #[test]
    fn test_merge_averages_shared_entries() {
        let mut a = QTable::new();
        a.update(key("E0"), road(0, 1), 10.0);
        a.update(key("E0"), Action::at(0, 1, Tile::Green), 1.0);
        let mut b = QTable::new();
        b.update(key("E0"), road(0, 1), 20.0);
        b.update(key("0E"), road(0, 0), 7.0);
        a.merge(&b);
        assert_eq!(a.get(&key("E0"), &road(0, 1)), 15.0);
        assert_eq!(a.get(&key("E0"), &Action::at(0, 1, Tile::Green)), 1.0);
        assert_eq!(a.get(&key("0E"), &road(0, 0)), 7.0);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_average_weighs_every_table_equally() {
        let tables: Vec<QTable> = [0.0, 0.0, 30.0]
            .into_iter()
            .map(|value| {
                let mut table = QTable::new();
                table.update(key("E0"), road(0, 1), value);
                table
            })
            .collect();
        let mut extra = QTable::new();
        extra.update(key("0E"), road(0, 0), 7.0);

        let averaged = QTable::average(tables.iter().chain([&extra]));
        assert_eq!(averaged.get(&key("E0"), &road(0, 1)), 10.0);
        assert_eq!(averaged.get(&key("0E"), &road(0, 0)), 7.0);
        assert_eq!(averaged.len(), 2);
        assert!(QTable::average(Vec::<QTable>::new().iter()).is_empty());
    }

    #[test]
    fn test_retain_by_predicate() {
        let mut table = QTable::new();
        table.update(key("E0"), road(0, 1), 1.0);
        table.update(key("E0/00"), road(1, 1), 1.0);
        table.retain(|state, _| state.dimensions() == (2, 2));
        assert_eq!(table.len(), 1);
        assert!(table.actions(&key("E0/00")).is_some());
    }

    #[test]
    fn test_prune_drops_states_below_class_threshold() {
        let mut table = QTable::new();
        let states = ["E000", "0E00", "00E0", "000E"];
        for (i, state) in states.iter().enumerate() {
            #[expect(clippy::cast_precision_loss)]
            table.update(key(state), road(0, 0), i as f32 * 10.0);
        }
        // maxima [0, 10, 20, 30]: rank 0.35 * 3 = 1.05 -> threshold 10.5
        let report = table.prune(35.0);
        assert_eq!(report.states_before, 4);
        assert_eq!(report.states_after, 2);
        assert_eq!(report.classes.len(), 1);
        assert_abs_diff_eq!(report.classes[0].threshold, 10.5, epsilon = 1e-4);
        assert!(table.actions(&key("00E0")).is_some());
        assert!(table.actions(&key("0E00")).is_none());
    }

    #[test]
    fn test_prune_uses_mean_against_max_threshold() {
        let mut table = QTable::new();
        // max 10 but mean 0: below a threshold drawn from maxima
        table.update(key("E0"), road(0, 1), 10.0);
        table.update(key("E0"), Action::at(0, 1, Tile::House), -10.0);
        table.update(key("0E"), road(0, 0), 6.0);
        let report = table.prune(0.0);
        assert_abs_diff_eq!(report.classes[0].threshold, 6.0);
        assert!(table.actions(&key("E0")).is_none());
        assert!(table.actions(&key("0E")).is_some());
    }

    #[test]
    fn test_prune_isolates_size_classes() {
        let mut table = QTable::new();
        let small = StateKey::from_grid(&Grid::new(3, 3).unwrap());
        let large = StateKey::from_grid(&Grid::new(5, 5).unwrap());
        let mut large_alt = Grid::new(5, 5).unwrap();
        large_alt.set(hamlet_grid::Position::new(0, 0), Tile::Entry);
        let large_alt = StateKey::from_grid(&large_alt);

        table.update(small.clone(), road(0, 0), -1000.0);
        table.update(large.clone(), road(0, 0), 500.0);
        table.update(large_alt.clone(), road(0, 0), 900.0);

        let report = table.prune(35.0);
        assert_eq!(report.classes.len(), 2);
        // The lone 3x3 state is its own threshold and survives, even though
        // it is far below every 5x5 value.
        assert!(table.actions(&small).is_some());
        assert!(table.actions(&large).is_none());
        assert!(table.actions(&large_alt).is_some());
        assert_eq!(report.states_removed(), 1);
    }

    #[test]
    fn test_json_shape() {
        let mut table = QTable::new();
        table.update(key("E0/00"), road(0, 1), 1.5);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"states":{"E0/00":{"0,1,R":1.5}}}"#);
        assert_eq!(serde_json::from_str::<QTable>(&json).unwrap(), table);
    }
}
