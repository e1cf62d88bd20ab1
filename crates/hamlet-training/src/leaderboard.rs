use hamlet_grid::Grid;
use serde::{Deserialize, Serialize};

/// Final layout of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub score: f32,
    pub grid: Grid,
}

/// The best `capacity` distinct layouts seen so far, highest score first.
///
/// A layout that is already listed only moves if it is offered with a higher
/// score. Among equal scores the earlier record stays ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    capacity: usize,
    records: Vec<EpisodeRecord>,
}

impl Leaderboard {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn best(&self) -> Option<&EpisodeRecord> {
        self.records.first()
    }

    #[must_use]
    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<EpisodeRecord> {
        self.records
    }

    /// Offers a record; returns `true` if the board changed.
    pub fn offer(&mut self, record: EpisodeRecord) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if let Some(i) = self.records.iter().position(|r| r.grid == record.grid) {
            if record.score <= self.records[i].score {
                return false;
            }
            self.records.remove(i);
        }
        let index = self
            .records
            .iter()
            .position(|r| record.score > r.score)
            .unwrap_or(self.records.len());
        if index >= self.capacity {
            return false;
        }
        self.records.insert(index, record);
        self.records.truncate(self.capacity);
        true
    }
}
