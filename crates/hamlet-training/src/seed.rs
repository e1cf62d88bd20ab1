use hamlet_evaluator::{layout_check::is_valid_layout, reward::GridScorer};
use hamlet_grid::{Grid, GridError, Position, Tile, blank_with_entry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum SeedSource {
    /// Index into the candidate list.
    Candidate(usize),
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedGrid {
    pub grid: Grid,
    pub entry: Position,
    pub source: SeedSource,
}

/// Chooses the starting grid for a `rows x cols` run with its entry at `entry`.
///
/// A candidate qualifies when it has the requested shape, its first entry in
/// row-major order sits at `entry` and it passes
/// [`is_valid_layout`]. The best-scoring one wins, earlier candidates winning
/// ties. Without a qualifying candidate the result is a blank grid with the
/// entry nudged onto the nearest edge.
pub fn seed_grid(
    candidates: &[Grid],
    rows: usize,
    cols: usize,
    entry: Position,
    scorer: &dyn GridScorer,
) -> Result<SeedGrid, GridError> {
    let mut best: Option<(usize, f32)> = None;
    for (i, grid) in candidates.iter().enumerate() {
        if grid.dimensions() != (rows, cols)
            || grid.find(Tile::Entry) != Some(entry)
            || !is_valid_layout(grid)
        {
            continue;
        }
        let score = scorer.score(grid);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((i, score));
        }
    }
    if let Some((i, _)) = best {
        return Ok(SeedGrid {
            grid: candidates[i].clone(),
            entry,
            source: SeedSource::Candidate(i),
        });
    }
    let (grid, entry) = blank_with_entry(rows, cols, entry)?;
    Ok(SeedGrid {
        grid,
        entry,
        source: SeedSource::Blank,
    })
}

#[cfg(test)]
mod tests {
    use hamlet_evaluator::reward::RewardEvaluator;

    use super::*;

    #[test]
    fn test_best_matching_candidate_wins() {
        let candidates: Vec<Grid> = [
            "E 0 0\n0 0 0\n0 0 0",
            "E R H\nG R H\n0 R 0",
            "0 E 0\nR R R\nH H H",
            "E R H\nG R H",
        ]
        .iter()
        .map(|text| text.parse().unwrap())
        .collect();
        let evaluator = RewardEvaluator::default();
        let seed = seed_grid(&candidates, 3, 3, Position::new(0, 0), &evaluator).unwrap();
        assert_eq!(seed.source, SeedSource::Candidate(1));
        assert_eq!(seed.entry, Position::new(0, 0));
        assert_eq!(seed.grid, candidates[1]);
    }

    #[derive(Debug)]
    struct HouseCount;

    impl GridScorer for HouseCount {
        #[expect(clippy::cast_precision_loss)]
        fn score(&self, grid: &Grid) -> f32 {
            grid.count(Tile::House) as f32
        }
    }

    #[test]
    fn test_invalid_candidates_are_skipped() {
        let candidates: Vec<Grid> = [
            // Most houses, but the corner houses are three cells from the road.
            "E H H H\nH H H H\nR H H H",
            "E R H 0\n0 R H 0\n0 R 0 0",
            // No road at all.
            "E H H 0\nH H 0 0\n0 0 0 0",
        ]
        .iter()
        .map(|text| text.parse().unwrap())
        .collect();
        assert!(HouseCount.score(&candidates[0]) > HouseCount.score(&candidates[1]));

        let seed = seed_grid(&candidates, 3, 4, Position::new(0, 0), &HouseCount).unwrap();
        assert_eq!(seed.source, SeedSource::Candidate(1));

        let seed = seed_grid(&candidates[2..], 3, 4, Position::new(0, 0), &HouseCount).unwrap();
        assert_eq!(seed.source, SeedSource::Blank);
    }

    #[test]
    fn test_falls_back_to_blank_with_nudged_entry() {
        let candidates: Vec<Grid> = vec!["E 0 0\n0 0 0\n0 0 0".parse().unwrap()];
        let evaluator = RewardEvaluator::default();
        let seed = seed_grid(&candidates, 5, 5, Position::new(1, 2), &evaluator).unwrap();
        assert_eq!(seed.source, SeedSource::Blank);
        assert_eq!(seed.entry, Position::new(0, 2));
        assert_eq!(seed.grid.find(Tile::Entry), Some(Position::new(0, 2)));
        assert_eq!(seed.grid.count(Tile::Empty), 24);
    }

    #[test]
    fn test_zero_sized_request_fails() {
        assert_eq!(
            seed_grid(&[], 0, 4, Position::new(0, 0), &RewardEvaluator::default()),
            Err(GridError::NoRows)
        );
    }
}
