//! Layout metrics consumed by the reward function.
//!
//! [`GridAnalysis`] walks a grid once and records every count the reward
//! needs: tile totals, bonus patterns, stacking patterns, road access of
//! houses and entries, and road connectivity. Keeping the counting separate
//! from the weighting lets [`RewardConfig`](crate::reward::RewardConfig)
//! change constants without touching pattern logic.
//!
//! All pattern matching compares tile *kinds*, so typed houses (`H1`..`H4`)
//! count exactly like generic houses.

use hamlet_grid::{Grid, Position, Tile, Traversal};

use crate::cluster_analysis::count_clusters;

/// Number of cells of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileCounts {
    pub empty: usize,
    pub entry: usize,
    pub road: usize,
    pub green: usize,
    pub house: usize,
}

impl TileCounts {
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let mut counts = Self::default();
        for (_, tile) in grid.iter() {
            let slot = match tile.kind() {
                Tile::Empty => &mut counts.empty,
                Tile::Entry => &mut counts.entry,
                Tile::Road => &mut counts.road,
                Tile::Green => &mut counts.green,
                Tile::House | Tile::HouseType(_) => &mut counts.house,
            };
            *slot += 1;
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.empty + self.entry + self.road + self.green + self.house
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridAnalysis {
    pub tile_counts: TileCounts,
    /// Horizontal runs of three houses, overlapping windows counted separately.
    pub house_triples: usize,
    /// Horizontal runs of three roads, overlapping windows counted separately.
    pub road_triples: usize,
    /// Vertical house, road, house stacks.
    pub house_road_house_columns: usize,
    /// 2x2 windows with two houses above two roads.
    pub houses_over_roads: usize,
    /// 2x2 windows with two roads above two houses.
    pub roads_over_houses: usize,
    /// 2x2 windows whose rows repeat the same mixed pair (`RH` over `RH` or
    /// `HR` over `HR`).
    pub repeated_mixed_pairs: usize,
    /// Houses on the outer border.
    pub edge_houses: usize,
    /// Houses with no road directly above, below, left or right.
    pub houses_without_adjacent_road: usize,
    /// Houses with no road among their eight surrounding cells.
    pub houses_without_nearby_road: usize,
    /// Entries with no road directly above, below, left or right.
    pub entries_without_road: usize,
    pub road_clusters: usize,
}

impl GridAnalysis {
    #[must_use]
    pub fn from_grid(grid: &Grid, traversal: Traversal) -> Self {
        let (rows, cols) = grid.dimensions();
        let kind = |row: usize, col: usize| grid.get(Position::new(row, col)).kind();
        let is = |row, col, tile: Tile| kind(row, col) == tile;

        let mut house_triples = 0;
        let mut road_triples = 0;
        for row in 0..rows {
            for col in 0..cols.saturating_sub(2) {
                let run = [kind(row, col), kind(row, col + 1), kind(row, col + 2)];
                if run == [Tile::House; 3] {
                    house_triples += 1;
                } else if run == [Tile::Road; 3] {
                    road_triples += 1;
                }
            }
        }

        let mut house_road_house_columns = 0;
        for row in 0..rows.saturating_sub(2) {
            for col in 0..cols {
                if is(row, col, Tile::House)
                    && is(row + 1, col, Tile::Road)
                    && is(row + 2, col, Tile::House)
                {
                    house_road_house_columns += 1;
                }
            }
        }

        let mut houses_over_roads = 0;
        let mut roads_over_houses = 0;
        let mut repeated_mixed_pairs = 0;
        for row in 0..rows.saturating_sub(1) {
            for col in 0..cols.saturating_sub(1) {
                let top = [kind(row, col), kind(row, col + 1)];
                let bottom = [kind(row + 1, col), kind(row + 1, col + 1)];
                match (top, bottom) {
                    ([Tile::House, Tile::House], [Tile::Road, Tile::Road]) => {
                        houses_over_roads += 1;
                    }
                    ([Tile::Road, Tile::Road], [Tile::House, Tile::House]) => {
                        roads_over_houses += 1;
                    }
                    ([Tile::Road, Tile::House] | [Tile::House, Tile::Road], _) if top == bottom => {
                        repeated_mixed_pairs += 1;
                    }
                    _ => {}
                }
            }
        }

        let mut edge_houses = 0;
        let mut houses_without_adjacent_road = 0;
        let mut houses_without_nearby_road = 0;
        let mut entries_without_road = 0;
        for (pos, tile) in grid.iter() {
            if tile.is_any_house() {
                if grid.is_edge(pos) {
                    edge_houses += 1;
                }
                if !grid.touches(pos, Tile::Road) {
                    houses_without_adjacent_road += 1;
                }
                if !grid.surrounds(pos, Tile::Road) {
                    houses_without_nearby_road += 1;
                }
            } else if tile == Tile::Entry && !grid.touches(pos, Tile::Road) {
                entries_without_road += 1;
            }
        }

        Self {
            tile_counts: TileCounts::from_grid(grid),
            house_triples,
            road_triples,
            house_road_house_columns,
            houses_over_roads,
            roads_over_houses,
            repeated_mixed_pairs,
            edge_houses,
            houses_without_adjacent_road,
            houses_without_nearby_road,
            entries_without_road,
            road_clusters: count_clusters(grid, Tile::Road, traversal),
        }
    }

    /// Share of cells holding green space.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn green_ratio(&self) -> f32 {
        self.tile_counts.green as f32 / self.tile_counts.total() as f32
    }

    /// At least one house exists and every house has an orthogonal road.
    #[must_use]
    pub fn all_houses_served(&self) -> bool {
        self.tile_counts.house > 0 && self.houses_without_adjacent_road == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> GridAnalysis {
        GridAnalysis::from_grid(&text.parse().unwrap(), Traversal::BreadthFirst)
    }

    #[test]
    fn test_horizontal_triples_slide() {
        let a = analyze("H H H H\nR R R 0");
        assert_eq!(a.house_triples, 2);
        assert_eq!(a.road_triples, 1);
        // Subtypes count as houses.
        assert_eq!(analyze("H1 H H3").house_triples, 1);
    }

    #[test]
    fn test_vertical_house_road_house() {
        let a = analyze("H 0\nR 0\nH 0\nR 0\nH 0");
        assert_eq!(a.house_road_house_columns, 2);
    }

    #[test]
    fn test_two_by_two_blocks() {
        let a = analyze("H H\nR R\nH H");
        assert_eq!(a.houses_over_roads, 1);
        assert_eq!(a.roads_over_houses, 1);
        assert_eq!(a.repeated_mixed_pairs, 0);

        let b = analyze("R H\nR H\nH R\nH R");
        assert_eq!(b.repeated_mixed_pairs, 2);
        assert_eq!(b.houses_over_roads, 0);
    }

    #[test]
    fn test_road_access() {
        let a = analyze("E 0 H\n0 R 0\nH R H");
        assert_eq!(a.entries_without_road, 1);
        // (0,2) only touches the road diagonally.
        assert_eq!(a.houses_without_adjacent_road, 1);
        assert_eq!(a.houses_without_nearby_road, 0);
        assert_eq!(a.edge_houses, 3);
        assert!(!a.all_houses_served());
        assert!(analyze("H R").all_houses_served());
        assert!(!analyze("E R").all_houses_served());
    }

    #[test]
    fn test_counts_and_green_ratio() {
        let a = analyze("G G 0 0\n0 0 R R");
        assert_eq!(a.tile_counts.green, 2);
        assert_eq!(a.tile_counts.total(), 8);
        assert!((a.green_ratio() - 0.25).abs() < f32::EPSILON);
        assert_eq!(a.road_clusters, 1);
    }
}
