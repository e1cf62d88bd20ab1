//! Pass/fail acceptance rules for a finished layout.
//!
//! Looser than the reward in one way (a house may sit up to two cells from a
//! road along its row or column) and stricter in another (any violation fails
//! the layout outright).

use hamlet_grid::{Grid, Position, Tile};

/// Houses farther than this from a road, along a row or column, fail the check.
pub const MAX_HOUSE_ROAD_DISTANCE: isize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LayoutViolation {
    #[display("layout has no road")]
    NoRoads,
    #[display(
        "house at {} has no road within {} cells",
        _0.display_one_based(),
        MAX_HOUSE_ROAD_DISTANCE
    )]
    HouseFarFromRoad(Position),
}

/// All rule violations, houses in row-major order. Empty means the layout passes.
#[must_use]
pub fn check_layout(grid: &Grid) -> Vec<LayoutViolation> {
    let mut violations = vec![];
    if grid.count(Tile::Road) == 0 {
        violations.push(LayoutViolation::NoRoads);
    }
    for pos in grid.positions_of(Tile::House) {
        let near_road = (1..=MAX_HOUSE_ROAD_DISTANCE).any(|d| {
            [(-d, 0), (d, 0), (0, -d), (0, d)]
                .into_iter()
                .any(|(dr, dc)| grid.get_offset(pos, dr, dc) == Some(Tile::Road))
        });
        if !near_road {
            violations.push(LayoutViolation::HouseFarFromRoad(pos));
        }
    }
    violations
}

#[must_use]
pub fn is_valid_layout(grid: &Grid) -> bool {
    check_layout(grid).is_empty()
}
