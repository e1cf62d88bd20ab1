use std::collections::VecDeque;

use crate::core::{Grid, Position, Tile};

/// Frontier discipline of a flood fill. Both visit the same region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// FIFO frontier; cells come out in order of distance from the start.
    #[default]
    BreadthFirst,
    /// LIFO frontier.
    DepthFirst,
}

/// Repeated 4-connected flood fills over one grid sharing a visited mask.
///
/// Cells are marked when pushed onto the frontier, so every cell is yielded
/// at most once across all fills.
///
/// # Example
///
/// ```
/// use hamlet_grid::{FloodFill, Grid, Position, Tile, Traversal};
///
/// let grid: Grid = "R R 0\n0 0 R".parse().unwrap();
/// let mut fill = FloodFill::new(&grid, Traversal::BreadthFirst);
/// let region = fill.fill(Position::new(0, 0), |tile| tile == Tile::Road);
/// assert_eq!(region.len(), 2);
/// assert!(fill.is_visited(Position::new(0, 1)));
/// assert!(!fill.is_visited(Position::new(1, 2)));
/// ```
#[derive(Debug)]
pub struct FloodFill<'a> {
    grid: &'a Grid,
    traversal: Traversal,
    visited: Vec<bool>,
    frontier: VecDeque<Position>,
}

impl<'a> FloodFill<'a> {
    #[must_use]
    pub fn new(grid: &'a Grid, traversal: Traversal) -> Self {
        Self {
            grid,
            traversal,
            visited: vec![false; grid.area()],
            frontier: VecDeque::new(),
        }
    }

    fn slot(&self, pos: Position) -> usize {
        pos.row * self.grid.cols() + pos.col
    }

    #[must_use]
    pub fn is_visited(&self, pos: Position) -> bool {
        self.grid.contains(pos) && self.visited[self.slot(pos)]
    }

    /// Fills the region reachable from `start` through cells accepted by
    /// `include`, returning it in visit order.
    ///
    /// Returns an empty region if `start` is outside the grid, already
    /// visited, or rejected by `include`.
    pub fn fill<F>(&mut self, start: Position, mut include: F) -> Vec<Position>
    where
        F: FnMut(Tile) -> bool,
    {
        let mut region = vec![];
        if self.is_visited(start) || !self.grid.checked_get(start).is_some_and(&mut include) {
            return region;
        }
        let slot = self.slot(start);
        self.visited[slot] = true;
        self.frontier.push_back(start);

        while let Some(pos) = self.pop() {
            region.push(pos);
            for next in self.grid.neighbors4(pos) {
                let slot = self.slot(next);
                if !self.visited[slot] && include(self.grid.get(next)) {
                    self.visited[slot] = true;
                    self.frontier.push_back(next);
                }
            }
        }
        region
    }

    fn pop(&mut self) -> Option<Position> {
        match self.traversal {
            Traversal::BreadthFirst => self.frontier.pop_front(),
            Traversal::DepthFirst => self.frontier.pop_back(),
        }
    }
}

/// Every cell of the grid in breadth-first order from `start`.
///
/// Falls back to row-major order when `start` lies outside the grid.
#[must_use]
pub fn flood_order(grid: &Grid, start: Position) -> Vec<Position> {
    if !grid.contains(start) {
        return grid.positions().collect();
    }
    FloodFill::new(grid, Traversal::BreadthFirst).fill(start, |_| true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadth_first_orders_by_distance() {
        let grid = Grid::new(3, 3).unwrap();
        let order = flood_order(&grid, Position::new(0, 0));
        assert_eq!(order.len(), 9);
        assert_eq!(order[0], Position::new(0, 0));
        let distances = order.iter().map(|p| p.row + p.col).collect::<Vec<_>>();
        assert!(distances.is_sorted());
        assert_eq!(order[8], Position::new(2, 2));
    }

    #[test]
    fn test_outside_start_falls_back_to_row_major() {
        let grid = Grid::new(2, 2).unwrap();
        assert_eq!(
            flood_order(&grid, Position::new(5, 5)),
            grid.positions().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_both_traversals_cover_same_region() {
        let grid: Grid = "R R 0 R\n0 R 0 R\nR R R R\n0 0 0 0".parse().unwrap();
        let mut regions = vec![];
        for traversal in [Traversal::BreadthFirst, Traversal::DepthFirst] {
            let mut fill = FloodFill::new(&grid, traversal);
            let mut region = fill.fill(Position::new(0, 0), |t| t == Tile::Road);
            region.sort();
            regions.push(region);
        }
        assert_eq!(regions[0], regions[1]);
        assert_eq!(regions[0].len(), 9);
    }

    #[test]
    fn test_visited_cells_are_not_refilled() {
        let grid: Grid = "R R".parse().unwrap();
        let mut fill = FloodFill::new(&grid, Traversal::DepthFirst);
        assert_eq!(fill.fill(Position::new(0, 0), |t| t == Tile::Road).len(), 2);
        assert!(fill.fill(Position::new(0, 1), |t| t == Tile::Road).is_empty());
    }
}
