//! Connectivity of same-kind tiles.
//!
//! A cluster is a maximal set of cells of one kind connected through
//! up/down/left/right neighbours. House subtypes belong to `House` clusters.

use hamlet_grid::{FloodFill, Grid, Position, Tile, Traversal};

/// All clusters of `kind`, each in visit order, ordered by their first cell in
/// row-major order.
#[must_use]
pub fn clusters(grid: &Grid, kind: Tile, traversal: Traversal) -> Vec<Vec<Position>> {
    let mut fill = FloodFill::new(grid, traversal);
    grid.positions_of(kind)
        .filter_map(|start| {
            let region = fill.fill(start, |tile| tile.same_kind(kind));
            (!region.is_empty()).then_some(region)
        })
        .collect()
}

/// Number of clusters of `kind`. Both traversals give the same count.
///
/// ```
/// use hamlet_evaluator::cluster_analysis::count_clusters;
/// use hamlet_grid::{Grid, Tile, Traversal};
///
/// let grid: Grid = "R 0 R\nR 0 R\n0 0 0".parse().unwrap();
/// assert_eq!(count_clusters(&grid, Tile::Road, Traversal::BreadthFirst), 2);
/// assert_eq!(count_clusters(&grid, Tile::Green, Traversal::DepthFirst), 0);
/// ```
#[must_use]
pub fn count_clusters(grid: &Grid, kind: Tile, traversal: Traversal) -> usize {
    let mut fill = FloodFill::new(grid, traversal);
    grid.positions_of(kind)
        .filter(|&start| !fill.fill(start, |tile| tile.same_kind(kind)).is_empty())
        .count()
}
