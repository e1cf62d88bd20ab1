use std::fmt;

use crate::core::{Grid, Position};

/// Clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    #[must_use]
    pub const fn quarter_turns(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flip {
    None,
    /// Mirror left-right.
    Horizontal,
    /// Mirror top-bottom.
    Vertical,
}

impl Flip {
    pub const ALL: [Flip; 3] = [Self::None, Self::Horizontal, Self::Vertical];
}

/// A rotation followed by an optional flip.
///
/// Displays as e.g. `90deg` or `180deg_H`, which is also the suffix used
/// for augmented seed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symmetry {
    pub rotation: Rotation,
    pub flip: Flip,
}

impl Symmetry {
    /// All twelve combinations, rotation-major.
    #[must_use]
    pub fn all() -> impl Iterator<Item = Symmetry> {
        Rotation::ALL.into_iter().flat_map(|rotation| {
            Flip::ALL
                .into_iter()
                .map(move |flip| Symmetry { rotation, flip })
        })
    }

    #[must_use]
    pub fn apply(self, grid: &Grid) -> Grid {
        let mut out = grid.clone();
        for _ in 0..self.rotation.quarter_turns() {
            out = rotate_clockwise(&out);
        }
        match self.flip {
            Flip::None => out,
            Flip::Horizontal => flip_horizontal(&out),
            Flip::Vertical => flip_vertical(&out),
        }
    }
}

impl fmt::Display for Symmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}deg", self.rotation.quarter_turns() * 90)?;
        match self.flip {
            Flip::None => Ok(()),
            Flip::Horizontal => write!(f, "_H"),
            Flip::Vertical => write!(f, "_V"),
        }
    }
}

fn remap<F>(grid: &Grid, rows: usize, cols: usize, source: F) -> Grid
where
    F: Fn(Position) -> Position,
{
    Grid::from_fn(rows, cols, |pos| grid.get(source(pos)))
        .expect("dimensions of a transformed grid are never zero")
}

/// Quarter turn clockwise; a `r x c` grid becomes `c x r`.
#[must_use]
pub fn rotate_clockwise(grid: &Grid) -> Grid {
    let (rows, cols) = grid.dimensions();
    remap(grid, cols, rows, |p| Position::new(rows - 1 - p.col, p.row))
}

#[must_use]
pub fn flip_horizontal(grid: &Grid) -> Grid {
    let (rows, cols) = grid.dimensions();
    remap(grid, rows, cols, |p| Position::new(p.row, cols - 1 - p.col))
}

#[must_use]
pub fn flip_vertical(grid: &Grid) -> Grid {
    let (rows, cols) = grid.dimensions();
    remap(grid, rows, cols, |p| Position::new(rows - 1 - p.row, p.col))
}

/// Distinct grids among all rotations and their flips, first occurrence kept.
///
/// The identity comes first, so the result is never empty.
#[must_use]
pub fn distinct_variants(grid: &Grid) -> Vec<(Symmetry, Grid)> {
    let mut variants: Vec<(Symmetry, Grid)> = vec![];
    for symmetry in Symmetry::all() {
        let candidate = symmetry.apply(grid);
        if variants.iter().all(|(_, g)| *g != candidate) {
            variants.push((symmetry, candidate));
        }
    }
    variants
}
