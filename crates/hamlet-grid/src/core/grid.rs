use std::{fmt, str::FromStr};

use arrayvec::ArrayVec;
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeSeq};

use super::{
    position::{Action, Position},
    tile::{ParseTileError, Tile},
};

/// Orthogonal neighbour offsets: up, down, left, right.
pub const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Orthogonal and diagonal neighbour offsets.
pub const SURROUNDING: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GridError {
    #[display("grid has no rows")]
    NoRows,
    #[display("grid has no columns")]
    NoColumns,
    #[display("row {row} has {found} cells, expected {expected}")]
    Jagged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("row {row}: {source}")]
    Tile { row: usize, source: ParseTileError },
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PlaceError {
    #[display("position {position} is outside the {rows}x{cols} grid")]
    OutOfBounds {
        position: Position,
        rows: usize,
        cols: usize,
    },
    #[display("position {position} is already occupied by {tile}")]
    Occupied { position: Position, tile: Tile },
}

/// Fixed-size rectangular grid of [`Tile`]s stored in row-major order.
///
/// Dimensions never change after construction and are always at least `1x1`.
/// Direct indexing with [`Grid::get`] / [`Grid::set`] panics out of range;
/// neighbourhood scans go through [`Grid::checked_get`] / [`Grid::get_offset`],
/// which treat outside cells as absent.
///
/// # Example
///
/// ```
/// use hamlet_grid::{Grid, Position, Tile};
///
/// let mut grid: Grid = "E 0 R\n0 0 0".parse().unwrap();
/// assert_eq!(grid.dimensions(), (2, 3));
/// grid.set(Position::new(1, 2), Tile::House);
/// assert_eq!(grid.to_string(), "E 0 R\n0 0 H");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Tile>,
}

impl Grid {
    /// Creates an all-empty grid.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        if rows == 0 {
            return Err(GridError::NoRows);
        }
        if cols == 0 {
            return Err(GridError::NoColumns);
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![Tile::Empty; rows * cols],
        })
    }

    /// Creates a grid whose cells are produced by `f`, in row-major order.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Result<Self, GridError>
    where
        F: FnMut(Position) -> Tile,
    {
        let mut grid = Self::new(rows, cols)?;
        for (pos, cell) in grid.positions().zip(&mut grid.cells) {
            *cell = f(pos);
        }
        Ok(grid)
    }

    /// Builds a grid from nested rows, which must be non-empty and rectangular.
    pub fn from_rows<R>(rows: &[R]) -> Result<Self, GridError>
    where
        R: AsRef<[Tile]>,
    {
        let first = rows.first().ok_or(GridError::NoRows)?;
        let cols = first.as_ref().len();
        if cols == 0 {
            return Err(GridError::NoColumns);
        }
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(GridError::Jagged {
                    row: i,
                    expected: cols,
                    found: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of cells.
    #[must_use]
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index(&self, pos: Position) -> usize {
        assert!(
            self.contains(pos),
            "position {pos} out of range for {}x{} grid",
            self.rows,
            self.cols
        );
        pos.row * self.cols + pos.col
    }

    #[must_use]
    pub fn get(&self, pos: Position) -> Tile {
        self.cells[self.index(pos)]
    }

    pub fn set(&mut self, pos: Position, tile: Tile) {
        let idx = self.index(pos);
        self.cells[idx] = tile;
    }

    #[must_use]
    pub fn checked_get(&self, pos: Position) -> Option<Tile> {
        self.contains(pos).then(|| self.get(pos))
    }

    /// Tile at `pos` shifted by `(d_row, d_col)`, or `None` outside the grid.
    #[must_use]
    pub fn get_offset(&self, pos: Position, d_row: isize, d_col: isize) -> Option<Tile> {
        self.checked_get(pos.offset(d_row, d_col)?)
    }

    /// Applies a placement, returning the tile it replaced.
    pub fn place(&mut self, action: Action) -> Result<Tile, PlaceError> {
        let Action { position, tile } = action;
        let previous = self.checked_get(position).ok_or(PlaceError::OutOfBounds {
            position,
            rows: self.rows,
            cols: self.cols,
        })?;
        if !previous.is_empty() {
            return Err(PlaceError::Occupied {
                position,
                tile: previous,
            });
        }
        self.set(position, tile);
        Ok(previous)
    }

    #[must_use]
    pub fn row(&self, row: usize) -> &[Tile] {
        &self.cells[row * self.cols..][..self.cols]
    }

    pub fn row_slices(&self) -> impl ExactSizeIterator<Item = &[Tile]> + '_ {
        self.cells.chunks_exact(self.cols)
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let cols = self.cols;
        (0..self.cells.len()).map(move |i| Position::new(i / cols, i % cols))
    }

    /// `(position, tile)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        self.positions().zip(self.cells.iter().copied())
    }

    /// Positions whose tile matches `kind`, house subtypes matching [`Tile::House`].
    pub fn positions_of(&self, kind: Tile) -> impl Iterator<Item = Position> + '_ {
        self.iter()
            .filter(move |(_, tile)| tile.same_kind(kind))
            .map(|(pos, _)| pos)
    }

    /// Number of cells whose tile matches `kind`, house subtypes matching [`Tile::House`].
    #[must_use]
    pub fn count(&self, kind: Tile) -> usize {
        self.cells.iter().filter(|tile| tile.same_kind(kind)).count()
    }

    /// First position holding `tile` in row-major order.
    #[must_use]
    pub fn find(&self, tile: Tile) -> Option<Position> {
        self.iter().find(|(_, t)| *t == tile).map(|(pos, _)| pos)
    }

    pub fn empty_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions_of(Tile::Empty)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        !self.cells.contains(&Tile::Empty)
    }

    #[must_use]
    pub fn is_edge(&self, pos: Position) -> bool {
        self.contains(pos)
            && (pos.row == 0
                || pos.col == 0
                || pos.row == self.rows - 1
                || pos.col == self.cols - 1)
    }

    /// Border positions in row-major order.
    pub fn edge_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(|&pos| self.is_edge(pos))
    }

    /// In-bounds orthogonal neighbours of `pos`.
    #[must_use]
    pub fn neighbors4(&self, pos: Position) -> ArrayVec<Position, 4> {
        self.neighbors(pos, &ORTHOGONAL)
    }

    /// In-bounds orthogonal and diagonal neighbours of `pos`.
    #[must_use]
    pub fn neighbors8(&self, pos: Position) -> ArrayVec<Position, 8> {
        self.neighbors(pos, &SURROUNDING)
    }

    fn neighbors<const N: usize>(
        &self,
        pos: Position,
        offsets: &[(isize, isize); N],
    ) -> ArrayVec<Position, N> {
        offsets
            .iter()
            .filter_map(|&(dr, dc)| pos.offset(dr, dc))
            .filter(|&p| self.contains(p))
            .collect()
    }

    /// Whether any orthogonal neighbour of `pos` matches `kind`.
    #[must_use]
    pub fn touches(&self, pos: Position, kind: Tile) -> bool {
        self.neighbors4(pos)
            .iter()
            .any(|&p| self.get(p).same_kind(kind))
    }

    /// Whether any orthogonal or diagonal neighbour of `pos` matches `kind`.
    #[must_use]
    pub fn surrounds(&self, pos: Position, kind: Tile) -> bool {
        self.neighbors8(pos)
            .iter()
            .any(|&p| self.get(p).same_kind(kind))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.row_slices().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for (j, tile) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{tile}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Grid {
    type Err = GridError;

    /// Parses one row per non-blank line, cells separated by whitespace or commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(row, line)| {
                line.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .map(str::parse)
                    .collect::<Result<Vec<Tile>, _>>()
                    .map_err(|source| GridError::Tile { row, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(&rows)
    }
}

/// Serialized as a list of rows in text form, e.g. `["E 0 R", "0 0 0"]`.
impl Serialize for Grid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows))?;
        for row in self.row_slices() {
            let text = row.iter().map(Tile::to_string).collect::<Vec<_>>().join(" ");
            seq.serialize_element(&text)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<String>::deserialize(deserializer)?;
        rows.join("\n").parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(Grid::new(0, 3), Err(GridError::NoRows));
        assert_eq!(Grid::new(3, 0), Err(GridError::NoColumns));
        let empty: [Vec<Tile>; 0] = [];
        assert_eq!(Grid::from_rows(&empty), Err(GridError::NoRows));
        assert_eq!(
            Grid::from_rows(&[vec![Tile::Empty; 3], vec![Tile::Empty; 2]]),
            Err(GridError::Jagged {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert!(matches!(
            "0 0\n0 Q".parse::<Grid>(),
            Err(GridError::Tile { row: 1, .. })
        ));
    }

    #[test]
    fn test_text_round_trip() {
        let text = "E 0 R\nG H H2\n0 0 0";
        let g = grid(text);
        assert_eq!(g.dimensions(), (3, 3));
        assert_eq!(g.to_string(), text);
        assert_eq!(grid("E,0,R\nG,H,H2\n0,0,0"), g);
    }

    #[test]
    fn test_serde_as_row_strings() {
        let g = grid("E 0 R\nG H1 0");
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, r#"["E 0 R","G H1 0"]"#);
        assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), g);
        assert!(serde_json::from_str::<Grid>("[]").is_err());
    }

    #[test]
    fn test_checked_access_out_of_range() {
        let g = grid("E 0\n0 R");
        assert_eq!(g.checked_get(Position::new(1, 1)), Some(Tile::Road));
        assert_eq!(g.checked_get(Position::new(2, 0)), None);
        assert_eq!(g.get_offset(Position::new(0, 0), -1, 0), None);
        assert_eq!(g.get_offset(Position::new(0, 0), 1, 1), Some(Tile::Road));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_out_of_range_panics() {
        let _ = grid("0 0").get(Position::new(1, 0));
    }

    #[test]
    fn test_place_rejects_occupied_and_outside() {
        let mut g = grid("E 0\n0 0");
        assert_eq!(g.place(Action::at(0, 1, Tile::Road)), Ok(Tile::Empty));
        assert_eq!(
            g.place(Action::at(0, 0, Tile::House)),
            Err(PlaceError::Occupied {
                position: Position::new(0, 0),
                tile: Tile::Entry
            })
        );
        assert!(matches!(
            g.place(Action::at(5, 0, Tile::House)),
            Err(PlaceError::OutOfBounds { .. })
        ));
        assert_eq!(g.get(Position::new(0, 1)), Tile::Road);
    }

    #[test]
    fn test_counts_and_empties() {
        let g = grid("E H R\nH1 0 G\n0 0 H");
        assert_eq!(g.count(Tile::House), 3);
        assert_eq!(g.count(Tile::Empty), 3);
        assert_eq!(
            g.empty_positions().collect::<Vec<_>>(),
            [Position::new(1, 1), Position::new(2, 0), Position::new(2, 1)]
        );
        assert!(!g.is_full());
        assert!(grid("E R").is_full());
        assert_eq!(g.find(Tile::Entry), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_edges_and_neighbours() {
        let g = Grid::new(3, 3).unwrap();
        assert_eq!(g.edge_positions().count(), 8);
        assert!(!g.is_edge(Position::new(1, 1)));
        assert_eq!(g.neighbors4(Position::new(0, 0)).len(), 2);
        assert_eq!(g.neighbors4(Position::new(1, 1)).len(), 4);
        assert_eq!(g.neighbors8(Position::new(0, 1)).len(), 5);
        assert_eq!(g.neighbors8(Position::new(1, 1)).len(), 8);
    }

    #[test]
    fn test_touches_and_surrounds() {
        let g = grid("H 0\n0 R");
        let house = Position::new(0, 0);
        assert!(!g.touches(house, Tile::Road));
        assert!(g.surrounds(house, Tile::Road));
    }
}
