use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{grid::Grid, position::Position, tile::Tile};

/// Code used in windowed keys for cells outside the grid.
pub const OUT_OF_BOUNDS_CODE: char = 'X';

/// Canonical, hashable encoding of a grid or of a square window cut from one.
///
/// Rows are joined by `/` and every cell is one code character
/// (`0 E R G H 1 2 3 4`, plus `X` for window cells outside the grid), so
/// equal tile contents always give equal keys. The string form is also the
/// persisted form.
///
/// # Example
///
/// ```
/// use hamlet_grid::{Grid, StateKey};
///
/// let grid: Grid = "E 0 R\n0 0 0\n0 0 0".parse().unwrap();
/// let key = StateKey::from_grid(&grid);
/// assert_eq!(key.as_str(), "E0R/000/000");
/// assert_eq!(key.dimensions(), (3, 3));
/// assert_eq!(key.as_str().parse::<StateKey>().unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    encoded: String,
    rows: usize,
    cols: usize,
}

impl StateKey {
    /// Key covering the whole grid.
    #[must_use]
    pub fn from_grid(grid: &Grid) -> Self {
        let (rows, cols) = grid.dimensions();
        let mut encoded = String::with_capacity(rows * (cols + 1));
        for (i, row) in grid.row_slices().enumerate() {
            if i > 0 {
                encoded.push('/');
            }
            encoded.extend(row.iter().map(|tile| tile.code()));
        }
        Self {
            encoded,
            rows,
            cols,
        }
    }

    /// Key of the `side x side` window centred on `center`.
    ///
    /// An even `side` is rounded up to the next odd size so the window stays
    /// centred. Cells outside the grid are encoded as [`OUT_OF_BOUNDS_CODE`].
    #[expect(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn window(grid: &Grid, center: Position, side: usize) -> Self {
        let half = (side / 2) as isize;
        let side = side / 2 * 2 + 1;
        let mut encoded = String::with_capacity(side * (side + 1));
        for d_row in -half..=half {
            if d_row > -half {
                encoded.push('/');
            }
            for d_col in -half..=half {
                let tile = center
                    .offset(d_row, d_col)
                    .and_then(|pos| grid.checked_get(pos));
                encoded.push(tile.map_or(OUT_OF_BOUNDS_CODE, Tile::code));
            }
        }
        Self {
            encoded,
            rows: side,
            cols: side,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// `(rows, cols)` of the encoded region. Pruning groups states by this.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseStateKeyError {
    #[display("state key is empty")]
    Empty,
    #[display("state key row {row} has {found} cells, expected {expected}")]
    Jagged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("invalid cell code {code:?} in state key")]
    InvalidCode { code: char },
}

impl FromStr for StateKey {
    type Err = ParseStateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cols = None;
        let mut rows = 0;
        for (i, row) in s.split('/').enumerate() {
            if let Some(code) = row
                .chars()
                .find(|&c| c != OUT_OF_BOUNDS_CODE && Tile::from_code(c).is_none())
            {
                return Err(ParseStateKeyError::InvalidCode { code });
            }
            let found = row.chars().count();
            let expected = *cols.get_or_insert(found);
            if found == 0 {
                return Err(ParseStateKeyError::Empty);
            }
            if found != expected {
                return Err(ParseStateKeyError::Jagged {
                    row: i,
                    expected,
                    found,
                });
            }
            rows += 1;
        }
        Ok(Self {
            encoded: s.to_owned(),
            rows,
            cols: cols.unwrap_or(0),
        })
    }
}

impl Serialize for StateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(text: &str) -> Grid {
        text.parse().unwrap()
    }

    #[test]
    fn test_equal_contents_give_equal_keys() {
        let a = grid("E 0\nR H");
        let mut b = Grid::new(2, 2).unwrap();
        b.set(Position::new(0, 0), Tile::Entry);
        b.set(Position::new(1, 0), Tile::Road);
        b.set(Position::new(1, 1), Tile::House);
        assert_eq!(StateKey::from_grid(&a), StateKey::from_grid(&b));

        b.set(Position::new(0, 1), Tile::Green);
        assert_ne!(StateKey::from_grid(&a), StateKey::from_grid(&b));
    }

    #[test]
    fn test_shape_is_part_of_key() {
        let wide = StateKey::from_grid(&grid("0 0 0 0"));
        let square = StateKey::from_grid(&grid("0 0\n0 0"));
        assert_ne!(wide, square);
        assert_eq!(wide.dimensions(), (1, 4));
        assert_eq!(square.dimensions(), (2, 2));
    }

    #[test]
    fn test_window_marks_outside_cells() {
        let g = grid("E 0 R\n0 H 0\n0 0 G");
        let corner = StateKey::window(&g, Position::new(0, 0), 3);
        assert_eq!(corner.as_str(), "XXX/XE0/X0H");
        let centre = StateKey::window(&g, Position::new(1, 1), 3);
        assert_eq!(centre.as_str(), StateKey::from_grid(&g).as_str());
        assert_eq!(StateKey::window(&g, Position::new(2, 2), 2).dimensions(), (3, 3));
    }

    #[test]
    fn test_parse_round_trip_and_errors() {
        let key: StateKey = "XXX/XE0/X0H".parse().unwrap();
        assert_eq!(key.dimensions(), (3, 3));
        assert_eq!(key.to_string(), "XXX/XE0/X0H");
        assert_eq!("".parse::<StateKey>(), Err(ParseStateKeyError::Empty));
        assert_eq!(
            "E0/0".parse::<StateKey>(),
            Err(ParseStateKeyError::Jagged {
                row: 1,
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            "E0/Q0".parse::<StateKey>(),
            Err(ParseStateKeyError::InvalidCode { code: 'Q' })
        );
    }

    #[test]
    fn test_serde_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(StateKey::from_grid(&grid("E R")), 1.5_f32);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"ER":1.5}"#);
        let back: std::collections::BTreeMap<StateKey, f32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
