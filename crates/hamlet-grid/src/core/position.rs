use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::tile::{ParseTileError, Tile};

/// Zero-based `(row, col)` coordinate of a grid cell.
///
/// External surfaces (CLI arguments, printed action logs) count from 1; use
/// [`Position::from_one_based`] and [`Position::one_based`] at those boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Converts a 1-based coordinate. Returns `None` if either part is zero.
    #[must_use]
    pub fn from_one_based(row: usize, col: usize) -> Option<Self> {
        Some(Self {
            row: row.checked_sub(1)?,
            col: col.checked_sub(1)?,
        })
    }

    #[must_use]
    pub const fn one_based(self) -> (usize, usize) {
        (self.row + 1, self.col + 1)
    }

    /// Shifts the position, returning `None` if it would leave the
    /// non-negative quadrant. Upper bounds are the grid's business.
    #[must_use]
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }

    /// Displays the position counting from 1.
    #[must_use]
    pub const fn display_one_based(self) -> OneBased {
        OneBased(self)
    }
}

/// [`Display`](fmt::Display) adapter printing a [`Position`] counting from 1.
#[derive(Debug, Clone, Copy)]
pub struct OneBased(Position);

impl fmt::Display for OneBased {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (row, col) = self.0.one_based();
        write!(f, "({row}, {col})")
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Placement of one tile on one cell. Legal only on an [`Tile::Empty`] cell.
///
/// The text form is `"row,col,tile"` with a zero-based position, e.g. `"0,2,R"`.
/// It is also the serialized form, so actions can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action {
    pub position: Position,
    pub tile: Tile,
}

impl Action {
    #[must_use]
    pub const fn new(position: Position, tile: Tile) -> Self {
        Self { position, tile }
    }

    #[must_use]
    pub const fn at(row: usize, col: usize, tile: Tile) -> Self {
        Self::new(Position::new(row, col), tile)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.position.row, self.position.col, self.tile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseActionError {
    #[display("expected format 'row,col,tile', got {_0:?}")]
    Format(#[error(not(source))] String),
    #[display("invalid coordinate {_0:?}")]
    Coordinate(#[error(not(source))] String),
    #[display("{_0}")]
    Tile(ParseTileError),
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ',');
        let (Some(row), Some(col), Some(tile)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseActionError::Format(s.to_owned()));
        };
        let coordinate = |text: &str| {
            text.trim()
                .parse::<usize>()
                .map_err(|_| ParseActionError::Coordinate(text.to_owned()))
        };
        let position = Position::new(coordinate(row)?, coordinate(col)?);
        let tile = tile.parse().map_err(ParseActionError::Tile)?;
        Ok(Self { position, tile })
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Action {
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

    #[test]
    fn test_one_based_conversion() {
        let pos = Position::from_one_based(1, 3).unwrap();
        assert_eq!(pos, Position::new(0, 2));
        assert_eq!(pos.one_based(), (1, 3));
        assert_eq!(pos.display_one_based().to_string(), "(1, 3)");
        assert_eq!(Position::from_one_based(0, 1), None);
    }

    #[test]
    fn test_offset_stays_non_negative() {
        let origin = Position::new(0, 0);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(1, 1), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_action_text_form() {
        let action = Action::at(2, 0, Tile::Road);
        assert_eq!(action.to_string(), "2,0,R");
        assert_eq!("2,0,R".parse::<Action>().unwrap(), action);
        assert_eq!(
            "1,1,H4".parse::<Action>().unwrap().tile,
            Tile::HouseType(crate::HouseKind::H4)
        );
    }

    #[test]
    fn test_action_parse_errors() {
        assert!(matches!(
            "1,2".parse::<Action>(),
            Err(ParseActionError::Format(_))
        ));
        assert!(matches!(
            "a,2,R".parse::<Action>(),
            Err(ParseActionError::Coordinate(_))
        ));
        assert!(matches!(
            "1,2,Q".parse::<Action>(),
            Err(ParseActionError::Tile(_))
        ));
    }
}
