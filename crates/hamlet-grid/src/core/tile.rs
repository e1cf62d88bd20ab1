use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Price class assigned to a house once a layout is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HouseKind {
    H1,
    H2,
    H3,
    H4,
}

impl HouseKind {
    pub const LEN: usize = 4;
    pub const ALL: [HouseKind; Self::LEN] = [Self::H1, Self::H2, Self::H3, Self::H4];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::H1 => '1',
            Self::H2 => '2',
            Self::H3 => '3',
            Self::H4 => '4',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::H1),
            '2' => Some(Self::H2),
            '3' => Some(Self::H3),
            '4' => Some(Self::H4),
            _ => None,
        }
    }
}

impl fmt::Display for HouseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.as_char())
    }
}

/// Land use of a single grid cell.
///
/// A cell holds exactly one tile. [`Tile::HouseType`] only appears after
/// post-processing and behaves like a generic [`Tile::House`] everywhere a
/// layout is scored or matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, derive_more::IsVariant)]
pub enum Tile {
    /// Unassigned cell.
    #[default]
    Empty,
    /// Main access point of the village.
    Entry,
    Road,
    Green,
    /// Generic house placed during training.
    House,
    /// House with an assigned price class.
    HouseType(HouseKind),
}

impl Tile {
    /// Tiles an agent may place on an empty cell, in the order they are tried.
    pub const PLACEABLE: [Tile; 3] = [Tile::House, Tile::Road, Tile::Green];

    /// Collapses house subtypes onto [`Tile::House`].
    #[must_use]
    pub const fn kind(self) -> Tile {
        match self {
            Tile::HouseType(_) => Tile::House,
            tile => tile,
        }
    }

    #[must_use]
    pub fn same_kind(self, other: Tile) -> bool {
        self.kind() == other.kind()
    }

    #[must_use]
    pub const fn is_any_house(self) -> bool {
        matches!(self, Tile::House | Tile::HouseType(_))
    }

    /// Single-character code used in state keys.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Tile::Empty => '0',
            Tile::Entry => 'E',
            Tile::Road => 'R',
            Tile::Green => 'G',
            Tile::House => 'H',
            Tile::HouseType(kind) => kind.as_char(),
        }
    }

    #[must_use]
    pub const fn from_code(code: char) -> Option<Tile> {
        match code {
            '0' => Some(Tile::Empty),
            'E' => Some(Tile::Entry),
            'R' => Some(Tile::Road),
            'G' => Some(Tile::Green),
            'H' => Some(Tile::House),
            c => match HouseKind::from_char(c) {
                Some(kind) => Some(Tile::HouseType(kind)),
                None => None,
            },
        }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tile::HouseType(kind) => fmt::Display::fmt(kind, f),
            tile => write!(f, "{}", tile.code()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid tile {text:?}, expected one of 0 E R G H H1 H2 H3 H4")]
pub struct ParseTileError {
    pub text: String,
}

impl FromStr for Tile {
    type Err = ParseTileError;

    /// Parses the text form (`0`, `E`, `R`, `G`, `H`, `H1`..`H4`).
    /// An empty cell, as found in sparse CSV files, reads as [`Tile::Empty`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || ParseTileError {
            text: text.to_owned(),
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (None, _, _) => Ok(Tile::Empty),
            (Some(c), None, _) => Tile::from_code(c)
                .filter(|tile| !matches!(tile, Tile::HouseType(_)))
                .ok_or_else(err),
            (Some('H'), Some(c), None) => HouseKind::from_char(c)
                .map(Tile::HouseType)
                .ok_or_else(err),
            _ => Err(err()),
        }
    }
}

impl Serialize for Tile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tile {
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
    fn test_text_form_round_trip() {
        let tiles = [
            Tile::Empty,
            Tile::Entry,
            Tile::Road,
            Tile::Green,
            Tile::House,
            Tile::HouseType(HouseKind::H3),
        ];
        for tile in tiles {
            assert_eq!(tile.to_string().parse::<Tile>().unwrap(), tile);
        }
        assert_eq!(Tile::HouseType(HouseKind::H2).to_string(), "H2");
    }

    #[test]
    fn test_parse_tolerates_blank_and_whitespace() {
        assert_eq!("".parse::<Tile>().unwrap(), Tile::Empty);
        assert_eq!(" R ".parse::<Tile>().unwrap(), Tile::Road);
    }

    #[test]
    fn test_parse_rejects_unknown_text() {
        assert!("X".parse::<Tile>().is_err());
        assert!("H5".parse::<Tile>().is_err());
        // Subtype codes are only valid with the `H` prefix in text form.
        assert!("2".parse::<Tile>().is_err());
        assert!("RR".parse::<Tile>().is_err());
    }

    #[test]
    fn test_subtypes_share_house_kind() {
        let h4 = Tile::HouseType(HouseKind::H4);
        assert!(h4.is_any_house());
        assert!(h4.same_kind(Tile::House));
        assert!(!h4.same_kind(Tile::Road));
        assert_eq!(Tile::from_code('4'), Some(h4));
        assert_eq!(h4.code(), '4');
    }

    #[test]
    fn test_serde_uses_text_form() {
        let json = serde_json::to_string(&[Tile::Road, Tile::HouseType(HouseKind::H1)]).unwrap();
        assert_eq!(json, r#"["R","H1"]"#);
        let back: Vec<Tile> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, [Tile::Road, Tile::HouseType(HouseKind::H1)]);
    }
}
