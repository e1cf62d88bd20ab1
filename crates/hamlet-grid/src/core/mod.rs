pub use self::{grid::*, position::*, state_key::*, tile::*};

pub(crate) mod grid;
pub(crate) mod position;
pub(crate) mod state_key;
pub(crate) mod tile;
