//! Grid model for village layouts: tiles, positions, actions, state keys and
//! the flood-fill traversal shared by scoring and action selection.

pub use self::{core::*, layout::*, traversal::*};

pub mod core;
pub mod layout;
pub mod traversal;
