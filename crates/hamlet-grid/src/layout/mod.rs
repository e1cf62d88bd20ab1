//! Whole-grid transforms that sit around training: seeding a blank layout,
//! enumerating symmetric variants of a layout, and assigning house types to a
//! finished one.

pub use self::{housing::*, seed::*, symmetry::*};

mod housing;
mod seed;
mod symmetry;
