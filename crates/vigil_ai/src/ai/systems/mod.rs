//! Behavior systems (FixedUpdate)

pub mod controllers;
pub mod roster;

pub use controllers::*;
pub use roster::*;
