//! Issue module

mod model;

pub use model::*;
