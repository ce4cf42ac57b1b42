//! Vessel module
//!
//! Vessels owned by the fleet and the crew assignments that link users to them.

mod model;

pub use model::*;
