//! User module
//!
//! Accounts, roles and password reset tokens.

mod model;

pub use model::*;
