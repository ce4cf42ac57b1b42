//! Core library for the fleet issue tracker
//!
//! This crate contains the core business logic, including:
//! - Users, vessels, crew assignments and issues
//! - Storage behind the `FleetRepository` trait
//! - Vessel access control and per-crew quotas
//! - The inspection-due maintenance scan

pub mod access;
pub mod error;
pub mod issue;
pub mod maintenance;
pub mod quota;
pub mod seed;
pub mod store;
pub mod user;
pub mod vessel;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
