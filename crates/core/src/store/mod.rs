//! Storage module
//!
//! The repository trait consumed by the server, and its file-backed implementation.

mod file_store;
mod repository;

pub use file_store::FileFleetStore;
pub use repository::FleetRepository;
