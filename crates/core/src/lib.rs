//! Companions Core - Domain entities, services, and traits.
//!
//! This crate contains the business logic for the companions service.
//! It is storage-agnostic and defines traits that are implemented
//! by the `storage-postgrest` crate.

pub mod companions;
pub mod errors;
pub mod identity;
pub mod session_history;
pub mod submission;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
