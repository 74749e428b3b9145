//! PostgREST storage implementation for the companions service.
//!
//! This crate provides all remote-store functionality. It implements the
//! repository traits defined in `companions-core` and contains:
//! - A fluent query builder mirroring the PostgREST filter grammar
//! - The `RemoteStoreTrait` seam and its reqwest-based HTTP client
//! - Repository implementations for companions and session history
//! - Row types matching the remote tables
//!
//! # Architecture
//!
//! ```text
//!        core (domain, traits)
//!                  │
//!                  ▼
//!   storage-postgrest (this crate)
//!                  │  HTTPS, PostgREST
//!                  ▼
//!         hosted Postgres
//! ```

pub mod client;
pub mod errors;
pub mod query;
pub mod store;
mod utils;

// Repository implementations
pub mod companions;
pub mod session_history;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use client::{PostgrestClient, PostgrestConfig, DEFAULT_TIMEOUT_SECS};
pub use errors::{StoreError, StoreResult};
pub use query::{Direction, Filter, InsertQuery, Order, SelectQuery};
pub use store::{RemoteStoreTrait, StoreProviderTrait};

pub use companions::CompanionRepository;
pub use session_history::SessionHistoryRepository;

// Re-export from companions-core for convenience
pub use companions_core::errors::{Error, PersistenceError, Result};
