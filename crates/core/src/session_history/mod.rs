//! Session history module - engagement log models, services, and traits.

mod session_history_model;
mod session_history_service;
mod session_history_traits;

pub use session_history_model::{SessionHistoryEntry, DEFAULT_HISTORY_LIMIT};
pub use session_history_service::SessionHistoryService;
pub use session_history_traits::{SessionHistoryRepositoryTrait, SessionHistoryServiceTrait};
