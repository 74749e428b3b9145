mod model;
mod repository;

pub use model::{NewSessionHistoryRow, SessionHistoryRow, SESSION_HISTORY_TABLE};
pub use repository::SessionHistoryRepository;
