use crate::companions::Companion;
use crate::errors::Result;
use crate::session_history::session_history_model::SessionHistoryEntry;
use async_trait::async_trait;

/// Trait for session history repository operations
#[async_trait]
pub trait SessionHistoryRepositoryTrait: Send + Sync {
    /// Logs an engagement of the resolved caller with a companion.
    async fn record(&self, companion_id: &str) -> Result<SessionHistoryEntry>;
    /// Companions of the most recent engagements, newest first.
    async fn recent_across_users(&self, limit: u32) -> Result<Vec<Companion>>;
    async fn for_user(&self, user_id: &str, limit: u32) -> Result<Vec<Companion>>;
}

/// Trait for session history service operations
#[async_trait]
pub trait SessionHistoryServiceTrait: Send + Sync {
    async fn record_session(&self, companion_id: &str) -> Result<SessionHistoryEntry>;
    async fn get_recent_sessions(&self, limit: Option<u32>) -> Result<Vec<Companion>>;
    async fn get_user_sessions(&self, user_id: &str, limit: Option<u32>)
        -> Result<Vec<Companion>>;
}
