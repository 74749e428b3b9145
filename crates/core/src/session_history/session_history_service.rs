use std::sync::Arc;

use super::session_history_model::{SessionHistoryEntry, DEFAULT_HISTORY_LIMIT};
use super::session_history_traits::{SessionHistoryRepositoryTrait, SessionHistoryServiceTrait};
use crate::companions::Companion;
use crate::errors::{Result, ValidationError};

/// Service for recording and reading companion engagements
pub struct SessionHistoryService {
    repository: Arc<dyn SessionHistoryRepositoryTrait>,
}

impl SessionHistoryService {
    pub fn new(repository: Arc<dyn SessionHistoryRepositoryTrait>) -> Self {
        Self { repository }
    }
}

fn resolve_limit(limit: Option<u32>) -> Result<u32> {
    match limit {
        None => Ok(DEFAULT_HISTORY_LIMIT),
        Some(0) => Err(ValidationError::InvalidInput("limit must be at least 1".to_string()).into()),
        Some(limit) => Ok(limit),
    }
}

#[async_trait::async_trait]
impl SessionHistoryServiceTrait for SessionHistoryService {
    async fn record_session(&self, companion_id: &str) -> Result<SessionHistoryEntry> {
        if companion_id.trim().is_empty() {
            return Err(ValidationError::MissingField("companionId".to_string()).into());
        }
        self.repository.record(companion_id).await
    }

    async fn get_recent_sessions(&self, limit: Option<u32>) -> Result<Vec<Companion>> {
        let limit = resolve_limit(limit)?;
        self.repository.recent_across_users(limit).await
    }

    async fn get_user_sessions(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Companion>> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId".to_string()).into());
        }
        let limit = resolve_limit(limit)?;
        self.repository.for_user(user_id, limit).await
    }
}
