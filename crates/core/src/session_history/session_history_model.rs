//! Session history domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of history rows returned when the caller does not ask for a limit.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// One "user engaged companion" event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryEntry {
    pub id: String,
    pub companion_id: String,
    pub user_id: String,
    /// Assigned by the remote store
    pub created_at: DateTime<Utc>,
}
