//! Row types for the `session_history` table.

use chrono::{DateTime, Utc};
use companions_core::session_history::SessionHistoryEntry;
use serde::{Deserialize, Serialize};

use crate::companions::{CompanionRow, COMPANIONS_TABLE};
use crate::utils::deserialize_id;

pub const SESSION_HISTORY_TABLE: &str = "session_history";

/// Join-select embedding the engaged companion under its table name.
pub(crate) fn companion_join() -> String {
    format!("{}:companion_id(*)", COMPANIONS_TABLE)
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionHistoryRow {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub companion_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewSessionHistoryRow {
    pub companion_id: String,
    pub user_id: String,
}

/// A history row with only the embedded companion selected.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompanionJoinRow {
    #[serde(default)]
    pub companions: Option<CompanionRow>,
}

impl From<SessionHistoryRow> for SessionHistoryEntry {
    fn from(row: SessionHistoryRow) -> Self {
        SessionHistoryEntry {
            id: row.id,
            companion_id: row.companion_id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_row_parses_postgres_timestamp() {
        let row: SessionHistoryRow = serde_json::from_value(json!({
            "id": 12,
            "companion_id": "c-1",
            "user_id": "user_1",
            "created_at": "2025-03-04T05:06:07.123456+00:00"
        }))
        .unwrap();

        let entry = SessionHistoryEntry::from(row);
        assert_eq!(entry.id, "12");
        assert_eq!(
            entry.created_at.date_naive(),
            Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap().date_naive()
        );
    }

    #[test]
    fn test_join_row_tolerates_null_companion() {
        let row: CompanionJoinRow = serde_json::from_value(json!({ "companions": null })).unwrap();
        assert!(row.companions.is_none());
    }

    #[test]
    fn test_companion_join_select() {
        assert_eq!(companion_join(), "companions:companion_id(*)");
    }
}
