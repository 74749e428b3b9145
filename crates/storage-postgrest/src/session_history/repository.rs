use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::sync::Arc;

use companions_core::companions::Companion;
use companions_core::errors::{Error, Result};
use companions_core::identity::IdentityResolverTrait;
use companions_core::session_history::{SessionHistoryEntry, SessionHistoryRepositoryTrait};

use super::model::{
    companion_join, CompanionJoinRow, NewSessionHistoryRow, SessionHistoryRow,
    SESSION_HISTORY_TABLE,
};
use crate::query::{Direction, InsertQuery, SelectQuery};
use crate::store::RemoteStoreTrait;

pub struct SessionHistoryRepository {
    store: Arc<dyn RemoteStoreTrait>,
    identity: Arc<dyn IdentityResolverTrait>,
}

impl SessionHistoryRepository {
    pub fn new(
        store: Arc<dyn RemoteStoreTrait>,
        identity: Arc<dyn IdentityResolverTrait>,
    ) -> Self {
        SessionHistoryRepository { store, identity }
    }

    /// Newest engagements first, projected onto their companions.
    pub fn history_query(user_id: Option<&str>, limit: u32) -> SelectQuery {
        let mut query = SelectQuery::table(SESSION_HISTORY_TABLE).select(&companion_join());
        if let Some(user_id) = user_id {
            query = query.eq("user_id", user_id);
        }
        query
            .order("created_at", Direction::Descending)
            .limit(u64::from(limit))
    }

    async fn load_companions(&self, query: SelectQuery) -> Result<Vec<Companion>> {
        debug!("Loading session history: {}", query);
        let rows = self.store.select(&query).await.map_err(|e| {
            error!("Failed to load session history: {}", e);
            Error::from(e)
        })?;

        let mut companions = Vec::with_capacity(rows.len());
        for row in rows {
            let joined: CompanionJoinRow = serde_json::from_value(row)?;
            match joined.companions {
                Some(companion) => companions.push(Companion::try_from(companion)?),
                None => warn!("Skipping history row without a visible companion"),
            }
        }
        Ok(companions)
    }
}

#[async_trait]
impl SessionHistoryRepositoryTrait for SessionHistoryRepository {
    async fn record(&self, companion_id: &str) -> Result<SessionHistoryEntry> {
        let identity = self
            .identity
            .resolve_identity()
            .await
            .ok_or(Error::AuthRequired)?;
        let row = serde_json::to_value(NewSessionHistoryRow {
            companion_id: companion_id.to_string(),
            user_id: identity.user_id,
        })?;

        let rows = self
            .store
            .insert(&InsertQuery::new(SESSION_HISTORY_TABLE, vec![row]))
            .await
            .map_err(|e| {
                error!("Failed to record session for companion {}: {}", companion_id, e);
                Error::from(e)
            })?;

        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResult("Session history insert".to_string()))?;
        let entry = SessionHistoryEntry::from(serde_json::from_value::<SessionHistoryRow>(first)?);
        info!(
            "Recorded session {} for companion {}",
            entry.id, entry.companion_id
        );
        Ok(entry)
    }

    async fn recent_across_users(&self, limit: u32) -> Result<Vec<Companion>> {
        self.load_companions(Self::history_query(None, limit)).await
    }

    async fn for_user(&self, user_id: &str, limit: u32) -> Result<Vec<Companion>> {
        self.load_companions(Self::history_query(Some(user_id), limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companions::COMPANIONS_TABLE;
    use crate::test_support::InMemoryStore;
    use companions_core::identity::ResolvedIdentity;
    use serde_json::{json, Value};

    fn companion_row(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "subject": "science",
            "topic": "Cells",
            "voice": "female",
            "style": "casual",
            "duration": 20,
            "author": "author_1"
        })
    }

    fn history_row(id: u32, companion_id: &str, user_id: &str, second: u32) -> Value {
        json!({
            "id": id,
            "companion_id": companion_id,
            "user_id": user_id,
            "created_at": format!("2025-02-01T12:00:{:02}+00:00", second)
        })
    }

    fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store.seed(
            COMPANIONS_TABLE,
            vec![
                companion_row("a", "Alpha"),
                companion_row("b", "Beta"),
                companion_row("c", "Gamma"),
            ],
        );
        store.seed(
            SESSION_HISTORY_TABLE,
            vec![
                history_row(1, "a", "user_1", 1),
                history_row(2, "b", "user_2", 2),
                history_row(3, "c", "user_1", 3),
                history_row(4, "a", "user_2", 4),
                history_row(5, "b", "user_1", 5),
            ],
        );
        store
    }

    fn repository(
        store: Arc<InMemoryStore>,
        identity: ResolvedIdentity,
    ) -> SessionHistoryRepository {
        SessionHistoryRepository::new(store, Arc::new(identity))
    }

    fn names(companions: &[Companion]) -> Vec<&str> {
        companions.iter().map(|c| c.name.as_str()).collect()
    }

    // ==================== record ====================

    #[tokio::test]
    async fn test_record_inserts_caller_and_companion() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repository(
            store.clone(),
            ResolvedIdentity::authenticated("user_7", "token"),
        );

        let entry = repo.record("a").await.unwrap();

        assert_eq!(entry.companion_id, "a");
        assert_eq!(entry.user_id, "user_7");
        let inserts = store.inserts();
        assert_eq!(inserts[0].table_name(), SESSION_HISTORY_TABLE);
        assert_eq!(
            inserts[0].rows(),
            &[json!({"companion_id": "a", "user_id": "user_7"})]
        );
    }

    #[tokio::test]
    async fn test_record_without_identity_never_reaches_store() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repository(store.clone(), ResolvedIdentity::anonymous());

        let result = repo.record("a").await;

        assert!(matches!(result, Err(Error::AuthRequired)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_record_failures() {
        let failing = repository(
            Arc::new(InMemoryStore::failing("insert or update violates foreign key")),
            ResolvedIdentity::authenticated("u", "t"),
        );
        assert!(matches!(
            failing.record("zzz").await,
            Err(Error::Persistence(_))
        ));

        let empty = repository(
            Arc::new(InMemoryStore::returning_nothing()),
            ResolvedIdentity::authenticated("u", "t"),
        );
        assert!(matches!(empty.record("a").await, Err(Error::EmptyResult(_))));
    }

    // ==================== reads ====================

    #[test]
    fn test_history_query_shape() {
        let query = SessionHistoryRepository::history_query(Some("user_1"), 5);
        assert_eq!(
            query.to_string(),
            "SELECT companions:companion_id(*) FROM session_history WHERE user_id = 'user_1' \
             ORDER BY created_at.desc OFFSET 0 LIMIT 5"
        );
    }

    #[tokio::test]
    async fn test_recent_across_users_newest_first_and_limited() {
        let repo = repository(seeded_store(), ResolvedIdentity::anonymous());

        let companions = repo.recent_across_users(3).await.unwrap();

        assert_eq!(names(&companions), vec!["Beta", "Alpha", "Gamma"]);
    }

    #[tokio::test]
    async fn test_for_user_only_returns_that_users_history() {
        let store = seeded_store();
        let repo = repository(store.clone(), ResolvedIdentity::anonymous());

        let companions = repo.for_user("user_2", 10).await.unwrap();

        assert_eq!(names(&companions), vec!["Alpha", "Beta"]);
        assert_eq!(
            store.selects()[0].filters(),
            &[crate::query::Filter::eq("user_id", "user_2")]
        );
    }

    #[tokio::test]
    async fn test_dangling_history_rows_are_skipped() {
        let store = seeded_store();
        store.seed(
            SESSION_HISTORY_TABLE,
            vec![history_row(6, "deleted", "user_1", 6)],
        );
        let repo = repository(store, ResolvedIdentity::anonymous());

        let companions = repo.for_user("user_1", 10).await.unwrap();

        assert_eq!(names(&companions), vec!["Beta", "Gamma", "Alpha"]);
    }

    #[tokio::test]
    async fn test_history_reads_propagate_store_error() {
        let repo = repository(
            Arc::new(InMemoryStore::failing("timeout")),
            ResolvedIdentity::anonymous(),
        );
        assert!(matches!(
            repo.recent_across_users(10).await,
            Err(Error::Persistence(_))
        ));
    }
}
