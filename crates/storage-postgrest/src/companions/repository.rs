use async_trait::async_trait;
use log::{debug, error, info};
use serde_json::Value;
use std::sync::Arc;

use companions_core::companions::{
    Companion, CompanionRepositoryTrait, CreateCompanionRequest, ListCompanionsOptions,
    NewCompanion,
};
use companions_core::errors::{Error, Result};
use companions_core::identity::IdentityResolverTrait;

use super::model::{CompanionRow, NewCompanionRow, COMPANIONS_TABLE};
use crate::query::{Direction, Filter, InsertQuery, SelectQuery};
use crate::store::RemoteStoreTrait;

pub struct CompanionRepository {
    store: Arc<dyn RemoteStoreTrait>,
    identity: Arc<dyn IdentityResolverTrait>,
}

impl CompanionRepository {
    pub fn new(
        store: Arc<dyn RemoteStoreTrait>,
        identity: Arc<dyn IdentityResolverTrait>,
    ) -> Self {
        CompanionRepository { store, identity }
    }

    /// Builds the listing query for the given options.
    ///
    /// A topic matches either the `topic` or the `name` column. Pages are
    /// ordered newest first with `id` as tie-breaker so offsets stay stable.
    pub fn list_query(options: &ListCompanionsOptions) -> SelectQuery {
        let mut query = SelectQuery::table(COMPANIONS_TABLE);
        if let Some(subject) = options.subject_filter() {
            query = query.filter(Filter::contains("subject", subject));
        }
        if let Some(topic) = options.topic_filter() {
            query = query.or(vec![
                Filter::contains("topic", topic),
                Filter::contains("name", topic),
            ]);
        }
        let (from, to) = options.row_range();
        query
            .order("created_at", Direction::Descending)
            .order("id", Direction::Ascending)
            .range(from, to)
    }
}

pub(crate) fn decode_companions(rows: Vec<Value>) -> Result<Vec<Companion>> {
    rows.into_iter()
        .map(|row| {
            let row: CompanionRow = serde_json::from_value(row)?;
            Companion::try_from(row)
        })
        .collect()
}

#[async_trait]
impl CompanionRepositoryTrait for CompanionRepository {
    async fn create(&self, new_companion: NewCompanion) -> Result<Companion> {
        let identity = self
            .identity
            .resolve_identity()
            .await
            .ok_or(Error::AuthRequired)?;
        let request = CreateCompanionRequest::new(new_companion, &identity);
        let row = serde_json::to_value(NewCompanionRow::from(&request))?;

        let rows = self
            .store
            .insert(&InsertQuery::new(COMPANIONS_TABLE, vec![row]))
            .await
            .map_err(|e| {
                error!("Failed to insert companion: {}", e);
                Error::from(e)
            })?;

        let companion = decode_companions(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResult("Companion insert".to_string()))?;
        info!(
            "Created companion {} for author {}",
            companion.id, companion.author
        );
        Ok(companion)
    }

    async fn get_by_id(&self, companion_id: &str) -> Result<Option<Companion>> {
        let query = SelectQuery::table(COMPANIONS_TABLE)
            .eq("id", companion_id)
            .limit(1);
        let rows = self.store.select(&query).await.map_err(|e| {
            error!("Failed to load companion {}: {}", companion_id, e);
            Error::from(e)
        })?;
        Ok(decode_companions(rows)?.into_iter().next())
    }

    async fn list(&self, options: &ListCompanionsOptions) -> Result<Vec<Companion>> {
        let query = Self::list_query(options);
        debug!("Listing companions: {}", query);
        let rows = self.store.select(&query).await.map_err(|e| {
            error!("Failed to list companions: {}", e);
            Error::from(e)
        })?;
        decode_companions(rows)
    }
}
