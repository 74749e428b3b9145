use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use companions_core::identity::IdentityResolverTrait;

use crate::errors::StoreResult;
use crate::query::{InsertQuery, SelectQuery};

/// A remote relational store reached through a query builder.
///
/// Rows travel as JSON objects; repositories decode them into row types.
/// An `Err` means the whole call failed and no rows are usable.
#[async_trait]
pub trait RemoteStoreTrait: Send + Sync {
    async fn select(&self, query: &SelectQuery) -> StoreResult<Vec<Value>>;
    async fn insert(&self, query: &InsertQuery) -> StoreResult<Vec<Value>>;
}

/// Hands out stores that act on behalf of one caller.
///
/// Long-lived state holds a provider; each request binds the caller it
/// resolved and gets a store whose calls carry that caller's credentials.
pub trait StoreProviderTrait: Send + Sync {
    fn store_for(&self, identity: Arc<dyn IdentityResolverTrait>) -> Arc<dyn RemoteStoreTrait>;
}
