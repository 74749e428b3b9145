use crate::companions::companions_model::{Companion, ListCompanionsOptions, NewCompanion};
use crate::errors::Result;
use async_trait::async_trait;

/// Trait for companion repository operations
#[async_trait]
pub trait CompanionRepositoryTrait: Send + Sync {
    /// Inserts a companion authored by the resolved caller.
    async fn create(&self, new_companion: NewCompanion) -> Result<Companion>;
    async fn get_by_id(&self, companion_id: &str) -> Result<Option<Companion>>;
    async fn list(&self, options: &ListCompanionsOptions) -> Result<Vec<Companion>>;
}

/// Trait for companion service operations
#[async_trait]
pub trait CompanionServiceTrait: Send + Sync {
    async fn create_companion(&self, new_companion: NewCompanion) -> Result<Companion>;
    async fn get_companion(&self, companion_id: &str) -> Result<Option<Companion>>;
    async fn list_companions(&self, options: ListCompanionsOptions) -> Result<Vec<Companion>>;
}
