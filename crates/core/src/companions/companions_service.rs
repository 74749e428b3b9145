use log::debug;
use std::sync::Arc;

use super::companions_model::{Companion, ListCompanionsOptions, NewCompanion};
use super::companions_traits::{CompanionRepositoryTrait, CompanionServiceTrait};
use crate::errors::{Result, ValidationError};

/// Service for managing companions
pub struct CompanionService {
    repository: Arc<dyn CompanionRepositoryTrait>,
}

impl CompanionService {
    pub fn new(repository: Arc<dyn CompanionRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl CompanionServiceTrait for CompanionService {
    async fn create_companion(&self, new_companion: NewCompanion) -> Result<Companion> {
        debug!(
            "Creating companion '{}' for subject {}",
            new_companion.name, new_companion.subject
        );
        self.repository.create(new_companion).await
    }

    async fn get_companion(&self, companion_id: &str) -> Result<Option<Companion>> {
        if companion_id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()).into());
        }
        self.repository.get_by_id(companion_id).await
    }

    /// Lists companions after checking the pagination bounds locally
    async fn list_companions(&self, options: ListCompanionsOptions) -> Result<Vec<Companion>> {
        options.validate()?;
        self.repository.list(&options).await
    }
}
