//! Companions module - domain models, services, and traits.

mod companions_constants;
mod companions_model;
mod companions_service;
mod companions_traits;


pub use companions_constants::*;
pub use companions_model::{
    Companion, CompanionForm, CreateCompanionRequest, ListCompanionsOptions, NewCompanion, Style,
    Voice,
};
pub use companions_service::CompanionService;
pub use companions_traits::{CompanionRepositoryTrait, CompanionServiceTrait};
