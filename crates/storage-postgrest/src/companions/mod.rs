mod model;
mod repository;

pub use model::{CompanionRow, NewCompanionRow, COMPANIONS_TABLE};
pub use repository::CompanionRepository;
