//! Identity module - the caller identity boundary.

mod identity_model;
mod identity_traits;

pub use identity_model::{Identity, ResolvedIdentity};
pub use identity_traits::IdentityResolverTrait;
