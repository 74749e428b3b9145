use async_trait::async_trait;

use super::identity_model::Identity;

/// Supplies the authenticated caller, if any.
///
/// Implementations sit in front of an external identity provider. Neither
/// method fails: an unresolvable caller is simply absent.
#[async_trait]
pub trait IdentityResolverTrait: Send + Sync {
    async fn resolve_identity(&self) -> Option<Identity>;
    async fn resolve_access_token(&self) -> Option<String>;
}
