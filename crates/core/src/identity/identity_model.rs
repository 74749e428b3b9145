//! Identity domain models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::identity_traits::IdentityResolverTrait;

/// The authenticated caller, as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// An identity that was already resolved, e.g. from a verified bearer token.
#[derive(Debug, Clone, Default)]
pub struct ResolvedIdentity {
    identity: Option<Identity>,
    access_token: Option<String>,
}

impl ResolvedIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            identity: Some(Identity::new(user_id)),
            access_token: Some(access_token.into()),
        }
    }
}

#[async_trait]
impl IdentityResolverTrait for ResolvedIdentity {
    async fn resolve_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn resolve_access_token(&self) -> Option<String> {
        self.access_token.clone()
    }
}
