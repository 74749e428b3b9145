use std::sync::Arc;

use crate::{auth::IdentityVerifier, config::Config};
use companions_core::{
    companions::CompanionService, identity::IdentityResolverTrait, identity::ResolvedIdentity,
    session_history::SessionHistoryService,
};
use companions_storage_postgrest::{
    CompanionRepository, PostgrestClient, RemoteStoreTrait, SessionHistoryRepository,
    StoreProviderTrait,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    /// Hands out a store bound to each request's caller.
    pub stores: Arc<dyn StoreProviderTrait>,
    pub verifier: Option<Arc<IdentityVerifier>>,
    pub sign_in_path: String,
}

impl AppState {
    fn bind(
        &self,
        identity: ResolvedIdentity,
    ) -> (Arc<dyn RemoteStoreTrait>, Arc<dyn IdentityResolverTrait>) {
        let identity: Arc<dyn IdentityResolverTrait> = Arc::new(identity);
        let store = self.stores.store_for(identity.clone());
        (store, identity)
    }

    /// Companion service acting on behalf of one caller.
    pub fn companion_service(&self, identity: ResolvedIdentity) -> Arc<CompanionService> {
        let (store, identity) = self.bind(identity);
        let repository = Arc::new(CompanionRepository::new(store, identity));
        Arc::new(CompanionService::new(repository))
    }

    /// Session history service acting on behalf of one caller.
    pub fn session_history_service(&self, identity: ResolvedIdentity) -> SessionHistoryService {
        let (store, identity) = self.bind(identity);
        let repository = Arc::new(SessionHistoryRepository::new(store, identity));
        SessionHistoryService::new(repository)
    }
}

pub fn init_tracing() {
    let log_format =
        std::env::var("COMPANIONS_LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = PostgrestClient::new(&config.store)?;
    tracing::info!("Remote store in use: {}", config.store.url);

    let verifier = match (&config.jwt_secret, &config.jwt_public_key) {
        (Some(secret), _) => Some(Arc::new(IdentityVerifier::from_secret(secret)?)),
        (None, Some(pem)) => Some(Arc::new(IdentityVerifier::from_rsa_pem(pem)?)),
        (None, None) => {
            tracing::warn!("No identity verifier configured; every caller is anonymous");
            None
        }
    };

    Ok(Arc::new(AppState {
        stores: Arc::new(store),
        verifier,
        sign_in_path: config.sign_in_path.clone(),
    }))
}
