use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use companions_storage_postgrest::PostgrestConfig;

pub const DEFAULT_SIGN_IN_PATH: &str = "/sign-in";

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Where callers without an identity are sent.
    pub sign_in_path: String,
    pub store: PostgrestConfig,
    /// HS256 secret shared with the identity provider.
    pub jwt_secret: Option<String>,
    /// RS256 public key (PEM) of the identity provider.
    pub jwt_public_key: Option<String>,
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("COMPANIONS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid COMPANIONS_LISTEN_ADDR")?;
        let cors_allow = std::env::var("COMPANIONS_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("COMPANIONS_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let sign_in_path =
            optional_var("COMPANIONS_SIGN_IN_PATH").unwrap_or_else(|| DEFAULT_SIGN_IN_PATH.into());
        let store = PostgrestConfig::from_env()?;

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            sign_in_path,
            store,
            jwt_secret: optional_var("COMPANIONS_AUTH_JWT_SECRET"),
            jwt_public_key: optional_var("COMPANIONS_AUTH_JWT_PUBLIC_KEY"),
        })
    }
}
