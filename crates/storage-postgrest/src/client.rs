//! HTTP client for the hosted PostgREST API.
//!
//! Every request carries the project's anon key as `apikey`. The bearer
//! token is the caller's access token when an identity resolver is attached
//! and yields one, otherwise the anon key itself.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use companions_core::errors::{Error, Result};
use companions_core::identity::IdentityResolverTrait;

use crate::errors::{StoreError, StoreResult};
use crate::query::{InsertQuery, SelectQuery};
use crate::store::{RemoteStoreTrait, StoreProviderTrait};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const REST_PATH: &str = "/rest/v1";
const URL_ENV: &str = "SUPABASE_URL";
const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Connection settings for the remote store.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout: Duration,
}

impl PostgrestConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
    pub fn from_env() -> Result<Self> {
        let url = required_env(URL_ENV)?;
        let anon_key = required_env(ANON_KEY_ENV)?;
        Ok(Self::new(url, anon_key))
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::MissingConfigKey(key.to_string()))
}

/// reqwest-backed `RemoteStoreTrait` implementation.
#[derive(Clone)]
pub struct PostgrestClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    identity: Option<Arc<dyn IdentityResolverTrait>>,
}

impl PostgrestClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or key is malformed, or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &PostgrestConfig) -> Result<Self> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url)
            .map_err(|e| Error::InvalidConfigValue(format!("{}: {}", URL_ENV, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidConfigValue(format!(
                "{}: unsupported scheme '{}'",
                URL_ENV,
                parsed.scheme()
            )));
        }
        if config.anon_key.trim().is_empty() {
            return Err(Error::MissingConfigKey(ANON_KEY_ENV.to_string()));
        }
        HeaderValue::from_str(&config.anon_key)
            .map_err(|e| Error::InvalidConfigValue(format!("{}: {}", ANON_KEY_ENV, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        debug!("[Postgrest] Client created for {}", base_url);
        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
            identity: None,
        })
    }

    /// A copy of this client that authorizes requests as the given caller.
    pub fn with_identity(&self, identity: Arc<dyn IdentityResolverTrait>) -> Self {
        Self {
            identity: Some(identity),
            ..self.clone()
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}{}/{}", self.base_url, REST_PATH, table)
    }

    async fn bearer_token(&self) -> String {
        let token = match &self.identity {
            Some(identity) => identity.resolve_access_token().await,
            None => None,
        };
        token.unwrap_or_else(|| {
            debug!("[Postgrest] No access token, using anon key");
            self.anon_key.clone()
        })
    }

    async fn headers(&self) -> StoreResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let api_key = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| StoreError::InvalidRequest(format!("Invalid anon key: {}", e)))?;
        headers.insert("apikey", api_key);
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.bearer_token().await))
            .map_err(|e| StoreError::InvalidRequest(format!("Invalid access token format: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    pub(crate) async fn build_select(&self, query: &SelectQuery) -> StoreResult<reqwest::Request> {
        self.client
            .get(self.table_url(query.table_name()))
            .headers(self.headers().await?)
            .query(&query.to_query_pairs())
            .build()
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))
    }

    pub(crate) async fn build_insert(&self, query: &InsertQuery) -> StoreResult<reqwest::Request> {
        self.client
            .post(self.table_url(query.table_name()))
            .headers(self.headers().await?)
            .header("Prefer", "return=representation")
            .query(&query.to_query_pairs())
            .json(query.rows())
            .build()
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))
    }

    async fn execute(&self, request: reqwest::Request) -> StoreResult<Vec<Value>> {
        debug!("[Postgrest] {} {}", request.method(), request.url());
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        parse_response(response).await
    }
}

/// Parse an HTTP response into rows or a store error.
async fn parse_response(response: reqwest::Response) -> StoreResult<Vec<Value>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::Transport(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(error_from_body(status.as_u16(), &body));
    }
    parse_rows(&body)
}

pub(crate) fn error_from_body(status: u16, body: &str) -> StoreError {
    if let Ok(err) = serde_json::from_str::<ApiErrorResponse>(body) {
        if let Some(message) = err.message.or(err.error) {
            warn!("[Postgrest] HTTP {}: {}", status, message);
            return StoreError::Api {
                status,
                message,
                code: err.code,
                details: err.details,
                hint: err.hint,
            };
        }
    }
    let message = format!(
        "HTTP {}: {}",
        status,
        body.chars().take(200).collect::<String>()
    );
    warn!("[Postgrest] {}", message);
    StoreError::Api {
        status,
        message,
        code: None,
        details: None,
        hint: None,
    }
}

pub(crate) fn parse_rows(body: &str) -> StoreResult<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(row @ Value::Object(_)) => Ok(vec![row]),
        Ok(other) => Err(StoreError::Decode(format!("unexpected payload: {}", other))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}

#[async_trait]
impl RemoteStoreTrait for PostgrestClient {
    async fn select(&self, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        let request = self.build_select(query).await?;
        self.execute(request).await
    }

    async fn insert(&self, query: &InsertQuery) -> StoreResult<Vec<Value>> {
        let request = self.build_insert(query).await?;
        self.execute(request).await
    }
}

impl StoreProviderTrait for PostgrestClient {
    fn store_for(&self, identity: Arc<dyn IdentityResolverTrait>) -> Arc<dyn RemoteStoreTrait> {
        Arc::new(self.with_identity(identity))
    }
}
