//! Bridges bearer tokens from the identity provider into a caller identity.
//!
//! The provider signs access tokens; this server only verifies them. The
//! `sub` claim becomes the user id and the raw token is forwarded to the
//! remote store so row-level policies see the same caller.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use companions_core::identity::ResolvedIdentity;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::SignInRequired;
use crate::main_lib::AppState;

const MIN_SECRET_LEN: usize = 32;

pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
}

#[derive(Serialize)]
struct AuthErrorBody {
    code: u16,
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

impl IdentityVerifier {
    /// HS256 with a secret shared with the provider.
    pub fn from_secret(raw: &str) -> anyhow::Result<Self> {
        let secret = decode_secret_key(raw)?;
        Ok(Self::with_key(
            DecodingKey::from_secret(&secret),
            Algorithm::HS256,
        ))
    }

    /// RS256 with the provider's public key.
    pub fn from_rsa_pem(pem: &str) -> anyhow::Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        // Provider tokens carry audiences like "authenticated"; not checked here.
        validation.validate_aud = false;
        Self {
            decoding_key,
            validation,
        }
    }

    /// Returns the user id carried by a valid token.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            tracing::debug!("Rejected bearer token: {err}");
            AuthError::Unauthorized
        })?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::Unauthorized);
        }
        Ok(data.claims.sub)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };
        let body = Json(AuthErrorBody {
            code: status.as_u16(),
            message,
        });
        (status, body).into_response()
    }
}

/// Accepts a base64 encoded secret or the raw secret text.
pub fn decode_secret_key(raw: &str) -> anyhow::Result<Vec<u8>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("JWT secret cannot be empty");
    }
    let decoded = match BASE64.decode(trimmed) {
        Ok(bytes) if bytes.len() >= MIN_SECRET_LEN => bytes,
        _ => trimmed.as_bytes().to_vec(),
    };

    if decoded.len() < MIN_SECRET_LEN {
        anyhow::bail!("JWT secret must be at least {MIN_SECRET_LEN} bytes");
    }

    Ok(decoded)
}

/// `Ok(None)` when the header is absent, an error when it is malformed.
fn bearer_token(request: &Request<Body>) -> Result<Option<String>, AuthError> {
    let Some(value) = request.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = value.to_str().map_err(|_| AuthError::Unauthorized)?;

    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(AuthError::Unauthorized);
    };

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::Unauthorized);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Unauthorized);
    }
    Ok(Some(token.to_string()))
}

/// Attaches a `ResolvedIdentity` to every request.
///
/// No header means an anonymous caller; a header that fails verification is
/// rejected. Responses marked with `SignInRequired` become redirects.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = match &state.verifier {
        Some(verifier) => match bearer_token(&request)? {
            Some(token) => {
                let user_id = verifier.verify(&token)?;
                ResolvedIdentity::authenticated(user_id, token)
            }
            None => ResolvedIdentity::anonymous(),
        },
        None => ResolvedIdentity::anonymous(),
    };
    request.extensions_mut().insert(identity);

    let response = next.run(request).await;
    if response.extensions().get::<SignInRequired>().is_some() {
        tracing::debug!("Redirecting anonymous caller to {}", state.sign_in_path);
        return Ok(Redirect::to(&state.sign_in_path).into_response());
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "an-identity-provider-shared-secret-value";

    fn token(sub: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_secret_key() {
        assert_eq!(decode_secret_key(SECRET).unwrap(), SECRET.as_bytes());
        let encoded = BASE64.encode([7u8; 32]);
        assert_eq!(decode_secret_key(&encoded).unwrap(), vec![7u8; 32]);
        assert!(decode_secret_key("short").is_err());
        assert!(decode_secret_key("   ").is_err());
    }

    #[test]
    fn test_verify_returns_subject() {
        let verifier = IdentityVerifier::from_secret(SECRET).unwrap();
        assert_eq!(verifier.verify(&token("user_1", 3600)).unwrap(), "user_1");
    }

    #[test]
    fn test_verify_rejects_expired_and_foreign_tokens() {
        let verifier = IdentityVerifier::from_secret(SECRET).unwrap();
        assert!(matches!(
            verifier.verify(&token("user_1", -3600)),
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            verifier.verify("not-a-jwt"),
            Err(AuthError::Unauthorized)
        ));

        let other = IdentityVerifier::from_secret("a-completely-different-shared-secret!!").unwrap();
        assert!(matches!(
            other.verify(&token("user_1", 3600)),
            Err(AuthError::Unauthorized)
        ));
    }
}
