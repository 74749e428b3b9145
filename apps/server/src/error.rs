use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use companions_core::errors::{Error as CoreError, FieldError};
use serde::Serialize;
use thiserror::Error;

/// Marker left on a response that must become a sign-in redirect.
///
/// The identity middleware owns the configured sign-in path and swaps the
/// response for a `303 See Other` pointing there.
#[derive(Debug, Clone, Copy)]
pub struct SignInRequired;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    /// The remote store failed while serving the request.
    #[error("{0}")]
    Upstream(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut field_errors = Vec::new();
        let (status, msg) = match &self {
            ApiError::Core(e) => match e {
                CoreError::AuthRequired => {
                    let mut response = StatusCode::SEE_OTHER.into_response();
                    response.extensions_mut().insert(SignInRequired);
                    return response;
                }
                CoreError::Validation(v) => {
                    field_errors = v.field_errors().to_vec();
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                CoreError::Persistence(_) | CoreError::EmptyResult(_) => {
                    (StatusCode::BAD_GATEWAY, e.to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            },
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(reason) => (StatusCode::CONFLICT, reason.clone()),
            ApiError::Upstream(reason) => (StatusCode::BAD_GATEWAY, reason.clone()),
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
            field_errors,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use companions_core::errors::{PersistenceError, ValidationError};

    #[test]
    fn test_status_mapping() {
        let status = |err: ApiError| err.into_response().status();

        assert_eq!(
            status(CoreError::from(ValidationError::InvalidInput("x".into())).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(CoreError::from(PersistenceError::RequestFailed("down".into())).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(CoreError::EmptyResult("Companion insert".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(ApiError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ApiError::Upstream("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_auth_required_is_marked_for_redirect() {
        let response = ApiError::from(CoreError::AuthRequired).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.extensions().get::<SignInRequired>().is_some());
    }
}
