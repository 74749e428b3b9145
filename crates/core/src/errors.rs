//! Core error types for the companions service.
//!
//! This module defines storage-agnostic error types. Errors coming from the
//! remote store client are converted to these types by the storage layer.

use serde::Serialize;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the companions service.
///
/// `AuthRequired` is not a failure of the operation itself: the boundary
/// layer turns it into a sign-in navigation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Persistence operation failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("{0} returned no rows")]
    EmptyResult(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Missing configuration key: {0}")]
    MissingConfigKey(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Store-agnostic error type for remote persistence calls.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The request never produced a response (connection, timeout, TLS).
    #[error("Request to remote store failed: {0}")]
    RequestFailed(String),

    /// The remote store answered with an error payload.
    #[error("{message}")]
    Rejected {
        message: String,
        code: Option<String>,
    },

    /// The remote store answered, but the payload could not be decoded.
    #[error("Failed to decode remote store response: {0}")]
    Decode(String),
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validation errors for user input, raised before any remote call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("{}", join_messages(.0))]
    InvalidFields(Vec<FieldError>),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Field-level details, when the error carries them.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ValidationError::InvalidFields(errors) => errors,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persistence(PersistenceError::Decode(err.to_string()))
    }
}
