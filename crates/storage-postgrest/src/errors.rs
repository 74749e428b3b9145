//! Remote store errors and their conversion into core errors.

use companions_core::errors::{Error, PersistenceError};
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The `error` half of a remote store `{ data, error }` reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        let persistence = match err {
            StoreError::Api { message, code, .. } => PersistenceError::Rejected { message, code },
            StoreError::Transport(msg) | StoreError::InvalidRequest(msg) => {
                PersistenceError::RequestFailed(msg)
            }
            StoreError::Decode(msg) => PersistenceError::Decode(msg),
        };
        Error::Persistence(persistence)
    }
}
