//! Store error taxonomy

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a [`RemoteStore`](crate::repository::RemoteStore).
/// Every store call fails atomically: on error nothing changed remotely.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum StoreError {
    /// Payload rejected before persistence
    #[error("Invalid input: {0}")]
    Validation(String),
    /// Target id no longer exists remotely
    #[error("Not found: {0}")]
    NotFound(String),
    /// Transport or auth failure
    #[error("Request failed: {0}")]
    Fetch(String),
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Validation(format!("JSON error: {}", err))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Fetch(format!("sqlite: {}", err))
    }
}
