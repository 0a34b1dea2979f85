//! Error types for the storage layer.

use deployd_engine::DeployError;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Plan body could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row holds a value that cannot be read back.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A thread panicked while holding the connection.
    #[error("connection lock poisoned")]
    LockPoisoned,
}

impl From<StoreError> for DeployError {
    fn from(err: StoreError) -> Self {
        DeployError::Storage(err.to_string())
    }
}
