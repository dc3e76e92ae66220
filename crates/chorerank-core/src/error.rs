//! ChoreRank error types.

use crate::types::TaskId;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ChoreError>;

#[derive(Debug, Error)]
pub enum ChoreError {
    /// Bad input to a store operation (empty owner, empty description, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Durable storage could not be read or written. Nothing was applied.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A send was attempted while the session is not connected.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The remote side revoked the session; a fresh pairing is required.
    #[error("session logged out, pairing required")]
    LoggedOut,

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for ChoreError {
    fn from(e: rusqlite::Error) -> Self {
        ChoreError::StorageUnavailable(e.to_string())
    }
}

impl ChoreError {
    /// Errors that a chat user caused and can fix by retyping the command.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ChoreError::InvalidArgument(_) | ChoreError::NotFound(_))
    }
}
