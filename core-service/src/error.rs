use std::time::Duration;

use bridge_traits::{BridgeError, DecodeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Calling environment not initialized; call set_environment first")]
    EnvironmentNotInitialized,

    #[error("Calling environment already initialized with a different handle")]
    EnvironmentAlreadyInitialized,

    #[error("Application context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("Secure storage backend not found: {0}")]
    BackendNotFound(String),

    #[error("Secure storage failure: {0}")]
    StorageFailure(String),

    #[error("Malformed storage result: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid secret key: {0}")]
    InvalidKey(String),

    #[error("Secure storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

impl StorageError {
    /// Precondition and configuration errors that no retry will fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EnvironmentNotInitialized
                | Self::EnvironmentAlreadyInitialized
                | Self::BackendNotFound(_)
                | Self::InvalidKey(_)
                | Self::Config(_)
        )
    }
}

impl From<BridgeError> for StorageError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::InvalidKey(message) => Self::InvalidKey(message),
            other => Self::StorageFailure(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
