use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Invalid secret key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
