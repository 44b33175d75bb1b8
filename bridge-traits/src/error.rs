use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The remote path does not exist. Callers treat this as a normal state
    /// for freshly provisioned integrations, not a failure.
    #[error("Remote path not found: {0}")]
    NotFound(String),

    /// The remote system reported the continuation token as invalid or
    /// expired. The orchestrator must clear the stored cursor and restart
    /// from a full listing.
    #[error("Listing cursor reset by remote: {0}")]
    CursorReset(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
