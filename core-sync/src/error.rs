use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Provider error: {0}")]
    Provider(String),

    /// The stored continuation cursor was invalidated by the remote system.
    /// The orchestrator clears the cursor store and restarts from a full
    /// listing; this never surfaces as a user-visible failure.
    #[error("Listing cursor expired: {0}")]
    CursorExpired(String),

    #[error("Derived store error: {0}")]
    Store(String),

    #[error("Work queue error: {0}")]
    Queue(String),

    #[error("Transcode submission error: {0}")]
    Transcode(String),

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sync already in progress")]
    SyncInProgress,

    #[error("Sync timeout after {0} seconds")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
