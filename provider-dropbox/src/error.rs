//! Error types for the Dropbox provider

use thiserror::Error;

/// Dropbox provider errors
#[derive(Error, Debug)]
pub enum DropboxError {
    /// Authentication failed or token is invalid
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Dropbox API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// The listed path does not exist remotely
    #[error("Path not found: {path}")]
    PathNotFound { path: String },

    /// The continuation cursor was invalidated by the remote system
    #[error("Cursor reset: {0}")]
    CursorReset(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Dropbox operations
pub type Result<T> = std::result::Result<T, DropboxError>;

impl From<DropboxError> for bridge_traits::error::BridgeError {
    fn from(error: DropboxError) -> Self {
        use bridge_traits::error::BridgeError;
        match error {
            DropboxError::AuthenticationFailed(msg) => {
                BridgeError::OperationFailed(format!("Authentication failed: {}", msg))
            }
            DropboxError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            DropboxError::PathNotFound { path } => BridgeError::NotFound(path),
            DropboxError::CursorReset(msg) => BridgeError::CursorReset(msg),
            DropboxError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            DropboxError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    #[test]
    fn test_error_display() {
        let error = DropboxError::ApiError {
            status_code: 409,
            message: "path/not_found/..".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Dropbox API error (status 409): path/not_found/.."
        );
    }

    #[test]
    fn test_typed_conversions_survive() {
        let not_found = DropboxError::PathNotFound {
            path: "".to_string(),
        };
        assert!(matches!(
            BridgeError::from(not_found),
            BridgeError::NotFound(_)
        ));

        let reset = DropboxError::CursorReset("reset/..".to_string());
        assert!(matches!(
            BridgeError::from(reset),
            BridgeError::CursorReset(_)
        ));
    }
}
