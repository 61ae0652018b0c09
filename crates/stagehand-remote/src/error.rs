//! Remote error types

use thiserror::Error;

/// Errors raised by release hosting and mail adapters
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Authentication failed or no credentials were found
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API error from the remote service
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Requested release does not exist
    #[error("Release not found: {0}")]
    ReleaseNotFound(String),

    /// Requested asset does not exist
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;
