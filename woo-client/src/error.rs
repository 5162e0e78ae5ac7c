//! Client error types

use shared::ErrorCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote credentials or base URL missing
    #[error("Remote platform not configured: {0} is missing")]
    NotConfigured(&'static str),

    /// Invalid base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid response format (fails closed on unexpected shapes)
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication rejected by the remote platform
    #[error("Authentication rejected")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (raised locally before any network call, or by the remote)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote platform returned another non-2xx status
    #[error("Remote error ({status}): {body}")]
    Remote { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Error code surfaced to the user
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::NotConfigured(_) => ErrorCode::RemoteNotConfigured,
            ClientError::Validation(_) => ErrorCode::ValidationFailed,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            _ => ErrorCode::RemoteUnavailable,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
