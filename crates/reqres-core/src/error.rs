//! Error types for reqres-core

use thiserror::Error;

/// Result type alias for reqres operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the login server
#[derive(Debug, Error)]
pub enum Error {
    /// Request method outside the supported set
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Listen address could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Inbound body stream failed before end of stream
    #[error("Body error: {0}")]
    Body(String),

    /// Receipt encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Outgoing response could not be assembled
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
