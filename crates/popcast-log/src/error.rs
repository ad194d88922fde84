//! Error types for the log backends.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("log API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("log io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed log record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid log location: {0}")]
    InvalidUrl(String),
}
