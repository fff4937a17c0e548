//! Error types for backend calls and local persistence.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by a [`ChatBackend`](crate::api::ChatBackend).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server answered with a non-2xx status.
    #[error("server returned {0}")]
    Status(StatusCode),

    /// The server rejected the request because the session is not registered.
    #[error("not registered")]
    Unauthorized,

    /// The request failed before a response was obtained.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The request was cancelled locally.
    #[error("request cancelled")]
    Cancelled,

    /// The server URL cannot carry a path, so no request was made.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// True when no usable response came back from the server.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(err) => !err.is_status(),
            Self::Cancelled | Self::InvalidUrl(_) => true,
            _ => false,
        }
    }
}

/// Errors from reading or writing local files (config, preferences).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
