//! Error types for the dispatch pipeline.
//!
//! None of these ever reach the host that triggered a dispatch. They exist so
//! that each failure can be logged with the right severity and detail.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// One or more of owner/repo/token is missing. The whole batch is skipped.
    #[error("missing GitHub configuration for {}", .fields.join("/"))]
    ConfigMissing { fields: Vec<&'static str> },

    /// The request could not be built before anything was sent.
    #[error("invalid header value for {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    #[error("invalid dispatch URL: {0}")]
    InvalidUrl(String),

    #[error("failed to build dispatch request: {0}")]
    Setup(String),

    /// The request was sent but the network or client layer failed.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("dispatch rejected with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl DispatchError {
    /// Whether the error happened before the asynchronous send began.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidHeader { .. } | DispatchError::InvalidUrl(_) | DispatchError::Setup(_)
        )
    }
}
