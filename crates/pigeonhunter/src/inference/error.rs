//! Inference backend error types.

use thiserror::Error;

/// Errors raised while talking to the inference backend.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Failed to construct the HTTP client.
    #[error("HTTP client error: {0}")]
    ClientBuild(String),

    /// The API key could not be resolved.
    #[error("Inference credentials not available: {0}")]
    CredentialsNotFound(String),

    /// Request did not complete (connect, timeout, body read).
    #[error("Inference request failed: {0}")]
    Http(String),

    /// Backend answered with a non-success status.
    #[error("Inference backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Reply was not in the expected shape.
    #[error("Failed to parse inference response: {0}")]
    ResponseParse(String),

    /// Reply carried no content.
    #[error("Inference backend returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        InferenceError::Http(err.to_string())
    }
}
