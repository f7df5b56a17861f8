//! Error types for the model module

use thiserror::Error;

/// Error type for completion requests
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Response body
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Request serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
