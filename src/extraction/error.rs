//! Error types for the extraction module

use crate::error::FailureKind;
use crate::model::CompletionError;
use thiserror::Error;

/// Why model output could not be normalized into listings
#[derive(Debug, Error)]
pub enum ParseError {
    /// The selected payload is not valid JSON
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload decoded to something other than an object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// `listings` is present but is not an array
    #[error("`listings` is not an array")]
    ListingsNotArray,
}

/// Error type for a single chunk extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The provider could not be reached or returned a failure status
    #[error("provider error: {0}")]
    Provider(#[from] CompletionError),

    /// The prompt leaves no room for output in the context window
    #[error("prompt of {prompt_tokens} tokens leaves no output budget in a {context_window}-token context")]
    ContextExhausted {
        /// Estimated prompt size
        prompt_tokens: usize,
        /// Provider context window
        context_window: u32,
    },

    /// The model answered with something that is not a listings payload
    #[error("malformed response: {0}")]
    Malformed(#[from] ParseError),
}

impl ExtractError {
    /// The failure kind recorded in the run summary
    pub fn kind(&self) -> FailureKind {
        match self {
            ExtractError::Provider(_) | ExtractError::ContextExhausted { .. } => {
                FailureKind::Provider
            }
            ExtractError::Malformed(_) => FailureKind::MalformedResponse,
        }
    }
}
