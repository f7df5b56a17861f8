//! # Extraction Module
//!
//! Turns one chunk of page text into structured records: builds the prompt,
//! sizes the output budget, calls the completion model and normalizes the
//! answer into an [`ExtractionResult`].
//!
//! ## Key Components
//!
//! - `Extractor`: prompt construction and the provider call for one chunk
//! - `parse_response`: payload location, decoding and normalization
//! - `ExtractionResult`: the canonical `{"listings": [...]}` shape
//!
//! Provider failures are returned as `ExtractError`; the pipeline decides to
//! count them as zero records and move on.

mod error;
mod parser;
mod prompt;

pub use error::{ExtractError, ParseError};
pub use parser::{normalize, parse_response, select_payload, try_parse_response};
pub use prompt::{SYSTEM_MESSAGE, build_user_prompt, output_budget, prompt_tokens};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::model::{CompletionModel, CompletionRequest};

/// One extracted record: field name to value
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Records extracted from one chunk, page or domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted records, in model order
    #[serde(default)]
    pub listings: Vec<Record>,

    /// Any other top-level keys the model returned
    #[serde(flatten)]
    pub extra: Record,
}

impl ExtractionResult {
    /// Wrap records without extra keys
    pub fn from_listings(listings: Vec<Record>) -> Self {
        Self {
            listings,
            extra: Record::new(),
        }
    }

    /// Whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Request settings shared by every chunk of a run
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Fields the model must fill
    pub fields: Arc<[String]>,
    /// Configured output ceiling
    pub max_output_tokens: u32,
    /// Provider context window
    pub context_window: u32,
    /// Sampling temperature
    pub temperature: f64,
}

impl From<&Config> for ExtractionSettings {
    fn from(config: &Config) -> Self {
        let provider = config.provider_settings();
        Self {
            fields: config.fields.clone().into(),
            max_output_tokens: provider.max_output_tokens,
            context_window: provider.context_window,
            temperature: config.temperature,
        }
    }
}

/// Extraction client for one run
#[derive(Debug, Clone)]
pub struct Extractor<M: CompletionModel> {
    model: M,
    settings: ExtractionSettings,
}

impl<M: CompletionModel> Extractor<M> {
    /// Create an extractor over a completion model
    pub fn new(model: M, settings: ExtractionSettings) -> Self {
        Self { model, settings }
    }

    /// Settings in use
    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Build the request for a chunk, or fail if the prompt fills the context
    pub fn request_for(&self, chunk: &str) -> Result<CompletionRequest, ExtractError> {
        let prompt = build_user_prompt(&self.settings.fields, chunk);
        let tokens = prompt_tokens(SYSTEM_MESSAGE, &prompt);
        let max_tokens = output_budget(
            self.settings.max_output_tokens,
            self.settings.context_window,
            tokens,
        );

        if max_tokens == 0 {
            return Err(ExtractError::ContextExhausted {
                prompt_tokens: tokens,
                context_window: self.settings.context_window,
            });
        }

        Ok(CompletionRequest {
            preamble: SYSTEM_MESSAGE.to_string(),
            prompt,
            temperature: self.settings.temperature,
            max_tokens,
            json_mode: true,
        })
    }

    /// Send a chunk to the model and return its raw text
    #[instrument(skip(self, chunk), fields(chunk_len = chunk.len()))]
    pub async fn extract(&self, chunk: &str) -> Result<String, ExtractError> {
        let request = self.request_for(chunk)?;
        debug!("Requesting up to {} output tokens", request.max_tokens);
        let response = self.model.completion(request).await?;
        Ok(response.text)
    }

    /// Extract and parse a chunk, reporting malformed output as an error
    pub async fn extract_listings(&self, chunk: &str) -> Result<ExtractionResult, ExtractError> {
        let raw = self.extract(chunk).await?;
        Ok(try_parse_response(&raw)?)
    }
}
