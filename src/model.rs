//! # LLM Client Module
//!
//! This module provides the completion capability the extraction client talks
//! to, with built-in rate limiting so consecutive requests respect provider
//! quotas.
//!
//! ## Key Components
//!
//! - `CompletionModel`: the `complete(system, user, ...)` capability
//! - `ChatCompletionModel`: OpenAI-compatible HTTP backend (Together, Groq)
//! - `RateLimitedCompletionModel`: a wrapper that spaces requests with `governor`
//! - `MockCompletionModel`: scripted replies for tests
//!
//! ## Features
//!
//! - One backend implementation for every preset in `config::Provider`
//! - JSON response mode and low temperature for literal extraction
//! - Instrumentation with tracing spans for monitoring

use std::future::Future;
use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use serde::Deserialize;

use crate::config::Config;

mod error;
pub mod mock_model;
pub mod openai_compat;
pub mod ratelimited_completion;

pub use error::CompletionError;
pub use mock_model::MockCompletionModel;
pub use openai_compat::ChatCompletionModel;
pub use ratelimited_completion::RateLimitedCompletionModel;

/// A single chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction
    pub preamble: String,

    /// User instruction
    pub prompt: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Ceiling on generated tokens
    pub max_tokens: u32,

    /// Ask the provider for a JSON object response
    pub json_mode: bool,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Tokens generated
    #[serde(default)]
    pub completion_tokens: u64,
}

/// The text produced for a request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Trimmed assistant message content
    pub text: String,

    /// Token accounting, when the provider reports it
    pub usage: Option<Usage>,
}

/// A chat completion backend
pub trait CompletionModel: Clone + Send + Sync + 'static {
    /// Send one request and return the assistant's text
    fn completion(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, CompletionError>> + Send;
}

/// The client used for a real run
pub type Client = RateLimitedCompletionModel<ChatCompletionModel>;

/// Build the rate-limited client for the provider selected in `config`
pub fn client_from_config(config: &Config) -> Result<Client, CompletionError> {
    let model = ChatCompletionModel::new(config.provider_settings(), config.request_timeout)?;
    let quota = Quota::with_period(config.request_interval())
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
    Ok(RateLimitedCompletionModel::new(model, RateLimiter::direct(quota)))
}
