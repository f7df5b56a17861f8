//! # Run Configuration Module
//!
//! This module provides the immutable configuration value for a scraping run.
//! A `Config` is built once at process start, from files and command-line
//! overrides, and then passed by reference to every component that needs it.
//!
//! ## Key Components
//!
//! - `Config`: provider selection, credentials, chunk budget, targets and run knobs
//! - `ConfigBuilder`: builder used by the CLI and by tests; validates on `build`
//! - `Provider` / `ProviderSettings`: the closed set of completion backends
//! - `ConfigPaths` and the loaders for `config.txt`, `urls.txt` and `fields.txt`
//!
//! ## Defaulting
//!
//! A missing `config.txt` yields defaults (Together, chunk size 30000). Missing
//! or empty URL and field lists fail `build` with a `ConfigError`, which the
//! caller treats as a clean early exit.

mod error;
mod loader;
mod provider;

pub use error::ConfigError;
pub use loader::{ConfigPaths, FileSettings, load_config_file, parse_key_values, read_list};
pub use provider::{Provider, ProviderSettings, UnknownProvider};

use crate::aggregator::ProvenanceMode;
use std::path::PathBuf;
use std::time::Duration;

/// Default chunk budget in estimated tokens
pub const DEFAULT_CHUNK_SIZE: usize = 30_000;

/// Default pause between extraction requests in milliseconds
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1000;

/// Configuration for a scraping run
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected completion provider
    pub provider: Provider,

    /// Credential for Together
    pub together_api_key: String,

    /// Credential for Groq
    pub groq_api_key: String,

    /// Override for the provider endpoint
    pub endpoint_override: Option<String>,

    /// Chunk budget in estimated tokens
    pub chunk_size: usize,

    /// Pages to process, in order
    pub urls: Vec<String>,

    /// Fields the model must fill for each record
    pub fields: Vec<String>,

    /// Root directory for per-domain results
    pub output_dir: PathBuf,

    /// Minimum interval between extraction requests in milliseconds
    pub request_interval_ms: u64,

    /// Page load timeout
    pub page_timeout: Duration,

    /// Completion request timeout
    pub request_timeout: Duration,

    /// Maximum in-flight extraction requests per page
    pub concurrency: usize,

    /// Sampling temperature for extraction
    pub temperature: f64,

    /// How source URLs are attached to records
    pub provenance: ProvenanceMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Together,
            together_api_key: String::new(),
            groq_api_key: String::new(),
            endpoint_override: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            urls: Vec::new(),
            fields: Vec::new(),
            output_dir: PathBuf::from("scraping_results"),
            request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
            page_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            concurrency: 1,
            temperature: 0.1,
            provenance: ProvenanceMode::default(),
        }
    }
}

impl Config {
    /// Create a new builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Credential for the selected provider
    pub fn api_key(&self) -> &str {
        match self.provider {
            Provider::Together => &self.together_api_key,
            Provider::Groq => &self.groq_api_key,
        }
    }

    /// Endpoint, model and limits for the selected provider
    pub fn provider_settings(&self) -> ProviderSettings {
        let settings = ProviderSettings::new(self.provider, self.api_key());
        match &self.endpoint_override {
            Some(endpoint) => settings.with_endpoint(endpoint.clone()),
            None => settings,
        }
    }

    /// Get the request interval as a Duration
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from the settings, URL list and field list found at `paths`.
    ///
    /// Missing files are not errors here; empty targets are rejected by `build`.
    pub async fn from_files(paths: &ConfigPaths) -> Result<Self, ConfigError> {
        let settings = load_config_file(&paths.config).await?;
        let urls = read_list(&paths.urls, "URLs").await?;
        let fields = read_list(&paths.fields, "fields").await?;

        Ok(Self::new()
            .file_settings(settings)
            .urls(urls)
            .fields(fields))
    }

    /// Apply settings parsed from `config.txt`
    pub fn file_settings(mut self, settings: FileSettings) -> Self {
        self.config.provider = settings.provider;
        self.config.together_api_key = settings.together_api_key;
        self.config.groq_api_key = settings.groq_api_key;
        self.config.chunk_size = settings.chunk_size;
        self
    }

    /// Set the provider
    pub fn provider(mut self, provider: Provider) -> Self {
        self.config.provider = provider;
        self
    }

    /// Set the credential for a provider
    pub fn api_key(mut self, provider: Provider, key: impl Into<String>) -> Self {
        match provider {
            Provider::Together => self.config.together_api_key = key.into(),
            Provider::Groq => self.config.groq_api_key = key.into(),
        }
        self
    }

    /// Override the provider endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint_override = Some(endpoint.into());
        self
    }

    /// Set the chunk budget in estimated tokens
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Set the target URLs
    pub fn urls(mut self, urls: Vec<String>) -> Self {
        self.config.urls = urls;
        self
    }

    /// Set the target fields
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.config.fields = fields;
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = output_dir.into();
        self
    }

    /// Set the minimum interval between extraction requests
    pub fn request_interval_ms(mut self, request_interval_ms: u64) -> Self {
        self.config.request_interval_ms = request_interval_ms;
        self
    }

    /// Set the page load timeout
    pub fn page_timeout(mut self, page_timeout: Duration) -> Self {
        self.config.page_timeout = page_timeout;
        self
    }

    /// Set the completion request timeout
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.config.request_timeout = request_timeout;
        self
    }

    /// Set the number of concurrent extraction requests per page
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the provenance mode
    pub fn provenance(mut self, provenance: ProvenanceMode) -> Self {
        self.config.provenance = provenance;
        self
    }

    /// Build the configuration, rejecting runs with nothing to do
    pub fn build(self) -> Result<Config, ConfigError> {
        if self.config.urls.is_empty() {
            return Err(ConfigError::MissingUrls);
        }
        if self.config.fields.is_empty() {
            return Err(ConfigError::MissingFields);
        }
        Ok(self.config)
    }
}
