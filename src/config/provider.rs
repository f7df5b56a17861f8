//! Completion provider presets
//!
//! Each provider is an OpenAI-compatible chat completion backend with its own
//! endpoint, model identifier and token ceilings. The set is closed: a provider
//! is selected once when the configuration is built.

use std::fmt;
use std::str::FromStr;

/// Known completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Together AI, 131072-token context
    #[default]
    Together,
    /// Groq, 128000-token context
    Groq,
}

impl Provider {
    /// Chat completion endpoint URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            Provider::Together => "https://api.together.xyz/v1/chat/completions",
            Provider::Groq => "https://api.groq.com/openai/v1/chat/completions",
        }
    }

    /// Model identifier sent with each request
    pub fn model(&self) -> &'static str {
        match self {
            Provider::Together => "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
            Provider::Groq => "llama-3.1-70b-versatile",
        }
    }

    /// Context window size in tokens
    pub fn context_window(&self) -> u32 {
        match self {
            Provider::Together => 131_072,
            Provider::Groq => 128_000,
        }
    }

    /// Ceiling on requested output tokens
    pub fn max_output_tokens(&self) -> u32 {
        match self {
            Provider::Together => 4096,
            Provider::Groq => 8000,
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Together => "TOGETHER_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }

    /// Key in `config.txt` holding this provider's credential
    pub fn config_key(&self) -> &'static str {
        match self {
            Provider::Together => "together_api_key",
            Provider::Groq => "groq_api_key",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Together => f.write_str("together"),
            Provider::Groq => f.write_str("groq"),
        }
    }
}

/// Returned when a provider name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "together" => Ok(Provider::Together),
            "groq" => Ok(Provider::Groq),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Everything needed to talk to the selected provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Which preset this is
    pub provider: Provider,
    /// Chat completion endpoint URL
    pub endpoint: String,
    /// Bearer credential
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Context window in tokens
    pub context_window: u32,
    /// Ceiling on requested output tokens
    pub max_output_tokens: u32,
}

impl ProviderSettings {
    /// Settings for a preset with the given credential
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            endpoint: provider.endpoint().to_string(),
            api_key: api_key.into(),
            model: provider.model().to_string(),
            context_window: provider.context_window(),
            max_output_tokens: provider.max_output_tokens(),
        }
    }

    /// Point the settings at a different endpoint (proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(Provider::Together.context_window(), 131_072);
        assert_eq!(Provider::Together.max_output_tokens(), 4096);
        assert_eq!(Provider::Groq.context_window(), 128_000);
        assert_eq!(Provider::Groq.max_output_tokens(), 8000);
        assert_eq!(Provider::default(), Provider::Together);
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!("groq".parse::<Provider>().unwrap(), Provider::Groq);
        assert_eq!(" Together ".parse::<Provider>().unwrap(), Provider::Together);
        assert!("openai".parse::<Provider>().is_err());
    }

    #[test]
    fn test_settings_from_preset() {
        let settings = ProviderSettings::new(Provider::Groq, "key")
            .with_endpoint("http://localhost:1234/chat/completions");
        assert_eq!(settings.model, "llama-3.1-70b-versatile");
        assert_eq!(settings.endpoint, "http://localhost:1234/chat/completions");
        assert_eq!(settings.api_key, "key");
    }
}
