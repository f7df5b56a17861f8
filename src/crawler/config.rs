//! # Fetcher Configuration Module
//!
//! Configuration for fetching single pages: load timeout, client identity and
//! the elements stripped before text conversion. Uses a builder like the rest
//! of the crate's configuration.

use std::time::Duration;

use crate::config::Config;

/// Configuration for the page fetcher
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Page load timeout
    pub page_timeout: Duration,

    /// Whether to respect robots.txt
    pub respect_robots_txt: bool,

    /// Fixed user agent; when `None` a random one is picked per request
    pub user_agent: Option<String>,

    /// CSS selectors for elements removed before conversion
    pub strip_selectors: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(30),
            respect_robots_txt: false,
            user_agent: None,
            strip_selectors: vec![
                "script".to_string(),
                "style".to_string(),
                "iframe".to_string(),
                "meta".to_string(),
            ],
        }
    }
}

impl From<&Config> for CrawlerConfig {
    fn from(config: &Config) -> Self {
        CrawlerConfig::builder()
            .page_timeout(config.page_timeout)
            .build()
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the page load timeout
    pub fn page_timeout(mut self, page_timeout: Duration) -> Self {
        self.config.page_timeout = page_timeout;
        self
    }

    /// Set whether to respect robots.txt
    pub fn respect_robots_txt(mut self, respect_robots_txt: bool) -> Self {
        self.config.respect_robots_txt = respect_robots_txt;
        self
    }

    /// Use a fixed user agent instead of a random one
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set the CSS selectors for elements removed before conversion
    pub fn strip_selectors(mut self, strip_selectors: Vec<String>) -> Self {
        self.config.strip_selectors = strip_selectors;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.page_timeout, Duration::from_secs(30));
        assert!(config.user_agent.is_none());
        assert_eq!(config.strip_selectors, vec!["script", "style", "iframe", "meta"]);
    }

    #[test]
    fn test_builder() {
        let config = CrawlerConfig::builder()
            .page_timeout(Duration::from_secs(5))
            .respect_robots_txt(true)
            .user_agent("gleaner-test")
            .build();
        assert_eq!(config.page_timeout, Duration::from_secs(5));
        assert!(config.respect_robots_txt);
        assert_eq!(config.user_agent.as_deref(), Some("gleaner-test"));
    }
}
