//! Error types for the crawler module

use std::time::Duration;
use thiserror::Error;

/// Error type for page fetching and normalization
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// The page loaded but had no content
    #[error("page returned no content: {0}")]
    EmptyPage(String),

    /// The page did not load in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<tokio::task::JoinError> for CrawlError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Other(format!("Task join error: {}", err))
    }
}
