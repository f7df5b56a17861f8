//! # Page Fetching Module
//!
//! Turns a URL into the cleaned Markdown text that the chunker consumes.
//! Each URL is loaded as a single page (no link following) with a randomized
//! browser identity and a bounded load timeout. Scripts, styles, frames and
//! metadata are removed before the HTML is converted.
//!
//! The pipeline only depends on the `PageFetcher` trait, so tests can swap in
//! canned pages.

mod config;
mod content_extraction;
mod error;
mod spider_integration;
mod user_agent;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use content_extraction::{clean_html, html_to_markdown, normalize_html};
pub use error::CrawlError;
pub use spider_integration::SpiderFetcher;
pub use user_agent::{USER_AGENTS, random_user_agent};

use std::future::Future;

/// Source of normalized page text
pub trait PageFetcher {
    /// Load `url` and return its content as Markdown
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, CrawlError>>;
}
