//! Integration with spider library for single page fetching

use spider::website::Website;
use tracing::{debug, info, info_span, instrument, warn};

use crate::crawler::PageFetcher;
use crate::crawler::config::CrawlerConfig;
use crate::crawler::content_extraction::normalize_html;
use crate::crawler::error::CrawlError;
use crate::crawler::user_agent::random_user_agent;

/// Fetches one page per URL with spider and normalizes it to Markdown
#[derive(Debug, Clone, Default)]
pub struct SpiderFetcher {
    config: CrawlerConfig,
}

impl SpiderFetcher {
    /// Create a fetcher with the given configuration
    pub fn new(config: CrawlerConfig) -> Self {
        Self { config }
    }

    /// The fetcher configuration
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Fetch the raw HTML of a single page
    #[instrument(skip(self))]
    pub async fn fetch_html(&self, url: &str) -> Result<String, CrawlError> {
        url::Url::parse(url)?;

        let user_agent = self
            .config
            .user_agent
            .clone()
            .unwrap_or_else(|| random_user_agent().to_string());
        debug!("Fetching {} as {}", url, user_agent);

        let mut website = Website::new(url);
        website
            .configuration
            .with_respect_robots_txt(self.config.respect_robots_txt)
            .with_user_agent(Some(&user_agent))
            .with_request_timeout(Some(self.config.page_timeout))
            .with_depth(1)
            .with_limit(1);

        let mut rx = website
            .subscribe(4)
            .ok_or_else(|| CrawlError::Other("Failed to subscribe to website".to_string()))?;
        let handle = tokio::spawn(async move {
            let mut html = None;
            while let Ok(page) = rx.recv().await {
                let _page_span = info_span!("receive_page", url = %page.get_url());
                if html.is_none() {
                    html = Some(page.get_html());
                }
            }
            html
        });

        // Hard bound on top of the request timeout, covering redirects and rendering
        let deadline = self.config.page_timeout * 2;
        let crawled = tokio::time::timeout(deadline, website.crawl()).await;
        website.unsubscribe();
        let html = handle.await?;

        if crawled.is_err() {
            warn!("Fetching {} exceeded {:?}", url, deadline);
            return Err(CrawlError::Timeout(deadline));
        }

        match html {
            Some(html) if !html.trim().is_empty() => {
                info!("Fetched {} ({} bytes)", url, html.len());
                Ok(html)
            }
            _ => Err(CrawlError::EmptyPage(url.to_string())),
        }
    }
}

impl PageFetcher for SpiderFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CrawlError> {
        let html = self.fetch_html(url).await?;
        let text = normalize_html(&html, &self.config.strip_selectors);
        if text.trim().is_empty() {
            return Err(CrawlError::EmptyPage(url.to_string()));
        }
        Ok(text)
    }
}
