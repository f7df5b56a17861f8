//! Content extraction functionality for the crawler module

use std::sync::LazyLock;

use html2md::parse_html;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{instrument, warn};

use crate::crawler::error::CrawlError;

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid blank line pattern"));

/// Clean HTML by removing the elements matched by `strip_selectors`
///
/// # Arguments
///
/// * `html` - The HTML to clean
/// * `strip_selectors` - CSS selectors for elements to remove entirely
///
/// # Returns
///
/// The cleaned HTML as a string
pub fn clean_html(html: &str, strip_selectors: &[String]) -> Result<String, CrawlError> {
    let mut document = Html::parse_document(html);

    for selector_str in strip_selectors {
        let selector = Selector::parse(selector_str).map_err(|e| {
            CrawlError::HtmlParse(format!("Failed to parse selector '{}': {}", selector_str, e))
        })?;

        let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    Ok(document.html())
}

/// Convert HTML to Markdown, keeping links and images and without hard wrapping
pub fn html_to_markdown(html: &str) -> String {
    let markdown = parse_html(html);
    BLANK_LINES.replace_all(markdown.trim(), "\n\n").into_owned()
}

/// Clean a page and convert it to the text handed to the chunker
///
/// An invalid selector is skipped with a warning rather than failing the page.
#[instrument(skip(html, strip_selectors), fields(len = html.len()))]
pub fn normalize_html(html: &str, strip_selectors: &[String]) -> String {
    let cleaned = match clean_html(html, strip_selectors) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            warn!("{}; converting the page without cleaning", e);
            html.to_string()
        }
    };
    html_to_markdown(&cleaned)
}
