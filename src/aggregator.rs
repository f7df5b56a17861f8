//! # Aggregation Module
//!
//! Merges extracted records: chunk results into page records, and page
//! records into one bucket per domain. Buckets are finalized once every URL
//! of the run has been processed, at which point provenance is attached.
//!
//! ## Provenance
//!
//! Two modes are supported. `DomainUrls` attaches the full list of URLs
//! processed for a domain to every record of that domain. `OriginatingUrl`
//! attaches only the URL of the page that produced the record.

mod domain;

pub use domain::{UNKNOWN_DOMAIN, domain_name};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::extraction::{ExtractionResult, Record};

/// Attribute under which provenance is stored on each record
pub const SOURCE_URL_KEY: &str = "source_url";

/// How source URLs are attached to finalized records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProvenanceMode {
    /// Every record gets all URLs processed for its domain
    #[default]
    DomainUrls,
    /// Every record gets the URL of the page it came from
    OriginatingUrl,
}

/// Records extracted from one page, in chunk order
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecords {
    /// URL of the page
    pub url: String,
    /// Records from all chunks of the page
    pub listings: Vec<Record>,
}

impl PageRecords {
    /// Concatenate per-chunk results in order, skipping empty ones
    pub fn from_chunks(
        url: impl Into<String>,
        results: impl IntoIterator<Item = ExtractionResult>,
    ) -> Self {
        let listings = results
            .into_iter()
            .filter(|result| !result.is_empty())
            .flat_map(|result| result.listings)
            .collect();
        Self {
            url: url.into(),
            listings,
        }
    }
}

/// A finalized per-domain dataset, ready for persistence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainDataset {
    /// Domain name
    pub domain: String,
    /// URLs processed for the domain, in processing order
    pub urls: Vec<String>,
    /// Records with provenance attached
    pub result: ExtractionResult,
}

#[derive(Debug, Default)]
struct DomainBucket {
    /// Index into the domain's URL list for each record
    records: Vec<(usize, Record)>,
}

/// Accumulates records per domain for one run
#[derive(Debug, Default)]
pub struct Aggregator {
    mode: ProvenanceMode,
    urls: IndexMap<String, IndexSet<String>>,
    buckets: IndexMap<String, DomainBucket>,
}

impl Aggregator {
    /// Create an empty aggregator
    pub fn new(mode: ProvenanceMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Add a processed page. A page without records still counts as a
    /// processed URL of its domain but creates no bucket.
    /// A URL seen twice is listed once; the records of both visits are kept.
    pub fn add_page(&mut self, page: PageRecords) {
        let domain = domain_name(&page.url);
        let urls = self.urls.entry(domain.clone()).or_default();
        let (url_index, _) = urls.insert_full(page.url);

        if page.listings.is_empty() {
            debug!("No records for domain {}", domain);
            return;
        }

        let bucket = self.buckets.entry(domain).or_default();
        bucket
            .records
            .extend(page.listings.into_iter().map(|record| (url_index, record)));
    }

    /// Domains with at least one record, in first-seen order
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Number of records collected for a domain
    pub fn record_count(&self, domain: &str) -> usize {
        self.buckets
            .get(domain)
            .map(|bucket| bucket.records.len())
            .unwrap_or(0)
    }

    /// Attach provenance and hand out one dataset per domain with records
    pub fn finalize(self) -> Vec<DomainDataset> {
        let Aggregator {
            mode,
            mut urls,
            buckets,
        } = self;

        buckets
            .into_iter()
            .map(|(domain, bucket)| {
                let domain_urls: Vec<String> = urls
                    .swap_remove(&domain)
                    .map(|set| set.into_iter().collect())
                    .unwrap_or_default();
                let all_urls = Value::Array(
                    domain_urls.iter().cloned().map(Value::String).collect(),
                );

                let listings = bucket
                    .records
                    .into_iter()
                    .map(|(url_index, mut record)| {
                        let provenance = match mode {
                            ProvenanceMode::DomainUrls => all_urls.clone(),
                            ProvenanceMode::OriginatingUrl => domain_urls
                                .get(url_index)
                                .cloned()
                                .map(Value::String)
                                .unwrap_or(Value::Null),
                        };
                        record.insert(SOURCE_URL_KEY.to_string(), provenance);
                        record
                    })
                    .collect();

                DomainDataset {
                    domain,
                    urls: domain_urls,
                    result: ExtractionResult::from_listings(listings),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("record must be an object"),
        }
    }

    fn page(url: &str, records: Vec<Value>) -> PageRecords {
        PageRecords {
            url: url.to_string(),
            listings: records.into_iter().map(record).collect(),
        }
    }

    #[test]
    fn test_page_records_from_chunks() {
        let chunks = vec![
            ExtractionResult::from_listings(vec![record(json!({"x": 1}))]),
            ExtractionResult::default(),
            ExtractionResult::from_listings(vec![record(json!({"x": 2})), record(json!({"x": 3}))]),
        ];

        let page = PageRecords::from_chunks("https://a.com/1", chunks);
        let xs: Vec<_> = page.listings.iter().map(|r| r["x"].clone()).collect();
        assert_eq!(xs, vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_same_domain_pages_merge_in_order() {
        let mut aggregator = Aggregator::new(ProvenanceMode::DomainUrls);
        aggregator.add_page(page("https://www.shop.com/a", vec![json!({"x": 1})]));
        aggregator.add_page(page("https://shop.com/b", vec![json!({"x": 2})]));

        let datasets = aggregator.finalize();
        assert_eq!(datasets.len(), 1);
        let dataset = &datasets[0];
        assert_eq!(dataset.domain, "shop.com");

        let urls = json!(["https://www.shop.com/a", "https://shop.com/b"]);
        assert_eq!(
            serde_json::to_value(&dataset.result).unwrap(),
            json!({"listings": [
                {"x": 1, "source_url": urls},
                {"x": 2, "source_url": urls}
            ]})
        );
    }

    #[test]
    fn test_originating_url_mode() {
        let mut aggregator = Aggregator::new(ProvenanceMode::OriginatingUrl);
        aggregator.add_page(page("https://shop.com/a", vec![json!({"x": 1})]));
        aggregator.add_page(page("https://shop.com/b", vec![json!({"x": 2})]));

        let datasets = aggregator.finalize();
        let listings = &datasets[0].result.listings;
        assert_eq!(listings[0][SOURCE_URL_KEY], "https://shop.com/a");
        assert_eq!(listings[1][SOURCE_URL_KEY], "https://shop.com/b");
    }

    #[test]
    fn test_empty_pages_do_not_block_domain() {
        let mut aggregator = Aggregator::new(ProvenanceMode::DomainUrls);
        aggregator.add_page(page("https://shop.com/empty", vec![]));
        aggregator.add_page(page("https://other.org/empty", vec![]));
        aggregator.add_page(page("https://shop.com/full", vec![json!({"x": 1})]));

        assert_eq!(aggregator.domains().collect::<Vec<_>>(), vec!["shop.com"]);
        assert_eq!(aggregator.record_count("shop.com"), 1);
        assert_eq!(aggregator.record_count("other.org"), 0);

        let datasets = aggregator.finalize();
        assert_eq!(datasets.len(), 1);
        assert_eq!(
            datasets[0].urls,
            vec!["https://shop.com/empty", "https://shop.com/full"]
        );
    }

    #[test]
    fn test_domains_keep_first_seen_order() {
        let mut aggregator = Aggregator::new(ProvenanceMode::DomainUrls);
        aggregator.add_page(page("https://b.com/", vec![json!({"x": 1})]));
        aggregator.add_page(page("https://a.com/", vec![json!({"x": 2})]));
        aggregator.add_page(page("https://b.com/2", vec![json!({"x": 3})]));

        let domains: Vec<_> = aggregator
            .finalize()
            .into_iter()
            .map(|d| (d.domain, d.result.listings.len()))
            .collect();
        assert_eq!(domains, vec![("b.com".to_string(), 2), ("a.com".to_string(), 1)]);
    }

    #[test]
    fn test_duplicate_urls_listed_once() {
        let mut aggregator = Aggregator::new(ProvenanceMode::DomainUrls);
        aggregator.add_page(page("https://shop.com/a", vec![json!({"x": 1})]));
        aggregator.add_page(page("https://shop.com/a", vec![json!({"x": 2})]));

        let datasets = aggregator.finalize();
        let dataset = &datasets[0];
        assert_eq!(dataset.urls, vec!["https://shop.com/a"]);
        assert_eq!(dataset.result.listings.len(), 2);
        for listing in &dataset.result.listings {
            assert_eq!(listing[SOURCE_URL_KEY], json!(["https://shop.com/a"]));
        }
    }

    #[test]
    fn test_model_source_url_is_overwritten() {
        let mut aggregator = Aggregator::new(ProvenanceMode::OriginatingUrl);
        aggregator.add_page(page(
            "https://shop.com/a",
            vec![json!({"x": 1, "source_url": "made up"})],
        ));

        let datasets = aggregator.finalize();
        assert_eq!(datasets[0].result.listings[0][SOURCE_URL_KEY], "https://shop.com/a");
    }
}
