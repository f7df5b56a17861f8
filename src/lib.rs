//! # Gleaner - LLM-Driven Structured Extraction from Web Pages
//!
//! This crate fetches web pages, converts them to Markdown, splits the text
//! into token-bounded chunks and asks a chat completion model to extract
//! records with a caller-chosen set of fields. Records are merged per domain
//! and written out as JSON and CSV.
//!
//! ## Features
//!
//! - Single page fetching with randomized user agents and a load timeout
//! - Sentence-based chunking against an estimated token budget
//! - OpenAI-compatible providers (Together, Groq) with request spacing
//! - Tolerant parsing of model output (code fences, stray prose)
//! - Per-domain aggregation with source URL provenance
//! - Per-unit error containment: a failing page, chunk or domain never aborts a run
//!
//! ## Example
//!
//! ```rust,no_run
//! use gleaner::config::Config;
//! use gleaner::crawler::{CrawlerConfig, SpiderFetcher};
//! use gleaner::extraction::{ExtractionSettings, Extractor};
//! use gleaner::model::client_from_config;
//! use gleaner::pipeline::{Pipeline, PipelineOptions};
//! use gleaner::storage::FileStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::builder()
//!         .urls(vec!["https://example.com/catalog".to_string()])
//!         .fields(vec!["name".to_string(), "price".to_string()])
//!         .api_key(gleaner::config::Provider::Together, "your-api-key")
//!         .build()?;
//!
//!     let extractor = Extractor::new(client_from_config(&config)?, ExtractionSettings::from(&config));
//!     let pipeline = Pipeline::new(
//!         SpiderFetcher::new(CrawlerConfig::from(&config)),
//!         extractor,
//!         FileStorage::new(&config.output_dir),
//!         PipelineOptions::from(&config),
//!     );
//!
//!     let summary = pipeline.run(&config.urls).await;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

mod error;
pub mod model;

pub mod aggregator;
pub mod config;
pub mod crawler;
pub mod extraction;
pub mod pipeline;
pub mod processor;
pub mod storage;

pub use error::FailureKind;
