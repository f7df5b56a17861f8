//! # Extraction Pipeline
//!
//! Drives one run over the configured URLs:
//!
//! 1. fetch and normalize each page (sequentially)
//! 2. split the text into token-bounded chunks
//! 3. extract listings from every chunk, with bounded concurrency
//! 4. merge chunk results per page and page results per domain
//! 5. persist one dataset per domain once every URL has been processed
//!
//! Every failure is contained to its unit. A page that cannot be fetched is
//! skipped, a chunk that fails yields no records, and a domain that cannot be
//! saved is reported. The run itself always completes with a `RunSummary`.

mod summary;

pub use summary::{RunSummary, UnitFailure};

use std::sync::Arc;

use chrono::Utc;
use futures::future;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, instrument, warn};

use crate::aggregator::{Aggregator, PageRecords, ProvenanceMode};
use crate::config::Config;
use crate::crawler::PageFetcher;
use crate::error::FailureKind;
use crate::extraction::{ExtractionResult, Extractor};
use crate::model::CompletionModel;
use crate::processor::{ChunkOptions, TextChunk, chunk_text};
use crate::storage::DatasetSink;

/// Progress notifications sent while a run is in flight
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A page is about to be fetched
    PageStarted {
        index: usize,
        total: usize,
        url: String,
    },
    /// A page was fetched and split
    PageChunked { url: String, chunks: usize },
    /// A chunk finished, successfully or not
    ChunkFinished { url: String, position: usize },
    /// A page was fully processed
    PageFinished { url: String, records: usize },
    /// A page could not be fetched
    PageSkipped { url: String },
    /// A domain dataset was written
    DomainSaved { domain: String, records: usize },
}

/// Knobs for a run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Chunking budget
    pub chunk: ChunkOptions,
    /// How provenance is attached
    pub provenance: ProvenanceMode,
    /// Maximum chunks in flight per page
    pub concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk: ChunkOptions::default(),
            provenance: ProvenanceMode::default(),
            concurrency: 1,
        }
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            chunk: ChunkOptions::from(config),
            provenance: config.provenance,
            concurrency: config.concurrency.max(1),
        }
    }
}

/// One run's collaborators
pub struct Pipeline<F, M, S>
where
    F: PageFetcher,
    M: CompletionModel,
    S: DatasetSink,
{
    fetcher: F,
    extractor: Extractor<M>,
    sink: S,
    options: PipelineOptions,
    progress: Option<mpsc::Sender<ProgressEvent>>,
}

impl<F, M, S> Pipeline<F, M, S>
where
    F: PageFetcher,
    M: CompletionModel,
    S: DatasetSink,
{
    /// Create a pipeline
    pub fn new(fetcher: F, extractor: Extractor<M>, sink: S, options: PipelineOptions) -> Self {
        Self {
            fetcher,
            extractor,
            sink,
            options,
            progress: None,
        }
    }

    /// Send progress events to `sender`. The channel closes when the pipeline is dropped.
    pub fn with_progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    async fn notify(&self, event: ProgressEvent) {
        if let Some(sender) = &self.progress {
            // Ignore errors from sending (e.g., if receiver is dropped)
            let _ = sender.send(event).await;
        }
    }

    /// Process every URL and persist the per-domain datasets
    #[instrument(skip(self, urls), fields(urls = urls.len()))]
    pub async fn run(&self, urls: &[String]) -> RunSummary {
        let mut summary = RunSummary::start();
        let mut aggregator = Aggregator::new(self.options.provenance);

        for (index, url) in urls.iter().enumerate() {
            summary.pages_attempted += 1;
            self.notify(ProgressEvent::PageStarted {
                index,
                total: urls.len(),
                url: url.clone(),
            })
            .await;

            match self.process_page(url, &mut summary).await {
                Some(page) => {
                    summary.pages_fetched += 1;
                    let records = page.listings.len();
                    aggregator.add_page(page);
                    self.notify(ProgressEvent::PageFinished {
                        url: url.clone(),
                        records,
                    })
                    .await;
                }
                None => {
                    summary.pages_skipped += 1;
                    self.notify(ProgressEvent::PageSkipped { url: url.clone() })
                        .await;
                }
            }
        }

        if self.options.provenance == ProvenanceMode::DomainUrls {
            info!(
                "Attaching every URL processed for a domain as source_url of each of its records"
            );
        }

        for domain in aggregator.domains() {
            let count = aggregator.record_count(domain);
            info!("Domain {}: {} records", domain, count);
            summary.records_per_domain.insert(domain.to_string(), count);
        }

        for dataset in aggregator.finalize() {
            match self.sink.save(&dataset).await {
                Ok(files) => {
                    self.notify(ProgressEvent::DomainSaved {
                        domain: dataset.domain.clone(),
                        records: dataset.result.listings.len(),
                    })
                    .await;
                    summary.saved.insert(dataset.domain, files);
                }
                Err(e) => {
                    error!("Failed to save results for {}: {}", dataset.domain, e);
                    summary.record_failure(FailureKind::Persistence, dataset.domain, e);
                }
            }
        }

        summary.finished_at = Utc::now();
        info!(
            "Run complete: {} of {} pages fetched, {} records, {} failures",
            summary.pages_fetched,
            summary.pages_attempted,
            summary.total_records(),
            summary.failures.len()
        );
        summary
    }

    /// Fetch, chunk and extract one page. `None` means the page was skipped.
    #[instrument(skip(self, summary))]
    async fn process_page(&self, url: &str, summary: &mut RunSummary) -> Option<PageRecords> {
        let text = match self.fetcher.fetch(url).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                summary.record_failure(FailureKind::Fetch, url, e);
                return None;
            }
        };
        info!("Fetched {} ({} characters)", url, text.len());

        let chunks = chunk_text(&text, &self.options.chunk);
        info!("Split {} into {} chunks", url, chunks.len());
        self.notify(ProgressEvent::PageChunked {
            url: url.to_string(),
            chunks: chunks.len(),
        })
        .await;

        let results = self.extract_chunks(url, chunks, summary).await;
        let page = PageRecords::from_chunks(url, results);
        debug!("{} records from {}", page.listings.len(), url);
        Some(page)
    }

    /// Extract every chunk of a page, keeping chunk order in the output
    async fn extract_chunks(
        &self,
        url: &str,
        chunks: Vec<TextChunk>,
        summary: &mut RunSummary,
    ) -> Vec<ExtractionResult> {
        let total = chunks.len();
        summary.chunks_attempted += total;

        // Create semaphore for limiting concurrency
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            // Acquired before spawning so chunks start in order
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Failed to acquire semaphore: {}", e);
                    break;
                }
            };
            let extractor = self.extractor.clone();
            let progress = self.progress.clone();
            let url = url.to_string();

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let position = chunk.position;
                info!(
                    "Extracting chunk {}/{} of {} (~{:.0} tokens)",
                    position + 1,
                    total,
                    url,
                    chunk.estimated_tokens
                );
                let result = extractor.extract_listings(&chunk.text).await;

                if let Some(sender) = progress {
                    let _ = sender
                        .send(ProgressEvent::ChunkFinished { url, position })
                        .await;
                }
                (position, result)
            }));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for joined in future::join_all(tasks).await {
            match joined {
                Ok((_, Ok(result))) => results.push(result),
                Ok((position, Err(e))) => {
                    warn!("Chunk {} of {} produced no records: {}", position, url, e);
                    summary.chunks_failed += 1;
                    summary.record_failure(e.kind(), format!("{}#{}", url, position), e);
                }
                Err(e) => {
                    error!("Chunk task failed: {}", e);
                    summary.chunks_failed += 1;
                    summary.record_failure(FailureKind::Provider, url, e);
                }
            }
        }
        results
    }
}
