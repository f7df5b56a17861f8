//! # Dataset Storage Module
//!
//! Persists finalized per-domain datasets. Each domain gets its own directory
//! under the output root holding:
//!
//! - `<domain>_results.json`: the `{"listings": [...]}` mapping, pretty printed
//! - `<domain>_results.csv`: one row per record, written only when there are
//!   records. The file starts with a UTF-8 byte order mark so spreadsheet
//!   tools pick the right encoding. The header is the union of record keys in
//!   first-seen order.

mod error;

pub use error::StorageError;

use std::future::Future;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::aggregator::DomainDataset;
use crate::extraction::{ExtractionResult, Record};

type Result<T> = std::result::Result<T, StorageError>;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Files written for one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedFiles {
    /// Structured serialization of the dataset
    pub json: PathBuf,
    /// Tabular serialization, absent when the dataset has no records
    pub csv: Option<PathBuf>,
}

/// Destination for finalized domain datasets
pub trait DatasetSink {
    /// Persist one domain's dataset
    fn save(&self, dataset: &DomainDataset) -> impl Future<Output = Result<SavedFiles>>;
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for storage
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("scraping_results"),
        }
    }
}

/// Writes datasets as JSON and CSV files
#[derive(Debug, Clone, Default)]
pub struct FileStorage {
    config: StorageConfig,
}

impl FileStorage {
    /// Create a storage rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_config(StorageConfig {
            base_path: base_path.into(),
        })
    }

    /// Create a new storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Directory holding a domain's files
    pub fn domain_dir(&self, domain: &str) -> PathBuf {
        self.config.base_path.join(domain)
    }

    /// Path of a domain's JSON file
    pub fn json_path(&self, domain: &str) -> PathBuf {
        self.domain_dir(domain)
            .join(format!("{}_results.json", domain))
    }

    /// Path of a domain's CSV file
    pub fn csv_path(&self, domain: &str) -> PathBuf {
        self.domain_dir(domain)
            .join(format!("{}_results.csv", domain))
    }

    async fn ensure_directories(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Loads a previously saved domain dataset
    pub async fn load(&self, domain: &str) -> Result<ExtractionResult> {
        let path = self.json_path(domain);
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(format!(
                "No results saved for domain {}",
                domain
            )));
        }
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl DatasetSink for FileStorage {
    #[instrument(skip(self, dataset), fields(domain = %dataset.domain, records = dataset.result.listings.len()))]
    async fn save(&self, dataset: &DomainDataset) -> Result<SavedFiles> {
        let json_path = self.json_path(&dataset.domain);
        self.ensure_directories(&json_path).await?;

        let json = serde_json::to_string_pretty(&dataset.result)?;
        fs::write(&json_path, json).await?;
        debug!("Wrote {}", json_path.display());

        let csv_path = if dataset.result.listings.is_empty() {
            None
        } else {
            let path = self.csv_path(&dataset.domain);
            fs::write(&path, listings_to_csv(&dataset.result.listings)?).await?;
            debug!("Wrote {}", path.display());
            Some(path)
        };

        info!(
            "Saved {} records for {}",
            dataset.result.listings.len(),
            dataset.domain
        );
        Ok(SavedFiles {
            json: json_path,
            csv: csv_path,
        })
    }
}

/// Union of record keys, in the order they are first seen
pub fn csv_headers(listings: &[Record]) -> Vec<String> {
    let headers: IndexSet<&String> = listings.iter().flat_map(|record| record.keys()).collect();
    headers.into_iter().cloned().collect()
}

/// Render a value as a CSV cell
pub fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Serialize records as BOM-prefixed CSV bytes
pub fn listings_to_csv(listings: &[Record]) -> Result<Vec<u8>> {
    let headers = csv_headers(listings);

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec());
    writer.write_record(&headers)?;
    for record in listings {
        writer.write_record(headers.iter().map(|key| csv_cell(record.get(key))))?;
    }
    writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))
}
