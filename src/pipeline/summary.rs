//! Run accounting

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::FailureKind;
use crate::storage::SavedFiles;

/// A unit of work that produced nothing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFailure {
    /// Failure category
    pub kind: FailureKind,
    /// The URL, `url#chunk` or domain that failed
    pub unit: String,
    /// Human readable cause
    pub detail: String,
}

/// What happened during one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_attempted: usize,
    pub pages_fetched: usize,
    pub pages_skipped: usize,
    pub chunks_attempted: usize,
    pub chunks_failed: usize,
    /// Record counts for every domain that yielded records
    pub records_per_domain: IndexMap<String, usize>,
    /// Files written per domain
    pub saved: IndexMap<String, SavedFiles>,
    pub failures: Vec<UnitFailure>,
}

impl RunSummary {
    pub(crate) fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            pages_attempted: 0,
            pages_fetched: 0,
            pages_skipped: 0,
            chunks_attempted: 0,
            chunks_failed: 0,
            records_per_domain: IndexMap::new(),
            saved: IndexMap::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        kind: FailureKind,
        unit: impl Into<String>,
        detail: impl ToString,
    ) {
        self.failures.push(UnitFailure {
            kind,
            unit: unit.into(),
            detail: detail.to_string(),
        });
    }

    /// Total records across all domains
    pub fn total_records(&self) -> usize {
        self.records_per_domain.values().sum()
    }

    /// Failures of one kind
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &UnitFailure> {
        self.failures.iter().filter(move |failure| failure.kind == kind)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        writeln!(
            f,
            "Run finished in {:.1}s",
            elapsed.num_milliseconds() as f64 / 1000.0
        )?;
        writeln!(
            f,
            "Pages: {} attempted, {} fetched, {} skipped",
            self.pages_attempted, self.pages_fetched, self.pages_skipped
        )?;
        writeln!(
            f,
            "Chunks: {} attempted, {} failed",
            self.chunks_attempted, self.chunks_failed
        )?;
        for (domain, count) in &self.records_per_domain {
            writeln!(f, "  {}: {} records", domain, count)?;
        }
        for (domain, files) in &self.saved {
            write!(f, "  saved {} -> {}", domain, files.json.display())?;
            if let Some(csv) = &files.csv {
                write!(f, ", {}", csv.display())?;
            }
            writeln!(f)?;
        }
        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for failure in &self.failures {
                writeln!(f, "  [{}] {}: {}", failure.kind, failure.unit, failure.detail)?;
            }
        }
        Ok(())
    }
}
