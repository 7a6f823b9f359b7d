//! Detail extraction over a crawl run's URL set
//!
//! Reads a URL artifact, fetches every property page, parses its
//! characteristics and hands the resulting table to a [`RecordSink`] under
//! the same run id as its source artifact.

pub mod controller;
pub mod sink;
pub mod survey;

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::run_store::{ArtifactError, RunId};

pub use controller::{RecordBatch, collect_records, extract_records, load_url_set};
pub use sink::{CsvRecordSink, RecordSink};
pub use survey::{SurveyReport, survey_labels};

#[derive(Debug, Error)]
pub enum ExtractError {
    /// No usable input artifact
    #[error("Cannot load URL set: {0}")]
    Input(#[from] ArtifactError),

    /// The record table could not be written
    #[error("Failed to persist record table: {0}")]
    Sink(#[source] ArtifactError),
}

/// Live counters of an extraction run
#[derive(Debug, Default)]
pub struct ExtractionStats {
    pub urls_processed: AtomicUsize,
    pub records: AtomicUsize,
    pub non_200: AtomicUsize,
    pub fetch_failed: AtomicUsize,
    pub missing_characteristics: AtomicUsize,
    pub title_unparsed: AtomicUsize,
}

impl ExtractionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter, returning the new value
    #[inline]
    pub fn bump(counter: &AtomicUsize) -> usize {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn snapshot(&self) -> ExtractionStatsSnapshot {
        ExtractionStatsSnapshot {
            urls_processed: self.urls_processed.load(Ordering::SeqCst),
            records: self.records.load(Ordering::SeqCst),
            non_200: self.non_200.load(Ordering::SeqCst),
            fetch_failed: self.fetch_failed.load(Ordering::SeqCst),
            missing_characteristics: self.missing_characteristics.load(Ordering::SeqCst),
            title_unparsed: self.title_unparsed.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStatsSnapshot {
    pub urls_processed: usize,
    pub records: usize,
    pub non_200: usize,
    pub fetch_failed: usize,
    pub missing_characteristics: usize,
    /// Records kept although their title had no locality
    pub title_unparsed: usize,
}

impl ExtractionStatsSnapshot {
    /// URLs that produced no record
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.non_200 + self.fetch_failed + self.missing_characteristics
    }
}

/// What an extraction run produced
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Run id of the source URL artifact, shared by the record table
    pub run_id: RunId,
    pub record_path: PathBuf,
    pub urls_total: usize,
    pub columns: usize,
    pub stats: ExtractionStatsSnapshot,
    pub elapsed: Duration,
    pub cancelled: bool,
}
