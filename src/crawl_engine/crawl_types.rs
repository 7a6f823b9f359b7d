//! Error, counter and outcome types of a listing crawl.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::fetcher::FetchError;
use crate::page_extractor::ParseError;
use crate::run_store::{ArtifactError, RunId};

/// Conditions that end a crawl
///
/// Everything else (a bad page, a broken collective) is counted in
/// [`CrawlStats`] and the crawl carries on.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The first results page never arrived
    #[error("First results page {url} could not be fetched: {source}")]
    FirstPage {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("First results page {url} returned HTTP {status}")]
    FirstPageStatus { url: String, status: u16 },

    /// The advertised total result count could not be read
    #[error("Total result count unavailable: {0}")]
    TotalsUnavailable(#[source] ParseError),

    /// The last page index could not be read, so the page loop has no bound
    #[error("Last page index unavailable: {0}")]
    LastPageUnavailable(#[source] ParseError),

    #[error("Cannot build listing URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to write URL artifact: {0}")]
    Artifact(#[from] ArtifactError),
}

impl CrawlError {
    /// Sort a totals parse failure into the right fatal condition
    pub(crate) fn from_totals(error: ParseError) -> Self {
        let last_page = match &error {
            ParseError::MissingElement { field, .. } => *field == "last_page",
            ParseError::InvalidNumber { what, .. } => *what == "last page index",
        };
        if last_page {
            Self::LastPageUnavailable(error)
        } else {
            Self::TotalsUnavailable(error)
        }
    }
}

/// Live counters of a crawl, shared by every page task
#[derive(Debug, Default)]
pub struct CrawlStats {
    pub pages_total: AtomicUsize,
    pub pages_ok: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub pages_drifted: AtomicUsize,
    pub cards_parsed: AtomicUsize,
    pub cards_foreign: AtomicUsize,
    pub cards_duplicate: AtomicUsize,
    pub cards_unidentified: AtomicUsize,
    pub collectives_resolved: AtomicUsize,
    pub collectives_failed: AtomicUsize,
    pub urls_saved: AtomicUsize,
}

impl CrawlStats {
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
    pub fn snapshot(&self) -> CrawlStatsSnapshot {
        CrawlStatsSnapshot {
            pages_total: self.pages_total.load(Ordering::SeqCst),
            pages_ok: self.pages_ok.load(Ordering::SeqCst),
            pages_failed: self.pages_failed.load(Ordering::SeqCst),
            pages_drifted: self.pages_drifted.load(Ordering::SeqCst),
            cards_parsed: self.cards_parsed.load(Ordering::SeqCst),
            cards_foreign: self.cards_foreign.load(Ordering::SeqCst),
            cards_duplicate: self.cards_duplicate.load(Ordering::SeqCst),
            cards_unidentified: self.cards_unidentified.load(Ordering::SeqCst),
            collectives_resolved: self.collectives_resolved.load(Ordering::SeqCst),
            collectives_failed: self.collectives_failed.load(Ordering::SeqCst),
            urls_saved: self.urls_saved.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStatsSnapshot {
    /// Result pages the crawl set out to visit
    pub pages_total: usize,
    pub pages_ok: usize,
    /// Pages that could not be fetched or did not return 200
    pub pages_failed: usize,
    /// Pages fetched fine but with no recognisable cards
    pub pages_drifted: usize,
    pub cards_parsed: usize,
    pub cards_foreign: usize,
    pub cards_duplicate: usize,
    /// Cards with no link or no numeric id in it
    pub cards_unidentified: usize,
    pub collectives_resolved: usize,
    /// Collective cards that contributed nothing
    pub collectives_failed: usize,
    pub urls_saved: usize,
}

impl CrawlStatsSnapshot {
    /// Items lost to failures rather than filtered on purpose
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.pages_failed + self.pages_drifted + self.cards_unidentified + self.collectives_failed
    }
}

/// What a finished (or cancelled) crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub run_id: RunId,
    pub artifact_path: PathBuf,
    /// Advertised total result count from the first page
    pub advertised_results: u64,
    /// Last page index advertised by the site
    pub last_page: u32,
    pub stats: CrawlStatsSnapshot,
    pub elapsed: Duration,
    /// The operator stopped the crawl; the artifact holds what was gathered
    pub cancelled: bool,
}
