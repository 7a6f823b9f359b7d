//! Characteristic label survey
//!
//! Fetches a prefix of a URL set and lists every distinct characteristic
//! label the site exposed, to see the current schema before a full run.

use indexmap::IndexSet;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::ExtractionStatsSnapshot;
use super::controller::collect_records;
use crate::config::ScrapeConfig;
use crate::fetcher::PageFetcher;

#[derive(Debug, Clone, Serialize)]
pub struct SurveyReport {
    pub urls_surveyed: usize,
    /// Distinct labels in first-seen order (URL order, then page order)
    pub labels: Vec<String>,
    pub stats: ExtractionStatsSnapshot,
    pub cancelled: bool,
}

/// Survey the first `limit` URLs of `urls`
pub async fn survey_labels<F: PageFetcher>(
    config: &ScrapeConfig,
    fetcher: &F,
    urls: &[Url],
    limit: usize,
    cancel: &CancellationToken,
) -> SurveyReport {
    let prefix = &urls[..limit.min(urls.len())];
    let batch = collect_records(config, fetcher, prefix, cancel).await;

    let labels: IndexSet<&str> = batch
        .table
        .records()
        .iter()
        .flat_map(|record| record.characteristics.keys().map(String::as_str))
        .collect();

    SurveyReport {
        urls_surveyed: prefix.len(),
        labels: labels.into_iter().map(str::to_string).collect(),
        stats: batch.stats,
        cancelled: batch.cancelled,
    }
}
