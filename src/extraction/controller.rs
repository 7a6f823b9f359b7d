//! Extraction controller
//!
//! Loads a run's URL set, fetches every URL and hands the record table to a
//! sink. A per-URL failure is logged with the URL's 1-based ordinal in the
//! artifact, counted and skipped.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::sink::RecordSink;
use super::{ExtractError, ExtractionOutcome, ExtractionStats, ExtractionStatsSnapshot};
use crate::config::ScrapeConfig;
use crate::fetcher::{FetchError, PageFetcher, fetch_with_retry};
use crate::page_extractor::{CharacteristicRecord, DetailPage, ParseError, RecordTable, parse_detail_page};
use crate::run_store::{RunId, latest_url_artifact, read_url_artifact};

/// Read the URL set of `run`, or of the latest run when `None`
///
/// # Errors
///
/// Fails when no artifact exists (or the named one is missing) or it cannot
/// be read.
pub async fn load_url_set(
    config: &ScrapeConfig,
    run: Option<RunId>,
) -> Result<(RunId, Vec<Url>), ExtractError> {
    let urls_dir = config.urls_dir();
    let run_id = match run {
        Some(run_id) => run_id,
        None => latest_url_artifact(&urls_dir).await?,
    };
    let urls = read_url_artifact(&urls_dir, &run_id).await?;
    tracing::info!(run_id = %run_id, urls = urls.len(), "Loaded URL set");
    Ok((run_id, urls))
}

/// Records gathered from a list of URLs
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    /// Records in URL order
    pub table: RecordTable,
    pub stats: ExtractionStatsSnapshot,
    pub cancelled: bool,
}

enum UrlOutcome {
    Parsed(DetailPage),
    NonOk(u16),
    FetchFailed(FetchError),
    Unparsable(ParseError),
}

async fn fetch_detail<F: PageFetcher>(fetcher: &F, config: &ScrapeConfig, url: &Url) -> UrlOutcome {
    let page = match fetch_with_retry(fetcher, url, &config.retry_config()).await {
        Ok(page) => page,
        Err(e) => return UrlOutcome::FetchFailed(e),
    };
    if !page.is_ok() {
        return UrlOutcome::NonOk(page.status);
    }
    let document = page.document();
    match parse_detail_page(&document, config.selectors()) {
        Ok(detail) => UrlOutcome::Parsed(detail),
        Err(e) => UrlOutcome::Unparsable(e),
    }
}

/// Fetch and parse every URL with bounded concurrency
///
/// Cancellation stops scheduling new URLs; in-flight ones complete and
/// their records are kept.
pub async fn collect_records<F: PageFetcher>(
    config: &ScrapeConfig,
    fetcher: &F,
    urls: &[Url],
    cancel: &CancellationToken,
) -> RecordBatch {
    let stats = ExtractionStats::new();
    let interval = config.progress_interval();
    let concurrency = config.max_concurrent_requests();

    let mut pending = urls.iter().enumerate();
    let mut active = FuturesUnordered::new();
    let mut gathered: Vec<(usize, CharacteristicRecord)> = Vec::new();
    let mut cancelled = false;
    let mut batch_started = Instant::now();

    loop {
        while !cancelled && active.len() < concurrency {
            if cancel.is_cancelled() && pending.len() > 0 {
                tracing::info!(
                    remaining = pending.len(),
                    "Cancellation requested, finishing in-flight URLs"
                );
                cancelled = true;
                break;
            }
            let Some((index, url)) = pending.next() else {
                break;
            };
            active.push(async move { (index + 1, url, fetch_detail(fetcher, config, url).await) });
        }

        let Some((ordinal, url, outcome)) = active.next().await else {
            break;
        };

        match outcome {
            UrlOutcome::Parsed(detail) => {
                if !detail.title.has_locality_marker {
                    tracing::warn!(ordinal, url = %url, "Title has no locality marker");
                    ExtractionStats::bump(&stats.title_unparsed);
                }
                ExtractionStats::bump(&stats.records);
                gathered.push((ordinal, detail.record));
            }
            UrlOutcome::NonOk(status) => {
                tracing::warn!(ordinal, url = %url, status, "Skipping URL: non-200 response");
                ExtractionStats::bump(&stats.non_200);
            }
            UrlOutcome::FetchFailed(e) => {
                tracing::warn!(ordinal, url = %url, error = %e, "Skipping URL: fetch failed");
                ExtractionStats::bump(&stats.fetch_failed);
            }
            UrlOutcome::Unparsable(e) => {
                tracing::warn!(ordinal, url = %url, error = %e, "Skipping URL: no characteristics block");
                ExtractionStats::bump(&stats.missing_characteristics);
            }
        }

        let processed = ExtractionStats::bump(&stats.urls_processed);
        if processed % interval == 0 {
            tracing::info!(
                urls_processed = processed,
                urls_total = urls.len(),
                records = gathered.len(),
                batch_secs = batch_started.elapsed().as_secs_f64(),
                "Extraction progress"
            );
            batch_started = Instant::now();
        }
    }

    gathered.sort_by_key(|(ordinal, _)| *ordinal);
    RecordBatch {
        table: gathered.into_iter().map(|(_, record)| record).collect(),
        stats: stats.snapshot(),
        cancelled,
    }
}

/// Extract every URL of a run and persist the record table
///
/// The table is written under the same run id as the URL artifact it came
/// from, also when the run was cancelled part-way.
///
/// # Errors
///
/// Fails only when the URL set cannot be loaded or the sink cannot write.
pub async fn extract_records<F: PageFetcher, S: RecordSink>(
    config: &ScrapeConfig,
    fetcher: &F,
    run: Option<RunId>,
    sink: &mut S,
    cancel: &CancellationToken,
) -> Result<ExtractionOutcome, ExtractError> {
    let start_time = Instant::now();
    let (run_id, urls) = load_url_set(config, run).await?;

    let batch = collect_records(config, fetcher, &urls, cancel).await;
    let columns = batch.table.columns().len();
    let record_path = sink
        .write_table(&run_id, &batch.table)
        .await
        .map_err(ExtractError::Sink)?;
    let elapsed = start_time.elapsed();

    tracing::info!(
        run_id = %run_id,
        path = %record_path.display(),
        urls_total = urls.len(),
        records = batch.stats.records,
        columns,
        non_200 = batch.stats.non_200,
        fetch_failed = batch.stats.fetch_failed,
        missing_characteristics = batch.stats.missing_characteristics,
        title_unparsed = batch.stats.title_unparsed,
        elapsed_secs = elapsed.as_secs_f64(),
        cancelled = batch.cancelled,
        "Extraction finished"
    );

    Ok(ExtractionOutcome {
        run_id,
        record_path,
        urls_total: urls.len(),
        columns,
        stats: batch.stats,
        elapsed,
        cancelled: batch.cancelled,
    })
}
