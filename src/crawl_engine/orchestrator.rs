//! Main crawl orchestration logic
//!
//! Drives one listing crawl through its phases:
//! - Discover totals from the first results page (fatal if unreadable)
//! - Page loop over pages 2..=N with bounded concurrency
//! - Finalize: write the URL artifact, also after cancellation

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, info};
use std::sync::atomic::Ordering;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::crawl_types::{CrawlError, CrawlOutcome};
use super::page_processor::{CrawlState, process_results_body, process_results_page};
use crate::config::ScrapeConfig;
use crate::fetcher::{PageFetcher, fetch_with_retry};
use crate::page_extractor::{SearchTotals, parse_search_totals};
use crate::run_store::{RunId, write_url_artifact};
use crate::utils::listing_page_url;

/// Crawl every results page and persist the deduplicated URL set
///
/// Page 1 is fetched once and serves both as the source of the result
/// totals and as the first page of cards. Pages 2..=N are then processed
/// by up to `max_concurrent_requests` tasks at a time, where N is the
/// advertised last page, capped by `page_limit`.
///
/// Cancelling `cancel` stops new pages from being scheduled; pages already
/// in flight finish and the collected URLs are still written.
///
/// # Errors
///
/// Only the first results page can fail the crawl (fetch failure, non-200,
/// unreadable totals), plus a failure to write the artifact.
pub async fn crawl_listings<F: PageFetcher>(
    config: &ScrapeConfig,
    fetcher: &F,
    run_id: RunId,
    cancel: &CancellationToken,
) -> Result<CrawlOutcome, CrawlError> {
    let start_time = Instant::now();
    let state = CrawlState::new();

    // Totals come from page 1; nothing can be crawled without them
    let first_url = listing_page_url(config.base_url(), config.search_path(), 1)?;
    let first = fetch_with_retry(fetcher, &first_url, &config.retry_config())
        .await
        .map_err(|source| CrawlError::FirstPage {
            url: first_url.to_string(),
            source,
        })?;
    if !first.is_ok() {
        return Err(CrawlError::FirstPageStatus {
            url: first_url.to_string(),
            status: first.status,
        });
    }

    let totals: SearchTotals = {
        let document = first.document();
        parse_search_totals(&document, config.selectors()).map_err(CrawlError::from_totals)?
    };

    let last_page = match config.page_limit() {
        Some(limit) => totals.last_page.min(limit.max(1)),
        None => totals.last_page,
    };
    state
        .stats
        .pages_total
        .store(last_page as usize, Ordering::SeqCst);

    tracing::info!(
        run_id = %run_id,
        total_results = totals.total_results,
        last_page = totals.last_page,
        pages_to_crawl = last_page,
        "Starting listing crawl"
    );

    // Page 1 is already in hand
    process_results_body(fetcher, config, &state, 1, &first.body).await;
    drop(first);

    let concurrency = config.max_concurrent_requests();
    let mut pending = 2..=last_page;
    let mut active = FuturesUnordered::new();
    let mut cancelled = false;

    loop {
        // Fill up to concurrency limit
        while !cancelled && active.len() < concurrency {
            if cancel.is_cancelled() && !pending.is_empty() {
                info!(target: "athome::crawl", "Cancellation requested, finishing in-flight pages");
                cancelled = true;
                break;
            }
            let Some(page_index) = pending.next() else {
                break;
            };
            let url = listing_page_url(config.base_url(), config.search_path(), page_index)?;
            let shared = &state;
            active.push(async move {
                let result = process_results_page(fetcher, config, shared, page_index, &url).await;
                (page_index, result)
            });
        }

        match active.next().await {
            Some((page_index, result)) => {
                debug!(target: "athome::crawl", "Finished results page {page_index}: {result:?}");
            }
            None => break,
        }
    }

    // Write what was collected, cancelled or not
    let urls = state.collection.to_vec();
    let artifact_path = write_url_artifact(&config.urls_dir(), &run_id, &urls).await?;
    let stats = state.stats.snapshot();
    let elapsed = start_time.elapsed();

    tracing::info!(
        run_id = %run_id,
        path = %artifact_path.display(),
        urls_saved = urls.len(),
        pages_ok = stats.pages_ok,
        pages_failed = stats.pages_failed,
        pages_drifted = stats.pages_drifted,
        cards_parsed = stats.cards_parsed,
        cards_foreign = stats.cards_foreign,
        cards_duplicate = stats.cards_duplicate,
        cards_unidentified = stats.cards_unidentified,
        collectives_resolved = stats.collectives_resolved,
        collectives_failed = stats.collectives_failed,
        elapsed_secs = elapsed.as_secs_f64(),
        cancelled,
        "Listing crawl finished"
    );

    Ok(CrawlOutcome {
        run_id,
        artifact_path,
        advertised_results: totals.total_results,
        last_page: totals.last_page,
        stats,
        elapsed,
        cancelled,
    })
}
