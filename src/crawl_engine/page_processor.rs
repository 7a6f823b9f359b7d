//! Single results-page processing
//!
//! Handles fetching one results page, parsing its cards, and running each
//! card through filter, dedup and resolution into the shared collection.
//! Failures stay local to the page or card they hit.

use log::{debug, warn};
use url::Url;

use super::collective::resolve_collective;
use super::crawl_types::CrawlStats;
use super::dedup::{SeenIds, UrlCollection};
use crate::config::ScrapeConfig;
use crate::fetcher::{PageFetcher, fetch_with_retry};
use crate::page_extractor::{ArticleCard, ListingPage, is_foreign, parse_listing_page};
use crate::utils::{property_id, resolve_href};

/// State owned by one crawl run and shared by its page tasks
#[derive(Debug, Default)]
pub struct CrawlState {
    pub seen: SeenIds,
    pub collection: UrlCollection,
    pub stats: CrawlStats,
}

impl CrawlState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// How a results page ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResult {
    /// Cards were processed; `urls_added` new URLs entered the collection
    Processed { urls_added: usize },
    /// Transport failure after retries
    FetchFailed,
    /// The site answered with something other than 200
    BadStatus(u16),
    /// 200 but no recognisable cards
    Drifted,
}

/// Fetch results page `page_index` and process its cards
pub async fn process_results_page<F: PageFetcher>(
    fetcher: &F,
    config: &ScrapeConfig,
    state: &CrawlState,
    page_index: u32,
    url: &Url,
) -> PageResult {
    let page = match fetch_with_retry(fetcher, url, &config.retry_config()).await {
        Ok(page) => page,
        Err(e) => {
            warn!(target: "athome::crawl", "Skipping results page {page_index}: {e}");
            CrawlStats::bump(&state.stats.pages_failed);
            return PageResult::FetchFailed;
        }
    };

    if !page.is_ok() {
        warn!(
            target: "athome::crawl",
            "Skipping results page {page_index}: HTTP {} from {url}",
            page.status
        );
        CrawlStats::bump(&state.stats.pages_failed);
        return PageResult::BadStatus(page.status);
    }

    process_results_body(fetcher, config, state, page_index, &page.body).await
}

/// Parse an already-fetched results page and process its cards
pub(crate) async fn process_results_body<F: PageFetcher>(
    fetcher: &F,
    config: &ScrapeConfig,
    state: &CrawlState,
    page_index: u32,
    body: &str,
) -> PageResult {
    let parsed = {
        let document = scraper::Html::parse_document(body);
        parse_listing_page(&document, page_index, config.selectors())
    };

    let listing = match parsed {
        Ok(listing) => listing,
        Err(e) => {
            warn!(
                target: "athome::crawl",
                "Results page {page_index} looks different than expected: {e}"
            );
            CrawlStats::bump(&state.stats.pages_drifted);
            return PageResult::Drifted;
        }
    };

    CrawlStats::bump(&state.stats.pages_ok);
    let urls_added = process_listing(fetcher, config, state, &listing).await;
    debug!(
        target: "athome::crawl",
        "Results page {page_index}: {} cards, {urls_added} new URLs",
        listing.cards.len()
    );
    PageResult::Processed { urls_added }
}

/// Run every card of a parsed page through filter, dedup and resolution
///
/// Returns the number of URLs added to the collection. Running it again on
/// a page already processed against the same state adds nothing.
pub async fn process_listing<F: PageFetcher>(
    fetcher: &F,
    config: &ScrapeConfig,
    state: &CrawlState,
    listing: &ListingPage,
) -> usize {
    let mut added = 0;
    for card in &listing.cards {
        added += process_card(fetcher, config, state, card).await;
    }
    added
}

async fn process_card<F: PageFetcher>(
    fetcher: &F,
    config: &ScrapeConfig,
    state: &CrawlState,
    card: &ArticleCard,
) -> usize {
    let stats = &state.stats;
    let parsed = CrawlStats::bump(&stats.cards_parsed);
    if parsed % config.progress_interval() == 0 {
        tracing::info!(
            cards_parsed = parsed,
            urls_saved = state.collection.len(),
            "Crawl progress"
        );
    }

    // Locality filter runs before any resolution work
    if is_foreign(card, config.target_country()) {
        CrawlStats::bump(&stats.cards_foreign);
        return 0;
    }

    let Some(primary) = card
        .primary_href
        .as_deref()
        .and_then(|href| resolve_href(config.base_url(), href).ok())
    else {
        debug!(target: "athome::crawl", "Card without a usable link: {card:?}");
        CrawlStats::bump(&stats.cards_unidentified);
        return 0;
    };

    let Some(id) = property_id(&primary) else {
        debug!(target: "athome::crawl", "No property id in {primary}");
        CrawlStats::bump(&stats.cards_unidentified);
        return 0;
    };

    if !state.seen.insert(id) {
        CrawlStats::bump(&stats.cards_duplicate);
        return 0;
    }

    if !card.is_collective {
        if collect(state, primary) {
            return 1;
        }
        CrawlStats::bump(&stats.cards_duplicate);
        return 0;
    }

    let landing = card
        .landing()
        .and_then(|href| resolve_href(config.base_url(), href).ok())
        .unwrap_or(primary);

    let members = match resolve_collective(fetcher, config, &landing).await {
        Ok(members) if !members.is_empty() => members,
        Ok(_) => {
            warn!(target: "athome::collective", "Collective {id} at {landing} has no member links");
            CrawlStats::bump(&stats.collectives_failed);
            return 0;
        }
        Err(e) => {
            warn!(target: "athome::collective", "Collective {id} contributes no URLs: {e}");
            CrawlStats::bump(&stats.collectives_failed);
            return 0;
        }
    };

    CrawlStats::bump(&stats.collectives_resolved);
    members
        .into_iter()
        .map(|member| collect(state, member))
        .filter(|&inserted| inserted)
        .count()
}

fn collect(state: &CrawlState, url: Url) -> bool {
    let inserted = state.collection.insert(url);
    if inserted {
        CrawlStats::bump(&state.stats.urls_saved);
    }
    inserted
}
