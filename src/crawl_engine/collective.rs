//! Collective bundle resolution
//!
//! A collective card links to a landing page that lists the bundled
//! properties. Resolving it costs one extra fetch; any failure forfeits the
//! bundle's members but never the crawl.

use log::{debug, warn};
use thiserror::Error;
use url::Url;

use crate::config::ScrapeConfig;
use crate::fetcher::{FetchError, PageFetcher, fetch_with_retry};
use crate::page_extractor::{ParseError, parse_collective_members};
use crate::utils::resolve_href;

/// Why a collective landing page yielded nothing
#[derive(Debug, Error)]
pub enum CollectiveError {
    #[error("Landing page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Landing page {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Landing page {url} has unexpected markup: {source}")]
    Markup {
        url: String,
        #[source]
        source: ParseError,
    },
}

/// Fetch a collective landing page and return its members' absolute URLs
///
/// Member hrefs that do not resolve to a URL are dropped with a warning.
///
/// # Errors
///
/// Fails when the landing page cannot be fetched, is not a 200, or has no
/// member blocks. The caller treats every failure as "zero members".
pub async fn resolve_collective<F: PageFetcher>(
    fetcher: &F,
    config: &ScrapeConfig,
    landing: &Url,
) -> Result<Vec<Url>, CollectiveError> {
    let page = fetch_with_retry(fetcher, landing, &config.retry_config()).await?;
    if !page.is_ok() {
        return Err(CollectiveError::Status {
            url: landing.to_string(),
            status: page.status,
        });
    }

    // Html is not Send: parse and drop it before returning to async code
    let hrefs = {
        let document = page.document();
        parse_collective_members(&document, config.selectors()).map_err(|source| {
            CollectiveError::Markup {
                url: landing.to_string(),
                source,
            }
        })?
    };

    let mut members = Vec::with_capacity(hrefs.len());
    for href in hrefs {
        match resolve_href(&page.url, &href) {
            Ok(url) => members.push(url),
            Err(e) => warn!(
                target: "athome::collective",
                "Dropping unresolvable member href '{href}' on {landing}: {e}"
            ),
        }
    }

    debug!(
        target: "athome::collective",
        "Resolved {} members from {landing}",
        members.len()
    );
    Ok(members)
}
