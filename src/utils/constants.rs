//! Shared configuration constants for athome_scrape
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Site root used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://www.athome.lu";

/// Path of the paginated "for sale" search results
pub const DEFAULT_SEARCH_PATH: &str = "/en/buy";

/// ISO 3166 alpha-2 code of the country whose properties are kept
pub const DEFAULT_TARGET_COUNTRY: &str = "LU";

/// Default crawl rate: 2 requests per second
///
/// Conservative rate that respects server resources while maintaining
/// reasonable crawl speed. A full crawl is a few thousand requests, so this
/// keeps a run in the half-hour range.
pub const DEFAULT_CRAWL_RATE_RPS: f64 = 2.0;

/// Default number of requests allowed in flight at once
///
/// Set to 1 for strictly sequential crawling.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Retry attempts for transient transport failures (0 disables retry)
pub const DEFAULT_MAX_FETCH_RETRIES: u32 = 3;

/// First backoff delay; doubles on each further attempt
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 500;

/// Upper bound on a single backoff delay
pub const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Cards (crawl) or URLs (extraction) between two progress log lines
pub const DEFAULT_PROGRESS_INTERVAL: usize = 200;

/// Default size of the random subset drawn by `sample`
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;

/// Default number of detail pages inspected by `survey`
pub const DEFAULT_SURVEY_SIZE: usize = 1000;

/// Sub-directory of the output dir holding URL artifacts
pub const URLS_DIR_NAME: &str = "extracted_urls";

/// Sub-directory of the output dir holding record tables
pub const RECORDS_DIR_NAME: &str = "raw_datasets";

/// Chrome user agent string
///
/// The site rejects default HTTP client identifiers, so every request
/// presents itself as a current desktop Chrome.
///
/// Updated: 2026-09 to Chrome 140 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.7339.128 Safari/537.36";
