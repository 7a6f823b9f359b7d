//! Core configuration types for crawl and extraction runs
//!
//! This module contains the main `ScrapeConfig` struct that defines where
//! runs read from and write to, how hard they may hit the site, and which
//! markup they expect.

use std::path::PathBuf;
use url::Url;

use super::selectors::{CompiledSelectors, SiteSelectors};

/// Main configuration struct for crawl and extraction runs
///
/// Built through [`ScrapeConfig::builder`]; every field is validated there.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Root directory for run artifacts.
    ///
    /// URL artifacts go to `<output_dir>/extracted_urls`, record tables to
    /// `<output_dir>/raw_datasets`.
    pub(crate) output_dir: PathBuf,

    /// Site root every relative href is resolved against
    pub(crate) base_url: Url,

    /// Path of the paginated search results, relative to `base_url`
    pub(crate) search_path: String,

    /// Upper-cased two-letter code of the country whose properties are kept
    pub(crate) target_country: String,

    /// Timeout in seconds for a single GET, connect through body
    ///
    /// A request that exceeds it fails like any other transport error and
    /// only affects the item it belonged to.
    ///
    /// Default: 30 seconds
    pub(crate) request_timeout_secs: u64,

    /// Requests per second allowed against one host (0 disables limiting)
    ///
    /// Default: 2.0
    pub(crate) crawl_rate_rps: f64,

    /// Maximum number of requests in flight at once
    ///
    /// 1 reproduces a strictly sequential crawl.
    ///
    /// Default: 4
    pub(crate) max_concurrent_requests: usize,

    /// Retry attempts for transient transport failures
    ///
    /// HTTP statuses are never retried. Set to 0 to disable.
    ///
    /// Default: 3
    pub(crate) max_fetch_retries: u32,

    /// Delay before the first retry; doubles per attempt
    ///
    /// Default: 500 ms
    pub(crate) retry_initial_delay_ms: u64,

    /// Items between two progress log lines
    ///
    /// Default: 200
    pub(crate) progress_interval: usize,

    /// Stop after this many result pages instead of the advertised last page
    pub(crate) page_limit: Option<u32>,

    pub(crate) user_agent: String,

    /// Raw selectors, kept so a run can report what it matched against
    pub(crate) selectors: SiteSelectors,

    /// Selectors compiled from `selectors`
    /// Pre-compiled at config creation to keep parsing out of the hot path
    pub(crate) compiled: CompiledSelectors,
}

impl ScrapeConfig {
    /// Directory holding URL artifacts
    #[must_use]
    pub fn urls_dir(&self) -> PathBuf {
        self.output_dir.join(crate::utils::URLS_DIR_NAME)
    }

    /// Directory holding record tables
    #[must_use]
    pub fn records_dir(&self) -> PathBuf {
        self.output_dir.join(crate::utils::RECORDS_DIR_NAME)
    }
}
