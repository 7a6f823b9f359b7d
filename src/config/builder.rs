//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time validation
//! ensuring that the output directory and base URL are set before building a
//! `ScrapeConfig`.

use crate::utils::{
    CHROME_USER_AGENT, DEFAULT_CRAWL_RATE_RPS, DEFAULT_MAX_CONCURRENT_REQUESTS,
    DEFAULT_MAX_FETCH_RETRIES, DEFAULT_PROGRESS_INTERVAL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_INITIAL_DELAY_MS, DEFAULT_SEARCH_PATH, DEFAULT_TARGET_COUNTRY,
};
use anyhow::{Result, anyhow, bail};
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::selectors::SiteSelectors;
use super::types::ScrapeConfig;

// Type states for the builder
pub struct WithOutputDir;
pub struct WithBaseUrl;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) base_url: Option<String>,
    pub(crate) search_path: String,
    pub(crate) target_country: String,
    pub(crate) request_timeout_secs: u64,
    pub(crate) crawl_rate_rps: f64,
    pub(crate) max_concurrent_requests: usize,
    pub(crate) max_fetch_retries: u32,
    pub(crate) retry_initial_delay_ms: u64,
    pub(crate) progress_interval: usize,
    pub(crate) page_limit: Option<u32>,
    pub(crate) user_agent: String,
    pub(crate) selectors: SiteSelectors,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_dir: None,
            base_url: None,
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            target_country: DEFAULT_TARGET_COUNTRY.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            crawl_rate_rps: DEFAULT_CRAWL_RATE_RPS,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            max_fetch_retries: DEFAULT_MAX_FETCH_RETRIES,
            retry_initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            page_limit: None,
            user_agent: CHROME_USER_AGENT.to_string(),
            selectors: SiteSelectors::default(),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl<State> ScrapeConfigBuilder<State> {
    fn into_state<Next>(self) -> ScrapeConfigBuilder<Next> {
        ScrapeConfigBuilder {
            output_dir: self.output_dir,
            base_url: self.base_url,
            search_path: self.search_path,
            target_country: self.target_country,
            request_timeout_secs: self.request_timeout_secs,
            crawl_rate_rps: self.crawl_rate_rps,
            max_concurrent_requests: self.max_concurrent_requests,
            max_fetch_retries: self.max_fetch_retries,
            retry_initial_delay_ms: self.retry_initial_delay_ms,
            progress_interval: self.progress_interval,
            page_limit: self.page_limit,
            user_agent: self.user_agent,
            selectors: self.selectors,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> ScrapeConfigBuilder<WithOutputDir> {
        self.output_dir = Some(dir.into());
        self.into_state()
    }
}

impl ScrapeConfigBuilder<WithOutputDir> {
    pub fn base_url(mut self, url: impl Into<String>) -> ScrapeConfigBuilder<WithBaseUrl> {
        let url_string = url.into();

        // Normalize URL: add https:// if no scheme is present
        let normalized_url =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("https://{url_string}")
            };

        self.base_url = Some(normalized_url);
        self.into_state()
    }
}

// Build method only available when all required fields are set
impl ScrapeConfigBuilder<WithBaseUrl> {
    pub fn build(self) -> Result<ScrapeConfig> {
        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("output_dir is required"))?;
        let raw_base = self
            .base_url
            .ok_or_else(|| anyhow!("base_url is required"))?;
        let base_url =
            Url::parse(&raw_base).map_err(|e| anyhow!("Invalid base_url '{raw_base}': {e}"))?;
        if base_url.host_str().is_none() {
            bail!("base_url '{raw_base}' has no host");
        }

        let target_country = self.target_country.trim().to_ascii_uppercase();
        if target_country.len() != 2 || !target_country.chars().all(|c| c.is_ascii_alphabetic()) {
            bail!(
                "target_country must be a two-letter country code, got '{}'",
                self.target_country
            );
        }
        if self.max_concurrent_requests == 0 {
            bail!("max_concurrent_requests must be at least 1");
        }
        if self.crawl_rate_rps.is_nan() || self.crawl_rate_rps < 0.0 {
            bail!("crawl_rate_rps must be zero or positive");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        if self.progress_interval == 0 {
            bail!("progress_interval must be at least 1");
        }

        // Compile selectors once at config creation
        let compiled = self.selectors.compile()?;

        Ok(ScrapeConfig {
            output_dir,
            base_url,
            search_path: self.search_path,
            target_country,
            request_timeout_secs: self.request_timeout_secs,
            crawl_rate_rps: self.crawl_rate_rps,
            max_concurrent_requests: self.max_concurrent_requests,
            max_fetch_retries: self.max_fetch_retries,
            retry_initial_delay_ms: self.retry_initial_delay_ms,
            progress_interval: self.progress_interval,
            page_limit: self.page_limit,
            user_agent: self.user_agent,
            selectors: self.selectors,
            compiled,
        })
    }
}

// Methods available for all states
impl<State> ScrapeConfigBuilder<State> {
    #[must_use]
    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.search_path = path.into();
        self
    }

    #[must_use]
    pub fn target_country(mut self, code: impl Into<String>) -> Self {
        self.target_country = code.into();
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the per-host request rate
    ///
    /// `0.0` disables rate limiting entirely, which is only sensible against
    /// a local test server.
    #[must_use]
    pub fn crawl_rate_rps(mut self, rps: f64) -> Self {
        self.crawl_rate_rps = rps;
        self
    }

    #[must_use]
    pub fn max_concurrent_requests(mut self, n: usize) -> Self {
        self.max_concurrent_requests = n;
        self
    }

    /// Set maximum retry attempts for transient transport failures
    ///
    /// Set to 0 to disable retries (a failed request is final).
    ///
    /// # Example
    /// ```rust
    /// # use athome_scrape::config::ScrapeConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = ScrapeConfig::builder()
    ///     .output_dir("./data")
    ///     .base_url("https://www.athome.lu")
    ///     .max_fetch_retries(5)
    ///     .build()?;
    /// assert_eq!(config.max_fetch_retries(), 5);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn max_fetch_retries(mut self, retries: u32) -> Self {
        self.max_fetch_retries = retries;
        self
    }

    #[must_use]
    pub fn retry_initial_delay_ms(mut self, ms: u64) -> Self {
        self.retry_initial_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn progress_interval(mut self, every: usize) -> Self {
        self.progress_interval = every;
        self
    }

    #[must_use]
    pub fn page_limit(mut self, limit: Option<u32>) -> Self {
        self.page_limit = limit;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    #[must_use]
    pub fn selectors(mut self, selectors: SiteSelectors) -> Self {
        self.selectors = selectors;
        self
    }
}
