//! Getter methods for `ScrapeConfig`
//!
//! This module provides all the accessor methods for retrieving configuration
//! values from a `ScrapeConfig` instance.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use super::selectors::{CompiledSelectors, SiteSelectors};
use super::types::ScrapeConfig;
use crate::fetcher::RetryConfig;
use crate::utils::MAX_RETRY_DELAY_MS;

impl ScrapeConfig {
    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    #[must_use]
    pub fn target_country(&self) -> &str {
        &self.target_country
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn crawl_rate_rps(&self) -> f64 {
        self.crawl_rate_rps
    }

    #[must_use]
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    #[must_use]
    pub fn max_fetch_retries(&self) -> u32 {
        self.max_fetch_retries
    }

    /// Backoff policy applied above the fetcher
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_fetch_retries,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
        }
    }

    #[must_use]
    pub fn progress_interval(&self) -> usize {
        self.progress_interval
    }

    #[must_use]
    pub fn page_limit(&self) -> Option<u32> {
        self.page_limit
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn site_selectors(&self) -> &SiteSelectors {
        &self.selectors
    }

    /// Compiled selectors used by every parser
    #[must_use]
    pub fn selectors(&self) -> &CompiledSelectors {
        &self.compiled
    }
}
