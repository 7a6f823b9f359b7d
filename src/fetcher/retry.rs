//! Retry with exponential backoff for transient transport failures
//!
//! The fetcher never retries on its own. Controllers wrap their GETs in
//! [`fetch_with_retry`], which retries timeouts and connection failures and
//! hands any HTTP response (whatever its status) straight back.

use std::time::Duration;
use url::Url;

use super::{FetchError, FetchedPage, PageFetcher};

/// Retry configuration for fetches
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try
    pub max_attempts: u32,
    /// Initial retry delay
    pub initial_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum retry delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Calculate delay before retry number `attempt` (0-based)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt.min(30) as i32);
        let delay_ms = (self.initial_delay.as_millis() as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms).min(self.max_delay)
    }
}

/// GET `url`, retrying transient failures according to `config`
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error immediately.
pub async fn fetch_with_retry<F: PageFetcher>(
    fetcher: &F,
    url: &Url,
    config: &RetryConfig,
) -> Result<FetchedPage, FetchError> {
    let mut attempt = 0u32;

    loop {
        match fetcher.fetch(url).await {
            Ok(page) => {
                if attempt > 0 {
                    tracing::info!(url = %url, attempt = attempt + 1, "Fetch succeeded after retry");
                }
                return Ok(page);
            }
            Err(e) => {
                if !e.is_transient() || attempt >= config.max_attempts {
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt);
                attempt += 1;

                tracing::warn!(
                    url = %url,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient fetch error, retrying after delay"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}
