//! Live-site fetcher over reqwest
//!
//! Presents a desktop browser User-Agent (the site turns away default client
//! identifiers), applies the per-host token bucket, and bounds every request
//! with the configured timeout.

use log::debug;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use std::future::Future;
use std::time::Duration;
use url::Url;

use super::rate_limiter::CrawlRateLimiter;
use super::timeout::with_fetch_timeout;
use super::{FetchError, FetchedPage, PageFetcher};
use crate::config::ScrapeConfig;

/// Fetcher for the real site
pub struct HttpFetcher {
    client: Client,
    rate_limiter: CrawlRateLimiter,
    rate_rps: f64,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from the run configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the TLS backend cannot be initialised.
    pub fn new(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .gzip(true)
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            rate_limiter: CrawlRateLimiter::new(),
            rate_rps: config.crawl_rate_rps(),
            timeout: config.request_timeout(),
        })
    }

    async fn get(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "en-GB,en;q=0.9")
            .send()
            .await
            .map_err(|e| classify(url, &e, self.timeout))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: error_chain(&e),
        })?;

        debug!(target: "athome::fetch", "GET {url} -> {status} ({} bytes)", body.len());

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        async move {
            self.rate_limiter.acquire(url.as_str(), self.rate_rps).await;
            with_fetch_timeout(self.get(url), self.timeout, url.as_str()).await
        }
    }
}

fn classify(url: &Url, error: &reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            message: error_chain(error),
        }
    }
}

/// Flatten an error and its sources into one line
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
