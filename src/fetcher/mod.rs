//! HTML fetching
//!
//! One GET per call, no caching, no retry. Callers decide what a failure
//! means for the item they were working on; [`retry::fetch_with_retry`] is
//! the shared backoff policy they use for transient transport failures.

pub mod http;
pub mod rate_limiter;
pub mod retry;
pub mod timeout;

use std::future::Future;

use scraper::Html;
use thiserror::Error;
use url::Url;

pub use http::HttpFetcher;
pub use rate_limiter::{CrawlRateLimiter, RateLimitDecision};
pub use retry::{RetryConfig, fetch_with_retry};

/// A fetched page: final status code and raw body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    /// Only a 200 counts as a usable page
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Parse the body into a document tree
    ///
    /// `Html` is not `Send`; parse, extract owned data, and drop it before
    /// the next `.await`.
    #[must_use]
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Transport-level failure; an HTTP status is never an error at this layer
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// No complete response within the configured timeout
    #[error("Request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// DNS, connect, TLS or protocol failure
    #[error("Connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// Response started but the body could not be read
    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    /// HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether another attempt might succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::Body { .. }
        )
    }
}

/// Anything that can GET a URL
///
/// Implemented by [`HttpFetcher`] for the live site; tests supply in-memory
/// fakes.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

impl<T: PageFetcher> PageFetcher for std::sync::Arc<T> {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        (**self).fetch(url)
    }
}
