//! Per-host politeness for the fetcher
//!
//! One token bucket per host, refilled at the configured requests per
//! second and holding at most one second's worth of tokens. Buckets live in
//! a small LRU owned by the fetcher, so two runs in one process never share
//! a budget. Token counts use fixed-point atomics; only the bucket lookup
//! takes a lock.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Scaling factor for fixed-point token arithmetic (1000x precision)
const TOKEN_SCALE: u64 = 1000;

/// Scaling factor for nanosecond rate calculations
const RATE_SCALE: u64 = 1_000_000;

/// Hosts tracked before the least recently used bucket is dropped
const MAX_TRACKED_HOSTS: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Rate limit decision for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed to proceed
    Allow,
    /// Request should be deferred
    /// Contains the duration to wait before retrying
    Deny { retry_after: Duration },
}

/// Token bucket for one host
#[derive(Debug)]
struct HostBucket {
    /// Current available tokens scaled by `TOKEN_SCALE` for sub-token precision
    tokens: AtomicU64,
    /// Last token refill timestamp in nanoseconds since `base_time`
    last_refill_nanos: AtomicU64,
    /// Rate in tokens per nanosecond scaled by `TOKEN_SCALE` * `RATE_SCALE`
    rate_per_nano: u64,
    /// Maximum tokens scaled by `TOKEN_SCALE`
    max_tokens: u64,
}

impl HostBucket {
    fn new(rate_rps: f64, now_nanos: u64) -> Self {
        let max_tokens = (rate_rps.max(1.0) * TOKEN_SCALE as f64) as u64;
        let rate_per_nano =
            ((rate_rps * TOKEN_SCALE as f64 * RATE_SCALE as f64) / 1_000_000_000.0) as u64;

        Self {
            tokens: AtomicU64::new(max_tokens),
            last_refill_nanos: AtomicU64::new(now_nanos),
            rate_per_nano,
            max_tokens,
        }
    }

    /// Take one token, or say how long until one is available
    fn try_consume_token(&self, now_nanos: u64) -> RateLimitDecision {
        self.refill_tokens(now_nanos);

        loop {
            let current_tokens = self.tokens.load(Ordering::Relaxed);
            if current_tokens < TOKEN_SCALE {
                let tokens_needed = TOKEN_SCALE.saturating_sub(current_tokens);

                let nanos_needed = if self.rate_per_nano > 0 {
                    (tokens_needed.saturating_mul(RATE_SCALE)) / self.rate_per_nano
                } else {
                    1_000_000
                };

                return RateLimitDecision::Deny {
                    retry_after: Duration::from_nanos(nanos_needed),
                };
            }

            let new_tokens = current_tokens - TOKEN_SCALE;
            if self
                .tokens
                .compare_exchange_weak(
                    current_tokens,
                    new_tokens,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return RateLimitDecision::Allow;
            }
        }
    }

    /// Credit the tokens earned since the last refill
    ///
    /// The refill clock only moves forward by the time that produced whole
    /// token units; the remainder carries over to the next call.
    fn refill_tokens(&self, now_nanos: u64) {
        loop {
            let last_refill = self.last_refill_nanos.load(Ordering::Relaxed);
            if now_nanos <= last_refill {
                break;
            }

            let elapsed_nanos = now_nanos.saturating_sub(last_refill);
            let tokens_to_add = (elapsed_nanos.saturating_mul(self.rate_per_nano)) / RATE_SCALE;

            let time_credited_nanos = if self.rate_per_nano > 0 {
                (tokens_to_add.saturating_mul(RATE_SCALE)) / self.rate_per_nano
            } else {
                0
            };
            let new_last_refill = last_refill.saturating_add(time_credited_nanos);

            if self
                .last_refill_nanos
                .compare_exchange_weak(
                    last_refill,
                    new_last_refill,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                )
                .is_err()
            {
                continue;
            }

            if tokens_to_add > 0 {
                let _ = self
                    .tokens
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                        Some(current.saturating_add(tokens_to_add).min(self.max_tokens))
                    });
            }
            break;
        }
    }
}

/// Per-host token-bucket limiter
pub struct CrawlRateLimiter {
    buckets: Mutex<LruCache<String, Arc<HostBucket>>>,
    base_time: Instant,
}

impl Default for CrawlRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlRateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(LruCache::new(MAX_TRACKED_HOSTS)),
            base_time: Instant::now(),
        }
    }

    fn now_nanos(&self) -> u64 {
        self.base_time.elapsed().as_nanos() as u64
    }

    /// Check whether a request to `url` may proceed now
    pub async fn check(&self, url: &str, rate_rps: f64) -> RateLimitDecision {
        if rate_rps <= 0.0 {
            return RateLimitDecision::Allow;
        }

        let domain = match extract_domain(url) {
            Some(domain) if !domain.is_empty() => domain,
            _ => return RateLimitDecision::Allow,
        };

        let bucket = {
            let mut cache = self.buckets.lock().await;
            if let Some(bucket) = cache.get(&domain) {
                Arc::clone(bucket)
            } else {
                let bucket = Arc::new(HostBucket::new(rate_rps, self.now_nanos()));
                cache.put(domain, Arc::clone(&bucket));
                bucket
            }
        };
        bucket.try_consume_token(self.now_nanos())
    }

    /// Wait until a request to `url` may proceed
    pub async fn acquire(&self, url: &str, rate_rps: f64) {
        while let RateLimitDecision::Deny { retry_after } = self.check(url, rate_rps).await {
            log::trace!(target: "athome::fetch", "Rate limited for {retry_after:?}: {url}");
            tokio::time::sleep(retry_after).await;
        }
    }

    /// Number of domains currently tracked
    pub async fn tracked_domain_count(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

/// Extract the rate-limit key (lower-cased host without `www.`) from a URL
#[must_use]
pub fn extract_domain(url: &str) -> Option<String> {
    let after_scheme = match url.find("://") {
        Some(scheme_end) => &url[scheme_end + 3..],
        None => url,
    };
    let domain_end = after_scheme
        .find(['/', '?', '#', ':'])
        .unwrap_or(after_scheme.len());
    let domain = after_scheme[..domain_end].to_ascii_lowercase();
    match domain.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => Some(rest.to_string()),
        _ => Some(domain),
    }
}
