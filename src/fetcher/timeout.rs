//! Timeout utilities for requests
//!
//! Wraps a whole request (connect, headers and body) so a server that
//! trickles bytes cannot hold a worker forever.

use std::future::Future;
use std::time::Duration;

use super::FetchError;

/// Helper function to wrap an async request with an explicit timeout
///
/// # Arguments
/// * `operation` - The request future
/// * `timeout` - Budget for the whole operation
/// * `url` - Request URL, for the error
///
/// # Returns
/// * `Ok(T)` - Operation completed in time
/// * `Err` - The operation failed, or `FetchError::Timeout` if the budget ran out
pub async fn with_fetch_timeout<F, T>(
    operation: F,
    timeout: Duration,
    url: &str,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_operation_times_out() {
        let result: Result<(), FetchError> = with_fetch_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            },
            Duration::from_millis(20),
            "https://example.com/slow",
        )
        .await;
        assert!(matches!(result, Err(FetchError::Timeout { .. })));
    }

    #[tokio::test]
    async fn fast_operation_passes_through() {
        let result = with_fetch_timeout(async { Ok(7) }, Duration::from_secs(1), "u").await;
        assert_eq!(result.expect("should complete"), 7);
    }
}
