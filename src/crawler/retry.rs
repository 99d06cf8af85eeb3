//! Bounded retries with exponential backoff
//!
//! Every attempt and every backoff sleep races the run's cancellation token, so a
//! cancelled crawl never waits longer than the step already in flight.

use crate::config::CrawlerConfig;
use crate::CrawlError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How often and how patiently a failed step is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.backoff_base(),
        }
    }

    /// Backoff before retry number `retry` (1-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Whether a failed step is worth repeating
///
/// Network failures and parse failures are; robots.txt denials, storage and
/// configuration problems are not.
pub fn is_retryable(error: &CrawlError) -> bool {
    match error {
        CrawlError::Fetch(e) => e.is_retryable(),
        CrawlError::Parse(_) => true,
        _ => false,
    }
}

/// Runs `op` until it succeeds, fails permanently, or retries run out
///
/// Returns `CrawlError::Cancelled` as soon as `cancel` fires, dropping any
/// attempt in flight.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    mut op: F,
) -> Result<T, CrawlError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CrawlError>>,
{
    let mut retry = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
            result = op() => result,
        };

        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !is_retryable(&error) || retry >= policy.max_retries {
            return Err(error);
        }

        retry += 1;
        let delay = policy.delay_for(retry);
        tracing::debug!(
            attempt = retry + 1,
            delay_ms = delay.as_millis() as u64,
            "Retrying {} after error: {}",
            label,
            error
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CrawlError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
