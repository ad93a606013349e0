//! Retry wrapper for remote store calls.
//!
//! Transient failures are retried with exponential backoff; setup errors,
//! unique violations and malformed data surface immediately (see
//! [`crate::CoreError::is_retryable`]).

use std::future::Future;
use std::time::Duration;

use crate::error::CoreResult;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy that never sleeps (tests, one-shot checks).
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Backoff after the failed attempt `attempt` (0-based): 500ms, 1s, 2s, ...
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt cap is reached. No sleep follows the final attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    context: &str,
    mut operation: F,
) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                log::debug!("[{context}] Not retrying: {e}");
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    log::error!("[{context}] Failed after {max_attempts} attempts: {e}");
                    return Err(e);
                }
                let delay = policy.backoff_delay(attempt - 1);
                log::warn!(
                    "[{}] Attempt {}/{} failed, retrying in {}ms: {}",
                    context,
                    attempt,
                    max_attempts,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
