//! Bounded fixed-delay retry.
//!
//! The caller supplies the operation and a predicate that inspects each
//! outcome, successful or not, and decides whether another attempt is worth
//! making. This lets "succeeded but came back empty" be retried the same way
//! as an error, which the dataset fetcher relies on.

use std::future::Future;
use std::time::Duration;

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    #[must_use]
    pub fn from_config(config: &clipdb_core::AppConfig) -> Self {
        Self::new(
            config.dataset_max_retries,
            Duration::from_millis(config.dataset_retry_delay_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// Runs `operation` until `should_retry` declines or attempts run out.
///
/// `operation` receives the 1-based attempt number. `should_retry` sees each
/// outcome together with its attempt number and is never consulted for the
/// final allowed attempt: that outcome is returned as-is.
pub async fn retry_fixed<T, E, F, Fut, P>(
    policy: RetryPolicy,
    mut operation: F,
    mut should_retry: P,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&Result<T, E>, u32) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let outcome = operation(attempt).await;
        if attempt >= max_attempts || !should_retry(&outcome, attempt) {
            return outcome;
        }

        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
            failed = outcome.is_err(),
            "retrying after fixed delay"
        );
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}
