//! Retry with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How often and how patiently to retry a fallible call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles for each one after
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(600),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before the 1-based `attempt`: nothing, then `base`, `2 * base`, ...
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 2);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// attempts run out. The last error is returned.
    pub async fn run<T, E, F, Fut>(&self, mut op: F, retryable: impl Fn(&E) -> bool) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let delay = self.delay_before(attempt);
            if !delay.is_zero() {
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts && retryable(&e) => {
                    warn!(attempt, max_attempts, error = %e, "Retryable failure");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::error::ProviderError;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn assert_waited(elapsed: Duration, ms: u64) {
        let expected = Duration::from_millis(ms);
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "waited {:?}, expected about {:?}",
            elapsed,
            expected
        );
    }

    fn throttled() -> ProviderError {
        ProviderError::Throttled {
            code: "AB1004".into(),
            message: "Access rate exceeded".into(),
        }
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_millis(600));
        assert_eq!(policy.delay_before(3), Duration::from_millis(1200));
        assert_eq!(policy.delay_before(4), Duration::from_millis(2400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_throttled_then_succeeds() {
        let policy = RetryPolicy::default();
        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();

        let result = policy
            .run(
                |attempt| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.lock().unwrap().push(Instant::now());
                        if attempt < 3 {
                            Err(throttled())
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                ProviderError::is_retryable,
            )
            .await;

        assert_eq!(result.unwrap(), 3);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_waited(calls[0] - start, 0);
        assert_waited(calls[1] - calls[0], 600);
        assert_waited(calls[2] - calls[1], 1200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_aborts_immediately() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;

        let result: Result<(), _> = policy
            .run(
                |_| {
                    attempts += 1;
                    async { Err(ProviderError::upstream("Invalid symbol token")) }
                },
                ProviderError::is_retryable,
            )
            .await;

        assert!(matches!(result, Err(ProviderError::Upstream { .. })));
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_returns_last_error() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        let mut attempts = 0;

        let result: Result<(), _> = policy
            .run(
                |_| {
                    attempts += 1;
                    async { Err(throttled()) }
                },
                ProviderError::is_retryable,
            )
            .await;

        assert_eq!(result.unwrap_err().code(), Some("AB1004"));
        assert_eq!(attempts, 3);
        // no wait after the final attempt
        assert_waited(Instant::now() - start, 1800);
    }
}
