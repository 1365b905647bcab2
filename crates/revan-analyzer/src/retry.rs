//! Retry policy for model endpoint calls.
//!
//! A [`RetryPolicy`] with `max_retries == 0` makes a single attempt. Which
//! errors are worth another attempt is decided by the caller.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Upper bound on a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Jitter factor range applied to each delay: `0.75..1.25`.
const JITTER_SPREAD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base: Duration::from_millis(backoff_base_ms),
        }
    }

    /// Delay before retry number `retry` (1-based), before jitter: the base
    /// doubled per retry, capped at [`MAX_DELAY`].
    pub(crate) fn delay_before(&self, retry: u32) -> Duration {
        let doublings = retry.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(1 << doublings)
            .min(MAX_DELAY)
    }

    /// Run `attempt` until it succeeds, fails with an error `is_transient`
    /// rejects, or the retry budget is spent. The last error is returned.
    pub(crate) async fn run<T, E, F, Fut>(
        &self,
        is_transient: impl Fn(&E) -> bool,
        mut attempt: F,
    ) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retry = 0;
        loop {
            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if retry >= self.max_retries || !is_transient(&err) {
                return Err(err);
            }
            retry += 1;

            let delay = self
                .delay_before(retry)
                .mul_f64(1.0 - JITTER_SPREAD / 2.0 + rand::random::<f64>() * JITTER_SPREAD);
            tracing::warn!(
                retry,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient model endpoint error"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn transient(err: &TestError) -> bool {
        *err == TestError::Flaky
    }

    /// Fails with `errors` in order, then succeeds with the attempt count.
    async fn scripted(
        policy: RetryPolicy,
        errors: Vec<TestError>,
    ) -> (Result<u32, TestError>, u32) {
        let calls = AtomicU32::new(0);
        let errors = std::sync::Mutex::new(errors.into_iter());
        let result = policy
            .run(transient, || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                let next = errors.lock().unwrap().next();
                async move { next.map_or(Ok(n), Err) }
            })
            .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[test]
    fn delay_doubles_then_caps() {
        let policy = RetryPolicy::new(10, 500);
        assert_eq!(policy.delay_before(1), Duration::from_millis(500));
        assert_eq!(policy.delay_before(2), Duration::from_secs(1));
        assert_eq!(policy.delay_before(3), Duration::from_secs(2));
        assert_eq!(policy.delay_before(8), MAX_DELAY);
        assert_eq!(policy.delay_before(u32::MAX), MAX_DELAY);
    }

    #[tokio::test]
    async fn zero_retries_is_one_attempt() {
        let (result, calls) = scripted(RetryPolicy::new(0, 0), vec![TestError::Flaky]).await;
        assert_eq!(result, Err(TestError::Flaky));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let (result, calls) = scripted(
            RetryPolicy::new(3, 0),
            vec![TestError::Flaky, TestError::Flaky],
        )
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_returns_last_error() {
        let (result, calls) = scripted(
            RetryPolicy::new(2, 0),
            vec![TestError::Flaky, TestError::Flaky, TestError::Flaky],
        )
        .await;
        assert_eq!(result, Err(TestError::Flaky));
        assert_eq!(calls, 3, "1 attempt + 2 retries");
    }

    #[tokio::test]
    async fn non_transient_error_stops_immediately() {
        let (result, calls) = scripted(
            RetryPolicy::new(5, 0),
            vec![TestError::Flaky, TestError::Fatal],
        )
        .await;
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls, 2);
    }
}
