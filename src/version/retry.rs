//! Bounded retry loop with exponential backoff

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::version::error::FetchError;

/// How often and how patiently to retry a transient failure.
///
/// Attempt `n` (0-based) that fails transiently is followed by a wait of
/// `base_delay * 2^n`. Permanent failures return immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails permanently, or runs out of attempts.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        self.run_with_sleep(op, tokio::time::sleep).await
    }

    /// Same as [`run`](Self::run) with a caller-provided sleep.
    pub async fn run_with_sleep<T, F, Fut, S, SFut>(
        &self,
        mut op: F,
        mut sleep: S,
    ) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        S: FnMut(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let mut attempt = 0;
        loop {
            let error = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            warn!(
                "{}, attempt {}/{}",
                error,
                attempt + 1,
                self.max_attempts
            );

            if attempt + 1 >= self.max_attempts {
                return Err(FetchError::Exhausted {
                    attempts: attempt + 1,
                    source: Box::new(error),
                });
            }

            let delay = self.delay_for(attempt);
            debug!("Waiting {}ms before retry", delay.as_millis());
            sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::{Cell, RefCell};

    #[rstest]
    #[case(0, 1000)]
    #[case(1, 2000)]
    #[case(2, 4000)]
    #[case(5, 32000)]
    fn delay_for_doubles_each_attempt(#[case] attempt: u32, #[case] expected_ms: u64) {
        let policy = RetryPolicy::new(10, Duration::from_millis(1000));
        assert_eq!(policy.delay_for(attempt), Duration::from_millis(expected_ms));
    }

    #[test]
    fn delay_for_saturates_instead_of_overflowing() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_for(64), Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn new_clamps_zero_attempts_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test]
    async fn run_succeeds_after_two_failures_with_two_backoffs() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = Cell::new(0);
        let delays = RefCell::new(Vec::new());

        let result = policy
            .run_with_sleep(
                |_| {
                    let n = calls.get();
                    calls.set(n + 1);
                    async move {
                        if n < 2 {
                            Err(FetchError::Timeout { timeout_ms: 5 })
                        } else {
                            Ok("v1.0.0")
                        }
                    }
                },
                |d| {
                    delays.borrow_mut().push(d);
                    std::future::ready(())
                },
            )
            .await;

        assert_eq!(result.unwrap(), "v1.0.0");
        assert_eq!(calls.get(), 3);
        assert_eq!(
            delays.into_inner(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }

    #[tokio::test]
    async fn run_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let calls = Cell::new(0);
        let delays = RefCell::new(Vec::new());

        let result: Result<(), _> = policy
            .run_with_sleep(
                |_| {
                    calls.set(calls.get() + 1);
                    async { Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY)) }
                },
                |d| {
                    delays.borrow_mut().push(d);
                    std::future::ready(())
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(FetchError::Exhausted { attempts: 3, .. })
        ));
        assert_eq!(calls.get(), 3);
        assert_eq!(delays.into_inner().len(), 2);
    }

    #[tokio::test]
    async fn run_does_not_retry_permanent_errors() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let calls = Cell::new(0);
        let delays = RefCell::new(Vec::new());

        let result: Result<(), _> = policy
            .run_with_sleep(
                |_| {
                    calls.set(calls.get() + 1);
                    async { Err(FetchError::NoVersion) }
                },
                |d| {
                    delays.borrow_mut().push(d);
                    std::future::ready(())
                },
            )
            .await;

        assert!(matches!(result, Err(FetchError::NoVersion)));
        assert_eq!(calls.get(), 1);
        assert!(delays.into_inner().is_empty());
    }

    #[tokio::test]
    async fn run_passes_attempt_number_to_operation() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let seen = RefCell::new(Vec::new());

        let _: Result<(), _> = policy
            .run(|attempt| {
                seen.borrow_mut().push(attempt);
                async { Err(FetchError::Timeout { timeout_ms: 1 }) }
            })
            .await;

        assert_eq!(seen.into_inner(), vec![0, 1, 2]);
    }
}
