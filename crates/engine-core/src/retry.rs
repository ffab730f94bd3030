use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) | RetryError::AttemptsExceeded(e) => e,
        }
    }
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Fatal(e) => write!(f, "{e}"),
            RetryError::AttemptsExceeded(e) => write!(f, "{e} (retries exhausted)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStrategy {
    /// Same pause before every retry.
    Fixed(Duration),
    /// Doubles per attempt, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: usize,
    pub delay: DelayStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(200), Duration::from_secs(5))
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: DelayStrategy::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: DelayStrategy::Exponential {
                base: base_delay,
                max: if max_delay.is_zero() {
                    base_delay
                } else {
                    max_delay
                },
            },
        }
    }

    /// Preset tuned for schema changes (higher delay, more attempts).
    pub fn for_database() -> Self {
        Self::exponential(5, Duration::from_millis(250), Duration::from_secs(5))
    }

    /// Executes the operation with the configured retry policy.
    ///
    /// `label` only names the operation in retry warnings.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        label: &str,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }

                        let delay = self.backoff_delay(attempt);
                        warn!(
                            op = label,
                            attempt = attempt + 1,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Attempt failed, retrying"
                        );
                        sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        match self.delay {
            DelayStrategy::Fixed(delay) => delay,
            DelayStrategy::Exponential { base, max } => {
                if base.is_zero() {
                    return Duration::from_millis(0);
                }

                let factor = 1u128 << attempt.min(6);
                let delay_ms = base.as_millis().saturating_mul(factor);
                let capped = delay_ms.min(max.as_millis());
                Duration::from_millis(capped as u64)
            }
        }
    }
}

/// Classifier for operations where every failure is worth another attempt.
pub fn always_retry<E>(_: &E) -> RetryDisposition {
    RetryDisposition::Retry
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryPolicy::fixed(3, Duration::ZERO);

        let result: Result<u32, RetryError<String>> = policy
            .run(
                "flaky",
                move || async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("boom".to_string())
                    } else {
                        Ok(7)
                    }
                },
                always_retry,
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryPolicy::fixed(3, Duration::ZERO);

        let result: Result<(), RetryError<String>> = policy
            .run(
                "down",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("down".to_string())
                },
                always_retry,
            )
            .await;

        assert!(matches!(result, Err(RetryError::AttemptsExceeded(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_stop_immediately() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryPolicy::fixed(5, Duration::ZERO);

        let result: Result<(), RetryError<String>> = policy
            .run(
                "fatal",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("syntax".to_string())
                },
                |_| RetryDisposition::Stop,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exponential_delay_is_capped() {
        let policy =
            RetryPolicy::exponential(10, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(500));

        let fixed = RetryPolicy::fixed(3, Duration::from_secs(5));
        assert_eq!(fixed.backoff_delay(4), Duration::from_secs(5));
    }
}
