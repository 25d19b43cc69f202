//! Retry pipeline for transient infrastructure failures.
//!
//! Wraps a unit of work and re-attempts it with exponential backoff while
//! the failure classifies as transient. Permanent failures propagate on
//! first occurrence, unmodified. Exhausting the attempt budget surfaces the
//! last transient error wrapped in [`RetryError::Exhausted`], which callers
//! map to their transient-infrastructure error category.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::traits::TransientClass;

/// Retry policy: attempt budget and backoff shape.
///
/// Policies are constructed once at process start and injected by
/// reference; tests substitute [`RetryPolicy::no_retry`] for determinism.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of re-attempts after the first try.
    pub max_retries: u32,
    /// Delay before the first re-attempt.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Policy for primary-store operations: tight budget, short delays.
    /// Wraps every orchestration entry point.
    #[must_use]
    pub fn store() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Policy for event publication: its own budget, so a struggling bus
    /// neither blocks the caller indefinitely nor hides a committed write.
    #[must_use]
    pub fn publish() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Deterministic single-attempt policy for tests.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Delay for a given re-attempt (0-indexed).
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            // Up to 25% jitter
            capped * (1.0 + rand_simple() * 0.25)
        } else {
            capped
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// Failure surfaced by [`RetryPipeline::execute`].
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// The attempt budget ran out; carries the last transient error.
    #[error("transient infrastructure failure after {attempts} attempts: {source}")]
    Exhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        #[source]
        source: E,
    },

    /// The wrapped operation failed with a non-transient error; it was not
    /// retried.
    #[error(transparent)]
    Permanent(E),
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Unwrap back to the underlying error, dropping attempt bookkeeping.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::Permanent(source) => source,
        }
    }
}

/// Re-executes a wrapped operation while its failures classify as transient.
///
/// The pipeline re-attempts the *entire* wrapped operation, not sub-steps,
/// and adds no timeout of its own; timeouts stay with the underlying
/// client.
#[derive(Debug, Clone)]
pub struct RetryPipeline {
    policy: RetryPolicy,
}

impl RetryPipeline {
    /// Create a pipeline with the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation, retrying transient failures up to the budget.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: TransientClass + std::error::Error + 'static,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_permanent() => return Err(RetryError::Permanent(e)),
                Err(e) => {
                    if attempt >= self.policy.max_retries {
                        return Err(RetryError::Exhausted {
                            attempts: attempt + 1,
                            source: e,
                        });
                    }
                    let delay = self.policy.delay_for(attempt);
                    debug!(
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Simple pseudo-random number in [0, 1) for jitter.
/// Not cryptographically secure, but sufficient for spreading retries.
fn rand_simple() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let state = RandomState::new();
    let mut hasher = state.build_hasher();
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64,
    );
    (hasher.finish() as f64) / (u64::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("connection reset")]
        Transient,
        #[error("duplicate name")]
        Permanent,
    }

    impl TransientClass for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn succeeds_first_try() {
        let pipeline = RetryPipeline::new(fast_policy(3));
        let calls = AtomicUsize::new(0);

        let result = pipeline
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, TestError>(7) }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let pipeline = RetryPipeline::new(fast_policy(3));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = pipeline
            .execute(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let pipeline = RetryPipeline::new(fast_policy(3));
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = pipeline
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Permanent) }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_wraps_last_transient_error() {
        let pipeline = RetryPipeline::new(fast_policy(2));
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = pipeline
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient) }
            })
            .await;

        match result {
            Err(RetryError::Exhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(source.is_transient());
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn no_retry_policy_attempts_once() {
        let pipeline = RetryPipeline::new(RetryPolicy::no_retry());
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = pipeline
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::Transient) }
            })
            .await;

        assert!(matches!(
            result,
            Err(RetryError::Exhausted { attempts: 1, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            jitter: false,
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        // 100 * 2^3 = 800, capped at 500
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
    }

    #[test]
    fn into_inner_unwraps_both_variants() {
        let e: RetryError<TestError> = RetryError::Permanent(TestError::Permanent);
        assert!(matches!(e.into_inner(), TestError::Permanent));

        let e: RetryError<TestError> = RetryError::Exhausted {
            attempts: 4,
            source: TestError::Transient,
        };
        assert!(matches!(e.into_inner(), TestError::Transient));
    }
}
