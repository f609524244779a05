//! Retry with exponential backoff for idempotent reads.
//!
//! Only operations that are safe to repeat go through here (the list and
//! detail fetches). Mutations are never retried: a failed mutation is rolled
//! back and the user re-issues it.
//!
//! # Example
//!
//! ```rust
//! use checklist_runtime::retry::{RetryPolicy, retry_if};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::default()
//!     .with_max_retries(2)
//!     .with_initial_delay(Duration::from_millis(50));
//!
//! let lists = retry_if(&policy, "fetch_lists", || async {
//!     Ok::<_, String>(vec!["groceries"])
//! }, |err: &String| err.contains("timeout")).await?;
//! assert_eq!(lists.len(), 1);
//! # Ok(())
//! # }
//! ```

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff configuration.
///
/// # Default Values
///
/// - `max_retries`: 2
/// - `initial_delay`: 200ms
/// - `max_delay`: 5 seconds
/// - `multiplier`: 2.0
/// - `jitter`: on (each delay is scaled by a random factor in `[0.5, 1.0]`)
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap for the exponential delay
    pub max_delay: Duration,
    /// Growth factor between retries
    pub multiplier: f64,
    /// Randomise delays so concurrent clients do not retry in lockstep
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    #[must_use]
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Set the number of retries
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Un-jittered delay before retry number `attempt` (0-based).
    ///
    /// `initial_delay * multiplier^attempt`, capped at `max_delay`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let cap_ms = self.max_delay.as_millis() as f64;

        if !delay_ms.is_finite() || delay_ms >= cap_ms {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }

    fn sleep_for_attempt(&self, attempt: usize) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        if self.jitter {
            delay.mul_f64(rand::thread_rng().gen_range(0.5..=1.0))
        } else {
            delay
        }
    }
}

/// Runs `operation`, retrying errors for which `is_retryable` holds.
///
/// Non-retryable errors are returned immediately. When retries are
/// exhausted the last error is returned.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation_name: &'static str,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(result);
            },
            Err(err) if !is_retryable(&err) || attempt >= policy.max_retries => {
                if attempt > 0 {
                    tracing::error!(operation = operation_name, attempt, error = %err, "Giving up");
                }
                return Err(err);
            },
            Err(err) => {
                let delay = policy.sleep_for_attempt(attempt);
                metrics::counter!("retry.attempt", "operation" => operation_name).increment(1);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "Retrying"
                );
                sleep(delay).await;
                attempt += 1;
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::default()
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350));

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for_attempt(usize::MAX), Duration::from_millis(350));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default().with_initial_delay(Duration::from_millis(100));
        for _ in 0..50 {
            let delay = policy.sleep_for_attempt(0);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(100));
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_if(
            &fast(),
            "test",
            || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("timeout".to_string())
                    } else {
                        Ok(7)
                    }
                }
            },
            |err: &String| err == "timeout",
        )
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), String> = retry_if(
            &fast(),
            "test",
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("forbidden".to_string()) }
            },
            |err: &String| err == "timeout",
        )
        .await;

        assert_eq!(result, Err("forbidden".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), String> = retry_if(
            &fast().with_max_retries(1),
            "test",
            || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("timeout {n}")) }
            },
            |err: &String| err.starts_with("timeout"),
        )
        .await;

        assert_eq!(result, Err("timeout 1".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_none_policy_does_not_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let _: Result<(), String> = retry_if(
            &RetryPolicy::none(),
            "test",
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("timeout".to_string()) }
            },
            |_| true,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
