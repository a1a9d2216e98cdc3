//! Retrying optimistic-concurrency conflicts.
//!
//! A transition that lost a race re-reads the reservation and room, re-runs
//! the reducer and commits again. Errors the predicate rejects fail at once.
//!
//! # Example
//!
//! ```rust
//! use hotel_ops_runtime::retry::{RetryPolicy, retry_with_predicate};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::new(3, Duration::from_millis(25));
//!
//! let result = retry_with_predicate(
//!     policy,
//!     "commit_transition",
//!     || async { Ok::<_, String>(42) },
//!     |err: &String| err.contains("conflict"),
//! ).await?;
//! assert_eq!(result, 42);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// How often and how patiently a conflicting write is retried.
///
/// The pause doubles after every attempt and never exceeds `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Pause before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any single pause
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(25))
    }
}

impl RetryPolicy {
    /// Policy with a one second pause ceiling
    #[must_use]
    pub const fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay: Duration::from_secs(1),
        }
    }

    /// Replaces the pause ceiling
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Pause before retry number `attempt` (zero based)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or the policy runs out of retries.
///
/// # Errors
///
/// The operation's last error.
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    policy: RetryPolicy,
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
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(operation = operation_name, attempt, "recovered from conflict");
                    metrics::counter!(
                        crate::metrics::RETRY_RECOVERED,
                        "operation" => operation_name
                    )
                    .increment(1);
                }
                return Ok(value);
            }
            Err(err) if !is_retryable(&err) => return Err(err),
            Err(err) => err,
        };

        if attempt >= policy.max_retries {
            tracing::error!(
                operation = operation_name,
                attempt,
                error = %err,
                "conflict persisted, giving up"
            );
            metrics::counter!(crate::metrics::RETRY_EXHAUSTED, "operation" => operation_name)
                .increment(1);
            return Err(err);
        }

        let delay = policy.delay_for_attempt(attempt);
        tracing::warn!(
            operation = operation_name,
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "conflict, retrying"
        );
        sleep(delay).await;
        attempt += 1;
    }
}
