//! Deadlines for calls that leave the process (storage, payment).

use hotel_ops_core::{PaymentError, RepositoryError};
use std::future::Future;
use std::time::Duration;

/// Errors that have a dedicated "timed out" variant
pub trait TimedOut {
    /// The timeout value of this error type
    fn timed_out() -> Self;
}

impl TimedOut for PaymentError {
    fn timed_out() -> Self {
        Self::Timeout
    }
}

impl TimedOut for RepositoryError {
    fn timed_out() -> Self {
        Self::Timeout
    }
}

/// Runs `call`, failing with `E::timed_out()` if it takes longer than `limit`.
///
/// The call is dropped on timeout.
///
/// # Errors
///
/// The call's own error, or the timeout error.
pub async fn with_deadline<T, E, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, E>
where
    E: TimedOut,
    F: Future<Output = Result<T, E>>,
{
    if let Ok(result) = tokio::time::timeout(limit, call).await {
        return result;
    }
    tracing::warn!(
        operation,
        limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        "call exceeded its deadline"
    );
    metrics::counter!(crate::metrics::DEADLINE_EXCEEDED, "operation" => operation).increment(1);
    Err(E::timed_out())
}
