//! # Hotel Ops Runtime
//!
//! The imperative shell around the reservation reducers.
//!
//! ## Core Components
//!
//! - **[`EffectRunner`]**: executes the audit and notification effects a
//!   reducer returned, once the state change has been committed
//! - **[`retry`]**: exponential backoff for optimistic-concurrency conflicts
//! - **[`deadline`]**: timeouts for storage and payment calls
//! - **[`locks`]**: keyed in-process locks around units of work
//! - **[`metrics`]**: metric names used across the engine
//!
//! ## Example
//!
//! ```ignore
//! use hotel_ops_runtime::EffectRunner;
//!
//! let runner = EffectRunner::new(audit_sink, notification_sink);
//! let committed = unit_of_work.commit(&state.reservation, state.room.as_ref()).await?;
//! let report = runner.run(effects).await;
//! assert!(report.failures.is_empty());
//! ```

use hotel_ops_core::SinkError;
use hotel_ops_core::effect::Effect;
use hotel_ops_core::environment::{AuditSink, NotificationSink};
use std::sync::Arc;

pub mod deadline;
pub mod locks;
pub mod metrics;
pub mod retry;

pub use deadline::{TimedOut, with_deadline};
pub use locks::{KeyGuard, KeyedLocks};
pub use retry::{RetryPolicy, retry_with_predicate};

/// A side effect that could not be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectFailure {
    /// Effect kind (see [`Effect::kind`])
    pub kind: &'static str,
    /// What went wrong
    pub error: SinkError,
}

/// What happened to a batch of effects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectReport {
    /// Effects delivered
    pub executed: usize,
    /// Effects that failed; the rest of the batch still ran
    pub failures: Vec<EffectFailure>,
}

/// Executes effect descriptions against the audit and notification sinks.
///
/// Every effect is attempted on its own: a failing audit write does not stop
/// the notification after it, and no failure is ever returned to the caller.
/// Failures are logged at `warn` and counted.
#[derive(Clone)]
pub struct EffectRunner {
    audit: Arc<dyn AuditSink>,
    notifications: Arc<dyn NotificationSink>,
}

impl EffectRunner {
    /// Creates a runner over the given sinks
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self { audit, notifications }
    }

    /// Runs every effect in order
    pub async fn run<I>(&self, effects: I) -> EffectReport
    where
        I: IntoIterator<Item = Effect>,
    {
        let mut report = EffectReport::default();
        for effect in effects {
            let kind = effect.kind();
            match self.execute(&effect).await {
                Ok(()) => {
                    ::metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => kind).increment(1);
                    report.executed += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        effect = kind,
                        reservation_id = ?reservation_of(&effect),
                        error = %error,
                        "side effect failed, continuing"
                    );
                    ::metrics::counter!(metrics::EFFECTS_FAILED, "type" => kind).increment(1);
                    report.failures.push(EffectFailure { kind, error });
                }
            }
        }
        report
    }

    async fn execute(&self, effect: &Effect) -> Result<(), SinkError> {
        match effect {
            Effect::None => {
                tracing::trace!("Executing Effect::None (no-op)");
                Ok(())
            }
            Effect::RecordAudit(entry) => {
                tracing::debug!(
                    reservation_id = %entry.reservation_id,
                    action = %entry.action,
                    actor = %entry.actor,
                    "recording audit entry"
                );
                self.audit.record(entry).await
            }
            Effect::NotifyCancellation {
                reservation_id,
                reason,
                refund,
            } => {
                tracing::debug!(%reservation_id, %refund, "sending cancellation notice");
                self.notifications
                    .notify_cancellation(*reservation_id, reason, *refund)
                    .await
            }
            Effect::NotifyModification {
                reservation_id,
                description,
                additional_charges,
                refund,
            } => {
                tracing::debug!(
                    %reservation_id,
                    %additional_charges,
                    %refund,
                    "sending modification notice"
                );
                self.notifications
                    .notify_modification(*reservation_id, description, *additional_charges, *refund)
                    .await
            }
        }
    }
}

fn reservation_of(effect: &Effect) -> Option<hotel_ops_core::ReservationId> {
    match effect {
        Effect::None => None,
        Effect::RecordAudit(entry) => Some(entry.reservation_id),
        Effect::NotifyCancellation { reservation_id, .. }
        | Effect::NotifyModification { reservation_id, .. } => Some(*reservation_id),
    }
}
