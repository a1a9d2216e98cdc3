//! Recording audit and notification sinks with failure injection.

use async_trait::async_trait;
use hotel_ops_core::environment::{AuditSink, NotificationSink};
use hotel_ops_core::types::{Money, ReservationId};
use hotel_ops_core::{AuditEntry, SinkError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Audit sink that keeps every entry in memory
#[derive(Default)]
pub struct RecordingAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
    failing: AtomicBool,
}

impl RecordingAuditSink {
    /// Working sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every write
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.set_failing(true);
        sink
    }

    /// Toggles failure injection
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Entries recorded so far
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::new("audit", "audit store unavailable"));
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(())
    }
}

/// A notification the engine sent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Cancellation notice
    Cancellation {
        /// Reservation
        reservation_id: ReservationId,
        /// Reason
        reason: String,
        /// Refund
        refund: Money,
    },
    /// Modification notice
    Modification {
        /// Reservation
        reservation_id: ReservationId,
        /// Change summary
        description: String,
        /// Extra charges
        additional_charges: Money,
        /// Refund
        refund: Money,
    },
}

/// Notification sink that keeps every notification in memory
#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl RecordingNotificationSink {
    /// Working sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every notification
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.set_failing(true);
        sink
    }

    /// Toggles failure injection
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications sent so far
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, notification: Notification) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::new("notification", "mail relay unavailable"));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify_cancellation(
        &self,
        reservation_id: ReservationId,
        reason: &str,
        refund: Money,
    ) -> Result<(), SinkError> {
        self.push(Notification::Cancellation {
            reservation_id,
            reason: reason.to_string(),
            refund,
        })
    }

    async fn notify_modification(
        &self,
        reservation_id: ReservationId,
        description: &str,
        additional_charges: Money,
        refund: Money,
    ) -> Result<(), SinkError> {
        self.push(Notification::Modification {
            reservation_id,
            description: description.to_string(),
            additional_charges,
            refund,
        })
    }
}
