//! Side effect descriptions.
//!
//! Reducers never call the audit trail or the notification channel directly.
//! They return [`Effect`] values and the runtime executes them after the
//! state change has been committed. Effects are plain data so tests can
//! assert on exactly what a transition asked for.

use crate::types::{Money, ReservationId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name to rendered value, used for before/after audit snapshots
pub type FieldValues = BTreeMap<String, String>;

/// Kind of change recorded in the audit trail
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Reservation created
    Created,
    /// Reservation confirmed
    Confirmed,
    /// Guest checked in
    CheckedIn,
    /// Guest checked out
    CheckedOut,
    /// Reservation cancelled
    Cancelled,
    /// Guest marked as no-show
    NoShow,
    /// Dates, guest count or requests changed
    Modified,
    /// Total amount overridden by staff
    TotalOverridden,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "CREATED",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::CheckedOut => "CHECKED_OUT",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
            Self::Modified => "MODIFIED",
            Self::TotalOverridden => "TOTAL_OVERRIDDEN",
        };
        f.write_str(name)
    }
}

/// One append-only audit trail record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Reservation the entry belongs to
    pub reservation_id: ReservationId,
    /// What happened
    pub action: AuditAction,
    /// Who did it (guest email, staff label, "system")
    pub actor: String,
    /// Free-text explanation
    pub reason: String,
    /// Values before the change
    pub old_values: Option<FieldValues>,
    /// Values after the change
    pub new_values: Option<FieldValues>,
}

impl AuditEntry {
    /// Entry without before/after snapshots
    #[must_use]
    pub fn new(
        reservation_id: ReservationId,
        action: AuditAction,
        actor: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            reservation_id,
            action,
            actor: actor.into(),
            reason: reason.into(),
            old_values: None,
            new_values: None,
        }
    }

    /// Attaches before/after snapshots
    #[must_use]
    pub fn with_changes(mut self, old_values: FieldValues, new_values: FieldValues) -> Self {
        self.old_values = Some(old_values);
        self.new_values = Some(new_values);
        self
    }
}

/// A side effect requested by a reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// No-op
    None,

    /// Append an entry to the audit trail
    RecordAudit(AuditEntry),

    /// Tell the guest their booking was cancelled
    NotifyCancellation {
        /// Cancelled reservation
        reservation_id: ReservationId,
        /// Why it was cancelled
        reason: String,
        /// Amount to be refunded (possibly zero)
        refund: Money,
    },

    /// Tell the guest their booking changed
    NotifyModification {
        /// Modified reservation
        reservation_id: ReservationId,
        /// Human-readable summary of the change
        description: String,
        /// Extra amount owed
        additional_charges: Money,
        /// Amount to be refunded
        refund: Money,
    },
}

impl Effect {
    /// Short label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RecordAudit(_) => "audit",
            Self::NotifyCancellation { .. } => "notify_cancellation",
            Self::NotifyModification { .. } => "notify_modification",
        }
    }
}
