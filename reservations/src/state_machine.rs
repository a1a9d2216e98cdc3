//! Reservation lifecycle reducer.
//!
//! Owns every status change of a reservation and the room status each change
//! implies. The reducer is pure: it validates the action against the current
//! state, mutates the reservation and its room together, and returns the
//! audit and notification effects for the runtime to execute after commit.
//!
//! | Action | Allowed from | Room becomes |
//! |---|---|---|
//! | `Confirm` | PENDING | unchanged |
//! | `CheckIn` | CONFIRMED, check-in no later than tomorrow | OCCUPIED |
//! | `CheckOut` | CHECKED_IN | MAINTENANCE |
//! | `Cancel` | PENDING, CONFIRMED, CHECKED_IN | AVAILABLE, unchanged from CHECKED_IN |
//! | `MarkNoShow` | CONFIRMED, check-in today or earlier | AVAILABLE |
//! | `Modify` | PENDING, CONFIRMED, CHECKED_IN | unchanged |
//! | `OverrideTotal` | any | unchanged |

use chrono::Days;
use hotel_ops_core::TransitionError;
use hotel_ops_core::effect::{AuditAction, AuditEntry, Effect, FieldValues};
use hotel_ops_core::environment::Clock;
use hotel_ops_core::reducer::{Effects, Reducer};
use hotel_ops_core::types::{Money, Reservation, ReservationStatus, Room, RoomStatus, StayDates};
use serde::Serialize;
use smallvec::smallvec;
use std::sync::Arc;

/// A reservation together with the room it is assigned to, if any
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationState {
    /// The reservation
    pub reservation: Reservation,
    /// Its room (`None` for bookings not yet assigned)
    pub room: Option<Room>,
}

impl ReservationState {
    /// Pairs a reservation with its room
    #[must_use]
    pub const fn new(reservation: Reservation, room: Option<Room>) -> Self {
        Self { reservation, room }
    }
}

/// Lifecycle actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReservationAction {
    /// Payment settled (or staff confirmation)
    Confirm {
        /// Gateway reference, if a charge was made
        payment_reference: Option<String>,
    },
    /// Guest arrives
    CheckIn,
    /// Guest leaves
    CheckOut,
    /// Booking cancelled
    Cancel {
        /// Reason shown to the guest
        reason: String,
        /// Amount refunded
        refund: Money,
    },
    /// Guest never arrived
    MarkNoShow,
    /// Dates, guest count or requests changed, with the re-priced totals
    Modify {
        /// New stay
        stay: StayDates,
        /// New guest count
        guests: u32,
        /// New special requests
        special_requests: Option<String>,
        /// New total amount
        total_amount: Money,
        /// New nightly base rate snapshot
        price_per_night: Money,
    },
    /// Staff replaces the computed total
    OverrideTotal {
        /// New total
        amount: Money,
        /// Why
        reason: String,
    },
}

impl ReservationAction {
    /// Status the action moves the reservation to, if it changes status
    #[must_use]
    pub const fn target(&self) -> Option<ReservationStatus> {
        match self {
            Self::Confirm { .. } => Some(ReservationStatus::Confirmed),
            Self::CheckIn => Some(ReservationStatus::CheckedIn),
            Self::CheckOut => Some(ReservationStatus::CheckedOut),
            Self::Cancel { .. } => Some(ReservationStatus::Cancelled),
            Self::MarkNoShow => Some(ReservationStatus::NoShow),
            Self::Modify { .. } | Self::OverrideTotal { .. } => None,
        }
    }
}

/// Clock and acting user for one reduction
#[derive(Clone)]
pub struct ReservationEnvironment {
    /// Time source for date preconditions and timestamps
    pub clock: Arc<dyn Clock>,
    /// Who is acting (guest email, staff label, "system")
    pub actor: String,
}

impl ReservationEnvironment {
    /// Creates an environment
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, actor: impl Into<String>) -> Self {
        Self {
            clock,
            actor: actor.into(),
        }
    }
}

/// The reservation state machine
#[derive(Clone, Copy, Debug, Default)]
pub struct ReservationReducer;

impl ReservationReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ReservationReducer {
    type State = ReservationState;
    type Action = ReservationAction;
    type Environment = ReservationEnvironment;
    type Error = TransitionError;

    fn reduce(
        &self,
        state: &mut ReservationState,
        action: ReservationAction,
        env: &ReservationEnvironment,
    ) -> Result<Effects, TransitionError> {
        match action {
            ReservationAction::Confirm { payment_reference } => {
                confirm(state, payment_reference, env)
            }
            ReservationAction::CheckIn => check_in(state, env),
            ReservationAction::CheckOut => check_out(state, env),
            ReservationAction::Cancel { reason, refund } => cancel(state, reason, refund, env),
            ReservationAction::MarkNoShow => mark_no_show(state, env),
            ReservationAction::Modify {
                stay,
                guests,
                special_requests,
                total_amount,
                price_per_night,
            } => {
                let change = Modification {
                    stay,
                    guests,
                    special_requests,
                    total_amount,
                    price_per_night,
                };
                modify(state, change, env)
            }
            ReservationAction::OverrideTotal { amount, reason } => {
                override_total(state, amount, reason, env)
            }
        }
    }
}

// ============================================================================
// Transitions
// ============================================================================

const fn invalid(from: ReservationStatus, to: ReservationStatus) -> TransitionError {
    TransitionError::InvalidTransition { from, to }
}

fn precondition(
    from: ReservationStatus,
    to: ReservationStatus,
    reason: impl Into<String>,
) -> TransitionError {
    TransitionError::PreconditionFailed {
        from,
        to,
        reason: reason.into(),
    }
}

fn set_room_status(state: &mut ReservationState, status: RoomStatus) {
    if let Some(room) = state.room.as_mut() {
        room.status = status;
    }
}

fn status_audit(
    reservation: &Reservation,
    action: AuditAction,
    from: ReservationStatus,
    env: &ReservationEnvironment,
    reason: String,
) -> Effect {
    let field = |status: ReservationStatus| {
        FieldValues::from([("status".to_string(), status.to_string())])
    };
    Effect::RecordAudit(
        AuditEntry::new(reservation.id, action, env.actor.clone(), reason)
            .with_changes(field(from), field(reservation.status)),
    )
}

fn confirm(
    state: &mut ReservationState,
    payment_reference: Option<String>,
    env: &ReservationEnvironment,
) -> Result<Effects, TransitionError> {
    let from = state.reservation.status;
    if from != ReservationStatus::Pending {
        return Err(invalid(from, ReservationStatus::Confirmed));
    }

    let reservation = &mut state.reservation;
    reservation.status = ReservationStatus::Confirmed;
    if payment_reference.is_some() {
        reservation.payment_reference = payment_reference;
    }

    let reason = match &reservation.payment_reference {
        Some(reference) => format!("Booking confirmed, payment {reference}"),
        None => format!("Booking confirmed by {}", env.actor),
    };
    Ok(smallvec![status_audit(reservation, AuditAction::Confirmed, from, env, reason)])
}

fn check_in(
    state: &mut ReservationState,
    env: &ReservationEnvironment,
) -> Result<Effects, TransitionError> {
    let from = state.reservation.status;
    let to = ReservationStatus::CheckedIn;
    if from != ReservationStatus::Confirmed {
        return Err(invalid(from, to));
    }

    let today = env.clock.today();
    let latest = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let check_in_date = state.reservation.stay.check_in();
    if check_in_date > latest {
        return Err(precondition(
            from,
            to,
            format!("check-in date {check_in_date} is more than one day away"),
        ));
    }

    state.reservation.status = to;
    state.reservation.actual_check_in = Some(env.clock.now());
    set_room_status(state, RoomStatus::Occupied);

    let reason = "Guest checked in".to_string();
    Ok(smallvec![status_audit(&state.reservation, AuditAction::CheckedIn, from, env, reason)])
}

fn check_out(
    state: &mut ReservationState,
    env: &ReservationEnvironment,
) -> Result<Effects, TransitionError> {
    let from = state.reservation.status;
    let to = ReservationStatus::CheckedOut;
    if from != ReservationStatus::CheckedIn {
        return Err(invalid(from, to));
    }

    state.reservation.status = to;
    state.reservation.actual_check_out = Some(env.clock.now());
    // needs cleaning before the next guest
    set_room_status(state, RoomStatus::Maintenance);

    let reason = "Guest checked out".to_string();
    Ok(smallvec![status_audit(&state.reservation, AuditAction::CheckedOut, from, env, reason)])
}

fn cancel(
    state: &mut ReservationState,
    reason: String,
    refund: Money,
    env: &ReservationEnvironment,
) -> Result<Effects, TransitionError> {
    let from = state.reservation.status;
    let to = ReservationStatus::Cancelled;
    if from.is_closed() {
        return Err(invalid(from, to));
    }

    state.reservation.status = to;
    state.reservation.cancellation_reason = Some(reason.clone());
    if from != ReservationStatus::CheckedIn {
        set_room_status(state, RoomStatus::Available);
    }

    let id = state.reservation.id;
    Ok(smallvec![
        Effect::NotifyCancellation {
            reservation_id: id,
            reason: reason.clone(),
            refund,
        },
        status_audit(
            &state.reservation,
            AuditAction::Cancelled,
            from,
            env,
            format!("{reason} (refund {refund})"),
        ),
    ])
}

fn mark_no_show(
    state: &mut ReservationState,
    env: &ReservationEnvironment,
) -> Result<Effects, TransitionError> {
    let from = state.reservation.status;
    let to = ReservationStatus::NoShow;
    if from != ReservationStatus::Confirmed {
        return Err(invalid(from, to));
    }

    let check_in_date = state.reservation.stay.check_in();
    if check_in_date > env.clock.today() {
        return Err(precondition(
            from,
            to,
            format!("check-in date {check_in_date} has not arrived"),
        ));
    }

    state.reservation.status = to;
    set_room_status(state, RoomStatus::Available);

    let reason = "Guest did not arrive".to_string();
    Ok(smallvec![status_audit(&state.reservation, AuditAction::NoShow, from, env, reason)])
}

// ============================================================================
// Changes without a status change
// ============================================================================

struct Modification {
    stay: StayDates,
    guests: u32,
    special_requests: Option<String>,
    total_amount: Money,
    price_per_night: Money,
}

/// Fields recorded in before/after audit snapshots
#[derive(Serialize)]
struct Snapshot<'a> {
    check_in: String,
    check_out: String,
    guests: u32,
    special_requests: Option<&'a str>,
    total_amount: String,
    price_per_night: String,
}

fn snapshot(reservation: &Reservation) -> FieldValues {
    let snapshot = Snapshot {
        check_in: reservation.stay.check_in().to_string(),
        check_out: reservation.stay.check_out().to_string(),
        guests: reservation.guests,
        special_requests: reservation.special_requests.as_deref(),
        total_amount: reservation.total_amount.to_string(),
        price_per_night: reservation.price_per_night.to_string(),
    };
    match serde_json::to_value(snapshot) {
        Ok(serde_json::Value::Object(fields)) => fields
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| {
                let rendered = match value {
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                };
                (name, rendered)
            })
            .collect(),
        _ => FieldValues::new(),
    }
}

fn describe(before: &Reservation, after: &Reservation) -> String {
    let mut parts = Vec::new();
    if before.stay != after.stay {
        parts.push(format!("dates changed from {} to {}", before.stay, after.stay));
    }
    if before.guests != after.guests {
        parts.push(format!("guests changed from {} to {}", before.guests, after.guests));
    }
    if before.special_requests != after.special_requests {
        parts.push("special requests updated".to_string());
    }
    if before.total_amount != after.total_amount {
        parts.push(format!(
            "total changed from {} to {}",
            before.total_amount, after.total_amount
        ));
    }
    if parts.is_empty() {
        "No changes".to_string()
    } else {
        parts.join("; ")
    }
}

fn modify(
    state: &mut ReservationState,
    change: Modification,
    env: &ReservationEnvironment,
) -> Result<Effects, TransitionError> {
    let status = state.reservation.status;
    if status.is_closed() {
        return Err(precondition(status, status, "closed reservations cannot be modified"));
    }
    if change.guests == 0 {
        return Err(precondition(status, status, "a reservation needs at least one guest"));
    }

    let before = state.reservation.clone();
    let reservation = &mut state.reservation;
    reservation.stay = change.stay;
    reservation.guests = change.guests;
    reservation.special_requests = change.special_requests;
    reservation.total_amount = change.total_amount;
    reservation.price_per_night = change.price_per_night;

    let additional_charges = reservation.total_amount.saturating_sub(before.total_amount);
    let refund = before.total_amount.saturating_sub(reservation.total_amount);
    let description = describe(&before, reservation);

    Ok(smallvec![
        Effect::RecordAudit(
            AuditEntry::new(
                reservation.id,
                AuditAction::Modified,
                env.actor.clone(),
                description.clone(),
            )
            .with_changes(snapshot(&before), snapshot(reservation)),
        ),
        Effect::NotifyModification {
            reservation_id: reservation.id,
            description,
            additional_charges,
            refund,
        },
    ])
}

fn override_total(
    state: &mut ReservationState,
    amount: Money,
    reason: String,
    env: &ReservationEnvironment,
) -> Result<Effects, TransitionError> {
    let status = state.reservation.status;
    if amount < Money::ZERO {
        return Err(precondition(status, status, "total amount cannot be negative"));
    }

    let field = |value: Money| FieldValues::from([("total_amount".to_string(), value.to_string())]);
    let old = state.reservation.total_amount;
    state.reservation.total_amount = amount;

    Ok(smallvec![Effect::RecordAudit(
        AuditEntry::new(
            state.reservation.id,
            AuditAction::TotalOverridden,
            env.actor.clone(),
            reason,
        )
        .with_changes(field(old), field(amount)),
    )])
}
