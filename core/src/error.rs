//! Error taxonomy for pricing, lifecycle transitions and bookings.
//!
//! Fatal errors abort an operation with no state change. Promotion problems
//! are not errors at all: they surface as a rejection reason inside the
//! pricing breakdown. Audit and notification failures ([`SinkError`]) are
//! logged by the runtime and never propagate.

use crate::types::{HotelId, ReservationId, ReservationStatus, RoomId, RoomType};
use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a storage collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Optimistic concurrency check failed
    #[error("{entity} {id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        /// Entity kind
        entity: &'static str,
        /// Identifier of the stale entity
        id: String,
        /// Version the writer read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// The store could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its deadline
    #[error("storage call timed out")]
    Timeout,
}

impl RepositoryError {
    /// True for optimistic concurrency conflicts, which are worth retrying
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Fatal pricing failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The hotel has no room of the requested type
    #[error("no {room_type} rooms found at hotel {hotel_id}")]
    RateNotFound {
        /// Hotel searched
        hotel_id: HotelId,
        /// Room type requested
        room_type: RoomType,
    },

    /// Check-out is not after check-in
    #[error("check-out {check_out} must be after check-in {check_in}")]
    InvalidDateRange {
        /// Requested check-in
        check_in: NaiveDate,
        /// Requested check-out
        check_out: NaiveDate,
    },

    /// Rate data could not be loaded
    #[error("rate data unavailable: {0}")]
    Repository(#[from] RepositoryError),
}

/// Rejected lifecycle transition
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested status is not reachable from the current one
    #[error("cannot move reservation from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: ReservationStatus,
        /// Requested status
        to: ReservationStatus,
    },

    /// The transition exists but its precondition does not hold
    #[error("cannot move reservation from {from} to {to}: {reason}")]
    PreconditionFailed {
        /// Current status
        from: ReservationStatus,
        /// Requested status
        to: ReservationStatus,
        /// Which precondition failed
        reason: String,
    },
}

/// Payment provider failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Card declined
    #[error("card declined: {reason}")]
    CardDeclined {
        /// Decline reason
        reason: String,
    },

    /// Insufficient funds
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Invalid payment method
    #[error("invalid payment method: {reason}")]
    InvalidPaymentMethod {
        /// Invalid reason
        reason: String,
    },

    /// Provider did not answer in time
    #[error("payment gateway timed out")]
    Timeout,

    /// Anything else
    #[error("payment error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Audit or notification delivery failure (never propagated)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{sink} failed: {message}")]
pub struct SinkError {
    /// Which sink failed
    pub sink: &'static str,
    /// What went wrong
    pub message: String,
}

impl SinkError {
    /// Creates a sink error
    #[must_use]
    pub fn new(sink: &'static str, message: impl Into<String>) -> Self {
        Self {
            sink,
            message: message.into(),
        }
    }
}

/// Errors surfaced by booking operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Request failed shape validation
    #[error("invalid booking request: {0}")]
    InvalidRequest(String),

    /// The room cannot be sold for the requested stay
    #[error("room {room_id} is not available: {reason}")]
    RoomUnavailable {
        /// Room requested or selected
        room_id: RoomId,
        /// Why it is unavailable
        reason: String,
    },

    /// No room of the type is free for the stay
    #[error("no {room_type} room available at hotel {hotel_id}")]
    NoRoomAvailable {
        /// Hotel searched
        hotel_id: HotelId,
        /// Room type requested
        room_type: RoomType,
    },

    /// Reservation does not exist
    #[error("reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// Guest cancellation or modification too close to check-in
    #[error("reservation {reservation_id} cannot be changed less than {notice_hours} hours before check-in")]
    CancellationWindowClosed {
        /// Reservation concerned
        reservation_id: ReservationId,
        /// Required notice
        notice_hours: i64,
    },

    /// Reservation is past the point where it may be deleted
    #[error("reservation {reservation_id} in status {status} cannot be deleted")]
    NotDeletable {
        /// Reservation concerned
        reservation_id: ReservationId,
        /// Its status
        status: ReservationStatus,
    },

    /// Room still has a guest, so its bookable flag cannot be cleared
    #[error("room {0} is occupied and cannot be closed for bookings")]
    RoomStillOccupied(RoomId),

    /// Pricing failed
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Lifecycle transition rejected
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Payment failed
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Storage failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type alias for booking operations
pub type Result<T> = std::result::Result<T, BookingError>;
