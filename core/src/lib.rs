//! # Hotel Ops Core
//!
//! Domain types and abstractions for the reservation lifecycle and dynamic
//! pricing engine.
//!
//! ## Core Concepts
//!
//! - **Types**: money, stay dates, rooms, reservations, guest identity
//! - **Rates**: pricing strategies, seasonal rates, promotional codes
//! - **Reducer**: `(State, Action, Environment) → Result<Effects, Error>`
//! - **Effect**: side effect descriptions (audit entries, notifications)
//! - **Environment**: clock and the ports to storage, payment and sinks
//!
//! ## Architecture Principles
//!
//! - Functional core, imperative shell: reducers and pricing stages are pure,
//!   the runtime performs I/O
//! - Explicit effects: a transition says which audit entries and
//!   notifications it needs, it never sends them itself
//! - Dependency injection through traits
//! - Fixed-point money everywhere

pub mod effect;
pub mod environment;
pub mod error;
pub mod rates;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use rust_decimal::Decimal;
pub use smallvec::{SmallVec, smallvec};

pub use effect::{AuditAction, AuditEntry, Effect, FieldValues};
pub use error::{
    BookingError, PaymentError, PricingError, RepositoryError, SinkError, TransitionError,
};
pub use reducer::{Effects, Reducer};
pub use types::{
    GuestIdentity, GuestInfo, HotelId, Money, NewReservation, Reservation, ReservationId,
    ReservationStatus, Room, RoomId, RoomStatus, RoomType, StayDates, UserId,
};
