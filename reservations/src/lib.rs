//! # Hotel Ops Reservations
//!
//! The reservation lifecycle: a pure [`ReservationReducer`] that owns every
//! status change and its room-status consequence, and the
//! [`BookingOrchestrator`] that prices, persists and pays around it.
//!
//! ## Example
//!
//! ```ignore
//! use hotel_ops_reservations::{BookingOrchestrator, BookingRequest, EngineConfig, telemetry};
//!
//! let config = EngineConfig::from_env();
//! telemetry::init(&config);
//!
//! let engine = BookingOrchestrator::new(ports, &config);
//! let request = BookingRequest::new(hotel_id, RoomType::Double, check_in, check_out, 2, guest)
//!     .with_payment("tok_visa");
//! let booked = engine.create_booking(request).await?;
//! println!("{}", booked.confirmation_number);
//! ```

pub mod booking;
pub mod config;
pub mod orchestrator;
pub mod refund;
pub mod state_machine;
pub mod telemetry;

pub use booking::{
    BookingRequest, BookingResult, CancellationResult, ModificationResult, PaymentOutcome,
    RequestChannel, ReservationChanges,
};
pub use config::{BookingConfig, EngineConfig, LoggingConfig};
pub use orchestrator::{BookingOrchestrator, EnginePorts};
pub use state_machine::{
    ReservationAction, ReservationEnvironment, ReservationReducer, ReservationState,
};
