//! Environment module - dependency injection traits
//!
//! Every collaborator the engine talks to is a trait injected through an
//! environment: the clock, the storage ports, the rate source, the payment
//! gateway and the audit/notification sinks. Production code wires real
//! implementations; tests wire the in-memory ones from the testing crate.

use crate::effect::AuditEntry;
use crate::error::{PaymentError, RepositoryError, SinkError};
use crate::rates::{PricingStrategy, PromotionalCode, SeasonalRate};
use crate::types::{
    GuestInfo, HotelId, Money, NewReservation, Reservation, ReservationId, ReservationStatus,
    Room, RoomId, RoomType, StayDates, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date (UTC)
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// Storage ports
// ============================================================================

/// Room lookups and writes
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Load a room
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError>;

    /// Bookable rooms of the hotel that fit `guests` and have no blocking reservation for `stay`
    async fn find_available_rooms(
        &self,
        hotel_id: HotelId,
        stay: StayDates,
        guests: u32,
        room_type: Option<RoomType>,
    ) -> Result<Vec<Room>, RepositoryError>;

    /// Whether the room has no blocking reservation for `stay`
    async fn is_room_available(
        &self,
        room_id: RoomId,
        stay: StayDates,
    ) -> Result<bool, RepositoryError>;

    /// Persist a room (version-checked); returns the stored copy
    async fn save(&self, room: &Room) -> Result<Room, RepositoryError>;
}

/// Reservation lookups and writes
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Load a reservation
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError>;

    /// Store a new reservation and assign its id
    async fn insert(&self, reservation: NewReservation) -> Result<Reservation, RepositoryError>;

    /// Persist a reservation (version-checked); returns the stored copy
    async fn save(&self, reservation: &Reservation) -> Result<Reservation, RepositoryError>;

    /// Reservations on `room_id` whose stay overlaps `stay`, ignoring the excluded statuses
    async fn find_overlapping(
        &self,
        room_id: RoomId,
        stay: StayDates,
        exclude_statuses: &[ReservationStatus],
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// Physically remove a reservation
    async fn delete(&self, id: ReservationId) -> Result<(), RepositoryError>;
}

/// Result of an atomic reservation/room write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Committed {
    /// Stored reservation (version bumped)
    pub reservation: Reservation,
    /// Stored room (version bumped), when one was written
    pub room: Option<Room>,
}

/// Atomic write of a reservation together with its room
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Persist both or neither.
    ///
    /// Fails with [`RepositoryError::Conflict`] when either stored version no
    /// longer matches the version carried by the argument.
    async fn commit(
        &self,
        reservation: &Reservation,
        room: Option<&Room>,
    ) -> Result<Committed, RepositoryError>;
}

// ============================================================================
// Pricing data ports
// ============================================================================

/// Read-only provider of rates and pricing rules
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Base nightly rate for the room type, `None` if the hotel has no such room
    async fn base_rate(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
    ) -> Result<Option<Money>, RepositoryError>;

    /// Strategies effective for the room type on `date`
    async fn active_strategies(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
        date: NaiveDate,
    ) -> Result<Vec<PricingStrategy>, RepositoryError>;

    /// Seasonal rates covering `date` for the room type
    async fn seasonal_rates(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
        date: NaiveDate,
    ) -> Result<Vec<SeasonalRate>, RepositoryError>;

    /// Fraction of the hotel's rooms held by active reservations during `stay`
    async fn occupancy(
        &self,
        hotel_id: HotelId,
        stay: StayDates,
    ) -> Result<Decimal, RepositoryError>;
}

/// Promotional code storage
#[async_trait]
pub trait PromotionRepository: Send + Sync {
    /// Active code scoped to the hotel
    async fn find_active(
        &self,
        hotel_id: HotelId,
        code: &str,
    ) -> Result<Option<PromotionalCode>, RepositoryError>;

    /// How many times `email` has redeemed `code`
    async fn customer_usage(
        &self,
        hotel_id: HotelId,
        code: &str,
        email: &str,
    ) -> Result<u32, RepositoryError>;

    /// Completed stays of `email` at the hotel
    async fn completed_stays(&self, hotel_id: HotelId, email: &str) -> Result<u32, RepositoryError>;

    /// Record that a booking used `code`
    async fn record_redemption(
        &self,
        hotel_id: HotelId,
        code: &str,
        email: Option<&str>,
        reservation_id: ReservationId,
    ) -> Result<(), RepositoryError>;
}

// ============================================================================
// Guests
// ============================================================================

/// A guest known to the system
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestProfile {
    /// Account id
    pub user_id: UserId,
    /// Contact details on file
    pub info: GuestInfo,
}

/// Guest identity lookup and creation
#[async_trait]
pub trait GuestDirectory: Send + Sync {
    /// Find a guest by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<GuestProfile>, RepositoryError>;

    /// Create a guest identity for an unknown email
    async fn register(&self, info: &GuestInfo) -> Result<GuestProfile, RepositoryError>;
}

// ============================================================================
// Payment and side-effect sinks
// ============================================================================

/// Payment provider abstraction
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `amount_minor` (cents) in `currency`; returns the provider's payment reference
    async fn charge(
        &self,
        amount_minor: i64,
        currency: &str,
        payment_method_token: &str,
    ) -> Result<String, PaymentError>;
}

/// Append-only reservation history
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one entry
    async fn record(&self, entry: &AuditEntry) -> Result<(), SinkError>;
}

/// Guest-facing notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Booking cancelled
    async fn notify_cancellation(
        &self,
        reservation_id: ReservationId,
        reason: &str,
        refund: Money,
    ) -> Result<(), SinkError>;

    /// Booking modified
    async fn notify_modification(
        &self,
        reservation_id: ReservationId,
        description: &str,
        additional_charges: Money,
        refund: Money,
    ) -> Result<(), SinkError>;
}
