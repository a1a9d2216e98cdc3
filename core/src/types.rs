//! Domain types for the hotel reservation engine.
//!
//! Value objects (identifiers, money, stay dates), the `Room` and
//! `Reservation` entities, and guest identity. Entities carry a `version`
//! used for optimistic concurrency by the unit-of-work port.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            #[doc = concat!("Creates a `", stringify!($name), "` from its raw value")]
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value
            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a hotel (the tenant boundary for pricing data)
    HotelId
);
numeric_id!(
    /// Identifier of a physical room
    RoomId
);
numeric_id!(
    /// Identifier of a reservation
    ReservationId
);
numeric_id!(
    /// Identifier of a registered user
    UserId
);
numeric_id!(
    /// Identifier of a pricing strategy rule
    StrategyId
);
numeric_id!(
    /// Identifier of a seasonal rate rule
    SeasonalRateId
);

impl ReservationId {
    /// Human-facing confirmation number: `BK` followed by the id zero-padded to 8 digits.
    #[must_use]
    pub fn confirmation_number(&self) -> String {
        format!("BK{:08}", self.0)
    }
}

// ============================================================================
// Money Value Object (fixed-point decimal, never binary floating point)
// ============================================================================

/// A monetary amount backed by a fixed-point decimal.
///
/// Arithmetic keeps full precision. Rounding to cents (half-up) only happens
/// when [`Money::rounded`] is called at a display or tax boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wraps a decimal amount in major units (e.g. dollars)
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates an amount from whole major units
    #[must_use]
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates an amount from minor units (cents)
    #[must_use]
    pub fn from_minor(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Rounds to two decimal places, half-up
    #[must_use]
    pub fn rounded(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Converts to minor units after half-up rounding.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(self) -> Option<i64> {
        let cents = self.rounded().0.checked_mul(Decimal::ONE_HUNDRED)?;
        i64::try_from(cents.trunc()).ok()
    }

    /// Multiplies the amount by a decimal factor (no rounding)
    #[must_use]
    pub fn scale(self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }

    /// Divides the amount by a positive count (no rounding).
    ///
    /// Returns `None` when `count` is zero.
    #[must_use]
    pub fn split(self, count: u32) -> Option<Self> {
        self.0.checked_div(Decimal::from(count)).map(Self)
    }

    /// True when strictly greater than zero
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// True when exactly zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Difference clamped at zero (`self - other`, never negative)
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if self.0 > other.0 {
            Self(self.0 - other.0)
        } else {
            Self::ZERO
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.rounded().0;
        value.rescale(2);
        if value.is_sign_negative() && !value.is_zero() {
            write!(f, "-${}", value.abs())
        } else {
            write!(f, "${}", value.abs())
        }
    }
}

// ============================================================================
// Stay dates
// ============================================================================

/// A half-open calendar date range `[check_in, check_out)`.
///
/// Construction rejects ranges where check-out is not strictly after check-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    /// Creates a stay, or `None` if `check_out <= check_in`
    #[must_use]
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_out > check_in).then_some(Self {
            check_in,
            check_out,
        })
    }

    /// Arrival date
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Departure date
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights (always at least one)
    #[must_use]
    pub fn nights(&self) -> u32 {
        let days = (self.check_out - self.check_in).num_days();
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Every night of the stay, starting with the check-in date
    pub fn each_night(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.check_in
            .iter_days()
            .take_while(move |day| *day < self.check_out)
    }

    /// True when the two half-open ranges share at least one night
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

impl fmt::Display for StayDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.check_in, self.check_out)
    }
}

// ============================================================================
// Rooms
// ============================================================================

/// Category of room, used to resolve base rates and pricing rules
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    /// Single occupancy room
    Single,
    /// Double bed room
    Double,
    /// Two single beds
    Twin,
    /// Deluxe room
    Deluxe,
    /// Family room
    Family,
    /// Suite
    Suite,
    /// Presidential suite
    Presidential,
}

impl RoomType {
    /// Canonical upper-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Double => "DOUBLE",
            Self::Twin => "TWIN",
            Self::Deluxe => "DELUXE",
            Self::Family => "FAMILY",
            Self::Suite => "SUITE",
            Self::Presidential => "PRESIDENTIAL",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SINGLE" => Ok(Self::Single),
            "DOUBLE" => Ok(Self::Double),
            "TWIN" => Ok(Self::Twin),
            "DELUXE" => Ok(Self::Deluxe),
            "FAMILY" => Ok(Self::Family),
            "SUITE" => Ok(Self::Suite),
            "PRESIDENTIAL" => Ok(Self::Presidential),
            other => Err(format!("unknown room type: {other}")),
        }
    }
}

/// Operational status of a room
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Ready for a guest
    Available,
    /// A guest is checked in
    Occupied,
    /// Needs cleaning or repair
    Maintenance,
    /// Cannot be used
    OutOfOrder,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Available => "AVAILABLE",
            Self::Occupied => "OCCUPIED",
            Self::Maintenance => "MAINTENANCE",
            Self::OutOfOrder => "OUT_OF_ORDER",
        };
        f.write_str(name)
    }
}

/// A physical room.
///
/// `status` and `bookable` are orthogonal: a room can be `Available` while
/// closed for new sales, and the "bookable" flag is toggled independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room id
    pub id: RoomId,
    /// Owning hotel
    pub hotel_id: HotelId,
    /// Door number
    pub number: String,
    /// Category
    pub room_type: RoomType,
    /// Base nightly rate
    pub base_rate: Money,
    /// Maximum number of guests
    pub capacity: u32,
    /// Operational status
    pub status: RoomStatus,
    /// Open for new bookings
    pub bookable: bool,
    /// Optimistic concurrency version
    pub version: u64,
}

impl Room {
    /// Creates an available, bookable room at version 0
    #[must_use]
    pub fn new(
        id: RoomId,
        hotel_id: HotelId,
        number: impl Into<String>,
        room_type: RoomType,
        base_rate: Money,
        capacity: u32,
    ) -> Self {
        Self {
            id,
            hotel_id,
            number: number.into(),
            room_type,
            base_rate,
            capacity,
            status: RoomStatus::Available,
            bookable: true,
            version: 0,
        }
    }
}

// ============================================================================
// Guests
// ============================================================================

/// Contact details captured with a booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    /// Full name
    pub name: String,
    /// Email address (used as the lookup key)
    pub email: String,
    /// Phone number
    pub phone: Option<String>,
}

/// Who a reservation belongs to: a registered user or an anonymous guest.
///
/// At least one of the two is always present by construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuestIdentity {
    /// Registered account, optionally with the contact snapshot used at booking time
    Registered {
        /// The user account
        user_id: UserId,
        /// Contact snapshot
        snapshot: Option<GuestInfo>,
    },
    /// Anonymous booking with embedded contact details
    Anonymous(GuestInfo),
}

impl GuestIdentity {
    /// Email of the guest, when known
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Registered { snapshot, .. } => snapshot.as_ref().map(|info| info.email.as_str()),
            Self::Anonymous(info) => Some(info.email.as_str()),
        }
    }

    /// The linked user account, if any
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Registered { user_id, .. } => Some(*user_id),
            Self::Anonymous(_) => None,
        }
    }
}

// ============================================================================
// Reservations
// ============================================================================

/// Reservation lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Created, not yet paid or confirmed
    Pending,
    /// Confirmed (paid or guaranteed)
    Confirmed,
    /// Guest is in the room
    CheckedIn,
    /// Stay completed
    CheckedOut,
    /// Cancelled before completion
    Cancelled,
    /// Guest never arrived
    NoShow,
}

impl ReservationStatus {
    /// Statuses from which no further transition is possible
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::CheckedOut | Self::Cancelled | Self::NoShow)
    }

    /// Statuses that block a room for a date range
    #[must_use]
    pub const fn holds_room(&self) -> bool {
        matches!(self, Self::Confirmed | Self::CheckedIn)
    }

    /// Statuses that never block a room, used as the overlap exclusion list
    pub const NON_BLOCKING: [Self; 4] = [
        Self::Pending,
        Self::CheckedOut,
        Self::Cancelled,
        Self::NoShow,
    ];
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::CheckedOut => "CHECKED_OUT",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        };
        f.write_str(name)
    }
}

/// A guest's booking of a room for a date range
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation id
    pub id: ReservationId,
    /// Owning hotel
    pub hotel_id: HotelId,
    /// Assigned room, `None` until assignment
    pub room_id: Option<RoomId>,
    /// Room category the booking was priced for
    pub room_type: RoomType,
    /// Stay dates (check-out strictly after check-in)
    pub stay: StayDates,
    /// Number of guests (at least one)
    pub guests: u32,
    /// Who the booking belongs to
    pub guest: GuestIdentity,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// Total amount as last priced (or manually overridden)
    pub total_amount: Money,
    /// Base nightly rate captured at booking time, excluding tax
    pub price_per_night: Money,
    /// Free-text guest requests
    pub special_requests: Option<String>,
    /// Set on check-in
    pub actual_check_in: Option<DateTime<Utc>>,
    /// Set on check-out
    pub actual_check_out: Option<DateTime<Utc>>,
    /// Set on cancellation
    pub cancellation_reason: Option<String>,
    /// Set when a payment succeeded
    pub payment_reference: Option<String>,
    /// Promotional code applied at booking time
    pub promo_code: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency version
    pub version: u64,
}

impl Reservation {
    /// Human-facing confirmation number
    #[must_use]
    pub fn confirmation_number(&self) -> String {
        self.id.confirmation_number()
    }
}

/// A reservation before the repository has assigned it an id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    /// Owning hotel
    pub hotel_id: HotelId,
    /// Assigned room
    pub room_id: Option<RoomId>,
    /// Room category
    pub room_type: RoomType,
    /// Stay dates
    pub stay: StayDates,
    /// Number of guests
    pub guests: u32,
    /// Who the booking belongs to
    pub guest: GuestIdentity,
    /// Priced total
    pub total_amount: Money,
    /// Base nightly rate snapshot
    pub price_per_night: Money,
    /// Free-text guest requests
    pub special_requests: Option<String>,
    /// Applied promotional code
    pub promo_code: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl NewReservation {
    /// Materialises the reservation in `PENDING` with the assigned id
    #[must_use]
    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            hotel_id: self.hotel_id,
            room_id: self.room_id,
            room_type: self.room_type,
            stay: self.stay,
            guests: self.guests,
            guest: self.guest,
            status: ReservationStatus::Pending,
            total_amount: self.total_amount,
            price_per_night: self.price_per_night,
            special_requests: self.special_requests,
            actual_check_in: None,
            actual_check_out: None,
            cancellation_reason: None,
            payment_reference: None,
            promo_code: self.promo_code,
            created_at: self.created_at,
            version: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_confirmation_number_is_zero_padded() {
        assert_eq!(ReservationId::new(42).confirmation_number(), "BK00000042");
        assert_eq!(ReservationId::new(123_456_789).confirmation_number(), "BK123456789");
    }

    #[test]
    fn test_money_rounds_half_up_only_when_asked() {
        let amount = Money::new(dec!(10.005));
        assert_eq!(amount.amount(), dec!(10.005));
        assert_eq!(amount.rounded().amount(), dec!(10.01));
        assert_eq!(Money::new(dec!(10.004)).rounded().amount(), dec!(10.00));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_major(345).to_string(), "$345.00");
        assert_eq!(Money::new(dec!(310.5)).to_string(), "$310.50");
        assert_eq!(Money::new(dec!(-4.255)).to_string(), "-$4.26");
    }

    #[test]
    fn test_money_minor_units() {
        assert_eq!(Money::new(dec!(310.50)).to_minor_units(), Some(31050));
        assert_eq!(Money::new(dec!(0.125)).to_minor_units(), Some(13));
    }

    #[test]
    fn test_money_saturating_sub() {
        let a = Money::from_major(10);
        let b = Money::from_major(25);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a), Money::from_major(15));
    }

    #[test]
    fn test_stay_dates_reject_non_positive_ranges() {
        assert!(StayDates::new(date(2025, 3, 4), date(2025, 3, 4)).is_none());
        assert!(StayDates::new(date(2025, 3, 5), date(2025, 3, 4)).is_none());
        let stay = StayDates::new(date(2025, 3, 4), date(2025, 3, 7)).unwrap();
        assert_eq!(stay.nights(), 3);
        assert_eq!(stay.each_night().count(), 3);
    }

    #[test]
    fn test_stay_overlap_is_half_open() {
        let first = StayDates::new(date(2025, 3, 1), date(2025, 3, 4)).unwrap();
        let back_to_back = StayDates::new(date(2025, 3, 4), date(2025, 3, 6)).unwrap();
        let inside = StayDates::new(date(2025, 3, 2), date(2025, 3, 3)).unwrap();
        assert!(!first.overlaps(&back_to_back));
        assert!(first.overlaps(&inside));
        assert!(inside.overlaps(&first));
    }

    #[test]
    fn test_room_type_parsing() {
        assert_eq!("suite".parse::<RoomType>(), Ok(RoomType::Suite));
        assert!("penthouse".parse::<RoomType>().is_err());
    }

    #[test]
    fn test_guest_identity_email() {
        let anonymous = GuestIdentity::Anonymous(GuestInfo {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        });
        assert_eq!(anonymous.email(), Some("ada@example.com"));
        assert_eq!(anonymous.user_id(), None);

        let registered = GuestIdentity::Registered {
            user_id: UserId::new(7),
            snapshot: None,
        };
        assert_eq!(registered.email(), None);
        assert_eq!(registered.user_id(), Some(UserId::new(7)));
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ReservationStatus::CheckedIn).unwrap();
        assert_eq!(json, "\"CHECKED_IN\"");
    }
}
