//! Requests and results exchanged with the [`BookingOrchestrator`](crate::BookingOrchestrator).

use hotel_ops_core::types::{GuestInfo, HotelId, Money, Reservation, RoomId, RoomType};
use hotel_ops_core::{NaiveDate, PaymentError};
use hotel_ops_pricing::PricingBreakdown;
use serde::{Deserialize, Serialize};

/// A guest asking for a room
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Hotel to book at
    pub hotel_id: HotelId,
    /// Specific room, or `None` to pick any free room of `room_type`
    pub room_id: Option<RoomId>,
    /// Room category (ignored when `room_id` is given)
    pub room_type: RoomType,
    /// Arrival date
    pub check_in: NaiveDate,
    /// Departure date
    pub check_out: NaiveDate,
    /// Number of guests
    pub guests: u32,
    /// Contact details of the guest
    pub guest: GuestInfo,
    /// Register the guest when no account exists for their email
    pub create_account: bool,
    /// Free-text requests
    pub special_requests: Option<String>,
    /// Promotional code
    pub promo_code: Option<String>,
    /// Payment method to charge; without one the booking stays pending
    pub payment_method_token: Option<String>,
}

impl BookingRequest {
    /// Request for any free room of a type, without payment or promotion
    #[must_use]
    pub const fn new(
        hotel_id: HotelId,
        room_type: RoomType,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
        guest: GuestInfo,
    ) -> Self {
        Self {
            hotel_id,
            room_id: None,
            room_type,
            check_in,
            check_out,
            guests,
            guest,
            create_account: false,
            special_requests: None,
            promo_code: None,
            payment_method_token: None,
        }
    }

    /// Books this exact room
    #[must_use]
    pub const fn for_room(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    /// Charges this payment method
    #[must_use]
    pub fn with_payment(mut self, token: impl Into<String>) -> Self {
        self.payment_method_token = Some(token.into());
        self
    }

    /// Applies a promotional code
    #[must_use]
    pub fn with_promo_code(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    /// Adds special requests
    #[must_use]
    pub fn with_special_requests(mut self, requests: impl Into<String>) -> Self {
        self.special_requests = Some(requests.into());
        self
    }

    /// Registers the guest if they have no account yet
    #[must_use]
    pub const fn registering_guest(mut self) -> Self {
        self.create_account = true;
        self
    }
}

/// What happened to the payment of a new booking
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// No payment method was supplied
    NotAttempted,
    /// Charged; the booking is confirmed
    Charged {
        /// Gateway reference
        reference: String,
    },
    /// The charge failed; the booking stays pending
    Failed(PaymentError),
    /// Charged, but the confirmation could not be stored. The booking stays
    /// pending and the reference must be reconciled by staff.
    ChargedNotConfirmed {
        /// Gateway reference
        reference: String,
        /// Why the confirmation was not stored
        reason: String,
    },
}

/// A stored booking
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingResult {
    /// The reservation as persisted
    pub reservation: Reservation,
    /// Human-facing confirmation number
    pub confirmation_number: String,
    /// How the total was computed
    pub breakdown: PricingBreakdown,
    /// Payment outcome
    pub payment: PaymentOutcome,
}

/// Where a cancellation or modification comes from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestChannel {
    /// The guest, online; minimum notice applies
    Guest,
    /// Front-desk staff; minimum notice is waived
    FrontDesk {
        /// Staff label for the audit trail
        staff: String,
    },
}

impl RequestChannel {
    /// Label used for metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::FrontDesk { .. } => "front_desk",
        }
    }
}

/// A cancelled booking and its refund
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancellationResult {
    /// The reservation after cancellation
    pub reservation: Reservation,
    /// Amount refunded under the cancellation policy
    pub refund: Money,
}

/// Requested changes; `None` keeps the current value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationChanges {
    /// New arrival date
    pub check_in: Option<NaiveDate>,
    /// New departure date
    pub check_out: Option<NaiveDate>,
    /// New guest count
    pub guests: Option<u32>,
    /// New special requests
    pub special_requests: Option<String>,
}

impl ReservationChanges {
    /// True when the stay dates change
    #[must_use]
    pub const fn changes_dates(&self) -> bool {
        self.check_in.is_some() || self.check_out.is_some()
    }
}

/// A modified booking and the money owed either way
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModificationResult {
    /// The reservation after the change
    pub reservation: Reservation,
    /// Extra amount owed by the guest
    pub additional_charges: Money,
    /// Amount refunded to the guest
    pub refund: Money,
}
