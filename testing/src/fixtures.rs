//! Fixture builders for rooms, rules and reservations.
//!
//! Every fixture belongs to [`HOTEL`] unless stated otherwise.

#![allow(clippy::expect_used)] // fixtures take hardcoded, valid dates

use chrono::{Days, NaiveDate};
use hotel_ops_core::rates::{
    DiscountRule, PricingStrategy, PromotionalCode, RateAdjustment, SeasonalRate, StrategyRule,
};
use hotel_ops_core::types::{
    GuestIdentity, GuestInfo, HotelId, Money, Reservation, ReservationId, ReservationStatus, Room,
    RoomId, RoomType, SeasonalRateId, StayDates, StrategyId,
};
use hotel_ops_core::{DateTime, Decimal, Utc};
use proptest::prelude::*;

/// The hotel every fixture belongs to
pub const HOTEL: HotelId = HotelId::new(1);

/// Calendar date from literal parts
///
/// # Panics
///
/// Panics on an impossible date.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("fixture date should be valid")
}

/// Stay of `nights` nights starting on `check_in`
///
/// # Panics
///
/// Panics when `nights` is zero.
#[must_use]
pub fn stay(check_in: NaiveDate, nights: u64) -> StayDates {
    StayDates::new(check_in, check_in + Days::new(nights))
        .expect("fixture stay needs at least one night")
}

/// Creation timestamp used by reservation fixtures
#[must_use]
pub fn booked_at() -> DateTime<Utc> {
    date(2024, 12, 1).and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Room numbered `number` (also its id), sleeping two, at `rate` per night
#[must_use]
pub fn room(number: u64, room_type: RoomType, rate: i64) -> Room {
    Room::new(
        RoomId::new(number),
        HOTEL,
        number.to_string(),
        room_type,
        Money::from_major(rate),
        2,
    )
}

/// Guest contact details
#[must_use]
pub fn guest(name: &str, email: &str) -> GuestInfo {
    GuestInfo {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
    }
}

/// Reservation of a double room at $100/night for two guests
#[must_use]
pub fn reservation(
    id: u64,
    room_id: Option<RoomId>,
    status: ReservationStatus,
    check_in: NaiveDate,
    nights: u64,
) -> Reservation {
    let stay = stay(check_in, nights);
    let price_per_night = Money::from_major(100);
    Reservation {
        id: ReservationId::new(id),
        hotel_id: HOTEL,
        room_id,
        room_type: RoomType::Double,
        stay,
        guests: 2,
        guest: GuestIdentity::Anonymous(guest("Ada Lovelace", "ada@example.com")),
        status,
        total_amount: price_per_night
            .scale(Decimal::from(stay.nights()))
            .scale(Decimal::new(115, 2)),
        price_per_night,
        special_requests: None,
        actual_check_in: None,
        actual_check_out: None,
        cancellation_reason: None,
        payment_reference: None,
        promo_code: None,
        created_at: booked_at(),
        version: 0,
    }
}

/// Always-effective strategy for all room types, priority 0
#[must_use]
pub fn strategy(id: u64, name: &str, multiplier: Decimal, rule: StrategyRule) -> PricingStrategy {
    PricingStrategy {
        id: StrategyId::new(id),
        hotel_id: HOTEL,
        name: name.to_string(),
        room_type: None,
        multiplier,
        priority: 0,
        active: true,
        effective_from: None,
        effective_to: None,
        rule,
    }
}

/// Seasonal rate for all room types, priority 0
#[must_use]
pub fn season(
    id: u64,
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    adjustment: RateAdjustment,
) -> SeasonalRate {
    SeasonalRate {
        id: SeasonalRateId::new(id),
        hotel_id: HOTEL,
        season_name: name.to_string(),
        start_date,
        end_date,
        room_type: None,
        adjustment,
        priority: 0,
        active: true,
    }
}

/// Percentage code valid for check-ins during 2025, minimum $200, 100 uses
#[must_use]
pub fn percentage_promotion(code: &str, percent: Decimal) -> PromotionalCode {
    PromotionalCode {
        hotel_id: HOTEL,
        code: code.to_string(),
        description: Some(format!("{percent}% off")),
        discount: DiscountRule::Percentage(percent),
        max_discount: None,
        min_amount: Some(Money::from_major(200)),
        valid_from: date(2025, 1, 1),
        valid_to: date(2025, 12, 31),
        usage_limit: Some(100),
        usage_count: 0,
        per_customer_limit: None,
        first_time_only: false,
        active: true,
    }
}

// ============================================================================
// Property-based generators
// ============================================================================

/// Any reservation status
pub fn any_status() -> impl Strategy<Value = ReservationStatus> {
    prop_oneof![
        Just(ReservationStatus::Pending),
        Just(ReservationStatus::Confirmed),
        Just(ReservationStatus::CheckedIn),
        Just(ReservationStatus::CheckedOut),
        Just(ReservationStatus::Cancelled),
        Just(ReservationStatus::NoShow),
    ]
}

/// Check-in during 2025 and a stay of 1 to 30 nights
pub fn any_stay() -> impl Strategy<Value = StayDates> {
    (0u64..365, 1u64..=30)
        .prop_map(|(offset, nights)| stay(date(2025, 1, 1) + Days::new(offset), nights))
}
