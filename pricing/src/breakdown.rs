//! Pricing request and the itemised breakdown produced for it.
//!
//! A breakdown is ephemeral: only `final_total` and the base nightly rate
//! survive onto a reservation.

use crate::promotion::PromotionRejection;
use hotel_ops_core::types::{HotelId, Money, RoomType};
use hotel_ops_core::{Decimal, NaiveDate};
use serde::{Deserialize, Serialize};

/// Input to [`crate::PricingPipeline::compute_cost`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRequest {
    /// Hotel to price at
    pub hotel_id: HotelId,
    /// Room category
    pub room_type: RoomType,
    /// Arrival date
    pub check_in: NaiveDate,
    /// Departure date
    pub check_out: NaiveDate,
    /// Promotional code typed by the guest
    pub promo_code: Option<String>,
    /// Guest email, used for per-customer promotion limits
    pub customer_email: Option<String>,
}

impl PricingRequest {
    /// Request without promotion or customer details
    #[must_use]
    pub const fn new(
        hotel_id: HotelId,
        room_type: RoomType,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Self {
        Self {
            hotel_id,
            room_type,
            check_in,
            check_out,
            promo_code: None,
            customer_email: None,
        }
    }

    /// Adds a promotional code
    #[must_use]
    pub fn with_promo_code(mut self, code: impl Into<String>) -> Self {
        self.promo_code = Some(code.into());
        self
    }

    /// Adds the guest email
    #[must_use]
    pub fn with_customer_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }
}

/// A labelled adjustment (strategy or season)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Rule name
    pub label: String,
    /// Signed amount added to the running total
    pub amount: Money,
}

/// Premium charged for one weekend night
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAdjustment {
    /// The night
    pub date: NaiveDate,
    /// Premium added
    pub amount: Money,
}

/// A promotional code that was accepted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromotion {
    /// The code
    pub code: String,
    /// Its description
    pub description: Option<String>,
    /// Amount subtracted from the running total
    pub discount: Money,
}

/// Savings against the undiscounted base total
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Savings {
    /// Absolute saving (rounded to cents)
    pub amount: Money,
    /// Saving as a percentage of the base total (two decimals)
    pub percentage: Decimal,
}

/// Itemised result of a pricing call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    /// Base nightly rate for the room type
    pub base_rate_per_night: Money,
    /// Nights in the stay
    pub nights: u32,
    /// `base_rate_per_night × nights`
    pub base_total: Money,
    /// Strategy adjustments, in application order
    pub strategy_adjustments: Vec<LineItem>,
    /// Seasonal adjustments, in application order
    pub seasonal_adjustments: Vec<LineItem>,
    /// Weekend premiums, one per Friday/Saturday night
    pub weekend_adjustments: Vec<DayAdjustment>,
    /// Accepted promotion
    pub promotion: Option<AppliedPromotion>,
    /// Why a supplied promotion was not applied
    pub promotion_error: Option<PromotionRejection>,
    /// Running total after all adjustments, before tax (full precision)
    pub subtotal: Money,
    /// Tax rate applied
    pub tax_rate: Decimal,
    /// Tax (rounded to cents)
    pub tax: Money,
    /// Amount the guest pays (rounded to cents)
    pub final_total: Money,
    /// Present only when the guest pays less than the base total
    pub savings: Option<Savings>,
    /// Advisory hints, no effect on the price
    pub recommendations: Vec<String>,
}

impl PricingBreakdown {
    /// Sum of all weekend premiums
    #[must_use]
    pub fn weekend_premium(&self) -> Money {
        self.weekend_adjustments.iter().map(|day| day.amount).sum()
    }

    /// Discount granted by the promotion, zero if none
    #[must_use]
    pub fn promotion_discount(&self) -> Money {
        self.promotion
            .as_ref()
            .map_or(Money::ZERO, |promotion| promotion.discount)
    }
}

/// Price difference between an existing booking and a proposed change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationQuote {
    /// Breakdown of the proposed booking
    pub breakdown: PricingBreakdown,
    /// Final total of the original booking
    pub original_total: Money,
    /// `new final total − original total` (negative means a refund)
    pub cost_difference: Money,
}
