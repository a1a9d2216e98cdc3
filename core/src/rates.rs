//! Pricing rule types: strategies, seasonal rates and promotional codes.
//!
//! Strategies are a closed sum type ([`StrategyRule`]) so each kind carries
//! only the thresholds it needs.

use crate::types::{HotelId, Money, RoomType, SeasonalRateId, StrategyId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default minimum stay for length-of-stay pricing
pub const LENGTH_OF_STAY_MIN_NIGHTS: u32 = 7;

/// Maximum advance (in days) for a booking to count as last-minute
pub const LAST_MINUTE_MAX_ADVANCE_DAYS: i64 = 1;

// ============================================================================
// Pricing strategies
// ============================================================================

/// Applicability rule of a pricing strategy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyRule {
    /// Applies when hotel occupancy over the stay is within the bounds (inclusive)
    DemandBased {
        /// Lower occupancy bound, as a fraction in `[0, 1]`
        min_occupancy: Option<Decimal>,
        /// Upper occupancy bound, as a fraction in `[0, 1]`
        max_occupancy: Option<Decimal>,
    },
    /// Applies when the booking is made at least `advance_days` before check-in
    EarlyBird {
        /// Minimum days between today and check-in
        advance_days: u32,
    },
    /// Applies to same-day and next-day arrivals
    LastMinute,
    /// Applies to stays of at least `min_nights`
    LengthOfStay {
        /// Minimum nights
        min_nights: u32,
    },
    /// Always applies
    Flat,
}

/// Facts a strategy's applicability is judged against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrategyContext {
    /// Days between today and check-in (may be negative for past dates)
    pub advance_days: i64,
    /// Nights in the stay
    pub nights: u32,
    /// Hotel occupancy over the stay, when it was fetched
    pub occupancy: Option<Decimal>,
}

impl StrategyRule {
    /// Whether this rule matches the booking described by `ctx`
    #[must_use]
    pub fn matches(&self, ctx: &StrategyContext) -> bool {
        match self {
            Self::DemandBased {
                min_occupancy,
                max_occupancy,
            } => {
                let occupancy = ctx.occupancy.unwrap_or(Decimal::ZERO);
                min_occupancy.is_none_or(|min| occupancy >= min)
                    && max_occupancy.is_none_or(|max| occupancy <= max)
            }
            Self::EarlyBird { advance_days } => ctx.advance_days >= i64::from(*advance_days),
            Self::LastMinute => ctx.advance_days <= LAST_MINUTE_MAX_ADVANCE_DAYS,
            Self::LengthOfStay { min_nights } => ctx.nights >= *min_nights,
            Self::Flat => true,
        }
    }

    /// True for the rule kind that needs an occupancy lookup
    #[must_use]
    pub const fn needs_occupancy(&self) -> bool {
        matches!(self, Self::DemandBased { .. })
    }
}

/// A named, conditionally applicable rate multiplier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingStrategy {
    /// Strategy id
    pub id: StrategyId,
    /// Owning hotel
    pub hotel_id: HotelId,
    /// Display name
    pub name: String,
    /// Room type restriction (`None` = all room types)
    pub room_type: Option<RoomType>,
    /// Multiplier on the base total; the adjustment is `base * (multiplier - 1)`
    pub multiplier: Decimal,
    /// Higher priority is applied first
    pub priority: i32,
    /// Inactive strategies are ignored
    pub active: bool,
    /// First day the strategy is effective
    pub effective_from: Option<NaiveDate>,
    /// Last day the strategy is effective
    pub effective_to: Option<NaiveDate>,
    /// Applicability rule
    pub rule: StrategyRule,
}

impl PricingStrategy {
    /// Whether the strategy is live for this room type on `date`
    #[must_use]
    pub fn is_effective(&self, room_type: RoomType, date: NaiveDate) -> bool {
        self.active
            && self.room_type.is_none_or(|rt| rt == room_type)
            && self.effective_from.is_none_or(|from| date >= from)
            && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Adjustment this strategy contributes against `base_total`
    #[must_use]
    pub fn adjustment(&self, base_total: Money) -> Money {
        base_total.scale(self.multiplier - Decimal::ONE)
    }
}

// ============================================================================
// Seasonal rates
// ============================================================================

/// How a seasonal rate transforms the running total
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateAdjustment {
    /// Multiply the running total
    Multiplier(Decimal),
    /// Add a fixed amount (negative for a discount)
    Fixed(Money),
}

/// A date-range-scoped rate transformation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalRate {
    /// Rate id
    pub id: SeasonalRateId,
    /// Owning hotel
    pub hotel_id: HotelId,
    /// Season label shown in breakdowns
    pub season_name: String,
    /// First day of the season
    pub start_date: NaiveDate,
    /// Last day of the season (inclusive)
    pub end_date: NaiveDate,
    /// Room type restriction (`None` = all room types)
    pub room_type: Option<RoomType>,
    /// Transformation applied to the running total
    pub adjustment: RateAdjustment,
    /// Higher priority is applied first
    pub priority: i32,
    /// Inactive rates are ignored
    pub active: bool,
}

impl SeasonalRate {
    /// Whether the rate applies to a stay of this room type starting on `check_in`
    #[must_use]
    pub fn applies_to(&self, room_type: RoomType, check_in: NaiveDate) -> bool {
        self.active
            && self.room_type.is_none_or(|rt| rt == room_type)
            && check_in >= self.start_date
            && check_in <= self.end_date
    }

    /// Transforms the running total
    #[must_use]
    pub fn apply(&self, running_total: Money) -> Money {
        match self.adjustment {
            RateAdjustment::Multiplier(factor) => running_total.scale(factor),
            RateAdjustment::Fixed(amount) => running_total + amount,
        }
    }
}

/// Ordering used for strategies and seasonal rates: priority descending, then id ascending
#[must_use]
pub fn by_priority(a: (i32, u64), b: (i32, u64)) -> Ordering {
    b.0.cmp(&a.0).then(a.1.cmp(&b.1))
}

// ============================================================================
// Promotional codes
// ============================================================================

/// How a promotional code computes its discount
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountRule {
    /// Percentage of the amount (e.g. `10` for 10%)
    Percentage(Decimal),
    /// Fixed amount off
    Fixed(Money),
}

/// A guest-supplied discount token with eligibility constraints
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionalCode {
    /// Owning hotel
    pub hotel_id: HotelId,
    /// The code guests type in
    pub code: String,
    /// Description shown in breakdowns
    pub description: Option<String>,
    /// Discount computation
    pub discount: DiscountRule,
    /// Cap on the computed discount
    pub max_discount: Option<Money>,
    /// Minimum running total for the code to apply
    pub min_amount: Option<Money>,
    /// First valid check-in date
    pub valid_from: NaiveDate,
    /// Last valid check-in date (inclusive)
    pub valid_to: NaiveDate,
    /// Total redemptions allowed across all guests
    pub usage_limit: Option<u32>,
    /// Redemptions so far
    pub usage_count: u32,
    /// Redemptions allowed per guest email
    pub per_customer_limit: Option<u32>,
    /// Restricts the code to guests without previous completed stays at the hotel
    pub first_time_only: bool,
    /// Inactive codes are treated as missing
    pub active: bool,
}

impl PromotionalCode {
    /// Check-in date inside the validity window and overall usage not exhausted
    #[must_use]
    pub fn is_valid_for_date(&self, check_in: NaiveDate) -> bool {
        self.active
            && check_in >= self.valid_from
            && check_in <= self.valid_to
            && self.usage_limit.is_none_or(|limit| self.usage_count < limit)
    }

    /// Amount meets the minimum
    #[must_use]
    pub fn is_valid_for_amount(&self, amount: Money) -> bool {
        self.min_amount.is_none_or(|min| amount >= min)
    }

    /// Discount for `amount`, capped by `max_discount` and never more than `amount`
    #[must_use]
    pub fn discount_for(&self, amount: Money) -> Money {
        let raw = match self.discount {
            DiscountRule::Percentage(percent) => {
                amount.scale(percent / Decimal::ONE_HUNDRED)
            }
            DiscountRule::Fixed(value) => value,
        };
        let capped = self.max_discount.map_or(raw, |cap| raw.min(cap));
        capped.min(amount).max(Money::ZERO)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn promo(discount: DiscountRule) -> PromotionalCode {
        PromotionalCode {
            hotel_id: HotelId::new(1),
            code: "SAVE".to_string(),
            description: None,
            discount,
            max_discount: None,
            min_amount: Some(Money::from_major(200)),
            valid_from: date(2025, 1, 1),
            valid_to: date(2025, 12, 31),
            usage_limit: Some(10),
            usage_count: 0,
            per_customer_limit: None,
            first_time_only: false,
            active: true,
        }
    }

    #[test]
    fn test_percentage_discount() {
        let code = promo(DiscountRule::Percentage(dec!(10)));
        assert_eq!(code.discount_for(Money::from_major(300)), Money::from_major(30));
    }

    #[test]
    fn test_discount_respects_cap_and_amount() {
        let mut code = promo(DiscountRule::Percentage(dec!(50)));
        code.max_discount = Some(Money::from_major(40));
        assert_eq!(code.discount_for(Money::from_major(300)), Money::from_major(40));

        let fixed = promo(DiscountRule::Fixed(Money::from_major(500)));
        assert_eq!(fixed.discount_for(Money::from_major(120)), Money::from_major(120));
    }

    #[test]
    fn test_exhausted_code_is_not_valid_for_any_date() {
        let mut code = promo(DiscountRule::Percentage(dec!(10)));
        assert!(code.is_valid_for_date(date(2025, 6, 1)));
        code.usage_count = 10;
        assert!(!code.is_valid_for_date(date(2025, 6, 1)));
    }

    #[test]
    fn test_validity_window_is_inclusive() {
        let code = promo(DiscountRule::Percentage(dec!(10)));
        assert!(code.is_valid_for_date(date(2025, 12, 31)));
        assert!(!code.is_valid_for_date(date(2026, 1, 1)));
    }

    #[test]
    fn test_demand_based_bounds_are_inclusive() {
        let rule = StrategyRule::DemandBased {
            min_occupancy: Some(dec!(0.8)),
            max_occupancy: None,
        };
        let mut ctx = StrategyContext {
            advance_days: 10,
            nights: 2,
            occupancy: Some(dec!(0.8)),
        };
        assert!(rule.matches(&ctx));
        ctx.occupancy = Some(dec!(0.79));
        assert!(!rule.matches(&ctx));
    }

    #[test]
    fn test_seasonal_fixed_and_multiplier() {
        let mut rate = SeasonalRate {
            id: SeasonalRateId::new(1),
            hotel_id: HotelId::new(1),
            season_name: "Summer".to_string(),
            start_date: date(2025, 6, 1),
            end_date: date(2025, 8, 31),
            room_type: None,
            adjustment: RateAdjustment::Multiplier(dec!(1.25)),
            priority: 0,
            active: true,
        };
        assert_eq!(rate.apply(Money::from_major(200)), Money::from_major(250));
        rate.adjustment = RateAdjustment::Fixed(Money::from_major(-15));
        assert_eq!(rate.apply(Money::from_major(200)), Money::from_major(185));
        assert!(rate.applies_to(RoomType::Double, date(2025, 8, 31)));
        assert!(!rate.applies_to(RoomType::Double, date(2025, 9, 1)));
    }

    #[test]
    fn test_priority_ordering() {
        let mut keys = vec![(0, 3), (5, 2), (5, 1), (1, 9)];
        keys.sort_by(|a, b| by_priority(*a, *b));
        assert_eq!(keys, vec![(5, 1), (5, 2), (1, 9), (0, 3)]);
    }

    proptest! {
        #[test]
        fn prop_last_minute_only_within_one_day(advance in -30i64..60) {
            let ctx = StrategyContext { advance_days: advance, nights: 1, occupancy: None };
            prop_assert_eq!(StrategyRule::LastMinute.matches(&ctx), advance <= 1);
        }

        #[test]
        fn prop_length_of_stay_threshold(nights in 1u32..30) {
            let ctx = StrategyContext { advance_days: 0, nights, occupancy: None };
            let rule = StrategyRule::LengthOfStay { min_nights: LENGTH_OF_STAY_MIN_NIGHTS };
            prop_assert_eq!(rule.matches(&ctx), nights >= 7);
        }
    }
}
