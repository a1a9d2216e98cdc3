//! Pure pricing stages.
//!
//! Each stage takes the running total plus already-fetched data and returns
//! the new running total with the line items it produced. No stage performs
//! I/O and no stage rounds; rounding happens once at the tax boundary.

use crate::breakdown::{DayAdjustment, LineItem, Savings};
use chrono::{Datelike, NaiveDate, Weekday};
use hotel_ops_core::Decimal;
use hotel_ops_core::rates::{PricingStrategy, SeasonalRate, StrategyContext, by_priority};
use hotel_ops_core::types::{Money, StayDates};
use rust_decimal::RoundingStrategy;

/// Friday and Saturday nights carry the weekend premium
#[must_use]
pub fn is_weekend_night(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Fri | Weekday::Sat)
}

/// Sorts strategies into application order (priority desc, id asc)
pub fn order_strategies(strategies: &mut [PricingStrategy]) {
    strategies.sort_by(|a, b| by_priority((a.priority, a.id.value()), (b.priority, b.id.value())));
}

/// Sorts seasonal rates into application order (priority desc, id asc)
pub fn order_seasonal_rates(rates: &mut [SeasonalRate]) {
    rates.sort_by(|a, b| by_priority((a.priority, a.id.value()), (b.priority, b.id.value())));
}

/// Adds the delta of every matching strategy.
///
/// Deltas are computed against `base_total`, never against each other's
/// output. Strategies whose rule does not match, or whose delta is zero,
/// contribute nothing and are not listed.
#[must_use]
pub fn apply_strategies(
    running_total: Money,
    base_total: Money,
    strategies: &[PricingStrategy],
    ctx: &StrategyContext,
) -> (Money, Vec<LineItem>) {
    let mut total = running_total;
    let mut lines = Vec::new();
    for strategy in strategies.iter().filter(|strategy| strategy.rule.matches(ctx)) {
        let delta = strategy.adjustment(base_total);
        if delta.is_zero() {
            continue;
        }
        total += delta;
        lines.push(LineItem {
            label: strategy.name.clone(),
            amount: delta,
        });
    }
    (total, lines)
}

/// Folds the running total through every seasonal rate in order
#[must_use]
pub fn apply_seasonal_rates(
    running_total: Money,
    rates: &[SeasonalRate],
) -> (Money, Vec<LineItem>) {
    let mut total = running_total;
    let mut lines = Vec::new();
    for rate in rates {
        let next = rate.apply(total);
        let delta = next - total;
        total = next;
        if !delta.is_zero() {
            lines.push(LineItem {
                label: rate.season_name.clone(),
                amount: delta,
            });
        }
    }
    (total, lines)
}

/// Adds `premium_rate` of the average nightly share for each Friday/Saturday night.
///
/// The share is `running_total / nights`, taken once before any premium is
/// added, so every weekend night gets the same premium.
#[must_use]
pub fn apply_weekend_premium(
    running_total: Money,
    stay: &StayDates,
    premium_rate: Decimal,
) -> (Money, Vec<DayAdjustment>) {
    let Some(nightly_share) = running_total.split(stay.nights()) else {
        return (running_total, Vec::new());
    };
    let premium = nightly_share.scale(premium_rate);

    let days: Vec<DayAdjustment> = stay
        .each_night()
        .filter(|night| is_weekend_night(*night))
        .map(|date| DayAdjustment {
            date,
            amount: premium,
        })
        .collect();
    let total = running_total + days.iter().map(|day| day.amount).sum::<Money>();
    (total, days)
}

/// Tax on the pre-tax subtotal, rounded to cents
#[must_use]
pub fn tax_on(subtotal: Money, tax_rate: Decimal) -> Money {
    subtotal.scale(tax_rate).rounded()
}

/// Savings of `subtotal` against `base_total`, only when positive
#[must_use]
pub fn savings(base_total: Money, subtotal: Money) -> Option<Savings> {
    let saved = base_total - subtotal;
    if !saved.is_positive() || !base_total.is_positive() {
        return None;
    }
    let ratio = (saved.amount() / base_total.amount())
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    let percentage = (ratio * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Some(Savings {
        amount: saved.rounded(),
        percentage,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hotel_ops_core::rates::{RateAdjustment, StrategyRule};
    use hotel_ops_core::types::{HotelId, SeasonalRateId, StrategyId};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strategy(
        id: u64,
        name: &str,
        multiplier: Decimal,
        priority: i32,
        rule: StrategyRule,
    ) -> PricingStrategy {
        PricingStrategy {
            id: StrategyId::new(id),
            hotel_id: HotelId::new(1),
            name: name.to_string(),
            room_type: None,
            multiplier,
            priority,
            active: true,
            effective_from: None,
            effective_to: None,
            rule,
        }
    }

    fn season(id: u64, name: &str, adjustment: RateAdjustment, priority: i32) -> SeasonalRate {
        SeasonalRate {
            id: SeasonalRateId::new(id),
            hotel_id: HotelId::new(1),
            season_name: name.to_string(),
            start_date: date(2025, 1, 1),
            end_date: date(2025, 12, 31),
            room_type: None,
            adjustment,
            priority,
            active: true,
        }
    }

    const CTX: StrategyContext = StrategyContext {
        advance_days: 30,
        nights: 3,
        occupancy: None,
    };

    #[test]
    fn test_strategy_deltas_are_additive_against_base() {
        let base = Money::from_major(300);
        let strategies = vec![
            strategy(1, "Early bird", dec!(0.9), 5, StrategyRule::EarlyBird { advance_days: 14 }),
            strategy(2, "Flat uplift", dec!(1.1), 1, StrategyRule::Flat),
        ];
        let (total, lines) = apply_strategies(base, base, &strategies, &CTX);
        // -30 + 30, not compounded
        assert_eq!(total, base);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].amount, Money::from_major(-30));
        assert_eq!(lines[1].amount, Money::from_major(30));
    }

    #[test]
    fn test_zero_delta_strategy_is_not_listed() {
        let base = Money::from_major(300);
        let strategies = vec![strategy(1, "Neutral", Decimal::ONE, 0, StrategyRule::Flat)];
        let (total, lines) = apply_strategies(base, base, &strategies, &CTX);
        assert_eq!(total, base);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_ordering_priority_desc_then_id_asc() {
        let mut strategies = vec![
            strategy(3, "c", dec!(1.1), 1, StrategyRule::Flat),
            strategy(2, "b", dec!(1.1), 9, StrategyRule::Flat),
            strategy(1, "a", dec!(1.1), 9, StrategyRule::Flat),
        ];
        order_strategies(&mut strategies);
        let names: Vec<_> = strategies.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_seasonal_rates_compound_in_order() {
        let mut rates = vec![
            season(2, "Festival", RateAdjustment::Fixed(Money::from_major(50)), 1),
            season(1, "Summer", RateAdjustment::Multiplier(dec!(1.5)), 10),
        ];
        order_seasonal_rates(&mut rates);
        let (total, lines) = apply_seasonal_rates(Money::from_major(200), &rates);
        // 200 * 1.5 = 300, then + 50
        assert_eq!(total, Money::from_major(350));
        assert_eq!(lines[0].label, "Summer");
        assert_eq!(lines[0].amount, Money::from_major(100));
        assert_eq!(lines[1].amount, Money::from_major(50));
    }

    #[test]
    fn test_neutral_season_is_not_listed() {
        let rates = vec![season(1, "Shoulder", RateAdjustment::Multiplier(Decimal::ONE), 0)];
        let (total, lines) = apply_seasonal_rates(Money::from_major(200), &rates);
        assert_eq!(total, Money::from_major(200));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_weekend_premium_on_friday_and_saturday() {
        // Fri 2025-06-06 .. Mon 2025-06-09
        let stay = StayDates::new(date(2025, 6, 6), date(2025, 6, 9)).unwrap();
        let (total, days) = apply_weekend_premium(Money::from_major(300), &stay, dec!(0.20));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(2025, 6, 6));
        assert_eq!(days[1].date, date(2025, 6, 7));
        assert_eq!(total, Money::from_major(340));
    }

    #[test]
    fn test_weekend_premium_uses_average_nightly_share() {
        let stay = StayDates::new(date(2025, 6, 5), date(2025, 6, 8)).unwrap();
        let (total, days) = apply_weekend_premium(Money::from_major(100), &stay, dec!(0.20));
        // share = 33.333..., premium unrounded
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].amount, days[1].amount);
        assert_eq!(total.rounded(), Money::from_minor(11_333));
    }

    #[test]
    fn test_savings_only_when_positive() {
        assert_eq!(savings(Money::from_major(300), Money::from_major(300)), None);
        assert_eq!(savings(Money::from_major(300), Money::from_major(340)), None);
        let saved = savings(Money::from_major(300), Money::from_major(270)).unwrap();
        assert_eq!(saved.amount, Money::from_major(30));
        assert_eq!(saved.percentage, dec!(10.00));
    }

    #[test]
    fn test_savings_percentage_rounding() {
        let saved = savings(Money::from_major(300), Money::from_major(200)).unwrap();
        // 0.3333 * 100
        assert_eq!(saved.percentage, dec!(33.33));
    }

    #[test]
    fn test_tax_is_rounded_half_up() {
        assert_eq!(tax_on(Money::from_major(270), dec!(0.15)), Money::from_minor(4050));
        assert_eq!(tax_on(Money::from_minor(3), dec!(0.5)), Money::from_minor(2));
    }

    proptest! {
        #[test]
        fn prop_non_matching_strategy_is_a_no_op(
            base_major in 1i64..100_000,
            multiplier_pct in 1i64..300,
            nights in 1u32..6,
        ) {
            let base = Money::from_major(base_major);
            let ctx = StrategyContext { advance_days: 0, nights, occupancy: None };
            let strategies = vec![strategy(
                1,
                "Long stay",
                Decimal::new(multiplier_pct, 2),
                0,
                StrategyRule::LengthOfStay { min_nights: 7 },
            )];
            let (total, lines) = apply_strategies(base, base, &strategies, &ctx);
            prop_assert_eq!(total, base);
            prop_assert!(lines.is_empty());
        }

        #[test]
        fn prop_weekday_only_stays_have_no_premium(base_major in 1i64..10_000, nights in 1u32..4) {
            // Monday 2025-06-02; up to Thursday night
            let check_in = date(2025, 6, 2);
            let check_out = check_in + chrono::Days::new(u64::from(nights));
            let stay = StayDates::new(check_in, check_out).unwrap();
            let base = Money::from_major(base_major);
            let (total, days) = apply_weekend_premium(base, &stay, dec!(0.20));
            prop_assert_eq!(total, base);
            prop_assert!(days.is_empty());
        }
    }
}
