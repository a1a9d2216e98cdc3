//! Cancellation refund policy.

use hotel_ops_core::types::Money;
use hotel_ops_core::{Decimal, NaiveDate};

/// Share of the total refunded when cancelling `days_before` check-in.
///
/// | Notice | Refund |
/// |---|---|
/// | more than 7 days | 100% |
/// | 3 to 7 days | 50% |
/// | 1 to 2 days | 25% |
/// | same day or later | none |
#[must_use]
pub fn refund_share(days_before: i64) -> Decimal {
    match days_before {
        d if d > 7 => Decimal::ONE,
        3..=7 => Decimal::new(50, 2),
        1..=2 => Decimal::new(25, 2),
        _ => Decimal::ZERO,
    }
}

/// Refund owed for cancelling a booking worth `total` on `today`
#[must_use]
pub fn refund_for(total: Money, check_in: NaiveDate, today: NaiveDate) -> Money {
    let days_before = (check_in - today).num_days();
    total.scale(refund_share(days_before)).rounded()
}
