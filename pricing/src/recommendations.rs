//! Advisory hints attached to a breakdown. They never change the price.

use crate::breakdown::DayAdjustment;
use crate::stages::is_weekend_night;
use chrono::Days;
use hotel_ops_core::rates::LENGTH_OF_STAY_MIN_NIGHTS;
use hotel_ops_core::types::StayDates;

/// Advance booking (in days) suggested for early-bird pricing
pub const EARLY_BIRD_HINT_DAYS: i64 = 14;

/// Builds the recommendation strings for a priced stay
#[must_use]
pub fn recommend(
    stay: &StayDates,
    advance_days: i64,
    weekend_adjustments: &[DayAdjustment],
) -> Vec<String> {
    let mut hints = Vec::new();

    if !weekend_adjustments.is_empty() {
        if let Some(next_day) = stay.check_in().checked_add_days(Days::new(1)) {
            if !is_weekend_night(next_day) {
                hints.push(format!(
                    "Consider checking in on {next_day} to avoid weekend premiums"
                ));
            }
        }
    }

    if stay.nights() < LENGTH_OF_STAY_MIN_NIGHTS {
        hints.push(format!(
            "Stay {LENGTH_OF_STAY_MIN_NIGHTS}+ nights to qualify for extended stay discounts"
        ));
    }

    if advance_days < EARLY_BIRD_HINT_DAYS {
        hints.push(format!(
            "Book {EARLY_BIRD_HINT_DAYS}+ days in advance for early bird discounts"
        ));
    }

    hints
}
