//! Promotional code validation.
//!
//! Validation never fails a pricing call. Every problem, including a storage
//! error during lookup, comes back as a [`PromotionRejection`] that the
//! pipeline records on the breakdown.

use hotel_ops_core::NaiveDate;
use hotel_ops_core::environment::PromotionRepository;
use hotel_ops_core::rates::PromotionalCode;
use hotel_ops_core::types::{HotelId, Money};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Why a promotional code was not applied
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionRejection {
    /// No active code with this name at the hotel
    #[error("Invalid or expired promotional code")]
    NotFound,

    /// Check-in outside the validity window, or the code is used up
    #[error("Promotional code is not valid for the selected dates")]
    NotValidForDates,

    /// Running total below the code's minimum
    #[error("Booking amount does not meet the minimum of {minimum} for this promotional code")]
    BelowMinimumAmount {
        /// Required minimum
        minimum: Money,
    },

    /// Guest already redeemed the code as often as allowed
    #[error("Promotional code usage limit exceeded for this customer")]
    CustomerLimitReached,

    /// Code is restricted to guests without a previous stay
    #[error("Promotional code is only valid for first-time customers")]
    FirstTimeCustomersOnly,

    /// Promotion data could not be read
    #[error("Promotional code could not be verified")]
    Unverifiable,
}

/// Outcome of [`PromotionValidator::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// All checks passed
    Valid(PromotionalCode),
    /// First failing check
    Invalid(PromotionRejection),
}

impl ValidationResult {
    /// True when the code may be applied
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// The rejection reason, if any
    #[must_use]
    pub const fn reason(&self) -> Option<&PromotionRejection> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

/// Runs the promotional code checks in their fixed order
#[derive(Clone)]
pub struct PromotionValidator {
    promotions: Arc<dyn PromotionRepository>,
}

impl PromotionValidator {
    /// Creates a validator over the given promotion store
    #[must_use]
    pub fn new(promotions: Arc<dyn PromotionRepository>) -> Self {
        Self { promotions }
    }

    /// Validates `code` for a booking worth `candidate_amount` arriving on `check_in`.
    ///
    /// Checks short-circuit in this order: code exists and is active, check-in
    /// within the validity window (and overall usage left), minimum amount,
    /// per-customer usage (only with an email), first-time customer (only
    /// with an email and when the code requires it).
    pub async fn validate(
        &self,
        code: &str,
        hotel_id: HotelId,
        candidate_amount: Money,
        check_in: NaiveDate,
        customer_email: Option<&str>,
    ) -> ValidationResult {
        match self
            .check(code, hotel_id, candidate_amount, check_in, customer_email)
            .await
        {
            Ok(promotion) => ValidationResult::Valid(promotion),
            Err(rejection) => {
                tracing::debug!(code, %hotel_id, %rejection, "promotional code rejected");
                ValidationResult::Invalid(rejection)
            }
        }
    }

    async fn check(
        &self,
        code: &str,
        hotel_id: HotelId,
        candidate_amount: Money,
        check_in: NaiveDate,
        customer_email: Option<&str>,
    ) -> Result<PromotionalCode, PromotionRejection> {
        let promotion = self
            .promotions
            .find_active(hotel_id, code)
            .await
            .map_err(|error| unverifiable(code, &error))?
            .filter(|promotion| promotion.active)
            .ok_or(PromotionRejection::NotFound)?;

        if !promotion.is_valid_for_date(check_in) {
            return Err(PromotionRejection::NotValidForDates);
        }

        if !promotion.is_valid_for_amount(candidate_amount) {
            return Err(PromotionRejection::BelowMinimumAmount {
                minimum: promotion.min_amount.unwrap_or(Money::ZERO),
            });
        }

        let Some(email) = customer_email else {
            return Ok(promotion);
        };

        if let Some(limit) = promotion.per_customer_limit {
            let used = self
                .promotions
                .customer_usage(hotel_id, code, email)
                .await
                .map_err(|error| unverifiable(code, &error))?;
            if used >= limit {
                return Err(PromotionRejection::CustomerLimitReached);
            }
        }

        if promotion.first_time_only {
            let stays = self
                .promotions
                .completed_stays(hotel_id, email)
                .await
                .map_err(|error| unverifiable(code, &error))?;
            if stays > 0 {
                return Err(PromotionRejection::FirstTimeCustomersOnly);
            }
        }

        Ok(promotion)
    }
}

fn unverifiable(code: &str, error: &hotel_ops_core::RepositoryError) -> PromotionRejection {
    tracing::warn!(code, %error, "promotion lookup failed, continuing without discount");
    PromotionRejection::Unverifiable
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hotel_ops_testing::InMemoryHotel;
    use hotel_ops_testing::fixtures;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn validator_with(promotion: PromotionalCode) -> (PromotionValidator, Arc<InMemoryHotel>) {
        let hotel = Arc::new(InMemoryHotel::new());
        hotel.add_promotion(promotion);
        (PromotionValidator::new(hotel.clone()), hotel)
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let (validator, _) = validator_with(fixtures::percentage_promotion("SAVE10", dec!(10)));
        let result = validator
            .validate("NOPE", fixtures::HOTEL, Money::from_major(300), date(2025, 6, 3), None)
            .await;
        assert_eq!(result.reason(), Some(&PromotionRejection::NotFound));
    }

    #[tokio::test]
    async fn test_date_check_runs_before_amount_check() {
        let (validator, _) = validator_with(fixtures::percentage_promotion("SAVE10", dec!(10)));
        // both the date and the amount are wrong; the date wins
        let result = validator
            .validate("SAVE10", fixtures::HOTEL, Money::from_major(50), date(2030, 1, 1), None)
            .await;
        assert_eq!(result.reason(), Some(&PromotionRejection::NotValidForDates));
    }

    #[tokio::test]
    async fn test_below_minimum_amount() {
        let (validator, _) = validator_with(fixtures::percentage_promotion("SAVE10", dec!(10)));
        let result = validator
            .validate("SAVE10", fixtures::HOTEL, Money::from_major(199), date(2025, 6, 3), None)
            .await;
        assert_eq!(
            result.reason(),
            Some(&PromotionRejection::BelowMinimumAmount {
                minimum: Money::from_major(200)
            })
        );
    }

    #[tokio::test]
    async fn test_per_customer_limit_only_checked_with_email() {
        let mut promotion = fixtures::percentage_promotion("SAVE10", dec!(10));
        promotion.per_customer_limit = Some(1);
        let (validator, hotel) = validator_with(promotion);
        hotel.add_redemption(fixtures::HOTEL, "SAVE10", "ada@example.com");

        let anonymous = validator
            .validate("SAVE10", fixtures::HOTEL, Money::from_major(300), date(2025, 6, 3), None)
            .await;
        assert!(anonymous.is_valid());

        let repeat = validator
            .validate(
                "SAVE10",
                fixtures::HOTEL,
                Money::from_major(300),
                date(2025, 6, 3),
                Some("ada@example.com"),
            )
            .await;
        assert_eq!(repeat.reason(), Some(&PromotionRejection::CustomerLimitReached));
    }

    #[tokio::test]
    async fn test_first_time_only_rejects_returning_guest() {
        let mut promotion = fixtures::percentage_promotion("WELCOME", dec!(15));
        promotion.first_time_only = true;
        let (validator, hotel) = validator_with(promotion);
        hotel.add_completed_stay(fixtures::HOTEL, "returning@example.com");

        let returning = validator
            .validate(
                "WELCOME",
                fixtures::HOTEL,
                Money::from_major(300),
                date(2025, 6, 3),
                Some("returning@example.com"),
            )
            .await;
        assert_eq!(returning.reason(), Some(&PromotionRejection::FirstTimeCustomersOnly));

        let newcomer = validator
            .validate(
                "WELCOME",
                fixtures::HOTEL,
                Money::from_major(300),
                date(2025, 6, 3),
                Some("new@example.com"),
            )
            .await;
        assert!(newcomer.is_valid());
    }

    #[tokio::test]
    async fn test_storage_failure_is_unverifiable_not_an_error() {
        let (validator, hotel) = validator_with(fixtures::percentage_promotion("SAVE10", dec!(10)));
        hotel.fail_promotion_lookups(true);
        let result = validator
            .validate("SAVE10", fixtures::HOTEL, Money::from_major(300), date(2025, 6, 3), None)
            .await;
        assert_eq!(result.reason(), Some(&PromotionRejection::Unverifiable));
    }
}
