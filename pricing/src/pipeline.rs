//! The pricing pipeline.
//!
//! [`PricingPipeline::compute_cost`] gathers everything it needs from the
//! [`RateSource`] up front, then runs the pure stages in their fixed order:
//!
//! 1. base rate × nights
//! 2. strategies (additive deltas against the base total)
//! 3. seasonal rates (compounding)
//! 4. weekend premium
//! 5. promotional code
//! 6. tax, savings, recommendations

use crate::breakdown::{AppliedPromotion, ModificationQuote, PricingBreakdown, PricingRequest};
use crate::config::PricingConfig;
use crate::promotion::{PromotionRejection, PromotionValidator, ValidationResult};
use crate::recommendations::recommend;
use crate::stages;
use hotel_ops_core::environment::{Clock, PromotionRepository, RateSource};
use hotel_ops_core::rates::StrategyContext;
use hotel_ops_core::types::{Money, StayDates};
use hotel_ops_core::{Decimal, PricingError};
use std::sync::Arc;

/// Computes booking costs from rate data and promotional codes
#[derive(Clone)]
pub struct PricingPipeline {
    rates: Arc<dyn RateSource>,
    validator: PromotionValidator,
    clock: Arc<dyn Clock>,
    config: PricingConfig,
}

impl PricingPipeline {
    /// Creates a pipeline
    #[must_use]
    pub fn new(
        rates: Arc<dyn RateSource>,
        promotions: Arc<dyn PromotionRepository>,
        clock: Arc<dyn Clock>,
        config: PricingConfig,
    ) -> Self {
        Self {
            rates,
            validator: PromotionValidator::new(promotions),
            clock,
            config,
        }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Prices a stay.
    ///
    /// # Errors
    ///
    /// - [`PricingError::RateNotFound`] when the hotel has no room of the type
    /// - [`PricingError::InvalidDateRange`] when check-out is not after check-in
    /// - [`PricingError::Repository`] when rate data cannot be read
    ///
    /// Promotional code problems never fail the call; they are reported in
    /// [`PricingBreakdown::promotion_error`].
    #[tracing::instrument(
        skip(self, request),
        fields(
            hotel_id = %request.hotel_id,
            room_type = %request.room_type,
            check_in = %request.check_in
        )
    )]
    pub async fn compute_cost(
        &self,
        request: &PricingRequest,
    ) -> Result<PricingBreakdown, PricingError> {
        let hotel_id = request.hotel_id;
        let room_type = request.room_type;

        let base_rate_per_night = self
            .rates
            .base_rate(hotel_id, room_type)
            .await?
            .ok_or(PricingError::RateNotFound { hotel_id, room_type })?;

        let stay = StayDates::new(request.check_in, request.check_out).ok_or(
            PricingError::InvalidDateRange {
                check_in: request.check_in,
                check_out: request.check_out,
            },
        )?;
        let nights = stay.nights();
        let base_total = base_rate_per_night.scale(Decimal::from(nights));

        let (strategies, seasons) = futures::try_join!(
            self.rates.active_strategies(hotel_id, room_type, stay.check_in()),
            self.rates.seasonal_rates(hotel_id, room_type, stay.check_in()),
        )?;

        let mut strategies: Vec<_> = strategies
            .into_iter()
            .filter(|strategy| strategy.is_effective(room_type, stay.check_in()))
            .collect();
        stages::order_strategies(&mut strategies);

        let mut seasons: Vec<_> = seasons
            .into_iter()
            .filter(|rate| rate.applies_to(room_type, stay.check_in()))
            .collect();
        stages::order_seasonal_rates(&mut seasons);

        let occupancy = if strategies.iter().any(|strategy| strategy.rule.needs_occupancy()) {
            Some(self.rates.occupancy(hotel_id, stay).await?)
        } else {
            None
        };

        let advance_days = (stay.check_in() - self.clock.today()).num_days();
        let ctx = StrategyContext {
            advance_days,
            nights,
            occupancy,
        };

        let (running, strategy_adjustments) =
            stages::apply_strategies(base_total, base_total, &strategies, &ctx);
        let (running, seasonal_adjustments) = stages::apply_seasonal_rates(running, &seasons);
        let (running, weekend_adjustments) =
            stages::apply_weekend_premium(running, &stay, self.config.weekend_premium_rate);
        let (subtotal, promotion, promotion_error) = self.apply_promotion(request, running).await;

        let tax = stages::tax_on(subtotal, self.config.tax_rate);
        let final_total = (subtotal + tax).rounded();
        let savings = stages::savings(base_total, subtotal);
        let recommendations = recommend(&stay, advance_days, &weekend_adjustments);

        tracing::debug!(
            %base_total,
            strategies = strategy_adjustments.len(),
            seasons = seasonal_adjustments.len(),
            weekend_nights = weekend_adjustments.len(),
            promotion_applied = promotion.is_some(),
            %final_total,
            "stay priced"
        );

        Ok(PricingBreakdown {
            base_rate_per_night,
            nights,
            base_total,
            strategy_adjustments,
            seasonal_adjustments,
            weekend_adjustments,
            promotion,
            promotion_error,
            subtotal,
            tax_rate: self.config.tax_rate,
            tax,
            final_total,
            savings,
            recommendations,
        })
    }

    /// Prices an existing booking and a proposed change, and reports the difference.
    ///
    /// # Errors
    ///
    /// Any error [`Self::compute_cost`] returns for either request.
    pub async fn quote_modification(
        &self,
        original: &PricingRequest,
        updated: &PricingRequest,
    ) -> Result<ModificationQuote, PricingError> {
        let original_total = self.compute_cost(original).await?.final_total;
        let breakdown = self.compute_cost(updated).await?;
        let cost_difference = breakdown.final_total - original_total;
        Ok(ModificationQuote {
            breakdown,
            original_total,
            cost_difference,
        })
    }

    async fn apply_promotion(
        &self,
        request: &PricingRequest,
        running_total: Money,
    ) -> (Money, Option<AppliedPromotion>, Option<PromotionRejection>) {
        let Some(code) = request
            .promo_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        else {
            return (running_total, None, None);
        };

        let result = self
            .validator
            .validate(
                code,
                request.hotel_id,
                running_total,
                request.check_in,
                request.customer_email.as_deref(),
            )
            .await;

        match result {
            ValidationResult::Valid(promotion) => {
                let discount = promotion.discount_for(running_total);
                let applied = AppliedPromotion {
                    code: promotion.code,
                    description: promotion.description,
                    discount,
                };
                (running_total - discount, Some(applied), None)
            }
            ValidationResult::Invalid(rejection) => (running_total, None, Some(rejection)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hotel_ops_core::NaiveDate;
    use hotel_ops_core::rates::StrategyRule;
    use hotel_ops_core::types::RoomType;
    use hotel_ops_testing::{InMemoryHotel, fixtures, test_clock};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// June 2025 stay between the given days
    fn june(room_type: RoomType, check_in: u32, check_out: u32) -> PricingRequest {
        PricingRequest::new(
            fixtures::HOTEL,
            room_type,
            date(2025, 6, check_in),
            date(2025, 6, check_out),
        )
    }

    fn pipeline(hotel: &Arc<InMemoryHotel>) -> PricingPipeline {
        PricingPipeline::new(
            hotel.clone(),
            hotel.clone(),
            Arc::new(test_clock()),
            PricingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_missing_room_type_is_rate_not_found() {
        let hotel = Arc::new(InMemoryHotel::new());
        let request = june(RoomType::Suite, 3, 6);
        let error = pipeline(&hotel).compute_cost(&request).await.unwrap_err();
        assert_eq!(
            error,
            PricingError::RateNotFound {
                hotel_id: fixtures::HOTEL,
                room_type: RoomType::Suite
            }
        );
    }

    #[tokio::test]
    async fn test_reversed_dates_are_invalid() {
        let hotel = Arc::new(InMemoryHotel::new());
        hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        let request = june(RoomType::Double, 6, 6);
        let error = pipeline(&hotel).compute_cost(&request).await.unwrap_err();
        assert!(matches!(error, PricingError::InvalidDateRange { .. }));
    }

    #[tokio::test]
    async fn test_occupancy_only_fetched_for_demand_rules() {
        let hotel = Arc::new(InMemoryHotel::new());
        hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        hotel.add_strategy(fixtures::strategy(1, "Flat", dec!(1.1), StrategyRule::Flat));
        let request = june(RoomType::Double, 3, 6);
        pipeline(&hotel).compute_cost(&request).await.unwrap();
        assert_eq!(hotel.occupancy_lookups(), 0);

        hotel.add_strategy(fixtures::strategy(
            2,
            "High demand",
            dec!(1.25),
            StrategyRule::DemandBased {
                min_occupancy: Some(dec!(0.8)),
                max_occupancy: None,
            },
        ));
        let breakdown = pipeline(&hotel).compute_cost(&request).await.unwrap();
        assert_eq!(hotel.occupancy_lookups(), 1);
        // one free room out of one: occupancy 0, demand rule does not match
        assert_eq!(breakdown.strategy_adjustments.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_promo_code_is_ignored() {
        let hotel = Arc::new(InMemoryHotel::new());
        hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        let request = june(RoomType::Double, 3, 6).with_promo_code("   ");
        let breakdown = pipeline(&hotel).compute_cost(&request).await.unwrap();
        assert!(breakdown.promotion.is_none());
        assert!(breakdown.promotion_error.is_none());
    }

    #[tokio::test]
    async fn test_quote_modification_reports_difference() {
        let hotel = Arc::new(InMemoryHotel::new());
        hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        let original = june(RoomType::Double, 3, 6);
        let shorter = june(RoomType::Double, 3, 5);
        let quote = pipeline(&hotel).quote_modification(&original, &shorter).await.unwrap();
        assert_eq!(quote.original_total, Money::from_major(345));
        assert_eq!(quote.breakdown.final_total, Money::from_major(230));
        assert_eq!(quote.cost_difference, Money::from_major(-115));
    }
}
