//! # Hotel Ops Pricing
//!
//! Turns a stay request into an itemised price.
//!
//! The [`PricingPipeline`] reads base rates, strategies, seasonal rates and
//! occupancy through a [`RateSource`](hotel_ops_core::environment::RateSource),
//! then runs the pure stages in [`stages`] over fixed-point money. Promotional
//! codes go through the [`PromotionValidator`], whose rejections are recorded
//! on the breakdown instead of failing the call.
//!
//! ## Example
//!
//! ```ignore
//! let pipeline = PricingPipeline::new(rates, promotions, clock, PricingConfig::default());
//! let breakdown = pipeline
//!     .compute_cost(&PricingRequest::new(hotel_id, RoomType::Double, check_in, check_out))
//!     .await?;
//! println!("{}", breakdown.final_total);
//! ```

pub mod breakdown;
pub mod config;
pub mod pipeline;
pub mod promotion;
pub mod recommendations;
pub mod stages;

pub use breakdown::{
    AppliedPromotion, DayAdjustment, LineItem, ModificationQuote, PricingBreakdown, PricingRequest,
    Savings,
};
pub use config::PricingConfig;
pub use pipeline::PricingPipeline;
pub use promotion::{PromotionRejection, PromotionValidator, ValidationResult};
