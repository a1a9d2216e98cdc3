//! Pricing configuration

use hotel_ops_core::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Rates applied by the pricing pipeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tax on the pre-tax subtotal (0.15 = 15%)
    pub tax_rate: Decimal,
    /// Premium per Friday/Saturday night, as a fraction of the average nightly share
    pub weekend_premium_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: dec!(0.15),
            weekend_premium_rate: dec!(0.20),
        }
    }
}
