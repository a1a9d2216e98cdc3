//! Configuration management for the reservation engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use hotel_ops_pricing::PricingConfig;
use hotel_ops_runtime::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pricing rates
    pub pricing: PricingConfig,
    /// Booking rules and timeouts
    pub booking: BookingConfig,
    /// Logging setup
    pub logging: LoggingConfig,
}

/// Booking rules, timeouts and retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// ISO currency code charged by the payment gateway
    pub currency: String,
    /// Payment call timeout in milliseconds
    pub payment_timeout_ms: u64,
    /// Storage call timeout in milliseconds
    pub persistence_timeout_ms: u64,
    /// Minimum notice (hours before check-in) for guest cancellations
    pub cancellation_notice_hours: i64,
    /// Minimum notice (hours before check-in) for guest modifications
    pub modification_notice_hours: i64,
    /// Retries after an optimistic-concurrency conflict
    pub conflict_retries: u32,
    /// First backoff delay after a conflict, in milliseconds
    pub conflict_backoff_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error), overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            payment_timeout_ms: 10_000,
            persistence_timeout_ms: 5_000,
            cancellation_notice_hours: 24,
            modification_notice_hours: 24,
            conflict_retries: 3,
            conflict_backoff_ms: 25,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            booking: BookingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn parsed<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pricing: PricingConfig {
                tax_rate: parsed("HOTEL_TAX_RATE", defaults.pricing.tax_rate),
                weekend_premium_rate: parsed(
                    "HOTEL_WEEKEND_PREMIUM_RATE",
                    defaults.pricing.weekend_premium_rate,
                ),
            },
            booking: BookingConfig {
                currency: env::var("HOTEL_CURRENCY").unwrap_or(defaults.booking.currency),
                payment_timeout_ms: parsed(
                    "HOTEL_PAYMENT_TIMEOUT_MS",
                    defaults.booking.payment_timeout_ms,
                ),
                persistence_timeout_ms: parsed(
                    "HOTEL_PERSISTENCE_TIMEOUT_MS",
                    defaults.booking.persistence_timeout_ms,
                ),
                cancellation_notice_hours: parsed(
                    "HOTEL_CANCELLATION_NOTICE_HOURS",
                    defaults.booking.cancellation_notice_hours,
                ),
                modification_notice_hours: parsed(
                    "HOTEL_MODIFICATION_NOTICE_HOURS",
                    defaults.booking.modification_notice_hours,
                ),
                conflict_retries: parsed(
                    "HOTEL_CONFLICT_RETRIES",
                    defaults.booking.conflict_retries,
                ),
                conflict_backoff_ms: parsed(
                    "HOTEL_CONFLICT_BACKOFF_MS",
                    defaults.booking.conflict_backoff_ms,
                ),
            },
            logging: LoggingConfig {
                level: env::var("HOTEL_LOG_LEVEL").unwrap_or(defaults.logging.level),
                json: parsed("HOTEL_LOG_JSON", defaults.logging.json),
            },
        }
    }
}

impl BookingConfig {
    /// Payment call timeout
    #[must_use]
    pub const fn payment_timeout(&self) -> Duration {
        Duration::from_millis(self.payment_timeout_ms)
    }

    /// Storage call timeout
    #[must_use]
    pub const fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    /// Backoff policy for concurrency conflicts
    #[must_use]
    pub const fn conflict_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.conflict_retries, Duration::from_millis(self.conflict_backoff_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.pricing.tax_rate, dec!(0.15));
        assert_eq!(config.pricing.weekend_premium_rate, dec!(0.20));
        assert_eq!(config.booking.currency, "USD");
        assert_eq!(config.booking.payment_timeout(), Duration::from_secs(10));
        assert_eq!(config.booking.cancellation_notice_hours, 24);
        assert_eq!(config.booking.conflict_policy().max_retries, 3);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap_or_default();
        let back: Option<EngineConfig> = serde_json::from_str(&json).ok();
        assert_eq!(back, Some(config));
    }
}
