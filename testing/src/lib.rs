//! # Hotel Ops Testing
//!
//! Testing utilities for the reservation engine.
//!
//! This crate provides:
//! - A fixed clock for deterministic dates
//! - [`InMemoryHotel`], one store implementing every storage and rate port
//! - [`ScriptedPaymentGateway`] with queued outcomes
//! - Recording audit and notification sinks with failure injection
//! - Fixture builders and the [`ReducerTest`] Given-When-Then harness
//!
//! ## Example
//!
//! ```ignore
//! use hotel_ops_testing::{InMemoryHotel, fixtures, test_clock};
//!
//! #[tokio::test]
//! async fn test_weekday_stay() {
//!     let hotel = Arc::new(InMemoryHotel::new());
//!     hotel.add_room(fixtures::room(101, RoomType::Double, 100));
//!     let clock = Arc::new(test_clock());
//!     let pipeline = PricingPipeline::new(hotel.clone(), hotel.clone(), clock, config);
//!     let breakdown = pipeline.compute_cost(&request).await.unwrap();
//!     assert_eq!(breakdown.final_total, Money::from_major(345));
//! }
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hotel_ops_core::environment::Clock;

pub mod fixtures;
pub mod memory;
pub mod payment;
pub mod reducer_test;
pub mod sinks;

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, NaiveDate, NaiveTime, Utc};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same instant until [`FixedClock::set`] or
    /// [`FixedClock::advance`] moves it.
    ///
    /// # Example
    ///
    /// ```
    /// use hotel_ops_testing::mocks::FixedClock;
    /// use hotel_ops_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2);
    /// ```
    #[derive(Debug)]
    pub struct FixedClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Clock at midnight UTC of `date`
        #[must_use]
        pub fn on(date: NaiveDate) -> Self {
            Self::new(date.and_time(NaiveTime::MIN).and_utc())
        }

        /// Move the clock to `time`
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner) = time;
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clone for FixedClock {
        fn clone(&self) -> Self {
            Self::new(self.now())
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Installs a test subscriber so `tracing` output shows up with `--nocapture`.
///
/// Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use memory::InMemoryHotel;
pub use mocks::{FixedClock, test_clock};
pub use payment::{Charge, PaymentScript, ScriptedPaymentGateway};
pub use reducer_test::{ReducerTest, assertions};
pub use sinks::{Notification, RecordingAuditSink, RecordingNotificationSink};
