//! Shared wiring for the orchestrator integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use hotel_ops_core::NaiveDate;
use hotel_ops_core::types::{Reservation, ReservationStatus, Room, RoomId, RoomStatus, RoomType};
use hotel_ops_reservations::{BookingOrchestrator, BookingRequest, EngineConfig, EnginePorts};
use hotel_ops_runtime::EffectRunner;
use hotel_ops_testing::{
    FixedClock, InMemoryHotel, RecordingAuditSink, RecordingNotificationSink,
    ScriptedPaymentGateway, fixtures, test_clock,
};
use std::sync::Arc;

/// An orchestrator over in-memory collaborators, with handles to inspect them
pub struct Harness {
    pub hotel: Arc<InMemoryHotel>,
    pub payments: Arc<ScriptedPaymentGateway>,
    pub audit: Arc<RecordingAuditSink>,
    pub notifications: Arc<RecordingNotificationSink>,
    pub clock: Arc<FixedClock>,
    pub engine: BookingOrchestrator,
}

impl Harness {
    /// Default configuration, clock at 2025-01-01T00:00Z
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let hotel = Arc::new(InMemoryHotel::new());
        let payments = Arc::new(ScriptedPaymentGateway::new());
        let audit = Arc::new(RecordingAuditSink::new());
        let notifications = Arc::new(RecordingNotificationSink::new());
        let clock = Arc::new(test_clock());

        let ports = EnginePorts {
            rooms: hotel.clone(),
            reservations: hotel.clone(),
            unit_of_work: hotel.clone(),
            rates: hotel.clone(),
            promotions: hotel.clone(),
            guests: hotel.clone(),
            payments: payments.clone(),
            effects: EffectRunner::new(audit.clone(), notifications.clone()),
            clock: clock.clone(),
        };
        let engine = BookingOrchestrator::new(ports, config);

        Self {
            hotel,
            payments,
            audit,
            notifications,
            clock,
            engine,
        }
    }

    /// Double room 101 at $100/night, capacity 2
    pub fn with_room(self) -> Self {
        self.hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        self
    }

    pub fn set_room_status(&self, status: RoomStatus) -> Room {
        let mut room = self.room();
        room.status = status;
        self.hotel.add_room(room)
    }

    pub fn room(&self) -> Room {
        self.hotel.room(RoomId::new(101)).unwrap()
    }

    /// Three-night reservation in room 101 worth $345
    pub fn seed(&self, id: u64, status: ReservationStatus, check_in: NaiveDate) -> Reservation {
        self.hotel.put_reservation(fixtures::reservation(
            id,
            Some(RoomId::new(101)),
            status,
            check_in,
            3,
        ))
    }
}

/// Tuesday 2025-06-03
pub fn june_3() -> NaiveDate {
    fixtures::date(2025, 6, 3)
}

/// Three nights from `check_in` for two guests
pub fn request(check_in: NaiveDate) -> BookingRequest {
    let stay = fixtures::stay(check_in, 3);
    BookingRequest::new(
        fixtures::HOTEL,
        RoomType::Double,
        stay.check_in(),
        stay.check_out(),
        2,
        fixtures::guest("Grace Hopper", "grace@example.com"),
    )
}
