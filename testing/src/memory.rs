//! In-memory storage for tests.
//!
//! [`InMemoryHotel`] implements every storage and rate port on top of one
//! mutex-protected state, so a single `Arc<InMemoryHotel>` can be handed to
//! the pricing pipeline and the orchestrator alike. Writes are
//! version-checked the same way a real store would check them.

use async_trait::async_trait;
use chrono::NaiveDate;
use hotel_ops_core::environment::{
    Committed, GuestDirectory, GuestProfile, PromotionRepository, RateSource, ReservationRepository,
    RoomRepository, UnitOfWork,
};
use hotel_ops_core::rates::{PricingStrategy, PromotionalCode, SeasonalRate};
use hotel_ops_core::types::{
    GuestInfo, HotelId, Money, NewReservation, Reservation, ReservationId, ReservationStatus, Room,
    RoomId, RoomStatus, RoomType, StayDates, UserId,
};
use hotel_ops_core::{Decimal, RepositoryError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A recorded promotion redemption
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redemption {
    /// Hotel the code belongs to
    pub hotel_id: HotelId,
    /// Redeemed code
    pub code: String,
    /// Guest email, when known
    pub email: Option<String>,
    /// Booking that used the code, when recorded by the engine
    pub reservation_id: Option<ReservationId>,
}

#[derive(Default)]
struct State {
    rooms: BTreeMap<RoomId, Room>,
    reservations: BTreeMap<ReservationId, Reservation>,
    last_reservation_id: u64,
    strategies: Vec<PricingStrategy>,
    seasonal_rates: Vec<SeasonalRate>,
    promotions: Vec<PromotionalCode>,
    redemptions: Vec<Redemption>,
    completed_stays: Vec<(HotelId, String)>,
    guests: Vec<GuestProfile>,
    last_user_id: u64,
    fail_promotion_lookups: bool,
    fail_redemptions: bool,
    unavailable: bool,
    injected_conflicts: u32,
    latency: Duration,
    occupancy_lookups: usize,
    commits: usize,
}

impl State {
    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }

    fn overlapping(
        &self,
        room_id: RoomId,
        stay: StayDates,
        exclude: &[ReservationStatus],
    ) -> Vec<Reservation> {
        self.reservations
            .values()
            .filter(|reservation| reservation.room_id == Some(room_id))
            .filter(|reservation| !exclude.contains(&reservation.status))
            .filter(|reservation| reservation.stay.overlaps(&stay))
            .cloned()
            .collect()
    }

    fn is_free(&self, room_id: RoomId, stay: StayDates) -> bool {
        self.overlapping(room_id, stay, &ReservationStatus::NON_BLOCKING)
            .is_empty()
    }

    fn check_reservation_version(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        let stored = self
            .reservations
            .get(&reservation.id)
            .ok_or_else(|| not_found("reservation", reservation.id))?;
        if stored.version != reservation.version {
            return Err(RepositoryError::Conflict {
                entity: "reservation",
                id: reservation.id.to_string(),
                expected: reservation.version,
                actual: stored.version,
            });
        }
        Ok(())
    }

    fn check_room_version(&self, room: &Room) -> Result<(), RepositoryError> {
        let stored = self
            .rooms
            .get(&room.id)
            .ok_or_else(|| not_found("room", room.id))?;
        if stored.version != room.version {
            return Err(RepositoryError::Conflict {
                entity: "room",
                id: room.id.to_string(),
                expected: room.version,
                actual: stored.version,
            });
        }
        Ok(())
    }

    fn take_injected_conflict(&mut self, reservation: &Reservation) -> Result<(), RepositoryError> {
        if self.injected_conflicts == 0 {
            return Ok(());
        }
        self.injected_conflicts -= 1;
        Err(RepositoryError::Conflict {
            entity: "reservation",
            id: reservation.id.to_string(),
            expected: reservation.version,
            actual: reservation.version + 1,
        })
    }

    fn write_reservation(&mut self, reservation: &Reservation) -> Reservation {
        let mut stored = reservation.clone();
        stored.version += 1;
        self.reservations.insert(stored.id, stored.clone());
        stored
    }

    fn write_room(&mut self, room: &Room) -> Room {
        let mut stored = room.clone();
        stored.version += 1;
        self.rooms.insert(stored.id, stored.clone());
        stored
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> RepositoryError {
    RepositoryError::NotFound {
        entity,
        id: id.to_string(),
    }
}

/// One hotel's worth of rooms, reservations, rates, promotions and guests
#[derive(Default)]
pub struct InMemoryHotel {
    state: Mutex<State>,
}

impl InMemoryHotel {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------------

    /// Adds or replaces a room
    pub fn add_room(&self, room: Room) -> Room {
        self.state().rooms.insert(room.id, room.clone());
        room
    }

    /// Stores a reservation as-is (id and version are kept)
    pub fn put_reservation(&self, reservation: Reservation) -> Reservation {
        let mut state = self.state();
        state.last_reservation_id = state.last_reservation_id.max(reservation.id.value());
        state.reservations.insert(reservation.id, reservation.clone());
        reservation
    }

    /// Adds a pricing strategy
    pub fn add_strategy(&self, strategy: PricingStrategy) {
        self.state().strategies.push(strategy);
    }

    /// Adds a seasonal rate
    pub fn add_seasonal_rate(&self, rate: SeasonalRate) {
        self.state().seasonal_rates.push(rate);
    }

    /// Adds a promotional code
    pub fn add_promotion(&self, promotion: PromotionalCode) {
        self.state().promotions.push(promotion);
    }

    /// Records a past redemption of `code` by `email`
    pub fn add_redemption(&self, hotel_id: HotelId, code: &str, email: &str) {
        self.state().redemptions.push(Redemption {
            hotel_id,
            code: code.to_string(),
            email: Some(email.to_string()),
            reservation_id: None,
        });
    }

    /// Records a completed stay of `email` outside the reservation table
    pub fn add_completed_stay(&self, hotel_id: HotelId, email: &str) {
        self.state()
            .completed_stays
            .push((hotel_id, email.to_string()));
    }

    /// Registers a guest directly
    pub fn add_guest(&self, info: GuestInfo) -> GuestProfile {
        let mut state = self.state();
        state.last_user_id += 1;
        let profile = GuestProfile {
            user_id: UserId::new(state.last_user_id),
            info,
        };
        state.guests.push(profile.clone());
        profile
    }

    // ------------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------------

    /// Makes promotion reads fail with [`RepositoryError::Unavailable`]
    pub fn fail_promotion_lookups(&self, fail: bool) {
        self.state().fail_promotion_lookups = fail;
    }

    /// Makes `record_redemption` fail
    pub fn fail_redemptions(&self, fail: bool) {
        self.state().fail_redemptions = fail;
    }

    /// Makes every storage call fail with [`RepositoryError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// The next `count` commits fail with [`RepositoryError::Conflict`]
    pub fn inject_conflicts(&self, count: u32) {
        self.state().injected_conflicts = count;
    }

    /// Reservation reads and commits wait `latency` before touching the
    /// state, so concurrent operations interleave
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    async fn simulate_latency(&self) {
        let latency = self.state().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Current copy of a room
    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<Room> {
        self.state().rooms.get(&id).cloned()
    }

    /// Current copy of a reservation
    #[must_use]
    pub fn reservation(&self, id: ReservationId) -> Option<Reservation> {
        self.state().reservations.get(&id).cloned()
    }

    /// All reservations, ordered by id
    #[must_use]
    pub fn reservations(&self) -> Vec<Reservation> {
        self.state().reservations.values().cloned().collect()
    }

    /// All registered guests
    #[must_use]
    pub fn guests(&self) -> Vec<GuestProfile> {
        self.state().guests.clone()
    }

    /// All redemptions, seeded and recorded
    #[must_use]
    pub fn redemptions(&self) -> Vec<Redemption> {
        self.state().redemptions.clone()
    }

    /// Current copy of a promotional code
    #[must_use]
    pub fn promotion(&self, hotel_id: HotelId, code: &str) -> Option<PromotionalCode> {
        self.state()
            .promotions
            .iter()
            .find(|promotion| promotion.hotel_id == hotel_id && promotion.code == code)
            .cloned()
    }

    /// How often occupancy was computed
    #[must_use]
    pub fn occupancy_lookups(&self) -> usize {
        self.state().occupancy_lookups
    }

    /// How many unit-of-work commits succeeded
    #[must_use]
    pub fn commits(&self) -> usize {
        self.state().commits
    }
}

#[async_trait]
impl RoomRepository for InMemoryHotel {
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state.rooms.get(&id).cloned())
    }

    async fn find_available_rooms(
        &self,
        hotel_id: HotelId,
        stay: StayDates,
        guests: u32,
        room_type: Option<RoomType>,
    ) -> Result<Vec<Room>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state
            .rooms
            .values()
            .filter(|room| room.hotel_id == hotel_id && room.bookable)
            .filter(|room| room.status != RoomStatus::OutOfOrder)
            .filter(|room| room.capacity >= guests)
            .filter(|room| room_type.is_none_or(|rt| rt == room.room_type))
            .filter(|room| state.is_free(room.id, stay))
            .cloned()
            .collect())
    }

    async fn is_room_available(
        &self,
        room_id: RoomId,
        stay: StayDates,
    ) -> Result<bool, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state.is_free(room_id, stay))
    }

    async fn save(&self, room: &Room) -> Result<Room, RepositoryError> {
        let mut state = self.state();
        state.check_available()?;
        state.check_room_version(room)?;
        Ok(state.write_room(room))
    }
}

#[async_trait]
impl ReservationRepository for InMemoryHotel {
    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        self.simulate_latency().await;
        let state = self.state();
        state.check_available()?;
        Ok(state.reservations.get(&id).cloned())
    }

    async fn insert(&self, reservation: NewReservation) -> Result<Reservation, RepositoryError> {
        let mut state = self.state();
        state.check_available()?;
        state.last_reservation_id += 1;
        let stored = reservation.into_reservation(ReservationId::new(state.last_reservation_id));
        state.reservations.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save(&self, reservation: &Reservation) -> Result<Reservation, RepositoryError> {
        let mut state = self.state();
        state.check_available()?;
        state.check_reservation_version(reservation)?;
        Ok(state.write_reservation(reservation))
    }

    async fn find_overlapping(
        &self,
        room_id: RoomId,
        stay: StayDates,
        exclude_statuses: &[ReservationStatus],
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state.overlapping(room_id, stay, exclude_statuses))
    }

    async fn delete(&self, id: ReservationId) -> Result<(), RepositoryError> {
        let mut state = self.state();
        state.check_available()?;
        state
            .reservations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("reservation", id))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryHotel {
    async fn commit(
        &self,
        reservation: &Reservation,
        room: Option<&Room>,
    ) -> Result<Committed, RepositoryError> {
        self.simulate_latency().await;
        let mut state = self.state();
        state.check_available()?;
        state.take_injected_conflict(reservation)?;
        state.check_reservation_version(reservation)?;
        if let Some(room) = room {
            state.check_room_version(room)?;
        }

        let reservation = state.write_reservation(reservation);
        let room = room.map(|room| state.write_room(room));
        state.commits += 1;
        Ok(Committed { reservation, room })
    }
}

#[async_trait]
impl RateSource for InMemoryHotel {
    async fn base_rate(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
    ) -> Result<Option<Money>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state
            .rooms
            .values()
            .find(|room| room.hotel_id == hotel_id && room.room_type == room_type)
            .map(|room| room.base_rate))
    }

    async fn active_strategies(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
        date: NaiveDate,
    ) -> Result<Vec<PricingStrategy>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state
            .strategies
            .iter()
            .filter(|strategy| {
                strategy.hotel_id == hotel_id && strategy.is_effective(room_type, date)
            })
            .cloned()
            .collect())
    }

    async fn seasonal_rates(
        &self,
        hotel_id: HotelId,
        room_type: RoomType,
        date: NaiveDate,
    ) -> Result<Vec<SeasonalRate>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state
            .seasonal_rates
            .iter()
            .filter(|rate| rate.hotel_id == hotel_id && rate.applies_to(room_type, date))
            .cloned()
            .collect())
    }

    async fn occupancy(
        &self,
        hotel_id: HotelId,
        stay: StayDates,
    ) -> Result<Decimal, RepositoryError> {
        let mut state = self.state();
        state.check_available()?;
        state.occupancy_lookups += 1;

        let rooms = state
            .rooms
            .values()
            .filter(|room| room.hotel_id == hotel_id)
            .count();
        if rooms == 0 {
            return Ok(Decimal::ZERO);
        }
        let occupied = state
            .reservations
            .values()
            .filter(|reservation| reservation.hotel_id == hotel_id)
            .filter(|reservation| reservation.status.holds_room())
            .filter(|reservation| reservation.stay.overlaps(&stay))
            .count();
        Ok(Decimal::from(occupied) / Decimal::from(rooms))
    }
}

#[async_trait]
impl PromotionRepository for InMemoryHotel {
    async fn find_active(
        &self,
        hotel_id: HotelId,
        code: &str,
    ) -> Result<Option<PromotionalCode>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        if state.fail_promotion_lookups {
            return Err(RepositoryError::Unavailable("promotion store offline".to_string()));
        }
        Ok(state
            .promotions
            .iter()
            .find(|promotion| {
                promotion.hotel_id == hotel_id && promotion.code == code && promotion.active
            })
            .cloned())
    }

    async fn customer_usage(
        &self,
        hotel_id: HotelId,
        code: &str,
        email: &str,
    ) -> Result<u32, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        if state.fail_promotion_lookups {
            return Err(RepositoryError::Unavailable("promotion store offline".to_string()));
        }
        let used = state
            .redemptions
            .iter()
            .filter(|redemption| redemption.hotel_id == hotel_id && redemption.code == code)
            .filter(|redemption| {
                redemption
                    .email
                    .as_deref()
                    .is_some_and(|used_by| used_by.eq_ignore_ascii_case(email))
            })
            .count();
        Ok(u32::try_from(used).unwrap_or(u32::MAX))
    }

    async fn completed_stays(
        &self,
        hotel_id: HotelId,
        email: &str,
    ) -> Result<u32, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        let seeded = state
            .completed_stays
            .iter()
            .filter(|(hotel, guest)| *hotel == hotel_id && guest.eq_ignore_ascii_case(email))
            .count();
        let booked = state
            .reservations
            .values()
            .filter(|reservation| reservation.hotel_id == hotel_id)
            .filter(|reservation| reservation.status == ReservationStatus::CheckedOut)
            .filter(|reservation| {
                reservation
                    .guest
                    .email()
                    .is_some_and(|guest| guest.eq_ignore_ascii_case(email))
            })
            .count();
        Ok(u32::try_from(seeded + booked).unwrap_or(u32::MAX))
    }

    async fn record_redemption(
        &self,
        hotel_id: HotelId,
        code: &str,
        email: Option<&str>,
        reservation_id: ReservationId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        state.check_available()?;
        if state.fail_redemptions {
            return Err(RepositoryError::Unavailable("promotion store offline".to_string()));
        }
        if let Some(promotion) = state
            .promotions
            .iter_mut()
            .find(|promotion| promotion.hotel_id == hotel_id && promotion.code == code)
        {
            promotion.usage_count += 1;
        }
        state.redemptions.push(Redemption {
            hotel_id,
            code: code.to_string(),
            email: email.map(str::to_string),
            reservation_id: Some(reservation_id),
        });
        Ok(())
    }
}

#[async_trait]
impl GuestDirectory for InMemoryHotel {
    async fn find_by_email(&self, email: &str) -> Result<Option<GuestProfile>, RepositoryError> {
        let state = self.state();
        state.check_available()?;
        Ok(state
            .guests
            .iter()
            .find(|profile| profile.info.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn register(&self, info: &GuestInfo) -> Result<GuestProfile, RepositoryError> {
        {
            let state = self.state();
            state.check_available()?;
        }
        Ok(self.add_guest(info.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_save_rejects_stale_version() {
        let hotel = InMemoryHotel::new();
        let room = hotel.add_room(fixtures::room(101, RoomType::Double, 100));

        let saved = RoomRepository::save(&hotel, &room).await.unwrap();
        assert_eq!(saved.version, 1);

        let error = RoomRepository::save(&hotel, &room).await.unwrap_err();
        assert!(error.is_conflict());
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let hotel = InMemoryHotel::new();
        let room = hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        let reservation = hotel.put_reservation(fixtures::reservation(
            1,
            Some(room.id),
            ReservationStatus::Confirmed,
            fixtures::date(2025, 6, 3),
            3,
        ));

        let mut stale_room = room.clone();
        stale_room.version = 7;
        let mut checked_in = reservation.clone();
        checked_in.status = ReservationStatus::CheckedIn;

        let error = hotel.commit(&checked_in, Some(&stale_room)).await.unwrap_err();
        assert!(error.is_conflict());
        assert_eq!(
            hotel.reservation(reservation.id).unwrap().status,
            ReservationStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_pending_reservations_do_not_block_rooms() {
        let hotel = InMemoryHotel::new();
        let room = hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        hotel.put_reservation(fixtures::reservation(
            1,
            Some(room.id),
            ReservationStatus::Pending,
            fixtures::date(2025, 6, 3),
            3,
        ));
        let stay = fixtures::stay(fixtures::date(2025, 6, 4), 1);
        assert!(hotel.is_room_available(room.id, stay).await.unwrap());
    }

    #[tokio::test]
    async fn test_occupancy_counts_holding_reservations() {
        let hotel = InMemoryHotel::new();
        let first = hotel.add_room(fixtures::room(101, RoomType::Double, 100));
        hotel.add_room(fixtures::room(102, RoomType::Double, 100));
        hotel.put_reservation(fixtures::reservation(
            1,
            Some(first.id),
            ReservationStatus::Confirmed,
            fixtures::date(2025, 6, 3),
            3,
        ));
        let stay = fixtures::stay(fixtures::date(2025, 6, 4), 2);
        let occupancy = hotel.occupancy(fixtures::HOTEL, stay).await.unwrap();
        assert_eq!(occupancy, Decimal::new(5, 1));
    }
}
