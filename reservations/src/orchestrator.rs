//! Booking orchestration: the imperative shell around pricing and the
//! reservation reducer.
//!
//! Every operation follows the same shape: take the keyed lock, read the
//! current state, reduce, commit the reservation and its room together, then
//! run the effects. Optimistic-concurrency conflicts re-run the read/reduce/
//! commit cycle with backoff; effects only run once the commit went through.
//!
//! Lock order is reservation, then room. Anything that claims a room for a
//! stay (a new booking, a confirmation, a date change) holds that room's lock
//! while it checks for overlaps and commits.

use crate::booking::{
    BookingRequest, BookingResult, CancellationResult, ModificationResult, PaymentOutcome,
    RequestChannel, ReservationChanges,
};
use crate::config::{BookingConfig, EngineConfig};
use crate::refund::refund_for;
use crate::state_machine::{
    ReservationAction, ReservationEnvironment, ReservationReducer, ReservationState,
};
use chrono::{Days, NaiveTime};
use hotel_ops_core::effect::{AuditAction, AuditEntry, Effect};
use hotel_ops_core::environment::{
    Clock, GuestDirectory, PaymentGateway, PromotionRepository, RateSource, ReservationRepository,
    RoomRepository, UnitOfWork,
};
use hotel_ops_core::error::Result;
use hotel_ops_core::reducer::{Effects, Reducer};
use hotel_ops_core::types::{
    GuestIdentity, Money, NewReservation, Reservation, ReservationId, ReservationStatus, Room,
    RoomId, RoomStatus, StayDates,
};
use hotel_ops_core::{BookingError, PaymentError, RepositoryError, TransitionError};
use hotel_ops_pricing::{ModificationQuote, PricingBreakdown, PricingPipeline, PricingRequest};
use hotel_ops_runtime::metrics::{
    BOOKINGS_CHARGED_UNCONFIRMED, BOOKINGS_CONFIRMED, BOOKINGS_CREATED, BOOKINGS_PAYMENT_FAILED,
    CANCELLATIONS, TRANSITIONS, TRANSITIONS_REJECTED,
};
use hotel_ops_runtime::{EffectRunner, KeyGuard, KeyedLocks, retry_with_predicate, with_deadline};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// The collaborators the engine talks to
#[derive(Clone)]
pub struct EnginePorts {
    /// Room storage
    pub rooms: Arc<dyn RoomRepository>,
    /// Reservation storage
    pub reservations: Arc<dyn ReservationRepository>,
    /// Atomic reservation + room writes
    pub unit_of_work: Arc<dyn UnitOfWork>,
    /// Rates, strategies, seasons and occupancy
    pub rates: Arc<dyn RateSource>,
    /// Promotional codes and redemptions
    pub promotions: Arc<dyn PromotionRepository>,
    /// Registered guests
    pub guests: Arc<dyn GuestDirectory>,
    /// Card charges
    pub payments: Arc<dyn PaymentGateway>,
    /// Audit and notification delivery
    pub effects: EffectRunner,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

/// Entry point for creating bookings and driving them through their lifecycle
#[derive(Clone)]
pub struct BookingOrchestrator {
    ports: EnginePorts,
    pricing: PricingPipeline,
    reducer: ReservationReducer,
    config: BookingConfig,
    room_locks: Arc<KeyedLocks<RoomId>>,
    reservation_locks: Arc<KeyedLocks<ReservationId>>,
}

fn is_conflict(error: &BookingError) -> bool {
    matches!(error, BookingError::Repository(inner) if inner.is_conflict())
}

fn not_found(id: ReservationId) -> BookingError {
    BookingError::ReservationNotFound(id)
}

fn actor_for(reservation: &Reservation, channel: &RequestChannel) -> String {
    match channel {
        RequestChannel::Guest => reservation.guest.email().unwrap_or("guest").to_string(),
        RequestChannel::FrontDesk { staff } => staff.clone(),
    }
}

impl BookingOrchestrator {
    /// Wires the orchestrator
    #[must_use]
    pub fn new(ports: EnginePorts, config: &EngineConfig) -> Self {
        let pricing = PricingPipeline::new(
            ports.rates.clone(),
            ports.promotions.clone(),
            ports.clock.clone(),
            config.pricing.clone(),
        );
        Self {
            ports,
            pricing,
            reducer: ReservationReducer::new(),
            config: config.booking.clone(),
            room_locks: Arc::new(KeyedLocks::new()),
            reservation_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// The pricing pipeline used for bookings
    #[must_use]
    pub const fn pricing(&self) -> &PricingPipeline {
        &self.pricing
    }

    /// Prices a stay without booking it.
    ///
    /// # Errors
    ///
    /// See [`PricingPipeline::compute_cost`].
    pub async fn compute_cost(&self, request: &PricingRequest) -> Result<PricingBreakdown> {
        Ok(self.pricing.compute_cost(request).await?)
    }

    /// Prices a proposed change against the original request.
    ///
    /// # Errors
    ///
    /// See [`PricingPipeline::quote_modification`].
    pub async fn quote_modification(
        &self,
        original: &PricingRequest,
        updated: &PricingRequest,
    ) -> Result<ModificationQuote> {
        Ok(self.pricing.quote_modification(original, updated).await?)
    }

    /// Loads a reservation.
    ///
    /// # Errors
    ///
    /// [`BookingError::ReservationNotFound`] or a storage error.
    pub async fn reservation(&self, id: ReservationId) -> Result<Reservation> {
        self.persist(self.ports.reservations.find_by_id(id))
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn persist<T, F>(&self, call: F) -> std::result::Result<T, RepositoryError>
    where
        F: Future<Output = std::result::Result<T, RepositoryError>>,
    {
        with_deadline(self.config.persistence_timeout(), "persistence", call).await
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Books a room.
    ///
    /// The booking is stored as PENDING, then confirmed if a payment method was
    /// supplied and the charge succeeds. A failed or timed-out charge keeps the
    /// booking PENDING and is reported in [`BookingResult::payment`], as is a
    /// charge whose confirmation could not be stored.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] for malformed requests
    /// - [`BookingError::RoomUnavailable`] / [`BookingError::NoRoomAvailable`]
    /// - [`BookingError::Pricing`] when the stay cannot be priced
    /// - [`BookingError::Repository`] on storage failures before the charge
    #[instrument(
        skip(self, request),
        fields(
            hotel_id = %request.hotel_id,
            room_type = %request.room_type,
            check_in = %request.check_in
        )
    )]
    pub async fn create_booking(&self, request: BookingRequest) -> Result<BookingResult> {
        let stay = self.validate_request(&request)?;
        let room = self.choose_room(&request, stay).await?;

        let _room_guard = self.room_locks.lock(room.id).await;
        if !self.persist(self.ports.rooms.is_room_available(room.id, stay)).await? {
            return Err(BookingError::RoomUnavailable {
                room_id: room.id,
                reason: format!("already booked for {stay}"),
            });
        }

        let guest = self.resolve_guest(&request).await?;
        let email = request.guest.email.clone();

        let mut pricing_request = PricingRequest::new(
            request.hotel_id,
            room.room_type,
            stay.check_in(),
            stay.check_out(),
        )
        .with_customer_email(email.clone());
        pricing_request.promo_code = request.promo_code.clone();
        let breakdown = self.pricing.compute_cost(&pricing_request).await?;

        let new_reservation = NewReservation {
            hotel_id: request.hotel_id,
            room_id: Some(room.id),
            room_type: room.room_type,
            stay,
            guests: request.guests,
            guest,
            total_amount: breakdown.final_total,
            price_per_night: breakdown.base_rate_per_night,
            special_requests: request.special_requests.clone(),
            promo_code: breakdown.promotion.as_ref().map(|applied| applied.code.clone()),
            created_at: self.ports.clock.now(),
        };
        let mut reservation = self
            .persist(self.ports.reservations.insert(new_reservation))
            .await?;
        metrics::counter!(BOOKINGS_CREATED).increment(1);
        info!(
            reservation_id = %reservation.id,
            room_id = %room.id,
            total = %reservation.total_amount,
            "reservation created"
        );

        let mut effects: Effects = Effects::new();
        effects.push(Effect::RecordAudit(AuditEntry::new(
            reservation.id,
            AuditAction::Created,
            email.clone(),
            format!(
                "Booked room {} for {stay}, total {}",
                room.number, reservation.total_amount
            ),
        )));

        let payment = match request.payment_method_token.as_deref() {
            None => PaymentOutcome::NotAttempted,
            Some(token) => self.settle_payment(&mut reservation, token, &email, &mut effects).await,
        };

        if let Some(applied) = &breakdown.promotion {
            self.record_redemption(&reservation, &applied.code, &email).await;
        }

        self.ports.effects.run(effects).await;

        Ok(BookingResult {
            confirmation_number: reservation.confirmation_number(),
            reservation,
            breakdown,
            payment,
        })
    }

    fn validate_request(&self, request: &BookingRequest) -> Result<StayDates> {
        let stay = StayDates::new(request.check_in, request.check_out).ok_or_else(|| {
            BookingError::InvalidRequest(format!(
                "check-out {} must be after check-in {}",
                request.check_out, request.check_in
            ))
        })?;
        if stay.check_in() < self.ports.clock.today() {
            return Err(BookingError::InvalidRequest(format!(
                "check-in {} is in the past",
                stay.check_in()
            )));
        }
        if request.guests == 0 {
            return Err(BookingError::InvalidRequest(
                "at least one guest is required".to_string(),
            ));
        }
        if request.guest.name.trim().is_empty() || !request.guest.email.contains('@') {
            return Err(BookingError::InvalidRequest(
                "guest name and a valid email are required".to_string(),
            ));
        }
        Ok(stay)
    }

    async fn choose_room(&self, request: &BookingRequest, stay: StayDates) -> Result<Room> {
        let Some(room_id) = request.room_id else {
            let candidates = self
                .persist(self.ports.rooms.find_available_rooms(
                    request.hotel_id,
                    stay,
                    request.guests,
                    Some(request.room_type),
                ))
                .await?;
            return candidates
                .into_iter()
                .next()
                .ok_or(BookingError::NoRoomAvailable {
                    hotel_id: request.hotel_id,
                    room_type: request.room_type,
                });
        };

        let unavailable = |reason: &str| BookingError::RoomUnavailable {
            room_id,
            reason: reason.to_string(),
        };
        let room = self
            .persist(self.ports.rooms.find_by_id(room_id))
            .await?
            .filter(|room| room.hotel_id == request.hotel_id)
            .ok_or_else(|| unavailable("no such room at this hotel"))?;
        if !room.bookable {
            return Err(unavailable("closed for new bookings"));
        }
        if room.status == RoomStatus::OutOfOrder {
            return Err(unavailable("out of order"));
        }
        if room.capacity < request.guests {
            return Err(unavailable("not enough capacity"));
        }
        Ok(room)
    }

    async fn resolve_guest(&self, request: &BookingRequest) -> Result<GuestIdentity> {
        let info = request.guest.clone();
        let existing = self
            .persist(self.ports.guests.find_by_email(&info.email))
            .await?;
        let profile = match existing {
            Some(profile) => Some(profile),
            None if request.create_account => {
                Some(self.persist(self.ports.guests.register(&info)).await?)
            }
            None => None,
        };
        Ok(match profile {
            Some(profile) => GuestIdentity::Registered {
                user_id: profile.user_id,
                snapshot: Some(info),
            },
            None => GuestIdentity::Anonymous(info),
        })
    }

    /// Charges the booking and confirms it.
    ///
    /// Once money has moved nothing is returned as an error: the booking is
    /// either confirmed or left pending with the reference reported.
    async fn settle_payment(
        &self,
        reservation: &mut Reservation,
        token: &str,
        actor: &str,
        effects: &mut Effects,
    ) -> PaymentOutcome {
        let reference = match self.charge(reservation, token).await {
            Ok(reference) => reference,
            Err(error) => {
                warn!(
                    reservation_id = %reservation.id,
                    error = %error,
                    "payment failed, booking left pending"
                );
                metrics::counter!(BOOKINGS_PAYMENT_FAILED).increment(1);
                return PaymentOutcome::Failed(error);
            }
        };

        match self.confirm_paid(reservation.id, &reference, actor).await {
            Ok((confirmed, confirm_effects)) => {
                *reservation = confirmed;
                effects.extend(confirm_effects);
                metrics::counter!(BOOKINGS_CONFIRMED).increment(1);
                PaymentOutcome::Charged { reference }
            }
            Err(failure) => {
                error!(
                    reservation_id = %reservation.id,
                    payment_reference = %reference,
                    error = %failure,
                    "charged but could not confirm, booking left pending"
                );
                metrics::counter!(BOOKINGS_CHARGED_UNCONFIRMED).increment(1);
                PaymentOutcome::ChargedNotConfirmed {
                    reference,
                    reason: failure.to_string(),
                }
            }
        }
    }

    /// Confirms a freshly paid booking. The caller holds the room lock.
    async fn confirm_paid(
        &self,
        id: ReservationId,
        reference: &str,
        actor: &str,
    ) -> Result<(Reservation, Effects)> {
        retry_with_predicate(
            self.config.conflict_policy(),
            "confirm_booking",
            || async move {
                let mut state = self.load(id).await?;
                self.ensure_room_still_free(&state.reservation).await?;
                let confirm = ReservationAction::Confirm {
                    payment_reference: Some(reference.to_string()),
                };
                self.reduce_and_commit(&mut state, confirm, actor).await
            },
            is_conflict,
        )
        .await
    }

    async fn charge(
        &self,
        reservation: &Reservation,
        token: &str,
    ) -> std::result::Result<String, PaymentError> {
        let total = reservation.total_amount;
        let amount_minor = total.to_minor_units().ok_or_else(|| PaymentError::Other {
            message: format!("amount {total} out of range"),
        })?;
        with_deadline(
            self.config.payment_timeout(),
            "payment",
            self.ports
                .payments
                .charge(amount_minor, &self.config.currency, token),
        )
        .await
    }

    async fn record_redemption(&self, reservation: &Reservation, code: &str, email: &str) {
        let recorded = self
            .persist(self.ports.promotions.record_redemption(
                reservation.hotel_id,
                code,
                Some(email),
                reservation.id,
            ))
            .await;
        if let Err(error) = recorded {
            warn!(
                reservation_id = %reservation.id,
                code,
                error = %error,
                "failed to record promotion redemption"
            );
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Moves a reservation to `target` on behalf of `actor`.
    ///
    /// Cancelling through this path refunds nothing; use
    /// [`Self::cancel_booking`] to apply the refund policy.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Transition`] when the move is not allowed, including
    ///   a target the reservation is already in, and any move to PENDING
    /// - [`BookingError::RoomUnavailable`] when confirming a booking whose room
    ///   was taken meanwhile
    /// - [`BookingError::ReservationNotFound`] or a storage error
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        id: ReservationId,
        target: ReservationStatus,
        actor: &str,
    ) -> Result<Reservation> {
        let action = match target {
            ReservationStatus::Pending => {
                let current = self.reservation(id).await?;
                metrics::counter!(TRANSITIONS_REJECTED, "to" => target.to_string()).increment(1);
                return Err(TransitionError::InvalidTransition {
                    from: current.status,
                    to: target,
                }
                .into());
            }
            ReservationStatus::Confirmed => ReservationAction::Confirm {
                payment_reference: None,
            },
            ReservationStatus::CheckedIn => ReservationAction::CheckIn,
            ReservationStatus::CheckedOut => ReservationAction::CheckOut,
            ReservationStatus::Cancelled => ReservationAction::Cancel {
                reason: format!("Booking cancelled by {actor}"),
                refund: Money::ZERO,
            },
            ReservationStatus::NoShow => ReservationAction::MarkNoShow,
        };

        let (reservation, _) = self
            .apply(id, Some(target), |_| Ok((action.clone(), actor.to_string())))
            .await?;
        if target == ReservationStatus::Cancelled {
            metrics::counter!(CANCELLATIONS, "channel" => "staff").increment(1);
        }
        Ok(reservation)
    }

    /// Cancels a booking and refunds according to the cancellation policy.
    ///
    /// Guests must cancel at least `cancellation_notice_hours` before
    /// check-in; the front desk may cancel at any time. Notice and refund are
    /// worked out from the reservation as it stands under the lock.
    ///
    /// # Errors
    ///
    /// - [`BookingError::CancellationWindowClosed`] for late guest cancellations
    /// - [`BookingError::Transition`] when the booking is already closed
    /// - [`BookingError::ReservationNotFound`] or a storage error
    #[instrument(skip(self, reason))]
    pub async fn cancel_booking(
        &self,
        id: ReservationId,
        reason: &str,
        channel: RequestChannel,
    ) -> Result<CancellationResult> {
        let notice_hours = self.config.cancellation_notice_hours;
        let (reservation, effects) = self
            .apply(id, Some(ReservationStatus::Cancelled), |state| {
                let current = &state.reservation;
                self.check_notice(current, &channel, notice_hours)?;
                let refund = refund_for(
                    current.total_amount,
                    current.stay.check_in(),
                    self.ports.clock.today(),
                );
                let action = ReservationAction::Cancel {
                    reason: reason.to_string(),
                    refund,
                };
                Ok((action, actor_for(current, &channel)))
            })
            .await?;

        let refund = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::NotifyCancellation { refund, .. } => Some(*refund),
                _ => None,
            })
            .unwrap_or(Money::ZERO);
        metrics::counter!(CANCELLATIONS, "channel" => channel.label()).increment(1);
        info!(reservation_id = %id, %refund, channel = channel.label(), "booking cancelled");
        Ok(CancellationResult { reservation, refund })
    }

    /// Changes dates, guest count or special requests.
    ///
    /// Date changes re-check the room and re-price the stay. The status is
    /// left alone.
    ///
    /// # Errors
    ///
    /// - [`BookingError::CancellationWindowClosed`] for late guest changes
    /// - [`BookingError::InvalidRequest`] for bad dates or too many guests
    /// - [`BookingError::RoomUnavailable`] when the new dates clash
    /// - [`BookingError::Transition`] when the booking is closed
    /// - [`BookingError::Pricing`], [`BookingError::ReservationNotFound`] or a
    ///   storage error
    #[instrument(skip(self, changes))]
    pub async fn modify_booking(
        &self,
        id: ReservationId,
        changes: ReservationChanges,
        channel: RequestChannel,
    ) -> Result<ModificationResult> {
        let _guard = self.reservation_locks.lock(id).await;
        let _room_guard = if changes.changes_dates() {
            self.lock_room_of(id).await?
        } else {
            None
        };
        let changes = &changes;
        let channel = &channel;
        let (reservation, effects) = retry_with_predicate(
            self.config.conflict_policy(),
            "modify_booking",
            || self.try_modify(id, changes, channel),
            is_conflict,
        )
        .await?;
        self.ports.effects.run(effects.iter().cloned()).await;

        let (additional_charges, refund) = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::NotifyModification {
                    additional_charges,
                    refund,
                    ..
                } => Some((*additional_charges, *refund)),
                _ => None,
            })
            .unwrap_or((Money::ZERO, Money::ZERO));
        Ok(ModificationResult {
            reservation,
            additional_charges,
            refund,
        })
    }

    async fn try_modify(
        &self,
        id: ReservationId,
        changes: &ReservationChanges,
        channel: &RequestChannel,
    ) -> Result<(Reservation, Effects)> {
        let mut state = self.load(id).await?;
        let current = &state.reservation;
        self.check_notice(current, channel, self.config.modification_notice_hours)?;

        let check_in = changes.check_in.unwrap_or_else(|| current.stay.check_in());
        let check_out = changes.check_out.unwrap_or_else(|| current.stay.check_out());
        let stay = StayDates::new(check_in, check_out).ok_or_else(|| {
            BookingError::InvalidRequest(format!(
                "check-out {check_out} must be after check-in {check_in}"
            ))
        })?;
        let guests = changes.guests.unwrap_or(current.guests);
        if let Some(room) = &state.room {
            if guests > room.capacity {
                return Err(BookingError::InvalidRequest(format!(
                    "room {} holds at most {} guests",
                    room.number, room.capacity
                )));
            }
        }

        let (total_amount, price_per_night) = if stay == current.stay {
            (current.total_amount, current.price_per_night)
        } else {
            if let Some(room_id) = current.room_id {
                let clashes = self
                    .persist(self.ports.reservations.find_overlapping(
                        room_id,
                        stay,
                        &ReservationStatus::NON_BLOCKING,
                    ))
                    .await?;
                if clashes.iter().any(|other| other.id != id) {
                    return Err(BookingError::RoomUnavailable {
                        room_id,
                        reason: format!("already booked for {stay}"),
                    });
                }
            }
            let mut request = PricingRequest::new(
                current.hotel_id,
                current.room_type,
                stay.check_in(),
                stay.check_out(),
            );
            request.promo_code = current.promo_code.clone();
            let breakdown = self.pricing.compute_cost(&request).await?;
            (breakdown.final_total, breakdown.base_rate_per_night)
        };

        let action = ReservationAction::Modify {
            stay,
            guests,
            special_requests: changes
                .special_requests
                .clone()
                .or_else(|| current.special_requests.clone()),
            total_amount,
            price_per_night,
        };
        let actor = actor_for(current, channel);
        self.reduce_and_commit(&mut state, action, &actor).await
    }

    /// Replaces the total amount of a booking by hand. Always audited.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] for a negative amount
    /// - [`BookingError::ReservationNotFound`] or a storage error
    #[instrument(skip(self, reason))]
    pub async fn override_total(
        &self,
        id: ReservationId,
        amount: Money,
        actor: &str,
        reason: &str,
    ) -> Result<Reservation> {
        if amount < Money::ZERO {
            return Err(BookingError::InvalidRequest(format!(
                "total {amount} cannot be negative"
            )));
        }
        let action = ReservationAction::OverrideTotal {
            amount,
            reason: reason.to_string(),
        };
        let (reservation, _) = self
            .apply(id, None, |_| Ok((action.clone(), actor.to_string())))
            .await?;
        Ok(reservation)
    }

    /// Removes a booking that never reached check-in.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotDeletable`] once the guest has checked in
    /// - [`BookingError::ReservationNotFound`] or a storage error
    #[instrument(skip(self))]
    pub async fn delete_booking(&self, id: ReservationId, actor: &str) -> Result<()> {
        let _guard = self.reservation_locks.lock(id).await;
        let reservation = self.reservation(id).await?;
        if matches!(
            reservation.status,
            ReservationStatus::CheckedIn | ReservationStatus::CheckedOut
        ) {
            return Err(BookingError::NotDeletable {
                reservation_id: id,
                status: reservation.status,
            });
        }
        self.persist(self.ports.reservations.delete(id)).await?;
        info!(reservation_id = %id, actor, status = %reservation.status, "reservation deleted");
        Ok(())
    }

    /// Opens or closes a room for new bookings, independently of its status.
    ///
    /// The flag is not part of the status pair the reducer keeps consistent,
    /// so it is written on its own, guarded by the room lock and the room's
    /// version.
    ///
    /// # Errors
    ///
    /// - [`BookingError::RoomStillOccupied`] when closing an occupied room
    /// - [`BookingError::Repository`] when the room does not exist or storage fails
    #[instrument(skip(self))]
    pub async fn set_room_bookable(
        &self,
        room_id: RoomId,
        bookable: bool,
        actor: &str,
    ) -> Result<Room> {
        let _guard = self.room_locks.lock(room_id).await;
        let mut room = self
            .persist(self.ports.rooms.find_by_id(room_id))
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "room",
                id: room_id.to_string(),
            })?;

        if !bookable && self.has_guest_in_house(&room).await? {
            return Err(BookingError::RoomStillOccupied(room_id));
        }

        room.bookable = bookable;
        let saved = self.persist(self.ports.rooms.save(&room)).await?;
        info!(%room_id, bookable, actor, "room availability changed");
        Ok(saved)
    }

    async fn has_guest_in_house(&self, room: &Room) -> Result<bool> {
        if room.status == RoomStatus::Occupied {
            return Ok(true);
        }
        let today = self.ports.clock.today();
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let Some(tonight) = StayDates::new(today, tomorrow) else {
            return Ok(false);
        };
        let everything_but_checked_in = [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::CheckedOut,
            ReservationStatus::Cancelled,
            ReservationStatus::NoShow,
        ];
        let in_house = self
            .persist(self.ports.reservations.find_overlapping(
                room.id,
                tonight,
                &everything_but_checked_in,
            ))
            .await?;
        Ok(!in_house.is_empty())
    }

    // ========================================================================
    // Shared plumbing
    // ========================================================================

    /// Lock, plan, reduce and commit with conflict retries, then run the
    /// effects.
    ///
    /// `plan` sees the freshly loaded state on every attempt and returns the
    /// action with the actor it is recorded under.
    async fn apply<P>(
        &self,
        id: ReservationId,
        target: Option<ReservationStatus>,
        plan: P,
    ) -> Result<(Reservation, Effects)>
    where
        P: Fn(&ReservationState) -> Result<(ReservationAction, String)>,
    {
        let _guard = self.reservation_locks.lock(id).await;
        let _room_guard = if target == Some(ReservationStatus::Confirmed) {
            self.lock_room_of(id).await?
        } else {
            None
        };

        let plan = &plan;
        let outcome = retry_with_predicate(
            self.config.conflict_policy(),
            "reservation_transition",
            || async move {
                let mut state = self.load(id).await?;
                let (action, actor) = plan(&state)?;
                if matches!(action, ReservationAction::Confirm { .. }) {
                    self.ensure_room_still_free(&state.reservation).await?;
                }
                self.reduce_and_commit(&mut state, action, &actor).await
            },
            is_conflict,
        )
        .await;

        let label = target.map_or_else(|| "none".to_string(), |status| status.to_string());
        match outcome {
            Ok((reservation, effects)) => {
                metrics::counter!(TRANSITIONS, "to" => label).increment(1);
                info!(reservation_id = %id, status = %reservation.status, "reservation updated");
                self.ports.effects.run(effects.iter().cloned()).await;
                Ok((reservation, effects))
            }
            Err(error) => {
                if matches!(error, BookingError::Transition(_)) {
                    metrics::counter!(TRANSITIONS_REJECTED, "to" => label).increment(1);
                }
                warn!(reservation_id = %id, error = %error, "reservation update rejected");
                Err(error)
            }
        }
    }

    /// Waits for the lock of the room reservation `id` is assigned to
    async fn lock_room_of(&self, id: ReservationId) -> Result<Option<KeyGuard>> {
        let reservation = self.reservation(id).await?;
        Ok(match reservation.room_id {
            Some(room_id) => Some(self.room_locks.lock(room_id).await),
            None => None,
        })
    }

    async fn load(&self, id: ReservationId) -> Result<ReservationState> {
        let reservation = self.reservation(id).await?;
        let room = match reservation.room_id {
            Some(room_id) => self.persist(self.ports.rooms.find_by_id(room_id)).await?,
            None => None,
        };
        Ok(ReservationState::new(reservation, room))
    }

    async fn reduce_and_commit(
        &self,
        state: &mut ReservationState,
        action: ReservationAction,
        actor: &str,
    ) -> Result<(Reservation, Effects)> {
        let env = ReservationEnvironment::new(self.ports.clock.clone(), actor);
        let room_before = state.room.clone();
        let effects = self.reducer.reduce(state, action, &env)?;

        // only write the room when the transition touched it
        let room = state
            .room
            .as_ref()
            .filter(|room| Some(*room) != room_before.as_ref());
        let committed = self
            .persist(self.ports.unit_of_work.commit(&state.reservation, room))
            .await?;
        Ok((committed.reservation, effects))
    }

    /// Pending bookings do not hold their room, so confirming one late must
    /// make sure nobody else took it.
    async fn ensure_room_still_free(&self, reservation: &Reservation) -> Result<()> {
        let Some(room_id) = reservation.room_id else {
            return Ok(());
        };
        let clashes = self
            .persist(self.ports.reservations.find_overlapping(
                room_id,
                reservation.stay,
                &ReservationStatus::NON_BLOCKING,
            ))
            .await?;
        if clashes.iter().any(|other| other.id != reservation.id) {
            return Err(BookingError::RoomUnavailable {
                room_id,
                reason: format!("already booked for {}", reservation.stay),
            });
        }
        Ok(())
    }

    fn check_notice(
        &self,
        reservation: &Reservation,
        channel: &RequestChannel,
        notice_hours: i64,
    ) -> Result<()> {
        if !matches!(channel, RequestChannel::Guest) {
            return Ok(());
        }
        let arrival = reservation.stay.check_in().and_time(NaiveTime::MIN).and_utc();
        let hours_left = (arrival - self.ports.clock.now()).num_hours();
        if hours_left < notice_hours {
            return Err(BookingError::CancellationWindowClosed {
                reservation_id: reservation.id,
                notice_hours,
            });
        }
        Ok(())
    }
}
