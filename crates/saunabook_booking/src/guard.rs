// --- File: crates/saunabook_booking/src/guard.rs ---
//! Store-backed booking operations.
//!
//! Every check runs in the same store transaction as the write it guards.

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use saunabook_common::time::{
    day_range, is_hour_aligned, local_day, parse_time_zone, truncate_to_hour,
};
use saunabook_common::{
    not_found, validation_error, Clock, Reservation, ReservationStatus, SaunaError, TimeRange,
};
use saunabook_config::AppConfig;
use saunabook_db::{BookingStore, BookingTransaction, SharedReservationFilter};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::logic::{
    check_cancellable, next_available, slot_is_taken, BookingRules, CreateReservationRequest,
    NextSlot, SaunaDayOverview,
};
use crate::shared::view_of;

/// Booking operations bound to one store.
pub struct BookingService<S: BookingStore> {
    pub(crate) store: S,
    pub(crate) tz: Tz,
    pub(crate) rules: BookingRules,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<S: BookingStore> BookingService<S> {
    pub fn new(store: S, tz: Tz, rules: BookingRules, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tz,
            rules,
            clock,
        }
    }

    pub fn from_config(
        store: S,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SaunaError> {
        let tz = parse_time_zone(&config.time_zone)?;
        Ok(Self::new(store, tz, BookingRules::from(&config.booking), clock))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The next bookable hour of a sauna, as of now.
    pub async fn next_available_for_sauna(&self, sauna_id: Uuid) -> Result<NextSlot, SaunaError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let sauna = tx
            .get_sauna(sauna_id)
            .await?
            .ok_or_else(|| not_found(format!("sauna {}", sauna_id)))?;

        let horizon = i64::from(sauna.heating_time_hours) + i64::from(self.rules.max_slot_search) + 2;
        let window = TimeRange::new(now, now + Duration::hours(horizon));
        let reservations: Vec<Reservation> = tx
            .list_reservations(sauna_id, window)
            .await?
            .into_iter()
            .filter(Reservation::is_active)
            .collect();

        let current = reservations
            .iter()
            .find(|r| r.start_time <= now && now < r.end_time);
        let future: Vec<Reservation> = reservations
            .iter()
            .filter(|r| r.start_time > now)
            .cloned()
            .collect();

        let slot = next_available(&sauna, current, &future, now, self.tz, &self.rules);
        debug!(
            sauna_id = %sauna_id,
            start = %slot.start_time,
            reason = slot.reason.as_str(),
            "Next available slot computed"
        );
        Ok(slot)
    }

    /// Reservations and shared reservations of a sauna on a local day.
    pub async fn sauna_day_overview(
        &self,
        sauna_id: Uuid,
        date: NaiveDate,
    ) -> Result<SaunaDayOverview, SaunaError> {
        let mut tx = self.store.begin().await?;
        let sauna = tx
            .get_sauna(sauna_id)
            .await?
            .ok_or_else(|| not_found(format!("sauna {}", sauna_id)))?;

        let reservations = tx.list_reservations(sauna_id, day_range(date, self.tz)).await?;
        let filter = SharedReservationFilter {
            sauna_id: Some(sauna_id),
            date: Some(date),
            ..Default::default()
        };
        let mut shared_reservations = Vec::new();
        for shared in tx.list_shared_reservations(&filter).await? {
            let participants = tx.list_participants(shared.id).await?;
            shared_reservations.push(view_of(shared, participants));
        }

        Ok(SaunaDayOverview {
            sauna,
            date,
            reservations,
            shared_reservations,
        })
    }

    /// Books one hour of a sauna for a boat.
    pub async fn create_reservation(
        &self,
        request: CreateReservationRequest,
    ) -> Result<Reservation, SaunaError> {
        if request.adults < 1 {
            return Err(validation_error("at least one adult is required"));
        }
        if !is_hour_aligned(request.start_time, self.tz) {
            return Err(validation_error("start time must be on a full hour"));
        }
        let now = self.clock.now();
        if request.start_time < truncate_to_hour(now, self.tz) {
            return Err(validation_error("start time is in the past"));
        }

        let mut tx = self.store.begin().await?;
        let sauna = tx
            .get_sauna(request.sauna_id)
            .await?
            .ok_or_else(|| not_found(format!("sauna {}", request.sauna_id)))?;
        tx.get_boat(request.boat_id)
            .await?
            .ok_or_else(|| not_found(format!("boat {}", request.boat_id)))?;

        let day = local_day(request.start_time, self.tz);
        self.check_daily_limit(&mut tx, request.boat_id, sauna.island_id, day, true)
            .await?;

        let slot = TimeRange::new(request.start_time, request.start_time + Duration::hours(1));
        let taken = tx.list_reservations(sauna.id, slot).await?;
        if slot_is_taken(&slot, &taken) {
            warn!(sauna_id = %sauna.id, start = %slot.start, "Slot already taken");
            return Err(SaunaError::SlotConflict);
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            sauna_id: sauna.id,
            island_id: sauna.island_id,
            boat_id: request.boat_id,
            start_time: slot.start,
            end_time: slot.end,
            adults: request.adults,
            kids: request.kids,
            status: ReservationStatus::Active,
            created_at: now,
            cancelled_at: None,
        };
        tx.insert_reservation(&reservation).await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            sauna_id = %reservation.sauna_id,
            boat_id = %reservation.boat_id,
            start = %reservation.start_time,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// Cancels a reservation; the row stays, marked CANCELLED.
    pub async fn cancel_reservation(&self, id: Uuid) -> Result<Reservation, SaunaError> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let mut reservation = tx
            .get_reservation(id)
            .await?
            .ok_or_else(|| not_found(format!("reservation {}", id)))?;

        if let Err(rejection) = check_cancellable(&reservation, now, self.rules.cancellation_cutoff)
        {
            warn!(reservation_id = %id, reason = ?rejection.cancel_reason(), "Cancellation rejected");
            return Err(rejection);
        }

        tx.update_reservation_status(id, ReservationStatus::Cancelled, Some(now))
            .await?;
        tx.commit().await?;

        reservation.status = ReservationStatus::Cancelled;
        reservation.cancelled_at = Some(now);
        info!(reservation_id = %id, "Reservation cancelled");
        Ok(reservation)
    }

    /// One commitment per boat per island per local day.
    ///
    /// `individual` says which kind of commitment is being added. Commitments
    /// of the same kind always block; the other kind only blocks when shared
    /// participations count toward the limit.
    pub(crate) async fn check_daily_limit(
        &self,
        tx: &mut S::Tx,
        boat_id: Uuid,
        island_id: Uuid,
        day: NaiveDate,
        individual: bool,
    ) -> Result<(), SaunaError> {
        let cross = self.rules.shared_counts_toward_daily_limit;

        if individual || cross {
            let booked = tx
                .list_active_reservations_for_boat_on_island(boat_id, island_id, day)
                .await?;
            if !booked.is_empty() {
                warn!(boat_id = %boat_id, island_id = %island_id, %day, "Daily limit reached");
                return Err(SaunaError::DailyLimitExceeded);
            }
        }
        if !individual || cross {
            let joined = tx
                .list_participations_for_boat_on_island(boat_id, island_id, day)
                .await?;
            if !joined.is_empty() {
                warn!(boat_id = %boat_id, island_id = %island_id, %day, "Daily limit reached (shared)");
                return Err(SaunaError::DailyLimitExceeded);
            }
        }
        Ok(())
    }
}

impl<S: BookingStore> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            tz: self.tz,
            rules: self.rules,
            clock: self.clock.clone(),
        }
    }
}
