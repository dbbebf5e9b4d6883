// --- File: crates/saunabook_booking/src/shared.rs ---
//! Shared (club) reservations: a communal block split into two gender segments.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use saunabook_common::time::local_instant;
use saunabook_common::{
    not_found, validation_error, GenderOrder, SaunaError, SharedReservation,
    SharedReservationParticipant, TimeRange,
};
use saunabook_db::{BookingStore, BookingTransaction, SharedReservationFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::guard::BookingService;
use crate::logic::SharedReservationView;

/// Longest single gender segment.
pub const MAX_SEGMENT_HOURS: u32 = 12;

/// The two consecutive segments of a shared reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderSchedule {
    pub males_start: DateTime<Utc>,
    pub males_end: DateTime<Utc>,
    pub females_start: DateTime<Utc>,
    pub females_end: DateTime<Utc>,
}

impl GenderSchedule {
    /// The whole block, from the first segment's start to the second's end.
    pub fn block(&self) -> TimeRange {
        TimeRange::new(
            self.males_start.min(self.females_start),
            self.males_end.max(self.females_end),
        )
    }
}

/// Lays out the gender segments: the first segment starts at `start_time`,
/// the second immediately follows it.
pub fn gender_schedule(shared: &SharedReservation) -> GenderSchedule {
    let males = Duration::hours(i64::from(shared.males_duration_hours));
    let females = Duration::hours(i64::from(shared.females_duration_hours));
    let start = shared.start_time;

    match shared.gender_order {
        GenderOrder::MalesFirst => GenderSchedule {
            males_start: start,
            males_end: start + males,
            females_start: start + males,
            females_end: start + males + females,
        },
        GenderOrder::FemalesFirst => GenderSchedule {
            females_start: start,
            females_end: start + females,
            males_start: start + females,
            males_end: start + females + males,
        },
    }
}

pub(crate) fn view_of(
    shared: SharedReservation,
    participants: Vec<SharedReservationParticipant>,
) -> SharedReservationView {
    SharedReservationView {
        schedule: gender_schedule(&shared),
        shared,
        participants,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSharedReservationRequest {
    pub sauna_id: Uuid,
    /// Local date of the block.
    pub date: NaiveDate,
    /// Local hour the first segment starts, 0-23.
    pub start_hour: u32,
    pub males_duration_hours: u32,
    pub females_duration_hours: u32,
    pub gender_order: GenderOrder,
    pub name: String,
    pub created_by: String,
    #[serde(default)]
    pub is_auto_generated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSharedReservationRequest {
    pub boat_id: Uuid,
    pub adults: u32,
    #[serde(default)]
    pub kids: u32,
}

fn validate_shape(request: &CreateSharedReservationRequest) -> Result<NaiveTime, SaunaError> {
    if request.males_duration_hours > MAX_SEGMENT_HOURS
        || request.females_duration_hours > MAX_SEGMENT_HOURS
    {
        return Err(validation_error(format!(
            "a segment lasts at most {} hours",
            MAX_SEGMENT_HOURS
        )));
    }
    if request.males_duration_hours + request.females_duration_hours < 1 {
        return Err(validation_error("a shared reservation lasts at least one hour"));
    }
    if request.name.trim().is_empty() {
        return Err(validation_error("name must not be empty"));
    }
    NaiveTime::from_hms_opt(request.start_hour, 0, 0)
        .ok_or_else(|| validation_error(format!("invalid start hour {}", request.start_hour)))
}

impl<S: BookingStore> BookingService<S> {
    /// Creates a shared reservation; at most one per sauna and date.
    ///
    /// This is the only insertion path, used by admins and by the generator.
    pub async fn create_shared(
        &self,
        request: CreateSharedReservationRequest,
    ) -> Result<SharedReservationView, SaunaError> {
        let start_of_hour = validate_shape(&request)?;

        let mut tx = self.store.begin().await?;
        let sauna = tx
            .get_sauna(request.sauna_id)
            .await?
            .ok_or_else(|| not_found(format!("sauna {}", request.sauna_id)))?;

        let filter = SharedReservationFilter {
            sauna_id: Some(sauna.id),
            date: Some(request.date),
            ..Default::default()
        };
        if !tx.list_shared_reservations(&filter).await?.is_empty() {
            warn!(sauna_id = %sauna.id, date = %request.date, "Shared reservation already exists");
            return Err(SaunaError::SlotConflict);
        }

        let shared = SharedReservation {
            id: Uuid::new_v4(),
            sauna_id: sauna.id,
            date: request.date,
            start_time: local_instant(request.date, start_of_hour, self.tz),
            males_duration_hours: request.males_duration_hours,
            females_duration_hours: request.females_duration_hours,
            gender_order: request.gender_order,
            name: request.name.trim().to_string(),
            is_auto_generated: request.is_auto_generated,
            created_by: request.created_by,
            created_at: self.clock.now(),
        };
        tx.insert_shared_reservation(&shared).await?;
        tx.commit().await?;

        info!(
            shared_id = %shared.id,
            sauna_id = %shared.sauna_id,
            date = %shared.date,
            auto = shared.is_auto_generated,
            "Shared reservation created"
        );
        Ok(view_of(shared, Vec::new()))
    }

    /// Adds a boat to a shared reservation.
    ///
    /// The parent's timing and order are never touched.
    pub async fn join_shared(
        &self,
        shared_id: Uuid,
        request: JoinSharedReservationRequest,
    ) -> Result<SharedReservationParticipant, SaunaError> {
        if request.adults < 1 {
            return Err(validation_error("at least one adult is required"));
        }

        let mut tx = self.store.begin().await?;
        let shared = tx
            .get_shared_reservation(shared_id)
            .await?
            .ok_or_else(|| not_found(format!("shared reservation {}", shared_id)))?;
        let sauna = tx
            .get_sauna(shared.sauna_id)
            .await?
            .ok_or_else(|| not_found(format!("sauna {}", shared.sauna_id)))?;
        tx.get_boat(request.boat_id)
            .await?
            .ok_or_else(|| not_found(format!("boat {}", request.boat_id)))?;

        let participants = tx.list_participants(shared.id).await?;
        if participants.iter().any(|p| p.boat_id == request.boat_id) {
            warn!(shared_id = %shared.id, boat_id = %request.boat_id, "Boat already joined");
            return Err(SaunaError::AlreadyJoined);
        }

        self.check_daily_limit(&mut tx, request.boat_id, sauna.island_id, shared.date, false)
            .await?;

        let participant = SharedReservationParticipant {
            id: Uuid::new_v4(),
            shared_reservation_id: shared.id,
            boat_id: request.boat_id,
            adults: request.adults,
            kids: request.kids,
            created_at: self.clock.now(),
        };
        tx.insert_participant(&participant).await?;
        tx.commit().await?;

        info!(
            shared_id = %shared.id,
            boat_id = %participant.boat_id,
            "Boat joined shared reservation"
        );
        Ok(participant)
    }

    /// A shared reservation with its schedule and participants.
    pub async fn shared_detail(&self, shared_id: Uuid) -> Result<SharedReservationView, SaunaError> {
        let mut tx = self.store.begin().await?;
        let shared = tx
            .get_shared_reservation(shared_id)
            .await?
            .ok_or_else(|| not_found(format!("shared reservation {}", shared_id)))?;
        let participants = tx.list_participants(shared.id).await?;
        Ok(view_of(shared, participants))
    }
}
