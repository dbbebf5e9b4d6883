//! Store traits consumed by the booking core
//!
//! Every core read and write goes through a [`BookingTransaction`] opened by
//! [`BookingStore::begin`]; nothing is visible to other transactions until
//! [`BookingTransaction::commit`]. Dropping a transaction rolls it back.

use chrono::{DateTime, NaiveDate, Utc};
use saunabook_common::{
    Boat, Club, Island, IslandDevice, IslandDirectory, IslandRows, Reservation,
    ReservationStatus, Sauna, SharedReservation, SharedReservationParticipant, TimeRange,
};
use std::future::Future;
use uuid::Uuid;

use crate::error::DbError;

/// Selects shared reservations. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedReservationFilter {
    pub sauna_id: Option<Uuid>,
    pub island_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound on `date`.
    pub from_date: Option<NaiveDate>,
    pub is_auto_generated: Option<bool>,
}

impl SharedReservationFilter {
    pub fn matches(&self, shared: &SharedReservation, island_of_sauna: Option<Uuid>) -> bool {
        self.sauna_id.is_none_or(|id| shared.sauna_id == id)
            && self.island_id.is_none_or(|id| island_of_sauna == Some(id))
            && self.date.is_none_or(|d| shared.date == d)
            && self.from_date.is_none_or(|d| shared.date >= d)
            && self
                .is_auto_generated
                .is_none_or(|auto| shared.is_auto_generated == auto)
    }
}

/// A store that can open transactions.
pub trait BookingStore: Clone + Send + Sync + 'static {
    type Tx: BookingTransaction + 'static;

    /// Creates the tables and indexes if they don't already exist.
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Opens a transaction with serializable (or equivalent) isolation.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, DbError>> + Send;
}

/// One unit of work against the reservation store.
pub trait BookingTransaction: Send {
    // --- directory (read-only to the core) ---

    fn get_club(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Club>, DbError>> + Send;

    fn get_island(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Island>, DbError>> + Send;

    fn get_sauna(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Sauna>, DbError>> + Send;

    fn get_boat(&mut self, id: Uuid)
        -> impl Future<Output = Result<Option<Boat>, DbError>> + Send;

    /// Saunas with `auto_club_sauna_enabled`, in a stable order.
    fn list_auto_club_saunas(
        &mut self,
    ) -> impl Future<Output = Result<Vec<Sauna>, DbError>> + Send;

    fn list_saunas_for_island(
        &mut self,
        island_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Sauna>, DbError>> + Send;

    fn list_boats_for_club(
        &mut self,
        club_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Boat>, DbError>> + Send;

    /// Inserts or replaces the club, island, saunas and boats of a snapshot.
    fn install_directory(
        &mut self,
        directory: &IslandDirectory,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    // --- reservations ---

    /// Reservations of any status on `sauna_id` whose `[start, end)` overlaps `range`,
    /// ordered by start time.
    fn list_reservations(
        &mut self,
        sauna_id: Uuid,
        range: TimeRange,
    ) -> impl Future<Output = Result<Vec<Reservation>, DbError>> + Send;

    /// ACTIVE reservations of a boat on any sauna of an island on a local day.
    fn list_active_reservations_for_boat_on_island(
        &mut self,
        boat_id: Uuid,
        island_id: Uuid,
        day: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Reservation>, DbError>> + Send;

    fn get_reservation(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Reservation>, DbError>> + Send;

    fn insert_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Returns `false` when no reservation has this id.
    fn update_reservation_status(
        &mut self,
        id: Uuid,
        status: ReservationStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Inserts or overwrites every field of the row with this id.
    fn upsert_reservation(
        &mut self,
        reservation: &Reservation,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    fn delete_reservation(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    // --- shared reservations ---

    /// Ordered by date, then sauna.
    fn list_shared_reservations(
        &mut self,
        filter: &SharedReservationFilter,
    ) -> impl Future<Output = Result<Vec<SharedReservation>, DbError>> + Send;

    fn get_shared_reservation(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<SharedReservation>, DbError>> + Send;

    fn insert_shared_reservation(
        &mut self,
        shared: &SharedReservation,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    fn update_shared_reservation(
        &mut self,
        shared: &SharedReservation,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    fn upsert_shared_reservation(
        &mut self,
        shared: &SharedReservation,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Deletes the shared reservation together with its participants.
    fn delete_shared_reservation(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    // --- participants ---

    fn list_participants(
        &mut self,
        shared_reservation_id: Uuid,
    ) -> impl Future<Output = Result<Vec<SharedReservationParticipant>, DbError>> + Send;

    /// Participations of a boat in shared reservations on an island's saunas on a date.
    fn list_participations_for_boat_on_island(
        &mut self,
        boat_id: Uuid,
        island_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<SharedReservationParticipant>, DbError>> + Send;

    fn insert_participant(
        &mut self,
        participant: &SharedReservationParticipant,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    fn upsert_participant(
        &mut self,
        participant: &SharedReservationParticipant,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    fn delete_participant(
        &mut self,
        id: Uuid,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    // --- sync support ---

    /// Reservations starting at or after `since`, shared reservations starting
    /// at or after `since`, and the participants of those shared reservations,
    /// all on the saunas of `island_id`.
    fn export_island_rows(
        &mut self,
        island_id: Uuid,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<IslandRows, DbError>> + Send;

    /// Removes every row of every table.
    fn wipe(&mut self) -> impl Future<Output = Result<(), DbError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), DbError>> + Send;
}

/// Storage for island device provisioning.
pub trait DeviceRepository: Clone + Send + Sync + 'static {
    /// Records a freshly issued setup token (only its digest is stored).
    fn issue_device_token(
        &self,
        island_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<IslandDevice, DbError>> + Send;

    /// Binds an unconsumed token to `device_id`.
    ///
    /// Returns `None` when no unconsumed token has this digest.
    fn consume_device_token(
        &self,
        token_hash: &str,
        device_id: &str,
        configured_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<IslandDevice>, DbError>> + Send;

    fn find_device(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<IslandDevice>, DbError>> + Send;

    fn touch_device_sync(
        &self,
        device_id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;
}
