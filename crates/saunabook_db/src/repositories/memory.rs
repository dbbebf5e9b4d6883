//! In-memory store
//!
//! A transaction holds the owned store lock for its whole lifetime and works
//! on a private copy that replaces the shared state on commit, so
//! transactions are serializable by construction. Used by tests and by
//! embedders that don't need durability.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use saunabook_common::time::local_day;
use saunabook_common::{
    Boat, Club, Island, IslandDevice, IslandDirectory, IslandRows, Reservation,
    ReservationStatus, Sauna, SharedReservation, SharedReservationParticipant, TimeRange,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{DbError, UniqueKey};
use crate::repository::{
    BookingStore, BookingTransaction, DeviceRepository, SharedReservationFilter,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    clubs: BTreeMap<Uuid, Club>,
    islands: BTreeMap<Uuid, Island>,
    saunas: BTreeMap<Uuid, Sauna>,
    boats: BTreeMap<Uuid, Boat>,
    reservations: BTreeMap<Uuid, Reservation>,
    shared: BTreeMap<Uuid, SharedReservation>,
    participants: BTreeMap<Uuid, SharedReservationParticipant>,
    devices: BTreeMap<Uuid, IslandDevice>,
}

impl MemoryState {
    fn check_reservation(&self, candidate: &Reservation, tz: Tz) -> Result<(), DbError> {
        if !candidate.is_active() {
            return Ok(());
        }
        let day = local_day(candidate.start_time, tz);
        for existing in self.reservations.values() {
            if existing.id == candidate.id || !existing.is_active() {
                continue;
            }
            if existing.sauna_id == candidate.sauna_id && existing.start_time == candidate.start_time
            {
                return Err(DbError::unique(
                    UniqueKey::SaunaSlot,
                    "ux_reservations_sauna_slot",
                ));
            }
            if existing.boat_id == candidate.boat_id
                && existing.island_id == candidate.island_id
                && local_day(existing.start_time, tz) == day
            {
                return Err(DbError::unique(
                    UniqueKey::BoatIslandDay,
                    "ux_reservations_boat_day",
                ));
            }
        }
        Ok(())
    }

    fn check_shared(&self, candidate: &SharedReservation) -> Result<(), DbError> {
        let taken = self.shared.values().any(|existing| {
            existing.id != candidate.id
                && existing.sauna_id == candidate.sauna_id
                && existing.date == candidate.date
        });
        if taken {
            return Err(DbError::unique(UniqueKey::SaunaDate, "ux_shared_sauna_date"));
        }
        Ok(())
    }

    fn check_participant(&self, candidate: &SharedReservationParticipant) -> Result<(), DbError> {
        let taken = self.participants.values().any(|existing| {
            existing.id != candidate.id
                && existing.shared_reservation_id == candidate.shared_reservation_id
                && existing.boat_id == candidate.boat_id
        });
        if taken {
            return Err(DbError::unique(
                UniqueKey::SharedBoat,
                "ux_participants_shared_boat",
            ));
        }
        Ok(())
    }

    fn island_of_sauna(&self, sauna_id: Uuid) -> Option<Uuid> {
        self.saunas.get(&sauna_id).map(|s| s.island_id)
    }
}

/// In-memory [`BookingStore`] and [`DeviceRepository`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    tz: Tz,
}

impl MemoryStore {
    /// `tz` defines the local day used by the boat/island/day uniqueness key.
    pub fn new(tz: Tz) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            tz,
        }
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }
}

/// A transaction on a [`MemoryStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
    tz: Tz,
}

impl BookingStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn begin(&self) -> Result<MemoryTransaction, DbError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(MemoryTransaction {
            guard,
            work,
            tz: self.tz,
        })
    }
}

fn sorted_by_start(mut rows: Vec<Reservation>) -> Vec<Reservation> {
    rows.sort_by_key(|r| (r.start_time, r.id));
    rows
}

impl BookingTransaction for MemoryTransaction {
    async fn get_club(&mut self, id: Uuid) -> Result<Option<Club>, DbError> {
        Ok(self.work.clubs.get(&id).cloned())
    }

    async fn get_island(&mut self, id: Uuid) -> Result<Option<Island>, DbError> {
        Ok(self.work.islands.get(&id).cloned())
    }

    async fn get_sauna(&mut self, id: Uuid) -> Result<Option<Sauna>, DbError> {
        Ok(self.work.saunas.get(&id).cloned())
    }

    async fn get_boat(&mut self, id: Uuid) -> Result<Option<Boat>, DbError> {
        Ok(self.work.boats.get(&id).cloned())
    }

    async fn list_auto_club_saunas(&mut self) -> Result<Vec<Sauna>, DbError> {
        Ok(self
            .work
            .saunas
            .values()
            .filter(|s| s.auto_club_sauna_enabled)
            .cloned()
            .collect())
    }

    async fn list_saunas_for_island(&mut self, island_id: Uuid) -> Result<Vec<Sauna>, DbError> {
        Ok(self
            .work
            .saunas
            .values()
            .filter(|s| s.island_id == island_id)
            .cloned()
            .collect())
    }

    async fn list_boats_for_club(&mut self, club_id: Uuid) -> Result<Vec<Boat>, DbError> {
        Ok(self
            .work
            .boats
            .values()
            .filter(|b| b.club_id == club_id)
            .cloned()
            .collect())
    }

    async fn install_directory(&mut self, directory: &IslandDirectory) -> Result<(), DbError> {
        let work = &mut self.work;
        work.clubs.insert(directory.club.id, directory.club.clone());
        work.islands
            .insert(directory.island.id, directory.island.clone());
        for sauna in &directory.saunas {
            work.saunas.insert(sauna.id, sauna.clone());
        }
        for boat in &directory.boats {
            work.boats.insert(boat.id, boat.clone());
        }
        Ok(())
    }

    async fn list_reservations(
        &mut self,
        sauna_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, DbError> {
        Ok(sorted_by_start(
            self.work
                .reservations
                .values()
                .filter(|r| r.sauna_id == sauna_id && r.range().overlaps(&range))
                .cloned()
                .collect(),
        ))
    }

    async fn list_active_reservations_for_boat_on_island(
        &mut self,
        boat_id: Uuid,
        island_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Reservation>, DbError> {
        let tz = self.tz;
        Ok(sorted_by_start(
            self.work
                .reservations
                .values()
                .filter(|r| {
                    r.is_active()
                        && r.boat_id == boat_id
                        && r.island_id == island_id
                        && local_day(r.start_time, tz) == day
                })
                .cloned()
                .collect(),
        ))
    }

    async fn get_reservation(&mut self, id: Uuid) -> Result<Option<Reservation>, DbError> {
        Ok(self.work.reservations.get(&id).cloned())
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), DbError> {
        if self.work.reservations.contains_key(&reservation.id) {
            return Err(DbError::unique(UniqueKey::Other, "reservations.id"));
        }
        self.work.check_reservation(reservation, self.tz)?;
        self.work
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn update_reservation_status(
        &mut self,
        id: Uuid,
        status: ReservationStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Result<bool, DbError> {
        let Some(existing) = self.work.reservations.get(&id) else {
            return Ok(false);
        };
        let mut updated = existing.clone();
        updated.status = status;
        updated.cancelled_at = cancelled_at;
        self.work.check_reservation(&updated, self.tz)?;
        self.work.reservations.insert(id, updated);
        Ok(true)
    }

    async fn upsert_reservation(&mut self, reservation: &Reservation) -> Result<(), DbError> {
        self.work.check_reservation(reservation, self.tz)?;
        self.work
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn delete_reservation(&mut self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.work.reservations.remove(&id).is_some())
    }

    async fn list_shared_reservations(
        &mut self,
        filter: &SharedReservationFilter,
    ) -> Result<Vec<SharedReservation>, DbError> {
        let mut rows: Vec<SharedReservation> = self
            .work
            .shared
            .values()
            .filter(|s| filter.matches(s, self.work.island_of_sauna(s.sauna_id)))
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.date, s.sauna_id));
        Ok(rows)
    }

    async fn get_shared_reservation(
        &mut self,
        id: Uuid,
    ) -> Result<Option<SharedReservation>, DbError> {
        Ok(self.work.shared.get(&id).cloned())
    }

    async fn insert_shared_reservation(&mut self, shared: &SharedReservation) -> Result<(), DbError> {
        if self.work.shared.contains_key(&shared.id) {
            return Err(DbError::unique(UniqueKey::Other, "shared_reservations.id"));
        }
        self.work.check_shared(shared)?;
        self.work.shared.insert(shared.id, shared.clone());
        Ok(())
    }

    async fn update_shared_reservation(
        &mut self,
        shared: &SharedReservation,
    ) -> Result<bool, DbError> {
        if !self.work.shared.contains_key(&shared.id) {
            return Ok(false);
        }
        self.work.check_shared(shared)?;
        self.work.shared.insert(shared.id, shared.clone());
        Ok(true)
    }

    async fn upsert_shared_reservation(&mut self, shared: &SharedReservation) -> Result<(), DbError> {
        self.work.check_shared(shared)?;
        self.work.shared.insert(shared.id, shared.clone());
        Ok(())
    }

    async fn delete_shared_reservation(&mut self, id: Uuid) -> Result<bool, DbError> {
        let removed = self.work.shared.remove(&id).is_some();
        self.work
            .participants
            .retain(|_, p| p.shared_reservation_id != id);
        Ok(removed)
    }

    async fn list_participants(
        &mut self,
        shared_reservation_id: Uuid,
    ) -> Result<Vec<SharedReservationParticipant>, DbError> {
        let mut rows: Vec<SharedReservationParticipant> = self
            .work
            .participants
            .values()
            .filter(|p| p.shared_reservation_id == shared_reservation_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| (p.created_at, p.id));
        Ok(rows)
    }

    async fn list_participations_for_boat_on_island(
        &mut self,
        boat_id: Uuid,
        island_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<SharedReservationParticipant>, DbError> {
        let work = &self.work;
        Ok(work
            .participants
            .values()
            .filter(|p| p.boat_id == boat_id)
            .filter(|p| {
                work.shared.get(&p.shared_reservation_id).is_some_and(|s| {
                    s.date == date && work.island_of_sauna(s.sauna_id) == Some(island_id)
                })
            })
            .cloned()
            .collect())
    }

    async fn insert_participant(
        &mut self,
        participant: &SharedReservationParticipant,
    ) -> Result<(), DbError> {
        if self.work.participants.contains_key(&participant.id) {
            return Err(DbError::unique(
                UniqueKey::Other,
                "shared_reservation_participants.id",
            ));
        }
        self.work.check_participant(participant)?;
        self.work
            .participants
            .insert(participant.id, participant.clone());
        Ok(())
    }

    async fn upsert_participant(
        &mut self,
        participant: &SharedReservationParticipant,
    ) -> Result<(), DbError> {
        self.work.check_participant(participant)?;
        self.work
            .participants
            .insert(participant.id, participant.clone());
        Ok(())
    }

    async fn delete_participant(&mut self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.work.participants.remove(&id).is_some())
    }

    async fn export_island_rows(
        &mut self,
        island_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<IslandRows, DbError> {
        let work = &self.work;
        let reservations = sorted_by_start(
            work.reservations
                .values()
                .filter(|r| r.island_id == island_id && r.start_time >= since)
                .cloned()
                .collect(),
        );
        let shared_reservations: Vec<SharedReservation> = work
            .shared
            .values()
            .filter(|s| {
                s.start_time >= since && work.island_of_sauna(s.sauna_id) == Some(island_id)
            })
            .cloned()
            .collect();
        let participants = work
            .participants
            .values()
            .filter(|p| {
                shared_reservations
                    .iter()
                    .any(|s| s.id == p.shared_reservation_id)
            })
            .cloned()
            .collect();
        Ok(IslandRows {
            reservations,
            shared_reservations,
            participants,
        })
    }

    async fn wipe(&mut self) -> Result<(), DbError> {
        self.work = MemoryState::default();
        Ok(())
    }

    async fn commit(self) -> Result<(), DbError> {
        let MemoryTransaction {
            mut guard, work, ..
        } = self;
        *guard = work;
        Ok(())
    }
}

impl DeviceRepository for MemoryStore {
    async fn issue_device_token(
        &self,
        island_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IslandDevice, DbError> {
        let device = IslandDevice {
            id: Uuid::new_v4(),
            island_id,
            device_token_hash: token_hash.to_string(),
            device_id: None,
            is_configured: false,
            issued_at,
            configured_at: None,
            last_sync_at: None,
        };
        let mut state = self.state.lock().await;
        state.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn consume_device_token(
        &self,
        token_hash: &str,
        device_id: &str,
        configured_at: DateTime<Utc>,
    ) -> Result<Option<IslandDevice>, DbError> {
        let mut state = self.state.lock().await;
        let Some(device) = state
            .devices
            .values_mut()
            .find(|d| d.device_token_hash == token_hash && !d.is_configured)
        else {
            return Ok(None);
        };
        device.device_id = Some(device_id.to_string());
        device.is_configured = true;
        device.configured_at = Some(configured_at);
        Ok(Some(device.clone()))
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<IslandDevice>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .devices
            .values()
            .find(|d| d.device_id.as_deref() == Some(device_id))
            .cloned())
    }

    async fn touch_device_sync(&self, device_id: &str, at: DateTime<Utc>) -> Result<bool, DbError> {
        let mut state = self.state.lock().await;
        match state
            .devices
            .values_mut()
            .find(|d| d.device_id.as_deref() == Some(device_id))
        {
            Some(device) => {
                device.last_sync_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
