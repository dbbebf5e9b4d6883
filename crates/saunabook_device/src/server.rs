// --- File: crates/saunabook_device/src/server.rs ---
//! Backend side of terminal provisioning and sync.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use saunabook_common::time::local_day;
use saunabook_common::{
    not_found, validation_error, Clock, IslandDevice, IslandDirectory, IslandRows, Reservation,
    ReservationStatus, SaunaError, SharedReservation, SharedReservationParticipant,
};
use saunabook_db::{BookingStore, BookingTransaction, DeviceRepository, SharedReservationFilter};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{
    ConfigureRequest, DeviceSnapshot, IssuedToken, PullRequest, SyncRequest, SyncResponse,
};
use crate::token::{generate_token, hash_token};

/// Serves terminals from the backend store.
pub struct DeviceSyncService<S: BookingStore, D: DeviceRepository> {
    store: S,
    devices: D,
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl<S: BookingStore, D: DeviceRepository> DeviceSyncService<S, D> {
    pub fn new(store: S, devices: D, tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            devices,
            tz,
            clock,
        }
    }

    /// Issues a setup token for a terminal on `island_id`.
    ///
    /// The plain token is only ever part of this response.
    pub async fn issue_token(&self, island_id: Uuid) -> Result<IssuedToken, SaunaError> {
        let mut tx = self.store.begin().await?;
        let island = tx
            .get_island(island_id)
            .await?
            .ok_or_else(|| not_found(format!("island {}", island_id)))?;
        drop(tx);

        let token = generate_token();
        let device = self
            .devices
            .issue_device_token(island.id, &hash_token(&token), self.clock.now())
            .await?;
        info!(island_id = %island.id, device = %device.id, "Device token issued");
        Ok(IssuedToken { token, device })
    }

    /// Consumes a setup token and returns the island snapshot.
    pub async fn configure(&self, request: ConfigureRequest) -> Result<DeviceSnapshot, SaunaError> {
        let device_id = request.device_id.trim();
        if device_id.is_empty() {
            return Err(validation_error("device_id must not be empty"));
        }
        let device = self
            .devices
            .consume_device_token(&hash_token(&request.token), device_id, self.clock.now())
            .await?
            .ok_or_else(|| {
                warn!(%device_id, "Unknown or already used device token");
                validation_error("unknown or already used device token")
            })?;

        let directory = self.directory(device.island_id).await?;
        info!(%device_id, island_id = %device.island_id, "Device configured");
        Ok(DeviceSnapshot {
            device_id: device_id.to_string(),
            directory,
        })
    }

    async fn directory(&self, island_id: Uuid) -> Result<IslandDirectory, SaunaError> {
        let mut tx = self.store.begin().await?;
        let island = tx
            .get_island(island_id)
            .await?
            .ok_or_else(|| not_found(format!("island {}", island_id)))?;
        let club = tx
            .get_club(island.club_id)
            .await?
            .ok_or_else(|| not_found(format!("club {}", island.club_id)))?;
        let saunas = tx.list_saunas_for_island(island.id).await?;
        let boats = tx.list_boats_for_club(club.id).await?;
        Ok(IslandDirectory {
            club,
            island,
            saunas,
            boats,
        })
    }

    /// The configured device `device_id`, if it is bound to `island_id`.
    pub async fn authorize(
        &self,
        device_id: &str,
        island_id: Uuid,
    ) -> Result<IslandDevice, SaunaError> {
        let device = self
            .devices
            .find_device(device_id)
            .await?
            .ok_or_else(|| not_found(format!("device {}", device_id)))?;
        if !device.is_configured || device.island_id != island_id {
            warn!(%device_id, %island_id, "Device is not configured for this island");
            return Err(validation_error(format!(
                "device {} is not configured for island {}",
                device_id, island_id
            )));
        }
        Ok(device)
    }

    /// Island rows since `request.since`.
    pub async fn pull(&self, request: PullRequest) -> Result<IslandRows, SaunaError> {
        self.authorize(&request.device_id, request.island_id).await?;
        let mut tx = self.store.begin().await?;
        let rows = tx
            .export_island_rows(request.island_id, request.since)
            .await?;
        debug!(device_id = %request.device_id, rows = rows.len(), "Pull served");
        Ok(rows)
    }

    /// Writes device rows over backend rows in one transaction.
    ///
    /// A backend row holding a uniqueness key a device row needs gives way:
    /// reservations are cancelled, shared reservations and participations
    /// removed.
    pub async fn apply_push(&self, request: SyncRequest) -> Result<SyncResponse, SaunaError> {
        let SyncRequest {
            device_id,
            island_id,
            rows,
        } = request;
        // Before the transaction: a memory store has a single lock
        self.authorize(&device_id, island_id).await?;
        let now = self.clock.now();

        let mut tx = self.store.begin().await?;
        let island_saunas: HashSet<Uuid> = tx
            .list_saunas_for_island(island_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if island_saunas.is_empty() {
            return Err(not_found(format!("saunas of island {}", island_id)));
        }
        let mut response = SyncResponse::default();

        for shared in &rows.shared_reservations {
            if !island_saunas.contains(&shared.sauna_id) {
                return Err(foreign_row("shared reservation", shared.id, island_id));
            }
            response.yielded += yield_shared(&mut tx, shared).await?;
            tx.upsert_shared_reservation(shared).await?;
            response.applied += 1;
        }

        for reservation in &rows.reservations {
            if reservation.island_id != island_id || !island_saunas.contains(&reservation.sauna_id)
            {
                return Err(foreign_row("reservation", reservation.id, island_id));
            }
            if reservation.is_active() {
                response.yielded += self.yield_reservation(&mut tx, reservation, now).await?;
            }
            tx.upsert_reservation(reservation).await?;
            response.applied += 1;
        }

        for participant in &rows.participants {
            let parent = tx
                .get_shared_reservation(participant.shared_reservation_id)
                .await?
                .ok_or_else(|| {
                    not_found(format!(
                        "shared reservation {}",
                        participant.shared_reservation_id
                    ))
                })?;
            if !island_saunas.contains(&parent.sauna_id) {
                return Err(foreign_row("participant", participant.id, island_id));
            }
            response.yielded += yield_participant(&mut tx, participant).await?;
            tx.upsert_participant(participant).await?;
            response.applied += 1;
        }

        tx.commit().await?;
        self.devices.touch_device_sync(&device_id, now).await?;
        info!(
            %device_id,
            applied = response.applied,
            yielded = response.yielded,
            "Device push applied"
        );
        Ok(response)
    }

    async fn yield_reservation(
        &self,
        tx: &mut S::Tx,
        reservation: &Reservation,
        now: DateTime<Utc>,
    ) -> Result<u32, SaunaError> {
        let same_slot = tx
            .list_reservations(reservation.sauna_id, reservation.range())
            .await?;
        let same_day = tx
            .list_active_reservations_for_boat_on_island(
                reservation.boat_id,
                reservation.island_id,
                local_day(reservation.start_time, self.tz),
            )
            .await?;

        let mut cancelled: HashSet<Uuid> = HashSet::new();
        for other in same_slot.iter().chain(same_day.iter()) {
            if other.id == reservation.id || !other.is_active() || !cancelled.insert(other.id) {
                continue;
            }
            tx.update_reservation_status(other.id, ReservationStatus::Cancelled, Some(now))
                .await?;
            info!(cancelled = %other.id, kept = %reservation.id, "Backend reservation yields to device");
        }
        Ok(u32::try_from(cancelled.len()).unwrap_or(u32::MAX))
    }
}

async fn yield_shared<T: BookingTransaction>(
    tx: &mut T,
    shared: &SharedReservation,
) -> Result<u32, SaunaError> {
    let filter = SharedReservationFilter {
        sauna_id: Some(shared.sauna_id),
        date: Some(shared.date),
        ..SharedReservationFilter::default()
    };
    let mut yielded = 0;
    for other in tx.list_shared_reservations(&filter).await? {
        if other.id != shared.id && tx.delete_shared_reservation(other.id).await? {
            info!(removed = %other.id, kept = %shared.id, "Backend shared reservation yields to device");
            yielded += 1;
        }
    }
    Ok(yielded)
}

async fn yield_participant<T: BookingTransaction>(
    tx: &mut T,
    participant: &SharedReservationParticipant,
) -> Result<u32, SaunaError> {
    let mut yielded = 0;
    for other in tx
        .list_participants(participant.shared_reservation_id)
        .await?
    {
        if other.id != participant.id
            && other.boat_id == participant.boat_id
            && tx.delete_participant(other.id).await?
        {
            yielded += 1;
        }
    }
    Ok(yielded)
}

fn foreign_row(kind: &str, id: Uuid, island_id: Uuid) -> SaunaError {
    warn!(%id, %island_id, "Pushed {} is not on the device's island", kind);
    validation_error(format!("{} {} is not on island {}", kind, id, island_id))
}
