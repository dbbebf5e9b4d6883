// --- File: crates/saunabook_device/src/reconciler.rs ---
//! The island terminal: configuration, sync rounds and factory reset.
//!
//! Local bookings never wait for the backend. They go straight to the replica
//! through the booking service; this type only moves rows between the replica
//! and the backend.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use chrono_tz::Tz;
use saunabook_common::time::{local_day, local_instant};
use saunabook_common::{validation_error, Clock, IslandRows, SaunaError};
use saunabook_config::SyncConfig;
use saunabook_db::{BookingStore, BookingTransaction, DbError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::protocol::{ConfigureRequest, PullRequest, SyncRequest};
use crate::reconcile::{pending_changes, reconcile, touched_between, Reconciliation};
use crate::state::{DevicePhase, DeviceState, StateFile};
use crate::transport::SyncTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub interval: Duration,
    /// Days before today covered by a pull.
    pub history_days: i64,
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs.max(1)),
            history_days: config.history_days.max(0),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

/// What the terminal shows about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub phase: DevicePhase,
    pub device_id: String,
    pub island_id: Option<Uuid>,
    pub configured_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    pub online: bool,
    /// Local rows the backend has not seen yet.
    pub pending_changes: usize,
}

/// Outcome of one successful sync round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub pushed: u32,
    pub pulled: u32,
    pub dropped: u32,
    /// Backend rows that gave way to device rows.
    pub yielded: u32,
}

/// One island terminal. Constructed once and shared by `Arc`.
pub struct OfflineReconciler<S: BookingStore> {
    store: S,
    tz: Tz,
    transport: Arc<dyn SyncTransport>,
    clock: Arc<dyn Clock>,
    settings: SyncSettings,
    file: StateFile,
    /// Id pinned by configuration; a reset device otherwise gets a new one.
    pinned_device_id: Option<String>,
    state: Mutex<DeviceState>,
    /// Held for a whole sync round, configuration or reset.
    round: Mutex<()>,
    online: watch::Sender<bool>,
    background: StdMutex<Option<JoinHandle<()>>>,
}

impl<S: BookingStore> OfflineReconciler<S> {
    /// Restores the terminal from its state file.
    ///
    /// A terminal that stopped halfway through configuration starts over.
    pub async fn open(
        store: S,
        tz: Tz,
        transport: Arc<dyn SyncTransport>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
        file: StateFile,
        device_id: Option<String>,
    ) -> Result<Self, SaunaError> {
        let mut state = match file.load().await? {
            Some(state) => state,
            None => DeviceState::fresh(device_id.clone()),
        };
        if state.phase == DevicePhase::Configuring {
            warn!(device_id = %state.device_id, "Interrupted configuration, starting over");
            state.phase = DevicePhase::Unconfigured;
        }
        file.save(&state).await?;
        info!(device_id = %state.device_id, phase = state.phase.as_str(), "Terminal opened");

        let (online, _) = watch::channel(true);
        Ok(Self {
            store,
            tz,
            transport,
            clock,
            settings,
            file,
            pinned_device_id: device_id,
            state: Mutex::new(state),
            round: Mutex::new(()),
            online,
            background: StdMutex::new(None),
        })
    }

    /// The replica local bookings run against.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub async fn state(&self) -> DeviceState {
        self.state.lock().await.clone()
    }

    pub async fn status(&self) -> Result<DeviceStatus, SaunaError> {
        let state = self.state().await;
        let pending = match state.island_id {
            Some(island_id) if state.is_configured() => {
                let mut tx = self.store.begin().await?;
                let local = tx.export_island_rows(island_id, self.window_start()).await?;
                drop(tx);
                pending_changes(&local, &state.baseline)
            }
            _ => 0,
        };
        Ok(DeviceStatus {
            phase: state.phase,
            device_id: state.device_id,
            island_id: state.island_id,
            configured_at: state.configured_at,
            last_sync_at: state.last_sync_at,
            last_sync_error: state.last_sync_error,
            online: self.is_online(),
            pending_changes: pending,
        })
    }

    /// Binds the terminal to an island with a one-time setup token.
    pub async fn configure(&self, token: &str) -> Result<DeviceState, SaunaError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(validation_error("setup token must not be empty"));
        }
        let _round = self.round.lock().await;

        let device_id = {
            let mut state = self.state.lock().await;
            if state.phase != DevicePhase::Unconfigured {
                return Err(validation_error(
                    "device is already configured, factory reset it first",
                ));
            }
            state.phase = DevicePhase::Configuring;
            self.file.save(&state).await?;
            state.device_id.clone()
        };
        info!(%device_id, "Configuring terminal");

        let installed = async {
            let snapshot = self
                .transport
                .configure(ConfigureRequest {
                    token: token.to_string(),
                    device_id: device_id.clone(),
                })
                .await?;
            let mut tx = self.store.begin().await?;
            tx.wipe().await?;
            tx.install_directory(&snapshot.directory).await?;
            tx.commit().await?;
            Ok::<_, SaunaError>(snapshot)
        }
        .await;

        let mut state = self.state.lock().await;
        match installed {
            Ok(snapshot) => {
                state.phase = DevicePhase::Configured;
                state.island_id = Some(snapshot.directory.island.id);
                state.configured_at = Some(self.clock.now());
                state.last_sync_at = None;
                state.last_sync_error = None;
                state.baseline = IslandRows::default();
                self.file.save(&state).await?;
                info!(
                    %device_id,
                    island = %snapshot.directory.island.name,
                    saunas = snapshot.directory.saunas.len(),
                    boats = snapshot.directory.boats.len(),
                    "Terminal configured"
                );
                Ok(state.clone())
            }
            Err(e) => {
                state.phase = DevicePhase::Unconfigured;
                self.file.save(&state).await?;
                warn!(%device_id, error = %e, "Configuration failed");
                Err(e)
            }
        }
    }

    /// Runs one sync round now.
    ///
    /// On failure the replica is left as it was and the error is kept as
    /// the last sync error.
    pub async fn sync_now(&self) -> Result<SyncReport, SaunaError> {
        let _round = self.round.lock().await;

        let state = self.state().await;
        let Some(island_id) = state.island_id.filter(|_| state.is_configured()) else {
            return Err(validation_error("device is not configured"));
        };

        let outcome = if self.is_online() {
            self.sync_round(&state.device_id, island_id, &state.baseline)
                .await
        } else {
            Err(SaunaError::SyncFailed("device is offline".to_string()))
        };

        let mut current = self.state.lock().await;
        match outcome {
            Ok((report, baseline)) => {
                current.baseline = baseline;
                current.last_sync_at = Some(self.clock.now());
                current.last_sync_error = None;
                self.file.save(&current).await?;
                info!(
                    pushed = report.pushed,
                    pulled = report.pulled,
                    dropped = report.dropped,
                    yielded = report.yielded,
                    "Sync round done"
                );
                Ok(report)
            }
            Err(e) => {
                let e = match e {
                    SaunaError::SyncFailed(_) => e,
                    other => SaunaError::SyncFailed(other.to_string()),
                };
                current.last_sync_error = Some(e.to_string());
                if let Err(save) = self.file.save(&current).await {
                    error!(error = %save, "Device state not saved after failed sync");
                }
                warn!(error = %e, "Sync round failed");
                Err(e)
            }
        }
    }

    /// Start of the pull window: local midnight, `history_days` ago.
    fn window_start(&self) -> DateTime<Utc> {
        let today = local_day(self.clock.now(), self.tz);
        local_instant(
            today - ChronoDuration::days(self.settings.history_days),
            NaiveTime::MIN,
            self.tz,
        )
    }

    async fn sync_round(
        &self,
        device_id: &str,
        island_id: Uuid,
        baseline: &IslandRows,
    ) -> Result<(SyncReport, IslandRows), SaunaError> {
        let since = self.window_start();

        let mut tx = self.store.begin().await?;
        let local = tx.export_island_rows(island_id, since).await?;
        drop(tx);

        let remote = self
            .transport
            .pull(PullRequest {
                device_id: device_id.to_string(),
                island_id,
                since,
            })
            .await?;
        let plan = reconcile(&local, baseline, &remote, since);
        debug!(
            local = local.len(),
            remote = remote.len(),
            push = plan.push.len(),
            pull = plan.pull.len(),
            drop = plan.drop.len(),
            "Reconciled"
        );

        let mut report = SyncReport {
            pushed: count(plan.push.len()),
            ..SyncReport::default()
        };
        if !plan.push.is_empty() {
            let response = self
                .transport
                .push(SyncRequest {
                    device_id: device_id.to_string(),
                    island_id,
                    rows: plan.push.clone(),
                })
                .await?;
            report.yielded = response.yielded;
        }

        let baseline = self
            .apply_locally(island_id, since, &local, plan, &mut report)
            .await?;
        Ok((report, baseline))
    }

    /// Applies pulls and drops to the replica in one transaction.
    ///
    /// Rows changed locally since `snapshot` was taken are left alone; they
    /// are dirty against the new baseline and go out next round.
    async fn apply_locally(
        &self,
        island_id: Uuid,
        since: DateTime<Utc>,
        snapshot: &IslandRows,
        plan: Reconciliation,
        report: &mut SyncReport,
    ) -> Result<IslandRows, SaunaError> {
        let Reconciliation {
            pull,
            drop: dropped,
            mut baseline,
            ..
        } = plan;

        let mut tx = self.store.begin().await?;
        let current = tx.export_island_rows(island_id, since).await?;
        let touched = touched_between(snapshot, &current);
        let mut refused: HashSet<Uuid> = HashSet::new();

        for shared in &pull.shared_reservations {
            if touched.contains(&shared.id) {
                continue;
            }
            match tx.upsert_shared_reservation(shared).await {
                Ok(()) => report.pulled += 1,
                Err(DbError::UniqueViolation(key, _)) => {
                    warn!(id = %shared.id, ?key, "Pulled shared reservation collides locally");
                    refused.insert(shared.id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        for reservation in &pull.reservations {
            if touched.contains(&reservation.id) {
                continue;
            }
            match tx.upsert_reservation(reservation).await {
                Ok(()) => report.pulled += 1,
                Err(DbError::UniqueViolation(key, _)) => {
                    warn!(id = %reservation.id, ?key, "Pulled reservation collides locally");
                    refused.insert(reservation.id);
                }
                Err(e) => return Err(e.into()),
            }
        }
        for participant in &pull.participants {
            if touched.contains(&participant.id) {
                continue;
            }
            if refused.contains(&participant.shared_reservation_id) {
                refused.insert(participant.id);
                continue;
            }
            match tx.upsert_participant(participant).await {
                Ok(()) => report.pulled += 1,
                Err(DbError::UniqueViolation(key, _)) => {
                    warn!(id = %participant.id, ?key, "Pulled participant collides locally");
                    refused.insert(participant.id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        for id in &dropped.participants {
            if !touched.contains(id) && tx.delete_participant(*id).await? {
                report.dropped += 1;
            }
        }
        for id in &dropped.shared_reservations {
            if !touched.contains(id) && tx.delete_shared_reservation(*id).await? {
                report.dropped += 1;
            }
        }
        for id in &dropped.reservations {
            if !touched.contains(id) && tx.delete_reservation(*id).await? {
                report.dropped += 1;
            }
        }
        tx.commit().await?;

        // Refused rows are pulled again once the backend has caught up
        baseline.reservations.retain(|r| !refused.contains(&r.id));
        baseline
            .shared_reservations
            .retain(|s| !refused.contains(&s.id));
        baseline.participants.retain(|p| !refused.contains(&p.id));
        Ok(baseline)
    }

    /// Records connectivity. Going online wakes the background loop.
    pub fn set_online(&self, online: bool) {
        let changed = self.online.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
        if changed {
            info!(online, "Connectivity changed");
        }
    }

    /// Starts (or restarts) the periodic sync loop.
    ///
    /// The loop syncs every interval and right after the terminal comes back
    /// online, as long as it is configured.
    pub fn start_background(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut online_rx = self.online.subscribe();
        let period = self.settings.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = online_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if !*online_rx.borrow_and_update() {
                            continue;
                        }
                        debug!("Back online, syncing");
                    }
                }

                let Some(reconciler) = weak.upgrade() else {
                    break;
                };
                if !reconciler.is_online() || !reconciler.state.lock().await.is_configured() {
                    continue;
                }
                // The error is on the device state; the next round retries
                let _ = reconciler.sync_now().await;
            }
            debug!("Background sync stopped");
        });

        if let Some(previous) = self.replace_background(Some(handle)) {
            previous.abort();
        }
        info!(interval_secs = period.as_secs(), "Background sync started");
    }

    pub fn stop_background(&self) {
        if let Some(handle) = self.replace_background(None) {
            handle.abort();
            info!("Background sync stopped");
        }
    }

    fn replace_background(&self, handle: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        match self.background.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, handle),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), handle),
        }
    }

    /// Stops background work, wipes the replica and forgets the island.
    ///
    /// Unsynced local rows are lost.
    pub async fn factory_reset(&self) -> Result<DeviceState, SaunaError> {
        self.stop_background();
        let _round = self.round.lock().await;

        let mut tx = self.store.begin().await?;
        tx.wipe().await?;
        tx.commit().await?;

        let mut state = self.state.lock().await;
        let previous = state.island_id;
        *state = DeviceState::fresh(self.pinned_device_id.clone());
        self.file.remove().await?;
        self.file.save(&state).await?;
        warn!(island_id = ?previous, device_id = %state.device_id, "Terminal factory reset");
        Ok(state.clone())
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
