//! Test fixtures for the terminal sync tests
//!
//! A backend and one island terminal, each on its own in-memory store, wired
//! together by a loopback transport that can be unplugged.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use saunabook_booking::{BookingRules, BookingService, CreateReservationRequest};
use saunabook_common::{
    Boat, Club, FixedClock, Island, IslandDirectory, IslandRows, Sauna, SaunaError,
};
use saunabook_db::{BookingStore, BookingTransaction, MemoryStore};
use saunabook_device::{
    BoxFuture, ConfigureRequest, DeviceSnapshot, DeviceSyncService, OfflineReconciler,
    PullRequest, StateFile, SyncRequest, SyncResponse, SyncSettings, SyncTransport,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const TZ: Tz = chrono_tz::Europe::Helsinki;

/// A local wall-clock instant in Helsinki.
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    TZ.with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub type Backend = DeviceSyncService<MemoryStore, MemoryStore>;

/// Calls the backend service in process. Rejections look like HTTP errors.
pub struct Loopback {
    backend: Arc<Backend>,
    reachable: AtomicBool,
    pub pushes: AtomicUsize,
}

impl Loopback {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self {
            backend,
            reachable: AtomicBool::new(true),
            pushes: AtomicUsize::new(0),
        }
    }

    pub fn unplug(&self) {
        self.reachable.store(false, Ordering::SeqCst);
    }

    pub fn plug_in(&self) {
        self.reachable.store(true, Ordering::SeqCst);
    }

    fn reach(&self) -> Result<(), SaunaError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SaunaError::SyncFailed("connection refused".to_string()))
        }
    }
}

fn rejected(err: SaunaError) -> SaunaError {
    SaunaError::SyncFailed(format!("backend returned {}: {}", err.code(), err))
}

impl SyncTransport for Loopback {
    fn configure(&self, request: ConfigureRequest) -> BoxFuture<'_, DeviceSnapshot> {
        Box::pin(async move {
            self.reach()?;
            self.backend.configure(request).await.map_err(rejected)
        })
    }

    fn pull(&self, request: PullRequest) -> BoxFuture<'_, IslandRows> {
        Box::pin(async move {
            self.reach()?;
            self.backend.pull(request).await.map_err(rejected)
        })
    }

    fn push(&self, request: SyncRequest) -> BoxFuture<'_, SyncResponse> {
        Box::pin(async move {
            self.reach()?;
            self.pushes.fetch_add(1, Ordering::SeqCst);
            self.backend.apply_push(request).await.map_err(rejected)
        })
    }
}

pub struct World {
    pub clock: Arc<FixedClock>,
    pub backend_store: MemoryStore,
    pub backend: Arc<Backend>,
    pub backend_booking: BookingService<MemoryStore>,
    pub link: Arc<Loopback>,
    pub terminal: Arc<OfflineReconciler<MemoryStore>>,
    pub terminal_booking: BookingService<MemoryStore>,
    pub island: Uuid,
    pub sauna: Uuid,
    pub sibling_sauna: Uuid,
    pub boat: Uuid,
    pub other_boat: Uuid,
    /// A sauna on another island of the same club.
    pub foreign_sauna: Uuid,
}

fn directory(club: &Club, island_name: &str, sauna_names: &[&str], boats: &[Boat]) -> IslandDirectory {
    let island = Island {
        id: Uuid::new_v4(),
        club_id: club.id,
        name: island_name.to_string(),
    };
    let saunas = sauna_names
        .iter()
        .map(|name| Sauna {
            id: Uuid::new_v4(),
            island_id: island.id,
            name: name.to_string(),
            heating_time_hours: 2,
            auto_club_sauna_enabled: true,
        })
        .collect();
    IslandDirectory {
        club: club.clone(),
        island,
        saunas,
        boats: boats.to_vec(),
    }
}

/// Seeds the backend with two islands and opens an unconfigured terminal.
pub async fn create_world(now: DateTime<Utc>) -> World {
    let clock = Arc::new(FixedClock::new(now));
    let club = Club {
        id: Uuid::new_v4(),
        name: "Saaristo".to_string(),
    };
    let boats: Vec<Boat> = ["Aalto", "Kuikka"]
        .iter()
        .map(|name| Boat {
            id: Uuid::new_v4(),
            club_id: club.id,
            name: name.to_string(),
            membership_number: format!("M-{}", name),
        })
        .collect();
    let harakka = directory(&club, "Harakka", &["Rantasauna", "Savusauna"], &boats);
    let lonna = directory(&club, "Lonna", &["Lonnan sauna"], &boats);

    let backend_store = MemoryStore::new(TZ);
    let mut tx = backend_store.begin().await.unwrap();
    tx.install_directory(&harakka).await.unwrap();
    tx.install_directory(&lonna).await.unwrap();
    tx.commit().await.unwrap();

    let backend = Arc::new(DeviceSyncService::new(
        backend_store.clone(),
        backend_store.clone(),
        TZ,
        clock.clone(),
    ));
    let link = Arc::new(Loopback::new(backend.clone()));

    let terminal_store = MemoryStore::new(TZ);
    let settings = SyncSettings {
        interval: Duration::from_secs(60),
        history_days: 7,
    };
    let terminal = OfflineReconciler::open(
        terminal_store.clone(),
        TZ,
        link.clone(),
        clock.clone(),
        settings,
        StateFile::in_memory(),
        None,
    )
    .await
    .unwrap();

    World {
        backend_booking: BookingService::new(
            backend_store.clone(),
            TZ,
            BookingRules::default(),
            clock.clone(),
        ),
        terminal_booking: BookingService::new(
            terminal_store,
            TZ,
            BookingRules::default(),
            clock.clone(),
        ),
        clock,
        backend_store,
        backend,
        link,
        terminal: Arc::new(terminal),
        island: harakka.island.id,
        sauna: harakka.saunas[0].id,
        sibling_sauna: harakka.saunas[1].id,
        boat: boats[0].id,
        other_boat: boats[1].id,
        foreign_sauna: lonna.saunas[0].id,
    }
}

/// A world whose terminal is already configured for Harakka.
pub async fn configured_world(now: DateTime<Utc>) -> World {
    let world = create_world(now).await;
    let issued = world.backend.issue_token(world.island).await.unwrap();
    world.terminal.configure(&issued.token).await.unwrap();
    world
}

pub fn booking(sauna_id: Uuid, boat_id: Uuid, start_time: DateTime<Utc>) -> CreateReservationRequest {
    CreateReservationRequest {
        boat_id,
        sauna_id,
        start_time,
        adults: 2,
        kids: 0,
    }
}
