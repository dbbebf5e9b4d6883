// Shared builders for the unit tests of this crate.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use saunabook_common::{
    Boat, Club, FixedClock, Island, IslandDirectory, Reservation, ReservationStatus, Sauna,
};
use saunabook_db::{BookingStore, BookingTransaction, MemoryStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::guard::BookingService;
use crate::logic::BookingRules;

pub const TZ: Tz = chrono_tz::Europe::Helsinki;

/// A local wall-clock instant in Helsinki.
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    TZ.with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn sauna(heating_time_hours: u32) -> Sauna {
    Sauna {
        id: Uuid::new_v4(),
        island_id: Uuid::new_v4(),
        name: "Rantasauna".into(),
        heating_time_hours,
        auto_club_sauna_enabled: true,
    }
}

pub fn reservation_at(sauna: &Sauna, start: DateTime<Utc>, end: DateTime<Utc>) -> Reservation {
    Reservation {
        id: Uuid::new_v4(),
        sauna_id: sauna.id,
        island_id: sauna.island_id,
        boat_id: Uuid::new_v4(),
        start_time: start,
        end_time: end,
        adults: 2,
        kids: 0,
        status: ReservationStatus::Active,
        created_at: start - Duration::days(1),
        cancelled_at: None,
    }
}

/// Two islands of one club; island A has two saunas, island B one.
pub struct Harbour {
    pub service: BookingService<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub sauna_a1: Uuid,
    pub sauna_a2: Uuid,
    pub sauna_b: Uuid,
    pub boat: Uuid,
    pub other_boat: Uuid,
}

pub async fn harbour(now: DateTime<Utc>, rules: BookingRules) -> Harbour {
    let club = Club {
        id: Uuid::new_v4(),
        name: "Saaristo".into(),
    };
    let island = |name: &str| Island {
        id: Uuid::new_v4(),
        club_id: club.id,
        name: name.into(),
    };
    let (island_a, island_b) = (island("Harakka"), island("Lonna"));
    let sauna_on = |island: &Island| Sauna {
        island_id: island.id,
        ..sauna(2)
    };
    let (a1, a2, b) = (sauna_on(&island_a), sauna_on(&island_a), sauna_on(&island_b));
    let boat = |name: &str| Boat {
        id: Uuid::new_v4(),
        club_id: club.id,
        name: name.into(),
        membership_number: format!("M-{}", name),
    };
    let boats = vec![boat("Aalto"), boat("Kuikka")];

    let store = MemoryStore::new(TZ);
    let mut tx = store.begin().await.unwrap();
    tx.install_directory(&IslandDirectory {
        club: club.clone(),
        island: island_a,
        saunas: vec![a1.clone(), a2.clone()],
        boats: boats.clone(),
    })
    .await
    .unwrap();
    tx.install_directory(&IslandDirectory {
        club,
        island: island_b,
        saunas: vec![b.clone()],
        boats: boats.clone(),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let clock = Arc::new(FixedClock::new(now));
    Harbour {
        service: BookingService::new(store, TZ, rules, clock.clone()),
        clock,
        sauna_a1: a1.id,
        sauna_a2: a2.id,
        sauna_b: b.id,
        boat: boats[0].id,
        other_boat: boats[1].id,
    }
}
