//! Concurrent bookings against the SQLite file store.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use saunabook_booking::{BookingRules, BookingService, CreateReservationRequest};
use saunabook_common::{Boat, Club, FixedClock, Island, IslandDirectory, Sauna, SaunaError};
use saunabook_db::{BookingStore, BookingTransaction, SqlStore, StoreFactory};
use std::sync::Arc;
use uuid::Uuid;

const TZ: Tz = chrono_tz::Europe::Helsinki;
const PARTIES: usize = 8;

fn at(h: u32) -> DateTime<Utc> {
    TZ.with_ymd_and_hms(2025, 7, 4, h, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

struct Harbour {
    service: BookingService<SqlStore>,
    saunas: Vec<Uuid>,
    boats: Vec<Uuid>,
}

async fn harbour() -> Harbour {
    let path = std::env::temp_dir()
        .join(format!("saunabook-concurrency-{}", Uuid::new_v4()))
        .join("bookings.db");
    let store = StoreFactory::new()
        .sqlite_file(&path, "Europe/Helsinki")
        .await
        .unwrap();

    let club = Club {
        id: Uuid::new_v4(),
        name: "Saaristo".to_string(),
    };
    let island = Island {
        id: Uuid::new_v4(),
        club_id: club.id,
        name: "Harakka".to_string(),
    };
    let saunas: Vec<Sauna> = (0..PARTIES)
        .map(|i| Sauna {
            id: Uuid::new_v4(),
            island_id: island.id,
            name: format!("Sauna {}", i),
            heating_time_hours: 1,
            auto_club_sauna_enabled: false,
        })
        .collect();
    let boats: Vec<Boat> = (0..PARTIES)
        .map(|i| Boat {
            id: Uuid::new_v4(),
            club_id: club.id,
            name: format!("Boat {}", i),
            membership_number: format!("M-{}", i),
        })
        .collect();

    let mut tx = store.begin().await.unwrap();
    tx.install_directory(&IslandDirectory {
        club,
        island,
        saunas: saunas.clone(),
        boats: boats.clone(),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let clock = Arc::new(FixedClock::new(at(10)));
    Harbour {
        service: BookingService::new(store, TZ, BookingRules::default(), clock),
        saunas: saunas.iter().map(|s| s.id).collect(),
        boats: boats.iter().map(|b| b.id).collect(),
    }
}

async fn book_all(
    service: &BookingService<SqlStore>,
    requests: Vec<CreateReservationRequest>,
) -> Vec<Result<Uuid, SaunaError>> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let service = service.clone();
            tokio::spawn(async move { service.create_reservation(request).await.map(|r| r.id) })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }
    outcomes
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_bookings_all_succeed() {
    let h = harbour().await;
    let requests = (0..PARTIES)
        .map(|i| CreateReservationRequest {
            boat_id: h.boats[i],
            sauna_id: h.saunas[i],
            start_time: at(14),
            adults: 2,
            kids: 0,
        })
        .collect();

    let outcomes = book_all(&h.service, requests).await;

    let failures: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().err()).collect();
    assert!(failures.is_empty(), "failed: {:?}", failures);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_for_one_slot_leaves_one_winner() {
    let h = harbour().await;
    let requests = (0..PARTIES)
        .map(|i| CreateReservationRequest {
            boat_id: h.boats[i],
            sauna_id: h.saunas[0],
            start_time: at(14),
            adults: 2,
            kids: 0,
        })
        .collect();

    let outcomes = book_all(&h.service, requests).await;

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    let codes: Vec<_> = outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .map(|e| e.code())
        .collect();
    assert_eq!(codes, vec!["SLOT_CONFLICT"; PARTIES - 1]);
}
