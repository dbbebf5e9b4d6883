use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use saunabook_booking::{next_available, BookingRules};
use saunabook_common::{Reservation, ReservationStatus, Sauna};
use uuid::Uuid;

const TZ: Tz = chrono_tz::Europe::Helsinki;

fn base_time() -> DateTime<Utc> {
    TZ.with_ymd_and_hms(2025, 7, 4, 9, 20, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn create_sauna() -> Sauna {
    Sauna {
        id: Uuid::new_v4(),
        island_id: Uuid::new_v4(),
        name: "Rantasauna".to_string(),
        heating_time_hours: 2,
        auto_club_sauna_enabled: true,
    }
}

// Back-to-back one-hour reservations, optionally leaving every `gap`-th hour free
fn create_reservations(sauna: &Sauna, count: usize, gap: Option<usize>) -> Vec<Reservation> {
    let first = base_time() - Duration::minutes(20) + Duration::hours(1);
    (0..count)
        .filter(|i| gap.is_none_or(|g| (i + 1) % g != 0))
        .map(|i| {
            let start = first + Duration::hours(i as i64);
            Reservation {
                id: Uuid::new_v4(),
                sauna_id: sauna.id,
                island_id: sauna.island_id,
                boat_id: Uuid::new_v4(),
                start_time: start,
                end_time: start + Duration::hours(1),
                adults: 2,
                kids: 0,
                status: ReservationStatus::Active,
                created_at: base_time() - Duration::days(1),
                cancelled_at: None,
            }
        })
        .collect()
}

fn benchmark_next_available(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_available");
    let sauna = create_sauna();
    let rules = BookingRules::default();

    // Cold sauna, nothing booked
    group.bench_function("cold_sauna", |b| {
        b.iter(|| {
            next_available(
                black_box(&sauna),
                black_box(None),
                black_box(&[]),
                black_box(base_time()),
                TZ,
                black_box(&rules),
            )
        })
    });

    // Occupied right now, a free hour every few slots
    let busy = create_reservations(&sauna, 48, Some(6));
    group.bench_function("busy_with_gaps", |b| {
        b.iter(|| {
            next_available(
                black_box(&sauna),
                black_box(busy.first()),
                black_box(&busy[1..]),
                black_box(base_time() + Duration::hours(1)),
                TZ,
                black_box(&rules),
            )
        })
    });

    // Fully booked beyond the search bound
    let full = create_reservations(&sauna, 200, None);
    group.bench_function("fully_booked", |b| {
        b.iter(|| {
            next_available(
                black_box(&sauna),
                black_box(None),
                black_box(&full),
                black_box(base_time()),
                TZ,
                black_box(&rules),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_next_available);
criterion_main!(benches);
