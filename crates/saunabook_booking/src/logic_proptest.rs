#[cfg(test)]
mod tests {
    use crate::logic::{next_available, BookingRules};
    use crate::test_support::{at, reservation_at, sauna, TZ};
    use chrono::{Duration, Timelike};
    use proptest::prelude::*;
    use saunabook_common::time::is_hour_aligned;
    use saunabook_common::Reservation;

    // Reservations on whole hours after a base instant, from a list of hour offsets
    fn future_reservations(offsets: &[i64], heating: u32) -> (saunabook_common::Sauna, Vec<Reservation>) {
        let s = sauna(heating);
        let base = at(2025, 7, 4, 0, 0);
        let mut seen = std::collections::BTreeSet::new();
        let reservations = offsets
            .iter()
            .filter(|o| seen.insert(**o))
            .map(|o| {
                let start = base + Duration::hours(*o);
                reservation_at(&s, start, start + Duration::hours(1))
            })
            .collect();
        (s, reservations)
    }

    proptest! {
        // The slot is always a local full hour and lasts exactly one hour
        #[test]
        fn test_slot_is_hour_aligned_and_one_hour_long(
            minute_of_day in 0..(24 * 60i64),
            heating in 1..=4u32,
            offsets in proptest::collection::vec(1..48i64, 0..20),
        ) {
            let (s, future) = future_reservations(&offsets, heating);
            let now = at(2025, 7, 4, 0, 0) + Duration::minutes(minute_of_day);

            let slot = next_available(&s, None, &future, now, TZ, &BookingRules::default());

            prop_assert!(is_hour_aligned(slot.start_time, TZ));
            prop_assert_eq!(slot.start_time.with_timezone(&TZ).minute(), 0);
            prop_assert_eq!(slot.end_time - slot.start_time, Duration::hours(1));
            prop_assert!(slot.start_time > now);
        }

        // With enough search room the slot never overlaps an active reservation
        #[test]
        fn test_slot_never_overlaps_future_reservations(
            minute_of_day in 0..(24 * 60i64),
            heating in 1..=4u32,
            offsets in proptest::collection::vec(0..72i64, 0..40),
        ) {
            let (s, future) = future_reservations(&offsets, heating);
            let now = at(2025, 7, 4, 0, 0) + Duration::minutes(minute_of_day);

            let slot = next_available(&s, None, &future, now, TZ, &BookingRules::default());
            let range = saunabook_common::TimeRange::new(slot.start_time, slot.end_time);

            for r in &future {
                prop_assert!(!r.range().overlaps(&range), "slot {:?} overlaps {:?}", range, r.range());
            }
        }

        // A cold sauna is never offered before it has had its heating time
        #[test]
        fn test_cold_sauna_respects_heating_time(
            minute_of_day in 0..(24 * 60i64),
            heating in 1..=4u32,
        ) {
            let s = sauna(heating);
            let now = at(2025, 7, 4, 0, 0) + Duration::minutes(minute_of_day);

            let slot = next_available(&s, None, &[], now, TZ, &BookingRules::default());

            let earliest = now - Duration::minutes(now.with_timezone(&TZ).minute() as i64)
                - Duration::seconds(now.with_timezone(&TZ).second() as i64)
                + Duration::hours(heating as i64);
            prop_assert_eq!(slot.start_time, earliest);
        }
    }
}
