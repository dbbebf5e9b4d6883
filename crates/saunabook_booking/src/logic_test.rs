#[cfg(test)]
mod tests {
    use crate::logic::{check_cancellable, next_available, BookingRules, SlotReason};
    use crate::test_support::{at, reservation_at, sauna, TZ};
    use chrono::Duration;
    use saunabook_common::{ReservationStatus, SaunaError};

    #[test]
    fn test_buffer_rule_skips_an_hour_when_current_booking_ends_soon() {
        // Sauna reserved until 14:10, now 14:00: the hour-aligned end (14:00)
        // is within the buffer, so the slot moves to 15:00.
        let s = sauna(2);
        let current = reservation_at(&s, at(2025, 7, 4, 13, 10), at(2025, 7, 4, 14, 10));
        let now = at(2025, 7, 4, 14, 0);

        let slot = next_available(&s, Some(&current), &[], now, TZ, &BookingRules::default());

        assert_eq!(slot.reason, SlotReason::Buffer);
        assert!(slot.start_time >= at(2025, 7, 4, 15, 0));
        assert_eq!(slot.end_time - slot.start_time, Duration::hours(1));
    }

    #[test]
    fn test_next_free_when_current_booking_ends_later() {
        let s = sauna(2);
        let current = reservation_at(&s, at(2025, 7, 4, 14, 0), at(2025, 7, 4, 15, 0));
        let now = at(2025, 7, 4, 14, 20);

        let slot = next_available(&s, Some(&current), &[], now, TZ, &BookingRules::default());

        assert_eq!(slot.reason, SlotReason::NextFree);
        assert_eq!(slot.start_time, at(2025, 7, 4, 15, 0));
    }

    #[test]
    fn test_exactly_fifteen_minutes_is_still_inside_the_buffer() {
        let s = sauna(2);
        let current = reservation_at(&s, at(2025, 7, 4, 14, 0), at(2025, 7, 4, 15, 0));
        let now = at(2025, 7, 4, 14, 45);

        let slot = next_available(&s, Some(&current), &[], now, TZ, &BookingRules::default());

        assert_eq!(slot.reason, SlotReason::Buffer);
        assert_eq!(slot.start_time, at(2025, 7, 4, 16, 0));
    }

    #[test]
    fn test_heating_rule_for_a_cold_sauna() {
        let s = sauna(2);
        let now = at(2025, 7, 4, 10, 5);

        let slot = next_available(&s, None, &[], now, TZ, &BookingRules::default());

        assert_eq!(slot.reason, SlotReason::Heating);
        assert_eq!(slot.start_time, at(2025, 7, 4, 12, 0));
        assert_eq!(slot.end_time, at(2025, 7, 4, 13, 0));
    }

    #[test]
    fn test_zero_heating_time_falls_back_to_the_next_hour() {
        let s = sauna(0);
        let now = at(2025, 7, 4, 10, 5);

        let slot = next_available(&s, None, &[], now, TZ, &BookingRules::default());

        assert_eq!(slot.start_time, at(2025, 7, 4, 11, 0));
    }

    #[test]
    fn test_candidate_skips_over_future_reservations() {
        let s = sauna(1);
        let now = at(2025, 7, 4, 10, 30);
        let future = vec![
            reservation_at(&s, at(2025, 7, 4, 11, 0), at(2025, 7, 4, 12, 0)),
            reservation_at(&s, at(2025, 7, 4, 12, 0), at(2025, 7, 4, 13, 0)),
            reservation_at(&s, at(2025, 7, 4, 14, 0), at(2025, 7, 4, 15, 0)),
        ];

        let slot = next_available(&s, None, &future, now, TZ, &BookingRules::default());

        assert_eq!(slot.reason, SlotReason::Heating);
        assert_eq!(slot.start_time, at(2025, 7, 4, 13, 0));
    }

    #[test]
    fn test_cancelled_reservations_do_not_block() {
        let s = sauna(1);
        let now = at(2025, 7, 4, 10, 30);
        let mut cancelled = reservation_at(&s, at(2025, 7, 4, 11, 0), at(2025, 7, 4, 12, 0));
        cancelled.status = ReservationStatus::Cancelled;

        let slot = next_available(&s, None, &[cancelled], now, TZ, &BookingRules::default());

        assert_eq!(slot.start_time, at(2025, 7, 4, 11, 0));
    }

    #[test]
    fn test_stale_current_reservation_is_ignored() {
        // A "current" reservation that already ended must not drive the buffer rule
        let s = sauna(1);
        let ended = reservation_at(&s, at(2025, 7, 4, 8, 0), at(2025, 7, 4, 9, 0));
        let now = at(2025, 7, 4, 10, 30);

        let slot = next_available(&s, Some(&ended), &[], now, TZ, &BookingRules::default());

        assert_eq!(slot.reason, SlotReason::Heating);
        assert_eq!(slot.start_time, at(2025, 7, 4, 11, 0));
    }

    #[test]
    fn test_search_is_bounded() {
        let s = sauna(1);
        let now = at(2025, 7, 4, 0, 30);
        // Fully booked for a week
        let future: Vec<_> = (1..=24 * 7)
            .map(|h| {
                let start = at(2025, 7, 4, 0, 0) + Duration::hours(h);
                reservation_at(&s, start, start + Duration::hours(1))
            })
            .collect();
        let rules = BookingRules {
            max_slot_search: 5,
            ..BookingRules::default()
        };

        let slot = next_available(&s, None, &future, now, TZ, &rules);

        assert_eq!(slot.start_time, at(2025, 7, 4, 6, 0));
    }

    #[test]
    fn test_cancellation_boundaries() {
        let s = sauna(1);
        let start = at(2025, 7, 4, 14, 0);
        let r = reservation_at(&s, start, start + Duration::hours(1));
        let cutoff = Duration::minutes(15);

        assert_eq!(check_cancellable(&r, start - Duration::minutes(16), cutoff), Ok(()));
        assert_eq!(
            check_cancellable(&r, start - Duration::minutes(15), cutoff),
            Err(SaunaError::TooLateToCancel)
        );
        assert_eq!(
            check_cancellable(&r, start - Duration::minutes(1), cutoff),
            Err(SaunaError::TooLateToCancel)
        );
        assert_eq!(
            check_cancellable(&r, start, cutoff),
            Err(SaunaError::AlreadyStarted)
        );

        let mut cancelled = r.clone();
        cancelled.status = ReservationStatus::Cancelled;
        assert_eq!(
            check_cancellable(&cancelled, start - Duration::hours(3), cutoff),
            Err(SaunaError::AlreadyCancelled)
        );
    }
}
