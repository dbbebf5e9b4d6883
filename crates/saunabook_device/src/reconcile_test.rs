#[cfg(test)]
mod tests {
    use crate::reconcile::{pending_changes, reconcile, touched_between};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use saunabook_common::{
        GenderOrder, IslandRows, Reservation, ReservationStatus, SharedReservation,
        SharedReservationParticipant,
    };
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, day, hour, 0, 0).unwrap()
    }

    fn since() -> DateTime<Utc> {
        at(1, 0)
    }

    fn reservation(start: DateTime<Utc>) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            sauna_id: Uuid::nil(),
            island_id: Uuid::nil(),
            boat_id: Uuid::new_v4(),
            start_time: start,
            end_time: start + Duration::hours(1),
            adults: 2,
            kids: 0,
            status: ReservationStatus::Active,
            created_at: start - Duration::days(1),
            cancelled_at: None,
        }
    }

    fn shared(day: u32) -> SharedReservation {
        SharedReservation {
            id: Uuid::new_v4(),
            sauna_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
            start_time: at(day, 15),
            males_duration_hours: 2,
            females_duration_hours: 2,
            gender_order: GenderOrder::FemalesFirst,
            name: "Club Sauna".into(),
            is_auto_generated: true,
            created_by: "system".into(),
            created_at: at(day, 0),
        }
    }

    fn participant(parent: &SharedReservation) -> SharedReservationParticipant {
        SharedReservationParticipant {
            id: Uuid::new_v4(),
            shared_reservation_id: parent.id,
            boat_id: Uuid::new_v4(),
            adults: 1,
            kids: 2,
            created_at: parent.created_at,
        }
    }

    fn rows(reservations: Vec<Reservation>) -> IslandRows {
        IslandRows {
            reservations,
            ..IslandRows::default()
        }
    }

    #[test]
    fn test_backend_only_rows_are_pulled() {
        let theirs = reservation(at(4, 12));
        let plan = reconcile(&IslandRows::default(), &IslandRows::default(), &rows(vec![theirs.clone()]), since());

        assert_eq!(plan.pull.reservations, vec![theirs.clone()]);
        assert!(plan.push.is_empty());
        assert_eq!(plan.baseline.reservations, vec![theirs]);
    }

    #[test]
    fn test_new_local_rows_are_pushed() {
        let ours = reservation(at(4, 12));
        let plan = reconcile(&rows(vec![ours.clone()]), &IslandRows::default(), &IslandRows::default(), since());

        assert_eq!(plan.push.reservations, vec![ours]);
        assert!(plan.drop.is_empty());
    }

    #[test]
    fn test_device_wins_over_divergent_backend_copy() {
        let agreed = reservation(at(4, 12));
        let ours = Reservation {
            status: ReservationStatus::Cancelled,
            cancelled_at: Some(at(4, 9)),
            ..agreed.clone()
        };
        let theirs = Reservation {
            adults: 5,
            ..agreed.clone()
        };

        let plan = reconcile(&rows(vec![ours.clone()]), &rows(vec![agreed]), &rows(vec![theirs]), since());

        assert_eq!(plan.push.reservations, vec![ours.clone()]);
        assert!(plan.pull.is_empty());
        assert_eq!(plan.baseline.reservations, vec![ours]);
    }

    #[test]
    fn test_clean_rows_follow_the_backend() {
        let agreed = shared(4);
        let converted = SharedReservation {
            is_auto_generated: false,
            ..agreed.clone()
        };
        let local = IslandRows {
            shared_reservations: vec![agreed.clone()],
            ..IslandRows::default()
        };
        let remote = IslandRows {
            shared_reservations: vec![converted.clone()],
            ..IslandRows::default()
        };

        let plan = reconcile(&local, &local, &remote, since());

        assert!(plan.push.is_empty());
        assert_eq!(plan.pull.shared_reservations, vec![converted]);
    }

    #[test]
    fn test_clean_rows_deleted_by_the_backend_are_dropped() {
        let gone = shared(4);
        let its_participant = participant(&gone);
        let old = reservation(at(1, 12) - Duration::days(3));
        let local = IslandRows {
            reservations: vec![old.clone()],
            shared_reservations: vec![gone.clone()],
            participants: vec![its_participant.clone()],
        };

        let plan = reconcile(&local, &local, &IslandRows::default(), since());

        assert_eq!(plan.drop.shared_reservations, vec![gone.id]);
        assert_eq!(plan.drop.participants, vec![its_participant.id]);
        // Older than the pull window: the backend simply did not send it
        assert!(plan.drop.reservations.is_empty());
        assert_eq!(plan.baseline.reservations, vec![old]);
    }

    #[test]
    fn test_parent_of_a_new_participation_is_kept() {
        let parent = shared(4);
        let joined = participant(&parent);
        let baseline = IslandRows {
            shared_reservations: vec![parent.clone()],
            ..IslandRows::default()
        };
        let local = IslandRows {
            shared_reservations: vec![parent.clone()],
            participants: vec![joined.clone()],
            ..IslandRows::default()
        };

        let plan = reconcile(&local, &baseline, &IslandRows::default(), since());

        assert!(plan.drop.is_empty());
        assert_eq!(plan.push.shared_reservations, vec![parent]);
        assert_eq!(plan.push.participants, vec![joined]);
    }

    #[test]
    fn test_identical_sides_are_a_noop() {
        let both = rows(vec![reservation(at(4, 12)), reservation(at(5, 13))]);
        let plan = reconcile(&both, &both, &both, since());

        assert!(plan.is_noop());
        assert_eq!(plan.baseline, both);
    }

    #[test]
    fn test_pending_changes_counts_dirty_rows() {
        let agreed = reservation(at(4, 12));
        let edited = Reservation {
            kids: 3,
            ..agreed.clone()
        };
        let fresh = reservation(at(5, 12));

        assert_eq!(pending_changes(&rows(vec![agreed.clone()]), &rows(vec![agreed.clone()])), 0);
        assert_eq!(pending_changes(&rows(vec![edited, fresh]), &rows(vec![agreed])), 2);
    }

    #[test]
    fn test_touched_between_sees_edits_inserts_and_deletes() {
        let kept = reservation(at(4, 12));
        let edited = reservation(at(4, 13));
        let removed = reservation(at(4, 14));
        let added = reservation(at(4, 15));
        let before = rows(vec![kept.clone(), edited.clone(), removed.clone()]);
        let after = rows(vec![
            kept.clone(),
            Reservation {
                adults: 4,
                ..edited.clone()
            },
            added.clone(),
        ]);

        let touched = touched_between(&before, &after);

        assert_eq!(touched.len(), 3);
        assert!(!touched.contains(&kept.id));
        assert!(touched.contains(&edited.id));
        assert!(touched.contains(&removed.id));
        assert!(touched.contains(&added.id));
    }
}
