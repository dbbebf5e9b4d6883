// --- File: crates/saunabook_device/src/reconcile.rs ---
//! Device-wins reconciliation of island rows.
//!
//! Pure: given the device's rows, the rows last agreed with the backend (the
//! baseline) and the backend's rows, decide what to push, what to pull and
//! what to drop. A device row is dirty when it differs from its baseline
//! copy or has none. Dirty rows always win; clean rows follow the backend.

use chrono::{DateTime, Utc};
use saunabook_common::{IslandRows, Reservation, SharedReservation, SharedReservationParticipant};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// A row that takes part in sync.
pub trait SyncRow: Clone + PartialEq {
    fn row_id(&self) -> Uuid;
}

impl SyncRow for Reservation {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

impl SyncRow for SharedReservation {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

impl SyncRow for SharedReservationParticipant {
    fn row_id(&self) -> Uuid {
        self.id
    }
}

/// Ids of device rows the backend no longer has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRows {
    pub reservations: Vec<Uuid>,
    pub shared_reservations: Vec<Uuid>,
    pub participants: Vec<Uuid>,
}

impl DroppedRows {
    pub fn len(&self) -> usize {
        self.reservations.len() + self.shared_reservations.len() + self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Device rows the backend must take over.
    pub push: IslandRows,
    /// Backend rows the device lacks or holds an outdated clean copy of.
    pub pull: IslandRows,
    /// Clean device rows the backend deleted.
    pub drop: DroppedRows,
    /// What both sides hold once push and pull are applied.
    pub baseline: IslandRows,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.push.is_empty() && self.pull.is_empty() && self.drop.is_empty()
    }
}

struct Plan<T> {
    push: Vec<T>,
    pull: Vec<T>,
    drop: Vec<Uuid>,
    agreed: Vec<T>,
}

fn by_id<T: SyncRow>(rows: &[T]) -> HashMap<Uuid, &T> {
    rows.iter().map(|row| (row.row_id(), row)).collect()
}

fn plan<T: SyncRow>(
    local: &[T],
    baseline: &[T],
    remote: &[T],
    in_window: impl Fn(&T) -> bool,
) -> Plan<T> {
    let local_by_id = by_id(local);
    let baseline_by_id = by_id(baseline);
    let remote_ids: HashSet<Uuid> = remote.iter().map(|row| row.row_id()).collect();

    let mut plan = Plan {
        push: Vec::new(),
        pull: Vec::new(),
        drop: Vec::new(),
        agreed: Vec::new(),
    };

    let is_dirty = |ours: &T| {
        baseline_by_id
            .get(&ours.row_id())
            .is_none_or(|agreed| *agreed != ours)
    };

    for theirs in remote {
        match local_by_id.get(&theirs.row_id()) {
            Some(ours) if *ours == theirs => plan.agreed.push((*ours).clone()),
            // Device wins over unsynced changes only
            Some(ours) if is_dirty(*ours) => {
                plan.push.push((*ours).clone());
                plan.agreed.push((*ours).clone());
            }
            _ => {
                plan.pull.push(theirs.clone());
                plan.agreed.push(theirs.clone());
            }
        }
    }

    for ours in local {
        if remote_ids.contains(&ours.row_id()) {
            continue;
        }
        if is_dirty(ours) {
            plan.push.push(ours.clone());
            plan.agreed.push(ours.clone());
        } else if in_window(ours) {
            plan.drop.push(ours.row_id());
        } else {
            plan.agreed.push(ours.clone());
        }
    }

    plan
}

/// Decides one sync round.
///
/// `since` is the start of the pull window: a clean device row inside it that
/// the backend did not return was deleted there. A shared reservation
/// referenced by a dirty device participant is pushed rather than dropped.
pub fn reconcile(
    local: &IslandRows,
    baseline: &IslandRows,
    remote: &IslandRows,
    since: DateTime<Utc>,
) -> Reconciliation {
    let reservations = plan(
        &local.reservations,
        &baseline.reservations,
        &remote.reservations,
        |r| r.start_time >= since,
    );
    let mut shared = plan(
        &local.shared_reservations,
        &baseline.shared_reservations,
        &remote.shared_reservations,
        |s| s.start_time >= since,
    );

    let parent_starts: HashMap<Uuid, DateTime<Utc>> = remote
        .shared_reservations
        .iter()
        .chain(local.shared_reservations.iter())
        .map(|s| (s.id, s.start_time))
        .collect();
    let participants = plan(
        &local.participants,
        &baseline.participants,
        &remote.participants,
        |p| {
            parent_starts
                .get(&p.shared_reservation_id)
                .is_none_or(|start| *start >= since)
        },
    );

    let needed: HashSet<Uuid> = participants
        .push
        .iter()
        .map(|p| p.shared_reservation_id)
        .collect();
    let local_shared = by_id(&local.shared_reservations);
    let mut kept = Vec::new();
    shared.drop.retain(|id| {
        if !needed.contains(id) {
            return true;
        }
        if let Some(parent) = local_shared.get(id) {
            kept.push((*parent).clone());
        }
        false
    });
    for parent in kept {
        shared.push.push(parent.clone());
        shared.agreed.push(parent);
    }

    Reconciliation {
        push: IslandRows {
            reservations: reservations.push,
            shared_reservations: shared.push,
            participants: participants.push,
        },
        pull: IslandRows {
            reservations: reservations.pull,
            shared_reservations: shared.pull,
            participants: participants.pull,
        },
        drop: DroppedRows {
            reservations: reservations.drop,
            shared_reservations: shared.drop,
            participants: participants.drop,
        },
        baseline: IslandRows {
            reservations: reservations.agreed,
            shared_reservations: shared.agreed,
            participants: participants.agreed,
        },
    }
}

/// Number of device rows not yet agreed with the backend.
pub fn pending_changes(local: &IslandRows, baseline: &IslandRows) -> usize {
    fn dirty<T: SyncRow>(local: &[T], baseline: &[T]) -> usize {
        let agreed = by_id(baseline);
        local
            .iter()
            .filter(|row| agreed.get(&row.row_id()).is_none_or(|b| *b != *row))
            .count()
    }
    dirty(&local.reservations, &baseline.reservations)
        + dirty(&local.shared_reservations, &baseline.shared_reservations)
        + dirty(&local.participants, &baseline.participants)
}

/// Ids of rows that differ between two exports of the same island, in
/// either direction.
pub fn touched_between(before: &IslandRows, after: &IslandRows) -> HashSet<Uuid> {
    fn touched<T: SyncRow>(before: &[T], after: &[T], into: &mut HashSet<Uuid>) {
        let old = by_id(before);
        let new = by_id(after);
        for (id, row) in &new {
            if old.get(id).is_none_or(|prev| prev != row) {
                into.insert(*id);
            }
        }
        into.extend(old.keys().filter(|id| !new.contains_key(id)));
    }
    let mut ids = HashSet::new();
    touched(&before.reservations, &after.reservations, &mut ids);
    touched(&before.shared_reservations, &after.shared_reservations, &mut ids);
    touched(&before.participants, &after.participants, &mut ids);
    ids
}
