// --- File: crates/saunabook_booking/src/logic.rs ---
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use saunabook_common::time::truncate_to_hour;
use saunabook_common::{
    Reservation, Sauna, SaunaError, SharedReservation, SharedReservationParticipant, TimeRange,
};
use saunabook_config::BookingConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::GenderSchedule;

// --- Data Structures ---

/// Why the calculator picked a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotReason {
    /// The sauna is in use and frees up too close to now; one more hour is added.
    Buffer,
    /// The sauna is in use; the slot starts when the current booking ends.
    NextFree,
    /// The sauna is cold; the slot starts once it has had time to heat.
    Heating,
}

impl SlotReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotReason::Buffer => "buffer",
            SlotReason::NextFree => "next_free",
            SlotReason::Heating => "heating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: SlotReason,
}

/// Tunables of the booking rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRules {
    /// A slot starting within this span of now is skipped.
    pub buffer: Duration,
    /// Cancellation needs strictly more than this before the start.
    pub cancellation_cutoff: Duration,
    /// Upper bound on hour-by-hour advances while searching a free slot.
    pub max_slot_search: u32,
    pub shared_counts_toward_daily_limit: bool,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self::from(&BookingConfig::default())
    }
}

impl From<&BookingConfig> for BookingRules {
    fn from(config: &BookingConfig) -> Self {
        Self {
            buffer: Duration::minutes(config.buffer_minutes),
            cancellation_cutoff: Duration::minutes(config.cancellation_cutoff_minutes),
            max_slot_search: config.max_slot_search,
            shared_counts_toward_daily_limit: config.shared_counts_toward_daily_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub boat_id: Uuid,
    pub sauna_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub adults: u32,
    #[serde(default)]
    pub kids: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayQuery {
    /// Local date, YYYY-MM-DD
    pub date: NaiveDate,
}

/// A shared reservation with its derived segments and current participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedReservationView {
    #[serde(flatten)]
    pub shared: SharedReservation,
    pub schedule: GenderSchedule,
    pub participants: Vec<SharedReservationParticipant>,
}

/// Everything booked on one sauna on one local day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaunaDayOverview {
    pub sauna: Sauna,
    pub date: NaiveDate,
    /// Includes cancelled reservations, which stay visible in the day's history.
    pub reservations: Vec<Reservation>,
    pub shared_reservations: Vec<SharedReservationView>,
}

// --- Slot Logic ---

/// Computes the next bookable hour of `sauna`.
///
/// `current` is the reservation covering `now`, if any; it is ignored when it
/// does not actually cover `now`. `future` holds the reservations that may
/// collide with the search; cancelled ones are skipped. The result always
/// starts on a local full hour and lasts one hour.
pub fn next_available(
    sauna: &Sauna,
    current: Option<&Reservation>,
    future: &[Reservation],
    now: DateTime<Utc>,
    tz: Tz,
    rules: &BookingRules,
) -> NextSlot {
    let hour = Duration::hours(1);
    let current = current.filter(|r| r.start_time <= now && now < r.end_time);

    let (mut candidate, reason) = match current {
        Some(occupied) => {
            let end = truncate_to_hour(occupied.end_time, tz);
            if end - now <= rules.buffer {
                (end + hour, SlotReason::Buffer)
            } else {
                (end, SlotReason::NextFree)
            }
        }
        None => {
            let this_hour = truncate_to_hour(now, tz);
            let heated = this_hour + Duration::hours(i64::from(sauna.heating_time_hours));
            if heated > this_hour {
                (heated, SlotReason::Heating)
            } else {
                (truncate_to_hour(now + hour, tz), SlotReason::Heating)
            }
        }
    };

    let blocking: Vec<TimeRange> = current
        .into_iter()
        .chain(future.iter())
        .filter(|r| r.is_active())
        .map(Reservation::range)
        .collect();

    for _ in 0..rules.max_slot_search {
        let slot = TimeRange::new(candidate, candidate + hour);
        if !blocking.iter().any(|busy| busy.overlaps(&slot)) {
            break;
        }
        candidate += hour;
    }

    NextSlot {
        start_time: candidate,
        end_time: candidate + hour,
        reason,
    }
}

/// Decides whether `reservation` may be cancelled at `now`.
///
/// Allowed iff the reservation is ACTIVE and strictly more than `cutoff`
/// remains before it starts.
pub fn check_cancellable(
    reservation: &Reservation,
    now: DateTime<Utc>,
    cutoff: Duration,
) -> Result<(), SaunaError> {
    if !reservation.is_active() {
        return Err(SaunaError::AlreadyCancelled);
    }
    if now >= reservation.start_time {
        return Err(SaunaError::AlreadyStarted);
    }
    if reservation.start_time - now <= cutoff {
        return Err(SaunaError::TooLateToCancel);
    }
    Ok(())
}

/// Whether a candidate one-hour slot collides with any ACTIVE reservation.
pub fn slot_is_taken(slot: &TimeRange, reservations: &[Reservation]) -> bool {
    reservations
        .iter()
        .filter(|r| r.is_active())
        .any(|r| r.range().overlaps(slot))
}
