// --- File: crates/saunabook_common/src/models.rs ---

// Domain entities shared by the store, the booking core, the scheduler and
// the island terminal. All instants are UTC and truncated to whole seconds so
// that a row survives a round trip through any store unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SaunaError;

/// Top-level tenant owning islands and boats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub id: Uuid,
    pub name: String,
}

/// A physical location owning one or more saunas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    pub id: Uuid,
    pub club_id: Uuid,
    pub name: String,
}

/// A club member unit; the subject of every reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boat {
    pub id: Uuid,
    pub club_id: Uuid,
    pub name: String,
    pub membership_number: String,
}

/// A bookable heated facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sauna {
    pub id: Uuid,
    pub island_id: Uuid,
    pub name: String,
    /// Lead time needed before a cold sauna is usable, 1–4 hours.
    pub heating_time_hours: u32,
    pub auto_club_sauna_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "ACTIVE",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = SaunaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ReservationStatus::Active),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            other => Err(SaunaError::Validation(format!(
                "unknown reservation status: {}",
                other
            ))),
        }
    }
}

/// A one-hour exclusive booking of one sauna by one boat.
///
/// `island_id` is copied from the sauna at insert time so the daily limit can
/// be checked without a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub sauna_id: Uuid,
    pub island_id: Uuid,
    pub boat_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub adults: u32,
    pub kids: u32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderOrder {
    MalesFirst,
    FemalesFirst,
}

impl GenderOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderOrder::MalesFirst => "MALES_FIRST",
            GenderOrder::FemalesFirst => "FEMALES_FIRST",
        }
    }
}

impl fmt::Display for GenderOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenderOrder {
    type Err = SaunaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALES_FIRST" => Ok(GenderOrder::MalesFirst),
            "FEMALES_FIRST" => Ok(GenderOrder::FemalesFirst),
            other => Err(SaunaError::Validation(format!(
                "unknown gender order: {}",
                other
            ))),
        }
    }
}

/// A communal sauna block split into two gender segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedReservation {
    pub id: Uuid,
    pub sauna_id: Uuid,
    /// Local calendar date; together with `sauna_id` a uniqueness key.
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub males_duration_hours: u32,
    pub females_duration_hours: u32,
    pub gender_order: GenderOrder,
    pub name: String,
    pub is_auto_generated: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One boat taking part in a shared reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedReservationParticipant {
    pub id: Uuid,
    pub shared_reservation_id: Uuid,
    pub boat_id: Uuid,
    pub adults: u32,
    pub kids: u32,
    pub created_at: DateTime<Utc>,
}

/// A physical offline terminal, bound to exactly one island.
///
/// Only a SHA-256 digest of the setup token is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandDevice {
    pub id: Uuid,
    pub island_id: Uuid,
    pub device_token_hash: String,
    pub device_id: Option<String>,
    pub is_configured: bool,
    pub issued_at: DateTime<Utc>,
    pub configured_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Read-only island directory a terminal needs to operate offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandDirectory {
    pub club: Club,
    pub island: Island,
    pub saunas: Vec<Sauna>,
    pub boats: Vec<Boat>,
}

/// The mutable rows of one island, as exchanged during sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandRows {
    pub reservations: Vec<Reservation>,
    pub shared_reservations: Vec<SharedReservation>,
    pub participants: Vec<SharedReservationParticipant>,
}

impl IslandRows {
    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
            && self.shared_reservations.is_empty()
            && self.participants.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reservations.len() + self.shared_reservations.len() + self.participants.len()
    }
}

/// Half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Two ranges intersect when a boundary of one lies strictly inside the
    /// other or one contains the other. Touching ranges do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}
