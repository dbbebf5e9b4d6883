//! Error types for the reservation store

use saunabook_common::SaunaError;
use thiserror::Error;

/// The uniqueness keys the store enforces on top of primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    /// One ACTIVE reservation per (sauna, start hour).
    SaunaSlot,
    /// One ACTIVE reservation per (boat, island, local day).
    BoatIslandDay,
    /// One shared reservation per (sauna, date).
    SaunaDate,
    /// One participation per (shared reservation, boat).
    SharedBoat,
    /// Anything else, typically a duplicate primary key.
    Other,
}

impl UniqueKey {
    /// Classifies a driver message. SQLite names the columns and PostgreSQL
    /// names the index, so both spellings are matched.
    pub fn classify(message: &str) -> Self {
        let m = message.to_ascii_lowercase();
        if m.contains("ux_participants_shared_boat")
            || m.contains("shared_reservation_participants.shared_reservation_id")
        {
            UniqueKey::SharedBoat
        } else if m.contains("ux_shared_sauna_date") || m.contains("shared_reservations.sauna_id")
        {
            UniqueKey::SaunaDate
        } else if m.contains("ux_reservations_boat_day") || m.contains("reservations.boat_id") {
            UniqueKey::BoatIslandDay
        } else if m.contains("ux_reservations_sauna_slot") || m.contains("reservations.sauna_id") {
            UniqueKey::SaunaSlot
        } else {
            UniqueKey::Other
        }
    }
}

/// Errors that can occur when working with the store
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A write collided with an existing row on a uniqueness key
    #[error("Unique constraint violated ({0:?}): {1}")]
    UniqueViolation(UniqueKey, String),

    /// A stored value could not be mapped back to a model
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl DbError {
    /// Maps a failed write, promoting unique-index violations to [`DbError::UniqueViolation`].
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let message = db_err.message().to_string();
                return DbError::UniqueViolation(UniqueKey::classify(&message), message);
            }
        }
        DbError::QueryError(err.to_string())
    }

    pub fn unique(key: UniqueKey, message: impl Into<String>) -> Self {
        DbError::UniqueViolation(key, message.into())
    }
}

impl From<DbError> for SaunaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(UniqueKey::SaunaSlot, _) => SaunaError::SlotConflict,
            DbError::UniqueViolation(UniqueKey::SaunaDate, _) => SaunaError::SlotConflict,
            DbError::UniqueViolation(UniqueKey::BoatIslandDay, _) => SaunaError::DailyLimitExceeded,
            DbError::UniqueViolation(UniqueKey::SharedBoat, _) => SaunaError::AlreadyJoined,
            other => SaunaError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sqlite_and_postgres_messages() {
        assert_eq!(
            UniqueKey::classify(
                "UNIQUE constraint failed: reservations.boat_id, reservations.island_id, reservations.day"
            ),
            UniqueKey::BoatIslandDay
        );
        assert_eq!(
            UniqueKey::classify("UNIQUE constraint failed: reservations.sauna_id, reservations.start_time"),
            UniqueKey::SaunaSlot
        );
        assert_eq!(
            UniqueKey::classify("UNIQUE constraint failed: shared_reservations.sauna_id, shared_reservations.date"),
            UniqueKey::SaunaDate
        );
        assert_eq!(
            UniqueKey::classify(
                "duplicate key value violates unique constraint \"ux_participants_shared_boat\""
            ),
            UniqueKey::SharedBoat
        );
        assert_eq!(
            UniqueKey::classify("UNIQUE constraint failed: reservations.id"),
            UniqueKey::Other
        );
    }

    #[test]
    fn unique_violations_become_booking_errors() {
        let err: SaunaError = DbError::unique(UniqueKey::BoatIslandDay, "x").into();
        assert_eq!(err, SaunaError::DailyLimitExceeded);
        let err: SaunaError = DbError::unique(UniqueKey::SaunaSlot, "x").into();
        assert_eq!(err, SaunaError::SlotConflict);
        let err: SaunaError = DbError::QueryError("boom".into()).into();
        assert_eq!(err.code(), "DATABASE");
    }
}
