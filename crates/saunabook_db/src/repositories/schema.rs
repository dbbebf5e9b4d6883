//! Table definitions shared by every SQL backend.
//!
//! Instants are Unix seconds and days are `YYYY-MM-DD` text because the
//! `Any` driver has no chrono support. Booleans are stored as 0/1.

pub(crate) const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clubs (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS islands (
        id TEXT PRIMARY KEY,
        club_id TEXT NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS saunas (
        id TEXT PRIMARY KEY,
        island_id TEXT NOT NULL,
        name TEXT NOT NULL,
        heating_time_hours BIGINT NOT NULL,
        auto_club_sauna_enabled BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS boats (
        id TEXT PRIMARY KEY,
        club_id TEXT NOT NULL,
        name TEXT NOT NULL,
        membership_number TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        id TEXT PRIMARY KEY,
        sauna_id TEXT NOT NULL,
        island_id TEXT NOT NULL,
        boat_id TEXT NOT NULL,
        start_time BIGINT NOT NULL,
        end_time BIGINT NOT NULL,
        day TEXT NOT NULL,
        adults BIGINT NOT NULL,
        kids BIGINT NOT NULL,
        status TEXT NOT NULL,
        created_at BIGINT NOT NULL,
        cancelled_at BIGINT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_reservations_sauna_slot \
     ON reservations (sauna_id, start_time) WHERE status = 'ACTIVE'",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_reservations_boat_day \
     ON reservations (boat_id, island_id, day) WHERE status = 'ACTIVE'",
    "CREATE INDEX IF NOT EXISTS ix_reservations_island_start \
     ON reservations (island_id, start_time)",
    r#"
    CREATE TABLE IF NOT EXISTS shared_reservations (
        id TEXT PRIMARY KEY,
        sauna_id TEXT NOT NULL,
        day TEXT NOT NULL,
        start_time BIGINT NOT NULL,
        males_duration_hours BIGINT NOT NULL,
        females_duration_hours BIGINT NOT NULL,
        gender_order TEXT NOT NULL,
        name TEXT NOT NULL,
        is_auto_generated BIGINT NOT NULL,
        created_by TEXT NOT NULL,
        created_at BIGINT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_shared_sauna_date \
     ON shared_reservations (sauna_id, day)",
    r#"
    CREATE TABLE IF NOT EXISTS shared_reservation_participants (
        id TEXT PRIMARY KEY,
        shared_reservation_id TEXT NOT NULL,
        boat_id TEXT NOT NULL,
        adults BIGINT NOT NULL,
        kids BIGINT NOT NULL,
        created_at BIGINT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_participants_shared_boat \
     ON shared_reservation_participants (shared_reservation_id, boat_id)",
    r#"
    CREATE TABLE IF NOT EXISTS island_devices (
        id TEXT PRIMARY KEY,
        island_id TEXT NOT NULL,
        device_token_hash TEXT NOT NULL UNIQUE,
        device_id TEXT,
        is_configured BIGINT NOT NULL,
        issued_at BIGINT NOT NULL,
        configured_at BIGINT,
        last_sync_at BIGINT
    )
    "#,
];

/// Tables cleared by a factory reset, children first.
pub(crate) const TABLES: &[&str] = &[
    "shared_reservation_participants",
    "shared_reservations",
    "reservations",
    "boats",
    "saunas",
    "islands",
    "clubs",
    "island_devices",
];
