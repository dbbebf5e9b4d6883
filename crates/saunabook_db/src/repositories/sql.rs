//! SQL implementation of the store traits
//!
//! Runs on the `sqlx::Any` pool of a [`DbClient`]; SQLite for the island
//! terminal and tests, PostgreSQL for a production backend.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use saunabook_common::time::local_day;
use saunabook_common::{
    Boat, Club, GenderOrder, Island, IslandDevice, IslandDirectory, IslandRows, Reservation,
    ReservationStatus, Sauna, SharedReservation, SharedReservationParticipant, TimeRange,
};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::client::{DbClient, DbTransaction};
use crate::error::DbError;
use crate::repositories::schema::{SCHEMA, TABLES};
use crate::repository::{
    BookingStore, BookingTransaction, DeviceRepository, SharedReservationFilter,
};

const RESERVATION_COLUMNS: &str = "id, sauna_id, island_id, boat_id, start_time, end_time, \
     adults, kids, status, created_at, cancelled_at";

const SHARED_COLUMNS: &str = "s.id, s.sauna_id, s.day, s.start_time, s.males_duration_hours, \
     s.females_duration_hours, s.gender_order, s.name, s.is_auto_generated, s.created_by, s.created_at";

const PARTICIPANT_COLUMNS: &str =
    "p.id, p.shared_reservation_id, p.boat_id, p.adults, p.kids, p.created_at";

const DEVICE_COLUMNS: &str = "id, island_id, device_token_hash, device_id, is_configured, \
     issued_at, configured_at, last_sync_at";

// --- column decoding ---

fn uuid_col(row: &AnyRow, column: &str) -> Result<Uuid, DbError> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| DbError::CorruptRow(format!("{}: {}", column, e)))
}

fn instant(secs: i64, column: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| DbError::CorruptRow(format!("{}: timestamp out of range", column)))
}

fn ts_col(row: &AnyRow, column: &str) -> Result<DateTime<Utc>, DbError> {
    instant(row.try_get::<i64, _>(column)?, column)
}

fn opt_ts_col(row: &AnyRow, column: &str) -> Result<Option<DateTime<Utc>>, DbError> {
    row.try_get::<Option<i64>, _>(column)?
        .map(|secs| instant(secs, column))
        .transpose()
}

fn u32_col(row: &AnyRow, column: &str) -> Result<u32, DbError> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw).map_err(|_| DbError::CorruptRow(format!("{}: {} out of range", column, raw)))
}

fn bool_col(row: &AnyRow, column: &str) -> Result<bool, DbError> {
    Ok(row.try_get::<i64, _>(column)? != 0)
}

fn day_col(row: &AnyRow, column: &str) -> Result<NaiveDate, DbError> {
    let raw: String = row.try_get(column)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| DbError::CorruptRow(format!("{}: {}", column, e)))
}

fn day_text(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn flag(value: bool) -> i64 {
    i64::from(value)
}

fn sauna_from_row(row: &AnyRow) -> Result<Sauna, DbError> {
    Ok(Sauna {
        id: uuid_col(row, "id")?,
        island_id: uuid_col(row, "island_id")?,
        name: row.try_get("name")?,
        heating_time_hours: u32_col(row, "heating_time_hours")?,
        auto_club_sauna_enabled: bool_col(row, "auto_club_sauna_enabled")?,
    })
}

fn boat_from_row(row: &AnyRow) -> Result<Boat, DbError> {
    Ok(Boat {
        id: uuid_col(row, "id")?,
        club_id: uuid_col(row, "club_id")?,
        name: row.try_get("name")?,
        membership_number: row.try_get("membership_number")?,
    })
}

fn reservation_from_row(row: &AnyRow) -> Result<Reservation, DbError> {
    let status: String = row.try_get("status")?;
    Ok(Reservation {
        id: uuid_col(row, "id")?,
        sauna_id: uuid_col(row, "sauna_id")?,
        island_id: uuid_col(row, "island_id")?,
        boat_id: uuid_col(row, "boat_id")?,
        start_time: ts_col(row, "start_time")?,
        end_time: ts_col(row, "end_time")?,
        adults: u32_col(row, "adults")?,
        kids: u32_col(row, "kids")?,
        status: status
            .parse::<ReservationStatus>()
            .map_err(|e| DbError::CorruptRow(e.to_string()))?,
        created_at: ts_col(row, "created_at")?,
        cancelled_at: opt_ts_col(row, "cancelled_at")?,
    })
}

fn shared_from_row(row: &AnyRow) -> Result<SharedReservation, DbError> {
    let order: String = row.try_get("gender_order")?;
    Ok(SharedReservation {
        id: uuid_col(row, "id")?,
        sauna_id: uuid_col(row, "sauna_id")?,
        date: day_col(row, "day")?,
        start_time: ts_col(row, "start_time")?,
        males_duration_hours: u32_col(row, "males_duration_hours")?,
        females_duration_hours: u32_col(row, "females_duration_hours")?,
        gender_order: order
            .parse::<GenderOrder>()
            .map_err(|e| DbError::CorruptRow(e.to_string()))?,
        name: row.try_get("name")?,
        is_auto_generated: bool_col(row, "is_auto_generated")?,
        created_by: row.try_get("created_by")?,
        created_at: ts_col(row, "created_at")?,
    })
}

fn participant_from_row(row: &AnyRow) -> Result<SharedReservationParticipant, DbError> {
    Ok(SharedReservationParticipant {
        id: uuid_col(row, "id")?,
        shared_reservation_id: uuid_col(row, "shared_reservation_id")?,
        boat_id: uuid_col(row, "boat_id")?,
        adults: u32_col(row, "adults")?,
        kids: u32_col(row, "kids")?,
        created_at: ts_col(row, "created_at")?,
    })
}

fn device_from_row(row: &AnyRow) -> Result<IslandDevice, DbError> {
    Ok(IslandDevice {
        id: uuid_col(row, "id")?,
        island_id: uuid_col(row, "island_id")?,
        device_token_hash: row.try_get("device_token_hash")?,
        device_id: row.try_get("device_id")?,
        is_configured: bool_col(row, "is_configured")?,
        issued_at: ts_col(row, "issued_at")?,
        configured_at: opt_ts_col(row, "configured_at")?,
        last_sync_at: opt_ts_col(row, "last_sync_at")?,
    })
}

fn collect<T>(
    rows: Vec<AnyRow>,
    map: fn(&AnyRow) -> Result<T, DbError>,
) -> Result<Vec<T>, DbError> {
    rows.iter().map(map).collect()
}

/// A value bound to a dynamically built query.
enum Bind {
    Text(String),
    Int(i64),
}

/// SQL [`BookingStore`] and [`DeviceRepository`].
#[derive(Debug, Clone)]
pub struct SqlStore {
    db_client: DbClient,
    tz: Tz,
}

impl SqlStore {
    /// `tz` defines the local day stored next to every reservation for the
    /// boat/island/day unique index.
    pub fn new(db_client: DbClient, tz: Tz) -> Self {
        Self { db_client, tz }
    }

    pub fn client(&self) -> &DbClient {
        &self.db_client
    }
}

/// A transaction on a [`SqlStore`].
pub struct SqlTransaction {
    tx: DbTransaction,
    tz: Tz,
}

impl BookingStore for SqlStore {
    type Tx = SqlTransaction;

    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing reservation store schema");
        for statement in SCHEMA {
            self.db_client.execute(statement).await?;
        }
        info!("Reservation store schema initialized successfully");
        Ok(())
    }

    async fn begin(&self) -> Result<SqlTransaction, DbError> {
        Ok(SqlTransaction {
            tx: self.db_client.begin().await?,
            tz: self.tz,
        })
    }
}

impl SqlTransaction {
    async fn fetch_all(&mut self, sql: &str, binds: Vec<Bind>) -> Result<Vec<AnyRow>, DbError> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = match bind {
                Bind::Text(value) => query.bind(value),
                Bind::Int(value) => query.bind(value),
            };
        }
        query.fetch_all(&mut *self.tx).await.map_err(|e| {
            error!("Query failed: {}", e);
            DbError::QueryError(e.to_string())
        })
    }

    async fn write_reservation(&mut self, r: &Reservation, upsert: bool) -> Result<(), DbError> {
        let mut sql = format!(
            "INSERT INTO reservations ({}, day) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            RESERVATION_COLUMNS
        );
        if upsert {
            sql.push_str(
                " ON CONFLICT (id) DO UPDATE SET sauna_id = excluded.sauna_id, \
                 island_id = excluded.island_id, boat_id = excluded.boat_id, \
                 start_time = excluded.start_time, end_time = excluded.end_time, \
                 adults = excluded.adults, kids = excluded.kids, status = excluded.status, \
                 created_at = excluded.created_at, cancelled_at = excluded.cancelled_at, \
                 day = excluded.day",
            );
        }
        sqlx::query(&sql)
            .bind(r.id.to_string())
            .bind(r.sauna_id.to_string())
            .bind(r.island_id.to_string())
            .bind(r.boat_id.to_string())
            .bind(r.start_time.timestamp())
            .bind(r.end_time.timestamp())
            .bind(i64::from(r.adults))
            .bind(i64::from(r.kids))
            .bind(r.status.as_str().to_string())
            .bind(r.created_at.timestamp())
            .bind(r.cancelled_at.map(|t| t.timestamp()))
            .bind(day_text(local_day(r.start_time, self.tz)))
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from_write)?;
        Ok(())
    }

    async fn write_shared(&mut self, s: &SharedReservation, upsert: bool) -> Result<(), DbError> {
        let mut sql = String::from(
            "INSERT INTO shared_reservations (id, sauna_id, day, start_time, males_duration_hours, \
             females_duration_hours, gender_order, name, is_auto_generated, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        );
        if upsert {
            sql.push_str(
                " ON CONFLICT (id) DO UPDATE SET sauna_id = excluded.sauna_id, day = excluded.day, \
                 start_time = excluded.start_time, \
                 males_duration_hours = excluded.males_duration_hours, \
                 females_duration_hours = excluded.females_duration_hours, \
                 gender_order = excluded.gender_order, name = excluded.name, \
                 is_auto_generated = excluded.is_auto_generated, \
                 created_by = excluded.created_by, created_at = excluded.created_at",
            );
        }
        sqlx::query(&sql)
            .bind(s.id.to_string())
            .bind(s.sauna_id.to_string())
            .bind(day_text(s.date))
            .bind(s.start_time.timestamp())
            .bind(i64::from(s.males_duration_hours))
            .bind(i64::from(s.females_duration_hours))
            .bind(s.gender_order.as_str().to_string())
            .bind(s.name.clone())
            .bind(flag(s.is_auto_generated))
            .bind(s.created_by.clone())
            .bind(s.created_at.timestamp())
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from_write)?;
        Ok(())
    }

    async fn write_participant(
        &mut self,
        p: &SharedReservationParticipant,
        upsert: bool,
    ) -> Result<(), DbError> {
        let mut sql = String::from(
            "INSERT INTO shared_reservation_participants \
             (id, shared_reservation_id, boat_id, adults, kids, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        );
        if upsert {
            sql.push_str(
                " ON CONFLICT (id) DO UPDATE SET \
                 shared_reservation_id = excluded.shared_reservation_id, \
                 boat_id = excluded.boat_id, adults = excluded.adults, kids = excluded.kids, \
                 created_at = excluded.created_at",
            );
        }
        sqlx::query(&sql)
            .bind(p.id.to_string())
            .bind(p.shared_reservation_id.to_string())
            .bind(p.boat_id.to_string())
            .bind(i64::from(p.adults))
            .bind(i64::from(p.kids))
            .bind(p.created_at.timestamp())
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from_write)?;
        Ok(())
    }

    async fn delete_by_id(&mut self, table: &str, id: Uuid) -> Result<bool, DbError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table);
        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from_write)?;
        Ok(result.rows_affected() > 0)
    }
}

impl BookingTransaction for SqlTransaction {
    async fn get_club(&mut self, id: Uuid) -> Result<Option<Club>, DbError> {
        let rows = self
            .fetch_all(
                "SELECT id, name FROM clubs WHERE id = $1",
                vec![Bind::Text(id.to_string())],
            )
            .await?;
        rows.first()
            .map(|row| {
                Ok(Club {
                    id: uuid_col(row, "id")?,
                    name: row.try_get("name")?,
                })
            })
            .transpose()
    }

    async fn get_island(&mut self, id: Uuid) -> Result<Option<Island>, DbError> {
        let rows = self
            .fetch_all(
                "SELECT id, club_id, name FROM islands WHERE id = $1",
                vec![Bind::Text(id.to_string())],
            )
            .await?;
        rows.first()
            .map(|row| {
                Ok(Island {
                    id: uuid_col(row, "id")?,
                    club_id: uuid_col(row, "club_id")?,
                    name: row.try_get("name")?,
                })
            })
            .transpose()
    }

    async fn get_sauna(&mut self, id: Uuid) -> Result<Option<Sauna>, DbError> {
        let rows = self
            .fetch_all(
                "SELECT id, island_id, name, heating_time_hours, auto_club_sauna_enabled \
                 FROM saunas WHERE id = $1",
                vec![Bind::Text(id.to_string())],
            )
            .await?;
        rows.first().map(sauna_from_row).transpose()
    }

    async fn get_boat(&mut self, id: Uuid) -> Result<Option<Boat>, DbError> {
        let rows = self
            .fetch_all(
                "SELECT id, club_id, name, membership_number FROM boats WHERE id = $1",
                vec![Bind::Text(id.to_string())],
            )
            .await?;
        rows.first().map(boat_from_row).transpose()
    }

    async fn list_auto_club_saunas(&mut self) -> Result<Vec<Sauna>, DbError> {
        let rows = self
            .fetch_all(
                "SELECT id, island_id, name, heating_time_hours, auto_club_sauna_enabled \
                 FROM saunas WHERE auto_club_sauna_enabled = 1 ORDER BY id",
                Vec::new(),
            )
            .await?;
        collect(rows, sauna_from_row)
    }

    async fn list_saunas_for_island(&mut self, island_id: Uuid) -> Result<Vec<Sauna>, DbError> {
        let rows = self
            .fetch_all(
                "SELECT id, island_id, name, heating_time_hours, auto_club_sauna_enabled \
                 FROM saunas WHERE island_id = $1 ORDER BY id",
                vec![Bind::Text(island_id.to_string())],
            )
            .await?;
        collect(rows, sauna_from_row)
    }

    async fn list_boats_for_club(&mut self, club_id: Uuid) -> Result<Vec<Boat>, DbError> {
        let rows = self
            .fetch_all(
                "SELECT id, club_id, name, membership_number FROM boats \
                 WHERE club_id = $1 ORDER BY id",
                vec![Bind::Text(club_id.to_string())],
            )
            .await?;
        collect(rows, boat_from_row)
    }

    async fn install_directory(&mut self, directory: &IslandDirectory) -> Result<(), DbError> {
        debug!(
            "Installing directory for island {} ({} saunas, {} boats)",
            directory.island.id,
            directory.saunas.len(),
            directory.boats.len()
        );
        sqlx::query(
            "INSERT INTO clubs (id, name) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET name = excluded.name",
        )
        .bind(directory.club.id.to_string())
        .bind(directory.club.name.clone())
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;

        sqlx::query(
            "INSERT INTO islands (id, club_id, name) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET club_id = excluded.club_id, name = excluded.name",
        )
        .bind(directory.island.id.to_string())
        .bind(directory.island.club_id.to_string())
        .bind(directory.island.name.clone())
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;

        for sauna in &directory.saunas {
            sqlx::query(
                "INSERT INTO saunas (id, island_id, name, heating_time_hours, auto_club_sauna_enabled) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (id) DO UPDATE SET island_id = excluded.island_id, name = excluded.name, \
                 heating_time_hours = excluded.heating_time_hours, \
                 auto_club_sauna_enabled = excluded.auto_club_sauna_enabled",
            )
            .bind(sauna.id.to_string())
            .bind(sauna.island_id.to_string())
            .bind(sauna.name.clone())
            .bind(i64::from(sauna.heating_time_hours))
            .bind(flag(sauna.auto_club_sauna_enabled))
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from_write)?;
        }

        for boat in &directory.boats {
            sqlx::query(
                "INSERT INTO boats (id, club_id, name, membership_number) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET club_id = excluded.club_id, name = excluded.name, \
                 membership_number = excluded.membership_number",
            )
            .bind(boat.id.to_string())
            .bind(boat.club_id.to_string())
            .bind(boat.name.clone())
            .bind(boat.membership_number.clone())
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from_write)?;
        }
        Ok(())
    }

    async fn list_reservations(
        &mut self,
        sauna_id: Uuid,
        range: TimeRange,
    ) -> Result<Vec<Reservation>, DbError> {
        let sql = format!(
            "SELECT {} FROM reservations WHERE sauna_id = $1 AND start_time < $2 AND end_time > $3 \
             ORDER BY start_time, id",
            RESERVATION_COLUMNS
        );
        let rows = self
            .fetch_all(
                &sql,
                vec![
                    Bind::Text(sauna_id.to_string()),
                    Bind::Int(range.end.timestamp()),
                    Bind::Int(range.start.timestamp()),
                ],
            )
            .await?;
        collect(rows, reservation_from_row)
    }

    async fn list_active_reservations_for_boat_on_island(
        &mut self,
        boat_id: Uuid,
        island_id: Uuid,
        day: NaiveDate,
    ) -> Result<Vec<Reservation>, DbError> {
        let sql = format!(
            "SELECT {} FROM reservations \
             WHERE boat_id = $1 AND island_id = $2 AND day = $3 AND status = 'ACTIVE' \
             ORDER BY start_time, id",
            RESERVATION_COLUMNS
        );
        let rows = self
            .fetch_all(
                &sql,
                vec![
                    Bind::Text(boat_id.to_string()),
                    Bind::Text(island_id.to_string()),
                    Bind::Text(day_text(day)),
                ],
            )
            .await?;
        collect(rows, reservation_from_row)
    }

    async fn get_reservation(&mut self, id: Uuid) -> Result<Option<Reservation>, DbError> {
        let sql = format!("SELECT {} FROM reservations WHERE id = $1", RESERVATION_COLUMNS);
        let rows = self
            .fetch_all(&sql, vec![Bind::Text(id.to_string())])
            .await?;
        rows.first().map(reservation_from_row).transpose()
    }

    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), DbError> {
        self.write_reservation(reservation, false).await
    }

    async fn update_reservation_status(
        &mut self,
        id: Uuid,
        status: ReservationStatus,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Result<bool, DbError> {
        let result =
            sqlx::query("UPDATE reservations SET status = $1, cancelled_at = $2 WHERE id = $3")
                .bind(status.as_str().to_string())
                .bind(cancelled_at.map(|t| t.timestamp()))
                .bind(id.to_string())
                .execute(&mut *self.tx)
                .await
                .map_err(DbError::from_write)?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_reservation(&mut self, reservation: &Reservation) -> Result<(), DbError> {
        self.write_reservation(reservation, true).await
    }

    async fn delete_reservation(&mut self, id: Uuid) -> Result<bool, DbError> {
        self.delete_by_id("reservations", id).await
    }

    async fn list_shared_reservations(
        &mut self,
        filter: &SharedReservationFilter,
    ) -> Result<Vec<SharedReservation>, DbError> {
        let mut sql = format!(
            "SELECT {} FROM shared_reservations s LEFT JOIN saunas sa ON sa.id = s.sauna_id WHERE 1 = 1",
            SHARED_COLUMNS
        );
        let mut binds = Vec::new();
        let mut push = |sql: &mut String, clause: &str, bind: Bind| {
            binds.push(bind);
            sql.push_str(&format!(" AND {} ${}", clause, binds.len()));
        };
        if let Some(id) = filter.sauna_id {
            push(&mut sql, "s.sauna_id =", Bind::Text(id.to_string()));
        }
        if let Some(id) = filter.island_id {
            push(&mut sql, "sa.island_id =", Bind::Text(id.to_string()));
        }
        if let Some(date) = filter.date {
            push(&mut sql, "s.day =", Bind::Text(day_text(date)));
        }
        if let Some(date) = filter.from_date {
            push(&mut sql, "s.day >=", Bind::Text(day_text(date)));
        }
        if let Some(auto) = filter.is_auto_generated {
            push(&mut sql, "s.is_auto_generated =", Bind::Int(flag(auto)));
        }
        sql.push_str(" ORDER BY s.day, s.sauna_id");

        let rows = self.fetch_all(&sql, binds).await?;
        collect(rows, shared_from_row)
    }

    async fn get_shared_reservation(
        &mut self,
        id: Uuid,
    ) -> Result<Option<SharedReservation>, DbError> {
        let sql = format!("SELECT {} FROM shared_reservations s WHERE s.id = $1", SHARED_COLUMNS);
        let rows = self
            .fetch_all(&sql, vec![Bind::Text(id.to_string())])
            .await?;
        rows.first().map(shared_from_row).transpose()
    }

    async fn insert_shared_reservation(&mut self, shared: &SharedReservation) -> Result<(), DbError> {
        self.write_shared(shared, false).await
    }

    async fn update_shared_reservation(
        &mut self,
        shared: &SharedReservation,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE shared_reservations SET sauna_id = $1, day = $2, start_time = $3, \
             males_duration_hours = $4, females_duration_hours = $5, gender_order = $6, \
             name = $7, is_auto_generated = $8, created_by = $9 WHERE id = $10",
        )
        .bind(shared.sauna_id.to_string())
        .bind(day_text(shared.date))
        .bind(shared.start_time.timestamp())
        .bind(i64::from(shared.males_duration_hours))
        .bind(i64::from(shared.females_duration_hours))
        .bind(shared.gender_order.as_str().to_string())
        .bind(shared.name.clone())
        .bind(flag(shared.is_auto_generated))
        .bind(shared.created_by.clone())
        .bind(shared.id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_shared_reservation(&mut self, shared: &SharedReservation) -> Result<(), DbError> {
        self.write_shared(shared, true).await
    }

    async fn delete_shared_reservation(&mut self, id: Uuid) -> Result<bool, DbError> {
        sqlx::query("DELETE FROM shared_reservation_participants WHERE shared_reservation_id = $1")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from_write)?;
        self.delete_by_id("shared_reservations", id).await
    }

    async fn list_participants(
        &mut self,
        shared_reservation_id: Uuid,
    ) -> Result<Vec<SharedReservationParticipant>, DbError> {
        let sql = format!(
            "SELECT {} FROM shared_reservation_participants p \
             WHERE p.shared_reservation_id = $1 ORDER BY p.created_at, p.id",
            PARTICIPANT_COLUMNS
        );
        let rows = self
            .fetch_all(&sql, vec![Bind::Text(shared_reservation_id.to_string())])
            .await?;
        collect(rows, participant_from_row)
    }

    async fn list_participations_for_boat_on_island(
        &mut self,
        boat_id: Uuid,
        island_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<SharedReservationParticipant>, DbError> {
        let sql = format!(
            "SELECT {} FROM shared_reservation_participants p \
             JOIN shared_reservations s ON s.id = p.shared_reservation_id \
             JOIN saunas sa ON sa.id = s.sauna_id \
             WHERE p.boat_id = $1 AND sa.island_id = $2 AND s.day = $3",
            PARTICIPANT_COLUMNS
        );
        let rows = self
            .fetch_all(
                &sql,
                vec![
                    Bind::Text(boat_id.to_string()),
                    Bind::Text(island_id.to_string()),
                    Bind::Text(day_text(date)),
                ],
            )
            .await?;
        collect(rows, participant_from_row)
    }

    async fn insert_participant(
        &mut self,
        participant: &SharedReservationParticipant,
    ) -> Result<(), DbError> {
        self.write_participant(participant, false).await
    }

    async fn upsert_participant(
        &mut self,
        participant: &SharedReservationParticipant,
    ) -> Result<(), DbError> {
        self.write_participant(participant, true).await
    }

    async fn delete_participant(&mut self, id: Uuid) -> Result<bool, DbError> {
        self.delete_by_id("shared_reservation_participants", id)
            .await
    }

    async fn export_island_rows(
        &mut self,
        island_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<IslandRows, DbError> {
        let island = island_id.to_string();
        let since = since.timestamp();

        let sql = format!(
            "SELECT {} FROM reservations WHERE island_id = $1 AND start_time >= $2 \
             ORDER BY start_time, id",
            RESERVATION_COLUMNS
        );
        let rows = self
            .fetch_all(&sql, vec![Bind::Text(island.clone()), Bind::Int(since)])
            .await?;
        let reservations = collect(rows, reservation_from_row)?;

        let sql = format!(
            "SELECT {} FROM shared_reservations s JOIN saunas sa ON sa.id = s.sauna_id \
             WHERE sa.island_id = $1 AND s.start_time >= $2 ORDER BY s.day, s.sauna_id",
            SHARED_COLUMNS
        );
        let rows = self
            .fetch_all(&sql, vec![Bind::Text(island.clone()), Bind::Int(since)])
            .await?;
        let shared_reservations = collect(rows, shared_from_row)?;

        let sql = format!(
            "SELECT {} FROM shared_reservation_participants p \
             JOIN shared_reservations s ON s.id = p.shared_reservation_id \
             JOIN saunas sa ON sa.id = s.sauna_id \
             WHERE sa.island_id = $1 AND s.start_time >= $2 ORDER BY p.created_at, p.id",
            PARTICIPANT_COLUMNS
        );
        let rows = self
            .fetch_all(&sql, vec![Bind::Text(island), Bind::Int(since)])
            .await?;
        let participants = collect(rows, participant_from_row)?;

        Ok(IslandRows {
            reservations,
            shared_reservations,
            participants,
        })
    }

    async fn wipe(&mut self) -> Result<(), DbError> {
        for table in TABLES {
            let sql = format!("DELETE FROM {}", table);
            sqlx::query(&sql)
                .execute(&mut *self.tx)
                .await
                .map_err(DbError::from_write)?;
        }
        info!("Store wiped");
        Ok(())
    }

    async fn commit(self) -> Result<(), DbError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }
}

impl DeviceRepository for SqlStore {
    async fn issue_device_token(
        &self,
        island_id: Uuid,
        token_hash: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IslandDevice, DbError> {
        let device = IslandDevice {
            id: Uuid::new_v4(),
            island_id,
            device_token_hash: token_hash.to_string(),
            device_id: None,
            is_configured: false,
            issued_at,
            configured_at: None,
            last_sync_at: None,
        };
        sqlx::query(
            "INSERT INTO island_devices (id, island_id, device_token_hash, is_configured, issued_at) \
             VALUES ($1, $2, $3, 0, $4)",
        )
        .bind(device.id.to_string())
        .bind(island_id.to_string())
        .bind(token_hash.to_string())
        .bind(issued_at.timestamp())
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to issue device token: {}", e);
            DbError::from_write(e)
        })?;
        info!("Device token issued for island {}", island_id);
        Ok(device)
    }

    async fn consume_device_token(
        &self,
        token_hash: &str,
        device_id: &str,
        configured_at: DateTime<Utc>,
    ) -> Result<Option<IslandDevice>, DbError> {
        // The conditional update is the single-use guarantee
        let result = sqlx::query(
            "UPDATE island_devices SET device_id = $1, is_configured = 1, configured_at = $2 \
             WHERE device_token_hash = $3 AND is_configured = 0",
        )
        .bind(device_id.to_string())
        .bind(configured_at.timestamp())
        .bind(token_hash.to_string())
        .execute(self.db_client.pool())
        .await
        .map_err(DbError::from_write)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {} FROM island_devices WHERE device_token_hash = $1",
            DEVICE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(token_hash.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.as_ref().map(device_from_row).transpose()
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<IslandDevice>, DbError> {
        let sql = format!("SELECT {} FROM island_devices WHERE device_id = $1", DEVICE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(device_id.to_string())
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.as_ref().map(device_from_row).transpose()
    }

    async fn touch_device_sync(&self, device_id: &str, at: DateTime<Utc>) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE island_devices SET last_sync_at = $1 WHERE device_id = $2")
            .bind(at.timestamp())
            .bind(device_id.to_string())
            .execute(self.db_client.pool())
            .await
            .map_err(DbError::from_write)?;
        Ok(result.rows_affected() > 0)
    }
}
