//! Database client for saunabook
//!
//! This module provides a database client that is designed to be database agnostic,
//! using SQLx as the underlying database library.

use crate::error::DbError;
use saunabook_config::{AppConfig, DatabaseConfig};
use sqlx::pool::PoolOptions;
use sqlx::{Pool, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// How long a SQLite transaction waits for the single connection.
const SQLITE_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Type alias for a database transaction
pub type DbTransaction = Transaction<'static, sqlx::Any>;

/// Which engine sits behind the `Any` pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Sqlite,
    Postgres,
}

impl DbKind {
    fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.starts_with("sqlite:") {
            Ok(DbKind::Sqlite)
        } else if db_url.starts_with("postgres:") || db_url.starts_with("postgresql:") {
            Ok(DbKind::Postgres)
        } else {
            Err(DbError::UrlError(format!(
                "Unsupported database URL scheme: {}",
                db_url
            )))
        }
    }
}

/// Database client for saunabook
///
/// Wraps a pooled `sqlx::Any` connection so the same store code runs against
/// the backend database and the SQLite replica of an island terminal.
#[derive(Debug, Clone)]
pub struct DbClient {
    /// The database connection pool
    pool: Pool<sqlx::Any>,
    kind: DbKind,
}

impl DbClient {
    /// Create a new database client from the application configuration
    ///
    /// # Errors
    ///
    /// * The database configuration is missing
    /// * The database URL is missing
    /// * The database connection fails
    pub async fn new(config: &Arc<AppConfig>) -> Result<Self, DbError> {
        let db_config = config
            .database
            .as_ref()
            .ok_or_else(|| DbError::ConfigError("Database configuration is missing".to_string()))?;

        Self::from_config(db_config).await
    }

    /// Create a new database client from a database configuration
    pub async fn from_config(db_config: &DatabaseConfig) -> Result<Self, DbError> {
        if db_config.url.is_empty() {
            return Err(DbError::ConfigError("Database URL is empty".to_string()));
        }
        Self::from_url(&db_config.url).await
    }

    /// Create a new database client from a database URL
    ///
    /// `sqlite::memory:` opens a private in-memory database on a single
    /// connection; it lives as long as the client.
    pub async fn from_url(db_url: &str) -> Result<Self, DbError> {
        if db_url.is_empty() {
            return Err(DbError::UrlError("Database URL is empty".to_string()));
        }
        let kind = DbKind::from_url(db_url)?;
        let pool = Self::create_pool(db_url, kind).await?;
        Ok(Self { pool, kind })
    }

    /// Opens a SQLite file at `path`, creating it and its directory when missing.
    pub async fn sqlite_file(path: &Path) -> Result<Self, DbError> {
        Self::from_url(&format!("sqlite:{}", path.display())).await
    }

    async fn create_pool(db_url: &str, kind: DbKind) -> Result<Pool<sqlx::Any>, DbError> {
        debug!("Creating database pool with URL: {}", db_url);

        // Register the compiled-in drivers with the "any" driver
        sqlx::any::install_default_drivers();

        let in_memory = kind == DbKind::Sqlite && db_url.contains(":memory:");

        let pool_options = if in_memory {
            // Every connection to :memory: is a separate database
            PoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else if kind == DbKind::Sqlite {
            // SQLite has a single writer; a deferred transaction upgrading
            // to a write lock fails with SQLITE_BUSY, so transactions queue
            // for this one connection
            PoolOptions::new()
                .max_connections(1)
                .acquire_timeout(SQLITE_ACQUIRE_TIMEOUT)
                .idle_timeout(Duration::from_secs(600))
        } else {
            PoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .idle_timeout(Duration::from_secs(600))
        };

        // The Any driver cannot set create_if_missing, so the file is created up front
        if kind == DbKind::Sqlite && !in_memory {
            let db_path = if db_url.starts_with("sqlite://") {
                db_url.strip_prefix("sqlite://").unwrap_or(db_url)
            } else {
                db_url.strip_prefix("sqlite:").unwrap_or(db_url)
            };
            let db_path = db_path.split('?').next().unwrap_or(db_path);

            if !db_path.is_empty() {
                let path = Path::new(db_path);
                if let Some(dir) = path.parent() {
                    if !dir.as_os_str().is_empty() && !dir.exists() {
                        debug!("Creating directory for SQLite database: {:?}", dir);
                        std::fs::create_dir_all(dir).map_err(|e| {
                            error!("Failed to create directory for SQLite database: {}", e);
                            DbError::PoolError(format!("Failed to create directory: {}", e))
                        })?;
                    }
                }
                if !path.exists() {
                    debug!("Creating empty SQLite database file: {}", db_path);
                    std::fs::File::create(path).map_err(|e| {
                        error!("Failed to create SQLite database file: {}", e);
                        DbError::PoolError(format!("Failed to create database file: {}", e))
                    })?;
                }
            }
        }

        let pool = pool_options
            .connect_with(sqlx::any::AnyConnectOptions::from_str(db_url)?)
            .await
            .map_err(|e| {
                error!("Failed to create database pool: {}", e);
                DbError::PoolError(e.to_string())
            })?;

        info!("Database pool created successfully ({:?})", kind);
        Ok(pool)
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &Pool<sqlx::Any> {
        &self.pool
    }

    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Begin a transaction.
    ///
    /// On PostgreSQL the transaction runs SERIALIZABLE. A SQLite pool has a
    /// single connection, so its transactions run one after another.
    pub async fn begin(&self) -> Result<DbTransaction, DbError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        if self.kind == DbKind::Postgres {
            sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
        }
        Ok(tx)
    }

    /// Execute a query that returns no rows
    pub async fn execute(&self, query: &str) -> Result<u64, DbError> {
        sqlx::query(query)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    /// Check if the database is healthy
    pub async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Display for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DbClient({:?})", self.kind)
    }
}
