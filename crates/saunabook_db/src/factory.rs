//! Factory for creating stores from configuration

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::SqlStore;
use crate::repository::BookingStore;
use saunabook_common::time::parse_time_zone;
use saunabook_config::AppConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Builds ready-to-use SQL stores: connect, then create the schema.
#[derive(Debug, Clone, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// The backend store, from `[database]` and `time_zone`.
    pub async fn from_app_config(&self, config: &Arc<AppConfig>) -> Result<SqlStore, DbError> {
        debug!("Creating store from application configuration");
        let client = DbClient::new(config).await?;
        self.open(client, &config.time_zone).await
    }

    /// A SQLite store in a file, used for the island terminal replica.
    pub async fn sqlite_file(&self, path: &Path, time_zone: &str) -> Result<SqlStore, DbError> {
        debug!("Creating SQLite store at {}", path.display());
        let client = DbClient::sqlite_file(path).await?;
        self.open(client, time_zone).await
    }

    /// A private in-memory SQLite store.
    pub async fn sqlite_memory(&self, time_zone: &str) -> Result<SqlStore, DbError> {
        let client = DbClient::from_url("sqlite::memory:").await?;
        self.open(client, time_zone).await
    }

    async fn open(&self, client: DbClient, time_zone: &str) -> Result<SqlStore, DbError> {
        let tz = parse_time_zone(time_zone).map_err(|e| DbError::ConfigError(e.to_string()))?;
        let store = SqlStore::new(client, tz);
        store.init_schema().await?;
        Ok(store)
    }
}
