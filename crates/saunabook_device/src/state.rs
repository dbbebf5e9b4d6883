// --- File: crates/saunabook_device/src/state.rs ---
//! Persistent terminal state.
//!
//! Stored as JSON next to the replica so a restarted terminal resumes where
//! it stopped.

use chrono::{DateTime, Utc};
use saunabook_common::{internal_error, Context, IslandRows, SaunaError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DevicePhase {
    Unconfigured,
    Configuring,
    Configured,
}

impl DevicePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePhase::Unconfigured => "UNCONFIGURED",
            DevicePhase::Configuring => "CONFIGURING",
            DevicePhase::Configured => "CONFIGURED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub phase: DevicePhase,
    pub device_id: String,
    pub island_id: Option<Uuid>,
    pub configured_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_sync_error: Option<String>,
    /// Island rows as last agreed with the backend.
    #[serde(default)]
    pub baseline: IslandRows,
}

impl DeviceState {
    /// An unconfigured terminal; a random id is used unless one is given.
    pub fn fresh(device_id: Option<String>) -> Self {
        Self {
            phase: DevicePhase::Unconfigured,
            device_id: device_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            island_id: None,
            configured_at: None,
            last_sync_at: None,
            last_sync_error: None,
            baseline: IslandRows::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.phase == DevicePhase::Configured
    }
}

/// Where a [`DeviceState`] lives; `None` keeps it in memory only.
#[derive(Debug, Clone, Default)]
pub struct StateFile {
    path: Option<PathBuf>,
}

impl StateFile {
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reads the saved state, if there is one.
    pub async fn load(&self) -> Result<Option<DeviceState>, SaunaError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let state: DeviceState = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing device state {}", path.display()))?;
        debug!(path = %path.display(), "Device state loaded");
        Ok(Some(state))
    }

    /// Writes the state through a temporary file so a crash never leaves a
    /// half-written file behind.
    pub async fn save(&self, state: &DeviceState) -> Result<(), SaunaError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "Device state not saved");
            internal_error(format!("renaming {}: {}", tmp.display(), e))
        })
    }

    /// Deletes the saved state.
    pub async fn remove(&self) -> Result<(), SaunaError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }
}
