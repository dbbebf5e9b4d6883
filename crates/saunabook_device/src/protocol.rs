// --- File: crates/saunabook_device/src/protocol.rs ---
//! Wire types exchanged between an island terminal and the backend.

use chrono::{DateTime, Utc};
use saunabook_common::{IslandDevice, IslandDirectory, IslandRows};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned once to the operator who provisions a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// The plain token; only its digest is kept.
    pub token: String,
    pub device: IslandDevice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub token: String,
    pub device_id: String,
}

/// Everything a terminal needs to run its island offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device_id: String,
    #[serde(flatten)]
    pub directory: IslandDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub device_id: String,
    pub island_id: Uuid,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub device_id: String,
    pub island_id: Uuid,
    #[serde(flatten)]
    pub rows: IslandRows,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Rows written on the backend.
    pub applied: u32,
    /// Backend rows cancelled or removed in favour of device rows.
    pub yielded: u32,
}
