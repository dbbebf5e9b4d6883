// File: crates/saunabook_device/src/handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use saunabook_common::{handle_json_result, IslandRows, SaunaError};
use saunabook_db::{BookingStore, DeviceRepository};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::protocol::{
    ConfigureRequest, DeviceSnapshot, IssuedToken, PullRequest, SyncRequest, SyncResponse,
};
use crate::reconciler::{DeviceStatus, OfflineReconciler, SyncReport};
use crate::server::DeviceSyncService;

// --- Backend ---

pub type DeviceSyncState<S, D> = Arc<DeviceSyncService<S, D>>;

/// Handler for provisioning a terminal for an island.
pub async fn issue_token_handler<S: BookingStore, D: DeviceRepository>(
    State(service): State<DeviceSyncState<S, D>>,
    Path(island_id): Path<Uuid>,
) -> Result<(StatusCode, Json<IssuedToken>), SaunaError> {
    let issued = service.issue_token(island_id).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

pub async fn configure_device_handler<S: BookingStore, D: DeviceRepository>(
    State(service): State<DeviceSyncState<S, D>>,
    Json(payload): Json<ConfigureRequest>,
) -> Result<Json<DeviceSnapshot>, SaunaError> {
    handle_json_result(service.configure(payload).await)
}

pub async fn pull_handler<S: BookingStore, D: DeviceRepository>(
    State(service): State<DeviceSyncState<S, D>>,
    Json(payload): Json<PullRequest>,
) -> Result<Json<IslandRows>, SaunaError> {
    handle_json_result(service.pull(payload).await)
}

pub async fn push_handler<S: BookingStore, D: DeviceRepository>(
    State(service): State<DeviceSyncState<S, D>>,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, SaunaError> {
    handle_json_result(service.apply_push(payload).await)
}

// --- Terminal ---

pub type TerminalState<S> = Arc<OfflineReconciler<S>>;

#[derive(Debug, Deserialize)]
pub struct SetupTokenPayload {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct OnlinePayload {
    pub online: bool,
}

pub async fn device_status_handler<S: BookingStore>(
    State(reconciler): State<TerminalState<S>>,
) -> Result<Json<DeviceStatus>, SaunaError> {
    handle_json_result(reconciler.status().await)
}

/// Handler for binding the terminal to an island; starts background sync.
pub async fn configure_terminal_handler<S: BookingStore>(
    State(reconciler): State<TerminalState<S>>,
    Json(payload): Json<SetupTokenPayload>,
) -> Result<Json<DeviceStatus>, SaunaError> {
    reconciler.configure(&payload.token).await?;
    reconciler.start_background();
    handle_json_result(reconciler.status().await)
}

pub async fn sync_now_handler<S: BookingStore>(
    State(reconciler): State<TerminalState<S>>,
) -> Result<Json<SyncReport>, SaunaError> {
    handle_json_result(reconciler.sync_now().await)
}

pub async fn set_online_handler<S: BookingStore>(
    State(reconciler): State<TerminalState<S>>,
    Json(payload): Json<OnlinePayload>,
) -> Result<Json<DeviceStatus>, SaunaError> {
    reconciler.set_online(payload.online);
    handle_json_result(reconciler.status().await)
}

pub async fn factory_reset_handler<S: BookingStore>(
    State(reconciler): State<TerminalState<S>>,
) -> Result<Json<DeviceStatus>, SaunaError> {
    reconciler.factory_reset().await?;
    handle_json_result(reconciler.status().await)
}
