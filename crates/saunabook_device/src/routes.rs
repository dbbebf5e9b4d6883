// --- File: crates/saunabook_device/src/routes.rs ---

use axum::{
    routing::{get, post},
    Router,
};
use saunabook_db::{BookingStore, DeviceRepository};

use crate::handlers::{
    configure_device_handler, configure_terminal_handler, device_status_handler,
    factory_reset_handler, issue_token_handler, pull_handler, push_handler, set_online_handler,
    sync_now_handler, DeviceSyncState, TerminalState,
};

/// Backend routes terminals talk to, plus the provisioning hook.
pub fn backend_routes<S: BookingStore, D: DeviceRepository>(
    state: DeviceSyncState<S, D>,
) -> Router {
    Router::new()
        .route(
            "/admin/islands/{island_id}/device-tokens",
            post(issue_token_handler::<S, D>),
        )
        .route("/devices/configure", post(configure_device_handler::<S, D>))
        .route("/devices/pull", post(pull_handler::<S, D>))
        .route("/devices/sync", post(push_handler::<S, D>))
        .with_state(state)
}

/// Routes served by the terminal itself.
pub fn terminal_routes<S: BookingStore>(state: TerminalState<S>) -> Router {
    Router::new()
        .route("/device/status", get(device_status_handler::<S>))
        .route("/device/configure", post(configure_terminal_handler::<S>))
        .route("/device/sync", post(sync_now_handler::<S>))
        .route("/device/online", post(set_online_handler::<S>))
        .route("/device/factory-reset", post(factory_reset_handler::<S>))
        .with_state(state)
}
