// --- File: crates/saunabook_device/src/lib.rs ---
// Declare modules within this crate
pub mod handlers;
pub mod protocol;
pub mod reconcile;
#[cfg(test)]
mod reconcile_test;
pub mod reconciler;
pub mod routes;
pub mod server;
pub mod state;
pub mod token;
pub mod transport;

pub use protocol::{
    ConfigureRequest, DeviceSnapshot, IssuedToken, PullRequest, SyncRequest, SyncResponse,
};
pub use reconcile::{pending_changes, reconcile, DroppedRows, Reconciliation, SyncRow};
pub use reconciler::{DeviceStatus, OfflineReconciler, SyncReport, SyncSettings};
pub use routes::{backend_routes, terminal_routes};
pub use server::DeviceSyncService;
pub use state::{DevicePhase, DeviceState, StateFile};
pub use token::{generate_token, hash_token};
pub use transport::{BoxFuture, HttpSyncTransport, SyncTransport, TransportError};
