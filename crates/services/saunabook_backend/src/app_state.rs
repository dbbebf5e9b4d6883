// --- File: crates/services/saunabook_backend/src/app_state.rs ---
use axum::{extract::State, routing::get, Json, Router};
use saunabook_booking::BookingService;
use saunabook_common::{Clock, SaunaError, SystemClock};
use saunabook_config::AppConfig;
use saunabook_db::{SqlStore, StoreFactory};
use saunabook_device::DeviceSyncService;
use saunabook_scheduler::ClubSaunaScheduler;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Services shared across all routes, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub booking: Arc<BookingService<SqlStore>>,
    pub scheduler: Arc<ClubSaunaScheduler<SqlStore>>,
    pub devices: Arc<DeviceSyncService<SqlStore, SqlStore>>,
}

impl AppState {
    /// Opens the store and wires every service to it.
    pub async fn build(config: Arc<AppConfig>) -> Result<Self, SaunaError> {
        let store = StoreFactory::new().from_app_config(&config).await?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let booking = BookingService::from_config(store.clone(), &config, clock.clone())?;
        let tz = booking.time_zone();
        let scheduler = ClubSaunaScheduler::from_config(booking.clone(), &config.club_sauna)?;
        let devices = DeviceSyncService::new(store.clone(), store, tz, clock);
        info!(time_zone = %tz, "Services ready");

        Ok(Self {
            config,
            booking: Arc::new(booking),
            scheduler: Arc::new(scheduler),
            devices: Arc::new(devices),
        })
    }

    /// All API routes, unprefixed.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .with_state(self.config.clone())
            .merge(saunabook_booking::routes::routes(self.booking.clone()))
            .merge(saunabook_scheduler::routes::routes(self.scheduler.clone()))
            .merge(saunabook_device::backend_routes(self.devices.clone()))
    }
}

async fn index(State(config): State<Arc<AppConfig>>) -> Json<Value> {
    Json(json!({
        "service": "saunabook",
        "version": env!("CARGO_PKG_VERSION"),
        "time_zone": config.time_zone,
    }))
}
