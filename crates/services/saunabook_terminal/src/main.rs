// File: crates/services/saunabook_terminal/src/main.rs
use axum::Router;
use saunabook_booking::BookingService;
use saunabook_common::logging::init_with_file;
use saunabook_common::time::parse_time_zone;
use saunabook_common::{Clock, SystemClock};
use saunabook_config::{load_config, SECRET_FROM_ENV};
use saunabook_db::StoreFactory;
use saunabook_device::{
    terminal_routes, HttpSyncTransport, OfflineReconciler, StateFile, SyncSettings,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(load_config()?);
    let device = config
        .device
        .clone()
        .ok_or("missing [device] configuration section")?;

    let data_dir = PathBuf::from(&device.data_dir);
    tokio::fs::create_dir_all(&data_dir).await?;
    // Dropping the guard loses buffered log lines
    let _log_guard = init_with_file(Level::INFO, &data_dir.join("logs"), "terminal.log");

    let tz = parse_time_zone(&config.time_zone)?;
    let store = StoreFactory::new()
        .sqlite_file(&data_dir.join("replica.db"), &config.time_zone)
        .await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let booking = Arc::new(BookingService::from_config(
        store.clone(),
        &config,
        clock.clone(),
    )?);
    let transport = Arc::new(HttpSyncTransport::new(
        device.backend_url.clone(),
        Duration::from_secs(config.sync.request_timeout_secs),
    )?);
    let terminal = Arc::new(
        OfflineReconciler::open(
            store,
            tz,
            transport,
            clock,
            SyncSettings::from(&config.sync),
            StateFile::at(data_dir.join("device.json")),
            device.device_id.clone(),
        )
        .await?,
    );

    // Unattended provisioning: a token in the config configures a fresh terminal
    let token = device
        .setup_token
        .as_deref()
        .filter(|t| !t.trim().is_empty() && *t != SECRET_FROM_ENV);
    if let Some(token) = token {
        if !terminal.state().await.is_configured() {
            match terminal.configure(token).await {
                Ok(state) => info!(island_id = ?state.island_id, "Configured from setup token"),
                Err(e) => warn!(error = %e, "Configuration from setup token failed"),
            }
        }
    }
    terminal.start_background();

    let app = Router::new()
        .merge(saunabook_booking::routes::routes(booking))
        .merge(terminal_routes(terminal.clone()))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(backend = %device.backend_url, "Island terminal listening on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    terminal.stop_background();
    Ok(())
}
