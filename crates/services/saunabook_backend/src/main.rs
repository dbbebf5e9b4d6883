// File: crates/services/saunabook_backend/src/main.rs
mod app_state;

use app_state::AppState;
use axum::Router;
use saunabook_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(load_config()?);
    saunabook_common::logging::init();

    let state = AppState::build(config.clone()).await?;
    // The timers live as long as the process
    let _jobs = state.scheduler.spawn_daily_jobs();

    let app = Router::new()
        .nest("/api", state.router())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
