// --- File: crates/saunabook_scheduler/src/routes.rs ---

use axum::{
    routing::{get, post},
    Router,
};
use saunabook_db::BookingStore;

use crate::handlers::{run_evaluator_handler, run_generator_handler, status_handler, SchedulerState};

/// Creates a router containing the scheduler trigger and status routes.
pub fn routes<S: BookingStore>(state: SchedulerState<S>) -> Router {
    Router::new()
        .route("/scheduler/generator/run", post(run_generator_handler::<S>))
        .route("/scheduler/evaluator/run", post(run_evaluator_handler::<S>))
        .route("/scheduler/status", get(status_handler::<S>))
        .with_state(state)
}
