// File: crates/saunabook_scheduler/src/handlers.rs
use axum::{extract::State, response::Json};
use saunabook_common::{handle_json_result, SaunaError};
use saunabook_db::BookingStore;
use std::sync::Arc;

use crate::evaluator::EvaluatorResult;
use crate::generator::GeneratorResult;
use crate::scheduler::{ClubSaunaScheduler, SchedulerStatus};

pub type SchedulerState<S> = Arc<ClubSaunaScheduler<S>>;

/// Handler for a manual generator run for today.
pub async fn run_generator_handler<S: BookingStore>(
    State(scheduler): State<SchedulerState<S>>,
) -> Result<Json<GeneratorResult>, SaunaError> {
    handle_json_result(scheduler.run_generator_now().await)
}

/// Handler for a manual evaluator run for today.
pub async fn run_evaluator_handler<S: BookingStore>(
    State(scheduler): State<SchedulerState<S>>,
) -> Result<Json<EvaluatorResult>, SaunaError> {
    handle_json_result(scheduler.run_evaluator_now().await)
}

pub async fn status_handler<S: BookingStore>(
    State(scheduler): State<SchedulerState<S>>,
) -> Json<SchedulerStatus> {
    Json(scheduler.status().await)
}
