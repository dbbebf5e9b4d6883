// File: crates/saunabook_booking/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use saunabook_common::{
    handle_json_result, Reservation, SaunaError, SharedReservationParticipant,
};
use saunabook_db::BookingStore;
use std::sync::Arc;
use uuid::Uuid;

use crate::guard::BookingService;
use crate::logic::{
    CreateReservationRequest, DayQuery, NextSlot, SaunaDayOverview, SharedReservationView,
};
use crate::shared::{CreateSharedReservationRequest, JoinSharedReservationRequest};

/// State shared by the booking handlers.
pub type BookingState<S> = Arc<BookingService<S>>;

/// Handler for the next bookable hour of a sauna.
pub async fn next_available_handler<S: BookingStore>(
    State(service): State<BookingState<S>>,
    Path(sauna_id): Path<Uuid>,
) -> Result<Json<NextSlot>, SaunaError> {
    handle_json_result(service.next_available_for_sauna(sauna_id).await)
}

/// Handler for a sauna's bookings on one local day.
pub async fn day_overview_handler<S: BookingStore>(
    State(service): State<BookingState<S>>,
    Path(sauna_id): Path<Uuid>,
    Query(query): Query<DayQuery>,
) -> Result<Json<SaunaDayOverview>, SaunaError> {
    handle_json_result(service.sauna_day_overview(sauna_id, query.date).await)
}

pub async fn create_reservation_handler<S: BookingStore>(
    State(service): State<BookingState<S>>,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), SaunaError> {
    let reservation = service.create_reservation(payload).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn cancel_reservation_handler<S: BookingStore>(
    State(service): State<BookingState<S>>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<Reservation>, SaunaError> {
    handle_json_result(service.cancel_reservation(reservation_id).await)
}

pub async fn create_shared_handler<S: BookingStore>(
    State(service): State<BookingState<S>>,
    Json(payload): Json<CreateSharedReservationRequest>,
) -> Result<(StatusCode, Json<SharedReservationView>), SaunaError> {
    let view = service.create_shared(payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn shared_detail_handler<S: BookingStore>(
    State(service): State<BookingState<S>>,
    Path(shared_id): Path<Uuid>,
) -> Result<Json<SharedReservationView>, SaunaError> {
    handle_json_result(service.shared_detail(shared_id).await)
}

pub async fn join_shared_handler<S: BookingStore>(
    State(service): State<BookingState<S>>,
    Path(shared_id): Path<Uuid>,
    Json(payload): Json<JoinSharedReservationRequest>,
) -> Result<(StatusCode, Json<SharedReservationParticipant>), SaunaError> {
    let participant = service.join_shared(shared_id, payload).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}
