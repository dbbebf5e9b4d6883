// --- File: crates/saunabook_booking/src/routes.rs ---

use axum::{
    routing::{get, post},
    Router,
};
use saunabook_db::BookingStore;

use crate::handlers::{
    cancel_reservation_handler, create_reservation_handler, create_shared_handler,
    day_overview_handler, join_shared_handler, next_available_handler, shared_detail_handler,
    BookingState,
};

/// Creates a router containing all booking routes, bound to one store.
pub fn routes<S: BookingStore>(state: BookingState<S>) -> Router {
    Router::new()
        .route(
            "/saunas/{sauna_id}/next-available",
            get(next_available_handler::<S>),
        )
        .route(
            "/saunas/{sauna_id}/reservations",
            get(day_overview_handler::<S>),
        )
        .route("/reservations", post(create_reservation_handler::<S>))
        .route(
            "/reservations/{reservation_id}/cancel",
            post(cancel_reservation_handler::<S>),
        )
        .route("/shared-reservations", post(create_shared_handler::<S>))
        .route(
            "/shared-reservations/{shared_id}",
            get(shared_detail_handler::<S>),
        )
        .route(
            "/shared-reservations/{shared_id}/join",
            post(join_shared_handler::<S>),
        )
        .with_state(state)
}
