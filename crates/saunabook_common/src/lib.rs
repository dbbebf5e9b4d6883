// --- File: crates/saunabook_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error taxonomy
pub mod http; // Axum error responses
pub mod logging; // Logging initialisation
pub mod models; // Domain entities
pub mod time; // Calendar helpers and clocks

// Re-export error types and utilities for easier access
pub use error::{
    config_error, internal_error, not_found, validation_error, Context, HttpStatusCode,
    SaunaError,
};

pub use http::{handle_json_result, IntoHttpResponse};

pub use logging::{init, init_with_file, init_with_level};

pub use models::{
    Boat, Club, GenderOrder, Island, IslandDevice, IslandDirectory, IslandRows, Reservation,
    ReservationStatus, Sauna, SharedReservation, SharedReservationParticipant, TimeRange,
};

pub use time::{Clock, FixedClock, SystemClock};
