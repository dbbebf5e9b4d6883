// --- File: crates/saunabook_booking/src/lib.rs ---
// Declare modules within this crate
pub mod guard;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
#[cfg(test)]
mod logic_test;
pub mod routes;
pub mod shared;
#[cfg(test)]
mod test_support;

pub use guard::BookingService;
pub use logic::{
    check_cancellable, next_available, BookingRules, CreateReservationRequest, NextSlot,
    SaunaDayOverview, SharedReservationView, SlotReason,
};
pub use shared::{
    gender_schedule, CreateSharedReservationRequest, GenderSchedule,
    JoinSharedReservationRequest,
};
