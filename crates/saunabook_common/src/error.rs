use std::fmt;
use thiserror::Error;

/// The error type shared by every saunabook crate.
///
/// The first block of variants is the booking/scheduling/sync taxonomy that
/// callers discriminate on (each has a stable [`SaunaError::code`]); the last
/// three are plumbing failures that never carry a domain meaning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaunaError {
    /// Bad request shape: non-hour-aligned time, adults < 1, ...
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Boat already has a commitment on this island for the day")]
    DailyLimitExceeded,

    #[error("The requested slot is already taken")]
    SlotConflict,

    #[error("Boat has already joined this shared reservation")]
    AlreadyJoined,

    #[error("Too late to cancel the reservation")]
    TooLateToCancel,

    #[error("Reservation is already cancelled")]
    AlreadyCancelled,

    #[error("Reservation has already started")]
    AlreadyStarted,

    /// Unknown sauna, boat, reservation, device, ...
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("Job already running: {0}")]
    JobAlreadyRunning(String),

    #[error("Job timed out: {0}")]
    JobTimeout(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SaunaError {
    /// Machine readable error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            SaunaError::Validation(_) => "VALIDATION",
            SaunaError::DailyLimitExceeded => "DAILY_LIMIT_EXCEEDED",
            SaunaError::SlotConflict => "SLOT_CONFLICT",
            SaunaError::AlreadyJoined => "ALREADY_JOINED",
            SaunaError::TooLateToCancel => "TOO_LATE_TO_CANCEL",
            SaunaError::AlreadyCancelled => "ALREADY_CANCELLED",
            SaunaError::AlreadyStarted => "ALREADY_STARTED",
            SaunaError::NotFound(_) => "NOT_FOUND",
            SaunaError::SyncFailed(_) => "SYNC_FAILED",
            SaunaError::JobAlreadyRunning(_) => "JOB_ALREADY_RUNNING",
            SaunaError::JobTimeout(_) => "JOB_TIMEOUT",
            SaunaError::Database(_) => "DATABASE",
            SaunaError::Config(_) => "CONFIG",
            SaunaError::Internal(_) => "INTERNAL",
        }
    }

    /// The reason shown next to a rejected cancellation, if this is one.
    pub fn cancel_reason(&self) -> Option<&'static str> {
        match self {
            SaunaError::AlreadyCancelled => Some("already_cancelled"),
            SaunaError::TooLateToCancel => Some("too_late"),
            SaunaError::AlreadyStarted => Some("already_started"),
            _ => None,
        }
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for SaunaError {
    fn status_code(&self) -> u16 {
        match self {
            SaunaError::Validation(_) => 400,
            SaunaError::DailyLimitExceeded => 409,
            SaunaError::SlotConflict => 409,
            SaunaError::AlreadyJoined => 409,
            SaunaError::TooLateToCancel => 422,
            SaunaError::AlreadyCancelled => 422,
            SaunaError::AlreadyStarted => 422,
            SaunaError::NotFound(_) => 404,
            SaunaError::SyncFailed(_) => 502,
            SaunaError::JobAlreadyRunning(_) => 409,
            SaunaError::JobTimeout(_) => 504,
            SaunaError::Database(_) => 500,
            SaunaError::Config(_) => 500,
            SaunaError::Internal(_) => 500,
        }
    }
}

/// A trait for adding context to foreign errors while turning them into
/// [`SaunaError::Internal`].
pub trait Context<T, E> {
    fn context<C>(self, context: C) -> Result<T, SaunaError>
    where
        C: fmt::Display + Send + Sync + 'static;

    fn with_context<C, F>(self, f: F) -> Result<T, SaunaError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: std::error::Error + Send + Sync + 'static> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, SaunaError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| SaunaError::Internal(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, SaunaError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| SaunaError::Internal(format!("{}: {}", f(), error)))
    }
}

impl From<serde_json::Error> for SaunaError {
    fn from(err: serde_json::Error) -> Self {
        SaunaError::Internal(format!("serialization failed: {}", err))
    }
}

impl From<std::io::Error> for SaunaError {
    fn from(err: std::io::Error) -> Self {
        SaunaError::Internal(err.to_string())
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> SaunaError {
    SaunaError::Validation(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> SaunaError {
    SaunaError::NotFound(message.to_string())
}

pub fn config_error<T: fmt::Display>(message: T) -> SaunaError {
    SaunaError::Config(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> SaunaError {
    SaunaError::Internal(message.to_string())
}
