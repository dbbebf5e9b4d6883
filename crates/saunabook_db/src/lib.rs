//! Reservation store for saunabook
//!
//! This crate provides the store the booking core runs against. It is
//! database agnostic: the SQL store uses SQLx's `Any` driver (SQLite by
//! default, PostgreSQL through a feature flag), and an in-memory
//! store with identical semantics backs tests and embedded use.
//!
//! # Example
//!
//! ```rust,no_run
//! use saunabook_db::{BookingStore, BookingTransaction, StoreFactory};
//!
//! async fn open() -> Result<(), saunabook_db::DbError> {
//!     let store = StoreFactory::new().sqlite_memory("Europe/Helsinki").await?;
//!     let mut tx = store.begin().await?;
//!     let _saunas = tx.list_auto_club_saunas().await?;
//!     tx.commit().await
//! }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;
pub mod repository;

// Re-export the client, factory, and store traits for ease of use
pub use client::{DbClient, DbKind, DbTransaction};
pub use error::{DbError, UniqueKey};
pub use factory::StoreFactory;
pub use repositories::{MemoryStore, MemoryTransaction, SqlStore, SqlTransaction};
pub use repository::{BookingStore, BookingTransaction, DeviceRepository, SharedReservationFilter};
