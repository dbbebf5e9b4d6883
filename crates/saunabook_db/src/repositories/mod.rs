//! Store implementations
//!
//! Both stores implement [`crate::BookingStore`] and [`crate::DeviceRepository`]
//! with the same semantics, including the uniqueness keys.

pub mod memory;
mod schema;
pub mod sql;

// Re-export the stores for ease of use
pub use memory::{MemoryStore, MemoryTransaction};
pub use sql::{SqlStore, SqlTransaction};
