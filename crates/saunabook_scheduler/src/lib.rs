// --- File: crates/saunabook_scheduler/src/lib.rs ---
//! Club sauna scheduling: a daily generator creating communal saunas on peak
//! days and a daily evaluator deciding which of them to keep.

pub mod calendar;
pub mod evaluator;
pub mod generator;
pub mod handlers;
pub mod job;
#[cfg(test)]
mod job_test;
pub mod routes;
pub mod scheduler;

pub use calendar::is_peak_day;
pub use evaluator::{evaluate_day, EvaluationPolicy, EvaluatorResult};
pub use generator::{generate_for_day, GeneratorResult, GeneratorSettings};
pub use job::{JobRunner, JobStatus};
pub use scheduler::{next_fire_time, ClubSaunaScheduler, JobKind, SchedulerStatus};
