// --- File: crates/saunabook_scheduler/src/job.rs ---
//! Run bookkeeping shared by the scheduler jobs.
//!
//! A [`JobRunner`] lets one run of its job in at a time, bounds each run by a
//! timeout and keeps the status of the last run.

use chrono::{DateTime, Utc};
use saunabook_common::SaunaError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Status of a job as of its last run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus<R> {
    pub is_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    /// Result of the last run, if it succeeded.
    pub last_result: Option<R>,
    /// Error of the last run, if it failed.
    pub error: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub run_count: u64,
}

impl<R> Default for JobStatus<R> {
    fn default() -> Self {
        Self {
            is_running: false,
            last_run: None,
            last_result: None,
            error: None,
            last_duration_ms: None,
            run_count: 0,
        }
    }
}

// Releases the running flag however the run ends.
struct Lease<'a>(&'a AtomicBool);

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct JobRunner<R> {
    name: &'static str,
    timeout: Duration,
    running: AtomicBool,
    status: Mutex<JobStatus<R>>,
}

impl<R: Clone + Send> JobRunner<R> {
    pub fn new(name: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            timeout,
            running: AtomicBool::new(false),
            status: Mutex::new(JobStatus::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> JobStatus<R> {
        let mut status = self.status.lock().await.clone();
        status.is_running = self.is_running();
        status
    }

    /// Runs `job` unless a run is already in progress.
    ///
    /// `started_at` is recorded as the run's `last_run`. Fails fast with
    /// `JobAlreadyRunning` while another run holds the job, and with
    /// `JobTimeout` when the run outlives the timeout; either way the
    /// outcome is recorded before it is returned.
    pub async fn run<F>(&self, started_at: DateTime<Utc>, job: F) -> Result<R, SaunaError>
    where
        F: Future<Output = Result<R, SaunaError>>,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(job = self.name, "Job is already running, trigger rejected");
            return Err(SaunaError::JobAlreadyRunning(self.name.to_string()));
        }
        let _lease = Lease(&self.running);

        info!(job = self.name, "Job started");
        let clock = tokio::time::Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, job).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SaunaError::JobTimeout(format!(
                "{} did not finish within {}s",
                self.name,
                self.timeout.as_secs()
            ))),
        };
        let elapsed = clock.elapsed();

        let mut status = self.status.lock().await;
        status.run_count += 1;
        status.last_run = Some(started_at);
        status.last_duration_ms = Some(elapsed.as_millis() as u64);
        match &outcome {
            Ok(result) => {
                status.last_result = Some(result.clone());
                status.error = None;
                info!(job = self.name, duration_ms = elapsed.as_millis() as u64, "Job finished");
            }
            Err(e) => {
                status.last_result = None;
                status.error = Some(e.to_string());
                error!(job = self.name, error = %e, "Job failed");
            }
        }
        outcome
    }
}
