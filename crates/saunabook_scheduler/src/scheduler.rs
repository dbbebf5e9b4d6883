// --- File: crates/saunabook_scheduler/src/scheduler.rs ---
//! The club sauna scheduler: both jobs, their manual triggers and their
//! daily timers.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use saunabook_booking::BookingService;
use saunabook_common::time::{local_day, local_instant, parse_hh_mm};
use saunabook_common::SaunaError;
use saunabook_config::ClubSaunaConfig;
use saunabook_db::BookingStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::evaluator::{evaluate_day, EvaluationPolicy, EvaluatorResult};
use crate::generator::{generate_for_day, GeneratorResult, GeneratorSettings};
use crate::job::{JobRunner, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Generator,
    Evaluator,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Generator => "club_sauna_generator",
            JobKind::Evaluator => "club_sauna_evaluator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub generator: JobStatus<GeneratorResult>,
    pub evaluator: JobStatus<EvaluatorResult>,
}

/// First instant strictly after `now` whose local time is `at`.
///
/// A local time skipped by a DST gap fires an hour later that day.
pub fn next_fire_time(now: DateTime<Utc>, at: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let today = local_day(now, tz);
    let candidate = local_instant(today, at, tz);
    if candidate > now {
        candidate
    } else {
        local_instant(today + ChronoDuration::days(1), at, tz)
    }
}

/// Constructed once per process and shared by `Arc`.
pub struct ClubSaunaScheduler<S: BookingStore> {
    service: BookingService<S>,
    settings: GeneratorSettings,
    policy: EvaluationPolicy,
    enabled: bool,
    generator_time: NaiveTime,
    evaluator_time: NaiveTime,
    generator: JobRunner<GeneratorResult>,
    evaluator: JobRunner<EvaluatorResult>,
}

impl<S: BookingStore> ClubSaunaScheduler<S> {
    pub fn new(
        service: BookingService<S>,
        settings: GeneratorSettings,
        policy: EvaluationPolicy,
        generator_time: NaiveTime,
        evaluator_time: NaiveTime,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            settings,
            policy,
            enabled: true,
            generator_time,
            evaluator_time,
            generator: JobRunner::new(JobKind::Generator.as_str(), timeout),
            evaluator: JobRunner::new(JobKind::Evaluator.as_str(), timeout),
        }
    }

    pub fn from_config(
        service: BookingService<S>,
        config: &ClubSaunaConfig,
    ) -> Result<Self, SaunaError> {
        let mut scheduler = Self::new(
            service,
            GeneratorSettings::try_from(&config.defaults)?,
            EvaluationPolicy::from(&config.evaluation),
            parse_hh_mm(&config.generator_time)?,
            parse_hh_mm(&config.evaluator_time)?,
            Duration::from_secs(config.job_timeout_secs),
        );
        scheduler.enabled = config.enabled;
        Ok(scheduler)
    }

    pub fn service(&self) -> &BookingService<S> {
        &self.service
    }

    /// The local date the jobs work on when triggered now.
    pub fn today(&self) -> NaiveDate {
        local_day(self.service.clock().now(), self.service.time_zone())
    }

    pub async fn run_generator_now(&self) -> Result<GeneratorResult, SaunaError> {
        self.run_generator_for(self.today()).await
    }

    pub async fn run_generator_for(&self, date: NaiveDate) -> Result<GeneratorResult, SaunaError> {
        let started_at = self.service.clock().now();
        self.generator
            .run(started_at, generate_for_day(&self.service, &self.settings, date))
            .await
    }

    pub async fn run_evaluator_now(&self) -> Result<EvaluatorResult, SaunaError> {
        self.run_evaluator_for(self.today()).await
    }

    pub async fn run_evaluator_for(&self, date: NaiveDate) -> Result<EvaluatorResult, SaunaError> {
        let started_at = self.service.clock().now();
        self.evaluator
            .run(started_at, evaluate_day(self.service.store(), &self.policy, date))
            .await
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            generator: self.generator.status().await,
            evaluator: self.evaluator.status().await,
        }
    }

    /// Runs `kind` for `date`, the local day of the scheduled instant.
    async fn fire(&self, kind: JobKind, date: NaiveDate) {
        let outcome = match kind {
            JobKind::Generator => self.run_generator_for(date).await.map(|r| format!("{:?}", r)),
            JobKind::Evaluator => self.run_evaluator_for(date).await.map(|r| format!("{:?}", r)),
        };
        match outcome {
            Ok(summary) => debug!(job = kind.as_str(), %date, %summary, "Scheduled run done"),
            // The failure is on the job status; the next day's run is unaffected
            Err(SaunaError::JobAlreadyRunning(_)) => {
                warn!(job = kind.as_str(), "Scheduled run skipped, a manual run is in progress")
            }
            Err(e) => error!(job = kind.as_str(), error = %e, "Scheduled run failed"),
        }
    }

    /// Starts the daily timers of both jobs.
    ///
    /// Returns no handles when club saunas are disabled.
    pub fn spawn_daily_jobs(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        if !self.enabled {
            info!("Club sauna scheduling disabled");
            return Vec::new();
        }
        vec![
            self.spawn_daily(JobKind::Generator, self.generator_time),
            self.spawn_daily(JobKind::Evaluator, self.evaluator_time),
        ]
    }

    fn spawn_daily(self: &Arc<Self>, kind: JobKind, at: NaiveTime) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let tz = self.service.time_zone();
        info!(job = kind.as_str(), at = %at, "Daily job scheduled");

        tokio::spawn(async move {
            let mut last_fired: Option<DateTime<Utc>> = None;
            loop {
                let now = scheduler.service.clock().now();
                // Never fire twice for the same instant
                let from = last_fired.map_or(now, |fired| fired.max(now));
                let next = next_fire_time(from, at, tz);
                let wait = (next - now).to_std().unwrap_or_default();
                debug!(job = kind.as_str(), next = %next, "Waiting for next run");

                tokio::time::sleep(wait).await;
                // The timer may wake before the wall clock reaches `next`
                scheduler.fire(kind, local_day(next, tz)).await;
                last_fired = Some(next);
            }
        })
    }
}
