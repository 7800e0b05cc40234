//! # Scheduler Engine
//!
//! Cron-driven job runner. Each registered job keeps a [`ScheduledJob`] record
//! (state, fire times, retry budget) that the engine mutates on every fire.
//!
//! ## Guarantees
//!
//! - A job never has two concurrent runs: a fire that finds it `Running` is
//!   skipped, not queued.
//! - At most `worker_slots` jobs run at once.
//! - A failing or panicking handler never takes the engine down; the failure is
//!   recorded against the job and retried after `retry_delay` until the retry
//!   budget is exhausted, at which point the job is paused.
//! - `shutdown` stops polling; fires already in flight finish first and their
//!   handlers observe the request through [`JobContext::shutdown_requested`].

use super::errors::{SchedulerError, SchedulerResult};
use super::handler::{FireTrigger, JobContext, JobHandler, JobReport};
use super::status::{ExecutingJobSnapshot, JobStatusView};
use crate::config::{JobDefinition, SchedulerConfig};
use crate::constants::events;
use crate::events::EventPublisher;
use crate::logging::{log_error, log_job_operation};
use crate::models::{FailureDisposition, JobState, ScheduledJob, SkipReason};
use chrono::{DateTime, Utc};
use cron::Schedule;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Result of one fire request
#[derive(Debug, Clone, PartialEq)]
pub enum FireResult {
    Completed(JobReport),
    Failed {
        disposition: FailureDisposition,
        error: String,
    },
    Skipped(SkipReason),
}

struct JobSlot {
    schedule: Schedule,
    handler: Arc<dyn JobHandler>,
    state: Mutex<ScheduledJob>,
    started_at: Mutex<Option<DateTime<Utc>>>,
}

impl JobSlot {
    fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

pub struct SchedulerEngine {
    jobs: DashMap<String, Arc<JobSlot>>,
    permits: Arc<Semaphore>,
    retry_delay: chrono::Duration,
    poll_interval: Duration,
    shutdown: watch::Sender<bool>,
    event_publisher: EventPublisher,
}

impl SchedulerEngine {
    pub fn new(worker_slots: usize, poll_interval: Duration, retry_delay: chrono::Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            jobs: DashMap::new(),
            permits: Arc::new(Semaphore::new(worker_slots.max(1))),
            retry_delay,
            poll_interval,
            shutdown,
            event_publisher: EventPublisher::default(),
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.worker_slots, config.poll_interval(), config.retry_delay())
    }

    pub fn with_event_publisher(mut self, event_publisher: EventPublisher) -> Self {
        self.event_publisher = event_publisher;
        self
    }

    /// Register a job. Disabled definitions are registered paused.
    pub fn register(
        &self,
        definition: JobDefinition,
        handler: Arc<dyn JobHandler>,
    ) -> SchedulerResult<()> {
        let schedule =
            Schedule::from_str(&definition.cron).map_err(|e| SchedulerError::InvalidCron {
                job: definition.name.clone(),
                expression: definition.cron.clone(),
                reason: e.to_string(),
            })?;

        match self.jobs.entry(definition.name.clone()) {
            Entry::Occupied(_) => Err(SchedulerError::DuplicateJob(definition.name)),
            Entry::Vacant(entry) => {
                let next = schedule.after(&Utc::now()).next();
                let mut job = ScheduledJob::new(
                    definition.name.clone(),
                    definition.cron.clone(),
                    definition.retries_on_fails,
                    next,
                );
                if !definition.enabled {
                    job.pause();
                }

                log_job_operation(
                    "register",
                    &definition.name,
                    &format!("{:?}", job.state),
                    0,
                    Some(&definition.cron),
                );

                entry.insert(Arc::new(JobSlot {
                    schedule,
                    handler,
                    state: Mutex::new(job),
                    started_at: Mutex::new(None),
                }));
                Ok(())
            }
        }
    }

    /// Register the configured definition named `name`
    pub fn register_configured(
        &self,
        config: &SchedulerConfig,
        name: &str,
        handler: Arc<dyn JobHandler>,
    ) -> SchedulerResult<()> {
        let definition = config
            .job(name)
            .cloned()
            .ok_or_else(|| SchedulerError::JobNotFound(name.to_string()))?;
        self.register(definition, handler)
    }

    /// Fire every waiting job that is due at `now`, concurrently
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<(String, SchedulerResult<FireResult>)> {
        let due: Vec<String> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().state.lock().is_due(now))
            .map(|entry| entry.key().clone())
            .collect();

        if due.is_empty() {
            return Vec::new();
        }
        debug!(due = due.len(), "Scheduler tick firing due jobs");

        let fires = due
            .iter()
            .map(|name| self.fire(name, now, FireTrigger::Scheduled));
        let results = futures::future::join_all(fires).await;
        due.into_iter().zip(results).collect()
    }

    /// Run a job now regardless of its schedule
    pub async fn force(&self, name: &str) -> SchedulerResult<FireResult> {
        self.fire(name, Utc::now(), FireTrigger::Forced).await
    }

    /// Fire one job. A running job is skipped; a paused job is skipped unless
    /// forced, and a forced run leaves it paused.
    pub async fn fire(
        &self,
        name: &str,
        now: DateTime<Utc>,
        trigger: FireTrigger,
    ) -> SchedulerResult<FireResult> {
        let slot = self.slot(name)?;

        let previous_state = {
            let mut job = slot.state.lock();
            let previous = job.state;
            if let Err(reason) = job.begin_run(trigger == FireTrigger::Forced) {
                debug!(job_name = %name, reason = ?reason, "Fire skipped");
                return Ok(FireResult::Skipped(reason));
            }
            previous
        };

        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                slot.state.lock().state = previous_state;
                return Err(SchedulerError::Shutdown);
            }
        };

        *slot.started_at.lock() = Some(Utc::now());
        log_job_operation("fire", name, "running", slot.state.lock().count_of_failed_executions, None);

        let context = JobContext::new(name, now, trigger, self.shutdown.subscribe());
        let handler = Arc::clone(&slot.handler);
        let outcome = tokio::spawn(async move { handler.execute(context).await }).await;

        *slot.started_at.lock() = None;

        let error = match outcome {
            Ok(Ok(report)) => {
                let next = slot.next_occurrence(now);
                let failures = {
                    let mut job = slot.state.lock();
                    job.record_success(now, next);
                    if previous_state == JobState::Paused {
                        job.pause();
                    }
                    job.count_of_failed_executions
                };
                info!(
                    job_name = %name,
                    processed = report.processed,
                    succeeded = report.succeeded,
                    content_failures = report.content_failures,
                    "Job completed"
                );
                log_job_operation("complete", name, "waiting", failures, None);
                return Ok(FireResult::Completed(report));
            }
            Ok(Err(err)) => err.to_string(),
            Err(join_error) if join_error.is_panic() => "job handler panicked".to_string(),
            Err(_) => "job handler was cancelled".to_string(),
        };

        let result = self.record_failure(name, &slot, now, error);
        if previous_state == JobState::Paused {
            slot.state.lock().pause();
        }
        Ok(result)
    }

    fn record_failure(
        &self,
        name: &str,
        slot: &JobSlot,
        now: DateTime<Utc>,
        error: String,
    ) -> FireResult {
        let retry_at = now + self.retry_delay;
        let next_occurrence = slot.next_occurrence(now);
        let (disposition, failures) = {
            let mut job = slot.state.lock();
            let disposition = job.record_failure(now, retry_at, next_occurrence);
            (disposition, job.count_of_failed_executions)
        };

        log_error("scheduler", name, &error, Some(&format!("failed_executions={failures}")));
        self.event_publisher.publish(
            events::JOB_FAILED,
            json!({ "job": name, "error": error, "failed_executions": failures }),
        );

        match disposition {
            FailureDisposition::Retry { at } => {
                log_job_operation("retry_scheduled", name, "waiting", failures, Some(&at.to_rfc3339()));
            }
            FailureDisposition::Paused => {
                warn!(job_name = %name, failed_executions = failures, "Retry budget exhausted, job paused");
                self.event_publisher.publish(
                    events::JOB_PAUSED,
                    json!({ "job": name, "failed_executions": failures }),
                );
            }
        }

        FireResult::Failed { disposition, error }
    }

    /// Pause a waiting job or resume a paused one
    pub fn toggle(&self, name: &str) -> SchedulerResult<JobState> {
        let slot = self.slot(name)?;
        let mut job = slot.state.lock();
        match job.state {
            JobState::Running => return Err(SchedulerError::JobRunning(name.to_string())),
            JobState::Waiting => job.pause(),
            JobState::Paused => job.resume(slot.next_occurrence(Utc::now())),
        }
        log_job_operation("toggle", name, &format!("{:?}", job.state), job.count_of_failed_executions, None);
        Ok(job.state)
    }

    pub fn job(&self, name: &str) -> SchedulerResult<ScheduledJob> {
        Ok(self.slot(name)?.state.lock().clone())
    }

    pub fn status(&self) -> Vec<JobStatusView> {
        let mut views: Vec<JobStatusView> = self
            .jobs
            .iter()
            .map(|entry| JobStatusView::from(&*entry.value().state.lock()))
            .collect();
        views.sort_by(|a, b| a.job_type.cmp(&b.job_type));
        views
    }

    pub fn executing(&self) -> Vec<ExecutingJobSnapshot> {
        let now = Utc::now();
        let mut running: Vec<ExecutingJobSnapshot> = self
            .jobs
            .iter()
            .filter_map(|entry| {
                let started = (*entry.value().started_at.lock())?;
                Some(ExecutingJobSnapshot::new(entry.key().clone(), started, now))
            })
            .collect();
        running.sort_by(|a, b| a.job_type.cmp(&b.job_type));
        running
    }

    /// Poll for due jobs until `shutdown` is called
    pub async fn run(&self) -> SchedulerResult<()> {
        let mut shutdown = self.shutdown.subscribe();
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            jobs = self.jobs.len(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Scheduler started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.tick(Utc::now()).await;
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// Ask `run` and every running handler to stop
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn slot(&self, name: &str) -> SchedulerResult<Arc<JobSlot>> {
        self.jobs
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SchedulerError::JobNotFound(name.to_string()))
    }
}

impl Default for SchedulerEngine {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishingError;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct CountingHandler {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn execute(&self, _context: JobContext) -> crate::error::Result<JobReport> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PublishingError::Store(StoreError::Unavailable("down".into())));
            }
            Ok(JobReport::default())
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl JobHandler for PanickingHandler {
        async fn execute(&self, _context: JobContext) -> crate::error::Result<JobReport> {
            panic!("handler bug");
        }
    }

    fn definition(name: &str, retries: u32) -> JobDefinition {
        JobDefinition {
            name: name.to_string(),
            cron: "0 * * * * *".to_string(),
            retries_on_fails: retries,
            enabled: true,
        }
    }

    fn engine() -> SchedulerEngine {
        SchedulerEngine::new(2, Duration::from_millis(10), chrono::Duration::seconds(30))
    }

    #[test]
    fn test_register_rejects_bad_cron_and_duplicates() {
        let engine = engine();
        let handler = Arc::new(CountingHandler { runs: AtomicUsize::new(0), fail: false });

        let mut bad = definition("bad", 0);
        bad.cron = "not a cron".to_string();
        assert!(matches!(
            engine.register(bad, handler.clone()),
            Err(SchedulerError::InvalidCron { .. })
        ));

        engine.register(definition("job", 0), handler.clone()).unwrap();
        assert_eq!(
            engine.register(definition("job", 0), handler),
            Err(SchedulerError::DuplicateJob("job".to_string()))
        );
        assert!(engine.job("job").unwrap().next_fire_time_utc.is_some());
    }

    #[tokio::test]
    async fn test_success_resets_failures_and_schedules_next_occurrence() {
        let engine = engine();
        let handler = Arc::new(CountingHandler { runs: AtomicUsize::new(0), fail: false });
        engine.register(definition("job", 1), handler.clone()).unwrap();

        let now = Utc::now();
        let result = engine.fire("job", now, FireTrigger::Scheduled).await.unwrap();
        assert_eq!(result, FireResult::Completed(JobReport::default()));

        let job = engine.job("job").unwrap();
        assert_eq!(job.state, JobState::Waiting);
        assert_eq!(job.last_fire_time_utc, Some(now));
        assert!(job.next_fire_time_utc.is_some_and(|next| next > now));
        assert_eq!(handler.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_retry_then_pause() {
        let engine = engine();
        let handler = Arc::new(CountingHandler { runs: AtomicUsize::new(0), fail: true });
        engine.register(definition("job", 1), handler).unwrap();

        let now = Utc::now();
        let first = engine.fire("job", now, FireTrigger::Scheduled).await.unwrap();
        assert!(matches!(
            first,
            FireResult::Failed { disposition: FailureDisposition::Retry { at }, .. }
                if at == now + chrono::Duration::seconds(30)
        ));
        assert_eq!(engine.job("job").unwrap().count_of_failed_executions, 1);

        let second = engine.fire("job", now, FireTrigger::Scheduled).await.unwrap();
        assert!(matches!(
            second,
            FireResult::Failed { disposition: FailureDisposition::Paused, .. }
        ));
        assert_eq!(engine.job("job").unwrap().state, JobState::Paused);

        // Paused jobs only run when forced
        let skipped = engine.fire("job", now, FireTrigger::Scheduled).await.unwrap();
        assert_eq!(skipped, FireResult::Skipped(SkipReason::Paused));

        assert_eq!(engine.toggle("job").unwrap(), JobState::Waiting);
        assert_eq!(engine.job("job").unwrap().count_of_failed_executions, 0);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_a_job_failure() {
        let engine = engine();
        engine.register(definition("job", 3), Arc::new(PanickingHandler)).unwrap();

        let result = engine.force("job").await.unwrap();
        match result {
            FireResult::Failed { error, .. } => assert_eq!(error, "job handler panicked"),
            other => panic!("unexpected result: {other:?}"),
        }
        let job = engine.job("job").unwrap();
        assert_eq!(job.state, JobState::Waiting);
        assert_eq!(job.count_of_failed_executions, 1);
    }

    #[tokio::test]
    async fn test_forced_run_keeps_paused_job_paused() {
        let engine = engine();
        let handler = Arc::new(CountingHandler { runs: AtomicUsize::new(0), fail: false });
        let mut paused = definition("job", 0);
        paused.enabled = false;
        engine.register(paused, handler.clone()).unwrap();
        assert_eq!(engine.job("job").unwrap().state, JobState::Paused);

        let result = engine.force("job").await.unwrap();
        assert!(matches!(result, FireResult::Completed(_)));
        assert_eq!(handler.runs.load(Ordering::SeqCst), 1);

        let job = engine.job("job").unwrap();
        assert_eq!(job.state, JobState::Paused);
        assert!(job.last_fire_time_utc.is_some());
    }

    struct BlockingHandler {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl JobHandler for BlockingHandler {
        async fn execute(&self, _context: JobContext) -> crate::error::Result<JobReport> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(JobReport::default())
        }
    }

    #[tokio::test]
    async fn test_toggle_refuses_running_job_and_executing_lists_it() {
        let engine = Arc::new(engine());
        let handler = Arc::new(BlockingHandler {
            started: Notify::new(),
            release: Notify::new(),
        });
        engine.register(definition("job", 0), handler.clone()).unwrap();

        let running = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.force("job").await })
        };
        handler.started.notified().await;

        assert_eq!(engine.executing().len(), 1);
        assert_eq!(engine.executing()[0].job_type, "job");
        assert_eq!(
            engine.toggle("job"),
            Err(SchedulerError::JobRunning("job".to_string()))
        );

        handler.release.notify_one();
        running.await.unwrap().unwrap();
        assert!(engine.executing().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_after_shutdown() {
        let engine = Arc::new(engine());
        let runner = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.run().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        engine.shutdown();
        runner.await.unwrap().unwrap();
        assert!(engine.is_shutting_down());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let engine = engine();
        assert_eq!(
            engine.force("missing").await,
            Err(SchedulerError::JobNotFound("missing".to_string()))
        );
    }
}
