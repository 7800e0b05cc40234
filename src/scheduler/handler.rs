use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// What caused a fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireTrigger {
    /// The cron schedule (or a pending retry) came due
    Scheduled,
    /// An operator asked for an out-of-band run
    Forced,
}

/// Work run when a job fires.
///
/// Returning an error counts as a job-process failure against the job's retry
/// budget. Per-item problems the handler can live with belong in the report.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn execute(&self, context: JobContext) -> Result<JobReport>;
}

/// Per-fire context handed to a handler
#[derive(Debug, Clone)]
pub struct JobContext {
    job_name: String,
    fired_at: DateTime<Utc>,
    trigger: FireTrigger,
    shutdown: watch::Receiver<bool>,
}

impl JobContext {
    pub fn new(
        job_name: impl Into<String>,
        fired_at: DateTime<Utc>,
        trigger: FireTrigger,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            fired_at,
            trigger,
            shutdown,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn fired_at(&self) -> DateTime<Utc> {
        self.fired_at
    }

    pub fn trigger(&self) -> FireTrigger {
        self.trigger
    }

    /// Handlers check this between items and stop after the current one
    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Counts a handler reports for one fire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub processed: usize,
    pub succeeded: usize,
    /// Items whose content could not be transitioned; never counted against the job
    pub content_failures: usize,
    pub skipped: usize,
    /// Items that hit an infrastructure error
    pub job_errors: usize,
    /// Shutdown was requested before every item was handled
    pub interrupted: bool,
}
