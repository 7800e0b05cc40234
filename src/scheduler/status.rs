//! Read models for the job status surface.

use crate::models::{JobState, ScheduledJob};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatusView {
    pub job_type: String,
    pub cron_expression: String,
    pub state: JobState,
    pub last_fire_time_utc: Option<DateTime<Utc>>,
    pub next_fire_time_utc: Option<DateTime<Utc>>,
    pub retries_on_fails: u32,
    pub count_of_failed_executions: u32,
}

impl From<&ScheduledJob> for JobStatusView {
    fn from(job: &ScheduledJob) -> Self {
        Self {
            job_type: job.name.clone(),
            cron_expression: job.cron_expression.clone(),
            state: job.state,
            last_fire_time_utc: job.last_fire_time_utc,
            next_fire_time_utc: job.next_fire_time_utc,
            retries_on_fails: job.retries_on_fails,
            count_of_failed_executions: job.count_of_failed_executions,
        }
    }
}

/// A job that is running right now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutingJobSnapshot {
    pub job_type: String,
    pub starting_time_utc: DateTime<Utc>,
    pub starting_time_local: DateTime<Local>,
    pub execution_time: Duration,
}

impl ExecutingJobSnapshot {
    pub fn new(job_type: impl Into<String>, started: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            job_type: job_type.into(),
            starting_time_utc: started,
            starting_time_local: started.with_timezone(&Local),
            execution_time: (now - started).to_std().unwrap_or_default(),
        }
    }
}
