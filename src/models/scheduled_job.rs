//! # Scheduled Job State
//!
//! Execution bookkeeping for one named job. The record is mutated on every fire
//! attempt and is not versioned.
//!
//! ```text
//! Waiting ──fire──▶ Running ──ok──────────────────────────▶ Waiting (failures = 0)
//!                      │
//!                      └──error──▶ failures <= retries ──▶ Waiting (retry soon)
//!                                  failures >  retries ──▶ Paused
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Running,
    Paused,
}

/// Why a fire request did not start a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyRunning,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Retries remain; the job fires again at the given instant
    Retry { at: DateTime<Utc> },
    /// Retry budget exhausted; manual intervention required
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub name: String,
    pub cron_expression: String,
    pub state: JobState,
    pub last_fire_time_utc: Option<DateTime<Utc>>,
    pub next_fire_time_utc: Option<DateTime<Utc>>,
    pub retries_on_fails: u32,
    pub count_of_failed_executions: u32,
}

impl ScheduledJob {
    pub fn new(
        name: impl Into<String>,
        cron_expression: impl Into<String>,
        retries_on_fails: u32,
        next_fire_time_utc: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            name: name.into(),
            cron_expression: cron_expression.into(),
            state: JobState::Waiting,
            last_fire_time_utc: None,
            next_fire_time_utc,
            retries_on_fails,
            count_of_failed_executions: 0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == JobState::Waiting && self.next_fire_time_utc.is_some_and(|next| next <= now)
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    /// Claim the job for a run. A running job is never claimed twice; a paused
    /// job only runs when forced.
    pub fn begin_run(&mut self, forced: bool) -> Result<(), SkipReason> {
        match self.state {
            JobState::Running => Err(SkipReason::AlreadyRunning),
            JobState::Paused if !forced => Err(SkipReason::Paused),
            _ => {
                self.state = JobState::Running;
                Ok(())
            }
        }
    }

    pub fn record_success(&mut self, fired_at: DateTime<Utc>, next_fire: Option<DateTime<Utc>>) {
        self.state = JobState::Waiting;
        self.count_of_failed_executions = 0;
        self.last_fire_time_utc = Some(fired_at);
        self.next_fire_time_utc = next_fire;
    }

    pub fn record_failure(
        &mut self,
        fired_at: DateTime<Utc>,
        retry_at: DateTime<Utc>,
        next_occurrence: Option<DateTime<Utc>>,
    ) -> FailureDisposition {
        self.count_of_failed_executions += 1;
        self.last_fire_time_utc = Some(fired_at);

        if self.count_of_failed_executions > self.retries_on_fails {
            self.state = JobState::Paused;
            self.next_fire_time_utc = next_occurrence;
            FailureDisposition::Paused
        } else {
            self.state = JobState::Waiting;
            self.next_fire_time_utc = Some(retry_at);
            FailureDisposition::Retry { at: retry_at }
        }
    }

    pub fn pause(&mut self) {
        self.state = JobState::Paused;
    }

    /// Resume a paused job with a fresh retry budget
    pub fn resume(&mut self, next_fire: Option<DateTime<Utc>>) {
        self.state = JobState::Waiting;
        self.count_of_failed_executions = 0;
        self.next_fire_time_utc = next_fire;
    }
}
