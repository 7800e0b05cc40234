//! # Publishing Configuration
//!
//! YAML-based configuration with per-environment overrides. Every section has
//! a complete default, so a missing section or field falls back to a working
//! value while present values are validated explicitly.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use publishing_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let slots = manager.config().scheduler.worker_slots;
//! let page_size = manager.config().history.page_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{
    DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_HISTORY_PAGE_SIZE, DEFAULT_SCHEDULER_ACTOR,
    DEFAULT_WORKER_SLOTS, TIMED_PUBLISHING_JOB,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingConfig {
    pub publishing: PublishingSettings,
    pub scheduler: SchedulerConfig,
    pub history: HistoryConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingSettings {
    /// Editor name recorded for scheduler-driven transitions
    pub scheduler_actor: String,
}

impl Default for PublishingSettings {
    fn default() -> Self {
        Self {
            scheduler_actor: DEFAULT_SCHEDULER_ACTOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of jobs running at once
    pub worker_slots: usize,
    pub poll_interval_ms: u64,
    /// Delay before a failed occurrence is retried
    pub retry_delay_seconds: u64,
    pub jobs: Vec<JobDefinition>,
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.retry_delay_seconds).unwrap_or(i64::MAX))
    }

    pub fn job(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_slots: DEFAULT_WORKER_SLOTS,
            poll_interval_ms: 1000,
            retry_delay_seconds: 60,
            jobs: vec![JobDefinition {
                name: TIMED_PUBLISHING_JOB.to_string(),
                cron: "0 * * * * *".to_string(),
                retries_on_fails: 3,
                enabled: true,
            }],
        }
    }
}

/// One cron-scheduled job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    /// Cron expression with a leading seconds field
    pub cron: String,
    #[serde(default)]
    pub retries_on_fails: u32,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub page_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_HISTORY_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl PublishingConfig {
    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.publishing.scheduler_actor.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "publishing.scheduler_actor",
                "publishing configuration",
            ));
        }

        if self.scheduler.worker_slots == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.worker_slots",
                "0",
                "worker slots must be greater than 0",
            ));
        }

        if self.scheduler.poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.poll_interval_ms",
                "0",
                "poll interval must be greater than 0",
            ));
        }

        let mut names = HashSet::new();
        for job in &self.scheduler.jobs {
            if job.name.is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    "scheduler.jobs[].name",
                    "scheduler configuration",
                ));
            }
            if !names.insert(job.name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    "scheduler.jobs[].name",
                    job.name.clone(),
                    "job names must be unique",
                ));
            }
            if let Err(err) = cron::Schedule::from_str(&job.cron) {
                return Err(ConfigurationError::invalid_value(
                    format!("scheduler.jobs.{}.cron", job.name),
                    job.cron.clone(),
                    err.to_string(),
                ));
            }
        }

        if self.history.page_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "history.page_size",
                "0",
                "page size must be greater than 0",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                "0",
                "channel capacity must be greater than 0",
            ));
        }

        Ok(())
    }
}
