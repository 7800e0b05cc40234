//! # Scheduler
//!
//! Cron-driven background jobs with per-job retry budgets, pause/resume and a
//! status surface. The built-in [`TimedPublishingJob`] drives scheduled
//! publishes and archives through the publishing service.

pub mod engine;
pub mod error_classifier;
pub mod errors;
pub mod handler;
pub mod status;
pub mod timed_publishing;

pub use engine::{FireResult, SchedulerEngine};
pub use error_classifier::{classify, FailureClass};
pub use errors::{SchedulerError, SchedulerResult};
pub use handler::{FireTrigger, JobContext, JobHandler, JobReport};
pub use status::{ExecutingJobSnapshot, JobStatusView};
pub use timed_publishing::TimedPublishingJob;
