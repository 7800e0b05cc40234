use thiserror::Error;

/// Errors raised by the scheduler engine itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job already registered: {0}")]
    DuplicateJob(String),

    #[error("Invalid cron expression '{expression}' for job {job}: {reason}")]
    InvalidCron {
        job: String,
        expression: String,
        reason: String,
    },

    #[error("Job {0} is running")]
    JobRunning(String),

    #[error("Scheduler is shutting down")]
    Shutdown,
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
