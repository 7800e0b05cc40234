//! # System Constants
//!
//! Event names, default actors and limits shared across the engine.

/// Lifecycle events published after a language transition commits
pub mod events {
    pub const LANGUAGE_DRAFT_SAVED: &str = "language.draft_saved";
    pub const LANGUAGE_PUBLISHED: &str = "language.published";
    pub const LANGUAGE_SCHEDULED: &str = "language.scheduled";
    pub const LANGUAGE_ARCHIVED: &str = "language.archived";
    pub const LANGUAGE_REMOVED: &str = "language.removed";
    pub const LANGUAGE_SUPERSEDED: &str = "language.superseded";
    pub const LANGUAGE_MODIFIED: &str = "language.modified";

    pub const SCHEDULED_PUBLISH_FAILED: &str = "scheduled_publish.failed";
    pub const JOB_FAILED: &str = "scheduler.job_failed";
    pub const JOB_PAUSED: &str = "scheduler.job_paused";
}

/// Editor recorded for transitions performed by the scheduler
pub const DEFAULT_SCHEDULER_ACTOR: &str = "scheduler";

/// Name of the built-in timed publish/archive job
pub const TIMED_PUBLISHING_JOB: &str = "timed_publishing";

pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 20;
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;
pub const DEFAULT_WORKER_SLOTS: usize = 4;
