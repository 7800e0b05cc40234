//! # Data Models
//!
//! Content entities and their versions, per-language availability, raw history
//! operations, scheduled job state and failed scheduled publishes.

pub mod content;
pub mod entity;
pub mod failed_publish;
pub mod history;
pub mod language;
pub mod language_availability;
pub mod scheduled_job;
pub mod version;

pub use content::{
    description_text, ChannelContent, Description, DescriptionType, EntityContent,
    GeneralDescriptionContent, Include, OrganizationContent, Publishable, ServiceCollectionContent,
    ServiceContent,
};
pub use entity::{ChannelKind, EntityType, EntityVersion, ServiceKind, SubEntityType};
pub use failed_publish::FailedScheduledPublish;
pub use history::{
    ConnectionAction, ConnectionHistoryRecord, ConnectionOperation, CopyInfo, HistoryAction,
    HistoryPage, HistoryRecord, LanguageSnapshot, LanguageVersion, OperationRecord,
    SubOperationRecord,
};
pub use language::Language;
pub use language_availability::LanguageAvailability;
pub use scheduled_job::{FailureDisposition, JobState, ScheduledJob, SkipReason};
pub use version::Version;
