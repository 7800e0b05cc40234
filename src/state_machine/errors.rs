use super::events::LanguageEvent;
use super::states::PublishingStatus;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Error types for language state machine operations
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from:?} on {event}")]
    InvalidTransition { from: Option<String>, event: String },

    #[error("Guard condition failed: {0}")]
    Guard(#[from] GuardError),

    #[error("Action execution failed: {0}")]
    Action(#[from] ActionError),

    #[error("Language {language} has no content on version {version_id}")]
    LanguageNotAvailable { version_id: Uuid, language: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Guard condition failures
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Entity {root_id} already has a draft in {language}")]
    DraftAlreadyExists { root_id: Uuid, language: String },

    #[error("Scheduled instant {at} is not in the future")]
    ScheduleInPast { at: DateTime<Utc> },

    #[error("Business rule violation: {rule}")]
    BusinessRuleViolation { rule: String },

    #[error("Store error during guard check: {0}")]
    Store(#[from] StoreError),
}

/// Post-transition action failures
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type GuardResult<T> = Result<T, GuardError>;
pub type ActionResult<T> = Result<T, ActionError>;

/// Helper function to create invalid transition errors
pub fn invalid_transition(from: Option<PublishingStatus>, event: &LanguageEvent) -> StateMachineError {
    StateMachineError::InvalidTransition {
        from: from.map(|s| s.to_string()),
        event: event.event_type().to_string(),
    }
}

/// Helper function to create business rule violations
pub fn business_rule_violation(rule: impl Into<String>) -> GuardError {
    GuardError::BusinessRuleViolation { rule: rule.into() }
}
