//! Error types for the publishing engine.
//!
//! Validation failures are not errors: checkers report them as messages and the
//! publishing service returns them as a rejected outcome. What ends up here is
//! data-integrity breakage, infrastructure failure and programming errors.

use crate::config::ConfigurationError;
use crate::models::EntityType;
use crate::scheduler::SchedulerError;
use crate::state_machine::StateMachineError;
use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PublishingError {
    #[error("{entity_type} {id} not found")]
    EntityNotFound { entity_type: EntityType, id: Uuid },

    #[error("Entity version {0} not found")]
    VersionNotFound(Uuid),

    #[error("Entity root {0} has no versions")]
    RootNotFound(Uuid),

    #[error("Entity {id} is a {actual}, expected {expected}")]
    EntityTypeMismatch {
        id: Uuid,
        expected: EntityType,
        actual: EntityType,
    },

    #[error("Publishing checker for {entity_type} was used before init")]
    CheckerNotInitialized { entity_type: EntityType },

    #[error("Entity {root_id} already has a draft version ({language})")]
    DraftAlreadyExists { root_id: Uuid, language: String },

    #[error("Failed scheduled publish record {0} not found")]
    FailedPublishNotFound(Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PublishingError {
    /// A referenced row is missing or has the wrong shape. Never converted into
    /// a validation message.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::EntityNotFound { .. }
                | Self::VersionNotFound(_)
                | Self::RootNotFound(_)
                | Self::EntityTypeMismatch { .. }
        ) || matches!(self, Self::Store(StoreError::Corrupted(_)))
    }

    /// Transient failures of the storage layer (the only I/O this engine does).
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Unavailable(_)) | Self::Store(StoreError::Conflict(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, PublishingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let missing = PublishingError::EntityNotFound {
            entity_type: EntityType::Service,
            id: Uuid::nil(),
        };
        assert!(missing.is_data_integrity());
        assert!(!missing.is_infrastructure());

        let down = PublishingError::Store(StoreError::Unavailable("pool closed".into()));
        assert!(down.is_infrastructure());
        assert!(!down.is_data_integrity());
    }

    #[test]
    fn test_display() {
        let err = PublishingError::CheckerNotInitialized {
            entity_type: EntityType::Channel,
        };
        assert_eq!(
            err.to_string(),
            "Publishing checker for channel was used before init"
        );
    }
}
