//! # Failure Classification
//!
//! Splits errors raised while firing scheduled work into the two classes the
//! scheduler treats differently:
//!
//! - **JobProcess**: the job itself could not do its work (storage down,
//!   conflicting writes, programming errors). Counts against the job's retry
//!   budget and eventually pauses it.
//! - **ScheduledContent**: one entity's scheduled transition cannot be carried
//!   out because of its data. Logged per entity; the job stays healthy and the
//!   remaining entities are still processed.

use crate::error::PublishingError;
use crate::state_machine::{GuardError, StateMachineError};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    JobProcess,
    ScheduledContent,
}

impl FailureClass {
    pub fn counts_against_job(&self) -> bool {
        matches!(self, Self::JobProcess)
    }
}

pub fn classify(error: &PublishingError) -> FailureClass {
    match error {
        PublishingError::Store(StoreError::Corrupted(_)) => FailureClass::ScheduledContent,
        PublishingError::Store(_) => FailureClass::JobProcess,

        PublishingError::StateMachine(StateMachineError::Guard(GuardError::Store(store))) => {
            classify(&PublishingError::Store(store.clone()))
        }
        PublishingError::StateMachine(
            StateMachineError::InvalidTransition { .. }
            | StateMachineError::Guard(_)
            | StateMachineError::LanguageNotAvailable { .. },
        ) => FailureClass::ScheduledContent,
        PublishingError::StateMachine(_) => FailureClass::JobProcess,

        PublishingError::EntityNotFound { .. }
        | PublishingError::VersionNotFound(_)
        | PublishingError::RootNotFound(_)
        | PublishingError::EntityTypeMismatch { .. }
        | PublishingError::DraftAlreadyExists { .. }
        | PublishingError::FailedPublishNotFound(_)
        | PublishingError::InvalidRequest(_) => FailureClass::ScheduledContent,

        PublishingError::CheckerNotInitialized { .. }
        | PublishingError::Scheduler(_)
        | PublishingError::Configuration(_)
        | PublishingError::Serialization(_) => FailureClass::JobProcess,
    }
}
