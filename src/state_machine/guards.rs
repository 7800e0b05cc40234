use super::errors::{GuardError, GuardResult};
use super::events::LanguageEvent;
use super::states::TargetState;
use crate::models::{EntityVersion, Language};
use crate::store::UnitOfWork;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Everything a guard may look at for one language transition
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub version: &'a EntityVersion,
    pub language: &'a Language,
    pub event: &'a LanguageEvent,
    pub target: &'a TargetState,
    pub at: DateTime<Utc>,
}

/// Trait for implementing state transition guards
#[async_trait]
pub trait StateGuard: Send + Sync {
    /// Check if a transition is allowed
    async fn check(&self, input: &GuardInput<'_>, uow: &dyn UnitOfWork) -> GuardResult<()>;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Guard rejecting timed transitions whose instant has already passed
pub struct FutureScheduleGuard;

#[async_trait]
impl StateGuard for FutureScheduleGuard {
    async fn check(&self, input: &GuardInput<'_>, _uow: &dyn UnitOfWork) -> GuardResult<()> {
        match input.event.scheduled_at() {
            Some(at) if at <= input.at => Err(GuardError::ScheduleInPast { at }),
            _ => Ok(()),
        }
    }

    fn description(&self) -> &'static str {
        "Scheduled instant must be in the future"
    }
}

/// Guard keeping at most one draft-like version per root and language
pub struct SingleDraftGuard;

#[async_trait]
impl StateGuard for SingleDraftGuard {
    async fn check(&self, input: &GuardInput<'_>, uow: &dyn UnitOfWork) -> GuardResult<()> {
        let becomes_draft = input.target.status.is_draft_like() || input.target.valid_from.is_some();
        let already_draft = input
            .version
            .availability(input.language)
            .is_some_and(|a| a.is_draft_like());

        if !becomes_draft || already_draft {
            return Ok(());
        }

        let siblings = uow.versions_of_root(input.version.root_id).await?;
        let conflict = siblings.iter().any(|other| {
            other.id != input.version.id
                && other
                    .availability(input.language)
                    .is_some_and(|a| a.is_draft_like())
        });

        if conflict {
            return Err(GuardError::DraftAlreadyExists {
                root_id: input.version.root_id,
                language: input.language.to_string(),
            });
        }

        Ok(())
    }

    fn description(&self) -> &'static str {
        "At most one draft version per language"
    }
}
