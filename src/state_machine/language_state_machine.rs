use super::{
    actions::{LogTransitionAction, PublishTransitionEventAction, StateAction},
    errors::{invalid_transition, StateMachineError, StateMachineResult},
    events::LanguageEvent,
    guards::{FutureScheduleGuard, GuardInput, SingleDraftGuard, StateGuard},
    states::{PublishingStatus, TargetState},
};
use crate::events::EventPublisher;
use crate::models::{EntityType, EntityVersion, Language, LanguageAvailability};
use crate::store::UnitOfWork;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One applied language transition
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageTransition {
    pub version_id: Uuid,
    pub root_id: Uuid,
    pub entity_type: EntityType,
    pub language: Language,
    pub from: Option<PublishingStatus>,
    pub to: TargetState,
    pub event: LanguageEvent,
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Per-language publishing state machine.
///
/// Transitions mutate only the given language of the given version; persisting
/// the result and running the post-commit actions is left to the caller so
/// several languages can share one unit of work.
pub struct LanguageStateMachine {
    guards: Vec<Box<dyn StateGuard>>,
    actions: Vec<Box<dyn StateAction>>,
}

impl LanguageStateMachine {
    pub fn new(event_publisher: EventPublisher) -> Self {
        Self {
            guards: vec![Box::new(FutureScheduleGuard), Box::new(SingleDraftGuard)],
            actions: vec![
                Box::new(PublishTransitionEventAction::new(event_publisher)),
                Box::new(LogTransitionAction),
            ],
        }
    }

    /// Determine the target state based on the current availability and event
    pub fn determine_target_state(
        current: Option<&LanguageAvailability>,
        event: &LanguageEvent,
    ) -> StateMachineResult<TargetState> {
        use PublishingStatus::*;

        let status = current.map(|a| a.status);
        let scheduled_publish = current.is_some_and(LanguageAvailability::is_scheduled_publish);
        let scheduled_archive = current.is_some_and(LanguageAvailability::is_scheduled_archive);

        let target = match (status, event) {
            (None | Some(Draft), LanguageEvent::SaveDraft) => TargetState::settled(Draft),
            (Some(Modified), LanguageEvent::SaveDraft) => TargetState::settled(Modified),

            (Some(Draft | Modified), LanguageEvent::Publish) => TargetState::settled(Published),
            (Some(Scheduled), LanguageEvent::Publish) if scheduled_publish => {
                TargetState::settled(Published)
            }

            (Some(Draft | Modified), LanguageEvent::SchedulePublish(at)) => {
                TargetState::scheduled_publish(*at)
            }
            (Some(Scheduled), LanguageEvent::SchedulePublish(at)) if scheduled_publish => {
                TargetState::scheduled_publish(*at)
            }

            (Some(Published), LanguageEvent::ScheduleArchive(at)) => {
                TargetState::scheduled_archive(*at)
            }
            (Some(Scheduled), LanguageEvent::ScheduleArchive(at)) if scheduled_archive => {
                TargetState::scheduled_archive(*at)
            }

            (Some(Scheduled), LanguageEvent::CancelSchedule) if scheduled_publish => {
                TargetState::settled(Draft)
            }
            (Some(Scheduled), LanguageEvent::CancelSchedule) if scheduled_archive => {
                TargetState::settled(Published)
            }

            (Some(Draft | Modified | Published | Scheduled), LanguageEvent::Archive) => {
                TargetState::settled(Archived)
            }
            (Some(Archived), LanguageEvent::Restore) => TargetState::settled(Draft),
            (Some(Published), LanguageEvent::Withdraw) => TargetState::settled(Draft),
            (Some(Draft | Modified | Archived), LanguageEvent::Remove) => {
                TargetState::settled(Removed)
            }

            (Some(Published), LanguageEvent::Supersede) => TargetState::settled(OldPublished),
            (Some(Scheduled), LanguageEvent::Supersede) if scheduled_archive => {
                TargetState::settled(OldPublished)
            }

            (from, _) => return Err(invalid_transition(from, event)),
        };

        Ok(target)
    }

    /// Apply `event` to one language of `version`, after checking guards
    pub async fn transition(
        &self,
        version: &mut EntityVersion,
        language: &Language,
        event: LanguageEvent,
        actor: &str,
        at: DateTime<Utc>,
        uow: &dyn UnitOfWork,
    ) -> StateMachineResult<LanguageTransition> {
        let current = version.availability(language);
        if current.is_none() && event != LanguageEvent::SaveDraft {
            return Err(StateMachineError::LanguageNotAvailable {
                version_id: version.id,
                language: language.to_string(),
            });
        }

        let from = current.map(|a| a.status);
        let target = Self::determine_target_state(current, &event)?;

        self.check_guards(version, language, &event, &target, at, uow)
            .await?;

        version
            .availabilities
            .entry(language.clone())
            .or_insert_with(|| LanguageAvailability::draft(language.clone(), actor, at))
            .apply(&target, actor, at);
        version.touch(actor, at);

        Ok(LanguageTransition {
            version_id: version.id,
            root_id: version.root_id,
            entity_type: version.entity_type,
            language: language.clone(),
            from,
            to: target,
            event,
            actor: actor.to_string(),
            at,
        })
    }

    async fn check_guards(
        &self,
        version: &EntityVersion,
        language: &Language,
        event: &LanguageEvent,
        target: &TargetState,
        at: DateTime<Utc>,
        uow: &dyn UnitOfWork,
    ) -> StateMachineResult<()> {
        let input = GuardInput {
            version,
            language,
            event,
            target,
            at,
        };

        for guard in &self.guards {
            if let Err(err) = guard.check(&input, uow).await {
                tracing::debug!(
                    guard = guard.description(),
                    version_id = %version.id,
                    language = %language,
                    error = %err,
                    "Transition guard rejected"
                );
                return Err(err.into());
            }
        }

        Ok(())
    }

    /// Execute post-commit actions for committed transitions
    pub async fn run_actions(&self, transitions: &[LanguageTransition]) -> StateMachineResult<()> {
        for transition in transitions {
            for action in &self.actions {
                action.execute(transition).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn availability(status: PublishingStatus) -> LanguageAvailability {
        LanguageAvailability::new(Language::finnish(), status, "editor", Utc::now())
    }

    fn scheduled(target: TargetState) -> LanguageAvailability {
        let mut a = availability(PublishingStatus::Draft);
        a.apply(&target, "editor", Utc::now());
        a
    }

    #[test]
    fn test_publish_transitions() {
        for status in [PublishingStatus::Draft, PublishingStatus::Modified] {
            let target =
                LanguageStateMachine::determine_target_state(Some(&availability(status)), &LanguageEvent::Publish)
                    .unwrap();
            assert_eq!(target, TargetState::settled(PublishingStatus::Published));
        }

        let at = Utc::now() + Duration::hours(1);
        let pending = scheduled(TargetState::scheduled_publish(at));
        assert_eq!(
            LanguageStateMachine::determine_target_state(Some(&pending), &LanguageEvent::Publish).unwrap(),
            TargetState::settled(PublishingStatus::Published)
        );

        // A pending archive cannot be "published"
        let archiving = scheduled(TargetState::scheduled_archive(at));
        assert!(LanguageStateMachine::determine_target_state(Some(&archiving), &LanguageEvent::Publish).is_err());
    }

    #[test]
    fn test_schedule_and_cancel() {
        let at = Utc::now() + Duration::hours(1);
        let draft = availability(PublishingStatus::Draft);
        assert_eq!(
            LanguageStateMachine::determine_target_state(Some(&draft), &LanguageEvent::SchedulePublish(at)).unwrap(),
            TargetState::scheduled_publish(at)
        );

        let published = availability(PublishingStatus::Published);
        assert_eq!(
            LanguageStateMachine::determine_target_state(Some(&published), &LanguageEvent::ScheduleArchive(at))
                .unwrap(),
            TargetState::scheduled_archive(at)
        );

        let pending_publish = scheduled(TargetState::scheduled_publish(at));
        assert_eq!(
            LanguageStateMachine::determine_target_state(Some(&pending_publish), &LanguageEvent::CancelSchedule)
                .unwrap(),
            TargetState::settled(PublishingStatus::Draft)
        );

        let pending_archive = scheduled(TargetState::scheduled_archive(at));
        assert_eq!(
            LanguageStateMachine::determine_target_state(Some(&pending_archive), &LanguageEvent::CancelSchedule)
                .unwrap(),
            TargetState::settled(PublishingStatus::Published)
        );
        assert_eq!(
            LanguageStateMachine::determine_target_state(Some(&pending_archive), &LanguageEvent::Archive).unwrap(),
            TargetState::settled(PublishingStatus::Archived)
        );
    }

    #[test]
    fn test_invalid_transitions() {
        let invalid = [
            (Some(PublishingStatus::Published), LanguageEvent::SaveDraft),
            (Some(PublishingStatus::Draft), LanguageEvent::Withdraw),
            (Some(PublishingStatus::Archived), LanguageEvent::Publish),
            (Some(PublishingStatus::Removed), LanguageEvent::Restore),
            (Some(PublishingStatus::OldPublished), LanguageEvent::Publish),
            (Some(PublishingStatus::Draft), LanguageEvent::Supersede),
            (None, LanguageEvent::Publish),
        ];

        for (status, event) in invalid {
            let current = status.map(availability);
            let result = LanguageStateMachine::determine_target_state(current.as_ref(), &event);
            assert!(
                matches!(result, Err(StateMachineError::InvalidTransition { .. })),
                "{status:?} + {event:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        let at = Utc::now();
        let events = [
            LanguageEvent::SaveDraft,
            LanguageEvent::Publish,
            LanguageEvent::SchedulePublish(at),
            LanguageEvent::ScheduleArchive(at),
            LanguageEvent::CancelSchedule,
            LanguageEvent::Archive,
            LanguageEvent::Restore,
            LanguageEvent::Withdraw,
            LanguageEvent::Remove,
            LanguageEvent::Supersede,
        ];
        for status in [PublishingStatus::Removed, PublishingStatus::OldPublished] {
            assert!(status.is_terminal());
            for event in &events {
                assert!(LanguageStateMachine::determine_target_state(Some(&availability(status)), event).is_err());
            }
        }
    }
}
