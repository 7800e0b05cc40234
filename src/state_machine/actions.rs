use super::errors::ActionResult;
use super::language_state_machine::LanguageTransition;
use super::states::PublishingStatus;
use crate::constants::events;
use crate::events::EventPublisher;
use crate::logging::log_transition_operation;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Trait for implementing actions run after a transition has been committed
#[async_trait]
pub trait StateAction: Send + Sync {
    async fn execute(&self, transition: &LanguageTransition) -> ActionResult<()>;

    /// Get a description of this action for logging
    fn description(&self) -> &'static str;
}

/// Action to publish lifecycle events when state transitions occur
pub struct PublishTransitionEventAction {
    event_publisher: EventPublisher,
}

impl PublishTransitionEventAction {
    pub fn new(event_publisher: EventPublisher) -> Self {
        Self { event_publisher }
    }
}

#[async_trait]
impl StateAction for PublishTransitionEventAction {
    async fn execute(&self, transition: &LanguageTransition) -> ActionResult<()> {
        if let Some(event_name) = determine_event_name(transition) {
            let context = build_event_context(transition)?;
            self.event_publisher.publish(event_name, context);
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Publish lifecycle event for language transition"
    }
}

/// Action writing a structured log line per transition
pub struct LogTransitionAction;

#[async_trait]
impl StateAction for LogTransitionAction {
    async fn execute(&self, transition: &LanguageTransition) -> ActionResult<()> {
        log_transition_operation(
            transition.event.event_type(),
            transition.root_id,
            transition.version_id,
            transition.language.as_str(),
            &transition.to.status.to_string(),
            &transition.actor,
        );
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Log language transition"
    }
}

fn determine_event_name(transition: &LanguageTransition) -> Option<&'static str> {
    if transition.from == Some(transition.to.status) && !transition.to.is_scheduled() {
        // Plain re-save of existing content
        return None;
    }

    match transition.to.status {
        PublishingStatus::Draft => Some(events::LANGUAGE_DRAFT_SAVED),
        PublishingStatus::Modified => Some(events::LANGUAGE_MODIFIED),
        PublishingStatus::Published => Some(events::LANGUAGE_PUBLISHED),
        PublishingStatus::Scheduled => Some(events::LANGUAGE_SCHEDULED),
        PublishingStatus::Archived => Some(events::LANGUAGE_ARCHIVED),
        PublishingStatus::Removed => Some(events::LANGUAGE_REMOVED),
        PublishingStatus::OldPublished => Some(events::LANGUAGE_SUPERSEDED),
    }
}

fn build_event_context(transition: &LanguageTransition) -> ActionResult<Value> {
    Ok(json!({
        "version_id": transition.version_id,
        "root_id": transition.root_id,
        "entity_type": transition.entity_type,
        "language": transition.language,
        "from_state": transition.from,
        "to_state": transition.to.status,
        "valid_from": transition.to.valid_from,
        "valid_to": transition.to.valid_to,
        "event": serde_json::to_value(&transition.event)?,
        "actor": transition.actor,
        "at": transition.at,
    }))
}
