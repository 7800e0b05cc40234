//! # Publishing Service
//!
//! The write entry point shared by interactive callers and the scheduler.
//! Every operation runs inside one unit of work: read the current snapshot,
//! consult the publishing gate where required, apply per-language transitions,
//! append exactly one operation record and commit. Post-transition actions
//! (lifecycle events, structured logs) run only after the commit succeeded.
//!
//! Validation failures come back as [`TransitionOutcome::Rejected`] and leave
//! the store untouched. Errors are reserved for data-integrity breakage,
//! invalid requests and infrastructure failures.

use super::manager::{CheckOutcome, PublishingManager};
use crate::config::PublishingConfig;
use crate::constants::{events, DEFAULT_SCHEDULER_ACTOR};
use crate::error::{PublishingError, Result};
use crate::events::EventPublisher;
use crate::models::{
    ConnectionAction, ConnectionOperation, CopyInfo, EntityContent, EntityType, EntityVersion,
    FailedScheduledPublish, HistoryAction, Include, Language, LanguageAvailability,
};
use crate::publishing::rules::get_entity;
use crate::state_machine::persistence::{operation_for, snapshot_languages, sub_operation_for};
use crate::state_machine::{
    LanguageEvent, LanguageStateMachine, LanguageTransition, PublishingStatus,
    TransitionPersistence,
};
use crate::store::{ScheduledKind, ScheduledLanguage, UnitOfWork, UnitOfWorkFactory};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Content and initial names of a brand new entity
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub content: EntityContent,
    /// Names per language; every named language starts as a draft
    pub names: BTreeMap<Language, String>,
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Request to move one or more languages of a version through one event
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub version_id: Uuid,
    pub languages: Vec<Language>,
    pub event: LanguageEvent,
    pub actor: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied {
        version: EntityVersion,
        operation_id: Uuid,
    },
    /// The publishing gate refused; nothing was written
    Rejected(CheckOutcome),
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// What happened to one due scheduled language
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledFireOutcome {
    Published { operation_id: Uuid },
    Archived { operation_id: Uuid },
    /// Content failed the publishing gate; a failed scheduled publish was recorded
    ValidationFailed { record_id: Uuid },
    /// The language was rescheduled or changed after it was listed as due
    Skipped,
}

struct AppliedChange {
    version: EntityVersion,
    operation_id: Uuid,
    transitions: Vec<LanguageTransition>,
}

pub struct PublishingService {
    store: Arc<dyn UnitOfWorkFactory>,
    manager: PublishingManager,
    state_machine: LanguageStateMachine,
    event_publisher: EventPublisher,
    persistence: TransitionPersistence,
    scheduler_actor: String,
}

impl PublishingService {
    pub fn new(
        store: Arc<dyn UnitOfWorkFactory>,
        manager: PublishingManager,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            store,
            manager,
            state_machine: LanguageStateMachine::new(event_publisher.clone()),
            event_publisher,
            persistence: TransitionPersistence,
            scheduler_actor: DEFAULT_SCHEDULER_ACTOR.to_string(),
        }
    }

    pub fn from_config(store: Arc<dyn UnitOfWorkFactory>, config: &PublishingConfig) -> Self {
        Self::new(
            store,
            PublishingManager::default(),
            EventPublisher::new(config.events.channel_capacity),
        )
        .with_scheduler_actor(config.publishing.scheduler_actor.clone())
    }

    pub fn with_scheduler_actor(mut self, actor: impl Into<String>) -> Self {
        self.scheduler_actor = actor.into();
        self
    }

    pub fn scheduler_actor(&self) -> &str {
        &self.scheduler_actor
    }

    pub fn manager(&self) -> &PublishingManager {
        &self.manager
    }

    pub fn event_publisher(&self) -> &EventPublisher {
        &self.event_publisher
    }

    pub fn store(&self) -> &Arc<dyn UnitOfWorkFactory> {
        &self.store
    }

    /// Create a new root at version 0.1 with a draft per named language
    pub async fn create_entity(&self, new: NewEntity) -> Result<EntityVersion> {
        let mut uow = self.store.begin().await?;
        let mut version = EntityVersion::new_root(new.content, &new.actor, new.at);
        version.names = new.names;

        let languages: Vec<Language> = version.names.keys().cloned().collect();
        let mut transitions = Vec::with_capacity(languages.len());
        for language in &languages {
            let transition = self
                .state_machine
                .transition(&mut version, language, LanguageEvent::SaveDraft, &new.actor, new.at, &*uow)
                .await?;
            transitions.push(transition);
        }

        let operation = operation_for(
            &version,
            version.version,
            HistoryAction::Save,
            &new.actor,
            new.at,
            languages,
        );
        self.persistence
            .persist(&mut *uow, vec![version.clone()], operation)
            .await?;
        uow.commit().await?;

        info!(
            entity_type = %version.entity_type,
            root_id = %version.root_id,
            version_id = %version.id,
            "Entity created"
        );
        self.after_commit(&transitions).await;
        Ok(version)
    }

    /// Save the name of one language; the first save creates its draft availability
    pub async fn save_language_content(
        &self,
        version_id: Uuid,
        language: &Language,
        name: impl Into<String>,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<EntityVersion> {
        let mut uow = self.store.begin().await?;
        let mut version = load_version(&*uow, version_id).await?;
        version.names.insert(language.clone(), name.into());

        let transition = self
            .state_machine
            .transition(&mut version, language, LanguageEvent::SaveDraft, actor, at, &*uow)
            .await?;

        let operation = operation_for(
            &version,
            version.version,
            HistoryAction::Save,
            actor,
            at,
            vec![language.clone()],
        );
        self.persistence
            .persist(&mut *uow, vec![version.clone()], operation)
            .await?;
        uow.commit().await?;

        self.after_commit(&[transition]).await;
        Ok(version)
    }

    /// Replace the content payload of a version that still has a working copy
    pub async fn update_content(
        &self,
        version_id: Uuid,
        content: EntityContent,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<EntityVersion> {
        let mut uow = self.store.begin().await?;
        let mut version = load_version(&*uow, version_id).await?;

        if content.entity_type() != version.entity_type {
            return Err(PublishingError::EntityTypeMismatch {
                id: version_id,
                expected: version.entity_type,
                actual: content.entity_type(),
            });
        }

        let working: Vec<Language> = version
            .availabilities
            .values()
            .filter(|a| a.is_draft_like())
            .map(|a| a.language.clone())
            .collect();
        if working.is_empty() {
            return Err(PublishingError::InvalidRequest(format!(
                "version {version_id} has no draft language; create a draft version first"
            )));
        }

        version.content = content;
        version.touch(actor, at);

        let operation = operation_for(&version, version.version, HistoryAction::Save, actor, at, working);
        self.persistence
            .persist(&mut *uow, vec![version.clone()], operation)
            .await?;
        uow.commit().await?;
        Ok(version)
    }

    /// Start a new minor version from the latest published one
    pub async fn create_draft_version(
        &self,
        root_id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<EntityVersion> {
        let mut uow = self.store.begin().await?;
        let versions = uow.versions_of_root(root_id).await?;
        let latest = versions.last().ok_or(PublishingError::RootNotFound(root_id))?;

        if let Some(draft) = versions
            .iter()
            .flat_map(|v| v.availabilities.values())
            .find(|a| a.is_draft_like())
        {
            return Err(PublishingError::DraftAlreadyExists {
                root_id,
                language: draft.language.to_string(),
            });
        }

        let source = versions
            .iter()
            .rev()
            .find(|v| v.has_published_language())
            .ok_or_else(|| {
                PublishingError::InvalidRequest(format!("root {root_id} has no published version"))
            })?;

        let mut draft = source.clone();
        draft.id = Uuid::new_v4();
        draft.version = latest.version.next_minor();
        draft.created_at = at;
        draft.availabilities = source
            .availabilities
            .values()
            .filter(|a| a.is_published_like())
            .map(|a| {
                (
                    a.language.clone(),
                    LanguageAvailability::new(a.language.clone(), PublishingStatus::Modified, actor, at),
                )
            })
            .collect();
        draft.touch(actor, at);

        let languages: Vec<Language> = draft.availabilities.keys().cloned().collect();
        let operation = operation_for(
            &draft,
            source.version,
            HistoryAction::NewVersion,
            actor,
            at,
            languages,
        );
        self.persistence
            .persist(&mut *uow, vec![draft.clone()], operation)
            .await?;
        uow.commit().await?;

        info!(
            root_id = %root_id,
            from_version = %source.version,
            version = %draft.version,
            "Draft version created"
        );
        Ok(draft)
    }

    /// Apply one event to the requested languages of a version.
    ///
    /// `Publish` and `SchedulePublish` must pass the publishing gate first.
    pub async fn request_transition(&self, request: TransitionRequest) -> Result<TransitionOutcome> {
        if request.languages.is_empty() {
            return Err(PublishingError::InvalidRequest(
                "transition request names no languages".to_string(),
            ));
        }

        let mut uow = self.store.begin().await?;
        let version = load_version(&*uow, request.version_id).await?;

        if request.event.requires_publishing_gate() {
            let outcome = self
                .manager
                .evaluate(version.entity_type, version.id, &*uow)
                .await?;
            if !outcome.is_passed() {
                info!(
                    version_id = %version.id,
                    event = request.event.event_type(),
                    message_count = outcome.messages().len(),
                    "Transition rejected by publishing gate"
                );
                return Ok(TransitionOutcome::Rejected(outcome));
            }
        }

        let applied = self
            .apply_event(
                &mut *uow,
                version,
                &request.languages,
                request.event,
                &request.actor,
                request.at,
            )
            .await?;
        uow.commit().await?;

        self.after_commit(&applied.transitions).await;
        Ok(TransitionOutcome::Applied {
            version: applied.version,
            operation_id: applied.operation_id,
        })
    }

    /// Copy a template into a new root owned by `organization_id`
    pub async fn copy_entity(
        &self,
        template_version_id: Uuid,
        organization_id: Option<Uuid>,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<EntityVersion> {
        let mut uow = self.store.begin().await?;
        let template = load_version(&*uow, template_version_id).await?;

        let template_organization_id = template.content.organization_id().or(
            (template.entity_type == EntityType::Organization).then_some(template.root_id),
        );
        let template_organization_names =
            get_entity(&*uow, template_organization_id, EntityType::Organization, &[])
                .await?
                .map(|organization| organization.names)
                .unwrap_or_default();

        let mut content = template.content.clone();
        if organization_id.is_some() {
            content.set_organization_id(organization_id);
        }

        let mut copy = EntityVersion::new_root(content, actor, at);
        let languages: Vec<Language> = template
            .availabilities
            .values()
            .filter(|a| !a.status.is_terminal())
            .map(|a| a.language.clone())
            .collect();

        let mut transitions = Vec::with_capacity(languages.len());
        for language in &languages {
            if let Some(name) = template.names.get(language) {
                copy.names.insert(language.clone(), name.clone());
            }
            let transition = self
                .state_machine
                .transition(&mut copy, language, LanguageEvent::SaveDraft, actor, at, &*uow)
                .await?;
            transitions.push(transition);
        }

        let mut operation =
            operation_for(&copy, copy.version, HistoryAction::Copy, actor, at, languages);
        operation.copy_info = Some(CopyInfo {
            template_root_id: template.root_id,
            template_organization_id,
            template_organization_names,
        });
        self.persistence
            .persist(&mut *uow, vec![copy.clone()], operation)
            .await?;
        uow.commit().await?;

        info!(
            template_root_id = %template.root_id,
            root_id = %copy.root_id,
            "Entity copied from template"
        );
        self.after_commit(&transitions).await;
        Ok(copy)
    }

    /// Record a translation order from `source` into `targets`
    pub async fn order_translation(
        &self,
        version_id: Uuid,
        source: &Language,
        targets: Vec<Language>,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let mut uow = self.store.begin().await?;
        let version = load_version(&*uow, version_id).await?;

        if version.availability(source).is_none() {
            return Err(PublishingError::InvalidRequest(format!(
                "version {version_id} has no {source} content to translate"
            )));
        }
        if targets.is_empty() || targets.contains(source) {
            return Err(PublishingError::InvalidRequest(
                "translation targets must be non-empty and differ from the source".to_string(),
            ));
        }

        let mut operation = operation_for(
            &version,
            version.version,
            HistoryAction::TranslationOrdered,
            actor,
            at,
            targets.clone(),
        );
        operation.source_language = Some(source.clone());
        operation.target_languages = targets;
        let operation_id = operation.operation_id;

        uow.append_operation(operation).await?;
        uow.commit().await?;

        debug!(version_id = %version_id, source = %source, "Translation ordered");
        Ok(operation_id)
    }

    /// Store a delivered translation as the draft of its target language
    pub async fn receive_translation(
        &self,
        version_id: Uuid,
        target: &Language,
        name: impl Into<String>,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<EntityVersion> {
        let mut uow = self.store.begin().await?;
        let mut version = load_version(&*uow, version_id).await?;

        let order = uow
            .operations(version.root_id)
            .await?
            .into_iter()
            .rev()
            .find(|op| {
                op.action == HistoryAction::TranslationOrdered && op.target_languages.contains(target)
            })
            .ok_or_else(|| {
                PublishingError::InvalidRequest(format!(
                    "no translation into {target} was ordered for root {}",
                    version.root_id
                ))
            })?;

        version.names.insert(target.clone(), name.into());
        let transition = self
            .state_machine
            .transition(&mut version, target, LanguageEvent::SaveDraft, actor, at, &*uow)
            .await?;

        let mut operation = operation_for(
            &version,
            version.version,
            HistoryAction::TranslationReceived,
            actor,
            at,
            vec![target.clone()],
        );
        operation.source_language = order.source_language;
        operation.target_languages = vec![target.clone()];
        self.persistence
            .persist(&mut *uow, vec![version.clone()], operation)
            .await?;
        uow.commit().await?;

        self.after_commit(&[transition]).await;
        Ok(version)
    }

    /// Connect or disconnect a service and a channel.
    ///
    /// Returns `None` when the link already was in the requested state.
    pub async fn change_connection(
        &self,
        service_root_id: Uuid,
        channel_root_id: Uuid,
        action: ConnectionAction,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ConnectionOperation>> {
        let mut uow = self.store.begin().await?;
        let service = get_entity(&*uow, Some(service_root_id), EntityType::Service, &[]).await?;
        let channel = get_entity(&*uow, Some(channel_root_id), EntityType::Channel, &[]).await?;

        let connect = action == ConnectionAction::Connect;
        if uow.is_connected(service_root_id, channel_root_id).await? == connect {
            return Ok(None);
        }

        uow.set_connection(service_root_id, channel_root_id, connect)
            .await?;
        let mut operation = ConnectionOperation {
            operation_id: Uuid::new_v4(),
            sequence: 0,
            service_root_id,
            channel_root_id,
            action,
            edited_at: at,
            editor: actor.to_string(),
            service_snapshot: service.as_ref().map(snapshot_languages).unwrap_or_default(),
            channel_snapshot: channel.as_ref().map(snapshot_languages).unwrap_or_default(),
        };
        operation.sequence = uow.append_connection_operation(operation.clone()).await?;
        uow.commit().await?;

        info!(
            service_root_id = %service_root_id,
            channel_root_id = %channel_root_id,
            action = ?action,
            "Connection changed"
        );
        Ok(Some(operation))
    }

    /// Scheduled languages due at `now`
    pub async fn due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledLanguage>> {
        let uow = self.store.begin().await?;
        Ok(uow.due_scheduled(now).await?)
    }

    /// Carry out one due timed transition in its own unit of work
    pub async fn fire_scheduled(
        &self,
        item: &ScheduledLanguage,
        now: DateTime<Utc>,
    ) -> Result<ScheduledFireOutcome> {
        let mut uow = self.store.begin().await?;
        let version = load_version(&*uow, item.version_id).await?;

        let still_due = version.availability(&item.language).is_some_and(|a| {
            let kind_matches = match item.kind {
                ScheduledKind::Publish => a.is_scheduled_publish(),
                ScheduledKind::Archive => a.is_scheduled_archive(),
            };
            kind_matches && a.scheduled_at().is_some_and(|at| at <= now)
        });
        if !still_due {
            debug!(
                version_id = %item.version_id,
                language = %item.language,
                "Scheduled item no longer due, skipping"
            );
            return Ok(ScheduledFireOutcome::Skipped);
        }

        let languages = [item.language.clone()];
        let event = match item.kind {
            ScheduledKind::Publish => {
                let outcome = self
                    .manager
                    .evaluate(version.entity_type, version.id, &*uow)
                    .await?;
                if !outcome.is_passed() {
                    let record = self.failed_publish_record(&version, &item.language, &outcome, now);
                    let record_id = record.id;
                    uow.record_failed_publish(record).await?;
                    uow.commit().await?;

                    warn!(
                        version_id = %version.id,
                        root_id = %version.root_id,
                        language = %item.language,
                        "Scheduled publish failed validation"
                    );
                    self.event_publisher.publish(
                        events::SCHEDULED_PUBLISH_FAILED,
                        json!({
                            "record_id": record_id,
                            "version_id": version.id,
                            "root_id": version.root_id,
                            "language": item.language,
                        }),
                    );
                    return Ok(ScheduledFireOutcome::ValidationFailed { record_id });
                }
                LanguageEvent::Publish
            }
            ScheduledKind::Archive => LanguageEvent::Archive,
        };

        let applied = self
            .apply_event(&mut *uow, version, &languages, event, &self.scheduler_actor, now)
            .await?;
        uow.commit().await?;
        self.after_commit(&applied.transitions).await;

        Ok(match item.kind {
            ScheduledKind::Publish => ScheduledFireOutcome::Published {
                operation_id: applied.operation_id,
            },
            ScheduledKind::Archive => ScheduledFireOutcome::Archived {
                operation_id: applied.operation_id,
            },
        })
    }

    pub async fn failed_publishes(&self) -> Result<Vec<FailedScheduledPublish>> {
        let uow = self.store.begin().await?;
        Ok(uow.failed_publishes().await?)
    }

    /// Publish the languages of a failed scheduled publish now. The record is
    /// removed only when the publish goes through.
    pub async fn retry_failed_publish(
        &self,
        id: Uuid,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let mut uow = self.store.begin().await?;
        let record = uow
            .failed_publish(id)
            .await?
            .ok_or(PublishingError::FailedPublishNotFound(id))?;
        let version = load_version(&*uow, record.versioned_id).await?;

        let outcome = self
            .manager
            .evaluate(version.entity_type, version.id, &*uow)
            .await?;
        if !outcome.is_passed() {
            return Ok(TransitionOutcome::Rejected(outcome));
        }

        let applied = self
            .apply_event(&mut *uow, version, &record.languages, LanguageEvent::Publish, actor, at)
            .await?;
        uow.remove_failed_publish(id).await?;
        uow.commit().await?;

        info!(record_id = %id, version_id = %record.versioned_id, "Failed scheduled publish retried");
        self.after_commit(&applied.transitions).await;
        Ok(TransitionOutcome::Applied {
            version: applied.version,
            operation_id: applied.operation_id,
        })
    }

    async fn apply_event(
        &self,
        uow: &mut dyn UnitOfWork,
        mut version: EntityVersion,
        languages: &[Language],
        event: LanguageEvent,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<AppliedChange> {
        let previous = version.version;
        let mut transitions = Vec::with_capacity(languages.len());
        for language in languages {
            let transition = self
                .state_machine
                .transition(&mut version, language, event.clone(), actor, at, &*uow)
                .await?;
            transitions.push(transition);
        }

        let mut changed = Vec::new();
        let mut sub_operations = Vec::new();

        if event == LanguageEvent::Publish {
            if !previous.is_release() {
                version.version = previous.next_major();
            }

            // Older versions published in the same language step aside
            for mut other in uow.versions_of_root(version.root_id).await? {
                if other.id == version.id {
                    continue;
                }
                let mut superseded = false;
                for language in languages {
                    if other.availability(language).is_some_and(|a| a.is_published_like()) {
                        let transition = self
                            .state_machine
                            .transition(&mut other, language, LanguageEvent::Supersede, actor, at, &*uow)
                            .await?;
                        transitions.push(transition);
                        superseded = true;
                    }
                }
                if superseded {
                    sub_operations.push(sub_operation_for(&other, HistoryAction::Supersede));
                    changed.push(other);
                }
            }

            if version.entity_type == EntityType::GeneralDescription {
                for service in uow.services_using_general_description(version.root_id).await? {
                    sub_operations.push(sub_operation_for(
                        &service,
                        HistoryAction::GeneralDescriptionUpdated,
                    ));
                }
            }
        }

        for language in languages {
            let cleared = uow.clear_failed_publishes(version.id, language).await?;
            if cleared > 0 {
                debug!(version_id = %version.id, language = %language, cleared, "Cleared failed scheduled publishes");
            }
        }

        let mut operation = operation_for(
            &version,
            previous,
            event.history_action(),
            actor,
            at,
            languages.to_vec(),
        );
        operation.sub_operations = sub_operations;
        let operation_id = operation.operation_id;

        changed.push(version.clone());
        self.persistence.persist(uow, changed, operation).await?;

        Ok(AppliedChange {
            version,
            operation_id,
            transitions,
        })
    }

    fn failed_publish_record(
        &self,
        version: &EntityVersion,
        language: &Language,
        outcome: &CheckOutcome,
        now: DateTime<Utc>,
    ) -> FailedScheduledPublish {
        let messages = match outcome {
            CheckOutcome::NotApplicable => vec![format!(
                "No publishing checker is registered for {}.",
                version.entity_type
            )],
            other => other.messages().iter().map(ToString::to_string).collect(),
        };

        FailedScheduledPublish {
            id: Uuid::new_v4(),
            entity_id: version.root_id,
            versioned_id: version.id,
            entity_type: version.entity_type,
            sub_entity_type: version.sub_entity_type(),
            names: version.names.clone(),
            languages: vec![language.clone()],
            publishing_status: version
                .status_of(language)
                .unwrap_or(PublishingStatus::Scheduled),
            messages,
            created_at: now,
            created_by: self.scheduler_actor.clone(),
        }
    }

    async fn after_commit(&self, transitions: &[LanguageTransition]) {
        if let Err(err) = self.state_machine.run_actions(transitions).await {
            warn!(error = %err, "Post-transition action failed");
        }
    }
}

async fn load_version(uow: &dyn UnitOfWork, version_id: Uuid) -> Result<EntityVersion> {
    uow.find_version(version_id, &Include::ALL)
        .await?
        .ok_or(PublishingError::VersionNotFound(version_id))
}
