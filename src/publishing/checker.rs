//! # Publishing Checkers
//!
//! A checker decides whether one entity version satisfies the minimum content
//! rules for publishing. Checkers are read-only: they never mutate the entity
//! and running one twice against the same snapshot yields the same messages.
//!
//! A [`CheckerSession`] drives one checker through `init` (load exactly the
//! entity and the collections the checker declares) and `validate_entity`
//! (run the ordered rule list).

use super::rules::{ValidationMessage, ValidationMessages};
use crate::error::{PublishingError, Result};
use crate::models::{EntityType, EntityVersion, Include, Language};
use crate::store::UnitOfWork;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait PublishingChecker: Send + Sync {
    /// Entity type this checker validates
    fn entity_type(&self) -> EntityType;

    /// Collections loaded with the entity before validation
    fn includes(&self) -> &'static [Include];

    /// Run the rules in order, appending a message for every failed rule.
    ///
    /// Only data-integrity problems are returned as errors.
    async fn validate(
        &self,
        entity: &EntityVersion,
        uow: &dyn UnitOfWork,
        messages: &mut ValidationMessages,
    ) -> Result<()>;
}

/// Languages whose content is live or about to be, in a stable order
pub fn content_languages(entity: &EntityVersion) -> Vec<Language> {
    entity
        .availabilities
        .values()
        .filter(|a| a.is_draft_like() || a.is_published_like())
        .map(|a| a.language.clone())
        .collect()
}

/// Requires a localized name for every content language
pub fn require_names(entity: &EntityVersion, messages: &mut ValidationMessages) {
    for language in content_languages(entity) {
        messages.require_string(format!("Name.{language}"), entity.name(&language));
    }
}

/// One checker bound to one loaded entity
pub struct CheckerSession {
    checker: Arc<dyn PublishingChecker>,
    entity: Option<EntityVersion>,
    messages: ValidationMessages,
}

impl CheckerSession {
    pub fn new(checker: Arc<dyn PublishingChecker>) -> Self {
        Self {
            checker,
            entity: None,
            messages: ValidationMessages::new(),
        }
    }

    /// Load the entity by versioned id through the checker's include graph
    pub async fn init(&mut self, id: Uuid, uow: &dyn UnitOfWork) -> Result<()> {
        let entity_type = self.checker.entity_type();
        let entity = uow
            .find_version(id, self.checker.includes())
            .await?
            .ok_or(PublishingError::EntityNotFound { entity_type, id })?;

        if entity.entity_type != entity_type {
            return Err(PublishingError::EntityTypeMismatch {
                id,
                expected: entity_type,
                actual: entity.entity_type,
            });
        }

        self.entity = Some(entity);
        self.messages.clear();
        Ok(())
    }

    /// Run the checker's rules; true when no rule failed
    pub async fn validate_entity(&mut self, uow: &dyn UnitOfWork) -> Result<bool> {
        let entity = self
            .entity
            .as_ref()
            .ok_or(PublishingError::CheckerNotInitialized {
                entity_type: self.checker.entity_type(),
            })?;

        self.messages.clear();
        self.checker
            .validate(entity, uow, &mut self.messages)
            .await?;
        Ok(self.messages.is_empty())
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        self.messages.as_slice()
    }

    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages.into_vec()
    }
}
