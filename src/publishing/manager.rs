//! # Publishing Manager
//!
//! Single entry point for "may this entity be published". The manager resolves
//! the checker registered for the entity type, runs it inside the caller's
//! unit of work and reports the result. It never mutates anything.
//!
//! Internally the outcome is three-way ([`CheckOutcome`]): a type without a
//! checker is `NotApplicable`, which is not the same as passing. The boolean
//! [`PublishingManager::check_entity`] keeps the fail-closed contract and maps
//! both `Failed` and `NotApplicable` to `false`.

use super::checker::CheckerSession;
use super::registry::CheckerRegistry;
use super::rules::{is_empty_id, ValidationMessage};
use crate::error::Result;
use crate::models::{EntityType, Publishable};
use crate::store::UnitOfWork;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "messages", rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Failed(Vec<ValidationMessage>),
    /// No checker is registered for the entity type
    NotApplicable,
}

impl CheckOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        match self {
            Self::Failed(messages) => messages,
            Self::Passed | Self::NotApplicable => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublishingManager {
    registry: CheckerRegistry,
}

impl PublishingManager {
    pub fn new(registry: CheckerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CheckerRegistry {
        &self.registry
    }

    /// Whether the entity with versioned id `id` may be published.
    ///
    /// Returns `false` without resolving a checker when the entity is absent
    /// or the id is unset.
    pub async fn check_entity<T: Publishable>(
        &self,
        entity: Option<&T>,
        id: Option<Uuid>,
        uow: &dyn UnitOfWork,
    ) -> Result<bool> {
        let Some(id) = id.filter(|_| entity.is_some() && !is_empty_id(id)) else {
            debug!(entity_type = %T::ENTITY_TYPE, "Publish check refused: entity or id missing");
            return Ok(false);
        };

        Ok(self.evaluate(T::ENTITY_TYPE, id, uow).await?.is_passed())
    }

    pub async fn evaluate(
        &self,
        entity_type: EntityType,
        id: Uuid,
        uow: &dyn UnitOfWork,
    ) -> Result<CheckOutcome> {
        let Some(checker) = self.registry.resolve(entity_type) else {
            warn!(entity_type = %entity_type, entity_id = %id, "No publishing checker registered");
            return Ok(CheckOutcome::NotApplicable);
        };

        let mut session = CheckerSession::new(checker);
        session.init(id, uow).await?;
        if session.validate_entity(uow).await? {
            debug!(entity_type = %entity_type, entity_id = %id, "Publish check passed");
            return Ok(CheckOutcome::Passed);
        }

        let messages = session.into_messages();
        debug!(
            entity_type = %entity_type,
            entity_id = %id,
            message_count = messages.len(),
            "Publish check failed"
        );
        Ok(CheckOutcome::Failed(messages))
    }
}

impl Default for PublishingManager {
    fn default() -> Self {
        Self::new(CheckerRegistry::with_default_checkers())
    }
}
