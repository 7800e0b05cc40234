//! Primitive publishing rules shared by every checker.
//!
//! Predicates take an already extracted value; checkers pull the field out of
//! the entity themselves and record a message when a predicate reports empty.

use crate::error::{PublishingError, Result};
use crate::models::{EntityType, EntityVersion, Include};
use crate::store::UnitOfWork;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// True when the reference is unset or nil
pub fn is_empty_id(id: Option<Uuid>) -> bool {
    id.map_or(true, |id| id.is_nil())
}

/// True when the string is missing or has no characters
pub fn is_empty_string(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

/// True when the collection is missing or has no elements
pub fn is_empty_collection<T>(items: Option<&[T]>) -> bool {
    items.map_or(true, <[T]>::is_empty)
}

/// One human-readable reason an entity cannot be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Field the rule looked at, e.g. `FundingType` or `ShortDescription.fi`
    pub field: String,
    pub message: String,
}

impl ValidationMessage {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn cannot_be_empty(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("{field} cannot be empty.");
        Self { field, message }
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ordered message list a checker appends to while running its rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationMessages {
    messages: Vec<ValidationMessage>,
}

impl ValidationMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message when `id` is empty; returns whether the rule passed
    pub fn require_id(&mut self, field: impl Into<String>, id: Option<Uuid>) -> bool {
        self.require(field, !is_empty_id(id))
    }

    pub fn require_string(&mut self, field: impl Into<String>, value: Option<&str>) -> bool {
        self.require(field, !is_empty_string(value))
    }

    pub fn require_collection<T>(&mut self, field: impl Into<String>, items: &[T]) -> bool {
        self.require(field, !is_empty_collection(Some(items)))
    }

    pub fn push(&mut self, message: ValidationMessage) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn as_slice(&self) -> &[ValidationMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn into_vec(self) -> Vec<ValidationMessage> {
        self.messages
    }

    fn require(&mut self, field: impl Into<String>, passed: bool) -> bool {
        if !passed {
            self.messages.push(ValidationMessage::cannot_be_empty(field));
        }
        passed
    }
}

/// Fetch the latest version of a related root through the declared includes.
///
/// An empty id yields `None`; a set id that resolves to nothing is a
/// data-integrity error, never a validation message.
pub async fn get_entity(
    uow: &dyn UnitOfWork,
    root_id: Option<Uuid>,
    expected: EntityType,
    includes: &[Include],
) -> Result<Option<EntityVersion>> {
    let Some(root_id) = root_id.filter(|id| !id.is_nil()) else {
        return Ok(None);
    };

    let entity = uow
        .latest_version(root_id, includes)
        .await?
        .ok_or(PublishingError::EntityNotFound {
            entity_type: expected,
            id: root_id,
        })?;

    if entity.entity_type != expected {
        return Err(PublishingError::EntityTypeMismatch {
            id: root_id,
            expected,
            actual: entity.entity_type,
        });
    }

    Ok(Some(entity))
}
