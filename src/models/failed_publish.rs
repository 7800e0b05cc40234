use super::{EntityType, Language, SubEntityType};
use crate::state_machine::PublishingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A timed publish whose content failed validation when the scheduler fired it.
///
/// Kept for operator review and manual retry. These records are independent of
/// the job's own failure counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedScheduledPublish {
    pub id: Uuid,
    /// Unific root of the entity
    pub entity_id: Uuid,
    pub versioned_id: Uuid,
    pub entity_type: EntityType,
    pub sub_entity_type: SubEntityType,
    /// Entity names per language at the time of failure
    pub names: BTreeMap<Language, String>,
    pub languages: Vec<Language>,
    pub publishing_status: PublishingStatus,
    pub messages: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl FailedScheduledPublish {
    pub fn covers(&self, versioned_id: Uuid, language: &Language) -> bool {
        self.versioned_id == versioned_id && self.languages.contains(language)
    }
}
