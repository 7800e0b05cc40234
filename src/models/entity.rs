//! # Content Entities
//!
//! Every content item has a stable unific root id shared by all of its versions.
//! Each [`EntityVersion`] is one snapshot tagged with a [`Version`] and carries
//! its own per-language availability records.

use super::{EntityContent, Include, Language, LanguageAvailability, Version};
use crate::state_machine::PublishingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Service,
    Channel,
    Organization,
    GeneralDescription,
    ServiceCollection,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Channel => write!(f, "channel"),
            Self::Organization => write!(f, "organization"),
            Self::GeneralDescription => write!(f, "general_description"),
            Self::ServiceCollection => write!(f, "service_collection"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(Self::Service),
            "channel" => Ok(Self::Channel),
            "organization" => Ok(Self::Organization),
            "general_description" => Ok(Self::GeneralDescription),
            "service_collection" => Ok(Self::ServiceCollection),
            _ => Err(format!("Invalid entity type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    #[default]
    Service,
    PermitOrObligation,
    ProfessionalQualifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    EChannel,
    WebPage,
    PrintableForm,
    Phone,
    ServiceLocation,
}

/// Specific kind of an entity as shown in audit views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "kind", rename_all = "snake_case")]
pub enum SubEntityType {
    Channel(ChannelKind),
    Service(ServiceKind),
    GeneralDescription(ServiceKind),
    Organization,
    ServiceCollection,
    Unknown,
}

impl SubEntityType {
    /// Resolve the sub-type from the entity type and whatever content is known.
    /// Mismatched or missing information yields `Unknown`.
    pub fn resolve(entity_type: Option<EntityType>, content: Option<&EntityContent>) -> Self {
        match (entity_type, content) {
            (Some(EntityType::Channel), Some(EntityContent::Channel(c))) => Self::Channel(c.kind),
            (Some(EntityType::Service), Some(EntityContent::Service(s))) => Self::Service(s.kind),
            (Some(EntityType::GeneralDescription), Some(EntityContent::GeneralDescription(g))) => {
                Self::GeneralDescription(g.kind)
            }
            (Some(EntityType::Organization), _) => Self::Organization,
            (Some(EntityType::ServiceCollection), _) => Self::ServiceCollection,
            _ => Self::Unknown,
        }
    }
}

/// One snapshot of a content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityVersion {
    /// Versioned id of this snapshot
    pub id: Uuid,
    /// Unific root shared by all versions
    pub root_id: Uuid,
    pub entity_type: EntityType,
    pub version: Version,
    pub names: BTreeMap<Language, String>,
    pub availabilities: BTreeMap<Language, LanguageAvailability>,
    pub content: EntityContent,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub modified_by: String,
}

impl EntityVersion {
    /// First version of a brand new root. Availability records are created as
    /// content is saved per language.
    pub fn new_root(content: EntityContent, actor: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            root_id: Uuid::new_v4(),
            entity_type: content.entity_type(),
            version: Version::initial(),
            names: BTreeMap::new(),
            availabilities: BTreeMap::new(),
            content,
            created_at: at,
            modified_at: at,
            modified_by: actor.to_string(),
        }
    }

    pub fn availability(&self, language: &Language) -> Option<&LanguageAvailability> {
        self.availabilities.get(language)
    }

    pub fn status_of(&self, language: &Language) -> Option<PublishingStatus> {
        self.availability(language).map(|a| a.status)
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.availabilities.keys()
    }

    pub fn name(&self, language: &Language) -> Option<&str> {
        self.names.get(language).map(String::as_str)
    }

    pub fn has_published_language(&self) -> bool {
        self.availabilities.values().any(LanguageAvailability::is_published_like)
    }

    pub fn has_draft_like_language(&self) -> bool {
        self.availabilities.values().any(LanguageAvailability::is_draft_like)
    }

    pub fn sub_entity_type(&self) -> SubEntityType {
        SubEntityType::resolve(Some(self.entity_type), Some(&self.content))
    }

    /// Copy carrying only the declared content collections
    pub fn projected(&self, includes: &[Include]) -> Self {
        Self {
            content: self.content.projected(includes),
            ..self.clone()
        }
    }

    pub fn touch(&mut self, actor: &str, at: DateTime<Utc>) {
        self.modified_by = actor.to_string();
        self.modified_at = at;
    }
}
