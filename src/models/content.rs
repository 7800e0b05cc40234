//! # Content Snapshots
//!
//! Type-specific payload of an entity version. Only the fields that publishing
//! rules read are modelled here; the full domain schema lives with the editing
//! application.
//!
//! Collections are loaded through an include graph: a store hands back only the
//! collections a caller declared, the rest come back empty.

use super::{ChannelKind, EntityType, Language, ServiceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Collections a reader asks the store to load alongside an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Include {
    Descriptions,
    Languages,
    TargetGroups,
    ServiceClasses,
    Urls,
    PhoneNumbers,
    Addresses,
    Members,
}

impl Include {
    pub const ALL: [Include; 8] = [
        Include::Descriptions,
        Include::Languages,
        Include::TargetGroups,
        Include::ServiceClasses,
        Include::Urls,
        Include::PhoneNumbers,
        Include::Addresses,
        Include::Members,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionType {
    ShortDescription,
    Description,
    UserInstruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub language: Language,
    pub description_type: DescriptionType,
    pub text: String,
}

impl Description {
    pub fn new(language: Language, description_type: DescriptionType, text: impl Into<String>) -> Self {
        Self {
            language,
            description_type,
            text: text.into(),
        }
    }
}

/// Text of the first description of the given type and language
pub fn description_text<'a>(
    descriptions: &'a [Description],
    language: &Language,
    description_type: DescriptionType,
) -> Option<&'a str> {
    descriptions
        .iter()
        .find(|d| &d.language == language && d.description_type == description_type)
        .map(|d| d.text.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceContent {
    pub kind: ServiceKind,
    pub funding_type_id: Option<Uuid>,
    /// Unific root of the general description this service is based on
    pub general_description_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub descriptions: Vec<Description>,
    /// Languages the service itself is provided in
    pub languages: Vec<Language>,
    pub target_groups: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelContent {
    pub kind: ChannelKind,
    pub organization_id: Option<Uuid>,
    pub descriptions: Vec<Description>,
    pub languages: Vec<Language>,
    pub urls: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganizationContent {
    pub organization_type_id: Option<Uuid>,
    pub parent_organization_id: Option<Uuid>,
    pub business_code: Option<String>,
    pub descriptions: Vec<Description>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneralDescriptionContent {
    /// Service kind prescribed to services based on this description
    pub kind: ServiceKind,
    pub descriptions: Vec<Description>,
    pub target_groups: Vec<Uuid>,
    pub service_classes: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceCollectionContent {
    pub organization_id: Option<Uuid>,
    pub descriptions: Vec<Description>,
    pub members: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EntityContent {
    Service(ServiceContent),
    Channel(ChannelContent),
    Organization(OrganizationContent),
    GeneralDescription(GeneralDescriptionContent),
    ServiceCollection(ServiceCollectionContent),
}

impl EntityContent {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Service(_) => EntityType::Service,
            Self::Channel(_) => EntityType::Channel,
            Self::Organization(_) => EntityType::Organization,
            Self::GeneralDescription(_) => EntityType::GeneralDescription,
            Self::ServiceCollection(_) => EntityType::ServiceCollection,
        }
    }

    pub fn organization_id(&self) -> Option<Uuid> {
        match self {
            Self::Service(s) => s.organization_id,
            Self::Channel(c) => c.organization_id,
            Self::ServiceCollection(c) => c.organization_id,
            Self::Organization(_) | Self::GeneralDescription(_) => None,
        }
    }

    /// Point the content at another owning organization; no-op for types without one
    pub fn set_organization_id(&mut self, organization_id: Option<Uuid>) {
        match self {
            Self::Service(s) => s.organization_id = organization_id,
            Self::Channel(c) => c.organization_id = organization_id,
            Self::ServiceCollection(c) => c.organization_id = organization_id,
            Self::Organization(_) | Self::GeneralDescription(_) => {}
        }
    }

    /// Copy of this content carrying only the declared collections
    pub fn projected(&self, includes: &[Include]) -> Self {
        let keep = |include: Include| includes.contains(&include);
        let mut content = self.clone();
        match &mut content {
            Self::Service(s) => {
                retain_if(keep(Include::Descriptions), &mut s.descriptions);
                retain_if(keep(Include::Languages), &mut s.languages);
                retain_if(keep(Include::TargetGroups), &mut s.target_groups);
            }
            Self::Channel(c) => {
                retain_if(keep(Include::Descriptions), &mut c.descriptions);
                retain_if(keep(Include::Languages), &mut c.languages);
                retain_if(keep(Include::Urls), &mut c.urls);
                retain_if(keep(Include::PhoneNumbers), &mut c.phone_numbers);
                retain_if(keep(Include::Addresses), &mut c.addresses);
            }
            Self::Organization(o) => {
                retain_if(keep(Include::Descriptions), &mut o.descriptions);
            }
            Self::GeneralDescription(g) => {
                retain_if(keep(Include::Descriptions), &mut g.descriptions);
                retain_if(keep(Include::TargetGroups), &mut g.target_groups);
                retain_if(keep(Include::ServiceClasses), &mut g.service_classes);
            }
            Self::ServiceCollection(c) => {
                retain_if(keep(Include::Descriptions), &mut c.descriptions);
                retain_if(keep(Include::Members), &mut c.members);
            }
        }
        content
    }
}

fn retain_if<T>(keep: bool, items: &mut Vec<T>) {
    if !keep {
        items.clear();
    }
}

/// Content types a publishing checker can be resolved for
pub trait Publishable {
    const ENTITY_TYPE: EntityType;
}

impl Publishable for ServiceContent {
    const ENTITY_TYPE: EntityType = EntityType::Service;
}

impl Publishable for ChannelContent {
    const ENTITY_TYPE: EntityType = EntityType::Channel;
}

impl Publishable for OrganizationContent {
    const ENTITY_TYPE: EntityType = EntityType::Organization;
}

impl Publishable for GeneralDescriptionContent {
    const ENTITY_TYPE: EntityType = EntityType::GeneralDescription;
}

impl Publishable for ServiceCollectionContent {
    const ENTITY_TYPE: EntityType = EntityType::ServiceCollection;
}
