//! # History Records
//!
//! Raw operation records are appended by the publishing service, one per
//! operation, and never modified afterwards. The history mapper turns them into
//! display-ready [`HistoryRecord`]s.
//!
//! Cascades are one level deep: an operation owns a flat list of
//! [`SubOperationRecord`]s and sub-operations have no children of their own.

use super::{EntityType, Language, SubEntityType, Version};
use crate::state_machine::PublishingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Save,
    Publish,
    SchedulePublish,
    ScheduleArchive,
    CancelSchedule,
    Archive,
    Restore,
    Withdraw,
    Remove,
    Supersede,
    NewVersion,
    Copy,
    TranslationOrdered,
    TranslationReceived,
    /// Recorded on a service when the general description it is based on changes
    GeneralDescriptionUpdated,
}

/// Per-language state captured when an operation is recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSnapshot {
    pub status: PublishingStatus,
    pub name: Option<String>,
    pub is_scheduled: bool,
}

/// Origin of an entity created by copying a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyInfo {
    pub template_root_id: Uuid,
    pub template_organization_id: Option<Uuid>,
    pub template_organization_names: BTreeMap<Language, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubOperationRecord {
    pub operation_id: Uuid,
    pub entity_id: Uuid,
    pub root_id: Uuid,
    pub entity_type: Option<EntityType>,
    pub action: HistoryAction,
    pub version: Version,
    pub language_snapshot: BTreeMap<Language, LanguageSnapshot>,
}

/// Raw, append-only record of one operation on one entity version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_id: Uuid,
    /// Append order assigned by the store
    pub sequence: u64,
    pub entity_id: Uuid,
    pub root_id: Uuid,
    pub entity_type: Option<EntityType>,
    pub edited_at: DateTime<Utc>,
    pub editor: String,
    pub action: HistoryAction,
    pub version: Version,
    pub next_version: Option<Version>,
    /// Languages this operation touched
    pub languages: Vec<Language>,
    pub language_snapshot: BTreeMap<Language, LanguageSnapshot>,
    pub source_language: Option<Language>,
    pub target_languages: Vec<Language>,
    pub copy_info: Option<CopyInfo>,
    pub sub_operations: Vec<SubOperationRecord>,
}

/// Rendered state of one language in a history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageVersion {
    pub status: PublishingStatus,
    pub name: String,
    pub is_scheduled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub operation_id: Uuid,
    /// Set on records produced from a cascading sub-operation
    pub parent_operation_id: Option<Uuid>,
    pub entity_id: Uuid,
    pub root_id: Uuid,
    pub entity_type: Option<EntityType>,
    pub sub_entity_type: SubEntityType,
    pub edited_at: DateTime<Utc>,
    pub editor: String,
    pub language_versions: BTreeMap<Language, LanguageVersion>,
    pub version: Version,
    pub next_version: Option<Version>,
    pub source_language: Option<Language>,
    pub target_languages: Vec<Language>,
    pub history_action: HistoryAction,
    pub copy_info: Option<CopyInfo>,
    pub sub_operations: Vec<HistoryRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionAction {
    Connect,
    Disconnect,
}

/// Raw record of a service-channel link change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOperation {
    pub operation_id: Uuid,
    pub sequence: u64,
    pub service_root_id: Uuid,
    pub channel_root_id: Uuid,
    pub action: ConnectionAction,
    pub edited_at: DateTime<Utc>,
    pub editor: String,
    /// Service language rows when the link changed
    #[serde(default)]
    pub service_snapshot: BTreeMap<Language, LanguageSnapshot>,
    #[serde(default)]
    pub channel_snapshot: BTreeMap<Language, LanguageSnapshot>,
}

impl ConnectionOperation {
    /// The root on the other side of the link, seen from `root_id`
    pub fn counterpart_of(&self, root_id: Uuid) -> Option<Uuid> {
        if self.service_root_id == root_id {
            Some(self.channel_root_id)
        } else if self.channel_root_id == root_id {
            Some(self.service_root_id)
        } else {
            None
        }
    }

    /// Captured language rows of the root on the other side of the link
    pub fn counterpart_snapshot(&self, root_id: Uuid) -> Option<&BTreeMap<Language, LanguageSnapshot>> {
        if self.service_root_id == root_id {
            Some(&self.channel_snapshot)
        } else if self.channel_root_id == root_id {
            Some(&self.service_snapshot)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionHistoryRecord {
    pub operation_id: Uuid,
    /// Root id of the connected entity
    pub entity_id: Uuid,
    pub entity_type: Option<EntityType>,
    pub sub_entity_type: SubEntityType,
    pub language_versions: BTreeMap<Language, LanguageVersion>,
    pub edited_at: DateTime<Utc>,
    pub editor: String,
    pub action: ConnectionAction,
}

/// One page of a newest-first history query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage<T> {
    pub data: Vec<T>,
    pub page: usize,
    pub is_more_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_counterpart() {
        let service = Uuid::new_v4();
        let channel = Uuid::new_v4();
        let op = ConnectionOperation {
            operation_id: Uuid::new_v4(),
            sequence: 1,
            service_root_id: service,
            channel_root_id: channel,
            action: ConnectionAction::Connect,
            edited_at: Utc::now(),
            editor: "editor".to_string(),
            service_snapshot: BTreeMap::new(),
            channel_snapshot: BTreeMap::from([(
                Language::finnish(),
                LanguageSnapshot {
                    status: PublishingStatus::Draft,
                    name: Some("Verkkosivu".to_string()),
                    is_scheduled: false,
                },
            )]),
        };
        assert_eq!(op.counterpart_of(service), Some(channel));
        assert_eq!(op.counterpart_of(channel), Some(service));
        assert_eq!(op.counterpart_of(Uuid::new_v4()), None);

        assert_eq!(op.counterpart_snapshot(service).map(BTreeMap::len), Some(1));
        assert_eq!(op.counterpart_snapshot(channel).map(BTreeMap::len), Some(0));
        assert!(op.counterpart_snapshot(Uuid::new_v4()).is_none());
    }
}
