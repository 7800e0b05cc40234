//! Writing transitions through a unit of work.
//!
//! Every operation stores the changed versions and appends exactly one
//! operation record carrying a per-language snapshot, so history can later be
//! rendered without replaying transitions.

use crate::models::{
    EntityVersion, HistoryAction, Language, LanguageSnapshot, OperationRecord, SubOperationRecord,
    Version,
};
use crate::store::{StoreResult, UnitOfWork};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-language status and name as they are right now
pub fn snapshot_languages(version: &EntityVersion) -> BTreeMap<Language, LanguageSnapshot> {
    version
        .availabilities
        .iter()
        .map(|(language, availability)| {
            (
                language.clone(),
                LanguageSnapshot {
                    status: availability.status,
                    name: version.names.get(language).cloned(),
                    is_scheduled: availability.scheduled_at().is_some(),
                },
            )
        })
        .collect()
}

/// Operation record for `version` after the change. `previous` is the version
/// number the entity had before; `next_version` is set only when it changed.
pub fn operation_for(
    version: &EntityVersion,
    previous: Version,
    action: HistoryAction,
    editor: &str,
    at: DateTime<Utc>,
    languages: Vec<Language>,
) -> OperationRecord {
    OperationRecord {
        operation_id: Uuid::new_v4(),
        sequence: 0,
        entity_id: version.id,
        root_id: version.root_id,
        entity_type: Some(version.entity_type),
        edited_at: at,
        editor: editor.to_string(),
        action,
        version: previous,
        next_version: (version.version != previous).then_some(version.version),
        languages,
        language_snapshot: snapshot_languages(version),
        source_language: None,
        target_languages: Vec::new(),
        copy_info: None,
        sub_operations: Vec::new(),
    }
}

pub fn sub_operation_for(version: &EntityVersion, action: HistoryAction) -> SubOperationRecord {
    SubOperationRecord {
        operation_id: Uuid::new_v4(),
        entity_id: version.id,
        root_id: version.root_id,
        entity_type: Some(version.entity_type),
        action,
        version: version.version,
        language_snapshot: snapshot_languages(version),
    }
}

/// Persists transition results inside the caller's unit of work
#[derive(Debug, Default, Clone, Copy)]
pub struct TransitionPersistence;

impl TransitionPersistence {
    pub async fn persist(
        &self,
        uow: &mut dyn UnitOfWork,
        versions: Vec<EntityVersion>,
        operation: OperationRecord,
    ) -> StoreResult<u64> {
        for version in versions {
            uow.save_version(version).await?;
        }
        uow.append_operation(operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityContent, LanguageAvailability, OrganizationContent};
    use crate::state_machine::{PublishingStatus, TargetState};

    #[test]
    fn test_snapshot_captures_status_and_name() {
        let now = Utc::now();
        let mut version = EntityVersion::new_root(
            EntityContent::Organization(OrganizationContent::default()),
            "editor",
            now,
        );
        version.names.insert(Language::finnish(), "Kunta".to_string());
        version
            .availabilities
            .insert(Language::finnish(), LanguageAvailability::draft(Language::finnish(), "editor", now));
        let mut sv = LanguageAvailability::draft(Language::swedish(), "editor", now);
        sv.apply(&TargetState::scheduled_publish(now), "editor", now);
        version.availabilities.insert(Language::swedish(), sv);

        let snapshot = snapshot_languages(&version);
        assert_eq!(snapshot[&Language::finnish()].name.as_deref(), Some("Kunta"));
        assert!(!snapshot[&Language::finnish()].is_scheduled);
        assert_eq!(snapshot[&Language::swedish()].status, PublishingStatus::Scheduled);
        assert!(snapshot[&Language::swedish()].is_scheduled);
        assert_eq!(snapshot[&Language::swedish()].name, None);
    }

    #[test]
    fn test_next_version_only_when_changed() {
        let now = Utc::now();
        let mut version = EntityVersion::new_root(
            EntityContent::Organization(OrganizationContent::default()),
            "editor",
            now,
        );
        let op = operation_for(&version, version.version, HistoryAction::Save, "editor", now, vec![]);
        assert_eq!(op.next_version, None);

        let previous = version.version;
        version.version = previous.next_major();
        let op = operation_for(&version, previous, HistoryAction::Publish, "editor", now, vec![]);
        assert_eq!(op.version, previous);
        assert_eq!(op.next_version, Some(Version::new(1, 0)));
    }
}
