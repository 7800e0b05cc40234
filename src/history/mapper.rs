//! # History Mapper
//!
//! Pure transformation of raw [`OperationRecord`]s into display-ready
//! [`HistoryRecord`]s.
//!
//! Language rows are rendered for the languages the entity *currently* has
//! availability for, using the state captured when the operation was written.
//! A language without a captured name is left out rather than rendered blank.
//!
//! Cascades are one level deep. [`flatten`] emits each parent followed directly
//! by its sub-operations, which carry the parent's operation id.

use crate::models::{
    EntityVersion, HistoryRecord, Language, LanguageSnapshot, LanguageVersion, OperationRecord,
    SubEntityType, SubOperationRecord,
};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Latest known version of every root an operation page refers to
#[derive(Debug, Clone, Default)]
pub struct MappingContext {
    current: HashMap<Uuid, EntityVersion>,
}

impl MappingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, version: EntityVersion) {
        self.current.insert(version.root_id, version);
    }

    pub fn current(&self, root_id: Uuid) -> Option<&EntityVersion> {
        self.current.get(&root_id)
    }

    pub fn contains(&self, root_id: Uuid) -> bool {
        self.current.contains_key(&root_id)
    }
}

impl FromIterator<EntityVersion> for MappingContext {
    fn from_iter<I: IntoIterator<Item = EntityVersion>>(iter: I) -> Self {
        let mut context = Self::new();
        for version in iter {
            context.insert(version);
        }
        context
    }
}

/// Render language rows from an operation snapshot.
///
/// With no current version known (the root has been purged) every snapshot
/// language is a candidate.
pub fn language_versions(
    snapshot: &BTreeMap<Language, LanguageSnapshot>,
    current: Option<&EntityVersion>,
) -> BTreeMap<Language, LanguageVersion> {
    let render = |language: &Language| {
        let captured = snapshot.get(language)?;
        let name = captured.name.as_deref().filter(|name| !name.trim().is_empty())?;
        Some((
            language.clone(),
            LanguageVersion {
                status: captured.status,
                name: name.to_string(),
                is_scheduled: captured.is_scheduled,
            },
        ))
    };

    match current {
        Some(version) => version.languages().filter_map(render).collect(),
        None => snapshot.keys().filter_map(render).collect(),
    }
}

/// Map one operation with its sub-operations nested under it
pub fn map_operation(operation: &OperationRecord, context: &MappingContext) -> HistoryRecord {
    let current = context.current(operation.root_id);

    HistoryRecord {
        operation_id: operation.operation_id,
        parent_operation_id: None,
        entity_id: operation.entity_id,
        root_id: operation.root_id,
        entity_type: operation.entity_type,
        sub_entity_type: SubEntityType::resolve(
            operation.entity_type,
            current.map(|version| &version.content),
        ),
        edited_at: operation.edited_at,
        editor: operation.editor.clone(),
        language_versions: language_versions(&operation.language_snapshot, current),
        version: operation.version,
        next_version: operation.next_version,
        source_language: operation.source_language.clone(),
        target_languages: operation.target_languages.clone(),
        history_action: operation.action,
        copy_info: operation.copy_info.clone(),
        sub_operations: operation
            .sub_operations
            .iter()
            .map(|sub| map_sub_operation(sub, operation, context))
            .collect(),
    }
}

fn map_sub_operation(
    sub: &SubOperationRecord,
    parent: &OperationRecord,
    context: &MappingContext,
) -> HistoryRecord {
    let current = context.current(sub.root_id);

    HistoryRecord {
        operation_id: sub.operation_id,
        parent_operation_id: Some(parent.operation_id),
        entity_id: sub.entity_id,
        root_id: sub.root_id,
        entity_type: sub.entity_type,
        sub_entity_type: SubEntityType::resolve(sub.entity_type, current.map(|v| &v.content)),
        edited_at: parent.edited_at,
        editor: parent.editor.clone(),
        language_versions: language_versions(&sub.language_snapshot, current),
        version: sub.version,
        next_version: None,
        source_language: None,
        target_languages: Vec::new(),
        history_action: sub.action,
        copy_info: None,
        sub_operations: Vec::new(),
    }
}

/// Parent first, then each of its sub-operations; 1 + N records per parent
pub fn flatten(records: Vec<HistoryRecord>) -> Vec<HistoryRecord> {
    let mut flat = Vec::with_capacity(
        records
            .iter()
            .map(|record| 1 + record.sub_operations.len())
            .sum(),
    );
    for mut record in records {
        let children = std::mem::take(&mut record.sub_operations);
        flat.push(record);
        flat.extend(children);
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        EntityContent, EntityType, GeneralDescriptionContent, HistoryAction, LanguageAvailability,
        ServiceContent, ServiceKind, Version,
    };
    use crate::state_machine::PublishingStatus;
    use chrono::Utc;

    fn snapshot(entries: &[(&str, PublishingStatus, Option<&str>)]) -> BTreeMap<Language, LanguageSnapshot> {
        entries
            .iter()
            .map(|(code, status, name)| {
                (
                    Language::new(*code),
                    LanguageSnapshot {
                        status: *status,
                        name: name.map(str::to_string),
                        is_scheduled: false,
                    },
                )
            })
            .collect()
    }

    fn current_with(content: EntityContent, languages: &[&str]) -> EntityVersion {
        let now = Utc::now();
        let mut version = EntityVersion::new_root(content, "editor", now);
        for code in languages {
            let language = Language::new(*code);
            version
                .availabilities
                .insert(language.clone(), LanguageAvailability::draft(language, "editor", now));
        }
        version
    }

    fn operation(version: &EntityVersion, snapshot: BTreeMap<Language, LanguageSnapshot>) -> OperationRecord {
        OperationRecord {
            operation_id: Uuid::new_v4(),
            sequence: 1,
            entity_id: version.id,
            root_id: version.root_id,
            entity_type: Some(version.entity_type),
            edited_at: Utc::now(),
            editor: "editor".to_string(),
            action: HistoryAction::Publish,
            version: Version::new(1, 0),
            next_version: None,
            languages: snapshot.keys().cloned().collect(),
            language_snapshot: snapshot,
            source_language: None,
            target_languages: Vec::new(),
            copy_info: None,
            sub_operations: Vec::new(),
        }
    }

    #[test]
    fn test_languages_follow_current_entity_and_skip_missing_names() {
        let current = current_with(EntityContent::Service(ServiceContent::default()), &["fi", "sv", "en"]);
        let op = operation(
            &current,
            snapshot(&[
                ("fi", PublishingStatus::Published, Some("Palvelu")),
                ("sv", PublishingStatus::Draft, Some("  ")),
                ("de", PublishingStatus::Draft, Some("Dienst")),
            ]),
        );
        let context: MappingContext = [current.clone()].into_iter().collect();

        let record = map_operation(&op, &context);
        assert_eq!(record.language_versions.len(), 1);
        let fi = &record.language_versions[&Language::finnish()];
        assert_eq!(fi.name, "Palvelu");
        assert_eq!(fi.status, PublishingStatus::Published);
        assert_eq!(record.sub_entity_type, SubEntityType::Service(ServiceKind::Service));
    }

    #[test]
    fn test_unknown_root_uses_snapshot_and_unknown_sub_type() {
        let current = current_with(EntityContent::Service(ServiceContent::default()), &["fi"]);
        let op = operation(
            &current,
            snapshot(&[("fi", PublishingStatus::Archived, Some("Palvelu"))]),
        );

        let record = map_operation(&op, &MappingContext::new());
        assert_eq!(record.language_versions.len(), 1);
        assert_eq!(record.sub_entity_type, SubEntityType::Unknown);
    }

    #[test]
    fn test_flatten_emits_parent_before_children() {
        let gd = current_with(
            EntityContent::GeneralDescription(GeneralDescriptionContent::default()),
            &["fi"],
        );
        let service = current_with(EntityContent::Service(ServiceContent::default()), &["fi"]);
        let mut parent = operation(&gd, snapshot(&[("fi", PublishingStatus::Published, Some("Kuvaus"))]));
        for _ in 0..3 {
            parent.sub_operations.push(SubOperationRecord {
                operation_id: Uuid::new_v4(),
                entity_id: service.id,
                root_id: service.root_id,
                entity_type: Some(EntityType::Service),
                action: HistoryAction::GeneralDescriptionUpdated,
                version: Version::new(1, 0),
                language_snapshot: snapshot(&[("fi", PublishingStatus::Published, Some("Palvelu"))]),
            });
        }
        let lone = operation(&service, snapshot(&[("fi", PublishingStatus::Draft, Some("Palvelu"))]));
        let context: MappingContext = [gd, service].into_iter().collect();

        let records = vec![map_operation(&parent, &context), map_operation(&lone, &context)];
        let flat = flatten(records);

        assert_eq!(flat.len(), 1 + 3 + 1);
        assert_eq!(flat[0].operation_id, parent.operation_id);
        assert!(flat[0].sub_operations.is_empty());
        for child in &flat[1..4] {
            assert_eq!(child.parent_operation_id, Some(parent.operation_id));
            assert_eq!(child.history_action, HistoryAction::GeneralDescriptionUpdated);
            assert_eq!(child.edited_at, parent.edited_at);
        }
        assert_eq!(flat[4].operation_id, lone.operation_id);
        assert_eq!(flat[4].parent_operation_id, None);
    }
}
