//! Connection history: service-channel link changes seen from one side.
//!
//! Kept apart from the entity stream. A connection operation belongs to a pair
//! of roots, so it is rendered relative to whichever root the caller asked for.
//! Language rows come from the snapshot taken when the link changed, filtered
//! by the counterpart's current languages, the same way entity history does.

use super::mapper::language_versions;
use crate::models::{ConnectionHistoryRecord, ConnectionOperation, EntityVersion, SubEntityType};
use uuid::Uuid;

/// Map one link change as seen from `viewed_from`. Returns `None` when the
/// operation does not involve that root.
pub fn map_connection(
    operation: &ConnectionOperation,
    viewed_from: Uuid,
    counterpart: Option<&EntityVersion>,
) -> Option<ConnectionHistoryRecord> {
    let entity_id = operation.counterpart_of(viewed_from)?;
    let snapshot = operation.counterpart_snapshot(viewed_from)?;
    let entity_type = counterpart.map(|version| version.entity_type);

    Some(ConnectionHistoryRecord {
        operation_id: operation.operation_id,
        entity_id,
        entity_type,
        sub_entity_type: SubEntityType::resolve(entity_type, counterpart.map(|v| &v.content)),
        language_versions: language_versions(snapshot, counterpart),
        edited_at: operation.edited_at,
        editor: operation.editor.clone(),
        action: operation.action,
    })
}
