//! In-process store.
//!
//! `begin` takes an owned lock on the shared state and works on a private
//! copy, so units of work are fully serialized and a dropped unit of work
//! leaves no trace.

use super::{
    Include, ScheduledKind, ScheduledLanguage, StoreError, StoreResult, UnitOfWork,
    UnitOfWorkFactory,
};
use crate::models::{
    ConnectionOperation, EntityContent, EntityVersion, FailedScheduledPublish, Language,
    OperationRecord,
};
use crate::state_machine::PublishingStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct StoreState {
    versions: HashMap<Uuid, EntityVersion>,
    operations: Vec<OperationRecord>,
    connection_operations: Vec<ConnectionOperation>,
    connections: HashSet<(Uuid, Uuid)>,
    failed_publishes: Vec<FailedScheduledPublish>,
    next_sequence: u64,
}

impl StoreState {
    fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn versions_of(&self, root_id: Uuid) -> Vec<&EntityVersion> {
        let mut versions: Vec<_> = self
            .versions
            .values()
            .filter(|v| v.root_id == root_id)
            .collect();
        versions.sort_by_key(|v| (v.version, v.created_at));
        versions
    }

    fn has_failed_publish(&self, version_id: Uuid, language: &Language) -> bool {
        self.failed_publishes
            .iter()
            .any(|record| record.covers(version_id, language))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `begin` fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> StoreState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store switched off".to_string()));
        }
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_version(
        &self,
        id: Uuid,
        includes: &[Include],
    ) -> StoreResult<Option<EntityVersion>> {
        Ok(self.working.versions.get(&id).map(|v| v.projected(includes)))
    }

    async fn latest_version(
        &self,
        root_id: Uuid,
        includes: &[Include],
    ) -> StoreResult<Option<EntityVersion>> {
        Ok(self
            .working
            .versions_of(root_id)
            .last()
            .map(|v| v.projected(includes)))
    }

    async fn versions_of_root(&self, root_id: Uuid) -> StoreResult<Vec<EntityVersion>> {
        Ok(self
            .working
            .versions_of(root_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn services_using_general_description(
        &self,
        general_description_root_id: Uuid,
    ) -> StoreResult<Vec<EntityVersion>> {
        let roots: HashSet<Uuid> = self
            .working
            .versions
            .values()
            .filter(|v| {
                matches!(
                    &v.content,
                    EntityContent::Service(s)
                        if s.general_description_id == Some(general_description_root_id)
                )
            })
            .map(|v| v.root_id)
            .collect();

        let mut services: Vec<EntityVersion> = roots
            .into_iter()
            .filter_map(|root| self.working.versions_of(root).last().map(|v| (*v).clone()))
            .collect();
        services.sort_by_key(|v| v.root_id);
        Ok(services)
    }

    async fn due_scheduled(&self, now: DateTime<Utc>) -> StoreResult<Vec<ScheduledLanguage>> {
        let mut due = Vec::new();
        for version in self.working.versions.values() {
            for (language, availability) in &version.availabilities {
                if availability.status != PublishingStatus::Scheduled {
                    continue;
                }
                let (kind, due_at) = match (availability.valid_from, availability.valid_to) {
                    (Some(at), _) => (ScheduledKind::Publish, at),
                    (None, Some(at)) => (ScheduledKind::Archive, at),
                    (None, None) => {
                        return Err(StoreError::Corrupted(format!(
                            "version {} language {} is scheduled without an instant",
                            version.id, language
                        )))
                    }
                };
                if due_at > now || self.working.has_failed_publish(version.id, language) {
                    continue;
                }
                due.push(ScheduledLanguage {
                    version_id: version.id,
                    root_id: version.root_id,
                    entity_type: version.entity_type,
                    language: language.clone(),
                    kind,
                    due_at,
                });
            }
        }
        due.sort_by(|a, b| {
            (a.due_at, a.version_id, &a.language).cmp(&(b.due_at, b.version_id, &b.language))
        });
        Ok(due)
    }

    async fn operations(&self, root_id: Uuid) -> StoreResult<Vec<OperationRecord>> {
        Ok(self
            .working
            .operations
            .iter()
            .filter(|op| op.root_id == root_id)
            .cloned()
            .collect())
    }

    async fn connection_operations(&self, root_id: Uuid) -> StoreResult<Vec<ConnectionOperation>> {
        Ok(self
            .working
            .connection_operations
            .iter()
            .filter(|op| op.counterpart_of(root_id).is_some())
            .cloned()
            .collect())
    }

    async fn is_connected(&self, service_root_id: Uuid, channel_root_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .working
            .connections
            .contains(&(service_root_id, channel_root_id)))
    }

    async fn failed_publishes(&self) -> StoreResult<Vec<FailedScheduledPublish>> {
        Ok(self.working.failed_publishes.clone())
    }

    async fn failed_publish(&self, id: Uuid) -> StoreResult<Option<FailedScheduledPublish>> {
        Ok(self
            .working
            .failed_publishes
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn save_version(&mut self, version: EntityVersion) -> StoreResult<()> {
        if let Some(existing) = self.working.versions.get(&version.id) {
            if existing.root_id != version.root_id {
                return Err(StoreError::Conflict(format!(
                    "version {} already belongs to root {}",
                    version.id, existing.root_id
                )));
            }
        }
        self.working.versions.insert(version.id, version);
        Ok(())
    }

    async fn append_operation(&mut self, mut operation: OperationRecord) -> StoreResult<u64> {
        if self
            .working
            .operations
            .iter()
            .any(|op| op.operation_id == operation.operation_id)
        {
            return Err(StoreError::Conflict(format!(
                "operation {} already recorded",
                operation.operation_id
            )));
        }
        let sequence = self.working.next_sequence();
        operation.sequence = sequence;
        self.working.operations.push(operation);
        Ok(sequence)
    }

    async fn append_connection_operation(
        &mut self,
        mut operation: ConnectionOperation,
    ) -> StoreResult<u64> {
        if self
            .working
            .connection_operations
            .iter()
            .any(|op| op.operation_id == operation.operation_id)
        {
            return Err(StoreError::Conflict(format!(
                "connection operation {} already recorded",
                operation.operation_id
            )));
        }
        let sequence = self.working.next_sequence();
        operation.sequence = sequence;
        self.working.connection_operations.push(operation);
        Ok(sequence)
    }

    async fn set_connection(
        &mut self,
        service_root_id: Uuid,
        channel_root_id: Uuid,
        connected: bool,
    ) -> StoreResult<()> {
        let key = (service_root_id, channel_root_id);
        if connected {
            self.working.connections.insert(key);
        } else {
            self.working.connections.remove(&key);
        }
        Ok(())
    }

    async fn record_failed_publish(&mut self, record: FailedScheduledPublish) -> StoreResult<()> {
        self.working.failed_publishes.push(record);
        Ok(())
    }

    async fn remove_failed_publish(&mut self, id: Uuid) -> StoreResult<bool> {
        let before = self.working.failed_publishes.len();
        self.working.failed_publishes.retain(|record| record.id != id);
        Ok(self.working.failed_publishes.len() != before)
    }

    async fn clear_failed_publishes(
        &mut self,
        version_id: Uuid,
        language: &Language,
    ) -> StoreResult<usize> {
        let before = self.working.failed_publishes.len();
        self.working
            .failed_publishes
            .retain(|record| !record.covers(version_id, language));
        Ok(before - self.working.failed_publishes.len())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        *self.guard = self.working.clone();
        Ok(())
    }
}

impl StoreState {
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn failed_publish_count(&self) -> usize {
        self.failed_publishes.len()
    }
}
