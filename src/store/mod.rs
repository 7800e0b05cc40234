//! # Storage Boundary
//!
//! Everything the engine reads or writes goes through a [`UnitOfWork`]. A unit
//! of work sees one consistent snapshot, buffers its writes and publishes them
//! atomically on [`UnitOfWork::commit`]; dropping it uncommitted discards them.
//!
//! The concrete storage technology is not part of this crate. The bundled
//! [`memory::InMemoryStore`] backs tests and embedded use.

pub mod memory;

use crate::models::{
    ConnectionOperation, EntityType, EntityVersion, FailedScheduledPublish, Language,
    OperationRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use crate::models::Include;
pub use memory::InMemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store conflict: {0}")]
    Conflict(String),

    #[error("Stored data is corrupted: {0}")]
    Corrupted(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledKind {
    Publish,
    Archive,
}

/// One language of one version whose timed transition is due
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledLanguage {
    pub version_id: Uuid,
    pub root_id: Uuid,
    pub entity_type: EntityType,
    pub language: Language,
    pub kind: ScheduledKind,
    pub due_at: DateTime<Utc>,
}

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Version by versioned id, loading only the declared collections
    async fn find_version(
        &self,
        id: Uuid,
        includes: &[Include],
    ) -> StoreResult<Option<EntityVersion>>;

    /// Highest version of a root, loading only the declared collections
    async fn latest_version(
        &self,
        root_id: Uuid,
        includes: &[Include],
    ) -> StoreResult<Option<EntityVersion>>;

    /// All versions of a root, oldest first, fully loaded
    async fn versions_of_root(&self, root_id: Uuid) -> StoreResult<Vec<EntityVersion>>;

    /// Latest version of every service root based on the given general description root
    async fn services_using_general_description(
        &self,
        general_description_root_id: Uuid,
    ) -> StoreResult<Vec<EntityVersion>>;

    /// Scheduled languages due at `now`, oldest first. Pairs with a recorded
    /// failed scheduled publish are left out.
    async fn due_scheduled(&self, now: DateTime<Utc>) -> StoreResult<Vec<ScheduledLanguage>>;

    /// Operations of a root in append order
    async fn operations(&self, root_id: Uuid) -> StoreResult<Vec<OperationRecord>>;

    /// Connection operations touching a root, in append order
    async fn connection_operations(&self, root_id: Uuid) -> StoreResult<Vec<ConnectionOperation>>;

    async fn is_connected(&self, service_root_id: Uuid, channel_root_id: Uuid) -> StoreResult<bool>;

    async fn failed_publishes(&self) -> StoreResult<Vec<FailedScheduledPublish>>;

    async fn failed_publish(&self, id: Uuid) -> StoreResult<Option<FailedScheduledPublish>>;

    /// Insert or replace a version
    async fn save_version(&mut self, version: EntityVersion) -> StoreResult<()>;

    /// Append an operation and return its sequence number
    async fn append_operation(&mut self, operation: OperationRecord) -> StoreResult<u64>;

    async fn append_connection_operation(
        &mut self,
        operation: ConnectionOperation,
    ) -> StoreResult<u64>;

    async fn set_connection(
        &mut self,
        service_root_id: Uuid,
        channel_root_id: Uuid,
        connected: bool,
    ) -> StoreResult<()>;

    async fn record_failed_publish(&mut self, record: FailedScheduledPublish) -> StoreResult<()>;

    /// Returns whether a record was removed
    async fn remove_failed_publish(&mut self, id: Uuid) -> StoreResult<bool>;

    /// Drop failure records covering a version language, returning how many went
    async fn clear_failed_publishes(
        &mut self,
        version_id: Uuid,
        language: &Language,
    ) -> StoreResult<usize>;

    async fn commit(&mut self) -> StoreResult<()>;
}

#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}
