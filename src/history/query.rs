//! Paged history queries over the two audit streams.

use super::connection::map_connection;
use super::mapper::{flatten, map_operation, MappingContext};
use crate::config::PublishingConfig;
use crate::error::{PublishingError, Result};
use crate::logging::log_history_query;
use crate::models::{ConnectionHistoryRecord, HistoryPage, HistoryRecord};
use crate::store::UnitOfWorkFactory;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

pub struct HistoryService {
    store: Arc<dyn UnitOfWorkFactory>,
    page_size: usize,
}

impl HistoryService {
    pub fn new(store: Arc<dyn UnitOfWorkFactory>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    pub fn from_config(store: Arc<dyn UnitOfWorkFactory>, config: &PublishingConfig) -> Self {
        Self::new(store, config.history.page_size)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Entity history of a root, newest first. Pages count parent operations
    /// (starting at 1); each parent is followed by its sub-operations.
    pub async fn entity_history(&self, root_id: Uuid, page: usize) -> Result<HistoryPage<HistoryRecord>> {
        let offset = self.offset(page)?;
        let uow = self.store.begin().await?;

        let mut operations = uow.operations(root_id).await?;
        operations.sort_by(|a, b| {
            b.edited_at
                .cmp(&a.edited_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        let is_more_available = operations.len() > offset.saturating_add(self.page_size);
        let page_ops: Vec<_> = operations
            .into_iter()
            .skip(offset)
            .take(self.page_size)
            .collect();

        let roots: BTreeSet<Uuid> = page_ops
            .iter()
            .flat_map(|op| {
                std::iter::once(op.root_id).chain(op.sub_operations.iter().map(|sub| sub.root_id))
            })
            .collect();
        let mut context = MappingContext::new();
        for root in roots {
            if let Some(version) = uow.latest_version(root, &[]).await? {
                context.insert(version);
            }
        }

        let records = flatten(
            page_ops
                .iter()
                .map(|op| map_operation(op, &context))
                .collect(),
        );

        log_history_query("entity", root_id, page, records.len(), is_more_available);
        Ok(HistoryPage {
            data: records,
            page,
            is_more_available,
        })
    }

    /// Link changes touching a root, newest first, rendered from the other side
    pub async fn connection_history(
        &self,
        root_id: Uuid,
        page: usize,
    ) -> Result<HistoryPage<ConnectionHistoryRecord>> {
        let offset = self.offset(page)?;
        let uow = self.store.begin().await?;

        let mut operations = uow.connection_operations(root_id).await?;
        operations.sort_by(|a, b| {
            b.edited_at
                .cmp(&a.edited_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        let is_more_available = operations.len() > offset.saturating_add(self.page_size);
        let page_ops: Vec<_> = operations
            .into_iter()
            .skip(offset)
            .take(self.page_size)
            .collect();

        let mut counterparts = HashMap::new();
        for op in &page_ops {
            if let Some(other) = op.counterpart_of(root_id) {
                if !counterparts.contains_key(&other) {
                    let version = uow.latest_version(other, &[]).await?;
                    counterparts.insert(other, version);
                }
            }
        }

        let records: Vec<ConnectionHistoryRecord> = page_ops
            .iter()
            .filter_map(|op| {
                let counterpart = op
                    .counterpart_of(root_id)
                    .and_then(|other| counterparts.get(&other))
                    .and_then(Option::as_ref);
                map_connection(op, root_id, counterpart)
            })
            .collect();

        log_history_query("connection", root_id, page, records.len(), is_more_available);
        Ok(HistoryPage {
            data: records,
            page,
            is_more_available,
        })
    }

    fn offset(&self, page: usize) -> Result<usize> {
        if page == 0 {
            return Err(PublishingError::InvalidRequest(
                "history pages start at 1".to_string(),
            ));
        }
        // Pages past the end come back empty
        Ok((page - 1).saturating_mul(self.page_size))
    }
}
