//! Explicit map from entity type to checker instance.

use super::checker::PublishingChecker;
use super::checkers::{
    ChannelPublishingChecker, GeneralDescriptionPublishingChecker, OrganizationPublishingChecker,
    ServiceCollectionPublishingChecker, ServiceVersionedPublishingChecker,
};
use crate::models::EntityType;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
pub struct CheckerRegistry {
    checkers: HashMap<EntityType, Arc<dyn PublishingChecker>>,
}

impl CheckerRegistry {
    /// Empty registry; every type resolves to no checker
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled checker for every content type
    pub fn with_default_checkers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ServiceVersionedPublishingChecker));
        registry.register(Arc::new(ChannelPublishingChecker));
        registry.register(Arc::new(OrganizationPublishingChecker));
        registry.register(Arc::new(GeneralDescriptionPublishingChecker));
        registry.register(Arc::new(ServiceCollectionPublishingChecker));
        registry
    }

    /// Register a checker, replacing any previous one for the same type
    pub fn register(&mut self, checker: Arc<dyn PublishingChecker>) -> Option<Arc<dyn PublishingChecker>> {
        let entity_type = checker.entity_type();
        debug!(entity_type = %entity_type, "Registering publishing checker");
        self.checkers.insert(entity_type, checker)
    }

    pub fn resolve(&self, entity_type: EntityType) -> Option<Arc<dyn PublishingChecker>> {
        self.checkers.get(&entity_type).cloned()
    }

    pub fn registered_types(&self) -> Vec<EntityType> {
        let mut types: Vec<_> = self.checkers.keys().copied().collect();
        types.sort();
        types
    }
}

impl std::fmt::Debug for CheckerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckerRegistry")
            .field("registered_types", &self.registered_types())
            .finish()
    }
}
