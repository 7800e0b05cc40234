use super::content_of;
use crate::error::Result;
use crate::models::{EntityContent, EntityType, EntityVersion, Include};
use crate::publishing::checker::{require_names, PublishingChecker};
use crate::publishing::rules::{get_entity, ValidationMessages};
use crate::store::UnitOfWork;
use async_trait::async_trait;

#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceCollectionPublishingChecker;

#[async_trait]
impl PublishingChecker for ServiceCollectionPublishingChecker {
    fn entity_type(&self) -> EntityType {
        EntityType::ServiceCollection
    }

    fn includes(&self) -> &'static [Include] {
        &[]
    }

    async fn validate(
        &self,
        entity: &EntityVersion,
        uow: &dyn UnitOfWork,
        messages: &mut ValidationMessages,
    ) -> Result<()> {
        let collection = content_of(entity, EntityType::ServiceCollection, |c| match c {
            EntityContent::ServiceCollection(sc) => Some(sc),
            _ => None,
        })?;

        if messages.require_id("Organization", collection.organization_id) {
            get_entity(uow, collection.organization_id, EntityType::Organization, &[]).await?;
        }
        require_names(entity, messages);

        Ok(())
    }
}
