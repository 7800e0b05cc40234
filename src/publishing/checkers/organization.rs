use super::content_of;
use crate::error::Result;
use crate::models::{EntityContent, EntityType, EntityVersion, Include};
use crate::publishing::checker::{require_names, PublishingChecker};
use crate::publishing::rules::{get_entity, ValidationMessages};
use crate::store::UnitOfWork;
use async_trait::async_trait;

#[derive(Debug, Default, Clone, Copy)]
pub struct OrganizationPublishingChecker;

#[async_trait]
impl PublishingChecker for OrganizationPublishingChecker {
    fn entity_type(&self) -> EntityType {
        EntityType::Organization
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
        let organization = content_of(entity, EntityType::Organization, |c| match c {
            EntityContent::Organization(o) => Some(o),
            _ => None,
        })?;

        messages.require_id("OrganizationType", organization.organization_type_id);
        require_names(entity, messages);

        // Parent is optional but must resolve when set
        get_entity(
            uow,
            organization.parent_organization_id,
            EntityType::Organization,
            &[],
        )
        .await?;

        Ok(())
    }
}
