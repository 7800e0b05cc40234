use super::content_of;
use crate::error::Result;
use crate::models::{
    description_text, DescriptionType, EntityContent, EntityType, EntityVersion, Include,
};
use crate::publishing::checker::{content_languages, PublishingChecker};
use crate::publishing::rules::{get_entity, ValidationMessage, ValidationMessages};
use crate::store::UnitOfWork;
use async_trait::async_trait;

/// Publishing rules for services.
///
/// Funding type, short and full description per content language, provided
/// languages and target groups are required. A referenced general description
/// must exist and be published.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceVersionedPublishingChecker;

#[async_trait]
impl PublishingChecker for ServiceVersionedPublishingChecker {
    fn entity_type(&self) -> EntityType {
        EntityType::Service
    }

    fn includes(&self) -> &'static [Include] {
        &[Include::Descriptions, Include::Languages, Include::TargetGroups]
    }

    async fn validate(
        &self,
        entity: &EntityVersion,
        uow: &dyn UnitOfWork,
        messages: &mut ValidationMessages,
    ) -> Result<()> {
        let service = content_of(entity, EntityType::Service, |c| match c {
            EntityContent::Service(s) => Some(s),
            _ => None,
        })?;

        messages.require_id("FundingType", service.funding_type_id);

        for language in content_languages(entity) {
            messages.require_string(
                format!("ShortDescription.{language}"),
                description_text(&service.descriptions, &language, DescriptionType::ShortDescription),
            );
            messages.require_string(
                format!("Description.{language}"),
                description_text(&service.descriptions, &language, DescriptionType::Description),
            );
        }

        messages.require_collection("Languages", &service.languages);
        messages.require_collection("TargetGroups", &service.target_groups);

        let general_description = get_entity(
            uow,
            service.general_description_id,
            EntityType::GeneralDescription,
            &[],
        )
        .await?;
        if let Some(general_description) = general_description {
            // Any version counts; an open draft does not hide the published one
            let versions = uow.versions_of_root(general_description.root_id).await?;
            if !versions.iter().any(EntityVersion::has_published_language) {
                messages.push(ValidationMessage::new(
                    "GeneralDescription",
                    "GeneralDescription must be published.",
                ));
            }
        }

        Ok(())
    }
}
