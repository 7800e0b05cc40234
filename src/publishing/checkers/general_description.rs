use super::content_of;
use crate::error::Result;
use crate::models::{
    description_text, DescriptionType, EntityContent, EntityType, EntityVersion, Include,
};
use crate::publishing::checker::{content_languages, require_names, PublishingChecker};
use crate::publishing::rules::ValidationMessages;
use crate::store::UnitOfWork;
use async_trait::async_trait;

/// Publishing rules for general descriptions
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneralDescriptionPublishingChecker;

#[async_trait]
impl PublishingChecker for GeneralDescriptionPublishingChecker {
    fn entity_type(&self) -> EntityType {
        EntityType::GeneralDescription
    }

    fn includes(&self) -> &'static [Include] {
        &[
            Include::Descriptions,
            Include::TargetGroups,
            Include::ServiceClasses,
        ]
    }

    async fn validate(
        &self,
        entity: &EntityVersion,
        _uow: &dyn UnitOfWork,
        messages: &mut ValidationMessages,
    ) -> Result<()> {
        let general_description = content_of(entity, EntityType::GeneralDescription, |c| match c {
            EntityContent::GeneralDescription(g) => Some(g),
            _ => None,
        })?;

        require_names(entity, messages);
        for language in content_languages(entity) {
            messages.require_string(
                format!("ShortDescription.{language}"),
                description_text(
                    &general_description.descriptions,
                    &language,
                    DescriptionType::ShortDescription,
                ),
            );
        }
        messages.require_collection("ServiceClasses", &general_description.service_classes);
        messages.require_collection("TargetGroups", &general_description.target_groups);

        Ok(())
    }
}
