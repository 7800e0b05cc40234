use super::content_of;
use crate::error::Result;
use crate::models::{ChannelKind, EntityContent, EntityType, EntityVersion, Include};
use crate::publishing::checker::{require_names, PublishingChecker};
use crate::publishing::rules::{get_entity, ValidationMessages};
use crate::store::UnitOfWork;
use async_trait::async_trait;

/// Publishing rules for service channels; contact details depend on the channel kind
#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelPublishingChecker;

#[async_trait]
impl PublishingChecker for ChannelPublishingChecker {
    fn entity_type(&self) -> EntityType {
        EntityType::Channel
    }

    fn includes(&self) -> &'static [Include] {
        &[
            Include::Languages,
            Include::Urls,
            Include::PhoneNumbers,
            Include::Addresses,
        ]
    }

    async fn validate(
        &self,
        entity: &EntityVersion,
        uow: &dyn UnitOfWork,
        messages: &mut ValidationMessages,
    ) -> Result<()> {
        let channel = content_of(entity, EntityType::Channel, |c| match c {
            EntityContent::Channel(ch) => Some(ch),
            _ => None,
        })?;

        if messages.require_id("Organization", channel.organization_id) {
            get_entity(uow, channel.organization_id, EntityType::Organization, &[]).await?;
        }
        require_names(entity, messages);
        messages.require_collection("Languages", &channel.languages);

        match channel.kind {
            ChannelKind::EChannel | ChannelKind::WebPage | ChannelKind::PrintableForm => {
                messages.require_collection("Urls", &channel.urls);
            }
            ChannelKind::Phone => {
                messages.require_collection("PhoneNumbers", &channel.phone_numbers);
            }
            ChannelKind::ServiceLocation => {
                messages.require_collection("Addresses", &channel.addresses);
            }
        }

        Ok(())
    }
}
