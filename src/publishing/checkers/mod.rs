//! Concrete checkers, one per content type.

mod channel;
mod general_description;
mod organization;
mod service;
mod service_collection;

pub use channel::ChannelPublishingChecker;
pub use general_description::GeneralDescriptionPublishingChecker;
pub use organization::OrganizationPublishingChecker;
pub use service::ServiceVersionedPublishingChecker;
pub use service_collection::ServiceCollectionPublishingChecker;

use crate::error::{PublishingError, Result};
use crate::models::{EntityContent, EntityType, EntityVersion};

/// Borrow the content payload, failing when the stored content disagrees with the type tag
fn content_of<'a, T>(
    entity: &'a EntityVersion,
    expected: EntityType,
    select: impl FnOnce(&'a EntityContent) -> Option<&'a T>,
) -> Result<&'a T> {
    select(&entity.content).ok_or(PublishingError::EntityTypeMismatch {
        id: entity.id,
        expected,
        actual: entity.content.entity_type(),
    })
}
