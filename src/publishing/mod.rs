//! # Publishing
//!
//! Validation gate and write path for per-language publishing.
//!
//! - [`rules`]: primitive emptiness predicates and the message collector
//! - [`checker`] and [`checkers`]: the checker contract and one checker per content type
//! - [`registry`]: explicit entity type to checker map
//! - [`manager`]: the "may this be published" decision
//! - [`service`]: the single transition entry point used by editors and the scheduler

pub mod checker;
pub mod checkers;
pub mod manager;
pub mod registry;
pub mod rules;
pub mod service;

pub use checker::{CheckerSession, PublishingChecker};
pub use checkers::{
    ChannelPublishingChecker, GeneralDescriptionPublishingChecker, OrganizationPublishingChecker,
    ServiceCollectionPublishingChecker, ServiceVersionedPublishingChecker,
};
pub use manager::{CheckOutcome, PublishingManager};
pub use registry::CheckerRegistry;
pub use rules::{ValidationMessage, ValidationMessages};
pub use service::{
    NewEntity, PublishingService, ScheduledFireOutcome, TransitionOutcome, TransitionRequest,
};
