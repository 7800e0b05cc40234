//! Test data builders shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use publishing_core::events::EventPublisher;
use publishing_core::models::{
    ChannelContent, ChannelKind, Description, DescriptionType, EntityContent, EntityVersion,
    GeneralDescriptionContent, Language, OrganizationContent, ServiceContent,
};
use publishing_core::publishing::{
    CheckerRegistry, NewEntity, PublishingManager, PublishingService, TransitionOutcome,
    TransitionRequest,
};
use publishing_core::state_machine::LanguageEvent;
use publishing_core::store::InMemoryStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

pub const EDITOR: &str = "editor@example.org";

/// A store plus a publishing service wired to it
pub struct TestWorld {
    pub store: Arc<InMemoryStore>,
    pub service: Arc<PublishingService>,
    pub now: DateTime<Utc>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::with_registry(CheckerRegistry::with_default_checkers())
    }

    pub fn with_registry(registry: CheckerRegistry) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let service = Arc::new(PublishingService::new(
            store.clone(),
            PublishingManager::new(registry),
            EventPublisher::new(64),
        ));
        Self {
            store,
            service,
            now: Utc::now(),
        }
    }

    pub fn later(&self, minutes: i64) -> DateTime<Utc> {
        self.now + Duration::minutes(minutes)
    }

    pub async fn create(&self, content: EntityContent, languages: &[(&str, &str)]) -> EntityVersion {
        self.service
            .create_entity(NewEntity {
                content,
                names: names(languages),
                actor: EDITOR.to_string(),
                at: self.now,
            })
            .await
            .expect("entity should be created")
    }

    pub async fn transition(
        &self,
        version_id: Uuid,
        languages: &[&str],
        event: LanguageEvent,
        at: DateTime<Utc>,
    ) -> TransitionOutcome {
        self.service
            .request_transition(TransitionRequest {
                version_id,
                languages: languages.iter().map(|code| Language::new(*code)).collect(),
                event,
                actor: EDITOR.to_string(),
                at,
            })
            .await
            .expect("transition should not error")
    }

    pub async fn publish(&self, version_id: Uuid, languages: &[&str]) -> EntityVersion {
        match self
            .transition(version_id, languages, LanguageEvent::Publish, self.now)
            .await
        {
            TransitionOutcome::Applied { version, .. } => version,
            TransitionOutcome::Rejected(outcome) => panic!("publish rejected: {outcome:?}"),
        }
    }
}

pub fn names(languages: &[(&str, &str)]) -> BTreeMap<Language, String> {
    languages
        .iter()
        .map(|(code, name)| (Language::new(*code), name.to_string()))
        .collect()
}

fn descriptions_for(languages: &[&str], types: &[DescriptionType]) -> Vec<Description> {
    languages
        .iter()
        .flat_map(|code| {
            types.iter().map(move |description_type| {
                Description::new(
                    Language::new(*code),
                    *description_type,
                    format!("{description_type:?} in {code}"),
                )
            })
        })
        .collect()
}

/// Service content that passes its publishing checker in the given languages
pub fn complete_service(languages: &[&str]) -> ServiceContent {
    ServiceContent {
        funding_type_id: Some(Uuid::new_v4()),
        descriptions: descriptions_for(
            languages,
            &[DescriptionType::ShortDescription, DescriptionType::Description],
        ),
        languages: languages.iter().map(|code| Language::new(*code)).collect(),
        target_groups: vec![Uuid::new_v4()],
        ..Default::default()
    }
}

pub fn complete_general_description(languages: &[&str]) -> GeneralDescriptionContent {
    GeneralDescriptionContent {
        descriptions: descriptions_for(languages, &[DescriptionType::ShortDescription]),
        target_groups: vec![Uuid::new_v4()],
        service_classes: vec![Uuid::new_v4()],
        ..Default::default()
    }
}

pub fn organization() -> OrganizationContent {
    OrganizationContent {
        organization_type_id: Some(Uuid::new_v4()),
        ..Default::default()
    }
}

pub fn web_page(organization_root: Uuid, languages: &[&str]) -> ChannelContent {
    ChannelContent {
        kind: ChannelKind::WebPage,
        organization_id: Some(organization_root),
        languages: languages.iter().map(|code| Language::new(*code)).collect(),
        urls: vec!["https://example.org".to_string()],
        ..Default::default()
    }
}
