//! # Language Availability
//!
//! Per-language publishing state attached to one entity version. Languages are
//! independent: a version may be published in Finnish while its Swedish
//! translation is still a draft.
//!
//! `valid_from`/`valid_to` are only ever set while the status is `Scheduled`:
//! `valid_from` marks a deferred publish, `valid_to` a deferred archive.

use super::Language;
use crate::state_machine::{PublishingStatus, TargetState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageAvailability {
    pub language: Language,
    pub status: PublishingStatus,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
}

impl LanguageAvailability {
    pub fn new(
        language: Language,
        status: PublishingStatus,
        modified_by: impl Into<String>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            language,
            status,
            valid_from: None,
            valid_to: None,
            modified_by: modified_by.into(),
            modified_at,
        }
    }

    pub fn draft(language: Language, modified_by: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(language, PublishingStatus::Draft, modified_by, at)
    }

    pub fn is_scheduled_publish(&self) -> bool {
        self.status == PublishingStatus::Scheduled && self.valid_from.is_some()
    }

    pub fn is_scheduled_archive(&self) -> bool {
        self.status == PublishingStatus::Scheduled && self.valid_to.is_some()
    }

    /// Unpublished working copy: Draft, Modified or waiting for a timed publish
    pub fn is_draft_like(&self) -> bool {
        self.status.is_draft_like() || self.is_scheduled_publish()
    }

    /// Currently visible to the public, including content waiting for a timed archive
    pub fn is_published_like(&self) -> bool {
        self.status == PublishingStatus::Published || self.is_scheduled_archive()
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.valid_from.or(self.valid_to)
    }

    pub fn to_target(&self) -> TargetState {
        TargetState {
            status: self.status,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }

    pub fn apply(&mut self, target: &TargetState, actor: &str, at: DateTime<Utc>) {
        self.status = target.status;
        self.valid_from = target.valid_from;
        self.valid_to = target.valid_to;
        self.modified_by = actor.to_string();
        self.modified_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_flags() {
        let now = Utc::now();
        let mut availability = LanguageAvailability::draft(Language::finnish(), "editor", now);
        assert!(availability.is_draft_like());
        assert!(!availability.is_published_like());

        availability.apply(&TargetState::scheduled_publish(now), "editor", now);
        assert!(availability.is_scheduled_publish());
        assert!(availability.is_draft_like());
        assert_eq!(availability.scheduled_at(), Some(now));

        availability.apply(&TargetState::scheduled_archive(now), "editor", now);
        assert!(availability.is_scheduled_archive());
        assert!(availability.is_published_like());
        assert!(availability.valid_from.is_none());

        availability.apply(&TargetState::settled(PublishingStatus::Published), "editor", now);
        assert!(availability.valid_from.is_none() && availability.valid_to.is_none());
    }
}
