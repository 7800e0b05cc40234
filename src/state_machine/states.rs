use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publishing state of one language of one entity version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    /// Unpublished content, never published in this language
    #[default]
    Draft,
    /// Visible to the public
    Published,
    /// Waiting for a timed publish (`valid_from`) or timed archive (`valid_to`)
    Scheduled,
    /// Withdrawn from public view, restorable
    Archived,
    /// Deleted; no further transitions
    Removed,
    /// Replaced by a newer published version
    OldPublished,
    /// Draft copy of previously published content
    Modified,
}

impl PublishingStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Removed | Self::OldPublished)
    }

    /// Check if this status marks an unpublished working copy
    pub fn is_draft_like(&self) -> bool {
        matches!(self, Self::Draft | Self::Modified)
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Published)
    }
}

impl fmt::Display for PublishingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Archived => write!(f, "archived"),
            Self::Removed => write!(f, "removed"),
            Self::OldPublished => write!(f, "old_published"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

impl std::str::FromStr for PublishingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "scheduled" => Ok(Self::Scheduled),
            "archived" => Ok(Self::Archived),
            "removed" => Ok(Self::Removed),
            "old_published" => Ok(Self::OldPublished),
            "modified" => Ok(Self::Modified),
            _ => Err(format!("Invalid publishing status: {s}")),
        }
    }
}

/// Status plus schedule window a transition moves a language into.
///
/// Only the `scheduled_*` constructors set a window, which keeps the rule that
/// `valid_from`/`valid_to` exist only for `Scheduled` in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetState {
    pub status: PublishingStatus,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl TargetState {
    pub fn settled(status: PublishingStatus) -> Self {
        debug_assert!(status != PublishingStatus::Scheduled);
        Self {
            status,
            valid_from: None,
            valid_to: None,
        }
    }

    pub fn scheduled_publish(at: DateTime<Utc>) -> Self {
        Self {
            status: PublishingStatus::Scheduled,
            valid_from: Some(at),
            valid_to: None,
        }
    }

    pub fn scheduled_archive(at: DateTime<Utc>) -> Self {
        Self {
            status: PublishingStatus::Scheduled,
            valid_from: None,
            valid_to: Some(at),
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == PublishingStatus::Scheduled
    }
}
