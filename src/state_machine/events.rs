use crate::models::HistoryAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events that can trigger a per-language publishing transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "at", rename_all = "snake_case")]
pub enum LanguageEvent {
    /// Save content; creates the language as a draft on first save
    SaveDraft,
    /// Publish immediately (or fire a due timed publish)
    Publish,
    /// Publish at the given instant
    SchedulePublish(DateTime<Utc>),
    /// Archive published content at the given instant
    ScheduleArchive(DateTime<Utc>),
    /// Drop a pending timed publish or archive
    CancelSchedule,
    Archive,
    /// Bring archived content back as a draft
    Restore,
    /// Take published content back to draft
    Withdraw,
    Remove,
    /// A newer version of the same root was published in this language
    Supersede,
}

impl LanguageEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SaveDraft => "save_draft",
            Self::Publish => "publish",
            Self::SchedulePublish(_) => "schedule_publish",
            Self::ScheduleArchive(_) => "schedule_archive",
            Self::CancelSchedule => "cancel_schedule",
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::Withdraw => "withdraw",
            Self::Remove => "remove",
            Self::Supersede => "supersede",
        }
    }

    /// Events that must pass the publishing checker before they are applied
    pub fn requires_publishing_gate(&self) -> bool {
        matches!(self, Self::Publish | Self::SchedulePublish(_))
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::SchedulePublish(at) | Self::ScheduleArchive(at) => Some(*at),
            _ => None,
        }
    }

    pub fn history_action(&self) -> HistoryAction {
        match self {
            Self::SaveDraft => HistoryAction::Save,
            Self::Publish => HistoryAction::Publish,
            Self::SchedulePublish(_) => HistoryAction::SchedulePublish,
            Self::ScheduleArchive(_) => HistoryAction::ScheduleArchive,
            Self::CancelSchedule => HistoryAction::CancelSchedule,
            Self::Archive => HistoryAction::Archive,
            Self::Restore => HistoryAction::Restore,
            Self::Withdraw => HistoryAction::Withdraw,
            Self::Remove => HistoryAction::Remove,
            Self::Supersede => HistoryAction::Supersede,
        }
    }
}
