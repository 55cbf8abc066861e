//! Rundown and story records
//!
//! Records are owned by the store. The gateway never caches them across
//! messages: every command re-resolves its rundown and stories by external id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted rundown (MOS running order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RundownRecord {
    /// Internal id (store-owned)
    pub id: i64,
    /// MOS `roID`, unique per tenant
    pub external_id: String,
    pub slug: String,
    /// Free-form metadata blob (raw `mosExternalMetadata` contents)
    pub meta: Option<String>,
    pub client_id: i64,
    pub received_at: DateTime<Utc>,
}

/// Values for a rundown that does not exist yet
#[derive(Debug, Clone)]
pub struct NewRundown {
    pub client_id: i64,
    pub external_id: String,
    pub slug: String,
    pub meta: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Persisted story within a rundown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Internal id (store-owned)
    pub id: i64,
    /// MOS `storyID`, unique within the owning rundown
    pub external_id: String,
    pub title: String,
    /// Workflow status; `None` when unset or not in the vocabulary
    pub status: Option<StoryStatus>,
    /// Zero-based ordinal within the rundown (dense, strictly ordered)
    pub position: i64,
    pub rundown_id: i64,
    pub client_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Values for a story that does not exist yet
///
/// New stories are appended at the end of the rundown; callers reorder
/// afterwards when a position hint applies.
#[derive(Debug, Clone)]
pub struct NewStory {
    pub rundown_id: i64,
    pub client_id: i64,
    pub external_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Closed editorial workflow vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryStatus {
    Draft,
    InReview,
    Approved,
    Rejected,
    Published,
    Archived,
}

impl StoryStatus {
    pub const ALL: [StoryStatus; 6] = [
        StoryStatus::Draft,
        StoryStatus::InReview,
        StoryStatus::Approved,
        StoryStatus::Rejected,
        StoryStatus::Published,
        StoryStatus::Archived,
    ];

    /// Canonical storage/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Draft => "DRAFT",
            StoryStatus::InReview => "IN_REVIEW",
            StoryStatus::Approved => "APPROVED",
            StoryStatus::Rejected => "REJECTED",
            StoryStatus::Published => "PUBLISHED",
            StoryStatus::Archived => "ARCHIVED",
        }
    }

    /// Map a free-form status string onto the vocabulary
    ///
    /// Case-insensitive, surrounding whitespace ignored, `-` and inner spaces
    /// treated as `_`. Returns `None` for anything outside the vocabulary.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
