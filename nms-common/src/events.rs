//! Notification types and EventBus
//!
//! Every applied MOS command produces one [`MosEvent`], published on the
//! topic for its entity kind. Events serialize with an `action` tag
//! (`RO_CREATE`, `STORY_INSERT`, ...) and camelCase fields
//! (`roId`, `storyId`, `rundownId`, `storyDbId`) for UI consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::db::StoryStatus;

/// Notification channel per entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Rundown lifecycle (`/topic/mos/rundown`)
    #[serde(rename = "/topic/mos/rundown")]
    Rundown,
    /// Story lifecycle and ordering (`/topic/mos/story`)
    #[serde(rename = "/topic/mos/story")]
    Story,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Rundown => "/topic/mos/rundown",
            Topic::Story => "/topic/mos/story",
        }
    }

    /// Accepts the full topic path or its short name (`rundown`, `story`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "/topic/mos/rundown" | "rundown" => Some(Topic::Rundown),
            "/topic/mos/story" | "story" => Some(Topic::Story),
            _ => None,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MOS gateway notification payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum MosEvent {
    /// Rundown created (or already present)
    RoCreate {
        ro_id: String,
        rundown_id: i64,
        slug: String,
        /// False when the rundown already existed
        created: bool,
        timestamp: DateTime<Utc>,
    },

    /// Rundown update applied, or ignored because the rundown is unknown
    RoUpdate {
        ro_id: String,
        rundown_id: Option<i64>,
        slug: Option<String>,
        found: bool,
        timestamp: DateTime<Utc>,
    },

    /// Rundown deleted with its stories, or ignored because unknown
    RoDelete {
        ro_id: String,
        rundown_id: Option<i64>,
        stories_removed: usize,
        found: bool,
        timestamp: DateTime<Utc>,
    },

    /// Rundown replaced (created when unknown)
    RoReplace {
        ro_id: String,
        rundown_id: i64,
        slug: String,
        created: bool,
        timestamp: DateTime<Utc>,
    },

    StoryInsert {
        ro_id: String,
        story_id: String,
        slug: String,
        rundown_id: i64,
        story_db_id: i64,
        position: i64,
        /// False when the story already existed (idempotent resend)
        created: bool,
        timestamp: DateTime<Utc>,
    },

    StoryReplace {
        ro_id: String,
        story_id: String,
        slug: String,
        rundown_id: i64,
        story_db_id: i64,
        timestamp: DateTime<Utc>,
    },

    StoryDelete {
        ro_id: String,
        story_id: String,
        rundown_id: i64,
        story_db_id: i64,
        timestamp: DateTime<Utc>,
    },

    StoryMove {
        ro_id: String,
        story_id: String,
        story_id_before: Option<String>,
        story_id_after: Option<String>,
        rundown_id: i64,
        story_db_id: i64,
        position: i64,
        timestamp: DateTime<Utc>,
    },

    StorySwap {
        ro_id: String,
        story_id1: String,
        story_id2: String,
        rundown_id: i64,
        story_db_id1: i64,
        story_db_id2: i64,
        timestamp: DateTime<Utc>,
    },

    StoryStatus {
        ro_id: String,
        story_id: String,
        /// Status string as received
        status: Option<String>,
        /// Vocabulary value stored (None when unknown or absent)
        mapped_status: Option<StoryStatus>,
        rundown_id: i64,
        story_db_id: i64,
        timestamp: DateTime<Utc>,
    },
}

impl MosEvent {
    /// Action name as serialized in the `action` field
    pub fn action(&self) -> &'static str {
        match self {
            MosEvent::RoCreate { .. } => "RO_CREATE",
            MosEvent::RoUpdate { .. } => "RO_UPDATE",
            MosEvent::RoDelete { .. } => "RO_DELETE",
            MosEvent::RoReplace { .. } => "RO_REPLACE",
            MosEvent::StoryInsert { .. } => "STORY_INSERT",
            MosEvent::StoryReplace { .. } => "STORY_REPLACE",
            MosEvent::StoryDelete { .. } => "STORY_DELETE",
            MosEvent::StoryMove { .. } => "STORY_MOVE",
            MosEvent::StorySwap { .. } => "STORY_SWAP",
            MosEvent::StoryStatus { .. } => "STORY_STATUS",
        }
    }

    /// Channel this event is published on
    pub fn topic(&self) -> Topic {
        match self {
            MosEvent::RoCreate { .. }
            | MosEvent::RoUpdate { .. }
            | MosEvent::RoDelete { .. }
            | MosEvent::RoReplace { .. } => Topic::Rundown,
            _ => Topic::Story,
        }
    }

    /// MOS `roID` the event refers to
    pub fn ro_id(&self) -> &str {
        match self {
            MosEvent::RoCreate { ro_id, .. }
            | MosEvent::RoUpdate { ro_id, .. }
            | MosEvent::RoDelete { ro_id, .. }
            | MosEvent::RoReplace { ro_id, .. }
            | MosEvent::StoryInsert { ro_id, .. }
            | MosEvent::StoryReplace { ro_id, .. }
            | MosEvent::StoryDelete { ro_id, .. }
            | MosEvent::StoryMove { ro_id, .. }
            | MosEvent::StorySwap { ro_id, .. }
            | MosEvent::StoryStatus { ro_id, .. } => ro_id,
        }
    }
}

/// Event together with the topic it was published on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub topic: Topic,
    pub event: MosEvent,
}

// ========================================
// EventBus Implementation
// ========================================

/// Central notification distribution bus
///
/// Uses `tokio::broadcast` internally:
/// - Non-blocking publish (slow subscribers don't block MOS connections)
/// - Multiple concurrent subscribers (SSE clients)
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to all future notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Publish a notification to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        notification: Notification,
    ) -> Result<usize, broadcast::error::SendError<Notification>> {
        self.tx.send(notification)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
