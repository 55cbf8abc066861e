//! Command handlers
//!
//! One handler per [`CommandKind`]. A handler resolves the records it needs
//! through the store (never cached across messages), applies the mutation,
//! and returns the ack message plus the notification to publish. The
//! dispatcher owns locking, timeouts, publishing, and acknowledgment.

pub mod ordering;
mod rundown;
mod story;

pub use rundown::{RoCreateHandler, RoDeleteHandler, RoReplaceHandler, RoUpdateHandler};
pub use story::{
    StoryDeleteHandler, StoryInsertHandler, StoryMoveHandler, StoryReplaceHandler,
    StoryStatusHandler, StorySwapHandler,
};

use async_trait::async_trait;
use nms_common::db::{RundownRecord, StoryRecord};
use nms_common::events::MosEvent;

use crate::context::ClientContext;
use crate::error::{Error, Result};
use crate::protocol::{CommandKind, MosCommand};
use crate::store::RundownStore;

/// Collaborators available to one handler invocation
#[derive(Clone, Copy)]
pub struct HandlerScope<'a> {
    pub store: &'a dyn RundownStore,
    pub ctx: ClientContext,
}

/// Internal record touched by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Rundown(i64),
    Story(i64),
}

/// Successful (or tolerated no-op) handler result
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    /// Acknowledgment message text
    pub message: String,
    pub affected: Vec<EntityRef>,
    pub notification: MosEvent,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command kind this handler applies
    fn kind(&self) -> CommandKind;

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome>;
}

/// Default acknowledgment text for a processed command
pub(crate) fn processed(kind: CommandKind) -> String {
    match kind {
        CommandKind::RoCreate => "roCreate received successfully".to_string(),
        other => format!("{} processed", other.tag()),
    }
}

pub(crate) fn mismatch(expected: CommandKind, got: &MosCommand) -> Error {
    Error::Internal(format!(
        "{} handler received {} command",
        expected,
        got.kind()
    ))
}

/// Rundown by `roID`, or NotFound
pub(crate) async fn require_rundown(scope: HandlerScope<'_>, ro_id: &str) -> Result<RundownRecord> {
    scope
        .store
        .find_rundown(scope.ctx.client_id, ro_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("rundown {}", ro_id)))
}

/// Story by `storyID` within the rundown, or NotFound
pub(crate) async fn require_story(
    scope: HandlerScope<'_>,
    rundown: &RundownRecord,
    story_id: &str,
) -> Result<StoryRecord> {
    if story_id.is_empty() {
        return Err(Error::InvalidCommand("storyID is empty".to_string()));
    }
    scope
        .store
        .find_story(rundown.id, story_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "story {} in rundown {}",
                story_id, rundown.external_id
            ))
        })
}
