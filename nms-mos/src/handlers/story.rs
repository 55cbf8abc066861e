//! Story lifecycle and ordering handlers
//!
//! Every story lookup goes through its rundown, so a story referenced under
//! the wrong `roID` is NotFound. Order changes are computed on the full id
//! list and written back with one `save_story_order` call; deletes compact
//! the order inside the store.

use async_trait::async_trait;
use chrono::Utc;
use nms_common::db::{NewStory, StoryRecord, StoryStatus};
use nms_common::events::MosEvent;
use tracing::{info, warn};

use super::ordering::{move_story, position_of, swap_stories};
use super::{
    mismatch, processed, require_rundown, require_story, CommandHandler, EntityRef,
    HandlerOutcome, HandlerScope,
};
use crate::error::{Error, Result};
use crate::protocol::{CommandKind, MosCommand};

fn story_ids(stories: &[StoryRecord]) -> Vec<i64> {
    stories.iter().map(|story| story.id).collect()
}

/// Internal id of an anchor story; unresolved anchors count as absent
fn anchor_id(
    stories: &[StoryRecord],
    anchor: Option<&str>,
    ro_id: &str,
    field: &str,
) -> Option<i64> {
    let anchor = anchor?;
    let found = stories.iter().find(|story| story.external_id == anchor);
    if found.is_none() {
        warn!(roID = %ro_id, anchor, field, "Anchor story not found, ignoring");
    }
    found.map(|story| story.id)
}

/// Persist `order` unless positions already match it
async fn write_order(
    scope: HandlerScope<'_>,
    rundown_id: i64,
    stories: &[StoryRecord],
    order: &[i64],
) -> Result<()> {
    let unchanged = stories.len() == order.len()
        && stories
            .iter()
            .zip(order)
            .enumerate()
            .all(|(index, (story, &id))| story.id == id && story.position == index as i64);
    if !unchanged {
        scope.store.save_story_order(rundown_id, order).await?;
    }
    Ok(())
}

/// Create-if-absent within a known rundown; optional placement hints
pub struct StoryInsertHandler;

#[async_trait]
impl CommandHandler for StoryInsertHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::StoryInsert
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let insert = match command {
            MosCommand::StoryInsert(insert) => insert,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let rundown = require_rundown(scope, &insert.ro_id).await?;
        if insert.story_id.is_empty() {
            return Err(Error::InvalidCommand("storyID is empty".to_string()));
        }

        let (story, created) = scope
            .store
            .create_story_if_absent(NewStory {
                rundown_id: rundown.id,
                client_id: scope.ctx.client_id,
                external_id: insert.story_id.clone(),
                title: insert.story_slug.clone(),
                created_at: Utc::now(),
            })
            .await?;

        let mut position = story.position;
        let hinted = insert.story_id_before.is_some() || insert.story_id_after.is_some();
        if created && hinted {
            let stories = scope.store.list_stories(rundown.id).await?;
            let before = anchor_id(
                &stories,
                insert.story_id_before.as_deref(),
                &insert.ro_id,
                "storyIDBefore",
            );
            let after = anchor_id(
                &stories,
                insert.story_id_after.as_deref(),
                &insert.ro_id,
                "storyIDAfter",
            );

            let order = move_story(&story_ids(&stories), story.id, before, after);
            write_order(scope, rundown.id, &stories, &order).await?;
            position = position_of(&order, story.id).map_or(position, |index| index as i64);
        }

        if created {
            info!(
                roID = %insert.ro_id,
                storyID = %insert.story_id,
                story_db_id = story.id,
                position,
                "Story inserted"
            );
        } else {
            info!(
                roID = %insert.ro_id,
                storyID = %insert.story_id,
                story_db_id = story.id,
                "Story already exists, insert ignored"
            );
        }

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Rundown(rundown.id), EntityRef::Story(story.id)],
            notification: MosEvent::StoryInsert {
                ro_id: insert.ro_id,
                story_id: insert.story_id,
                slug: story.title,
                rundown_id: rundown.id,
                story_db_id: story.id,
                position,
                created,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Overwrite story fields in place (position preserved)
pub struct StoryReplaceHandler;

#[async_trait]
impl CommandHandler for StoryReplaceHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::StoryReplace
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let replace = match command {
            MosCommand::StoryReplace(replace) => replace,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let rundown = require_rundown(scope, &replace.ro_id).await?;
        let mut story = require_story(scope, &rundown, &replace.story_id).await?;

        story.title = replace.story_slug;
        scope.store.save_story(&story).await?;
        info!(
            roID = %replace.ro_id,
            storyID = %replace.story_id,
            story_db_id = story.id,
            "Story replaced"
        );

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Story(story.id)],
            notification: MosEvent::StoryReplace {
                ro_id: replace.ro_id,
                story_id: replace.story_id,
                slug: story.title,
                rundown_id: rundown.id,
                story_db_id: story.id,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Remove a story and compact the remaining order
pub struct StoryDeleteHandler;

#[async_trait]
impl CommandHandler for StoryDeleteHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::StoryDelete
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let delete = match command {
            MosCommand::StoryDelete(delete) => delete,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let rundown = require_rundown(scope, &delete.ro_id).await?;
        let story = require_story(scope, &rundown, &delete.story_id).await?;

        scope.store.delete_story(story.id).await?;
        info!(
            roID = %delete.ro_id,
            storyID = %delete.story_id,
            story_db_id = story.id,
            "Story deleted"
        );

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Story(story.id)],
            notification: MosEvent::StoryDelete {
                ro_id: delete.ro_id,
                story_id: delete.story_id,
                rundown_id: rundown.id,
                story_db_id: story.id,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Re-splice a story between its anchors
pub struct StoryMoveHandler;

#[async_trait]
impl CommandHandler for StoryMoveHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::StoryMove
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let story_move = match command {
            MosCommand::StoryMove(story_move) => story_move,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let rundown = require_rundown(scope, &story_move.ro_id).await?;
        let story = require_story(scope, &rundown, &story_move.story_id).await?;

        let stories = scope.store.list_stories(rundown.id).await?;
        let before = anchor_id(
            &stories,
            story_move.story_id_before.as_deref(),
            &story_move.ro_id,
            "storyIDBefore",
        );
        let after = anchor_id(
            &stories,
            story_move.story_id_after.as_deref(),
            &story_move.ro_id,
            "storyIDAfter",
        );

        let order = move_story(&story_ids(&stories), story.id, before, after);
        write_order(scope, rundown.id, &stories, &order).await?;
        let position =
            position_of(&order, story.id).map_or(story.position, |index| index as i64);
        info!(
            roID = %story_move.ro_id,
            storyID = %story_move.story_id,
            story_db_id = story.id,
            position,
            "Story moved"
        );

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Story(story.id)],
            notification: MosEvent::StoryMove {
                ro_id: story_move.ro_id,
                story_id: story_move.story_id,
                story_id_before: story_move.story_id_before,
                story_id_after: story_move.story_id_after,
                rundown_id: rundown.id,
                story_db_id: story.id,
                position,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Exchange the positions of two stories of one rundown
pub struct StorySwapHandler;

#[async_trait]
impl CommandHandler for StorySwapHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::StorySwap
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let swap = match command {
            MosCommand::StorySwap(swap) => swap,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let rundown = require_rundown(scope, &swap.ro_id).await?;
        let first = require_story(scope, &rundown, &swap.story_id1).await?;
        let second = require_story(scope, &rundown, &swap.story_id2).await?;

        if first.id != second.id {
            let stories = scope.store.list_stories(rundown.id).await?;
            let order = swap_stories(&story_ids(&stories), first.id, second.id).ok_or_else(|| {
                Error::Internal(format!("swap stories missing from rundown {}", swap.ro_id))
            })?;
            scope.store.save_story_order(rundown.id, &order).await?;
        }
        info!(
            roID = %swap.ro_id,
            storyID1 = %swap.story_id1,
            storyID2 = %swap.story_id2,
            "Stories swapped"
        );

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Story(first.id), EntityRef::Story(second.id)],
            notification: MosEvent::StorySwap {
                ro_id: swap.ro_id,
                story_id1: swap.story_id1,
                story_id2: swap.story_id2,
                rundown_id: rundown.id,
                story_db_id1: first.id,
                story_db_id2: second.id,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Map and store a workflow status; unknown values clear it
pub struct StoryStatusHandler;

#[async_trait]
impl CommandHandler for StoryStatusHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::StoryStatus
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let status = match command {
            MosCommand::StoryStatus(status) => status,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let rundown = require_rundown(scope, &status.ro_id).await?;
        let mut story = require_story(scope, &rundown, &status.story_id).await?;

        let mapped = status.status.as_deref().and_then(StoryStatus::parse);
        if let (Some(raw), None) = (status.status.as_deref(), mapped) {
            warn!(
                roID = %status.ro_id,
                storyID = %status.story_id,
                status = raw,
                "Unknown story status, storing as unset"
            );
        }

        story.status = mapped;
        scope.store.save_story(&story).await?;
        info!(
            roID = %status.ro_id,
            storyID = %status.story_id,
            status = ?mapped,
            "Story status updated"
        );

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Story(story.id)],
            notification: MosEvent::StoryStatus {
                ro_id: status.ro_id,
                story_id: status.story_id,
                status: status.status,
                mapped_status: mapped,
                rundown_id: rundown.id,
                story_db_id: story.id,
                timestamp: Utc::now(),
            },
        })
    }
}
