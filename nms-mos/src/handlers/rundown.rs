//! Rundown lifecycle handlers

use async_trait::async_trait;
use chrono::Utc;
use nms_common::db::NewRundown;
use nms_common::events::MosEvent;
use tracing::{debug, info};

use super::{mismatch, processed, CommandHandler, EntityRef, HandlerOutcome, HandlerScope};
use crate::error::Result;
use crate::protocol::{CommandKind, MosCommand};

/// Create-if-absent; a resend for a known rundown updates it in place
pub struct RoCreateHandler;

#[async_trait]
impl CommandHandler for RoCreateHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::RoCreate
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let create = match command {
            MosCommand::RoCreate(create) => create,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let (mut rundown, created) = scope
            .store
            .create_rundown_if_absent(NewRundown {
                client_id: scope.ctx.client_id,
                external_id: create.ro_id.clone(),
                slug: create.slug.clone(),
                meta: create.meta.clone(),
                received_at: Utc::now(),
            })
            .await?;

        if created {
            info!(
                roID = %rundown.external_id,
                rundown_id = rundown.id,
                slug = %rundown.slug,
                "Rundown created"
            );
        } else {
            rundown.slug = create.slug;
            rundown.meta = create.meta;
            scope.store.save_rundown(&rundown).await?;
            debug!(
                roID = %rundown.external_id,
                rundown_id = rundown.id,
                "Rundown resent, updated in place"
            );
        }

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Rundown(rundown.id)],
            notification: MosEvent::RoCreate {
                ro_id: create.ro_id,
                rundown_id: rundown.id,
                slug: rundown.slug,
                created,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Apply present fields to a known rundown; unknown rundowns are a no-op
pub struct RoUpdateHandler;

#[async_trait]
impl CommandHandler for RoUpdateHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::RoUpdate
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let update = match command {
            MosCommand::RoUpdate(update) => update,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let Some(mut rundown) = scope
            .store
            .find_rundown(scope.ctx.client_id, &update.ro_id)
            .await?
        else {
            info!(roID = %update.ro_id, "roUpdate for unknown rundown ignored");
            return Ok(HandlerOutcome {
                message: format!(
                    "{}; rundown not found, nothing to update",
                    processed(self.kind())
                ),
                affected: Vec::new(),
                notification: MosEvent::RoUpdate {
                    ro_id: update.ro_id,
                    rundown_id: None,
                    slug: None,
                    found: false,
                    timestamp: Utc::now(),
                },
            });
        };

        if let Some(slug) = update.slug {
            rundown.slug = slug;
        }
        if let Some(meta) = update.meta {
            rundown.meta = Some(meta);
        }
        scope.store.save_rundown(&rundown).await?;
        info!(roID = %rundown.external_id, rundown_id = rundown.id, "Rundown updated");

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Rundown(rundown.id)],
            notification: MosEvent::RoUpdate {
                ro_id: update.ro_id,
                rundown_id: Some(rundown.id),
                slug: Some(rundown.slug),
                found: true,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Delete a known rundown with its stories; unknown rundowns are a no-op
pub struct RoDeleteHandler;

#[async_trait]
impl CommandHandler for RoDeleteHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::RoDelete
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let delete = match command {
            MosCommand::RoDelete(delete) => delete,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let Some(rundown) = scope
            .store
            .find_rundown(scope.ctx.client_id, &delete.ro_id)
            .await?
        else {
            info!(roID = %delete.ro_id, "roDelete for unknown rundown ignored");
            return Ok(HandlerOutcome {
                message: format!(
                    "{}; rundown not found, nothing to delete",
                    processed(self.kind())
                ),
                affected: Vec::new(),
                notification: MosEvent::RoDelete {
                    ro_id: delete.ro_id,
                    rundown_id: None,
                    stories_removed: 0,
                    found: false,
                    timestamp: Utc::now(),
                },
            });
        };

        let stories_removed = scope.store.delete_rundown(rundown.id).await?;
        info!(
            roID = %rundown.external_id,
            rundown_id = rundown.id,
            stories_removed,
            "Rundown deleted"
        );

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Rundown(rundown.id)],
            notification: MosEvent::RoDelete {
                ro_id: delete.ro_id,
                rundown_id: Some(rundown.id),
                stories_removed,
                found: true,
                timestamp: Utc::now(),
            },
        })
    }
}

/// Unconditional upsert: create when unknown, else overwrite slug and meta
pub struct RoReplaceHandler;

#[async_trait]
impl CommandHandler for RoReplaceHandler {
    fn kind(&self) -> CommandKind {
        CommandKind::RoReplace
    }

    async fn apply(&self, scope: HandlerScope<'_>, command: MosCommand) -> Result<HandlerOutcome> {
        let replace = match command {
            MosCommand::RoReplace(replace) => replace,
            other => return Err(mismatch(self.kind(), &other)),
        };

        let (mut rundown, created) = scope
            .store
            .create_rundown_if_absent(NewRundown {
                client_id: scope.ctx.client_id,
                external_id: replace.ro_id.clone(),
                slug: replace.slug.clone(),
                meta: replace.meta.clone(),
                received_at: Utc::now(),
            })
            .await?;

        if !created {
            rundown.slug = replace.slug;
            rundown.meta = replace.meta;
            scope.store.save_rundown(&rundown).await?;
        }
        info!(roID = %rundown.external_id, rundown_id = rundown.id, created, "Rundown replaced");

        Ok(HandlerOutcome {
            message: processed(self.kind()),
            affected: vec![EntityRef::Rundown(rundown.id)],
            notification: MosEvent::RoReplace {
                ro_id: replace.ro_id,
                rundown_id: rundown.id,
                slug: rundown.slug,
                created,
                timestamp: Utc::now(),
            },
        })
    }
}
