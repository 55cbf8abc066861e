//! Command dispatch
//!
//! One inbound unit goes through classify, extract, parse, then the handler
//! runs under the rundown lock within the handler timeout. Recognized
//! commands always produce exactly one acknowledgment; unrecognized input
//! produces none.

mod registry;

pub use registry::HandlerRegistry;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::broadcast::Broadcaster;
use crate::context::ClientContext;
use crate::error::{Error, Result};
use crate::handlers::{CommandHandler, HandlerOutcome, HandlerScope};
use crate::locks::RundownLocks;
use crate::protocol::{
    classify, extract, first_start_tag, has_envelope, CommandKind, MosCommand, RoAck,
};
use crate::store::RundownStore;

/// Why a unit produced no acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No `<mos>` envelope
    NoEnvelope,
    /// Envelope without any known command
    Unrecognized,
    /// Command start tag without a matching end tag
    Unbalanced(CommandKind),
    /// No handler registered for the kind
    NoHandler(CommandKind),
}

/// Terminal state of one inbound unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    Acknowledged { kind: CommandKind, ack: RoAck },
}

impl DispatchOutcome {
    pub fn ack(&self) -> Option<&RoAck> {
        match self {
            DispatchOutcome::Acknowledged { ack, .. } => Some(ack),
            DispatchOutcome::Ignored(_) => None,
        }
    }
}

pub struct Dispatcher {
    registry: HandlerRegistry,
    store: Arc<dyn RundownStore>,
    broadcaster: Arc<dyn Broadcaster>,
    locks: RundownLocks,
    handler_timeout: Duration,
}

impl Dispatcher {
    /// Dispatcher with the standard handler set
    pub fn new(
        store: Arc<dyn RundownStore>,
        broadcaster: Arc<dyn Broadcaster>,
        handler_timeout: Duration,
    ) -> Self {
        Self::with_registry(HandlerRegistry::standard(), store, broadcaster, handler_timeout)
    }

    pub fn with_registry(
        registry: HandlerRegistry,
        store: Arc<dyn RundownStore>,
        broadcaster: Arc<dyn Broadcaster>,
        handler_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            broadcaster,
            locks: RundownLocks::new(),
            handler_timeout,
        }
    }

    /// Process one complete inbound unit
    pub async fn dispatch(&self, ctx: &ClientContext, message: &str) -> DispatchOutcome {
        let Some(kind) = classify(message) else {
            let reason = if !has_envelope(message) {
                IgnoreReason::NoEnvelope
            } else if let Some(kind) = first_start_tag(message) {
                IgnoreReason::Unbalanced(kind)
            } else {
                IgnoreReason::Unrecognized
            };
            warn!(?reason, bytes = message.len(), "Unrecognized MOS message, no ack sent");
            debug!(content = message, "Unrecognized MOS message content");
            return DispatchOutcome::Ignored(reason);
        };

        let Some(fragment) = extract(kind, message) else {
            warn!(%kind, "Unbalanced {} fragment, no ack sent", kind);
            return DispatchOutcome::Ignored(IgnoreReason::Unbalanced(kind));
        };

        let Some(handler) = self.registry.get(kind) else {
            warn!(%kind, "No handler registered, no ack sent");
            return DispatchOutcome::Ignored(IgnoreReason::NoHandler(kind));
        };

        let command = MosCommand::parse(kind, fragment);
        let ro_id = command.ro_id().to_string();
        info!(%kind, roID = %ro_id, client_id = ctx.client_id, "Received {}", kind);

        let result = match tokio::time::timeout(
            self.handler_timeout,
            self.run_handler(handler.as_ref(), *ctx, command),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.handler_timeout.as_millis() as u64)),
        };

        let ack = match result {
            Ok(outcome) => {
                debug!(%kind, roID = %ro_id, affected = ?outcome.affected, "Handler completed");
                let message = outcome.message;
                let notification = outcome.notification;
                self.broadcaster.publish(notification.topic(), notification);
                RoAck::ok(ro_id, message)
            }
            Err(err) => {
                warn!(%kind, roID = %ro_id, error = %err, "Command failed");
                RoAck::error(ro_id, err.to_string())
            }
        };

        DispatchOutcome::Acknowledged { kind, ack }
    }

    async fn run_handler(
        &self,
        handler: &dyn CommandHandler,
        ctx: ClientContext,
        command: MosCommand,
    ) -> Result<HandlerOutcome> {
        if command.ro_id().is_empty() {
            return Err(Error::InvalidCommand("roID is empty".to_string()));
        }

        let _guard = self.locks.acquire(ctx.client_id, command.ro_id()).await;
        let scope = HandlerScope {
            store: self.store.as_ref(),
            ctx,
        };
        handler.apply(scope, command).await
    }
}
