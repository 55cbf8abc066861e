//! # nms-mos
//!
//! MOS (Media Object Server) ingestion gateway. Accepts long-lived TCP
//! connections from newsroom automation systems, applies rundown and story
//! commands to the local store, publishes a notification per applied
//! command, and answers every recognized command with an `roAck`.
//!
//! Data flow per inbound unit:
//! framing → classify → extract → parse → dispatch (lock + timeout) →
//! handler (store) → broadcast → ack.

pub mod api;
pub mod broadcast;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod protocol;
pub mod server;
pub mod store;

pub use context::ClientContext;
pub use dispatch::{DispatchOutcome, Dispatcher, HandlerRegistry, IgnoreReason};
pub use error::{Error, Result};
