//! # NMS Common Library
//!
//! Shared code for the newsroom MOS gateway crates:
//! - Error type shared by persistence and configuration code
//! - Bootstrap configuration loading (TOML + compiled defaults)
//! - Notification event types and the in-process EventBus
//! - Database initialization and rundown/story record models

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
