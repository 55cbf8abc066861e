//! Persistence and configuration errors
//!
//! Store lookups by external id return `Ok(None)`; the `*NotFound` variants
//! are for writes addressed by internal id whose row is gone.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable config file or a value `validate()` rejects
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("rundown id {0} not found")]
    RundownNotFound(i64),

    #[error("story id {0} not found")]
    StoryNotFound(i64),

    /// Reorder referenced a story owned by another rundown
    #[error("story id {story_id} does not belong to rundown id {rundown_id}")]
    ForeignStory { story_id: i64, rundown_id: i64 },

    /// Poisoned lock or a row missing right after its own insert
    #[error("Internal error: {0}")]
    Internal(String),
}
