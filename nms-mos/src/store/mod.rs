//! Rundown/story persistence
//!
//! Handlers talk to persistence only through [`RundownStore`], so they can be
//! exercised against [`MemoryStore`] without a database.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use nms_common::db::{NewRundown, NewStory, RundownRecord, StoryRecord};
use nms_common::Result;

/// Rundown and story persistence operations
///
/// Lookups take external ids scoped by tenant (rundowns) or by owning
/// rundown (stories), so a story can never be resolved through the wrong
/// rundown.
#[async_trait]
pub trait RundownStore: Send + Sync {
    /// Find a rundown by tenant and MOS `roID`
    async fn find_rundown(&self, client_id: i64, external_id: &str)
        -> Result<Option<RundownRecord>>;

    /// Create the rundown unless `(client_id, external_id)` exists
    ///
    /// Returns the stored record and whether it was created. Concurrent
    /// callers resolve to the same record (first write wins).
    async fn create_rundown_if_absent(&self, new: NewRundown) -> Result<(RundownRecord, bool)>;

    /// Persist slug and meta of an existing rundown
    async fn save_rundown(&self, rundown: &RundownRecord) -> Result<()>;

    /// Delete a rundown and all its stories; returns the number of stories removed
    async fn delete_rundown(&self, rundown_id: i64) -> Result<usize>;

    /// Find a story by MOS `storyID` within one rundown
    async fn find_story(&self, rundown_id: i64, external_id: &str) -> Result<Option<StoryRecord>>;

    /// Stories of a rundown in order
    async fn list_stories(&self, rundown_id: i64) -> Result<Vec<StoryRecord>>;

    /// Create the story at the end of the rundown unless it exists
    async fn create_story_if_absent(&self, new: NewStory) -> Result<(StoryRecord, bool)>;

    /// Persist title and status of an existing story (position is untouched)
    async fn save_story(&self, story: &StoryRecord) -> Result<()>;

    /// Delete a story and close the gap it leaves in the rundown order
    ///
    /// Atomic: the stories after it move up one position in the same write.
    async fn delete_story(&self, story_id: i64) -> Result<()>;

    /// Rewrite positions so `ordered_ids[i]` sits at position `i`
    ///
    /// Atomic: either every position is written or none. Every id must
    /// belong to the rundown.
    async fn save_story_order(&self, rundown_id: i64, ordered_ids: &[i64]) -> Result<()>;
}
