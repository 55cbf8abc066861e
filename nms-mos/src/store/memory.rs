//! In-memory store (tests and `--memory` runs)

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use nms_common::db::{NewRundown, NewStory, RundownRecord, StoryRecord};
use nms_common::{Error, Result};

use super::RundownStore;

#[derive(Debug, Default)]
struct MemoryState {
    rundowns: HashMap<i64, RundownRecord>,
    stories: HashMap<i64, StoryRecord>,
    next_id: i64,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Non-persistent [`RundownStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RundownStore for MemoryStore {
    async fn find_rundown(
        &self,
        client_id: i64,
        external_id: &str,
    ) -> Result<Option<RundownRecord>> {
        let state = self.read()?;
        Ok(state
            .rundowns
            .values()
            .find(|r| r.client_id == client_id && r.external_id == external_id)
            .cloned())
    }

    async fn create_rundown_if_absent(&self, new: NewRundown) -> Result<(RundownRecord, bool)> {
        let mut state = self.write()?;
        if let Some(existing) = state
            .rundowns
            .values()
            .find(|r| r.client_id == new.client_id && r.external_id == new.external_id)
        {
            return Ok((existing.clone(), false));
        }

        let record = RundownRecord {
            id: state.allocate_id(),
            external_id: new.external_id,
            slug: new.slug,
            meta: new.meta,
            client_id: new.client_id,
            received_at: new.received_at,
        };
        state.rundowns.insert(record.id, record.clone());
        Ok((record, true))
    }

    async fn save_rundown(&self, rundown: &RundownRecord) -> Result<()> {
        let mut state = self.write()?;
        let existing = state
            .rundowns
            .get_mut(&rundown.id)
            .ok_or_else(|| Error::RundownNotFound(rundown.id))?;
        existing.slug = rundown.slug.clone();
        existing.meta = rundown.meta.clone();
        Ok(())
    }

    async fn delete_rundown(&self, rundown_id: i64) -> Result<usize> {
        let mut state = self.write()?;
        if state.rundowns.remove(&rundown_id).is_none() {
            return Err(Error::RundownNotFound(rundown_id));
        }
        let before = state.stories.len();
        state.stories.retain(|_, s| s.rundown_id != rundown_id);
        Ok(before - state.stories.len())
    }

    async fn find_story(&self, rundown_id: i64, external_id: &str) -> Result<Option<StoryRecord>> {
        let state = self.read()?;
        Ok(state
            .stories
            .values()
            .find(|s| s.rundown_id == rundown_id && s.external_id == external_id)
            .cloned())
    }

    async fn list_stories(&self, rundown_id: i64) -> Result<Vec<StoryRecord>> {
        let state = self.read()?;
        let mut stories: Vec<StoryRecord> = state
            .stories
            .values()
            .filter(|s| s.rundown_id == rundown_id)
            .cloned()
            .collect();
        stories.sort_by_key(|s| (s.position, s.id));
        Ok(stories)
    }

    async fn create_story_if_absent(&self, new: NewStory) -> Result<(StoryRecord, bool)> {
        let mut state = self.write()?;
        if !state.rundowns.contains_key(&new.rundown_id) {
            return Err(Error::RundownNotFound(new.rundown_id));
        }

        let mut next_position = 0;
        for story in state.stories.values().filter(|s| s.rundown_id == new.rundown_id) {
            if story.external_id == new.external_id {
                return Ok((story.clone(), false));
            }
            next_position = next_position.max(story.position + 1);
        }

        let record = StoryRecord {
            id: state.allocate_id(),
            external_id: new.external_id,
            title: new.title,
            status: None,
            position: next_position,
            rundown_id: new.rundown_id,
            client_id: new.client_id,
            created_at: new.created_at,
        };
        state.stories.insert(record.id, record.clone());
        Ok((record, true))
    }

    async fn save_story(&self, story: &StoryRecord) -> Result<()> {
        let mut state = self.write()?;
        let existing = state
            .stories
            .get_mut(&story.id)
            .ok_or_else(|| Error::StoryNotFound(story.id))?;
        existing.title = story.title.clone();
        existing.status = story.status;
        Ok(())
    }

    async fn delete_story(&self, story_id: i64) -> Result<()> {
        let mut state = self.write()?;
        let removed = state
            .stories
            .remove(&story_id)
            .ok_or_else(|| Error::StoryNotFound(story_id))?;

        for story in state
            .stories
            .values_mut()
            .filter(|s| s.rundown_id == removed.rundown_id && s.position > removed.position)
        {
            story.position -= 1;
        }
        Ok(())
    }

    async fn save_story_order(&self, rundown_id: i64, ordered_ids: &[i64]) -> Result<()> {
        let mut state = self.write()?;

        // Validate everything before writing anything
        for story_id in ordered_ids {
            match state.stories.get(story_id) {
                Some(story) if story.rundown_id == rundown_id => {}
                _ => {
                    return Err(Error::ForeignStory {
                        story_id: *story_id,
                        rundown_id,
                    })
                }
            }
        }

        for (position, story_id) in ordered_ids.iter().enumerate() {
            if let Some(story) = state.stories.get_mut(story_id) {
                story.position = position as i64;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_rundown(client_id: i64, external_id: &str) -> NewRundown {
        NewRundown {
            client_id,
            external_id: external_id.to_string(),
            slug: "Evening".to_string(),
            meta: None,
            received_at: Utc::now(),
        }
    }

    fn new_story(rundown_id: i64, external_id: &str) -> NewStory {
        NewStory {
            rundown_id,
            client_id: 1,
            external_id: external_id.to_string(),
            title: external_id.to_lowercase(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_rundown_is_idempotent_per_tenant() {
        let store = MemoryStore::new();
        let (first, created) = store
            .create_rundown_if_absent(new_rundown(1, "RO-1"))
            .await
            .unwrap();
        assert!(created);
        let (again, created) = store
            .create_rundown_if_absent(new_rundown(1, "RO-1"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first.id, again.id);

        let (other, created) = store
            .create_rundown_if_absent(new_rundown(2, "RO-1"))
            .await
            .unwrap();
        assert!(created);
        assert_ne!(other.id, first.id);
        assert!(store.find_rundown(3, "RO-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stories_append_and_reorder() {
        let store = MemoryStore::new();
        let (rundown, _) = store.create_rundown_if_absent(new_rundown(1, "RO-1")).await.unwrap();
        let (a, _) = store.create_story_if_absent(new_story(rundown.id, "A")).await.unwrap();
        let (b, _) = store.create_story_if_absent(new_story(rundown.id, "B")).await.unwrap();
        assert_eq!((a.position, b.position), (0, 1));

        store.save_story_order(rundown.id, &[b.id, a.id]).await.unwrap();
        let order: Vec<_> = store
            .list_stories(rundown.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.external_id)
            .collect();
        assert_eq!(order, vec!["B".to_string(), "A".to_string()]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_foreign_story_without_writing() {
        let store = MemoryStore::new();
        let (one, _) = store.create_rundown_if_absent(new_rundown(1, "RO-1")).await.unwrap();
        let (two, _) = store.create_rundown_if_absent(new_rundown(1, "RO-2")).await.unwrap();
        let (a, _) = store.create_story_if_absent(new_story(one.id, "A")).await.unwrap();
        let (b, _) = store.create_story_if_absent(new_story(one.id, "B")).await.unwrap();
        let (x, _) = store.create_story_if_absent(new_story(two.id, "X")).await.unwrap();

        let result = store.save_story_order(one.id, &[b.id, x.id, a.id]).await;
        assert!(matches!(result, Err(Error::ForeignStory { .. })));

        let a_after = store.find_story(one.id, "A").await.unwrap().unwrap();
        assert_eq!(a_after.position, 0);
    }

    #[tokio::test]
    async fn test_delete_rundown_cascades() {
        let store = MemoryStore::new();
        let (rundown, _) = store.create_rundown_if_absent(new_rundown(1, "RO-1")).await.unwrap();
        store.create_story_if_absent(new_story(rundown.id, "A")).await.unwrap();
        store.create_story_if_absent(new_story(rundown.id, "B")).await.unwrap();

        assert_eq!(store.delete_rundown(rundown.id).await.unwrap(), 2);
        assert!(store.list_stories(rundown.id).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_rundown(rundown.id).await,
            Err(Error::RundownNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_story_closes_gap_in_own_rundown_only() {
        let store = MemoryStore::new();
        let (one, _) = store.create_rundown_if_absent(new_rundown(1, "RO-1")).await.unwrap();
        let (two, _) = store.create_rundown_if_absent(new_rundown(1, "RO-2")).await.unwrap();
        let (a, _) = store.create_story_if_absent(new_story(one.id, "A")).await.unwrap();
        store.create_story_if_absent(new_story(one.id, "B")).await.unwrap();
        store.create_story_if_absent(new_story(one.id, "C")).await.unwrap();
        store.create_story_if_absent(new_story(two.id, "X")).await.unwrap();
        store.create_story_if_absent(new_story(two.id, "Y")).await.unwrap();

        store.delete_story(a.id).await.unwrap();

        let positions: Vec<_> = store
            .list_stories(one.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| (s.external_id, s.position))
            .collect();
        assert_eq!(positions, vec![("B".to_string(), 0), ("C".to_string(), 1)]);

        let y = store.find_story(two.id, "Y").await.unwrap().unwrap();
        assert_eq!(y.position, 1);
        assert!(matches!(store.delete_story(a.id).await, Err(Error::StoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_story_requires_existing_rundown() {
        let store = MemoryStore::new();
        let result = store.create_story_if_absent(new_story(99, "A")).await;
        assert!(matches!(result, Err(Error::RundownNotFound(99))));
    }
}
