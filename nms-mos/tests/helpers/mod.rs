//! Shared fixtures for gateway integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use nms_common::events::{EventBus, Notification};
use nms_mos::protocol::RoAck;
use nms_mos::store::{MemoryStore, RundownStore, SqliteStore};
use nms_mos::{ClientContext, DispatchOutcome, Dispatcher};
use tokio::sync::broadcast;

pub const CLIENT_ID: i64 = 1;

/// Dispatcher wired to a store, with a subscriber on its event bus
pub struct Gateway {
    pub dispatcher: Dispatcher,
    pub store: Arc<dyn RundownStore>,
    pub events: broadcast::Receiver<Notification>,
    pub ctx: ClientContext,
}

impl Gateway {
    pub fn with_store(store: Arc<dyn RundownStore>) -> Self {
        let bus = EventBus::new(64);
        let events = bus.subscribe();
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(bus),
            Duration::from_secs(2),
        );
        Self {
            dispatcher,
            store,
            events,
            ctx: ClientContext::new(CLIENT_ID),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub async fn sqlite() -> Self {
        let pool = nms_common::db::init_memory_database()
            .await
            .expect("in-memory database");
        Self::with_store(Arc::new(SqliteStore::new(pool)))
    }

    /// Dispatch and return the ack, if any
    pub async fn send(&self, message: &str) -> Option<RoAck> {
        match self.dispatcher.dispatch(&self.ctx, message).await {
            DispatchOutcome::Acknowledged { ack, .. } => Some(ack),
            DispatchOutcome::Ignored(_) => None,
        }
    }

    /// Dispatch and require an OK ack
    pub async fn send_ok(&self, message: &str) -> RoAck {
        let ack = self.send(message).await.expect("expected an ack");
        assert!(ack.is_ok(), "expected OK ack, got {:?}", ack);
        ack
    }

    /// Notifications published so far
    pub fn drain_events(&mut self) -> Vec<Notification> {
        let mut events = Vec::new();
        while let Ok(notification) = self.events.try_recv() {
            events.push(notification);
        }
        events
    }

    pub async fn rundown_id(&self, ro_id: &str) -> Option<i64> {
        self.store
            .find_rundown(CLIENT_ID, ro_id)
            .await
            .expect("find_rundown")
            .map(|rundown| rundown.id)
    }

    /// Story external ids of a rundown in order
    pub async fn story_order(&self, ro_id: &str) -> Vec<String> {
        let rundown_id = self.rundown_id(ro_id).await.expect("rundown exists");
        self.store
            .list_stories(rundown_id)
            .await
            .expect("list_stories")
            .into_iter()
            .map(|story| story.external_id)
            .collect()
    }
}

pub fn ro_create(ro_id: &str, slug: &str) -> String {
    format!(
        "<mos><roCreate><roID>{}</roID><roSlug>{}</roSlug></roCreate></mos>",
        ro_id, slug
    )
}

pub fn story_insert(ro_id: &str, story_id: &str, slug: &str) -> String {
    format!(
        "<mos><roStoryInsert><roID>{}</roID><storyID>{}</storyID><storySlug>{}</storySlug></roStoryInsert></mos>",
        ro_id, story_id, slug
    )
}

pub fn story_move(
    ro_id: &str,
    story_id: &str,
    before: Option<&str>,
    after: Option<&str>,
) -> String {
    let mut fragment = format!("<roID>{}</roID><storyID>{}</storyID>", ro_id, story_id);
    if let Some(before) = before {
        fragment.push_str(&format!("<storyIDBefore>{}</storyIDBefore>", before));
    }
    if let Some(after) = after {
        fragment.push_str(&format!("<storyIDAfter>{}</storyIDAfter>", after));
    }
    format!("<mos><roStoryMove>{}</roStoryMove></mos>", fragment)
}

pub fn story_swap(ro_id: &str, first: &str, second: &str) -> String {
    format!(
        "<mos><roStorySwap><roID>{}</roID><storyID1>{}</storyID1><storyID2>{}</storyID2></roStorySwap></mos>",
        ro_id, first, second
    )
}

pub fn story_status(ro_id: &str, story_id: &str, status: &str) -> String {
    format!(
        "<mos><roStoryStatus><roID>{}</roID><storyID>{}</storyID><status>{}</status></roStoryStatus></mos>",
        ro_id, story_id, status
    )
}

/// Rundown `ro_id` with the given stories inserted in order
pub async fn seed(gateway: &Gateway, ro_id: &str, stories: &[&str]) {
    gateway.send_ok(&ro_create(ro_id, "Seed")).await;
    for story in stories {
        gateway.send_ok(&story_insert(ro_id, story, story)).await;
    }
}
