//! Notification publishing

use nms_common::events::{EventBus, MosEvent, Notification, Topic};
use tracing::debug;

/// Fire-and-forget publisher for handler notifications
///
/// Publishing never fails the command: a notification with no listeners is
/// simply dropped.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, topic: Topic, event: MosEvent);
}

impl Broadcaster for EventBus {
    fn publish(&self, topic: Topic, event: MosEvent) {
        let action = event.action();
        match self.emit(Notification { topic, event }) {
            Ok(receivers) => debug!(%topic, action, receivers, "Published notification"),
            Err(_) => debug!(%topic, action, "No subscribers for notification"),
        }
    }
}
