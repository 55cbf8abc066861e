//! Command kind to handler mapping

use std::collections::HashMap;
use std::sync::Arc;

use crate::handlers::{
    CommandHandler, RoCreateHandler, RoDeleteHandler, RoReplaceHandler, RoUpdateHandler,
    StoryDeleteHandler, StoryInsertHandler, StoryMoveHandler, StoryReplaceHandler,
    StoryStatusHandler, StorySwapHandler,
};
use crate::protocol::CommandKind;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    /// Empty registry (every message is ignored until handlers are added)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every command kind
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RoCreateHandler));
        registry.register(Arc::new(RoUpdateHandler));
        registry.register(Arc::new(RoDeleteHandler));
        registry.register(Arc::new(RoReplaceHandler));
        registry.register(Arc::new(StoryInsertHandler));
        registry.register(Arc::new(StoryReplaceHandler));
        registry.register(Arc::new(StoryDeleteHandler));
        registry.register(Arc::new(StoryMoveHandler));
        registry.register(Arc::new(StorySwapHandler));
        registry.register(Arc::new(StoryStatusHandler));
        registry
    }

    /// Add a handler under its own kind, returning any handler it replaces
    pub fn register(
        &mut self,
        handler: Arc<dyn CommandHandler>,
    ) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.insert(handler.kind(), handler)
    }

    pub fn get(&self, kind: CommandKind) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_every_kind() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.len(), CommandKind::ALL.len());
        for kind in CommandKind::ALL {
            assert_eq!(registry.get(kind).map(|h| h.kind()), Some(kind));
        }
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register(Arc::new(RoCreateHandler)).is_none());
        assert!(registry.register(Arc::new(RoCreateHandler)).is_some());
        assert_eq!(registry.len(), 1);
    }
}
