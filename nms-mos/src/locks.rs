//! Per-rundown serialization
//!
//! Commands on one `(client_id, roID)` run one at a time across all
//! connections; commands on different rundowns run concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type RundownKey = (i64, String);

/// Held while a command mutates one rundown
pub type RundownGuard = OwnedMutexGuard<()>;

/// Registry of per-rundown async mutexes
///
/// Entries are weak: a lock lives as long as some command holds or waits
/// for it, and dead entries are pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct RundownLocks {
    locks: Mutex<HashMap<RundownKey, Weak<AsyncMutex<()>>>>,
}

impl RundownLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one rundown
    pub async fn acquire(&self, client_id: i64, ro_id: &str) -> RundownGuard {
        self.lock_for(client_id, ro_id).lock_owned().await
    }

    fn lock_for(&self, client_id: i64, ro_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| lock.strong_count() > 0);

        let key = (client_id, ro_id.to_string());
        if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
            return lock;
        }
        let lock = Arc::new(AsyncMutex::new(()));
        locks.insert(key, Arc::downgrade(&lock));
        lock
    }

    /// Rundowns with a live lock (held or awaited)
    pub fn tracked(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|lock| lock.strong_count() > 0).count()
    }
}
