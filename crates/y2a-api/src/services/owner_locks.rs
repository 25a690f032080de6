//! Per-owner serialization of owner record updates.
//!
//! Every read-modify-write of an owner record (history append on submit,
//! history removal on delete) runs under that owner's lock, so concurrent
//! updates for the same owner inside this process cannot drop each other.
//! Different owners never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

/// Map size at which idle locks are evicted before inserting a new one.
const IDLE_EVICTION_THRESHOLD: usize = 1_024;

/// Lazily created async mutex per owner login.
#[derive(Clone, Default)]
pub struct OwnerLocks {
    locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(&self, login: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(login) {
                return Arc::clone(lock);
            }
        }

        let mut locks = self.locks.write().await;
        if !locks.contains_key(login) && locks.len() >= IDLE_EVICTION_THRESHOLD {
            evict_idle(&mut locks);
        }
        Arc::clone(locks.entry(login.to_string()).or_default())
    }

    /// Wait for exclusive access to `login`'s record.
    pub async fn lock(&self, login: &str) -> OwnedMutexGuard<()> {
        self.get(login).await.lock_owned().await
    }
}

/// Drop locks nobody holds or waits on. Only the map references those.
fn evict_idle(locks: &mut HashMap<String, Arc<Mutex<()>>>) {
    let before = locks.len();
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    debug!(evicted = before - locks.len(), "Evicted idle owner locks");
}
