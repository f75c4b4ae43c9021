//! Per-player async locks so overlapping changes to one key run in sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::PlayerId;

type Slot = Arc<AsyncMutex<()>>;

/// Map of lazily created per-key locks.
///
/// Slots are dropped once no caller holds or waits on them, so the map only
/// grows with the number of keys currently in flight.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    slots: Mutex<HashMap<PlayerId, Slot>>,
}

impl KeyedLocks {
    /// Wait until no other caller holds `key`, then hold it until the guard
    /// is dropped.
    pub(crate) async fn lock(&self, key: &PlayerId) -> KeyGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let guard = Arc::clone(&slot).lock_owned().await;
        KeyGuard {
            locks: self,
            key: key.clone(),
            slot,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held lock for one key.
pub(crate) struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: PlayerId,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference lives in the map and one in this guard.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}
