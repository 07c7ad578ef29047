//! # Coordinate Locks
//!
//! Reader/writer locks keyed by a full coordinate string. Creating a child
//! holds its parent's coordinate shared; deleting the parent holds it
//! exclusively, so a delete guard cannot race a child insert. Writes to a
//! single version coordinate are exclusive. Entries are removed from the
//! table as soon as nobody holds or waits for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock as AsyncRwLock};

type Slot = Arc<AsyncRwLock<()>>;

#[derive(Debug)]
struct Entry {
    slot: Slot,
    /// Holder plus waiters, including waiters that are about to give up
    users: usize,
}

/// Table of per-coordinate async locks
#[derive(Debug, Default)]
pub struct CoordinateLocks {
    slots: Mutex<HashMap<String, Entry>>,
}

impl CoordinateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, key: &str) -> (Slot, CoordinateGuard<'_>) {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = slots.entry(key.to_string()).or_insert_with(|| Entry {
                slot: Slot::default(),
                users: 0,
            });
            entry.users += 1;
            entry.slot.clone()
        };

        // Deregisters on drop, also when the caller's wait is cancelled
        let guard = CoordinateGuard {
            locks: self,
            key: key.to_string(),
            hold: None,
        };
        (slot, guard)
    }

    /// Wait until nobody else holds the coordinate and take it exclusively
    pub async fn acquire(&self, key: &str) -> CoordinateGuard<'_> {
        let (slot, mut guard) = self.register(key);
        guard.hold = Some(Hold::Exclusive(slot.write_owned().await));
        guard
    }

    /// Hold the coordinate alongside other shared holders
    pub async fn acquire_shared(&self, key: &str) -> CoordinateGuard<'_> {
        let (slot, mut guard) = self.register(key);
        guard.hold = Some(Hold::Shared(slot.read_owned().await));
        guard
    }

    /// Number of coordinates currently held or awaited
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = slots.get_mut(key) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                slots.remove(key);
            }
        }
    }
}

#[derive(Debug)]
enum Hold {
    Shared(OwnedRwLockReadGuard<()>),
    Exclusive(OwnedRwLockWriteGuard<()>),
}

/// Held coordinate; released on drop
#[derive(Debug)]
pub struct CoordinateGuard<'a> {
    locks: &'a CoordinateLocks,
    key: String,
    hold: Option<Hold>,
}

impl CoordinateGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self.hold, Some(Hold::Exclusive(_)))
    }
}

impl Drop for CoordinateGuard<'_> {
    fn drop(&mut self) {
        drop(self.hold.take());
        self.locks.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_table_cleared_after_release() {
        let locks = CoordinateLocks::new();
        {
            let guard = locks.acquire("acme/net/aws/1.0.0").await;
            assert_eq!(guard.key(), "acme/net/aws/1.0.0");
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = CoordinateLocks::new();
        let _a = locks.acquire("a").await;
        let _b = locks.acquire("b").await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(CoordinateLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("acme/net/aws/1.0.0").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_is_cleared() {
        let locks = Arc::new(CoordinateLocks::new());
        let held = locks.acquire("acme/net/aws").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("acme/net/aws").await;
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(locks.len(), 1);

        // Holder leaves while the waiter is still registered, then the waiter gives up
        drop(held);
        waiter.abort();
        let _ = waiter.await;

        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_acquire_is_cleared() {
        let locks = CoordinateLocks::new();
        let held = locks.acquire("k").await;

        let waited = tokio::time::timeout(Duration::from_millis(5), locks.acquire("k")).await;
        assert!(waited.is_err());
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_shared_holders_coexist() {
        let locks = CoordinateLocks::new();
        let a = locks.acquire_shared("acme/net/aws").await;
        let b = locks.acquire_shared("acme/net/aws").await;
        assert!(!a.is_exclusive() && !b.is_exclusive());
        assert_eq!(locks.len(), 1);

        let blocked = tokio::time::timeout(Duration::from_millis(5), locks.acquire("acme/net/aws")).await;
        assert!(blocked.is_err());

        drop(a);
        drop(b);
        let exclusive = locks.acquire("acme/net/aws").await;
        assert!(exclusive.is_exclusive());
        drop(exclusive);
        assert!(locks.is_empty());
    }
}
