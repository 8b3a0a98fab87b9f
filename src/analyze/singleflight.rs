// Per-key async locks so identical requests make one classifier call
// Author: kelexine (https://github.com/kelexine)

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A set of async mutexes created on demand, one per key.
///
/// Entries are removed when the last holder or waiter releases them, so the
/// map only ever contains keys with work in progress.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held while the caller owns `key`; releases and cleans up on drop.
pub struct KeyedGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other caller holds `key`, then hold it.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let mutex = self.locks.entry(key.to_string()).or_default().clone();

        // Built before waiting so a caller dropped mid-wait still cleans up
        let mut held = KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: None,
        };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Number of keys currently held or awaited
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }

    /// Drop entries nobody holds or waits on. Returns the number removed.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before.saturating_sub(self.locks.len())
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map's own handle is the only one left when nobody is waiting
        self.owner
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_guard_cleans_up() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock("a").await;
            assert_eq!(locks.in_flight(), 1);
        }
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_waiter_cleans_up() {
        let locks = KeyedLocks::new();
        let holder = locks.lock("a").await;
        {
            let waiter = locks.lock("a");
            tokio::pin!(waiter);
            let waited = tokio::time::timeout(Duration::from_millis(10), &mut waiter).await;
            assert!(waited.is_err());

            // The holder leaves the entry to the registered waiter
            drop(holder);
            assert_eq!(locks.in_flight(), 1);
        }
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_keys() {
        let locks = KeyedLocks::new();
        let _held = locks.lock("held").await;
        locks.locks.insert("orphan".to_string(), Arc::default());

        assert_eq!(locks.prune(), 1);
        assert_eq!(locks.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _guard = locks.lock("same").await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(locks.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b")).await;
        assert!(b.is_ok());
    }
}
