//! Per-key async mutual exclusion with bounded waits

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

type LockMap<K> = Arc<Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>>;

/// Raised when a key stays locked for longer than the caller is willing to wait
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lock on {key} not acquired within {waited:?}")]
pub struct LockTimeout {
    pub key: String,
    pub waited: Duration,
}

/// A set of async mutexes created on demand, one per key
///
/// Entries are removed once nobody holds or waits for them, so the map only
/// grows with the number of keys in use at the same time.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    entries: LockMap<K>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `key`, waiting at most `wait`
    pub async fn acquire(&self, key: K, wait: Duration) -> Result<KeyGuard<K>, LockTimeout> {
        let mutex = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.entry(key.clone()).or_default().clone()
        };

        match tokio::time::timeout(wait, mutex.lock_owned()).await {
            Ok(guard) => Ok(KeyGuard {
                key,
                guard: Some(guard),
                entries: self.entries.clone(),
            }),
            Err(_) => {
                debug!("Gave up waiting for lock {} after {:?}", key, wait);
                prune(&self.entries, &key);
                Err(LockTimeout {
                    key: key.to_string(),
                    waited: wait,
                })
            }
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn prune<K: Eq + Hash>(entries: &LockMap<K>, key: &K) {
    let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
    if entries
        .get(key)
        .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
    {
        entries.remove(key);
    }
}

/// Holds a key until dropped
#[derive(Debug)]
pub struct KeyGuard<K: Eq + Hash> {
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
    entries: LockMap<K>,
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        // Release first so the strong count only reflects waiters.
        drop(self.guard.take());
        prune(&self.entries, &self.key);
    }
}
