//! TTL Cache
//!
//! Key/value store where every entry carries an absolute expiry. Reads past
//! the expiry behave as misses (lazy expiry); [`TtlCache::purge_expired`] is
//! only for memory hygiene.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

/// Cache lookup miss. Internal signal, never shown to users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cache miss for `{key}`")]
pub struct CacheMiss {
    pub key: String,
    /// The entry existed but its TTL had elapsed
    pub expired: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at_ms: i64,
}

/// In-memory TTL cache
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Look up a live entry
    pub fn lookup(&self, key: &str) -> Result<V, CacheMiss> {
        let now_ms = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) if now_ms < entry.expires_at_ms => {
                tracing::debug!(key = key, "Cache hit");
                return Ok(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries
                .remove_if(key, |_, entry| now_ms >= entry.expires_at_ms);
        }
        tracing::debug!(key = key, expired = expired, "Cache miss");

        Err(CacheMiss {
            key: key.to_string(),
            expired,
        })
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lookup(key).ok()
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at_ms = self.clock.now_ms() + ttl.as_millis() as i64;
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at_ms,
            },
        );
    }

    /// Returns whether a (possibly expired) entry was removed
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn delete_many<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .filter(|key| self.delete(key.as_ref()))
            .count()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn purge_expired(&self) -> usize {
        let now_ms = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now_ms < entry.expires_at_ms);
        before - self.entries.len()
    }

    /// Stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
