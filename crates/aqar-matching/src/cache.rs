//! String-keyed TTL cache.
//!
//! Explicit and injected: whoever constructs a pipeline decides the TTL and
//! owns invalidation. Correctness never depends on what the cache holds,
//! only latency does. Entries are dropped lazily on read and eagerly via
//! [`TtlCache::purge_expired`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A thread-safe read-through cache with a fixed per-entry TTL.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry; expired entries are removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value under `key` for the configured TTL, replacing any
    /// existing entry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`. Returns the number
    /// of entries removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Drop all expired entries. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or(0);
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("len", &len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_inserted_value_before_expiry() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("listing:1", 42);
        assert_eq!(cache.get("listing:1"), Some(42));
    }

    #[test]
    fn get_misses_after_ttl_elapses() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_millis(0));
        cache.insert("listing:1", 42);
        assert_eq!(cache.get("listing:1"), None);
        assert!(cache.is_empty(), "expired entry is removed on read");
    }

    #[test]
    fn insert_replaces_existing_entry() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("listing:1", 1);
        cache.insert("listing:1", 2);
        assert_eq!(cache.get("listing:1"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_prefix_only_removes_matching_keys() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("listing:1", 1);
        cache.insert("listing:2", 2);
        cache.insert("district:Riyadh", 3);

        let removed = cache.invalidate_prefix("listing:");
        assert_eq!(removed, 2);
        assert_eq!(cache.get("listing:1"), None);
        assert_eq!(cache.get("district:Riyadh"), Some(3));
    }

    #[test]
    fn purge_expired_keeps_live_entries() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("listing:1", 1);
        assert_eq!(cache.purge_expired(), 0);
        assert_eq!(cache.len(), 1);
    }
}
