//! Cache Store Module
//!
//! The unsynchronized map behind `ExpiringCache`. Callers are expected to hold
//! the cache lock around every method.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// Key-to-entry map with sweep-driven expiry.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Lookup and sweep counters
    stats: CacheStats,
    /// Age beyond which the sweep removes an entry
    interval: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store whose entries expire after `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            interval,
        }
    }

    // == Put ==
    /// Stores `payload` under `key`, replacing any existing entry and
    /// resetting its age.
    pub fn put(&mut self, key: String, payload: Bytes) {
        self.put_at(key, payload, Instant::now());
    }

    /// Stores `payload` under `key` as if written at `now`.
    pub fn put_at(&mut self, key: String, payload: Bytes, now: Instant) {
        self.entries.insert(key, CacheEntry::created_at(payload, now));
    }

    // == Get ==
    /// Returns the payload stored under `key`.
    ///
    /// Age is not checked here: an entry stays readable until a sweep removes
    /// it, even if it is already older than the interval.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.payload.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Reap ==
    /// Removes every entry whose age at `now` exceeds the interval.
    ///
    /// Returns the number of entries removed.
    pub fn reap(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let interval = self.interval;
        self.entries.retain(|_, entry| !entry.is_stale(now, interval));

        let removed = before - self.entries.len();
        self.stats.record_sweep(removed);
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Interval ==
    /// Returns the expiry interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(INTERVAL);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.interval(), INTERVAL);
    }

    #[test]
    fn test_store_put_and_get() {
        let mut store = CacheStore::new(INTERVAL);

        store.put(
            "https://example.com".to_string(),
            Bytes::from_static(b"testdata"),
        );
        let value = store.get("https://example.com").unwrap();

        assert_eq!(&value[..], b"testdata");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(INTERVAL);
        assert!(store.get("https://example.com/missing").is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new(INTERVAL);

        store.put("key1".to_string(), Bytes::from_static(b"value1"));
        store.put("key1".to_string(), Bytes::from_static(b"value2"));

        assert_eq!(&store.get("key1").unwrap()[..], b"value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_reap_removes_only_stale() {
        let mut store = CacheStore::new(INTERVAL);
        let start = Instant::now();

        store.put_at("old".to_string(), Bytes::from_static(b"a"), start);
        store.put_at(
            "fresh".to_string(),
            Bytes::from_static(b"b"),
            start + Duration::from_secs(3),
        );

        let removed = store.reap(start + Duration::from_secs(6));
        assert_eq!(removed, 1);
        assert!(store.get("old").is_none());
        assert_eq!(&store.get("fresh").unwrap()[..], b"b");
    }

    #[test]
    fn test_store_reap_keeps_entry_at_exact_interval() {
        let mut store = CacheStore::new(INTERVAL);
        let start = Instant::now();

        store.put_at("k".to_string(), Bytes::from_static(b"v"), start);

        assert_eq!(store.reap(start + INTERVAL), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite_resets_age() {
        let mut store = CacheStore::new(INTERVAL);
        let start = Instant::now();

        store.put_at("k".to_string(), Bytes::from_static(b"v1"), start);
        store.put_at(
            "k".to_string(),
            Bytes::from_static(b"v2"),
            start + Duration::from_secs(4),
        );

        // The original write would be stale by now, the refreshed one is not
        assert_eq!(store.reap(start + Duration::from_secs(6)), 0);
        assert_eq!(&store.get("k").unwrap()[..], b"v2");
    }

    #[test]
    fn test_store_get_does_not_check_age() {
        let mut store = CacheStore::new(Duration::from_millis(1));

        store.put("k".to_string(), Bytes::from_static(b"v"));
        std::thread::sleep(Duration::from_millis(5));

        // Older than the interval but never swept
        assert_eq!(&store.get("k").unwrap()[..], b"v");
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(INTERVAL);
        let start = Instant::now();

        store.put_at("key1".to_string(), Bytes::from_static(b"value1"), start);
        store.get("key1"); // hit
        store.get("nonexistent"); // miss
        store.reap(start + Duration::from_secs(10));

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.reaped, 1);
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.total_entries, 0);
    }
}
