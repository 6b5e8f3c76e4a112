//! Expiring Cache Module
//!
//! Thread-safe handle over a `CacheStore` with a background reap task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::cache::{lock_store, CacheStats, CacheStore, SharedStore, MIN_INTERVAL};
use crate::config::CacheConfig;
use crate::tasks::{start_reaper, start_reaper_on, ReapHandle};

// == Expiring Cache ==
/// Response cache whose entries are removed by a periodic background sweep.
///
/// Cloning is cheap; clones share the same entries and the same reap task.
/// `put` and `get` are synchronous and only ever wait on the internal lock.
///
/// Reads never check an entry's age. An entry older than the interval stays
/// readable until the next sweep, so an entry can live for at most twice the
/// interval.
#[derive(Debug, Clone)]
pub struct ExpiringCache {
    store: SharedStore,
    interval: Duration,
}

impl ExpiringCache {
    // == Constructor ==
    /// Creates an empty cache and starts its reap task.
    ///
    /// The task is detached and keeps running for the life of the process (or
    /// of the hosting runtime), even after every handle to the cache is
    /// dropped. Use [`ExpiringCache::with_reaper`] to control its lifetime.
    ///
    /// Works with or without a Tokio runtime; see
    /// [`start_reaper`](crate::tasks::start_reaper) for where the task runs.
    pub fn new(interval: Duration) -> Self {
        let (cache, reaper) = Self::with_reaper(interval);
        reaper.detach();
        cache
    }

    // == With Reaper ==
    /// Creates an empty cache together with a handle that stops its reap task.
    ///
    /// Dropping the returned [`ReapHandle`] cancels the task. The cache stays
    /// usable afterwards, but entries no longer expire.
    pub fn with_reaper(interval: Duration) -> (Self, ReapHandle) {
        let cache = Self::empty(interval);
        let reaper = start_reaper(cache.store.clone());
        (cache, reaper)
    }

    // == With Reaper On ==
    /// Like [`ExpiringCache::with_reaper`], but always runs the reap task on
    /// `runtime`, which must stay driven for entries to expire.
    pub fn with_reaper_on(interval: Duration, runtime: &Handle) -> (Self, ReapHandle) {
        let cache = Self::empty(interval);
        let reaper = start_reaper_on(runtime, cache.store.clone());
        (cache, reaper)
    }

    // == From Config ==
    /// Creates a detached cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.interval())
    }

    /// Creates a cache with a reap handle from configuration.
    pub fn with_reaper_from_config(config: &CacheConfig) -> (Self, ReapHandle) {
        Self::with_reaper(config.interval())
    }

    fn empty(interval: Duration) -> Self {
        let interval = clamp_interval(interval);
        let store = Arc::new(Mutex::new(CacheStore::new(interval)));

        info!(
            interval_ms = interval.as_millis() as u64,
            "Expiring cache initialized"
        );

        Self { store, interval }
    }

    // == Put ==
    /// Stores `payload` under `key`, replacing any previous entry and
    /// restarting its expiry clock.
    ///
    /// Any key and payload are accepted, including empty ones.
    pub fn put<K, V>(&self, key: K, payload: V)
    where
        K: Into<String>,
        V: Into<Bytes>,
    {
        let key = key.into();
        let payload = payload.into();
        lock_store(&self.store).put(key, payload);
    }

    // == Get ==
    /// Returns the payload stored under `key`, if the sweep has not removed it.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        lock_store(&self.store).get(key)
    }

    // == Stats ==
    /// Returns a snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        lock_store(&self.store).stats()
    }

    // == Length ==
    /// Number of stored entries, including stale ones not yet swept.
    pub fn len(&self) -> usize {
        lock_store(&self.store).len()
    }

    // == Is Empty ==
    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        lock_store(&self.store).is_empty()
    }

    // == Interval ==
    /// Expiry interval, which is also the sweep period.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    if interval < MIN_INTERVAL {
        warn!(
            requested_ns = interval.as_nanos() as u64,
            min_ms = MIN_INTERVAL.as_millis() as u64,
            "Cache interval below minimum, clamping"
        );
        MIN_INTERVAL
    } else {
        interval
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = ExpiringCache::new(Duration::from_secs(5));

        cache.put("https://example.com", "testdata");
        cache.put("https://example.com/path", "moretestdata");

        assert_eq!(cache.get("https://example.com").unwrap(), "testdata");
        assert_eq!(cache.get("https://example.com/path").unwrap(), "moretestdata");
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = ExpiringCache::new(Duration::from_secs(5));

        assert!(cache.get("https://example.com").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = ExpiringCache::new(Duration::from_secs(5));
        let other = cache.clone();

        other.put("k", "v");

        assert_eq!(cache.get("k").unwrap(), "v");
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let cache = ExpiringCache::new(Duration::ZERO);
        assert_eq!(cache.interval(), MIN_INTERVAL);
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = CacheConfig::new(Duration::from_millis(750));
        let (cache, reaper) = ExpiringCache::with_reaper_from_config(&config);

        assert_eq!(cache.interval(), Duration::from_millis(750));
        reaper.shutdown().await;
    }

    #[test]
    fn test_new_outside_runtime() {
        let cache = ExpiringCache::new(Duration::from_secs(10));

        cache.put("https://example.com", "testdata");
        assert_eq!(cache.get("https://example.com").unwrap(), "testdata");
    }

    #[tokio::test]
    async fn test_huge_interval_keeps_reaper_alive() {
        let (cache, reaper) = ExpiringCache::with_reaper(Duration::MAX);
        cache.put("k", "v");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!reaper.is_finished());
        assert_eq!(cache.get("k").unwrap(), "v");

        reaper.shutdown().await;
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let cache = ExpiringCache::new(Duration::from_secs(5));

        cache.put("k", "v");
        cache.get("k");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }
}
