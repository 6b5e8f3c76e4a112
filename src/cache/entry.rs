//! Cache Entry Module
//!
//! Defines a single stored payload together with its creation instant.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

// == Cache Entry ==
/// A stored payload plus the instant of the `put` that wrote it.
///
/// Entries are never mutated; an overwrite replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub payload: Bytes,
    /// Instant of the most recent write
    pub created_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current instant.
    pub fn new(payload: Bytes) -> Self {
        Self::created_at(payload, Instant::now())
    }

    /// Creates an entry with an explicit creation instant.
    pub fn created_at(payload: Bytes, created_at: Instant) -> Self {
        Self {
            payload,
            created_at,
        }
    }

    // == Age ==
    /// Time elapsed between creation and `now`.
    ///
    /// Saturates to zero if `now` precedes the creation instant.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    // == Is Stale ==
    /// Returns true once the entry's age strictly exceeds `interval`.
    pub fn is_stale(&self, now: Instant, interval: Duration) -> bool {
        self.age(now) > interval
    }
}
