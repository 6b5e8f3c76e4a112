//! Cache Module
//!
//! Provides the in-memory response cache with sweep-driven expiry.

mod entry;
mod expiring;
mod stats;
mod store;


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

// Re-export public types
pub use entry::CacheEntry;
pub use expiring::ExpiringCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Smallest interval the cache will run with.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Store shared between cache handles and the reap task.
pub type SharedStore = Arc<Mutex<CacheStore>>;

/// Locks the store, recovering the guard if a previous holder panicked.
///
/// No store method leaves the map partially updated, so the data behind a
/// poisoned lock is still consistent.
pub(crate) fn lock_store(store: &Mutex<CacheStore>) -> MutexGuard<'_, CacheStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
