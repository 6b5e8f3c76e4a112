//! Pokecache - an expiring in-memory response cache
//!
//! Memoizes raw API response bodies keyed by request URL. Entries are removed
//! by a background sweep once they are older than the cache interval; reads
//! never check age themselves.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, ExpiringCache};
pub use config::CacheConfig;
pub use error::{ConfigError, Result};
pub use tasks::ReapHandle;
