//! Configuration Module
//!
//! Handles loading the cache interval from environment variables.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variable holding the expiry interval in milliseconds.
pub const INTERVAL_VAR: &str = "POKECACHE_INTERVAL_MS";

/// Interval used when nothing is configured (10 seconds).
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Cache configuration parameters.
///
/// The interval is both the time-to-live of an entry and the period of the
/// background sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Expiry interval and sweep period in milliseconds
    pub interval_ms: u64,
}

impl CacheConfig {
    /// Creates a config with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis().try_into().unwrap_or(u64::MAX),
        }
    }

    /// Returns the interval as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Loads configuration from environment variables, falling back to
    /// defaults for anything missing or unparsable.
    ///
    /// # Environment Variables
    /// - `POKECACHE_INTERVAL_MS` - Expiry interval in milliseconds (default: 10000)
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok()).unwrap_or_default()
    }

    /// Loads configuration from environment variables, rejecting values that
    /// are present but invalid.
    pub fn try_from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_ms = match lookup(INTERVAL_VAR) {
            None => DEFAULT_INTERVAL_MS,
            Some(raw) => {
                let parsed: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    var: INTERVAL_VAR,
                    value: raw.clone(),
                })?;
                if parsed == 0 {
                    return Err(ConfigError::ZeroInterval(INTERVAL_VAR));
                }
                parsed
            }
        };

        Ok(Self { interval_ms })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}
