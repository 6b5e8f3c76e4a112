//! Error types for the cache
//!
//! Cache operations themselves cannot fail; the only fallible surface is
//! loading configuration.

use thiserror::Error;

// == Config Error Enum ==
/// Errors raised while loading cache configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable is set but is not a valid integer
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    /// Interval of zero milliseconds
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

// == Result Type Alias ==
/// Convenience Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
