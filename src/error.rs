//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value has a type the attempted operation cannot handle
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A string read back from the store does not decode as any known type
    #[error("Corrupt cache data: {0}")]
    CorruptData(String),

    /// Increment or decrement was called on a key that does not exist
    #[error("Key not found: {0}")]
    MissingKey(String),

    /// The session or cache was configured incorrectly
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A store command failed
    #[error("Redis command failed: {0}")]
    Connectivity(#[from] redis::RedisError),

    /// A connection could not be checked out of the pool
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
