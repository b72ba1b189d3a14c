//! Configuration Module
//!
//! Handles loading Redis connection settings from environment variables.

use std::env;

/// Redis connection configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis server URL
    pub url: String,
    /// Maximum number of pooled connections
    pub pool_size: usize,
}

impl RedisConfig {
    /// Creates a new RedisConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis server URL (default: redis://127.0.0.1:6379)
    /// - `REDIS_POOL_SIZE` - Maximum pooled connections (default: 16)
    pub fn from_env() -> Self {
        Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            pool_size: env::var("REDIS_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(16),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_size: 16,
        }
    }
}
