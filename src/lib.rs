//! Rediscache - typed, namespace-isolated caching over Redis hash maps
//!
//! Provides dictionary-like async caches that keep the types of their keys
//! and values intact, with per-namespace locking so compound operations
//! stay atomic across concurrent tasks.

pub mod cache;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use cache::{Amount, RedisCache, RedisKey, RedisValue};
pub use config::RedisConfig;
pub use error::{CacheError, Result};
pub use session::RedisSession;
pub use store::{HashStore, MemoryStore, RedisStore};
