//! Cache Module
//!
//! Provides the typed cache surface: the typestring codec, the namespace
//! lock registry and the dictionary-style operations built on both.

mod lock;
mod redis_cache;
mod typestring;


// Re-export public types
pub use lock::NamespaceLocks;
pub use redis_cache::RedisCache;
pub use typestring::{decode_map, encode_map, Amount, RedisKey, RedisValue};
