//! Store Backend Module
//!
//! The hash-map command surface the cache consumes from the underlying
//! store, plus the available backend implementations.
//!
//! # Backends
//! - `RedisStore` - connection-pooled Redis backend for production
//! - `MemoryStore` - in-process backend for development and tests

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

// == Hash Store Trait ==
/// The store commands the cache issues, addressed by namespace.
///
/// Each namespace maps to one hash structure in the store. Implementations
/// acquire whatever connection they need for the scope of a single call
/// and release it on every exit path, so a cache operation never pins a
/// connection while waiting on anything else.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Reads one field of the namespace hash. A missing field and a
    /// missing namespace both yield `None`.
    async fn hash_get(&self, namespace: &str, field: &str) -> Result<Option<String>>;

    /// Writes one field of the namespace hash, creating the hash if needed.
    async fn hash_set(&self, namespace: &str, field: &str, value: &str) -> Result<()>;

    /// Writes several fields in one command. Callers guarantee `entries`
    /// is non-empty.
    async fn hash_set_multiple(&self, namespace: &str, entries: &[(String, String)]) -> Result<()>;

    /// Removes one field. Removing an absent field is a no-op.
    async fn hash_del(&self, namespace: &str, field: &str) -> Result<()>;

    /// Checks whether a field exists in the namespace hash.
    async fn hash_exists(&self, namespace: &str, field: &str) -> Result<bool>;

    /// Reads the whole namespace hash. A missing namespace is an empty map.
    async fn hash_get_all(&self, namespace: &str) -> Result<HashMap<String, String>>;

    /// Counts the fields in the namespace hash, 0 if it does not exist.
    async fn hash_len(&self, namespace: &str) -> Result<usize>;

    /// Deletes the namespace hash as a whole, destroying every entry.
    async fn delete(&self, namespace: &str) -> Result<()>;

    /// Short backend name for logs and debug output.
    fn backend_name(&self) -> &'static str;
}
