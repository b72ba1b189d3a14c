//! Memory Store Module
//!
//! In-process backend used for development and tests that should not
//! require a running Redis server.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::HashStore;

// == Memory Store ==
/// In-memory hash-of-hashes backend.
///
/// Observable behavior mirrors the Redis commands it stands in for:
/// reading a missing namespace yields empty results, and removing the last
/// field of a hash removes the hash itself. Every operation suspends once
/// before touching the data, where the network round trip would be, so the
/// task interleavings tests exercise match what a remote store allows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Namespace -> (field -> value)
    hashes: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspension point standing in for the store round trip.
    async fn round_trip(&self) {
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn hash_get(&self, namespace: &str, field: &str) -> Result<Option<String>> {
        self.round_trip().await;
        let hashes = self.hashes.read().await;
        Ok(hashes.get(namespace).and_then(|hash| hash.get(field).cloned()))
    }

    async fn hash_set(&self, namespace: &str, field: &str, value: &str) -> Result<()> {
        self.round_trip().await;
        let mut hashes = self.hashes.write().await;
        hashes
            .entry(namespace.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_set_multiple(&self, namespace: &str, entries: &[(String, String)]) -> Result<()> {
        self.round_trip().await;
        let mut hashes = self.hashes.write().await;
        let hash = hashes.entry(namespace.to_string()).or_default();
        for (field, value) in entries {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hash_del(&self, namespace: &str, field: &str) -> Result<()> {
        self.round_trip().await;
        let mut hashes = self.hashes.write().await;
        if let Some(hash) = hashes.get_mut(namespace) {
            hash.remove(field);
            // Redis drops a hash once its last field is gone
            if hash.is_empty() {
                hashes.remove(namespace);
            }
        }
        Ok(())
    }

    async fn hash_exists(&self, namespace: &str, field: &str) -> Result<bool> {
        self.round_trip().await;
        let hashes = self.hashes.read().await;
        Ok(hashes
            .get(namespace)
            .is_some_and(|hash| hash.contains_key(field)))
    }

    async fn hash_get_all(&self, namespace: &str) -> Result<HashMap<String, String>> {
        self.round_trip().await;
        let hashes = self.hashes.read().await;
        Ok(hashes.get(namespace).cloned().unwrap_or_default())
    }

    async fn hash_len(&self, namespace: &str) -> Result<usize> {
        self.round_trip().await;
        let hashes = self.hashes.read().await;
        Ok(hashes.get(namespace).map_or(0, HashMap::len))
    }

    async fn delete(&self, namespace: &str) -> Result<()> {
        self.round_trip().await;
        let mut hashes = self.hashes.write().await;
        hashes.remove(namespace);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
