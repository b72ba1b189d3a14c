//! Session Module
//!
//! Process-wide context that owns the store backend and the namespace lock
//! registry, and hands out cache handles.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{NamespaceLocks, RedisCache};
use crate::config::RedisConfig;
use crate::error::{CacheError, Result};
use crate::store::{HashStore, MemoryStore, RedisStore};

// == Redis Session ==
/// Shared context for every cache in the process.
///
/// The session owns the two pieces of state all caches share: the store
/// backend with its connection pool, and the per-namespace lock registry.
/// Create one session at startup, clone it freely (clones share the same
/// state), and derive cache handles from it with [`RedisSession::cache`].
///
/// # Example
/// ```ignore
/// let session = RedisSession::connect(&RedisConfig::from_env())?;
/// let scores = session.cache("trivia.scores")?;
/// let settings = session.cache("trivia.settings")?;
/// ```
#[derive(Clone)]
pub struct RedisSession {
    /// Store backend shared by all caches
    store: Arc<dyn HashStore>,
    /// Per-namespace lock registry, populated lazily
    locks: Arc<NamespaceLocks>,
}

impl RedisSession {
    // == Constructors ==
    /// Creates a session over an arbitrary store backend.
    pub fn with_store(store: Arc<dyn HashStore>) -> Self {
        info!("Creating cache session with {} backend.", store.backend_name());
        Self {
            store,
            locks: Arc::new(NamespaceLocks::new()),
        }
    }

    /// Creates a session connected to Redis per the given configuration.
    ///
    /// The pool connects lazily, so this succeeds even while the server is
    /// still coming up; an unreachable server surfaces on the first
    /// operation instead.
    pub fn connect(config: &RedisConfig) -> Result<Self> {
        let store = RedisStore::connect(config)?;
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Creates a session over an in-process store, for development and
    /// tests that should not require a running Redis server.
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    // == Cache Construction ==
    /// Builds a cache handle bound to `namespace`.
    ///
    /// The namespace identifies the cache's hash in the shared store and
    /// must be a non-empty string that stays stable across restarts.
    /// Binding a namespace twice is allowed but logged, since separate
    /// caches normally should not share a hash; aliased handles share one
    /// lock, so atomicity still holds across them.
    ///
    /// # Arguments
    /// * `namespace` - Identifier for this cache's hash in the store
    pub fn cache(&self, namespace: impl Into<String>) -> Result<RedisCache> {
        let namespace = namespace.into();

        if namespace.trim().is_empty() {
            return Err(CacheError::Config(
                "cache namespace must be a non-empty string".to_string(),
            ));
        }

        if self.locks.contains(&namespace) {
            warn!(
                "Namespace {} is already bound; the handles will share one hash and one lock.",
                namespace
            );
        }

        let lock = self.locks.for_namespace(&namespace);
        Ok(RedisCache::new(Arc::clone(&self.store), lock, namespace))
    }
}

impl fmt::Debug for RedisSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSession")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}
