//! Redis Store Module
//!
//! Production backend: issues hash commands over a deadpool-managed
//! connection pool.

use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_redis::{Connection, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::error::{CacheError, Result};
use crate::store::HashStore;

// == Redis Store ==
/// Hash-command backend over a pooled Redis connection.
///
/// A connection is checked out of the pool for the scope of one command and
/// returned when it drops, on every exit path, including command errors and
/// cancelled callers.
pub struct RedisStore {
    /// Shared connection pool
    pool: Pool,
}

impl RedisStore {
    // == Constructors ==
    /// Creates a store over an already-built pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool for the configured Redis server.
    ///
    /// The pool connects lazily. An invalid URL fails here; an unreachable
    /// server surfaces as a connectivity error on the first operation.
    pub fn connect(config: &RedisConfig) -> Result<Self> {
        let mut pool_config = deadpool_redis::Config::from_url(&config.url);
        pool_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| {
                CacheError::Config(format!("cannot build Redis pool for {}: {}", config.url, e))
            })?;

        Ok(Self::new(pool))
    }

    /// Checks a connection out of the pool for one command's scope.
    async fn connection(&self) -> Result<Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl HashStore for RedisStore {
    async fn hash_get(&self, namespace: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        Ok(conn.hget(namespace, field).await?)
    }

    async fn hash_set(&self, namespace: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.hset(namespace, field, value).await?;
        Ok(())
    }

    async fn hash_set_multiple(&self, namespace: &str, entries: &[(String, String)]) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.hset_multiple(namespace, entries).await?;
        Ok(())
    }

    async fn hash_del(&self, namespace: &str, field: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.hdel(namespace, field).await?;
        Ok(())
    }

    async fn hash_exists(&self, namespace: &str, field: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        Ok(conn.hexists(namespace, field).await?)
    }

    async fn hash_get_all(&self, namespace: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.connection().await?;
        Ok(conn.hgetall(namespace).await?)
    }

    async fn hash_len(&self, namespace: &str) -> Result<usize> {
        let mut conn = self.connection().await?;
        Ok(conn.hlen(namespace).await?)
    }

    async fn delete(&self, namespace: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(namespace).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
