//! Typed Cache Module
//!
//! Dictionary-style async operations over one namespaced hash in the store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::lock::NamespaceGuard;
use crate::cache::typestring::{decode_map, encode_map, Amount, RedisKey, RedisValue};
use crate::error::{CacheError, Result};
use crate::store::HashStore;

// == Typed Cache ==
/// A simplified, dictionary-like interface to one hash in the store.
///
/// The methods behave like their counterparts on a plain map, except that
/// every call is async and can fail if the store does. Because the store
/// only transports strings, keys are restricted to strings and integers and
/// values to strings, integers, floats and booleans; both travel as tagged
/// strings, so everything read back has the exact type it was written with.
///
/// Each cache owns a namespace that isolates it from every other cache
/// sharing the store. Every operation runs under the namespace's lock, so
/// operations composed of several store commands (`pop`, `increment`,
/// `to_dict`) are atomic with respect to other callers of the namespace.
///
/// Handles are created by [`RedisSession::cache`] and are cheap to clone;
/// clones share the namespace and its lock.
///
/// # Example
/// ```ignore
/// let session = RedisSession::connect(&RedisConfig::from_env())?;
/// let cache = session.cache("bot.message_counts")?;
///
/// cache.set("channel", 42).await?;
/// cache.increment("channel", 1).await?;
/// let count = cache.get("channel").await?; // Some(RedisValue::Int(43))
/// ```
///
/// [`RedisSession::cache`]: crate::session::RedisSession::cache
#[derive(Clone)]
pub struct RedisCache {
    /// Store backend shared with every cache created by the same session
    store: Arc<dyn HashStore>,
    /// This namespace's entry in the process-wide lock registry
    lock: Arc<Mutex<()>>,
    /// Namespace identifying this cache's hash in the shared store
    namespace: String,
}

impl RedisCache {
    // == Constructor ==
    /// Creates a cache bound to a namespace.
    ///
    /// Only called by `RedisSession::cache`, which validates the namespace
    /// and looks up its lock.
    pub(crate) fn new(store: Arc<dyn HashStore>, lock: Arc<Mutex<()>>, namespace: String) -> Self {
        Self {
            store,
            lock,
            namespace,
        }
    }

    // == Namespace ==
    /// Returns the namespace identifying this cache in the shared store.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Acquires the namespace lock for the duration of one operation.
    ///
    /// Waiters are granted the lock in FIFO order. Dropping the returned
    /// guard releases the lock on every exit path.
    async fn acquire(&self) -> NamespaceGuard<'_> {
        NamespaceGuard::new(self.lock.lock().await)
    }

    // == Set ==
    /// Stores a key-value pair in the cache.
    ///
    /// If the key already exists, the value is overwritten.
    ///
    /// # Arguments
    /// * `key` - The key to store under
    /// * `value` - The value to store
    pub async fn set(&self, key: impl Into<RedisKey>, value: impl Into<RedisValue>) -> Result<()> {
        let guard = self.acquire().await;
        self.set_locked(&guard, &key.into(), &value.into()).await
    }

    /// Set body, for callers that already hold the namespace lock.
    async fn set_locked(
        &self,
        _proof: &NamespaceGuard<'_>,
        key: &RedisKey,
        value: &RedisValue,
    ) -> Result<()> {
        let field = key.to_typestring();
        let payload = value.to_typestring();

        debug!("Setting {} to {} in {}.", field, payload, self.namespace);
        self.store.hash_set(&self.namespace, &field, &payload).await
    }

    // == Get ==
    /// Retrieves a value by key, or `None` if the key is missing.
    ///
    /// A missing key is not an error; callers with a fallback chain
    /// `unwrap_or` onto the result.
    ///
    /// # Arguments
    /// * `key` - The key to retrieve
    pub async fn get(&self, key: impl Into<RedisKey>) -> Result<Option<RedisValue>> {
        let guard = self.acquire().await;
        self.get_locked(&guard, &key.into()).await
    }

    /// Get body, for callers that already hold the namespace lock.
    async fn get_locked(
        &self,
        _proof: &NamespaceGuard<'_>,
        key: &RedisKey,
    ) -> Result<Option<RedisValue>> {
        let field = key.to_typestring();
        debug!("Attempting to retrieve {} from {}.", field, self.namespace);

        match self.store.hash_get(&self.namespace, &field).await? {
            Some(raw) => {
                debug!("Value found, returning {}.", raw);
                Ok(Some(RedisValue::from_typestring(&raw)?))
            }
            None => {
                debug!("Value not found under {}.", field);
                Ok(None)
            }
        }
    }

    // == Delete ==
    /// Removes a key from the cache.
    ///
    /// Deleting a key that does not exist is simply ignored.
    ///
    /// # Arguments
    /// * `key` - The key to delete
    pub async fn delete(&self, key: impl Into<RedisKey>) -> Result<()> {
        let guard = self.acquire().await;
        self.delete_locked(&guard, &key.into()).await
    }

    /// Delete body, for callers that already hold the namespace lock.
    async fn delete_locked(&self, _proof: &NamespaceGuard<'_>, key: &RedisKey) -> Result<()> {
        let field = key.to_typestring();

        debug!("Attempting to delete {} from {}.", field, self.namespace);
        self.store.hash_del(&self.namespace, &field).await
    }

    // == Contains ==
    /// Checks if a key exists in the cache.
    pub async fn contains(&self, key: impl Into<RedisKey>) -> Result<bool> {
        let _guard = self.acquire().await;
        let field = key.into().to_typestring();

        let exists = self.store.hash_exists(&self.namespace, &field).await?;
        debug!(
            "Testing if {} exists in {} - result is {}.",
            field, self.namespace, exists
        );
        Ok(exists)
    }

    // == Items ==
    /// Fetches all key-value pairs in the cache.
    ///
    /// The returned pairs are a point-in-time copy; changing them has no
    /// effect on the store. To change a cached value, use [`RedisCache::set`].
    pub async fn items(&self) -> Result<Vec<(RedisKey, RedisValue)>> {
        let guard = self.acquire().await;
        self.items_locked(&guard).await
    }

    /// Items body, for callers that already hold the namespace lock.
    async fn items_locked(
        &self,
        _proof: &NamespaceGuard<'_>,
    ) -> Result<Vec<(RedisKey, RedisValue)>> {
        let raw = self.store.hash_get_all(&self.namespace).await?;
        let decoded = decode_map(raw)?;

        debug!(
            "Retrieving all {} key-value pairs from {}.",
            decoded.len(),
            self.namespace
        );
        Ok(decoded.into_iter().collect())
    }

    // == Length ==
    /// Returns the number of items in the cache.
    pub async fn length(&self) -> Result<usize> {
        let _guard = self.acquire().await;

        let count = self.store.hash_len(&self.namespace).await?;
        debug!("Returning length of {}. Result is {}.", self.namespace, count);
        Ok(count)
    }

    // == To Dict ==
    /// Materializes the entire cache as a plain map.
    ///
    /// The snapshot is taken under a single lock acquisition, so it never
    /// shows a half-applied compound operation.
    pub async fn to_dict(&self) -> Result<HashMap<RedisKey, RedisValue>> {
        let guard = self.acquire().await;
        let items = self.items_locked(&guard).await?;
        Ok(items.into_iter().collect())
    }

    // == Update ==
    /// Updates the cache with multiple key-value pairs in one write.
    ///
    /// Works like `update` on a plain map: missing keys are created,
    /// existing keys are overwritten, other keys are untouched. An empty
    /// mapping is a no-op.
    ///
    /// # Arguments
    /// * `items` - The key-value pairs to write
    pub async fn update(&self, items: HashMap<RedisKey, RedisValue>) -> Result<()> {
        let _guard = self.acquire().await;

        // The store rejects a multi-set with no pairs
        if items.is_empty() {
            return Ok(());
        }

        debug!("Updating {} with {} entries.", self.namespace, items.len());
        let entries = encode_map(&items);
        self.store.hash_set_multiple(&self.namespace, &entries).await
    }

    // == Clear ==
    /// Deletes the whole namespace hash from the store.
    ///
    /// Every entry is destroyed, including entries written through other
    /// handles bound to the same namespace.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.acquire().await;

        debug!("Clearing all key-value pairs from {}.", self.namespace);
        self.store.delete(&self.namespace).await
    }

    // == Pop ==
    /// Retrieves a value and removes its key from the cache.
    ///
    /// Returns `None` if the key was absent; the removal is then a no-op.
    /// The read and the removal run under one lock acquisition, so no other
    /// operation on the namespace can slip between them.
    ///
    /// # Arguments
    /// * `key` - The key to pop
    pub async fn pop(&self, key: impl Into<RedisKey>) -> Result<Option<RedisValue>> {
        let key = key.into();
        let guard = self.acquire().await;

        debug!(
            "Attempting to pop {} from {}.",
            key.to_typestring(),
            self.namespace
        );
        let value = self.get_locked(&guard, &key).await?;
        self.delete_locked(&guard, &key).await?;
        Ok(value)
    }

    // == Increment ==
    /// Adds `amount` to the numeric value stored under `key`.
    ///
    /// Works on integers and floats; any float operand makes the stored
    /// result a float. Negative amounts are accepted, though
    /// [`RedisCache::decrement`] reads better.
    ///
    /// The read-modify-write sequence runs under one lock acquisition, so
    /// concurrent increments of the same key never lose updates.
    ///
    /// # Errors
    /// - [`CacheError::MissingKey`] if the key does not exist; counters are
    ///   never default-initialized
    /// - [`CacheError::UnsupportedType`] if the stored value is a string or
    ///   a boolean, or if an integer increment overflows
    pub async fn increment(
        &self,
        key: impl Into<RedisKey>,
        amount: impl Into<Amount>,
    ) -> Result<()> {
        let key = key.into();
        let amount = amount.into();
        let guard = self.acquire().await;

        debug!(
            "Attempting to increment {} in {} by {}.",
            key.to_typestring(),
            self.namespace,
            amount
        );

        let current = self
            .get_locked(&guard, &key)
            .await?
            .ok_or_else(|| CacheError::MissingKey(key.to_typestring()))?;

        let updated = apply_amount(&current, amount)?;
        self.set_locked(&guard, &key, &updated).await
    }

    // == Decrement ==
    /// Subtracts `amount` from the numeric value stored under `key`.
    ///
    /// The exact opposite of [`RedisCache::increment`]: it delegates there
    /// with the sign flipped, so the same errors and atomicity apply.
    pub async fn decrement(
        &self,
        key: impl Into<RedisKey>,
        amount: impl Into<Amount>,
    ) -> Result<()> {
        self.increment(key, amount.into().negated()).await
    }
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("namespace", &self.namespace)
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

// == Utility Functions ==
/// Applies an increment amount to a stored numeric value.
///
/// Integer plus integer stays an integer; any float operand promotes the
/// result to a float. Strings and booleans are not incrementable.
fn apply_amount(current: &RedisValue, amount: Amount) -> Result<RedisValue> {
    match (current, amount) {
        (RedisValue::Int(i), Amount::Int(a)) => i.checked_add(a).map(RedisValue::Int).ok_or_else(|| {
            CacheError::UnsupportedType(format!(
                "incrementing {} by {} leaves the integer range",
                i, a
            ))
        }),
        (RedisValue::Int(i), Amount::Float(a)) => Ok(RedisValue::Float(*i as f64 + a)),
        (RedisValue::Float(x), Amount::Int(a)) => Ok(RedisValue::Float(x + a as f64)),
        (RedisValue::Float(x), Amount::Float(a)) => Ok(RedisValue::Float(x + a)),
        (other, _) => Err(CacheError::UnsupportedType(format!(
            "only integers and floats can be incremented or decremented, not {}",
            other.type_name()
        ))),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    /// Builds a cache over a fresh in-memory store.
    fn test_cache(namespace: &str) -> RedisCache {
        RedisCache::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Mutex::new(())),
            namespace.to_string(),
        )
    }

    #[tokio::test]
    async fn test_set_and_get_every_value_type() {
        let cache = test_cache("ns");

        cache.set("string", "hello").await.unwrap();
        cache.set("int", 42).await.unwrap();
        cache.set("float", 0.25).await.unwrap();
        cache.set("bool", true).await.unwrap();

        assert_eq!(
            cache.get("string").await.unwrap(),
            Some(RedisValue::String("hello".to_string()))
        );
        assert_eq!(cache.get("int").await.unwrap(), Some(RedisValue::Int(42)));
        assert_eq!(
            cache.get("float").await.unwrap(),
            Some(RedisValue::Float(0.25))
        );
        assert_eq!(cache.get("bool").await.unwrap(), Some(RedisValue::Bool(true)));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let cache = test_cache("ns");

        assert_eq!(cache.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_with_fallback_default() {
        let cache = test_cache("ns");

        let value = cache
            .get("absent")
            .await
            .unwrap()
            .unwrap_or(RedisValue::Int(0));

        assert_eq!(value, RedisValue::Int(0));
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_value() {
        let cache = test_cache("ns");

        cache.set("key", 1).await.unwrap();
        cache.set("key", "now a string").await.unwrap();

        assert_eq!(
            cache.get("key").await.unwrap(),
            Some(RedisValue::String("now a string".to_string()))
        );
        assert_eq!(cache.length().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_string_and_int_keys_are_distinct() {
        let cache = test_cache("ns");

        cache.set("1", "under string key").await.unwrap();
        cache.set(1, "under int key").await.unwrap();

        assert_eq!(cache.length().await.unwrap(), 2);
        assert_eq!(
            cache.get("1").await.unwrap(),
            Some(RedisValue::String("under string key".to_string()))
        );
        assert_eq!(
            cache.get(1).await.unwrap(),
            Some(RedisValue::String("under int key".to_string()))
        );
    }

    #[tokio::test]
    async fn test_delete_and_contains() {
        let cache = test_cache("ns");

        cache.set("key", 1).await.unwrap();
        assert!(cache.contains("key").await.unwrap());

        cache.delete("key").await.unwrap();
        assert!(!cache.contains("key").await.unwrap());
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ignored() {
        let cache = test_cache("ns");

        cache.set("other", 1).await.unwrap();
        cache.delete("absent").await.unwrap();

        assert_eq!(cache.length().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_items_returns_all_pairs() {
        let cache = test_cache("ns");

        cache.set("a", 1).await.unwrap();
        cache.set(2, "b").await.unwrap();

        let mut items = cache.items().await.unwrap();
        items.sort_by_key(|(k, _)| k.to_typestring());

        assert_eq!(
            items,
            vec![
                (RedisKey::Int(2), RedisValue::String("b".to_string())),
                (RedisKey::String("a".to_string()), RedisValue::Int(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_items_is_a_snapshot() {
        let cache = test_cache("ns");
        cache.set("key", 1).await.unwrap();

        let mut items = cache.items().await.unwrap();
        items[0].1 = RedisValue::Int(99);

        // Mutating the snapshot leaves the store untouched
        assert_eq!(cache.get("key").await.unwrap(), Some(RedisValue::Int(1)));
    }

    #[tokio::test]
    async fn test_to_dict_matches_items() {
        let cache = test_cache("ns");

        cache.set("a", 1).await.unwrap();
        cache.set("b", true).await.unwrap();

        let dict = cache.to_dict().await.unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(
            dict.get(&RedisKey::String("a".to_string())),
            Some(&RedisValue::Int(1))
        );
        assert_eq!(
            dict.get(&RedisKey::String("b".to_string())),
            Some(&RedisValue::Bool(true))
        );
    }

    #[tokio::test]
    async fn test_length_counts_entries() {
        let cache = test_cache("ns");

        assert_eq!(cache.length().await.unwrap(), 0);
        cache.set("a", 1).await.unwrap();
        cache.set("b", 2).await.unwrap();
        assert_eq!(cache.length().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_creates_and_overwrites() {
        let cache = test_cache("ns");
        cache.set("existing", 1).await.unwrap();
        cache.set("untouched", 0).await.unwrap();

        let mut items = HashMap::new();
        items.insert(RedisKey::String("existing".to_string()), RedisValue::Int(2));
        items.insert(RedisKey::String("new".to_string()), RedisValue::Bool(true));
        cache.update(items).await.unwrap();

        assert_eq!(cache.length().await.unwrap(), 3);
        assert_eq!(
            cache.get("existing").await.unwrap(),
            Some(RedisValue::Int(2))
        );
        assert_eq!(
            cache.get("new").await.unwrap(),
            Some(RedisValue::Bool(true))
        );
        assert_eq!(
            cache.get("untouched").await.unwrap(),
            Some(RedisValue::Int(0))
        );
    }

    #[tokio::test]
    async fn test_update_with_empty_map_is_noop() {
        let cache = test_cache("ns");
        cache.set("key", 1).await.unwrap();

        cache.update(HashMap::new()).await.unwrap();

        assert_eq!(cache.length().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_the_namespace() {
        let cache = test_cache("ns");

        cache.set("a", 1).await.unwrap();
        cache.set("b", 2).await.unwrap();
        cache.clear().await.unwrap();

        assert_eq!(cache.length().await.unwrap(), 0);
        assert!(cache.items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pop_returns_and_removes() {
        let cache = test_cache("ns");
        cache.set("key", "value").await.unwrap();

        let popped = cache.pop("key").await.unwrap();

        assert_eq!(popped, Some(RedisValue::String("value".to_string())));
        assert!(!cache.contains("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_pop_absent_returns_none() {
        let cache = test_cache("ns");

        assert_eq!(cache.pop("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_missing_key_fails() {
        let cache = test_cache("ns");

        let result = cache.increment("absent", 1).await;

        assert!(matches!(result, Err(CacheError::MissingKey(_))));
    }

    #[tokio::test]
    async fn test_increment_string_fails() {
        let cache = test_cache("ns");
        cache.set("key", "not a number").await.unwrap();

        let result = cache.increment("key", 1).await;

        assert!(matches!(result, Err(CacheError::UnsupportedType(_))));
        // The stored value is untouched
        assert_eq!(
            cache.get("key").await.unwrap(),
            Some(RedisValue::String("not a number".to_string()))
        );
    }

    #[tokio::test]
    async fn test_increment_bool_fails() {
        // Booleans are not integers here, unlike in some dynamic languages
        let cache = test_cache("ns");
        cache.set("flag", true).await.unwrap();

        let result = cache.increment("flag", 1).await;

        assert!(matches!(result, Err(CacheError::UnsupportedType(_))));
        assert_eq!(
            cache.get("flag").await.unwrap(),
            Some(RedisValue::Bool(true))
        );
    }

    #[tokio::test]
    async fn test_increment_int_by_int_stays_int() {
        let cache = test_cache("ns");
        cache.set("count", 5).await.unwrap();

        cache.increment("count", 2).await.unwrap();

        assert_eq!(cache.get("count").await.unwrap(), Some(RedisValue::Int(7)));
    }

    #[tokio::test]
    async fn test_increment_with_float_promotes() {
        let cache = test_cache("ns");
        cache.set("count", 5).await.unwrap();

        cache.increment("count", 0.5).await.unwrap();

        assert_eq!(
            cache.get("count").await.unwrap(),
            Some(RedisValue::Float(5.5))
        );
    }

    #[tokio::test]
    async fn test_increment_float_by_int() {
        let cache = test_cache("ns");
        cache.set("count", 1.5).await.unwrap();

        cache.increment("count", 2).await.unwrap();

        assert_eq!(
            cache.get("count").await.unwrap(),
            Some(RedisValue::Float(3.5))
        );
    }

    #[tokio::test]
    async fn test_increment_negative_amount_nets() {
        let cache = test_cache("ns");
        cache.set("count", 10).await.unwrap();

        cache.increment("count", 2).await.unwrap();
        cache.increment("count", -5).await.unwrap();

        assert_eq!(cache.get("count").await.unwrap(), Some(RedisValue::Int(7)));
    }

    #[tokio::test]
    async fn test_increment_overflow_fails() {
        let cache = test_cache("ns");
        cache.set("count", i64::MAX).await.unwrap();

        let result = cache.increment("count", 1).await;

        assert!(matches!(result, Err(CacheError::UnsupportedType(_))));
        assert_eq!(
            cache.get("count").await.unwrap(),
            Some(RedisValue::Int(i64::MAX))
        );
    }

    #[tokio::test]
    async fn test_decrement_flips_the_sign() {
        let cache = test_cache("ns");
        cache.set("count", 10).await.unwrap();

        cache.decrement("count", 3).await.unwrap();
        cache.decrement("count", 0.5).await.unwrap();

        assert_eq!(
            cache.get("count").await.unwrap(),
            Some(RedisValue::Float(6.5))
        );
    }

    #[tokio::test]
    async fn test_lock_is_released_after_a_failed_operation() {
        let cache = test_cache("ns");

        assert!(cache.increment("absent", 1).await.is_err());

        // The namespace must still be usable
        cache.set("key", 1).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(RedisValue::Int(1)));
    }

    #[tokio::test]
    async fn test_debug_shows_namespace_and_backend() {
        let cache = test_cache("ns");

        let rendered = format!("{:?}", cache);

        assert!(rendered.contains("ns"));
        assert!(rendered.contains("memory"));
    }
}
