//! LRU Cache Module
//!
//! Thread-safe [`Cache`] implementation: one coarse lock around a
//! [`CacheStore`], plus the cache's name, limits and clock.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::cache::{
    Cache, CacheElement, CacheKey, CacheStats, CacheStore, Clock, SystemClock,
};
use crate::error::{CacheError, Result};

// == LRU Cache ==
/// Named cache with least-recently-used eviction and sliding TTL expiration.
///
/// # Example
/// ```
/// use mini_cache::cache::{Cache, CacheElement, CacheKey, LruCache};
///
/// let cache = LruCache::new("users", 2, 10).unwrap();
/// cache.insert(CacheElement::new("1", "alice".to_string()));
/// cache.insert(CacheElement::new("2", "bob".to_string()));
/// cache.get(&CacheKey::new("1"));
/// cache.insert(CacheElement::new("3", "carol".to_string()));
///
/// // "2" was least recently used
/// assert!(cache.get(&CacheKey::new("2")).is_none());
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Debug)]
pub struct LruCache<V> {
    name: String,
    capacity: usize,
    /// TTL in minutes, `<= 0` = entries never expire
    time_to_live: i64,
    clock: Arc<dyn Clock>,
    store: Mutex<CacheStore<V>>,
}

impl<V> LruCache<V> {
    // == Constructor ==
    /// Creates a cache driven by the system clock.
    ///
    /// # Errors
    /// [`CacheError::Configuration`] if `name` is rejected by
    /// [`validate_cache_name`] or `capacity` is 0.
    pub fn new(name: impl Into<String>, capacity: usize, time_to_live: i64) -> Result<Self> {
        Self::with_clock(name, capacity, time_to_live, Arc::new(SystemClock))
    }

    /// Creates a cache driven by a custom clock (useful for testing).
    pub fn with_clock(
        name: impl Into<String>,
        capacity: usize,
        time_to_live: i64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let name = name.into();
        validate_cache_name(&name)?;
        if capacity < 1 {
            return Err(CacheError::config(format!(
                "cache '{}' capacity must be at least 1",
                name
            )));
        }

        Ok(Self {
            name,
            capacity,
            time_to_live,
            clock,
            store: Mutex::new(CacheStore::new(capacity, time_to_live)),
        })
    }

    // == Inspection ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn time_to_live(&self) -> i64 {
        self.time_to_live
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Checks presence without promoting the key or renewing its TTL.
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<CacheKey> {
        self.lock().keys_by_recency()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    // A panic while the guard is held cannot leave the store half-updated
    // across a list/index pair, so a poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, CacheStore<V>> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Checks that `name` can identify a cache and name its backup file.
///
/// Names must be non-blank and must not contain path separators, NUL, or be
/// `.`/`..`, so `<backup dir>/<name>.json` always stays inside the backup dir.
pub fn validate_cache_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CacheError::config("cache name must not be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(CacheError::config(format!(
            "cache name '{}' must not contain path separators or be a relative path",
            name.escape_default()
        )));
    }
    Ok(())
}

impl<V> Cache for LruCache<V>
where
    V: Clone + Send,
{
    type Value = V;

    fn insert(&self, element: CacheElement<V>) {
        let now = self.clock.now();
        let evicted = self.lock().insert(element, now);
        if let Some(key) = evicted {
            debug!(cache = %self.name, key = %key, "Evicted least recently used entry");
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CacheElement<V>> {
        let now = self.clock.now();
        self.lock().get(key, now).cloned()
    }

    fn remove(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    fn remove_all_expired(&self) -> usize {
        let now = self.clock.now();
        let (removed, stats) = {
            let mut store = self.lock();
            let removed = store.remove_expired(now);
            (removed, store.stats())
        };
        for key in &removed {
            debug!(cache = %self.name, key = %key, "Evicting expired entry");
        }
        debug!(cache = %self.name, "After sweep: {}", stats);
        removed.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn values(&self) -> Vec<CacheElement<V>> {
        self.lock().values()
    }
}
