//! Cache Store Module
//!
//! Single-threaded cache engine combining a HashMap index with LRU ordering
//! and TTL expiration. [`LruCache`](crate::cache::LruCache) wraps it in a lock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::cache::lru::NodeId;
use crate::cache::{CacheElement, CacheKey, CacheStats, LruList};

/// A stored element and its position in the recency list.
#[derive(Debug)]
struct Slot<V> {
    element: CacheElement<V>,
    node: NodeId,
}

// == Cache Store ==
/// Capacity-bounded, recency-ordered storage with lazy TTL expiration.
///
/// Every operation takes the current instant explicitly so the owner decides
/// which clock drives expiry.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key index
    entries: HashMap<CacheKey, Slot<V>>,
    /// Recency order, least recently used first
    lru: LruList,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL in minutes applied on every insert and successful get
    default_ttl: i64,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the store can hold
    /// * `default_ttl` - TTL in minutes, `<= 0` keeps entries indefinitely
    pub fn new(capacity: usize, default_ttl: i64) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            lru: LruList::with_capacity(capacity),
            stats: CacheStats::new(),
            capacity,
            default_ttl,
        }
    }

    // == Insert ==
    /// Inserts or overwrites the element keyed by its id.
    ///
    /// The element's own expiration is replaced using the store TTL and the
    /// key becomes most recently used. If the store then holds more than
    /// `capacity` entries, the single least recently used one is evicted and
    /// its key returned.
    pub fn insert(&mut self, mut element: CacheElement<V>, now: DateTime<Utc>) -> Option<CacheKey> {
        element.set_expiration_at(now, self.default_ttl);
        let key = element.id().clone();

        match self.entries.get_mut(&key) {
            Some(slot) => {
                slot.element = element;
                self.lru.move_to_back(slot.node);
            }
            None => {
                let node = self.lru.push_back(key.clone());
                self.entries.insert(key, Slot { element, node });
            }
        }

        if self.entries.len() > self.capacity {
            self.evict_oldest()
        } else {
            None
        }
    }

    // == Get ==
    /// Looks up a live element.
    ///
    /// An expired element is removed and reported as absent. A live one is
    /// moved to the most recently used position and its TTL renewed.
    pub fn get(&mut self, key: &CacheKey, now: DateTime<Utc>) -> Option<&CacheElement<V>> {
        let expired = match self.entries.get(key) {
            Some(slot) => slot.element.is_expired_at(now),
            None => {
                self.stats.record_lookup(false);
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_lookup(false);
            self.stats.record_expirations(1);
            return None;
        }

        let slot = self.entries.get_mut(key)?;
        slot.element.set_expiration_at(now, self.default_ttl);
        self.lru.move_to_back(slot.node);
        self.stats.record_lookup(true);
        Some(&slot.element)
    }

    // == Remove ==
    /// Removes an entry regardless of its expiry state.
    pub fn remove(&mut self, key: &CacheKey) -> Option<CacheElement<V>> {
        self.remove_entry(key)
    }

    // == Remove Expired ==
    /// Removes every expired entry in one pass and returns their keys.
    ///
    /// Surviving entries keep their relative recency order.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> Vec<CacheKey> {
        let expired_keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.element.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys
    }

    // == Values ==
    /// Clones every stored element, least recently used first.
    ///
    /// Expired-but-unswept elements are included.
    pub fn values(&self) -> Vec<CacheElement<V>>
    where
        V: Clone,
    {
        self.lru
            .iter()
            .filter_map(|key| self.entries.get(key))
            .map(|slot| slot.element.clone())
            .collect()
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<CacheKey> {
        self.lru.iter().cloned().collect()
    }

    /// Checks presence without touching recency or expiry.
    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> i64 {
        self.default_ttl
    }

    // == Internals ==
    fn evict_oldest(&mut self) -> Option<CacheKey> {
        let key = self.lru.pop_front()?;
        self.entries.remove(&key);
        self.stats.record_eviction();
        Some(key)
    }

    fn remove_entry(&mut self, key: &CacheKey) -> Option<CacheElement<V>> {
        let slot = self.entries.remove(key)?;
        self.lru.remove(slot.node);
        Some(slot.element)
    }
}
