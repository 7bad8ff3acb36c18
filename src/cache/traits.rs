//! Cache Contract
//!
//! The interface every cache variant satisfies. Callers, the cleanup daemon
//! and the backup code only talk to caches through this trait.

use crate::cache::{CacheElement, CacheKey};

// == Cache Trait ==
/// A named, thread-safe key/element cache.
///
/// None of these operations fail: a missing or expired key is reported as
/// `None` / `false`, and overwriting, expiring or evicting entries are normal
/// state transitions.
pub trait Cache: Send + Sync {
    /// Type of the values stored in the cache
    type Value;

    /// Inserts or overwrites the element keyed by `element.id()`.
    ///
    /// The cache's own TTL replaces whatever expiration the element carried,
    /// and the key becomes most recently used. May evict the least recently
    /// used entry when capacity is exceeded.
    fn insert(&self, element: CacheElement<Self::Value>);

    /// Returns a copy of the live element for `key`.
    ///
    /// An expired element is removed and `None` returned. A live element is
    /// promoted to most recently used and its TTL renewed.
    fn get(&self, key: &CacheKey) -> Option<CacheElement<Self::Value>>;

    /// Deletes the entry for `key`, returning whether anything was removed.
    fn remove(&self, key: &CacheKey) -> bool;

    /// Deletes every expired entry in one pass and returns how many went.
    fn remove_all_expired(&self) -> usize;

    /// The configured name of this cache.
    fn name(&self) -> &str;

    /// Point-in-time copy of all stored elements, expired ones included.
    fn values(&self) -> Vec<CacheElement<Self::Value>>;
}
