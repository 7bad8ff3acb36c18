//! Cache Module
//!
//! Provides in-process caching with LRU eviction and sliding TTL expiration.

mod clock;
mod element;
mod key;
mod lru;
mod lru_cache;
mod stats;
mod store;
mod traits;


// Re-export public types
pub use clock::{Clock, MockClock, SystemClock};
pub use element::CacheElement;
pub use key::CacheKey;
pub use lru::{LruList, NodeId};
pub use lru_cache::{validate_cache_name, LruCache};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use traits::Cache;

// == Public Constants ==
/// Capacity used when no configuration overrides it
pub const DEFAULT_CAPACITY: usize = 1000;

/// TTL in minutes used when no configuration overrides it
pub const DEFAULT_TIME_TO_LIVE: i64 = 2;
