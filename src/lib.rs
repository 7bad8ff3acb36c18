//! Mini Cache - An in-process generic cache
//!
//! Provides bounded named caches with LRU eviction and sliding TTL
//! expiration, background expiry sweeps, and optional disk backups.

pub mod backup;
pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod tasks;

pub use cache::{Cache, CacheElement, CacheKey, LruCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use manager::CacheManager;
pub use tasks::CleanupDaemon;
