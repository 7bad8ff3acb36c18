//! Background Tasks Module
//!
//! Contains background tasks that run alongside the caches.
//!
//! # Tasks
//! - TTL Cleanup: sweeps expired entries out of one cache at a fixed interval

mod cleanup;

pub use cleanup::CleanupDaemon;
