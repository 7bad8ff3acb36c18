//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Lookups never fail: a missing or expired key is reported as `None` / `false`
//! by the cache operations, not as an error.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction, the registry and backups.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid construction parameters or configuration source
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A cache with this name exists but holds a different value type
    #[error("Cache '{name}' already exists with a different value type")]
    TypeMismatch { name: String },

    /// The process-wide registry was initialized twice
    #[error("Cache manager is already initialized")]
    AlreadyInitialized,

    /// No backup file exists for the requested cache
    #[error("Backup file not found: {}", .0.display())]
    BackupNotFound(PathBuf),

    /// Backup was written with an encoding version this build cannot read
    #[error("Unsupported backup version {found} (expected {expected})")]
    UnsupportedBackupVersion { found: u64, expected: u32 },

    /// A cleanup daemon was needed but no tokio runtime is running
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// File system failure while reading or writing a backup
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backup payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Shorthand for building a [`CacheError::Configuration`].
    pub fn config(msg: impl Into<String>) -> Self {
        CacheError::Configuration(msg.into())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
