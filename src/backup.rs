//! Backup Module
//!
//! Writes cache snapshots to disk as versioned JSON and replays them into a
//! cache on restore.
//!
//! A backup file `<dir>/<cache name>.json` looks like:
//! ```json
//! { "version": 1, "cache_name": "users", "created_at": "...", "elements": [ ... ] }
//! ```
//! Elements are stored least recently used first, so replaying them through
//! [`Cache::insert`] in file order rebuilds the same recency order.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{validate_cache_name, Cache, CacheElement};
use crate::error::{CacheError, Result};

// == Public Constants ==
/// Encoding version written into every backup file
pub const BACKUP_FORMAT_VERSION: u32 = 1;

/// Extension of backup files
pub const BACKUP_EXTENSION: &str = "json";

// == Backup File ==
/// On-disk representation of one cache snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupFile<V> {
    pub version: u32,
    pub cache_name: String,
    pub created_at: DateTime<Utc>,
    pub elements: Vec<CacheElement<V>>,
}

/// Location of the backup file for `cache_name` inside `dir`.
///
/// # Errors
/// [`CacheError::Configuration`] if the name could resolve outside `dir`.
pub fn backup_file_path(dir: &Path, cache_name: &str) -> Result<PathBuf> {
    validate_cache_name(cache_name)?;
    Ok(dir.join(format!("{}.{}", cache_name, BACKUP_EXTENSION)))
}

// == Write Backup ==
/// Snapshots `cache` into `dir`.
///
/// Empty caches are skipped and `Ok(None)` returned; otherwise the path of
/// the written file. The directory is created if needed.
pub fn write_backup<C>(dir: &Path, cache: &C) -> Result<Option<PathBuf>>
where
    C: Cache + ?Sized,
    C::Value: Serialize,
{
    let elements = cache.values();
    if elements.is_empty() {
        debug!(cache = %cache.name(), "Skipping backup of empty cache");
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let path = backup_file_path(dir, cache.name())?;
    let backup = BackupFile {
        version: BACKUP_FORMAT_VERSION,
        cache_name: cache.name().to_string(),
        created_at: Utc::now(),
        elements,
    };

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(&mut writer, &backup)?;
    writer.flush()?;

    info!(
        cache = %cache.name(),
        "Backed up {} entries to {}",
        backup.elements.len(),
        path.display()
    );
    Ok(Some(path))
}

// == Read Backup ==
/// Loads a backup file, rejecting encodings this build does not understand.
pub fn read_backup<V>(path: &Path) -> Result<BackupFile<V>>
where
    V: DeserializeOwned,
{
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CacheError::BackupNotFound(path.to_path_buf()),
        _ => CacheError::Io(e),
    })?;

    // Check the version before decoding elements of an unknown shape
    let raw: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
    let found = raw
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);
    if u32::try_from(found).ok() != Some(BACKUP_FORMAT_VERSION) {
        return Err(CacheError::UnsupportedBackupVersion {
            found,
            expected: BACKUP_FORMAT_VERSION,
        });
    }

    Ok(serde_json::from_value(raw)?)
}

// == Restore ==
/// Replays elements into `cache` in order and returns how many were inserted.
///
/// Each insert applies the cache's own TTL, so restored entries start a fresh
/// expiration window.
pub fn restore_into<C>(cache: &C, elements: Vec<CacheElement<C::Value>>) -> usize
where
    C: Cache + ?Sized,
{
    let count = elements.len();
    for element in elements {
        cache.insert(element);
    }
    count
}

// == Backup Target ==
/// Object-safe view of a cache that can write itself to a backup directory.
///
/// Lets a registry holding caches of different value types back them all up.
pub trait BackupTarget: Send + Sync {
    fn backup_name(&self) -> &str;

    fn write_backup(&self, dir: &Path) -> Result<Option<PathBuf>>;
}

impl<C> BackupTarget for C
where
    C: Cache,
    C::Value: Serialize,
{
    fn backup_name(&self) -> &str {
        self.name()
    }

    fn write_backup(&self, dir: &Path) -> Result<Option<PathBuf>> {
        write_backup(dir, self)
    }
}
