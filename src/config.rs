//! Configuration Module
//!
//! Loads cache construction parameters from environment variables or from a
//! Java-style properties file.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TIME_TO_LIVE};
use crate::error::{CacheError, Result};

// == Environment Variables ==
const ENV_MAX_SIZE: &str = "CACHE_MAX_SIZE";
const ENV_TIME_TO_LIVE: &str = "CACHE_TIME_TO_LIVE";
const ENV_CLEANUP_INTERVAL: &str = "CACHE_CLEANUP_INTERVAL";
const ENV_BACKUP: &str = "CACHE_BACKUP";
const ENV_BACKUP_PATH: &str = "CACHE_BACKUP_PATH";

// == Properties File Keys ==
const PROP_MAX_SIZE: &str = "maxSize";
const PROP_TIME_TO_LIVE: &str = "timeToLive";
const PROP_CLEANUP_INTERVAL: &str = "CleanupInterval";
const PROP_BACKUP: &str = "backup";
const PROP_BACKUP_PATH: &str = "BackupPath";

/// Cache configuration parameters shared by every cache the manager builds.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of entries per cache
    pub max_size: usize,
    /// TTL in minutes, `<= 0` keeps entries indefinitely
    pub time_to_live: i64,
    /// Minutes between cleanup sweeps
    pub cleanup_interval: u64,
    /// Whether caches are written to disk on shutdown
    pub backup_enabled: bool,
    /// Directory holding backup files
    pub backup_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum entries per cache (default: 1000)
    /// - `CACHE_TIME_TO_LIVE` - TTL in minutes (default: 2)
    /// - `CACHE_CLEANUP_INTERVAL` - Minutes between sweeps (default: 1)
    /// - `CACHE_BACKUP` - `true` to back caches up on shutdown (default: false)
    /// - `CACHE_BACKUP_PATH` - Backup directory (default: `backup`)
    ///
    /// Unset variables fall back to their defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok(), SourceKeys::ENV)
    }

    /// Loads configuration from a properties file with `key=value` lines.
    ///
    /// Recognised keys are `maxSize`, `timeToLive`, `CleanupInterval`,
    /// `backup` and `BackupPath`. Lines starting with `#` or `!` are comments.
    pub fn from_properties_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CacheError::config(format!(
                "cannot read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_properties_str(&contents)
    }

    /// Parses properties-file contents.
    pub fn from_properties_str(contents: &str) -> Result<Self> {
        let properties = parse_properties(contents);
        Self::from_lookup(|name| properties.get(name).cloned(), SourceKeys::PROPERTIES)
    }

    /// Checks the invariants every cache relies on.
    pub fn validate(&self) -> Result<()> {
        if self.max_size < 1 {
            return Err(CacheError::config("max size must be at least 1"));
        }
        if self.cleanup_interval < 1 {
            return Err(CacheError::config(
                "cleanup interval must be at least 1 minute",
            ));
        }
        Ok(())
    }

    /// Cleanup interval as a `Duration`.
    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.saturating_mul(60))
    }

    fn from_lookup<F>(lookup: F, keys: SourceKeys) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            max_size: parse_or(&lookup, keys.max_size, defaults.max_size)?,
            time_to_live: parse_or(&lookup, keys.time_to_live, defaults.time_to_live)?,
            cleanup_interval: parse_or(
                &lookup,
                keys.cleanup_interval,
                defaults.cleanup_interval,
            )?,
            backup_enabled: parse_flag_or(&lookup, keys.backup, defaults.backup_enabled)?,
            backup_path: lookup(keys.backup_path)
                .map(|v| PathBuf::from(v.trim()))
                .unwrap_or(defaults.backup_path),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CAPACITY,
            time_to_live: DEFAULT_TIME_TO_LIVE,
            cleanup_interval: 1,
            backup_enabled: false,
            backup_path: PathBuf::from("backup"),
        }
    }
}

/// Names of each setting in one configuration source.
struct SourceKeys {
    max_size: &'static str,
    time_to_live: &'static str,
    cleanup_interval: &'static str,
    backup: &'static str,
    backup_path: &'static str,
}

impl SourceKeys {
    const ENV: SourceKeys = SourceKeys {
        max_size: ENV_MAX_SIZE,
        time_to_live: ENV_TIME_TO_LIVE,
        cleanup_interval: ENV_CLEANUP_INTERVAL,
        backup: ENV_BACKUP,
        backup_path: ENV_BACKUP_PATH,
    };

    const PROPERTIES: SourceKeys = SourceKeys {
        max_size: PROP_MAX_SIZE,
        time_to_live: PROP_TIME_TO_LIVE,
        cleanup_interval: PROP_CLEANUP_INTERVAL,
        backup: PROP_BACKUP,
        backup_path: PROP_BACKUP_PATH,
    };
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CacheError::config(format!("invalid value '{}' for {}: {}", raw, name, e))),
        None => Ok(default),
    }
}

/// Reads a `true`/`false` flag, ignoring case.
fn parse_flag_or<F>(lookup: &F, name: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(CacheError::config(format!(
                "invalid value '{}' for {}: expected true or false",
                raw, name
            ))),
        },
        None => Ok(default),
    }
}

fn parse_properties(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(['=', ':'])?;
            let (key, value) = line.split_at(split);
            Some((key.trim().to_string(), value[1..].trim().to_string()))
        })
        .collect()
}
