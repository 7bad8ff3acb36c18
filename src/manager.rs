//! Cache Manager Module
//!
//! Process-wide registry that builds named caches from a [`Config`], starts
//! one cleanup daemon per cache, and handles backup and restore.

use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::backup::{self, BackupTarget};
use crate::cache::{Clock, LruCache, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::CleanupDaemon;

static GLOBAL_MANAGER: OnceLock<CacheManager> = OnceLock::new();

/// A cache held by the registry, type-erased so caches of different value
/// types can share one map.
struct RegisteredCache {
    cache: Arc<dyn Any + Send + Sync>,
    backup: Arc<dyn BackupTarget>,
    /// Taken on shutdown
    daemon: Option<CleanupDaemon>,
}

// == Cache Manager ==
/// Builds and owns every named cache in the process.
///
/// Each name maps to exactly one cache for the manager's lifetime, created on
/// first request with the configured capacity and TTL.
pub struct CacheManager {
    config: Config,
    clock: Arc<dyn Clock>,
    caches: Mutex<HashMap<String, RegisteredCache>>,
}

impl CacheManager {
    // == Constructors ==
    /// Creates a standalone manager.
    ///
    /// # Errors
    /// [`CacheError::Configuration`] if the config fails validation.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a manager whose caches read time from `clock`.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            caches: Mutex::new(HashMap::new()),
        })
    }

    /// Installs the process-wide manager. Only the first call succeeds.
    pub fn init(config: Config) -> Result<&'static CacheManager> {
        let manager = Self::new(config)?;
        GLOBAL_MANAGER
            .set(manager)
            .map_err(|_| CacheError::AlreadyInitialized)?;
        info!("Cache manager initialized");
        GLOBAL_MANAGER.get().ok_or(CacheError::AlreadyInitialized)
    }

    /// Returns the process-wide manager if [`init`](Self::init) ran.
    pub fn global() -> Option<&'static CacheManager> {
        GLOBAL_MANAGER.get()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Get Cache ==
    /// Returns the cache called `name`, creating it and starting its cleanup
    /// daemon on first use.
    ///
    /// Existing caches can be fetched from anywhere; creating one needs a
    /// running tokio runtime for its daemon.
    ///
    /// # Errors
    /// - [`CacheError::Configuration`] if `name` is not a valid cache name
    /// - [`CacheError::NoRuntime`] if the cache must be created outside a runtime
    /// - [`CacheError::TypeMismatch`] if `name` exists with another value type
    pub fn get_cache<V>(&self, name: &str) -> Result<Arc<LruCache<V>>>
    where
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let mut caches = self.lock();

        if let Some(registered) = caches.get(name) {
            return Arc::clone(&registered.cache)
                .downcast::<LruCache<V>>()
                .map_err(|_| CacheError::TypeMismatch {
                    name: name.to_string(),
                });
        }

        let runtime = Handle::try_current()?;
        let cache = Arc::new(LruCache::with_clock(
            name,
            self.config.max_size,
            self.config.time_to_live,
            Arc::clone(&self.clock),
        )?);
        let daemon =
            CleanupDaemon::spawn_on(&runtime, Arc::clone(&cache), self.config.cleanup_period());

        caches.insert(
            name.to_string(),
            RegisteredCache {
                cache: cache.clone(),
                backup: cache.clone(),
                daemon: Some(daemon),
            },
        );

        info!(
            cache = %name,
            "Created cache: max_size={}, ttl={}min, cleanup_interval={}min",
            self.config.max_size,
            self.config.time_to_live,
            self.config.cleanup_interval
        );
        Ok(cache)
    }

    // == Restore Cache ==
    /// Rebuilds `name` from its backup file, then deletes the file.
    ///
    /// Restored elements are inserted into the (possibly already populated)
    /// cache returned by [`get_cache`](Self::get_cache).
    pub fn restore_cache<V>(&self, name: &str) -> Result<Arc<LruCache<V>>>
    where
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let path = backup::backup_file_path(&self.config.backup_path, name)?;
        let file = backup::read_backup::<V>(&path)?;
        if file.cache_name != name {
            warn!(
                cache = %name,
                "Backup file {} was written for cache '{}'",
                path.display(),
                file.cache_name
            );
        }

        let cache = self.get_cache::<V>(name)?;
        let restored = backup::restore_into(cache.as_ref(), file.elements);

        if let Err(e) = fs::remove_file(&path) {
            warn!(cache = %name, "Could not remove backup file {}: {}", path.display(), e);
        }

        info!(cache = %name, "Restored {} entries from backup", restored);
        Ok(cache)
    }

    // == Backup All ==
    /// Writes every registered cache to the backup directory and returns how
    /// many files were written. Empty caches are skipped.
    ///
    /// A cache that fails to write does not stop the others; each failure is
    /// logged and the first one is returned once every cache was attempted.
    pub fn backup_all(&self) -> Result<usize> {
        let targets: Vec<Arc<dyn BackupTarget>> = self
            .lock()
            .values()
            .map(|registered| Arc::clone(&registered.backup))
            .collect();

        let mut written = 0;
        let mut first_error = None;
        for target in targets {
            match target.write_backup(&self.config.backup_path) {
                Ok(Some(_)) => written += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(cache = %target.backup_name(), "Backup failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Names of all registered caches, sorted.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    // == Shutdown ==
    /// Backs caches up when enabled, then stops every cleanup daemon.
    ///
    /// Caches stay registered and usable; only their sweeping stops.
    pub async fn shutdown(&self) -> Result<()> {
        let backup_result = if self.config.backup_enabled {
            self.backup_all().map(|written| {
                info!("Backed up {} caches to {}", written, self.config.backup_path.display());
            })
        } else {
            Ok(())
        };

        let daemons: Vec<CleanupDaemon> = self
            .lock()
            .values_mut()
            .filter_map(|registered| registered.daemon.take())
            .collect();

        for daemon in daemons {
            daemon.shutdown().await;
        }

        info!("Cache manager shut down");
        backup_result
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RegisteredCache>> {
        self.caches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .field("caches", &self.cache_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, CacheElement, CacheKey, MockClock};

    fn test_config() -> Config {
        Config {
            max_size: 10,
            time_to_live: 5,
            cleanup_interval: 1,
            backup_enabled: false,
            backup_path: std::env::temp_dir().join("mini_cache_manager_unit"),
        }
    }

    #[tokio::test]
    async fn test_get_cache_returns_same_instance() {
        let manager = CacheManager::new(test_config()).unwrap();

        let first = manager.get_cache::<String>("StringCache").unwrap();
        let second = manager.get_cache::<String>("StringCache").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cache_names(), vec!["StringCache".to_string()]);
        assert_eq!(first.capacity(), 10);
        assert_eq!(first.time_to_live(), 5);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let manager = CacheManager::new(test_config()).unwrap();

        manager.get_cache::<String>("shared").unwrap();
        let result = manager.get_cache::<f64>("shared");

        assert!(matches!(result, Err(CacheError::TypeMismatch { .. })));
        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let manager = CacheManager::new(test_config()).unwrap();
        let result = manager.get_cache::<String>("");
        assert!(matches!(result, Err(CacheError::Configuration(_))));
        assert!(manager.cache_names().is_empty());
    }

    #[tokio::test]
    async fn test_named_caches_are_independent() {
        let manager = CacheManager::new(test_config()).unwrap();

        let floats = manager.get_cache::<f32>("FloatCache").unwrap();
        let strings = manager.get_cache::<String>("StringCache").unwrap();

        floats.insert(CacheElement::new("1", 1.5));
        floats.insert(CacheElement::new("2", 2.5));
        strings.insert(CacheElement::new("1", "String1".to_string()));

        assert_eq!(floats.len(), 2);
        assert_eq!(strings.len(), 1);
        assert_eq!(*floats.get(&CacheKey::new("1")).unwrap().value(), 1.5);
        assert_eq!(strings.get(&CacheKey::new("1")).unwrap().value(), "String1");

        strings.remove(&CacheKey::new("1"));
        assert_eq!(floats.len(), 2);

        manager.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_registered_cache_is_swept() {
        let clock = MockClock::new();
        let manager = CacheManager::with_clock(test_config(), Arc::new(clock.clone())).unwrap();

        let cache = manager.get_cache::<String>("swept").unwrap();
        cache.insert(CacheElement::new("k", "v".to_string()));

        clock.advance_minutes(6);
        tokio::time::sleep(std::time::Duration::from_secs(61)).await;

        assert!(cache.is_empty());
        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_backup_does_not_skip_other_caches() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            backup_enabled: true,
            backup_path: dir.path().to_path_buf(),
            ..test_config()
        };
        let manager = CacheManager::new(config).unwrap();

        let bad = manager.get_cache::<String>("bad").unwrap();
        bad.insert(CacheElement::new("k", "v".to_string()));
        // A directory where the backup file should go makes its write fail
        fs::create_dir(dir.path().join("bad.json")).unwrap();

        for i in 0..20 {
            let good = manager.get_cache::<u32>(&format!("good{}", i)).unwrap();
            good.insert(CacheElement::new("k", i));
        }

        let result = manager.shutdown().await;

        assert!(matches!(result, Err(CacheError::Io(_))));
        for i in 0..20 {
            assert!(dir.path().join(format!("good{}.json", i)).is_file());
        }
    }

    #[tokio::test]
    async fn test_path_like_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            backup_path: dir.path().join("backups"),
            ..test_config()
        };
        let manager = CacheManager::new(config).unwrap();

        let result = manager.get_cache::<String>("../escaped");

        assert!(matches!(result, Err(CacheError::Configuration(_))));
        assert_eq!(manager.backup_all().unwrap(), 0);
        assert!(!dir.path().join("escaped.json").exists());
    }

    #[test]
    fn test_get_cache_outside_runtime() {
        let manager = CacheManager::new(test_config()).unwrap();

        let result = manager.get_cache::<String>("no_runtime");

        assert!(matches!(result, Err(CacheError::NoRuntime(_))));
        assert!(manager.cache_names().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            max_size: 0,
            ..test_config()
        };
        assert!(matches!(
            CacheManager::new(config),
            Err(CacheError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_global_init_once() {
        let first = CacheManager::init(test_config()).unwrap();
        assert!(std::ptr::eq(first, CacheManager::global().unwrap()));

        let second = CacheManager::init(test_config());
        assert!(matches!(second, Err(CacheError::AlreadyInitialized)));
    }
}
