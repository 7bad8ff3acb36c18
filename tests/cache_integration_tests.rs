//! Integration Tests for the public cache API
//!
//! Exercises caches, the manager, backups and cleanup daemons together the
//! way an embedding application would.

use std::sync::Arc;
use std::time::Duration;

use mini_cache::cache::MockClock;
use mini_cache::{Cache, CacheElement, CacheError, CacheKey, CacheManager, CleanupDaemon, Config, LruCache};
use tokio_test::assert_ok;

// == Helper Functions ==

fn config_with_backup(dir: &std::path::Path) -> Config {
    Config {
        max_size: 10,
        time_to_live: 60,
        cleanup_interval: 1,
        backup_enabled: true,
        backup_path: dir.to_path_buf(),
    }
}

fn key(k: &str) -> CacheKey {
    CacheKey::new(k)
}

// == Eviction ==

#[tokio::test]
async fn test_promoted_key_survives_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(config_with_backup(dir.path())).unwrap();
    let cache = manager.get_cache::<f32>("FloatCache").unwrap();

    for i in 1..=10 {
        cache.insert(CacheElement::new(i.to_string(), i as f32 + 0.5));
    }

    // "7" becomes most recently used, so "1" is the eviction candidate
    assert_eq!(*cache.get(&key("7")).unwrap().value(), 7.5);
    cache.insert(CacheElement::new("11", 11.5));

    assert!(cache.get(&key("1")).is_none());
    assert!(cache.get(&key("7")).is_some());
    assert_eq!(cache.len(), 10);

    manager.shutdown().await.unwrap();
}

// == Backup & Restore ==

#[tokio::test]
async fn test_shutdown_backup_then_restore() {
    let dir = tempfile::tempdir().unwrap();

    let first_run = CacheManager::new(config_with_backup(dir.path())).unwrap();
    let strings = first_run.get_cache::<String>("StringCache").unwrap();
    strings.insert(CacheElement::new("1", "String1".to_string()));
    strings.insert(CacheElement::new("2", "String2".to_string()));
    strings.get(&key("1"));
    // Empty caches produce no backup file
    first_run.get_cache::<u64>("EmptyCache").unwrap();

    assert_ok!(first_run.shutdown().await);
    assert!(dir.path().join("StringCache.json").exists());
    assert!(!dir.path().join("EmptyCache.json").exists());

    let restarted = CacheManager::new(config_with_backup(dir.path())).unwrap();
    let restored = restarted.restore_cache::<String>("StringCache").unwrap();

    assert_eq!(restored.get(&key("2")).unwrap().value(), "String2");
    assert_eq!(restored.keys_by_recency(), vec![key("1"), key("2")]);
    // Backup file is consumed by the restore
    assert!(!dir.path().join("StringCache.json").exists());

    restored.insert(CacheElement::new("13", "String13".to_string()));
    assert_eq!(restored.len(), 3);

    restarted.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_restore_without_backup_file() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(config_with_backup(dir.path())).unwrap();

    let result = manager.restore_cache::<String>("Missing");

    assert!(matches!(result, Err(CacheError::BackupNotFound(_))));
    assert!(manager.cache_names().is_empty());
}

#[tokio::test]
async fn test_backup_all_counts_written_files() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CacheManager::new(config_with_backup(dir.path())).unwrap();

    manager
        .get_cache::<String>("a")
        .unwrap()
        .insert(CacheElement::new("k", "v".to_string()));
    manager
        .get_cache::<i64>("b")
        .unwrap()
        .insert(CacheElement::new("k", 1));
    manager.get_cache::<i64>("c").unwrap();

    assert_eq!(manager.backup_all().unwrap(), 2);
    assert_eq!(manager.cache_names(), vec!["a", "b", "c"]);

    manager.shutdown().await.unwrap();
}

// == Cleanup Daemon ==

#[tokio::test(start_paused = true)]
async fn test_sweep_keeps_only_long_lived_entry() {
    let clock = MockClock::new();
    let cache = Arc::new(LruCache::with_clock("sweep", 10, 1, Arc::new(clock.clone())).unwrap());

    cache.insert(CacheElement::new("short1", "a".to_string()));
    cache.insert(CacheElement::new("short2", "b".to_string()));
    cache.insert(CacheElement::new("short3", "c".to_string()));
    clock.advance(chrono::Duration::seconds(50));
    cache.insert(CacheElement::new("long", "d".to_string()));
    clock.advance(chrono::Duration::seconds(20));

    let daemon = CleanupDaemon::spawn(cache.clone(), Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(61)).await;

    let values = cache.values();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].id(), &key("long"));

    daemon.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_daemon_over_trait_object() {
    let clock = MockClock::new();
    let cache: Arc<dyn Cache<Value = String>> =
        Arc::new(LruCache::with_clock("dyn", 10, 1, Arc::new(clock.clone())).unwrap());

    cache.insert(CacheElement::new("k", "v".to_string()));
    clock.advance_minutes(2);

    let daemon = CleanupDaemon::spawn(Arc::clone(&cache), Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert!(cache.values().is_empty());
    daemon.shutdown().await;
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_with_running_daemon() {
    let cache = Arc::new(LruCache::<usize>::new("busy", 64, 1).unwrap());
    let daemon = CleanupDaemon::spawn(cache.clone(), Duration::from_millis(5));

    let tasks: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            tokio::spawn(async move {
                for i in 0..500 {
                    let k = CacheKey::new(format!("{}", (t * 31 + i) % 100));
                    cache.insert(CacheElement::new(k.clone(), i));
                    if let Some(found) = cache.get(&k) {
                        assert_eq!(found.id(), &k);
                    }
                    if i % 7 == 0 {
                        cache.remove(&k);
                    }
                    assert!(cache.len() <= 64);
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert!(cache.len() <= 64);
    daemon.shutdown().await;
}
