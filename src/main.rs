//! Mini Cache - host process
//!
//! Loads configuration, installs the process-wide cache manager, restores any
//! backed-up caches, and keeps the caches' cleanup daemons running until the
//! process is asked to stop.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mini_cache::backup::BACKUP_EXTENSION;
use mini_cache::{CacheError, CacheManager, Config};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the cache host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from the properties file given as first argument,
///    or from environment variables
/// 3. Install the global cache manager
/// 4. Restore backed-up caches when backups are enabled
/// 5. Wait for SIGINT/SIGTERM, then back up and stop all cleanup daemons
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Cache");

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_properties_file(&path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };
    info!(
        "Configuration loaded: max_size={}, ttl={}min, cleanup_interval={}min, backup={}",
        config.max_size, config.time_to_live, config.cleanup_interval, config.backup_enabled
    );

    let manager = CacheManager::init(config)?;

    if manager.config().backup_enabled {
        restore_backups(manager, &manager.config().backup_path);
    }

    shutdown_signal().await;

    manager.shutdown().await?;
    info!("Shutdown complete");
    Ok(())
}

/// Restores every `<name>.json` backup in `dir` as a cache of JSON values.
///
/// The host does not know the value types its callers use, so restored
/// entries are kept as `serde_json::Value`.
fn restore_backups(manager: &CacheManager, dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            info!("No backups restored from {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(BACKUP_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match manager.restore_cache::<serde_json::Value>(name) {
            Ok(cache) => info!(cache = %name, "Restored cache with {} entries", cache.len()),
            Err(CacheError::BackupNotFound(_)) => {}
            Err(e) => warn!(cache = %name, "Failed to restore cache: {}", e),
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
