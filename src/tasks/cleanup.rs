//! TTL Cleanup Daemon
//!
//! Background task that periodically sweeps expired entries out of one cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::Cache;

/// Wake-up signal shared between a daemon and its handle.
#[derive(Debug, Default)]
struct DaemonSignal {
    stop: AtomicBool,
    notify: Notify,
}

// == Cleanup Daemon ==
/// Handle to the sweeper task bound to a single cache.
///
/// The task waits for the configured interval, then calls
/// [`Cache::remove_all_expired`], forever. It holds no cache lock while
/// waiting. An [`interrupt`](Self::interrupt) cuts the current wait short; it
/// is logged and the cycle carries on. Only [`stop`](Self::stop) or
/// [`shutdown`](Self::shutdown) ends the loop.
///
/// Dropping the handle does not stop the task; it then runs until process exit.
#[derive(Debug)]
pub struct CleanupDaemon {
    cache_name: String,
    interval: Duration,
    signal: Arc<DaemonSignal>,
    handle: JoinHandle<()>,
}

impl CleanupDaemon {
    // == Spawn ==
    /// Spawns the sweeper for `cache` on the current tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn<C>(cache: Arc<C>, interval: Duration) -> Self
    where
        C: Cache + ?Sized + 'static,
    {
        Self::spawn_on(&Handle::current(), cache, interval)
    }

    /// Spawns the sweeper for `cache` on the runtime behind `runtime`.
    pub fn spawn_on<C>(runtime: &Handle, cache: Arc<C>, interval: Duration) -> Self
    where
        C: Cache + ?Sized + 'static,
    {
        let cache_name = cache.name().to_string();
        let signal = Arc::new(DaemonSignal::default());
        let handle = runtime.spawn(run(cache, interval, Arc::clone(&signal)));

        Self {
            cache_name,
            interval,
            signal,
            handle,
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // == Interrupt ==
    /// Cuts the current wait short. The daemon logs it and keeps running.
    pub fn interrupt(&self) {
        self.signal.notify.notify_waiters();
    }

    // == Stop ==
    /// Asks the daemon to exit at its next wake-up (immediately if waiting).
    pub fn stop(&self) {
        self.signal.stop.store(true, Ordering::Release);
        self.signal.notify.notify_waiters();
    }

    /// Stops the daemon and waits for the task to finish.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.handle.await {
            warn!(cache = %self.cache_name, "Cleanup daemon ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run<C>(cache: Arc<C>, interval: Duration, signal: Arc<DaemonSignal>)
where
    C: Cache + ?Sized,
{
    info!(
        cache = %cache.name(),
        "Starting TTL cleanup daemon with interval of {:?}",
        interval
    );

    loop {
        let notified = signal.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent stop is not lost
        notified.as_mut().enable();

        if signal.stop.load(Ordering::Acquire) {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut notified => {
                if signal.stop.load(Ordering::Acquire) {
                    break;
                }
                warn!(cache = %cache.name(), "Cleanup wait interrupted, continuing");
            }
        }

        let removed = cache.remove_all_expired();
        if removed > 0 {
            info!(cache = %cache.name(), "TTL cleanup: removed {} expired entries", removed);
        } else {
            debug!(cache = %cache.name(), "TTL cleanup: no expired entries found");
        }
    }

    info!(cache = %cache.name(), "TTL cleanup daemon stopped");
}
