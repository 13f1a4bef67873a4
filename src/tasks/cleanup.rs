//! Periodic Clean-Cache Trigger
//!
//! Background task that sends the clean-cache signal to the worker at a fixed
//! interval, the way a registered page would post it once a day.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::worker::ServiceWorker;

/// Spawns a background task that periodically runs the cache janitor.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. The first sweep happens one interval after start.
///
/// # Arguments
/// * `worker` - Shared worker whose caches are swept
/// * `clean_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let worker = Arc::new(ServiceWorker::from_config(&config));
/// let clean_handle = spawn_cleanup_task(worker.clone(), 86_400);
/// // Later, during shutdown:
/// clean_handle.abort();
/// ```
pub fn spawn_cleanup_task(worker: Arc<ServiceWorker>, clean_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(clean_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache cleanup trigger with interval of {} seconds",
            clean_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = worker.clean_cache().await;

            if report.evicted > 0 {
                info!("Scheduled cleanup: evicted {} stale entries", report.evicted);
            } else {
                debug!("Scheduled cleanup: nothing to evict");
            }
        }
    })
}
