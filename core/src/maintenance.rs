//! The background task that keeps cache cleanup roughly on schedule.

use std::time::Duration;

use procontext_cache::Cache;

/// How often the task wakes up to check whether cleanup is due. Must be
/// smaller than any reasonable `cleanup_interval_hours` so the self-throttle
/// in `Cache::cleanup_if_due` is the real gate, not this tick.
const POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Spawns the maintenance loop. Runs until the process exits; the returned
/// handle is held by the transport so it can be aborted on shutdown.
pub fn spawn(cache: Cache, cleanup_interval_hours: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            ticker.tick().await;
            cache.cleanup_if_due(cleanup_interval_hours).await;
        }
    })
}
