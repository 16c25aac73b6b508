use std::sync::Arc;
use std::time::Duration;

use crate::store::MemoryCache;

/// Spawn a background task that evicts expired board cache entries.
///
/// Fingerprints for older completion sets are never read again, so they
/// only leave the cache here.
pub fn spawn_cache_purger(cache: Arc<MemoryCache>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let purged = cache.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} expired board cache entries", purged);
            }
        }
    });
}
