//! Cache Maintenance Task
//!
//! Re-runs `init` on an interval so expired entries are swept even when
//! nobody reads them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::storage::Storage;

/// Spawns a task that sleeps for `interval`, then sweeps the cache, forever.
///
/// Abort the returned handle to stop it.
pub fn spawn_maintenance_task<S>(cache: Arc<CacheManager<S>>, interval: Duration) -> JoinHandle<()>
where
    S: Storage + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting cache maintenance task with interval of {:?}",
            interval
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = cache.init();
            if report.swept > 0 || report.version_reset {
                info!(
                    "Cache maintenance: swept {} entries, cleared {} on version reset",
                    report.swept, report.cleared
                );
            } else {
                debug!("Cache maintenance: nothing to remove");
            }
        }
    })
}
