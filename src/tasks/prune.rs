//! Prune Task
//!
//! Background task that periodically removes expired entries from a memoized
//! function's store. Expired entries are otherwise only dropped when read.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::memo::Memoized;

/// Spawns a background task that periodically prunes expired entries.
///
/// The task runs until aborted, sleeping for `interval` between runs.
///
/// # Example
/// ```ignore
/// let memo = Arc::new(cachify_with(config, compute));
/// let prune_handle = spawn_prune_task(memo.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// prune_handle.abort();
/// ```
pub fn spawn_prune_task<T, E, K>(memo: Arc<Memoized<T, E, K>>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
    tokio::spawn(async move {
        info!(?interval, "Starting prune task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = memo.prune();
            if removed > 0 {
                info!("Prune: removed {} expired entries", removed);
            } else {
                debug!("Prune: no expired entries found");
            }
        }
    })
}
