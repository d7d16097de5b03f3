//! LRU Cachify demo
//!
//! Wraps a slow asynchronous lookup and shows hits, shared in-flight work and
//! eviction of failed results. Store settings come from the environment.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_cachify::{cachify_with, call, spawn_prune_task, CacheConfig, Call, Outcome};

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Wrap a slow squaring lookup and start the prune task
/// 4. Issue overlapping calls, then a failing one
/// 5. Report store statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to debug for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_cachify=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LRU Cachify demo");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max={}, max_age_ms={:?}, stale={}, length={:?}",
        config.store.max, config.store.max_age_ms, config.store.stale, config.length
    );

    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();
    let square = Arc::new(cachify_with(config, move |call: &Call| {
        counter.fetch_add(1, Ordering::SeqCst);
        let arg = call.arg(0).clone();
        Ok(Outcome::pending(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            match arg.as_u64() {
                Some(n) => Ok(n * n),
                None => Err(format!("cannot square {}", arg)),
            }
        }))
    }));

    let prune_handle = spawn_prune_task(square.clone(), Duration::from_secs(1));

    // Two callers before resolution share one computation
    let first = square.call(call![12])?;
    let second = square.call(call![12])?;
    info!("Second call shares the first computation: {}", first.ptr_eq(&second));

    let (a, b) = tokio::join!(first.resolve(), second.resolve());
    info!(
        "Resolved {} and {} with {} invocation(s)",
        a.map_err(anyhow::Error::msg)?,
        b.map_err(anyhow::Error::msg)?,
        invocations.load(Ordering::SeqCst)
    );

    // A failed pending result does not stay cached
    let failing = square.call(call!["twelve"])?;
    if let Err(err) = failing.resolve().await {
        warn!("Computation failed: {}", err);
    }
    info!("Failed result still cached: {}", square.has(call!["twelve"])?);

    info!("Store stats: {}", serde_json::to_string(&square.stats())?);

    prune_handle.abort();
    info!("Demo complete");
    Ok(())
}
