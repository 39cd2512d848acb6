//! Mini LRU - A bounded in-process LRU cache
//!
//! Drives one shared cache from several threads and reports its statistics.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_lru::{run_workload, CacheStore, Config};

/// Entry point for the workload runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache with the configured budget
/// 4. Run the multi-threaded workload
/// 5. Print workload and cache statistics as JSON
fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_bytes={}, worker_threads={}, operations_per_worker={}, key_space={}",
        config.max_bytes, config.worker_threads, config.operations_per_worker, config.key_space
    );

    let cache = CacheStore::with_eviction_callback(config.max_bytes, |key, value| {
        tracing::trace!("Evicted '{}' ({} bytes)", key, value.len());
    });

    let report = run_workload(&cache, &config);
    let stats = cache.stats();
    info!("Hit rate: {:.2}%", stats.hit_rate() * 100.0);

    let summary = serde_json::json!({
        "workload": report,
        "cache": stats,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
