//! Workload Task
//!
//! Runs get-or-add traffic against one shared cache from several threads.

use std::thread;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{ByteView, CacheStore};
use crate::config::Config;

/// Outcome of a workload run, as seen by the workers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadReport {
    /// Lookups issued across all workers
    pub operations: u64,
    pub hits: u64,
    pub misses: u64,
}

impl WorkloadReport {
    fn merge(&mut self, other: &WorkloadReport) {
        self.operations += other.operations;
        self.hits += other.hits;
        self.misses += other.misses;
    }
}

/// Runs the configured workload against `cache` and waits for every worker.
///
/// Each worker looks up keys from a deterministic per-worker sequence and, on
/// a miss, adds a value derived from the key. All workers share the cache by
/// reference.
///
/// # Example
/// ```
/// use mini_lru::{cache::CacheStore, tasks::run_workload, Config};
///
/// let config = Config {
///     worker_threads: 2,
///     operations_per_worker: 50,
///     ..Config::default()
/// };
/// let cache = CacheStore::from_config(&config);
/// let report = run_workload(&cache, &config);
/// assert_eq!(report.operations, 100);
/// ```
pub fn run_workload(cache: &CacheStore, config: &Config) -> WorkloadReport {
    let key_space = config.key_space.max(1);
    info!(
        "Starting workload: {} workers x {} operations over {} keys",
        config.worker_threads, config.operations_per_worker, key_space
    );

    let mut report = WorkloadReport::default();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..config.worker_threads)
            .map(|worker| {
                scope.spawn(move || {
                    run_worker(cache, worker, config.operations_per_worker, key_space)
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(worker_report) => report.merge(&worker_report),
                Err(_) => warn!("Workload worker panicked, its counts are dropped"),
            }
        }
    });

    info!(
        "Workload finished: {} operations, {} hits, {} misses",
        report.operations, report.hits, report.misses
    );
    report
}

fn run_worker(
    cache: &CacheStore,
    worker: usize,
    operations: usize,
    key_space: usize,
) -> WorkloadReport {
    let mut report = WorkloadReport::default();
    for i in 0..operations {
        let key = format!("key-{}", key_for(worker, i, key_space));
        report.operations += 1;
        match cache.get(&key) {
            Ok(_) => report.hits += 1,
            Err(_) => {
                report.misses += 1;
                cache.add(&key, ByteView::from(format!("value-for-{}", key)));
            }
        }
    }
    debug!("Worker {} done: {:?}", worker, report);
    report
}

/// Skewed deterministic key choice: low keys come up more often than high ones.
fn key_for(worker: usize, i: usize, key_space: usize) -> usize {
    let spread = worker.wrapping_mul(7919).wrapping_add(i.wrapping_mul(31));
    (spread % key_space) * (spread % 3 + 1) / 3
}
