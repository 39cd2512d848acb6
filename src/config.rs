//! Configuration Module
//!
//! Handles loading the cache budget and demo workload shape from environment
//! variables.

use std::env;

/// Cache and workload configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Byte budget of the cache, 0 = unbounded
    pub max_bytes: usize,
    /// Number of threads sharing the cache in the demo workload
    pub worker_threads: usize,
    /// Lookups each worker performs
    pub operations_per_worker: usize,
    /// Number of distinct keys the workload draws from
    pub key_space: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_BYTES` - Cache byte budget (default: 65536)
    /// - `WORKER_THREADS` - Workload threads (default: 4)
    /// - `OPERATIONS_PER_WORKER` - Lookups per thread (default: 1000)
    /// - `KEY_SPACE` - Distinct keys in the workload (default: 512)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_bytes: env_or("CACHE_MAX_BYTES", defaults.max_bytes),
            worker_threads: env_or("WORKER_THREADS", defaults.worker_threads),
            operations_per_worker: env_or(
                "OPERATIONS_PER_WORKER",
                defaults.operations_per_worker,
            ),
            key_space: env_or("KEY_SPACE", defaults.key_space),
        }
    }
}

/// Parses `name` from the environment, falling back to `default` when unset or invalid.
fn env_or(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_bytes: 64 * 1024,
            worker_threads: 4,
            operations_per_worker: 1000,
            key_space: 512,
        }
    }
}
