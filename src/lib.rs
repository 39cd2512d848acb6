//! Mini LRU - A bounded in-process LRU cache
//!
//! Provides a byte-budgeted least-recently-used store and a thread-safe,
//! lazily initialized cache façade over it.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{ByteView, CacheStore, LruStore, Value};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::run_workload;
