//! Cache Module
//!
//! Provides a byte-budgeted LRU store and a thread-safe, lazily initialized
//! façade over it.

mod byteview;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::ByteView;
pub use entry::Value;
pub use lru::{EvictionCallback, Iter, LruStore};
pub use stats::CacheStats;
pub use store::CacheStore;
