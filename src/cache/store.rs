//! Cache Store Module
//!
//! Thread-safe façade over a lazily created [`LruStore`] of [`ByteView`]s.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use tracing::info;

use crate::cache::{ByteView, CacheStats, EvictionCallback, LruStore};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Concurrency-safe byte cache.
///
/// Every operation takes the same exclusive lock. The underlying store is
/// only allocated by the first [`add`](CacheStore::add); lookups on a cache
/// that was never written to miss without allocating.
///
/// The eviction callback runs while the lock is held and must not call back
/// into the same `CacheStore`, or it will deadlock.
pub struct CacheStore {
    /// Byte budget handed to the store when it is created
    max_bytes: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Created on first add
    lru: Option<LruStore<ByteView>>,
    /// Moved into the store when it is created
    on_evicted: Option<EvictionCallback<ByteView>>,
    /// Misses served before the store existed
    cold_misses: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a cache with the given byte budget (0 = unbounded).
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Creates a cache whose store will call `on_evicted` for every evicted entry.
    pub fn with_eviction_callback<F>(max_bytes: usize, on_evicted: F) -> Self
    where
        F: FnMut(&str, &ByteView) + Send + 'static,
    {
        Self {
            max_bytes,
            inner: Mutex::new(Inner {
                on_evicted: Some(Box::new(on_evicted)),
                ..Inner::default()
            }),
        }
    }

    /// Creates a cache sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_bytes)
    }

    // == Add ==
    /// Stores a value, creating the underlying store on first use.
    pub fn add(&self, key: &str, value: ByteView) {
        let max_bytes = self.max_bytes;
        let mut guard = self.lock();
        let inner = &mut *guard;
        let lru = inner.lru.get_or_insert_with(|| {
            info!("Initializing LRU store with a budget of {} bytes", max_bytes);
            LruStore::with_eviction_callback(max_bytes, inner.on_evicted.take())
        });
        lru.add(key, value);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns [`CacheError::NotFound`] when the key is absent or when nothing
    /// has been added yet.
    pub fn get(&self, key: &str) -> Result<ByteView> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.lru.as_mut() {
            Some(lru) => lru
                .get(key)
                .cloned()
                .ok_or_else(|| CacheError::NotFound(key.to_string())),
            None => {
                inner.cold_misses += 1;
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.lock().lru.as_ref().map_or(0, LruStore::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the underlying store has been created.
    pub fn is_initialized(&self) -> bool {
        self.lock().lru.is_some()
    }

    pub fn used_bytes(&self) -> usize {
        self.lock().lru.as_ref().map_or(0, LruStore::used_bytes)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    // == Stats ==
    /// Returns current cache statistics, including misses served before the
    /// store existed.
    pub fn stats(&self) -> CacheStats {
        let guard = self.lock();
        let mut stats = match guard.lru.as_ref() {
            Some(lru) => lru.stats(),
            None => {
                let mut stats = CacheStats::new();
                stats.set_occupancy(0, 0, self.max_bytes);
                stats
            }
        };
        stats.misses += guard.cold_misses;
        stats
    }

    /// `LruStore::add` restores the budget before any eviction callback runs,
    /// so a lock poisoned by a panicking callback still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("CacheStore");
        out.field("max_bytes", &self.max_bytes);
        // The lock is held while eviction callbacks run
        match self.inner.try_lock() {
            Ok(inner) => out.field("initialized", &inner.lru.is_some()),
            Err(TryLockError::Poisoned(poisoned)) => {
                out.field("initialized", &poisoned.into_inner().lru.is_some())
            }
            Err(TryLockError::WouldBlock) => out.field("initialized", &format_args!("<locked>")),
        };
        out.finish()
    }
}
