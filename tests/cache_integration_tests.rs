//! Integration Tests for the Cache Façade
//!
//! Exercises `CacheStore` through the public API, including sharing it
//! across threads.

use std::sync::{Arc, Mutex};
use std::thread;

use mini_lru::{run_workload, ByteView, CacheError, CacheStore, Config, LruStore};

// == Helper Functions ==

type Evictions = Arc<Mutex<Vec<(String, ByteView)>>>;

fn recording_cache(max_bytes: usize) -> (CacheStore, Evictions) {
    let evicted: Evictions = Arc::new(Mutex::new(Vec::new()));
    let sink = evicted.clone();
    let cache = CacheStore::with_eviction_callback(max_bytes, move |key, value| {
        sink.lock().unwrap().push((key.to_string(), value.clone()));
    });
    (cache, evicted)
}

// == Lazy Initialization ==

#[test]
fn test_get_on_fresh_cache_is_not_found() {
    let cache = CacheStore::new(1024);

    match cache.get("x") {
        Err(CacheError::NotFound(key)) => assert_eq!(key, "x"),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(!cache.is_initialized());
}

#[test]
fn test_first_add_initializes() {
    let cache = CacheStore::new(1024);
    cache.add("a", ByteView::from("1"));

    assert!(cache.is_initialized());
    assert_eq!(cache.get("a").unwrap().to_string(), "1");
}

// == Eviction ==

#[test]
fn test_concrete_eviction_scenario() {
    // Budget covers two entries of 2 key bytes + 10 value bytes
    let (cache, evicted) = recording_cache(24);

    cache.add("k1", ByteView::new([b'a'; 10]));
    cache.add("k2", ByteView::new([b'b'; 10]));
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.used_bytes(), 24);
    assert!(evicted.lock().unwrap().is_empty());

    cache.add("k3", ByteView::new([b'c'; 10]));

    assert!(matches!(cache.get("k1"), Err(CacheError::NotFound(_))));
    assert!(cache.get("k2").is_ok());
    assert!(cache.get("k3").is_ok());
    assert_eq!(cache.used_bytes(), 24);

    let evicted = evicted.lock().unwrap();
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].0, "k1");
    assert_eq!(evicted[0].1, ByteView::new([b'a'; 10]));
}

#[test]
fn test_get_refreshes_recency() {
    let cache = CacheStore::new(6);
    cache.add("a", ByteView::from("1"));
    cache.add("b", ByteView::from("2"));
    cache.add("c", ByteView::from("3"));

    cache.get("a").unwrap();
    cache.add("d", ByteView::from("4"));

    assert!(cache.get("a").is_ok());
    assert!(cache.get("b").is_err());
    assert!(cache.get("c").is_ok());
    assert!(cache.get("d").is_ok());
}

#[test]
fn test_oversized_value_is_evicted_and_reported() {
    let (cache, evicted) = recording_cache(8);
    cache.add("small", ByteView::from("x"));

    cache.add("huge", ByteView::new(vec![0u8; 64]));

    assert!(cache.is_empty());
    assert!(cache.is_initialized());
    assert!(cache.get("huge").is_err());
    let keys: Vec<String> = evicted.lock().unwrap().iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec!["small", "huge"]);
}

#[test]
fn test_unbounded_cache_keeps_everything() {
    let (cache, evicted) = recording_cache(0);
    for i in 0..500 {
        cache.add(&format!("key{}", i), ByteView::new(vec![7u8; 256]));
    }

    assert_eq!(cache.len(), 500);
    assert!(evicted.lock().unwrap().is_empty());
    assert_eq!(cache.stats().evictions, 0);
}

// == Concurrency ==

#[test]
fn test_concurrent_writers_and_readers() {
    let cache = Arc::new(CacheStore::new(0));
    let mut handles = Vec::new();

    for t in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let key = format!("t{}-k{}", t, i);
                cache.add(&key, ByteView::from(key.as_str()));
                assert_eq!(cache.get(&key).unwrap().as_slice(), key.as_bytes());
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 800);
    let stats = cache.stats();
    assert_eq!(stats.hits, 800);
    assert_eq!(stats.insertions, 800);
}

#[test]
fn test_concurrent_access_respects_budget() {
    let cache = Arc::new(CacheStore::new(200));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..250 {
                    cache.add(&format!("{}-{}", t, i % 40), ByteView::new([0u8; 10]));
                    let _ = cache.get(&format!("{}-{}", t, (i + 7) % 40));
                    assert!(cache.used_bytes() <= 200);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert!(stats.used_bytes <= 200);
    assert_eq!(stats.total_entries, cache.len());
}

#[test]
fn test_workload_report_matches_cache_stats() {
    let config = Config {
        max_bytes: 4096,
        worker_threads: 4,
        operations_per_worker: 300,
        key_space: 128,
    };
    let cache = CacheStore::from_config(&config);

    let report = run_workload(&cache, &config);

    let stats = cache.stats();
    assert_eq!(report.operations, 1200);
    assert_eq!(report.hits + report.misses, 1200);
    assert_eq!(stats.hits, report.hits);
    assert_eq!(stats.misses, report.misses);
    assert!(stats.used_bytes <= 4096);
}

// == Bare Store ==

#[test]
fn test_bare_store_behind_external_lock() {
    let store: Arc<Mutex<LruStore<String>>> = Arc::new(Mutex::new(LruStore::new(0)));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    store
                        .lock()
                        .unwrap()
                        .add(&format!("{}:{}", t, i), "v".to_string());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = store.lock().unwrap();
    assert_eq!(store.len(), 200);
    let expected: usize = store.iter().map(|(k, v)| k.len() + v.len()).sum();
    assert_eq!(store.used_bytes(), expected);
}
