//! LRU Store Module
//!
//! Byte-budgeted least-recently-used store.
//!
//! Entries live in an arena of slots linked into a doubly-linked recency
//! sequence by index; a `HashMap` maps each key to its slot. Front = most
//! recently used, back = next to be evicted. Lookup, move-to-front and
//! eviction are all O(1).
//!
//! The store is not synchronized. Share it across threads only through
//! [`CacheStore`](crate::cache::CacheStore) or another external lock.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::cache::entry::{Entry, NIL};
use crate::cache::{CacheStats, Value};

/// Hook invoked with the key and value of every evicted entry.
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

// == LRU Store ==
/// Ordered key-value store that evicts the least recently used entry
/// whenever the byte budget is exceeded.
///
/// Every entry is charged `key.len() + value.size()` bytes. A `max_bytes`
/// of 0 disables the budget.
pub struct LruStore<V> {
    /// Byte budget, 0 = unbounded
    max_bytes: usize,
    /// Sum of the charge of every resident entry
    used_bytes: usize,
    /// Entry arena, `None` marks a vacant slot
    slots: Vec<Option<Entry<V>>>,
    /// Vacant slots available for reuse
    free: Vec<usize>,
    /// Key to slot lookup
    index: HashMap<String, usize>,
    /// Most recently used slot
    head: usize,
    /// Least recently used slot
    tail: usize,
    on_evicted: Option<EvictionCallback<V>>,
    stats: CacheStats,
}

impl<V: Value> LruStore<V> {
    // == Constructor ==
    /// Creates an empty store with the given byte budget and no eviction hook.
    pub fn new(max_bytes: usize) -> Self {
        Self::with_eviction_callback(max_bytes, None)
    }

    /// Creates an empty store with the given byte budget and an optional hook
    /// called synchronously for each evicted entry.
    pub fn with_eviction_callback(
        max_bytes: usize,
        on_evicted: Option<EvictionCallback<V>>,
    ) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
            on_evicted,
            stats: CacheStats::new(),
        }
    }

    // == Get ==
    /// Looks up a key, marking it as most recently used on a hit.
    ///
    /// A miss has no effect besides being counted.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        match self.index.get(key).copied() {
            Some(idx) => {
                trace!("LRU hit for key '{}'", key);
                self.stats.record_hit();
                self.move_to_front(idx);
                self.slots[idx].as_ref().map(|entry| &entry.value)
            }
            None => {
                trace!("LRU miss for key '{}'", key);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Looks up a key without touching its recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.index
            .get(key)
            .and_then(|&idx| self.slots[idx].as_ref())
            .map(|entry| &entry.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    // == Add ==
    /// Inserts or replaces a value and marks it as most recently used.
    ///
    /// Replacing re-accounts the size difference between the old and new
    /// value. Afterwards, while over budget, the least recently used entry is
    /// evicted. An entry whose charge alone exceeds the budget is therefore
    /// evicted by the same call that inserted it.
    ///
    /// The eviction hook fires once per evicted entry before this returns,
    /// but only after the budget holds again, so a panicking hook cannot
    /// leave the store over budget.
    pub fn add(&mut self, key: &str, value: V) {
        match self.index.get(key).copied() {
            Some(idx) => {
                if let Some(entry) = self.slots[idx].as_mut() {
                    let new_size = value.size();
                    let old = std::mem::replace(&mut entry.value, value);
                    self.used_bytes = self.used_bytes - old.size() + new_size;
                }
                self.move_to_front(idx);
                self.stats.record_update();
            }
            None => {
                let entry = Entry::new(key.to_owned(), value);
                let charge = entry.charge();
                let idx = self.alloc(entry);
                self.push_front(idx);
                self.index.insert(key.to_owned(), idx);
                self.used_bytes += charge;
                self.stats.record_insertion();
            }
        }

        if let Some(charge) = self.resident_charge(key) {
            if self.max_bytes != 0 && charge > self.max_bytes {
                warn!(
                    "Entry '{}' needs {} bytes but the budget is {} bytes, it will be evicted immediately",
                    key, charge, self.max_bytes
                );
            }
        }

        let mut evicted = Vec::new();
        while self.is_over_budget() && !self.is_empty() {
            match self.evict_oldest() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        for entry in &evicted {
            self.notify_evicted(entry);
        }
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry.
    ///
    /// Fires the eviction hook, if any, before returning the evicted pair.
    /// Returns `None` on an empty store.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let entry = self.evict_oldest()?;
        self.notify_evicted(&entry);
        Some((entry.key, entry.value))
    }

    /// Unlinks the back entry and settles all bookkeeping without calling the hook.
    fn evict_oldest(&mut self) -> Option<Entry<V>> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        self.unlink(idx);
        let entry = self.slots[idx].take()?;
        self.free.push(idx);
        self.index.remove(&entry.key);
        self.used_bytes -= entry.charge();
        self.stats.record_eviction();
        debug!(
            "Evicted key '{}' ({} bytes), {} of {} bytes in use",
            entry.key,
            entry.charge(),
            self.used_bytes,
            self.max_bytes
        );
        Some(entry)
    }

    fn notify_evicted(&mut self, entry: &Entry<V>) {
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&entry.key, &entry.value);
        }
    }

    fn resident_charge(&self, key: &str) -> Option<usize> {
        self.index
            .get(key)
            .and_then(|&idx| self.slots[idx].as_ref())
            .map(Entry::charge)
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently charged against the budget.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// The configured budget, 0 = unbounded.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    // == Stats ==
    /// Returns a snapshot of the counters and current occupancy.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.len(), self.used_bytes, self.max_bytes);
        stats
    }

    // == Iteration ==
    /// Iterates over resident entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: &self.slots,
            current: self.head,
            remaining: self.len(),
        }
    }

    fn is_over_budget(&self) -> bool {
        self.max_bytes != 0 && self.used_bytes > self.max_bytes
    }

    // -- Recency sequence plumbing --

    fn alloc(&mut self, entry: Entry<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = NIL;
            entry.next = old_head;
        }
        match self.slots.get_mut(old_head).and_then(Option::as_mut) {
            Some(head) => head.prev = idx,
            None => self.tail = idx,
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };
        match self.slots.get_mut(prev).and_then(Option::as_mut) {
            Some(entry) => entry.next = next,
            None => self.head = next,
        }
        match self.slots.get_mut(next).and_then(Option::as_mut) {
            Some(entry) => entry.prev = prev,
            None => self.tail = prev,
        }
        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = NIL;
            entry.next = NIL;
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }
}

impl<V> fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .field("has_eviction_callback", &self.on_evicted.is_some())
            .finish()
    }
}

// == Iterator ==
/// Iterator over `(key, value)` pairs, most recently used first.
pub struct Iter<'a, V> {
    slots: &'a [Option<Entry<V>>],
    current: usize,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.get(self.current)?.as_ref()?;
        self.current = entry.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((entry.key.as_str(), &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
