//! Cache Entry Module
//!
//! Defines the capability a cached value must provide and the arena node
//! that links an entry into the recency sequence.

// == Value Capability ==
/// A value that can be held by the cache.
///
/// The only requirement is a byte weight used for budget accounting.
pub trait Value {
    /// Returns how many bytes this value counts against the budget.
    fn size(&self) -> usize;
}

impl Value for String {
    fn size(&self) -> usize {
        self.len()
    }
}

impl Value for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }
}

// == Link Sentinel ==
/// Marks the absence of a neighbour in the recency sequence.
pub(crate) const NIL: usize = usize::MAX;

// == Cache Entry ==
/// A single resident entry, addressed by its arena slot.
#[derive(Debug)]
pub(crate) struct Entry<V> {
    pub key: String,
    pub value: V,
    /// Slot of the more recently used neighbour
    pub prev: usize,
    /// Slot of the less recently used neighbour
    pub next: usize,
}

impl<V: Value> Entry<V> {
    /// Creates an unlinked entry.
    pub fn new(key: String, value: V) -> Self {
        Self {
            key,
            value,
            prev: NIL,
            next: NIL,
        }
    }

    /// Bytes this entry counts against the budget: key length plus value size.
    pub fn charge(&self) -> usize {
        self.key.len() + self.value.size()
    }
}
