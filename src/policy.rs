mod linked_arena;

pub mod fifo;
pub mod lfu;
pub mod lru;
pub mod timed;

pub use fifo::Fifo;
pub use lfu::Lfu;
pub use lru::Lru;
pub use timed::Timed;

/// Most policies only reserve up front what they are likely to need,
/// a capacity of a few million should not allocate a few million slots.
pub(crate) const MAX_PREALLOC: usize = 1 << 12;

pub(crate) fn prealloc(capacity: usize) -> usize {
    capacity.min(MAX_PREALLOC)
}

/// An eviction policy and the entries it owns.
///
/// Every method takes `&mut self` where the policy may need to update its bookkeeping,
/// which includes [`Policy::get`] for every policy except FIFO. Wrap a policy in a
/// [`crate::PolicyCache`] to share it by reference.
pub trait Policy<K, V> {
    /// Look up a value, applying the policy's touch semantics.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Look up a value without touching recency, frequency or expiry bookkeeping.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Insert or update a value, returning the value it replaced.
    ///
    /// Inserting a new key into a full policy evicts exactly one entry first.
    fn set(&mut self, key: K, value: V) -> Option<V>;

    /// Remove a value, a missing key is a noop.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// The number of live entries.
    fn len(&mut self) -> usize;

    fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    fn capacity(&self) -> usize;

    /// Remove every entry and reset all auxiliary bookkeeping.
    fn clear(&mut self);
}
