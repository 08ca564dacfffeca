use std::{fmt::Debug, hash::Hash};

use hashbrown::HashMap;

use super::{
    linked_arena::{LinkedArena, Links},
    prealloc, Policy,
};
use crate::ConfigError;

/// A first-in-first-out policy.
///
/// Entries leave in the order they were first inserted. Neither reads nor updates
/// change that order.
pub struct Fifo<K, V> {
    capacity: usize,
    idx_of: HashMap<K, usize>,
    arena: LinkedArena<(K, V)>,
    queue: Links,
}

impl<K, V> Fifo<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Fifo {
            capacity,
            idx_of: HashMap::with_capacity(prealloc(capacity)),
            arena: LinkedArena::with_capacity(prealloc(capacity)),
            queue: Links::default(),
        })
    }

    /// Keys from oldest to newest, the first key is the next to be evicted.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.arena.iter(&self.queue).map(|(k, _)| k)
    }

    fn evict(&mut self) {
        if let Some((key, _)) = self.arena.pop_front(&mut self.queue) {
            self.idx_of.remove(&key);
            tracing::trace!(capacity = self.capacity, "fifo evicted oldest entry");
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        self.arena.check_list(&self.queue)?;

        if self.idx_of.len() != self.queue.len || self.arena.len() != self.queue.len {
            return Err(format!(
                "index has {}, arena has {}, queue has {}",
                self.idx_of.len(),
                self.arena.len(),
                self.queue.len
            ));
        }

        if self.queue.len > self.capacity {
            return Err("over capacity".into());
        }

        Ok(())
    }
}

impl<K, V> Policy<K, V> for Fifo<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        self.peek(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.idx_of.get(key)?;
        self.arena.get(idx).map(|(_, v)| v)
    }

    fn set(&mut self, key: K, value: V) -> Option<V> {
        if let Some(idx) = self.idx_of.get(&key).copied() {
            return self
                .arena
                .get_mut(idx)
                .map(|(_, v)| std::mem::replace(v, value));
        }

        if self.idx_of.len() >= self.capacity {
            self.evict();
        }

        let idx = self.arena.insert((key.clone(), value));
        self.arena.push_back(&mut self.queue, idx);
        self.idx_of.insert(key, idx);

        None
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.idx_of.remove(key)?;
        self.arena.unlink(&mut self.queue, idx);

        self.arena.remove(idx).map(|(_, v)| v)
    }

    fn len(&mut self) -> usize {
        self.idx_of.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.idx_of.clear();
        self.arena.clear();
        self.queue = Links::default();
    }
}

impl<K, V> Debug for Fifo<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fifo")
            .field("capacity", &self.capacity)
            .field("len", &self.arena.len())
            .field("head", &self.queue.head)
            .field("tail", &self.queue.tail)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fifo(capacity: usize) -> Fifo<i32, i32> {
        Fifo::new(capacity).unwrap()
    }

    fn insert_n(fifo: &mut Fifo<i32, i32>, range: std::ops::RangeInclusive<i32>) {
        for i in range {
            fifo.set(i, i * 10);
        }
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(Fifo::<i32, i32>::new(0).unwrap_err(), ConfigError::ZeroCapacity);
    }

    #[test]
    /// capacity 2, insert 1, 2, 3 and key 1 is gone
    fn test_evicts_oldest() {
        let mut fifo = fifo(2);
        insert_n(&mut fifo, 1..=3);

        assert_eq!(fifo.get(&1), None);
        assert_eq!(fifo.get(&2), Some(&20));
        assert_eq!(fifo.get(&3), Some(&30));
        assert_eq!(fifo.len(), 2);
        fifo.check_invariants().unwrap();
    }

    #[test]
    fn test_evicts_in_insertion_order() {
        let mut fifo = fifo(3);
        insert_n(&mut fifo, 1..=3);

        for next in 4..=8 {
            fifo.set(next, next);
            assert_eq!(fifo.keys().copied().collect::<Vec<_>>(), vec![next - 2, next - 1, next]);
        }

        fifo.check_invariants().unwrap();
    }

    #[test]
    /// Reading the oldest key should not save it from eviction
    fn test_get_does_not_reorder() {
        let mut fifo = fifo(2);
        insert_n(&mut fifo, 1..=2);

        assert_eq!(fifo.get(&1), Some(&10));
        fifo.set(3, 30);

        assert!(!fifo.contains(&1));
        assert!(fifo.contains(&2));
    }

    #[test]
    /// Updating keeps the original queue position
    fn test_update_in_place() {
        let mut fifo = fifo(2);
        insert_n(&mut fifo, 1..=2);

        assert_eq!(fifo.set(1, 11), Some(10));
        assert_eq!(fifo.len(), 2);
        assert_eq!(fifo.get(&1), Some(&11));

        fifo.set(3, 30);
        assert!(!fifo.contains(&1));
        assert_eq!(fifo.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_remove_frees_a_slot() {
        let mut fifo = fifo(3);
        insert_n(&mut fifo, 1..=3);

        assert_eq!(fifo.remove(&2), Some(20));
        assert_eq!(fifo.remove(&2), None);

        fifo.set(4, 40);
        assert_eq!(fifo.len(), 3);
        assert_eq!(fifo.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4]);

        fifo.set(5, 50);
        assert_eq!(fifo.keys().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        fifo.check_invariants().unwrap();
    }

    #[test]
    fn test_clear() {
        let mut fifo = fifo(3);
        insert_n(&mut fifo, 1..=3);

        fifo.clear();

        assert_eq!(fifo.len(), 0);
        for i in 1..=3 {
            assert_eq!(fifo.get(&i), None);
        }

        insert_n(&mut fifo, 4..=7);
        assert_eq!(fifo.keys().copied().collect::<Vec<_>>(), vec![5, 6, 7]);
        fifo.check_invariants().unwrap();
    }
}
