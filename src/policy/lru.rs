use std::{fmt::Debug, hash::Hash};

use hashbrown::HashMap;

use super::{
    linked_arena::{LinkedArena, Links},
    prealloc, Policy,
};
use crate::ConfigError;

/// A least-recently-used policy.
///
/// Both reads and writes move an entry to the most recent end of the list,
/// overflow evicts from the least recent end.
pub struct Lru<K, V> {
    capacity: usize,
    idx_of: HashMap<K, usize>,
    arena: LinkedArena<LruNode<K, V>>,
    /// head is the least recently used entry, tail the most recent
    recency: Links,
}

struct LruNode<K, V> {
    key: K,
    value: V,
}

impl<K, V> Lru<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Lru {
            capacity,
            idx_of: HashMap::with_capacity(prealloc(capacity)),
            arena: LinkedArena::with_capacity(prealloc(capacity)),
            recency: Links::default(),
        })
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.arena.iter(&self.recency).map(|n| &n.key)
    }

    #[inline]
    fn evict(&mut self) {
        // called before every insert of a new key, so there is only ever one item to evict
        if let Some(node) = self.arena.pop_front(&mut self.recency) {
            self.idx_of.remove(&node.key);
            tracing::trace!(capacity = self.capacity, "lru evicted least recent entry");
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        self.arena.check_list(&self.recency)?;

        if self.idx_of.len() != self.recency.len || self.arena.len() != self.recency.len {
            return Err(format!(
                "index has {}, arena has {}, list has {}",
                self.idx_of.len(),
                self.arena.len(),
                self.recency.len
            ));
        }

        for (key, idx) in self.idx_of.iter() {
            match self.arena.get(*idx) {
                Some(node) if node.key == *key => {}
                _ => return Err(format!("index entry {idx} points at the wrong node")),
            }
        }

        if self.recency.len > self.capacity {
            return Err("over capacity".into());
        }

        Ok(())
    }
}

impl<K, V> Policy<K, V> for Lru<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.idx_of.get(key)?;
        self.arena.move_to_back(&mut self.recency, idx);

        self.arena.get(idx).map(|n| &n.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.idx_of.get(key)?;
        self.arena.get(idx).map(|n| &n.value)
    }

    fn set(&mut self, key: K, value: V) -> Option<V> {
        if let Some(idx) = self.idx_of.get(&key).copied() {
            self.arena.move_to_back(&mut self.recency, idx);

            return self
                .arena
                .get_mut(idx)
                .map(|n| std::mem::replace(&mut n.value, value));
        }

        if self.idx_of.len() >= self.capacity {
            self.evict();
        }

        let idx = self.arena.insert(LruNode {
            key: key.clone(),
            value,
        });
        self.arena.push_back(&mut self.recency, idx);
        self.idx_of.insert(key, idx);

        None
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.idx_of.remove(key)?;
        self.arena.unlink(&mut self.recency, idx);

        self.arena.remove(idx).map(|n| n.value)
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
        self.recency = Links::default();
    }
}

impl<K, V> Debug for Lru<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lru")
            .field("capacity", &self.capacity)
            .field("len", &self.arena.len())
            .field("head", &self.recency.head)
            .field("tail", &self.recency.tail)
            .finish()
    }
}
