use std::{fmt::Debug, hash::Hash};

use hashbrown::HashMap;

use super::{
    linked_arena::{LinkedArena, Links},
    prealloc, Policy,
};
use crate::ConfigError;

/// A least-frequently-used policy.
///
/// Every entry carries an access count starting at 1. Entries sharing a count live in
/// one bucket list, ordered by when they reached that count, so overflow evicts the
/// oldest entry of the lowest populated count.
pub struct Lfu<K, V> {
    capacity: usize,
    idx_of: HashMap<K, usize>,
    arena: LinkedArena<LfuNode<K, V>>,
    buckets: HashMap<u64, Links>,
    /// The lowest frequency with a non-empty bucket, 0 when empty.
    ///
    /// A remove can leave this below the real minimum. It is exact again by the time the
    /// policy is full, since refilling a freed slot inserts a new entry at frequency 1.
    min_freq: u64,
}

struct LfuNode<K, V> {
    key: K,
    value: V,
    freq: u64,
}

impl<K, V> Lfu<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Lfu {
            capacity,
            idx_of: HashMap::with_capacity(prealloc(capacity)),
            arena: LinkedArena::with_capacity(prealloc(capacity)),
            buckets: HashMap::new(),
            min_freq: 0,
        })
    }

    /// The access count of a key, without counting this call as an access.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        let idx = *self.idx_of.get(key)?;
        self.arena.get(idx).map(|n| n.freq)
    }

    /// Move the node at idx from its bucket to the bucket for its next frequency.
    fn touch(&mut self, idx: usize) {
        let Some(node) = self.arena.get_mut(idx) else {
            return;
        };

        let old_freq = node.freq;
        node.freq += 1;

        self.detach(idx, old_freq);

        if old_freq == self.min_freq && !self.buckets.contains_key(&old_freq) {
            // the node we just moved is now in old_freq + 1
            self.min_freq = old_freq + 1;
        }

        let bucket = self.buckets.entry(old_freq + 1).or_default();
        self.arena.push_back(bucket, idx);
    }

    /// Unlink idx from the bucket for freq, dropping the bucket if it empties.
    fn detach(&mut self, idx: usize, freq: u64) {
        let emptied = match self.buckets.get_mut(&freq) {
            Some(bucket) => {
                self.arena.unlink(bucket, idx);
                bucket.is_empty()
            }
            None => {
                debug_assert!(false, "node {idx} has no bucket for frequency {freq}");
                false
            }
        };

        if emptied {
            self.buckets.remove(&freq);
        }
    }

    fn evict(&mut self) {
        if !self.buckets.contains_key(&self.min_freq) {
            // only reachable if the minimum went stale without a refill
            self.min_freq = self.buckets.keys().copied().min().unwrap_or(0);
        }

        let Some(bucket) = self.buckets.get_mut(&self.min_freq) else {
            return;
        };

        let Some(node) = self.arena.pop_front(bucket) else {
            return;
        };

        if bucket.is_empty() {
            self.buckets.remove(&self.min_freq);
        }

        self.idx_of.remove(&node.key);
        tracing::trace!(freq = node.freq, "lfu evicted least frequent entry");
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let mut total = 0;

        for (freq, bucket) in self.buckets.iter() {
            self.arena.check_list(bucket)?;

            if bucket.is_empty() {
                return Err(format!("empty bucket for frequency {freq} was kept"));
            }

            if let Some(node) = self.arena.iter(bucket).find(|n| n.freq != *freq) {
                return Err(format!("node with frequency {} in bucket {freq}", node.freq));
            }

            total += bucket.len;
        }

        if total != self.idx_of.len() || self.arena.len() != self.idx_of.len() {
            return Err(format!(
                "buckets hold {total}, arena holds {}, index holds {}",
                self.arena.len(),
                self.idx_of.len()
            ));
        }

        let expected_min = self.buckets.keys().copied().min().unwrap_or(0);
        if self.min_freq > expected_min {
            return Err(format!(
                "min_freq is {}, above the minimum {expected_min}",
                self.min_freq
            ));
        }

        if self.idx_of.len() == self.capacity && self.min_freq != expected_min {
            return Err(format!("full with min_freq {}, expected {expected_min}", self.min_freq));
        }

        if self.idx_of.len() > self.capacity {
            return Err("over capacity".into());
        }

        Ok(())
    }
}

impl<K, V> Policy<K, V> for Lfu<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.idx_of.get(key)?;
        self.touch(idx);

        self.arena.get(idx).map(|n| &n.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.idx_of.get(key)?;
        self.arena.get(idx).map(|n| &n.value)
    }

    fn set(&mut self, key: K, value: V) -> Option<V> {
        if let Some(idx) = self.idx_of.get(&key).copied() {
            self.touch(idx);

            return self
                .arena
                .get_mut(idx)
                .map(|n| std::mem::replace(&mut n.value, value));
        }

        if self.idx_of.len() >= self.capacity {
            self.evict();
        }

        let idx = self.arena.insert(LfuNode {
            key: key.clone(),
            value,
            freq: 1,
        });

        let bucket = self.buckets.entry(1).or_default();
        self.arena.push_back(bucket, idx);
        self.idx_of.insert(key, idx);
        self.min_freq = 1;

        None
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.idx_of.remove(key)?;
        let freq = self.arena.get(idx)?.freq;

        self.detach(idx, freq);

        if self.idx_of.is_empty() {
            self.min_freq = 0;
        }

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
        self.buckets.clear();
        self.min_freq = 0;
    }
}

impl<K, V> Debug for Lfu<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lfu")
            .field("capacity", &self.capacity)
            .field("len", &self.idx_of.len())
            .field("buckets", &self.buckets.len())
            .field("min_freq", &self.min_freq)
            .finish()
    }
}
