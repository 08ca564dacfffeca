use std::{
    borrow::Borrow,
    cmp::Reverse,
    fmt::Debug,
    hash::{Hash, Hasher},
    time::{Duration, Instant},
};

use hashbrown::{hash_map::DefaultHashBuilder, HashMap};
use priority_queue::PriorityQueue;

use super::{prealloc, Policy};
use crate::ConfigError;

/// Durations are clamped to this so `Instant + ttl` cannot overflow.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A time-to-live policy.
///
/// Every entry has its own deadline, either `now + ttl` from [`Policy::set`] or a
/// caller supplied duration from [`Timed::set_with_ttl`]. Expired entries are removed
/// lazily: `get`, `set` and `len` first pop every heap record whose deadline has
/// passed. Overflow evicts the entry with the earliest deadline, however far away it is.
///
/// Updating a key pushes a fresh heap record and leaves the old one in place. Records
/// that no longer match the index are dropped when they reach the top of the heap.
pub struct Timed<K, V> {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<K, TimedEntry<V>>,
    expiring: PriorityQueue<Record<K>, Reverse<(Instant, u64)>, DefaultHashBuilder>,
    next_seq: u64,
}

struct TimedEntry<V> {
    value: V,
    expires_at: Instant,
    /// the sequence number of the one heap record that is still live for this entry
    seq: u64,
}

/// A heap record, identified by its sequence number alone so it can be found by `seq`.
struct Record<K> {
    key: K,
    seq: u64,
}

impl<K> PartialEq for Record<K> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<K> Eq for Record<K> {}

impl<K> Hash for Record<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seq.hash(state);
    }
}

impl<K> Borrow<u64> for Record<K> {
    fn borrow(&self) -> &u64 {
        &self.seq
    }
}

impl<K, V> Timed<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        if ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }

        Ok(Timed {
            capacity,
            ttl: ttl.min(MAX_TTL),
            entries: HashMap::with_capacity(prealloc(capacity)),
            expiring: PriorityQueue::with_capacity_and_default_hasher(prealloc(capacity)),
            next_seq: 0,
        })
    }

    /// The default time to live applied by [`Policy::set`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// How long until a key expires, `None` if it is absent or already expired.
    pub fn time_to_live(&self, key: &K) -> Option<Duration> {
        let entry = self.entries.get(key)?;

        match entry.expires_at.checked_duration_since(Instant::now()) {
            Some(left) if !left.is_zero() => Some(left),
            _ => None,
        }
    }

    /// Insert or update a value with its own time to live.
    ///
    /// A zero duration means the entry would be expired on arrival, so nothing is stored and
    /// any existing entry for the key is removed.
    pub fn set_with_ttl(&mut self, key: K, value: V, ttl: Duration) -> Option<V> {
        let now = Instant::now();
        self.prune(now);

        if ttl.is_zero() {
            tracing::debug!("zero ttl, dropping entry instead of storing it");
            return self.remove(&key);
        }

        let expires_at = now + ttl.min(MAX_TTL);
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(entry) = self.entries.get_mut(&key) {
            // the record for the old deadline stays in the heap until it surfaces
            entry.expires_at = expires_at;
            entry.seq = seq;
            let old = std::mem::replace(&mut entry.value, value);

            self.expiring.push(Record { key, seq }, Reverse((expires_at, seq)));
            self.maybe_compact();

            return Some(old);
        }

        while self.entries.len() >= self.capacity {
            if !self.evict() {
                break;
            }
        }

        self.entries.insert(
            key.clone(),
            TimedEntry {
                value,
                expires_at,
                seq,
            },
        );
        self.expiring.push(Record { key, seq }, Reverse((expires_at, seq)));

        None
    }

    /// Drop every entry whose deadline is at or before `now`, along with any stale records
    /// met on the way.
    #[inline]
    fn prune(&mut self, now: Instant) {
        let mut expired = 0usize;
        let mut stale = 0usize;

        while let Some((_, Reverse((expires_at, _)))) = self.expiring.peek() {
            if *expires_at > now {
                break;
            }

            if let Some((record, _)) = self.expiring.pop() {
                if self.is_live(&record) {
                    self.entries.remove(&record.key);
                    expired += 1;
                } else {
                    stale += 1;
                }
            }
        }

        if expired + stale > 0 {
            tracing::trace!(expired, stale, "timed cache pruned expired records");
        }
    }

    /// Evict the entry with the earliest deadline.
    ///
    /// Returns false once the heap is empty.
    fn evict(&mut self) -> bool {
        while let Some((record, _)) = self.expiring.pop() {
            if self.is_live(&record) {
                self.entries.remove(&record.key);
                tracing::trace!(
                    capacity = self.capacity,
                    "timed cache evicted earliest expiring entry"
                );

                return true;
            }
        }

        false
    }

    /// Rebuild the heap from the index once stale records dominate it.
    fn maybe_compact(&mut self) {
        if self.expiring.len() <= self.capacity.saturating_mul(2) {
            return;
        }

        let before = self.expiring.len();

        self.expiring.clear();
        for (key, entry) in self.entries.iter() {
            self.expiring.push(
                Record {
                    key: key.clone(),
                    seq: entry.seq,
                },
                Reverse((entry.expires_at, entry.seq)),
            );
        }

        tracing::trace!(before, after = self.expiring.len(), "timed cache compacted expiry heap");
    }

    fn is_live(&self, record: &Record<K>) -> bool {
        self.entries
            .get(&record.key)
            .is_some_and(|entry| entry.seq == record.seq)
    }

    /// Total records in the expiry heap, live and stale.
    #[cfg(test)]
    pub(crate) fn heap_len(&self) -> usize {
        self.expiring.len()
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        for entry in self.entries.values() {
            match self.expiring.get_priority(&entry.seq) {
                Some(Reverse((expires_at, _))) if *expires_at == entry.expires_at => {}
                _ => return Err(format!("no live heap record for seq {}", entry.seq)),
            }
        }

        if self.expiring.len() < self.entries.len() {
            return Err("heap has fewer records than the index has entries".into());
        }

        if self.entries.len() > self.capacity {
            return Err("over capacity".into());
        }

        Ok(())
    }
}

impl<K, V> Policy<K, V> for Timed<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        self.prune(Instant::now());

        self.entries.get(key).map(|e| &e.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let now = Instant::now();

        self.entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| &e.value)
    }

    fn set(&mut self, key: K, value: V) -> Option<V> {
        self.set_with_ttl(key, value, self.ttl)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.expiring.remove(&entry.seq);

        Some(entry.value)
    }

    fn len(&mut self) -> usize {
        self.prune(Instant::now());

        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.expiring.clear();
    }
}

impl<K, V> Debug for Timed<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timed")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.entries.len())
            .field("heap_len", &self.expiring.len())
            .finish()
    }
}
