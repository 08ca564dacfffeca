use std::{hash::Hash, time::Duration};

use crate::policy::{Fifo, Lfu, Lru, Policy, Timed};
use crate::sync::{Mode, Synchronized, Unsynchronized};
use crate::ConfigError;

/// The operations every cache supports, whatever its eviction policy.
///
/// All methods take `&self`. Values are returned by clone, since a reference could not
/// outlive the guard protecting the policy.
pub trait Cache<K, V> {
    /// Get a value, `None` if the key is absent or expired.
    ///
    /// This is not a pure read: LRU, LFU and timed caches update their bookkeeping.
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or update a value, returning the value it replaced.
    fn set(&self, key: K, value: V) -> Option<V>;

    /// Remove a value, a missing key is a noop.
    fn delete(&self, key: &K) -> Option<V>;

    /// Get a value, or compute and insert it while holding the same guard.
    ///
    /// `init` must not use this cache, a synchronized cache would deadlock and an
    /// unsynchronized one would panic.
    fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> V,
        Self: Sized;

    /// The number of live entries, expired entries are pruned before counting.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a key is present, without counting as an access.
    fn contains(&self, key: &K) -> bool;

    fn capacity(&self) -> usize;

    fn clear(&self);
}

/// A policy behind a guard chosen by [`Mode`], shareable by reference.
///
/// With the default [`Synchronized`] mode, every call takes one exclusive lock.
pub struct PolicyCache<P, M: Mode = Synchronized> {
    inner: M::Cell<P>,
}

pub type FifoCache<K, V, M = Synchronized> = PolicyCache<Fifo<K, V>, M>;
pub type LruCache<K, V, M = Synchronized> = PolicyCache<Lru<K, V>, M>;
pub type LfuCache<K, V, M = Synchronized> = PolicyCache<Lfu<K, V>, M>;
pub type TimedCache<K, V, M = Synchronized> = PolicyCache<Timed<K, V>, M>;

impl<P, M: Mode> PolicyCache<P, M> {
    pub fn from_policy(policy: P) -> Self {
        PolicyCache {
            inner: M::wrap(policy),
        }
    }

    /// Run several operations against the policy while holding the guard once.
    pub fn with_policy<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        M::with(&self.inner, f)
    }

    /// Access the policy directly, no locking needed since we hold `&mut self`.
    pub fn get_mut(&mut self) -> &mut P {
        M::get_mut(&mut self.inner)
    }

    pub fn into_inner(self) -> P {
        M::into_inner(self.inner)
    }
}

impl<K, V, P, M> Cache<K, V> for PolicyCache<P, M>
where
    P: Policy<K, V>,
    V: Clone,
    M: Mode,
{
    fn get(&self, key: &K) -> Option<V> {
        self.with_policy(|p| p.get(key).cloned())
    }

    fn set(&self, key: K, value: V) -> Option<V> {
        self.with_policy(|p| p.set(key, value))
    }

    fn delete(&self, key: &K) -> Option<V> {
        self.with_policy(|p| p.remove(key))
    }

    fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> V,
        Self: Sized,
    {
        self.with_policy(|p| {
            if let Some(value) = p.get(&key) {
                return value.clone();
            }

            let value = init();
            p.set(key, value.clone());

            value
        })
    }

    fn len(&self) -> usize {
        self.with_policy(|p| p.len())
    }

    fn contains(&self, key: &K) -> bool {
        self.with_policy(|p| p.contains(key))
    }

    fn capacity(&self) -> usize {
        self.with_policy(|p| p.capacity())
    }

    fn clear(&self) {
        self.with_policy(|p| p.clear())
    }
}

impl<K: Clone + Eq + Hash, V> FifoCache<K, V> {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Fifo::new(capacity).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V> FifoCache<K, V, Unsynchronized> {
    /// Build a cache without a lock.
    ///
    /// The alias defaults to [`Synchronized`], so a turbofish has to name the mode:
    /// `FifoCache::<K, V, Unsynchronized>::unsynchronized(capacity)`.
    pub fn unsynchronized(capacity: usize) -> Result<Self, ConfigError> {
        Fifo::new(capacity).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Lru::new(capacity).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V> LruCache<K, V, Unsynchronized> {
    /// Build a cache without a lock.
    ///
    /// The alias defaults to [`Synchronized`], so a turbofish has to name the mode:
    /// `LruCache::<K, V, Unsynchronized>::unsynchronized(capacity)`.
    pub fn unsynchronized(capacity: usize) -> Result<Self, ConfigError> {
        Lru::new(capacity).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V> LfuCache<K, V> {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        Lfu::new(capacity).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V> LfuCache<K, V, Unsynchronized> {
    /// Build a cache without a lock.
    ///
    /// The alias defaults to [`Synchronized`], so a turbofish has to name the mode:
    /// `LfuCache::<K, V, Unsynchronized>::unsynchronized(capacity)`.
    pub fn unsynchronized(capacity: usize) -> Result<Self, ConfigError> {
        Lfu::new(capacity).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V> TimedCache<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, ConfigError> {
        Timed::new(capacity, ttl).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V> TimedCache<K, V, Unsynchronized> {
    /// Build a cache without a lock.
    ///
    /// The alias defaults to [`Synchronized`], so a turbofish has to name the mode:
    /// `TimedCache::<K, V, Unsynchronized>::unsynchronized(capacity, ttl)`.
    pub fn unsynchronized(capacity: usize, ttl: Duration) -> Result<Self, ConfigError> {
        Timed::new(capacity, ttl).map(Self::from_policy)
    }
}

impl<K: Clone + Eq + Hash, V, M: Mode> TimedCache<K, V, M> {
    /// Insert or update a value that expires after `ttl` instead of the default.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) -> Option<V> {
        self.with_policy(|p| p.set_with_ttl(key, value, ttl))
    }

    /// The default time to live.
    pub fn ttl(&self) -> Duration {
        self.with_policy(|p| p.ttl())
    }

    /// How long until a key expires.
    pub fn time_to_live(&self, key: &K) -> Option<Duration> {
        self.with_policy(|p| p.time_to_live(key))
    }
}

impl<P: std::fmt::Debug, M: Mode> std::fmt::Debug for PolicyCache<P, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with_policy(|p| f.debug_struct("PolicyCache").field("policy", &*p).finish())
    }
}
