use std::{hash::Hash, marker::PhantomData, time::Duration};

use crate::cache::{FifoCache, LfuCache, LruCache, PolicyCache, TimedCache};
use crate::policy::{Fifo, Lfu, Lru, Timed};
use crate::sync::{Mode, Synchronized, Unsynchronized};
use crate::ConfigError;

/// Configures and builds any of the caches.
///
/// Builders start out [`Synchronized`], call [`CacheBuilder::unsynchronized`] to drop the lock.
///
/// ```
/// use std::time::Duration;
/// use policy_cache::{Cache, CacheBuilder};
///
/// let cache = CacheBuilder::new(128)
///     .ttl(Duration::from_secs(30))
///     .timed::<String, u64>()
///     .unwrap();
///
/// cache.set("answer".to_string(), 42);
/// assert_eq!(cache.get(&"answer".to_string()), Some(42));
/// ```
pub struct CacheBuilder<M = Synchronized> {
    capacity: usize,
    ttl: Option<Duration>,
    _mode: PhantomData<M>,
}

impl CacheBuilder {
    pub fn new(capacity: usize) -> Self {
        CacheBuilder {
            capacity,
            ttl: None,
            _mode: PhantomData,
        }
    }
}

impl<M: Mode> CacheBuilder<M> {
    /// The default time to live, required by [`CacheBuilder::timed`] and ignored by the others.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn unsynchronized(self) -> CacheBuilder<Unsynchronized> {
        self.with_mode()
    }

    pub fn synchronized(self) -> CacheBuilder<Synchronized> {
        self.with_mode()
    }

    pub fn fifo<K: Clone + Eq + Hash, V>(self) -> Result<FifoCache<K, V, M>, ConfigError> {
        Fifo::new(self.capacity).map(PolicyCache::from_policy)
    }

    pub fn lru<K: Clone + Eq + Hash, V>(self) -> Result<LruCache<K, V, M>, ConfigError> {
        Lru::new(self.capacity).map(PolicyCache::from_policy)
    }

    pub fn lfu<K: Clone + Eq + Hash, V>(self) -> Result<LfuCache<K, V, M>, ConfigError> {
        Lfu::new(self.capacity).map(PolicyCache::from_policy)
    }

    pub fn timed<K: Clone + Eq + Hash, V>(self) -> Result<TimedCache<K, V, M>, ConfigError> {
        let ttl = self.ttl.ok_or(ConfigError::MissingTtl)?;

        Timed::new(self.capacity, ttl).map(PolicyCache::from_policy)
    }

    fn with_mode<N: Mode>(self) -> CacheBuilder<N> {
        CacheBuilder {
            capacity: self.capacity,
            ttl: self.ttl,
            _mode: PhantomData,
        }
    }
}
