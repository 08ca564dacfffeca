//! Bounded in-memory caches with interchangeable eviction policies.
//!
//! Four policies share one contract:
//! - [`Fifo`](policy::Fifo): evicts in insertion order.
//! - [`Lru`](policy::Lru): evicts the least recently used entry.
//! - [`Lfu`](policy::Lfu): evicts the least frequently used entry, oldest first on ties.
//! - [`Timed`](policy::Timed): expires entries lazily and evicts the earliest deadline.
//!
//! # Quick Start
//! ```
//! use policy_cache::{Cache, LruCache};
//!
//! let cache: LruCache<i32, &str> = LruCache::new(2).unwrap();
//! cache.set(1, "one");
//! cache.set(2, "two");
//! cache.get(&1);
//! cache.set(3, "three");
//!
//! assert_eq!(cache.get(&2), None);
//! assert_eq!(cache.get(&1), Some("one"));
//! ```

/// The shareable cache contract and the [`PolicyCache`] that implements it for every policy.
pub mod cache;
#[doc(inline)]
pub use cache::{Cache, FifoCache, LfuCache, LruCache, PolicyCache, TimedCache};

/// A policy owns the entries of a cache and decides which one to evict.
pub mod policy;
#[doc(inline)]
pub use policy::Policy;

/// How a cache is guarded against concurrent access.
pub mod sync;
#[doc(inline)]
pub use sync::{Mode, Synchronized, Unsynchronized};

pub mod builder;
#[doc(inline)]
pub use builder::CacheBuilder;

mod error;
pub use error::ConfigError;
