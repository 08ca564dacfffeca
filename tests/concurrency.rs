use std::sync::Arc;
use std::thread;
use std::time::Duration;

use policy_cache::{Cache, CacheBuilder, LfuCache, LruCache, TimedCache};

const THREADS: usize = 8;
const OPS: usize = 2_000;

fn hammer<C>(cache: &C, capacity: usize)
where
    C: Cache<usize, usize> + Sync,
{
    thread::scope(|s| {
        for t in 0..THREADS {
            s.spawn(move || {
                for i in 0..OPS {
                    let key = (t * 31 + i) % 64;

                    match i % 4 {
                        0 | 1 => {
                            cache.set(key, key * 2);
                        }
                        2 => {
                            if let Some(value) = cache.get(&key) {
                                assert_eq!(value, key * 2);
                            }
                        }
                        _ => {
                            cache.delete(&key);
                        }
                    }

                    assert!(cache.len() <= capacity);
                }
            });
        }
    });
}

#[test]
fn lru_shared_across_threads() {
    let cache: LruCache<usize, usize> = LruCache::new(16).unwrap();
    hammer(&cache, 16);
}

#[test]
fn lfu_shared_across_threads() {
    let cache: LfuCache<usize, usize> = LfuCache::new(16).unwrap();
    hammer(&cache, 16);
}

#[test]
fn fifo_shared_across_threads() {
    let cache = CacheBuilder::new(16).fifo::<usize, usize>().unwrap();
    hammer(&cache, 16);
}

#[test]
fn timed_shared_across_threads() {
    let cache: TimedCache<usize, usize> = TimedCache::new(16, Duration::from_millis(5)).unwrap();
    hammer(&cache, 16);
}

#[test]
fn get_or_insert_with_runs_init_once_per_key() {
    let cache: Arc<LruCache<usize, usize>> = Arc::new(LruCache::new(128).unwrap());
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();

            thread::spawn(move || {
                for key in 0..64 {
                    let value = cache.get_or_insert_with(key, || {
                        calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        key + 1
                    });
                    assert_eq!(value, key + 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 64);
    assert_eq!(cache.len(), 64);
}
