//! SyncLru: thread-safe LRU cache

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::lru::{LruCore, PutOutcome};
use crate::stats::CacheStats;

/// Fixed-capacity LRU cache shared between threads
///
/// Every operation takes one mutex for its whole duration, so the history
/// of gets and puts on a cache is linearizable. `get` reorders entries, so
/// there is no separate read lock.
pub struct LruCache<K, V> {
    /// Index and recency list
    inner: Mutex<LruCore<K, V>>,

    /// Cache statistics
    stats: CacheStats,

    /// Cache capacity
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new cache holding at most `capacity` entries
    ///
    /// # Panics
    /// If `capacity` is 0. Use [`LruCache::try_new`] when the capacity comes
    /// from runtime input.
    pub fn new(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => Self::with_capacity(capacity),
            None => panic!("capacity must be greater than 0"),
        }
    }

    /// Create a new cache, rejecting a zero capacity
    ///
    /// # Returns
    /// * `Result<LruCache>` - `Error::InvalidCapacity` if `capacity` is 0
    pub fn try_new(capacity: usize) -> Result<Self> {
        NonZeroUsize::new(capacity)
            .map(Self::with_capacity)
            .ok_or(Error::InvalidCapacity(capacity))
    }

    /// Create a new cache with a capacity that is non-zero by type
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        debug!(capacity = capacity.get(), "creating LRU cache");

        Self {
            inner: Mutex::new(LruCore::new(capacity)),
            stats: CacheStats::new(),
            capacity: capacity.get(),
        }
    }

    /// Get a clone of the value for `key` and mark it as most recently used
    ///
    /// # Returns
    /// * `Option<V>` - `None` on a miss; a miss does not change the cache
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Apply `f` to the value for `key` under the lock
    ///
    /// Counts as an access like [`LruCache::get`], without requiring `V: Clone`.
    /// `f` runs while the cache is locked and must not call back into it.
    pub fn get_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        let mut inner = self.inner.lock();
        let result = inner.get(key).map(f);

        match result {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        result
    }

    /// Get a clone of the value for `key` without changing recency order
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    /// Check whether `key` is cached without changing recency order
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().contains(key)
    }

    /// Insert or update `key`, evicting the least recently used entry if full
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        let outcome = inner.put(key, value);

        // Counters move with the entries they describe, under the same guard
        match outcome {
            PutOutcome::Updated(_) => self.stats.record_update(),
            PutOutcome::Inserted => self.stats.record_insert(),
            PutOutcome::Evicted(..) => {
                self.stats.record_insert();
                self.stats.record_eviction();
                trace!(capacity = self.capacity, "evicted least recently used entry");
            }
        }
        drop(inner);

        // Replaced and evicted values drop here, outside the lock
        drop(outcome);
    }

    /// Remove `key`, returning its value
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().remove(key)
    }

    /// Get current number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry and reset statistics
    pub fn clear(&self) {
        let dropped = {
            let mut inner = self.inner.lock();
            let dropped = inner.len();
            inner.clear();
            self.stats.reset();
            dropped
        };
        debug!(dropped, "cleared LRU cache");
    }

    /// Snapshot of the keys from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().iter().map(|(key, _)| key.clone()).collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Lock the cache and panic if its index and recency list disagree
    pub fn debug_validate_invariants(&self) {
        self.inner.lock().debug_validate_invariants();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_cache_basic() {
        let cache = LruCache::new(10);

        cache.put("k", "test data".to_string());

        assert_eq!(cache.get("k").as_deref(), Some("test data"));
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 0);
        assert_eq!(cache.stats().inserts(), 1);
    }

    #[test]
    fn test_cache_miss_is_not_error() {
        let cache: LruCache<u64, u64> = LruCache::new(2);

        assert_eq!(cache.get(&7), None);
        assert_eq!(cache.stats().misses(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_value_is_a_hit() {
        let cache = LruCache::new(2);

        cache.put(1u32, 0u32);

        assert_eq!(cache.get(&1), Some(0));
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_new_zero_capacity_panics() {
        let _cache: LruCache<u32, u32> = LruCache::new(0);
    }

    #[test]
    fn test_try_new_rejects_zero() {
        let result: Result<LruCache<u32, u32>> = LruCache::try_new(0);
        assert_eq!(result.err(), Some(Error::InvalidCapacity(0)));

        let cache: LruCache<u32, u32> = LruCache::try_new(3).unwrap();
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_recency_and_eviction() {
        let cache = LruCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        assert_eq!(cache.keys(), vec!["c", "b", "a"]);

        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.keys(), vec!["b", "c", "a"]);

        cache.put("d", 4);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.keys(), vec!["d", "b", "c"]);
        assert_eq!(cache.stats().evictions(), 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_eviction_from_fresh_order() {
        let cache = LruCache::new(3);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache.put("d", 4);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.keys(), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_update_in_place() {
        let cache = LruCache::new(2);

        cache.put("k", 1);
        cache.put("k", 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.stats().inserts(), 1);
        assert_eq!(cache.stats().updates(), 1);
        assert_eq!(cache.stats().evictions(), 0);
    }

    #[test]
    fn test_repeated_head_get() {
        let cache = LruCache::new(3);

        cache.put(1, 'a');
        cache.put(2, 'b');
        cache.put(3, 'c');

        for _ in 0..5 {
            cache.get(&3);
            assert_eq!(cache.keys(), vec![3, 2, 1]);
        }
    }

    #[test]
    fn test_peek_and_contains() {
        let cache = LruCache::new(2);

        cache.put(1, "a");
        cache.put(2, "b");

        assert_eq!(cache.peek(&1), Some("a"));
        assert!(cache.contains(&1));
        assert!(!cache.contains(&3));
        assert_eq!(cache.keys(), vec![2, 1]);
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_get_with_non_clone_value() {
        struct Blob(Vec<u8>);

        let cache = LruCache::new(2);
        cache.put(1, Blob(vec![1, 2, 3]));

        assert_eq!(cache.get_with(&1, |blob| blob.0.len()), Some(3));
        assert_eq!(cache.get_with(&2, |blob| blob.0.len()), None);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_cache_remove() {
        let cache = LruCache::new(10);

        cache.put(1, "data");

        assert_eq!(cache.remove(&1), Some("data"));
        assert_eq!(cache.remove(&1), None);
        assert_eq!(cache.get(&1), None);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_cache_clear() {
        let cache = LruCache::new(10);

        cache.put(0, "data 0");
        cache.put(1, "data 1");
        cache.get(&0);
        assert_eq!(cache.len(), 2);

        cache.clear();

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().hits(), 0);
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn test_clear_restarts_counters_with_entries() {
        let cache = LruCache::new(2);

        cache.put(1, 'a');
        cache.put(2, 'b');
        cache.put(3, 'c');
        assert_eq!(cache.stats().evictions(), 1);

        cache.clear();
        cache.put(4, 'd');

        let stats = cache.stats();
        assert_eq!(stats.inserts(), 1);
        assert_eq!(stats.evictions(), 0);
        assert_eq!(stats.inserts() - stats.evictions(), cache.len() as u64);
    }

    #[test]
    fn test_cache_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LruCache<String, Vec<u8>>>();
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(LruCache::new(64));

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..16 {
                        cache.put(t * 100 + i, i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        assert_eq!(cache.stats().inserts(), 64);
        assert_eq!(cache.stats().evictions(), 0);
        cache.debug_validate_invariants();
    }
}
