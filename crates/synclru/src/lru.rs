//! LRU (Least Recently Used) cache core
//!
//! Hash index over an arena recency list, O(1) for get, put and eviction.
//! Not synchronized: [`LruCache`](crate::LruCache) wraps it in a mutex.

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

use ahash::RandomState;

use crate::list::RecencyList;

/// What a [`LruCore::put`] did to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome<K, V> {
    /// Key was present; holds the replaced value
    Updated(V),
    /// Key was new and the cache had room
    Inserted,
    /// Key was new and the least recently used entry was evicted to make room
    Evicted(K, V),
}

/// Unsynchronized LRU cache with fixed capacity
pub struct LruCore<K, V> {
    map: HashMap<K, usize, RandomState>,
    list: RecencyList<K, V>,
    capacity: NonZeroUsize,
}

impl<K, V> LruCore<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity.get(), RandomState::new()),
            list: RecencyList::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Get a value and mark it as most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.list.move_to_head(idx);
        self.list.entry(idx).map(|entry| &entry.value)
    }

    /// Get a value without touching recency order
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.list.entry(idx).map(|entry| &entry.value)
    }

    /// Check for a key without touching recency order
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Insert or update a key-value pair
    ///
    /// An existing key is updated in place and moved to the head. A new key
    /// is linked at the head; if that takes the cache over capacity, the
    /// tail entry is evicted.
    pub fn put(&mut self, key: K, value: V) -> PutOutcome<K, V> {
        // One hashed lookup; the vacant insert below does not hash again, so
        // no user code runs between linking the entry and indexing it.
        match self.map.entry(key) {
            Entry::Occupied(occupied) => {
                let idx = *occupied.get();
                self.list.move_to_head(idx);
                let entry = self
                    .list
                    .entry_mut(idx)
                    .expect("index points at a live slot");
                return PutOutcome::Updated(std::mem::replace(&mut entry.value, value));
            }
            Entry::Vacant(vacant) => {
                let idx = self.list.push_front(vacant.key().clone(), value);
                vacant.insert(idx);
            }
        }

        if self.list.len() > self.capacity.get() {
            if let Some((key, value)) = self.evict_tail() {
                return PutOutcome::Evicted(key, value);
            }
        }

        PutOutcome::Inserted
    }

    /// Remove a key, returning its value
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.list.remove(idx).map(|(_, value)| value)
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    /// Get the fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Drop every entry, keeping the capacity
    pub fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }

    /// Iterate keys and values from most to least recently used
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.list.iter()
    }

    fn evict_tail(&mut self) -> Option<(K, V)> {
        let idx = self.list.tail()?;
        let key = &self.list.entry(idx)?.key;
        // Unindex before unlinking: a panicking hash leaves both structures intact
        self.map.remove(key);
        self.list.remove(idx)
    }

    /// Panic if the index and the recency list disagree or a link is broken.
    pub fn debug_validate_invariants(&self) {
        let order = self.list.validate();

        assert_eq!(
            self.map.len(),
            self.list.len(),
            "index.len({}) != list.len({})",
            self.map.len(),
            self.list.len()
        );
        assert!(
            self.list.len() <= self.capacity.get(),
            "len({}) > capacity({})",
            self.list.len(),
            self.capacity
        );
        assert_eq!(order.first().copied(), self.list.head(), "head mismatch");
        assert_eq!(order.last().copied(), self.list.tail(), "tail mismatch");

        for idx in order {
            let entry = self.list.entry(idx).expect("validated slot is live");
            assert_eq!(
                self.map.get(&entry.key),
                Some(&idx),
                "index does not point at slot {}",
                idx
            );
        }
    }
}
