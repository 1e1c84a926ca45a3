//! Recency list
//!
//! Doubly-linked list stored in an arena of slots. Links are slot indices,
//! so the list owns every entry and handles held elsewhere are plain `usize`.
//! Head is the most recently used entry, tail the least recently used.

/// Node in the recency list
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed doubly-linked list ordered by recency
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn head(&self) -> Option<usize> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<usize> {
        self.tail
    }

    pub(crate) fn entry(&self, idx: usize) -> Option<&Entry<K, V>> {
        self.slots.get(idx)?.as_ref()
    }

    pub(crate) fn entry_mut(&mut self, idx: usize) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(idx)?.as_mut()
    }

    /// Allocate a slot for a new entry and link it at the head.
    ///
    /// Returns the slot index, which stays valid until the entry is removed.
    pub(crate) fn push_front(&mut self, key: K, value: V) -> usize {
        let entry = Entry {
            key,
            value,
            prev: None,
            next: None,
        };

        let idx = match self.free_list.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };

        self.insert_at_head(idx);
        self.len += 1;
        idx
    }

    /// Mark an entry as most recently used.
    pub(crate) fn move_to_head(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);
        self.insert_at_head(idx);
    }

    /// Unlink and free the entry at `idx`, handing back its key and value.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<(K, V)> {
        self.entry(idx)?;
        self.unlink(idx);

        let entry = self.slots[idx].take()?;
        self.free_list.push(idx);
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate entries from head (MRU) to tail (LRU).
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len,
        }
    }

    fn insert_at_head(&mut self, idx: usize) {
        let old_head = self.head;

        if let Some(entry) = &mut self.slots[idx] {
            entry.prev = None;
            entry.next = old_head;
        }

        match old_head {
            Some(head_idx) => {
                if let Some(head) = &mut self.slots[head_idx] {
                    head.prev = Some(idx);
                }
            }
            None => {
                self.tail = Some(idx);
            }
        }

        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.slots[idx] {
            Some(entry) => (entry.prev, entry.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_entry) = &mut self.slots[prev_idx] {
                    prev_entry.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_entry) = &mut self.slots[next_idx] {
                    next_entry.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }

        if let Some(entry) = &mut self.slots[idx] {
            entry.prev = None;
            entry.next = None;
        }
    }

    /// Check link symmetry, reachability and slot accounting.
    ///
    /// Returns the slot indices in head-to-tail order.
    pub(crate) fn validate(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len);
        let mut prev = None;
        let mut cursor = self.head;

        while let Some(idx) = cursor {
            assert!(
                order.len() < self.len,
                "walked past len({}) from head: cycle or stale link",
                self.len
            );
            let entry = self.entry(idx).expect("link points at a free slot");
            assert_eq!(entry.prev, prev, "prev link of slot {} is not symmetric", idx);
            order.push(idx);
            prev = Some(idx);
            cursor = entry.next;
        }

        assert_eq!(order.len(), self.len, "forward walk length != len");
        assert_eq!(self.tail, prev, "forward walk did not end at tail");

        let mut backward = 0;
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            backward += 1;
            assert!(backward <= self.len, "walked past len from tail");
            cursor = self.entry(idx).and_then(|entry| entry.prev);
        }
        assert_eq!(backward, self.len, "backward walk length != len");

        assert_eq!(
            self.free_list.len() + self.len,
            self.slots.len(),
            "free({}) + live({}) != slots({})",
            self.free_list.len(),
            self.len,
            self.slots.len()
        );

        order
    }
}

/// Head-to-tail iterator over the recency list
pub(crate) struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let list = self.list;
        let entry = list.entry(self.next?)?;
        self.next = entry.next;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
