//! # synclru
//!
//! Thread-safe, fixed-capacity LRU cache.
//!
//! ## Architecture
//! - **Index**: AHash map from key to arena slot (O(1))
//! - **Recency list**: arena-backed doubly-linked list, MRU at head (O(1))
//! - **Locking**: one `parking_lot::Mutex` per cache around both
//!
//! ## Example
//!
//! ```
//! use synclru::LruCache;
//!
//! let cache = LruCache::new(2);
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get("a");
//! cache.put("c", 3); // evicts "b"
//!
//! assert_eq!(cache.get("b"), None);
//! assert_eq!(cache.keys(), vec!["c", "a"]);
//! ```

#![warn(missing_docs)]

mod cache;
mod error;
mod list;
mod lru;
mod stats;

pub use cache::LruCache;
pub use error::{Error, Result};
pub use lru::{LruCore, PutOutcome};
pub use stats::CacheStats;
