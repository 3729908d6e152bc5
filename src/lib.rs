//! tallycache: LRU and LFU caches with hit/miss accounting and JSON snapshots.
//!
//! - [`policy::lru::LruCache`] evicts the least recently touched entry.
//! - [`policy::lfu::LfuCache`] evicts the least frequently used entry, oldest
//!   first among equal frequencies, using [`ds::FrequencyMap`].
//! - [`builder`] picks either policy at runtime from code or a JSON config.
//!
//! Both caches can export themselves with `to_json` and absorb an exported
//! snapshot with `merge_json`.
//!
//! ```
//! use tallycache::prelude::*;
//!
//! let mut lru = LruCache::new(2);
//! lru.insert("a", 1);
//! lru.insert("b", 2);
//! lru.get(&"a");
//! lru.insert("c", 3);
//! assert!(!lru.contains(&"b"));
//!
//! let info = lru.info();
//! assert_eq!((info.hits, info.misses, info.size), (1, 0, 2));
//! ```
//!
//! Enable the `concurrency` feature for `parking_lot`-backed
//! `ConcurrentLruCache` and `ConcurrentLfuCache`.

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod snapshot;
pub mod traits;

pub use crate::builder::{Cache, CacheBuilder, CacheConfig, CachePolicy};
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
