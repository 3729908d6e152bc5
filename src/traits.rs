//! # Cache Trait Hierarchy
//!
//! Shared operations of the LRU and LFU caches, split by what a caller needs.
//!
//! ```text
//!              ┌───────────────────────────────────┐
//!              │          CoreCache<K, V>          │
//!              │  insert / get / contains / len    │
//!              │  capacity / clear                 │
//!              └─────────────────┬─────────────────┘
//!                                │
//!              ┌─────────────────▼─────────────────┐        ┌──────────────────┐
//!              │       ResizableCache<K, V>        │        │   HitCounters    │
//!              │  set_capacity → evicted count     │        │  hits / misses   │
//!              └────────┬─────────────────┬────────┘        │  hit_ratio       │
//!                       │                 │                 └──────────────────┘
//!         ┌─────────────▼──────┐   ┌──────▼─────────────────────┐
//!         │ LruCacheTrait      │   │ LfuCacheTrait              │
//!         │  peek / peek_lru   │   │  insert_with_frequency     │
//!         └────────────────────┘   │  frequency                 │
//!                                  │  least_frequency           │
//!                                  │  peek_lfu / pop_lfu        │
//!                                  └────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! None of the core caches lock internally. Wrap them in a lock, or enable the
//! `concurrency` feature for the `Concurrent*` wrappers.

/// Core cache operations that both policies support.
///
/// # Example
///
/// ```
/// use tallycache::traits::CoreCache;
/// use tallycache::policy::lru::LruCache;
///
/// fn warm_cache<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, String)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.clone());
///     }
/// }
///
/// let mut cache = LruCache::new(100);
/// warm_cache(&mut cache, &[(1, "one".to_string()), (2, "two".to_string())]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CoreCache<K, V> {
    /// Inserts a key-value pair, returning the previous value if the key existed.
    ///
    /// If the cache is full and the key is new, one entry is evicted first.
    /// With capacity 0 nothing is stored.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Looks up a value, counting a hit or a miss.
    ///
    /// A hit updates the entry's eviction rank (recency or frequency). Use
    /// [`contains`](Self::contains) to test membership without side effects.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Checks whether a key is present without touching eviction state or counters.
    fn contains(&self, key: &K) -> bool;

    /// Returns the current number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the maximum number of entries.
    fn capacity(&self) -> usize;

    /// Removes every entry. Hit and miss counters are kept.
    fn clear(&mut self);
}

/// Caches whose capacity can change after construction.
pub trait ResizableCache<K, V>: CoreCache<K, V> {
    /// Sets a new capacity, evicting by policy until the cache fits.
    ///
    /// Returns the number of entries evicted.
    ///
    /// # Example
    ///
    /// ```
    /// use tallycache::traits::{CoreCache, ResizableCache};
    /// use tallycache::policy::lru::LruCache;
    ///
    /// let mut cache = LruCache::new(4);
    /// for i in 0..4 {
    ///     cache.insert(i, i);
    /// }
    /// assert_eq!(cache.set_capacity(1), 3);
    /// assert_eq!(cache.len(), 1);
    /// ```
    fn set_capacity(&mut self, capacity: usize) -> usize;
}

/// Lifetime hit/miss accounting.
pub trait HitCounters {
    fn hits(&self) -> u64;

    fn misses(&self) -> u64;

    /// Hits over total lookups, `0.0` before the first lookup.
    fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }
}

/// LRU-specific read access.
pub trait LruCacheTrait<K, V>: ResizableCache<K, V> {
    /// Reads a value without changing recency or counters.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Returns the entry that would be evicted next.
    fn peek_lru(&self) -> Option<(&K, &V)>;
}

/// LFU-specific operations.
///
/// # Example
///
/// ```
/// use tallycache::traits::{CoreCache, LfuCacheTrait};
/// use tallycache::policy::lfu::LfuCache;
///
/// let mut cache = LfuCache::new(8);
/// cache.insert_with_frequency("warm", 1, 5);
/// cache.insert("cold", 2);
///
/// assert_eq!(cache.least_frequency(), Some(1));
/// assert_eq!(cache.peek_lfu(), Some((&"cold", &2)));
/// ```
pub trait LfuCacheTrait<K, V>: ResizableCache<K, V> {
    /// Inserts with an explicit starting frequency.
    ///
    /// An existing key keeps its node: the value is replaced and the
    /// frequency is bumped by one, exactly like a read hit.
    fn insert_with_frequency(&mut self, key: K, value: V, frequency: u64) -> &mut Self;

    /// Current frequency of `key`.
    fn frequency(&self, key: &K) -> Option<u64>;

    /// Smallest frequency held by any entry.
    fn least_frequency(&self) -> Option<u64>;

    /// Returns the entry that would be evicted next.
    fn peek_lfu(&self) -> Option<(&K, &V)>;

    /// Removes and returns the entry that would be evicted next.
    fn pop_lfu(&mut self) -> Option<(K, V)>;
}
