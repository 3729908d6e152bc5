//! # LRU (Least Recently Used) Cache
//!
//! Fixed-capacity key/value store that evicts the entry touched longest ago.
//! Both reads ([`get`](LruCache::get)) and writes ([`insert`](LruCache::insert))
//! count as a touch.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          LruCache<K, V>                              │
//!   │                                                                      │
//!   │   index: FxHashMap<K, SlotId>                                        │
//!   │   ┌───────┬────────┐                                                 │
//!   │   │ "a"   │ id_2   │───┐                                             │
//!   │   │ "b"   │ id_0   │───┼──┐                                          │
//!   │   │ "c"   │ id_1   │───┼──┼──┐                                       │
//!   │   └───────┴────────┘   │  │  │                                       │
//!   │                        ▼  │  │                                       │
//!   │   list:  head ─► [a] ◄──► [c] ◄──► [b] ◄── tail                      │
//!   │                  MRU                 LRU (evicted next)              │
//!   │                                                                      │
//!   │   capacity, hits, misses                                             │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries live in an [`IntrusiveList`] addressed by [`SlotId`]; the index
//! maps each key to its list node, so lookup, move-to-front and eviction are
//! all O(1).
//!
//! ## Operations
//!
//! | Operation          | Effect on order      | Counters          |
//! |--------------------|----------------------|-------------------|
//! | `get`              | hit → move to front  | `hits` or `misses`|
//! | `insert`           | new or updated → front, evicts LRU when full | - |
//! | `peek`, `contains` | none                 | none              |
//! | `set_capacity`     | evicts from the back | none              |
//! | `clear`            | empties              | kept              |
//! | `merge_json`       | replays `insert`s    | added             |
//!
//! A capacity of 0 is legal: every insert is dropped and every `get` misses.
//!
//! ## Example
//!
//! ```
//! use tallycache::policy::lru::LruCache;
//!
//! let mut cache = LruCache::new(2);
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.get(&"a");
//! cache.insert("c", 3);
//!
//! assert!(!cache.contains(&"b"));
//! assert!(cache.contains(&"a"));
//! assert!(cache.contains(&"c"));
//! ```

use std::fmt;
use std::hash::Hash;
use std::mem;

#[cfg(feature = "concurrency")]
use std::sync::Arc;

#[cfg(feature = "concurrency")]
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{ConfigError, InvariantError, SnapshotError, validate_capacity};
use crate::snapshot::{self, LruSnapshot};
use crate::traits::{CoreCache, HitCounters, LruCacheTrait, ResizableCache};

/// Read-only view of an LRU cache's counters and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LruInfo {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// Least-recently-used cache with hit/miss accounting.
#[derive(Clone)]
pub struct LruCache<K, V> {
    index: FxHashMap<K, SlotId>,
    list: IntrusiveList<Entry<K, V>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::default(),
            list: IntrusiveList::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Like [`new`](Self::new), but takes a signed capacity and rejects
    /// negative values.
    pub fn try_with_capacity(capacity: i64) -> Result<Self, ConfigError> {
        validate_capacity(capacity).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Membership test. Does not touch recency or counters.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the value for `key` and marks it most recently used.
    ///
    /// Counts a hit when the key is present and a miss otherwise.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&id) = self.index.get(key) else {
            self.misses = self.misses.saturating_add(1);
            return None;
        };
        self.hits = self.hits.saturating_add(1);
        self.list.move_to_front(id);
        self.list.get(id).map(|entry| &entry.value)
    }

    /// Reads a value without changing recency or counters.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| &entry.value)
    }

    /// The entry that would be evicted next.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.back().map(|entry| (&entry.key, &entry.value))
    }

    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// An existing key has its value replaced and the old value returned.
    /// A new key in a full cache first evicts the least recently used entry.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            return self
                .list
                .get_mut(id)
                .map(|entry| mem::replace(&mut entry.value, value));
        }
        if self.capacity == 0 {
            return None;
        }
        if self.list.len() >= self.capacity {
            self.evict_lru();
        }
        let id = self.list.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
        None
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let entry = self.list.pop_back()?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    fn evict_lru(&mut self) -> bool {
        if self.pop_lru().is_none() {
            return false;
        }
        trace!(
            len = self.list.len(),
            capacity = self.capacity,
            "evicted least recently used entry"
        );
        true
    }

    /// Changes the capacity, evicting from the LRU end until the cache fits.
    ///
    /// Returns how many entries were evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        let previous = self.capacity;
        self.capacity = capacity;
        let mut evicted = 0;
        while self.list.len() > capacity && self.evict_lru() {
            evicted += 1;
        }
        if self.list.is_empty() {
            self.list.clear_shrink();
            self.index.shrink_to_fit();
        }
        debug!(previous, capacity, evicted, "resized LRU cache");
        evicted
    }

    /// [`set_capacity`](Self::set_capacity) with a signed capacity.
    ///
    /// A negative value is rejected and the cache is left untouched.
    pub fn try_set_capacity(&mut self, capacity: i64) -> Result<usize, ConfigError> {
        let capacity = validate_capacity(capacity)?;
        Ok(self.set_capacity(capacity))
    }

    /// Drops every entry. Hit and miss counters are kept.
    pub fn clear(&mut self) {
        let dropped = self.list.len();
        self.list.clear();
        self.index.clear();
        debug!(dropped, "cleared LRU cache");
    }

    pub fn info(&self) -> LruInfo {
        LruInfo {
            hits: self.hits,
            misses: self.misses,
            capacity: self.capacity,
            size: self.list.len(),
        }
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.list.iter().map(|entry| &entry.key)
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.list.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Owned snapshot, entries least recently used first.
    pub fn snapshot(&self) -> LruSnapshot<K, V>
    where
        V: Clone,
    {
        LruSnapshot {
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            cache: self
                .list
                .iter_rev()
                .map(|entry| (entry.key.clone(), entry.value.clone()))
                .collect(),
        }
    }

    /// Serializes the cache to JSON.
    ///
    /// `indent == 0` gives compact output. Entries are written least recently
    /// used first, so [`merge_json`](Self::merge_json) on an empty cache of the
    /// same capacity restores the same recency order.
    pub fn to_json(&self, indent: usize) -> Result<String, SnapshotError>
    where
        K: Serialize,
        V: Serialize,
    {
        let view = LruSnapshot {
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            cache: self
                .list
                .iter_rev()
                .map(|entry| (&entry.key, &entry.value))
                .collect(),
        };
        snapshot::to_string_with_indent(&view, indent)
    }

    /// Adds a snapshot's counters to this cache and re-inserts its entries
    /// in order. Re-insertion may evict.
    pub fn merge_snapshot(&mut self, snapshot: LruSnapshot<K, V>) {
        self.hits = self.hits.saturating_add(snapshot.hits);
        self.misses = self.misses.saturating_add(snapshot.misses);
        let entries = snapshot.cache.len();
        for (key, value) in snapshot.cache {
            self.insert(key, value);
        }
        debug!(
            entries,
            hits = snapshot.hits,
            misses = snapshot.misses,
            "merged LRU snapshot"
        );
    }

    /// Decodes `json` and merges it with [`merge_snapshot`](Self::merge_snapshot).
    ///
    /// The cache is not modified if decoding fails.
    pub fn merge_json(&mut self, json: &str) -> Result<(), SnapshotError>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let snapshot: LruSnapshot<K, V> = snapshot::from_json(json)?;
        self.merge_snapshot(snapshot);
        Ok(())
    }

    /// Verifies that the key index and the recency list agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {} entries",
                self.index.len(),
                self.list.len()
            )));
        }
        if self.list.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.list.len(),
                self.capacity
            )));
        }
        for (key, &id) in &self.index {
            match self.list.get(id) {
                Some(entry) if entry.key == *key => {},
                Some(_) => {
                    return Err(InvariantError::new(
                        "index points at a list node for another key",
                    ));
                },
                None => return Err(InvariantError::new("index points at a freed list node")),
            }
        }
        if self.list.iter().count() != self.list.len() {
            return Err(InvariantError::new("recency list is not fully linked"));
        }
        Ok(())
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

impl<K, V> Default for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an LRU cache with a default capacity of 16.
    fn default() -> Self {
        Self::new(16)
    }
}

impl<K, V> Extend<(K, V)> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> CoreCache<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        LruCache::insert(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        LruCache::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LruCache::contains(self, key)
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> usize {
        LruCache::capacity(self)
    }

    fn clear(&mut self) {
        LruCache::clear(self);
    }
}

impl<K, V> ResizableCache<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn set_capacity(&mut self, capacity: usize) -> usize {
        LruCache::set_capacity(self, capacity)
    }
}

impl<K, V> LruCacheTrait<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn peek(&self, key: &K) -> Option<&V> {
        LruCache::peek(self, key)
    }

    fn peek_lru(&self) -> Option<(&K, &V)> {
        LruCache::peek_lru(self)
    }
}

impl<K, V> HitCounters for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn hits(&self) -> u64 {
        self.hits
    }

    fn misses(&self) -> u64 {
        self.misses
    }
}

/// Thread-safe LRU cache behind a `parking_lot::RwLock`.
///
/// `get` updates recency and so takes the write lock; `peek`, `contains` and
/// the read-only accessors share the read lock. Values are returned by clone.
#[cfg(feature = "concurrency")]
#[derive(Clone)]
pub struct ConcurrentLruCache<K, V> {
    inner: Arc<RwLock<LruCache<K, V>>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> fmt::Debug for ConcurrentLruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.read();
        f.debug_struct("ConcurrentLruCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentLruCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// # Example
    ///
    /// ```
    /// use tallycache::policy::lru::ConcurrentLruCache;
    ///
    /// let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(100);
    /// cache.insert(1, "one".to_string());
    /// assert_eq!(cache.get(&1).as_deref(), Some("one"));
    /// assert_eq!(cache.info().hits, 1);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    pub fn try_with_capacity(capacity: i64) -> Result<Self, ConfigError> {
        validate_capacity(capacity).map(Self::new)
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.write().get(key).cloned()
    }

    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.read().peek(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn set_capacity(&self, capacity: usize) -> usize {
        self.inner.write().set_capacity(capacity)
    }

    pub fn try_set_capacity(&self, capacity: i64) -> Result<usize, ConfigError> {
        self.inner.write().try_set_capacity(capacity)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn info(&self) -> LruInfo {
        self.inner.read().info()
    }

    pub fn to_json(&self, indent: usize) -> Result<String, SnapshotError>
    where
        K: Serialize,
        V: Serialize,
    {
        self.inner.read().to_json(indent)
    }

    /// Decodes outside the lock, then applies the snapshot under one write.
    pub fn merge_json(&self, json: &str) -> Result<(), SnapshotError>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let snapshot: LruSnapshot<K, V> = snapshot::from_json(json)?;
        self.inner.write().merge_snapshot(snapshot);
        Ok(())
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.read().check_invariants()
    }
}
