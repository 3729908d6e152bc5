//! # LFU (Least Frequently Used) Cache
//!
//! Fixed-capacity key/value store that evicts the entry with the lowest access
//! frequency. Among entries sharing that frequency, the one that reached it
//! first goes first.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                          LfuCache<K, V>                                  │
//!   │                                                                          │
//!   │   index: FxHashMap<K, SlotId>        nodes: SlotArena<CacheNode<K, V>>   │
//!   │   ┌─────────┬────────┐               ┌────────┬──────────────────────┐   │
//!   │   │ page_1  │ id_0   │──────────────►│ id_0   │ page_1, v, freq 15   │   │
//!   │   │ page_2  │ id_1   │──────────────►│ id_1   │ page_2, v, freq 3    │   │
//!   │   │ page_3  │ id_2   │──────────────►│ id_2   │ page_3, v, freq 1    │   │
//!   │   └─────────┴────────┘               └────────┴──────────────────────┘   │
//!   │                                           ▲                              │
//!   │   frequencies: FrequencyMap<SlotId>       │ (handles only)               │
//!   │     1 ─► [id_2]                           │                              │
//!   │     3 ─► [id_1]  ─────────────────────────┘                              │
//!   │    15 ─► [id_0]                                                          │
//!   │                                                                          │
//!   │   capacity, hits, misses                                                 │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The arena is the only owner of [`CacheNode`]s. The key index and the
//! [`FrequencyMap`] both refer to nodes by [`SlotId`], and removal always
//! drops the frequency handle and the index entry before freeing the slot.
//!
//! ## Eviction Flow
//!
//! ```text
//!   insert_with_frequency(key, value, f)
//!        │
//!        ├── key present?  → replace value, frequency += 1, done
//!        ├── capacity 0?   → drop, done
//!        ├── full?         → pop oldest node of the least-frequency bucket
//!        ▼
//!   new CacheNode { key, value, frequency: f } → bucket f (newest)
//! ```
//!
//! `insert` uses a starting frequency of 1. A read hit moves the node up one
//! bucket, where it becomes the newest member.
//!
//! ## Example
//!
//! ```
//! use tallycache::policy::lfu::LfuCache;
//!
//! let mut lfu = LfuCache::new(2);
//! lfu.insert("a", 1);
//! lfu.insert("b", 2);
//! lfu.get(&"a");
//! lfu.insert("c", 3);
//!
//! assert!(!lfu.contains(&"b"));
//! assert_eq!(lfu.frequency(&"a"), Some(2));
//! assert_eq!(lfu.frequency(&"c"), Some(1));
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

use crate::ds::frequency_map::FrequencyMap;
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::{ConfigError, InvariantError, SnapshotError, validate_capacity};
use crate::snapshot::{self, LfuEntry, LfuSnapshot};
use crate::traits::{CoreCache, HitCounters, LfuCacheTrait, ResizableCache};

/// Read-only view of an LFU cache's counters and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LfuInfo {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub current_size: usize,
    /// `None` when the cache is empty.
    pub least_frequency: Option<u64>,
}

/// One cached record: key, value and current access frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNode<K, V> {
    pub key: K,
    pub value: V,
    pub frequency: u64,
}

impl<K, V> CacheNode<K, V> {
    pub fn new(key: K, value: V, frequency: u64) -> Self {
        Self {
            key,
            value,
            frequency,
        }
    }
}

/// Least-frequently-used cache with FIFO tie-breaking and hit/miss accounting.
#[derive(Clone)]
pub struct LfuCache<K, V> {
    nodes: SlotArena<CacheNode<K, V>>,
    index: FxHashMap<K, SlotId>,
    frequencies: FrequencyMap<SlotId>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<K, V> LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: SlotArena::new(),
            index: FxHashMap::default(),
            frequencies: FrequencyMap::new(),
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
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
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

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the value for `key`, bumping its frequency by one.
    ///
    /// Counts a hit when the key is present and a miss otherwise.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(&id) = self.index.get(key) else {
            self.misses = self.misses.saturating_add(1);
            return None;
        };
        self.hits = self.hits.saturating_add(1);
        self.bump(id);
        self.nodes.get(id).map(|node| &node.value)
    }

    /// Reads a value without touching frequency or counters.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.node(key).map(|node| &node.value)
    }

    /// The full record for `key`.
    pub fn node(&self, key: &K) -> Option<&CacheNode<K, V>> {
        let id = *self.index.get(key)?;
        self.nodes.get(id)
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.node(key).map(|node| node.frequency)
    }

    /// Smallest frequency held by any entry, `None` when empty.
    pub fn least_frequency(&self) -> Option<u64> {
        self.frequencies.least_frequency()
    }

    /// Inserts with starting frequency 1. See
    /// [`insert_with_frequency`](Self::insert_with_frequency).
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_entry(key, value, 1)
    }

    /// Inserts `key` at `frequency`, or updates it if already present.
    ///
    /// An existing key has its value replaced and its frequency bumped by one;
    /// `frequency` is ignored in that case. A new key in a full cache first
    /// evicts the least frequently used entry. Returns `self` for chaining.
    pub fn insert_with_frequency(&mut self, key: K, value: V, frequency: u64) -> &mut Self {
        self.insert_entry(key, value, frequency);
        self
    }

    fn insert_entry(&mut self, key: K, value: V, frequency: u64) -> Option<V> {
        if let Some(&id) = self.index.get(&key) {
            self.bump(id);
            return self
                .nodes
                .get_mut(id)
                .map(|node| mem::replace(&mut node.value, value));
        }
        if self.capacity == 0 {
            return None;
        }
        if self.nodes.len() >= self.capacity {
            self.evict_lfu();
        }
        let id = self
            .nodes
            .insert(CacheNode::new(key.clone(), value, frequency));
        self.index.insert(key, id);
        self.frequencies.insert(id, frequency);
        None
    }

    fn bump(&mut self, id: SlotId) {
        if let Some(frequency) = self.frequencies.refresh(&id)
            && let Some(node) = self.nodes.get_mut(id)
        {
            node.frequency = frequency;
        }
    }

    /// The entry that would be evicted next.
    pub fn peek_lfu(&self) -> Option<(&K, &V)> {
        let (&id, _) = self.frequencies.peek_least()?;
        self.nodes.get(id).map(|node| (&node.key, &node.value))
    }

    /// Removes and returns the entry that would be evicted next.
    pub fn pop_lfu(&mut self) -> Option<(K, V)> {
        self.pop_node().map(|node| (node.key, node.value))
    }

    fn pop_node(&mut self) -> Option<CacheNode<K, V>> {
        let (id, _) = self.frequencies.pop_least()?;
        let node = self.nodes.remove(id)?;
        self.index.remove(&node.key);
        Some(node)
    }

    fn evict_lfu(&mut self) -> bool {
        let Some(node) = self.pop_node() else {
            return false;
        };
        trace!(
            frequency = node.frequency,
            len = self.nodes.len(),
            capacity = self.capacity,
            "evicted least frequently used entry"
        );
        true
    }

    /// Changes the capacity, evicting least frequently used entries until the
    /// cache fits. An emptied cache also releases its frequency index.
    ///
    /// Returns how many entries were evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        let previous = self.capacity;
        self.capacity = capacity;
        let mut evicted = 0;
        while self.nodes.len() > capacity && self.evict_lfu() {
            evicted += 1;
        }
        if self.nodes.is_empty() {
            self.frequencies.clear_shrink();
            self.nodes.clear();
            self.nodes.shrink_to_fit();
            self.index.shrink_to_fit();
        }
        debug!(previous, capacity, evicted, "resized LFU cache");
        evicted
    }

    /// [`set_capacity`](Self::set_capacity) with a signed capacity.
    pub fn try_set_capacity(&mut self, capacity: i64) -> Result<usize, ConfigError> {
        let capacity = validate_capacity(capacity)?;
        Ok(self.set_capacity(capacity))
    }

    /// Drops every entry and the frequency index. Counters are kept.
    pub fn clear(&mut self) {
        let dropped = self.nodes.len();
        self.nodes.clear();
        self.index.clear();
        self.frequencies.clear();
        debug!(dropped, "cleared LFU cache");
    }

    pub fn info(&self) -> LfuInfo {
        LfuInfo {
            hits: self.hits,
            misses: self.misses,
            capacity: self.capacity,
            current_size: self.nodes.len(),
            least_frequency: self.frequencies.least_frequency(),
        }
    }

    /// Nodes in eviction order: ascending frequency, oldest in each bucket
    /// first.
    pub fn iter(&self) -> impl Iterator<Item = &CacheNode<K, V>> + '_ {
        self.frequencies
            .frequencies()
            .flat_map(move |frequency| self.frequencies.iter_bucket(frequency))
            .filter_map(move |id| self.nodes.get(*id))
    }

    /// Keys grouped by frequency, ascending, oldest in each bucket first.
    pub fn buckets(&self) -> Vec<(u64, Vec<&K>)> {
        self.frequencies
            .frequencies()
            .map(|frequency| {
                let keys = self
                    .frequencies
                    .iter_bucket(frequency)
                    .filter_map(|id| self.nodes.get(*id))
                    .map(|node| &node.key)
                    .collect();
                (frequency, keys)
            })
            .collect()
    }

    /// Owned snapshot in eviction order.
    pub fn snapshot(&self) -> LfuSnapshot<K, V>
    where
        V: Clone,
    {
        LfuSnapshot {
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            cache: self
                .iter()
                .map(|node| {
                    let entry = LfuEntry {
                        value: node.value.clone(),
                        frequency: node.frequency,
                    };
                    (node.key.clone(), entry)
                })
                .collect(),
            frequencies: self
                .buckets()
                .into_iter()
                .map(|(frequency, keys)| (frequency, keys.into_iter().cloned().collect()))
                .collect(),
        }
    }

    /// Serializes the cache to JSON, entries in eviction order.
    ///
    /// `indent == 0` gives compact output. Besides each entry's value and
    /// frequency, the output carries a `frequencies` object mapping each
    /// frequency to its keys; [`merge_json`](Self::merge_json) ignores it.
    pub fn to_json(&self, indent: usize) -> Result<String, SnapshotError>
    where
        K: Serialize,
        V: Serialize,
    {
        let view = LfuSnapshot {
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            cache: self
                .iter()
                .map(|node| {
                    let entry = LfuEntry {
                        value: &node.value,
                        frequency: node.frequency,
                    };
                    (&node.key, entry)
                })
                .collect(),
            frequencies: self.buckets(),
        };
        snapshot::to_string_with_indent(&view, indent)
    }

    /// Adds a snapshot's counters to this cache and re-inserts its entries in
    /// order, each at its recorded frequency. Re-insertion may evict.
    pub fn merge_snapshot(&mut self, snapshot: LfuSnapshot<K, V>) {
        self.hits = self.hits.saturating_add(snapshot.hits);
        self.misses = self.misses.saturating_add(snapshot.misses);
        let entries = snapshot.cache.len();
        for (key, entry) in snapshot.cache {
            self.insert_entry(key, entry.value, entry.frequency);
        }
        debug!(
            entries,
            hits = snapshot.hits,
            misses = snapshot.misses,
            "merged LFU snapshot"
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
        let snapshot: LfuSnapshot<K, V> = snapshot::from_json(json)?;
        self.merge_snapshot(snapshot);
        Ok(())
    }

    /// Verifies that the key index, the node arena and the frequency index
    /// describe the same set of entries.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let len = self.nodes.len();
        if self.index.len() != len || self.frequencies.len() != len {
            return Err(InvariantError::new(format!(
                "index holds {} keys, arena {} nodes, frequency map {} handles",
                self.index.len(),
                len,
                self.frequencies.len()
            )));
        }
        if len > self.capacity {
            return Err(InvariantError::new(format!(
                "{len} entries exceed capacity {}",
                self.capacity
            )));
        }
        for (id, node) in self.nodes.iter() {
            if self.index.get(&node.key) != Some(&id) {
                return Err(InvariantError::new("node is not reachable from the key index"));
            }
            match self.frequencies.frequency(&id) {
                Some(frequency) if frequency == node.frequency => {},
                Some(frequency) => {
                    return Err(InvariantError::new(format!(
                        "node frequency {} but bucket {frequency}",
                        node.frequency
                    )));
                },
                None => return Err(InvariantError::new("node missing from frequency index")),
            }
        }
        let least = self.iter().map(|node| node.frequency).min();
        if least != self.frequencies.least_frequency() {
            return Err(InvariantError::new(format!(
                "least frequency is {:?}, expected {least:?}",
                self.frequencies.least_frequency()
            )));
        }
        Ok(())
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("least_frequency", &self.least_frequency())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish_non_exhaustive()
    }
}

impl<K, V> Default for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates an LFU cache with a default capacity of 16.
    fn default() -> Self {
        Self::new(16)
    }
}

impl<K, V> Extend<(K, V)> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> CoreCache<K, V> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        LfuCache::insert(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        LfuCache::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LfuCache::contains(self, key)
    }

    fn len(&self) -> usize {
        LfuCache::len(self)
    }

    fn capacity(&self) -> usize {
        LfuCache::capacity(self)
    }

    fn clear(&mut self) {
        LfuCache::clear(self);
    }
}

impl<K, V> ResizableCache<K, V> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn set_capacity(&mut self, capacity: usize) -> usize {
        LfuCache::set_capacity(self, capacity)
    }
}

impl<K, V> LfuCacheTrait<K, V> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert_with_frequency(&mut self, key: K, value: V, frequency: u64) -> &mut Self {
        LfuCache::insert_with_frequency(self, key, value, frequency)
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        LfuCache::frequency(self, key)
    }

    fn least_frequency(&self) -> Option<u64> {
        LfuCache::least_frequency(self)
    }

    fn peek_lfu(&self) -> Option<(&K, &V)> {
        LfuCache::peek_lfu(self)
    }

    fn pop_lfu(&mut self) -> Option<(K, V)> {
        LfuCache::pop_lfu(self)
    }
}

impl<K, V> HitCounters for LfuCache<K, V>
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

/// Thread-safe LFU cache behind a `parking_lot::RwLock`.
///
/// Every read bumps a frequency, so `get` takes the write lock. Values are
/// returned by clone.
#[cfg(feature = "concurrency")]
#[derive(Clone)]
pub struct ConcurrentLfuCache<K, V> {
    inner: Arc<RwLock<LfuCache<K, V>>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> fmt::Debug for ConcurrentLfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.read();
        f.debug_struct("ConcurrentLfuCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentLfuCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(LfuCache::new(capacity))),
        }
    }

    pub fn try_with_capacity(capacity: i64) -> Result<Self, ConfigError> {
        validate_capacity(capacity).map(Self::new)
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    pub fn insert_with_frequency(&self, key: K, value: V, frequency: u64) {
        self.inner
            .write()
            .insert_with_frequency(key, value, frequency);
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

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.read().frequency(key)
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

    pub fn info(&self) -> LfuInfo {
        self.inner.read().info()
    }

    pub fn to_json(&self, indent: usize) -> Result<String, SnapshotError>
    where
        K: Serialize,
        V: Serialize,
    {
        self.inner.read().to_json(indent)
    }

    pub fn merge_json(&self, json: &str) -> Result<(), SnapshotError>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let snapshot: LfuSnapshot<K, V> = snapshot::from_json(json)?;
        self.inner.write().merge_snapshot(snapshot);
        Ok(())
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.read().check_invariants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod correctness {
        use super::*;

        mod basic_behavior {
            use super::*;

            #[test]
            fn insert_starts_at_frequency_one() {
                let mut cache = LfuCache::new(4);
                cache.insert("a", 1);
                assert_eq!(cache.frequency(&"a"), Some(1));
                assert_eq!(cache.least_frequency(), Some(1));
                assert_eq!(
                    cache.node(&"a"),
                    Some(&CacheNode::new("a", 1, 1))
                );
            }

            #[test]
            fn get_bumps_frequency() {
                let mut cache = LfuCache::new(4);
                cache.insert("a", 1);
                assert_eq!(cache.get(&"a"), Some(&1));
                assert_eq!(cache.get(&"a"), Some(&1));
                assert_eq!(cache.frequency(&"a"), Some(3));
                assert_eq!(cache.least_frequency(), Some(3));
                cache.check_invariants().unwrap();
            }

            #[test]
            fn update_replaces_value_and_bumps() {
                let mut cache = LfuCache::new(4);
                assert_eq!(cache.insert("a", 1), None);
                assert_eq!(cache.insert("a", 2), Some(1));
                assert_eq!(cache.peek(&"a"), Some(&2));
                assert_eq!(cache.frequency(&"a"), Some(2));
                assert_eq!(cache.len(), 1);
            }

            #[test]
            fn insert_with_frequency_on_existing_key_ignores_frequency() {
                let mut cache = LfuCache::new(4);
                cache.insert_with_frequency("a", 1, 5);
                cache.insert_with_frequency("a", 2, 100);
                assert_eq!(cache.frequency(&"a"), Some(6));
                assert_eq!(cache.peek(&"a"), Some(&2));
            }

            #[test]
            fn insert_with_frequency_chains() {
                let mut cache = LfuCache::new(4);
                cache
                    .insert_with_frequency("a", 1, 3)
                    .insert_with_frequency("b", 2, 0)
                    .insert_with_frequency("c", 3, 7);
                assert_eq!(cache.len(), 3);
                assert_eq!(cache.least_frequency(), Some(0));
                assert_eq!(cache.peek_lfu(), Some((&"b", &2)));
                cache.check_invariants().unwrap();
            }

            #[test]
            fn peek_does_not_bump() {
                let mut cache = LfuCache::new(2);
                cache.insert("a", 1);
                assert_eq!(cache.peek(&"a"), Some(&1));
                assert!(cache.contains(&"a"));
                assert_eq!(cache.frequency(&"a"), Some(1));
                assert_eq!(cache.hits(), 0);
            }

            #[test]
            fn try_with_capacity_validates() {
                assert!(LfuCache::<String, i32>::try_with_capacity(-1).is_err());
                assert_eq!(
                    LfuCache::<String, i32>::try_with_capacity(3)
                        .unwrap()
                        .capacity(),
                    3
                );
            }
        }

        mod eviction {
            use super::*;

            #[test]
            fn evicts_untouched_entry() {
                let mut lfu = LfuCache::new(2);
                lfu.insert("a", 1);
                lfu.insert("b", 2);
                lfu.get(&"a");
                lfu.insert("c", 3);

                assert!(!lfu.contains(&"b"));
                assert_eq!(lfu.frequency(&"a"), Some(2));
                assert_eq!(lfu.frequency(&"c"), Some(1));
                lfu.check_invariants().unwrap();
            }

            #[test]
            fn ties_evict_first_inserted() {
                let mut lfu = LfuCache::new(3);
                lfu.insert(1, "one");
                lfu.insert(2, "two");
                lfu.insert(3, "three");
                lfu.insert(4, "four");
                assert!(!lfu.contains(&1));

                lfu.insert(5, "five");
                assert!(!lfu.contains(&2));
                assert!(lfu.contains(&3));
            }

            #[test]
            fn bumped_entry_joins_back_of_new_bucket() {
                let mut lfu = LfuCache::new(3);
                lfu.insert_with_frequency("x", 0, 2);
                lfu.insert("a", 1);
                lfu.insert("b", 2);
                lfu.get(&"a");

                // bucket 2 is now [x, a]; b is alone in bucket 1.
                assert_eq!(lfu.pop_lfu(), Some(("b", 2)));
                assert_eq!(lfu.pop_lfu(), Some(("x", 0)));
                assert_eq!(lfu.pop_lfu(), Some(("a", 1)));
                assert_eq!(lfu.pop_lfu(), None);
            }

            #[test]
            fn least_frequency_is_numeric_minimum() {
                let mut lfu = LfuCache::new(4);
                lfu.insert_with_frequency("hot", 1, 10);
                lfu.insert_with_frequency("warm", 2, 5);
                lfu.insert_with_frequency("cool", 3, 7);
                assert_eq!(lfu.least_frequency(), Some(5));

                lfu.insert("cold", 4);
                assert_eq!(lfu.least_frequency(), Some(1));
                lfu.pop_lfu();
                assert_eq!(lfu.least_frequency(), Some(5));
                lfu.check_invariants().unwrap();
            }

            #[test]
            fn iter_runs_in_eviction_order() {
                let mut lfu = LfuCache::new(4);
                lfu.insert("a", 1);
                lfu.insert("b", 2);
                lfu.insert("c", 3);
                lfu.get(&"b");
                lfu.get(&"b");
                lfu.get(&"a");

                let keys: Vec<_> = lfu.iter().map(|node| node.key).collect();
                assert_eq!(keys, vec!["c", "a", "b"]);
                assert_eq!(
                    lfu.buckets(),
                    vec![(1, vec![&"c"]), (2, vec![&"a"]), (3, vec![&"b"])]
                );
            }
        }

        mod zero_capacity {
            use super::*;

            #[test]
            fn every_insert_is_dropped() {
                let mut lfu = LfuCache::new(0);
                lfu.insert("a", 1);
                lfu.insert_with_frequency("b", 2, 9);
                assert!(lfu.is_empty());
                assert_eq!(lfu.get(&"a"), None);
                assert_eq!(lfu.misses(), 1);
                assert_eq!(lfu.least_frequency(), None);
                lfu.check_invariants().unwrap();
            }
        }
    }

    mod counters {
        use super::*;

        #[test]
        fn info_reports_counts_and_least_frequency() {
            let mut lfu = LfuCache::new(3);
            lfu.insert("a", 1);
            lfu.insert("b", 2);
            lfu.get(&"a");
            lfu.get(&"z");

            assert_eq!(
                lfu.info(),
                LfuInfo {
                    hits: 1,
                    misses: 1,
                    capacity: 3,
                    current_size: 2,
                    least_frequency: Some(1),
                }
            );
        }

        #[test]
        fn info_serializes_camel_case() {
            let lfu: LfuCache<&str, i32> = LfuCache::new(1);
            let json = serde_json::to_string(&lfu.info()).unwrap();
            assert_eq!(
                json,
                r#"{"hits":0,"misses":0,"capacity":1,"currentSize":0,"leastFrequency":null}"#
            );
        }

        #[test]
        fn counters_saturate_after_merging_a_full_snapshot() {
            let mut lfu: LfuCache<String, i32> = LfuCache::new(2);
            lfu.merge_json(r#"{"hits":18446744073709551615,"misses":18446744073709551615,"cache":{"a":{"value":1}}}"#)
                .unwrap();

            let (a, b) = ("a".to_string(), "b".to_string());
            assert_eq!(lfu.get(&a), Some(&1));
            assert_eq!(lfu.get(&b), None);
            assert_eq!(lfu.hits(), u64::MAX);
            assert_eq!(lfu.misses(), u64::MAX);
            assert_eq!(lfu.frequency(&a), Some(2));
        }

        #[test]
        fn clear_keeps_counters_and_drops_buckets() {
            let mut lfu = LfuCache::new(2);
            lfu.insert("a", 1);
            lfu.get(&"a");
            lfu.clear();

            assert!(lfu.is_empty());
            assert_eq!(lfu.least_frequency(), None);
            assert_eq!(lfu.hits(), 1);
            lfu.check_invariants().unwrap();
        }
    }

    mod capacity_changes {
        use super::*;

        #[test]
        fn shrink_evicts_lowest_frequencies() {
            let mut lfu = LfuCache::new(4);
            lfu.extend([("a", 1), ("b", 2), ("c", 3), ("d", 4)]);
            lfu.get(&"c");
            lfu.get(&"d");

            assert_eq!(lfu.set_capacity(2), 2);
            assert!(lfu.contains(&"c"));
            assert!(lfu.contains(&"d"));
            assert_eq!(lfu.len(), 2);
            lfu.check_invariants().unwrap();
        }

        #[test]
        fn shrink_to_zero_clears_frequency_index() {
            let mut lfu = LfuCache::new(3);
            lfu.insert("a", 1);
            lfu.insert_with_frequency("b", 2, 4);
            assert_eq!(lfu.set_capacity(0), 2);
            assert!(lfu.is_empty());
            assert_eq!(lfu.least_frequency(), None);
            assert_eq!(lfu.info().current_size, 0);
            lfu.check_invariants().unwrap();
        }

        #[test]
        fn try_set_capacity_rejects_negative() {
            let mut lfu = LfuCache::new(2);
            lfu.insert("a", 1);
            assert!(lfu.try_set_capacity(-1).is_err());
            assert_eq!(lfu.capacity(), 2);
            assert_eq!(lfu.len(), 1);
        }
    }

    mod snapshots {
        use super::*;

        #[test]
        fn to_json_writes_eviction_order_and_buckets() {
            let mut lfu = LfuCache::new(2);
            lfu.insert("a".to_string(), 1);
            lfu.insert("b".to_string(), 2);
            lfu.get(&"a".to_string());

            let json = lfu.to_json(0).unwrap();
            assert_eq!(
                json,
                concat!(
                    r#"{"capacity":2,"hits":1,"misses":0,"#,
                    r#""cache":{"b":{"value":2,"frequency":1},"a":{"value":1,"frequency":2}},"#,
                    r#""frequencies":{"1":["b"],"2":["a"]}}"#
                )
            );
        }

        #[test]
        fn round_trip_restores_frequencies() {
            let mut lfu = LfuCache::new(3);
            lfu.insert("a".to_string(), 1);
            lfu.insert("b".to_string(), 2);
            lfu.insert("c".to_string(), 3);
            lfu.get(&"c".to_string());
            lfu.get(&"c".to_string());
            lfu.get(&"a".to_string());

            let json = lfu.to_json(2).unwrap();
            let mut restored: LfuCache<String, i32> = LfuCache::new(3);
            restored.merge_json(&json).unwrap();

            assert_eq!(restored.hits(), 3);
            assert_eq!(restored.frequency(&"a".to_string()), Some(2));
            assert_eq!(restored.frequency(&"b".to_string()), Some(1));
            assert_eq!(restored.frequency(&"c".to_string()), Some(3));
            assert_eq!(restored.snapshot().cache, lfu.snapshot().cache);
            restored.check_invariants().unwrap();
        }

        #[test]
        fn merge_defaults_missing_frequency_to_one() {
            let mut lfu: LfuCache<String, i32> = LfuCache::new(2);
            lfu.merge_json(r#"{"cache":{"a":{"value":1},"b":{"value":2,"frequency":4}}}"#)
                .unwrap();
            assert_eq!(lfu.frequency(&"a".to_string()), Some(1));
            assert_eq!(lfu.frequency(&"b".to_string()), Some(4));
        }

        #[test]
        fn merge_into_existing_key_bumps() {
            let mut lfu: LfuCache<String, i32> = LfuCache::new(2);
            lfu.insert("a".to_string(), 1);
            lfu.merge_json(r#"{"cache":{"a":{"value":9,"frequency":7}}}"#)
                .unwrap();
            assert_eq!(lfu.peek(&"a".to_string()), Some(&9));
            assert_eq!(lfu.frequency(&"a".to_string()), Some(2));
        }

        #[test]
        fn malformed_json_leaves_cache_untouched() {
            let mut lfu: LfuCache<String, i32> = LfuCache::new(2);
            lfu.insert("a".to_string(), 1);
            assert!(lfu.merge_json("not json").is_err());
            assert!(lfu.merge_json(r#"{"hits":1,"cache":{"b":2}}"#).is_err());
            assert_eq!(lfu.hits(), 0);
            assert_eq!(lfu.len(), 1);
        }
    }
}
