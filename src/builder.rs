//! Unified cache builder for both eviction policies.
//!
//! [`CacheBuilder`] picks a policy at runtime and hands back a [`Cache`] with
//! one API for both. [`CacheConfig`] reads the same choice from JSON.
//!
//! ## Example
//!
//! ```rust
//! use tallycache::builder::{CacheBuilder, CachePolicy};
//!
//! let mut cache = CacheBuilder::new(100).build::<u64, String>(CachePolicy::Lru);
//! cache.insert(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some(&"hello".to_string()));
//! ```

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SnapshotError};
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::traits::{CoreCache, HitCounters, ResizableCache};

/// Available eviction policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Least Recently Used eviction.
    #[default]
    Lru,
    /// Least Frequently Used eviction, FIFO among equal frequencies.
    Lfu,
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePolicy::Lru => f.write_str("lru"),
            CachePolicy::Lfu => f.write_str("lfu"),
        }
    }
}

/// Policy and capacity, usually read from a JSON config file.
///
/// # Example
///
/// ```
/// use tallycache::builder::{CacheConfig, CachePolicy};
///
/// let config = CacheConfig::from_json(r#"{"policy": "lfu", "capacity": 64}"#).unwrap();
/// assert_eq!(config.policy, CachePolicy::Lfu);
/// assert_eq!(config.capacity, 64);
///
/// assert!(CacheConfig::from_json(r#"{"capacity": -1}"#).is_err());
/// assert!(CacheConfig::from_json(r#"{"capacity": 2.5}"#).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    pub policy: CachePolicy,
    pub capacity: usize,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    policy: CachePolicy,
    capacity: Option<serde_json::Value>,
}

impl CacheConfig {
    pub fn new(policy: CachePolicy, capacity: usize) -> Self {
        Self { policy, capacity }
    }

    /// Parses `{ "policy": "lru" | "lfu", "capacity": <non-negative integer> }`.
    ///
    /// `policy` defaults to `lru`. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| ConfigError::new(format!("invalid cache config: {e}")))?;
        let capacity = match raw.capacity {
            Some(value) => parse_capacity(&value)?,
            None => return Err(ConfigError::new("cache config is missing `capacity`")),
        };
        Ok(Self {
            policy: raw.policy,
            capacity,
        })
    }
}

/// Accepts integral JSON numbers `>= 0`, including forms like `8.0`.
fn parse_capacity(value: &serde_json::Value) -> Result<usize, ConfigError> {
    let invalid =
        || ConfigError::new(format!("capacity must be a non-negative integer, got {value}"));
    if let Some(capacity) = value.as_u64() {
        return usize::try_from(capacity).map_err(|_| invalid());
    }
    match value.as_f64() {
        Some(capacity)
            if capacity.is_finite()
                && capacity >= 0.0
                && capacity.fract() == 0.0
                && capacity <= usize::MAX as f64 =>
        {
            Ok(capacity as usize)
        },
        _ => Err(invalid()),
    }
}

/// Cache with a policy chosen at runtime.
pub struct Cache<K, V> {
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V> {
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
        }
    }

    /// Insert a key-value pair. Returns the previous value if the key existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match &mut self.inner {
            CacheInner::Lru(lru) => lru.insert(key, value),
            CacheInner::Lfu(lfu) => lfu.insert(key, value),
        }
    }

    /// Get a reference to a value by key, counting a hit or a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match &mut self.inner {
            CacheInner::Lru(lru) => lru.get(key),
            CacheInner::Lfu(lfu) => lfu.get(key),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match &self.inner {
            CacheInner::Lru(lru) => lru.contains(key),
            CacheInner::Lfu(lfu) => lfu.contains(key),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.len(),
            CacheInner::Lfu(lfu) => lfu.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.capacity(),
            CacheInner::Lfu(lfu) => lfu.capacity(),
        }
    }

    /// Returns the number of entries evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        match &mut self.inner {
            CacheInner::Lru(lru) => lru.set_capacity(capacity),
            CacheInner::Lfu(lfu) => lfu.set_capacity(capacity),
        }
    }

    /// Clear all entries. Counters are kept.
    pub fn clear(&mut self) {
        match &mut self.inner {
            CacheInner::Lru(lru) => lru.clear(),
            CacheInner::Lfu(lfu) => lfu.clear(),
        }
    }

    pub fn hits(&self) -> u64 {
        match &self.inner {
            CacheInner::Lru(lru) => lru.hits(),
            CacheInner::Lfu(lfu) => lfu.hits(),
        }
    }

    pub fn misses(&self) -> u64 {
        match &self.inner {
            CacheInner::Lru(lru) => lru.misses(),
            CacheInner::Lfu(lfu) => lfu.misses(),
        }
    }

    /// Policy-specific JSON snapshot. See
    /// [`LruCache::to_json`] and [`LfuCache::to_json`].
    pub fn to_json(&self, indent: usize) -> Result<String, SnapshotError>
    where
        K: Serialize,
        V: Serialize,
    {
        match &self.inner {
            CacheInner::Lru(lru) => lru.to_json(indent),
            CacheInner::Lfu(lfu) => lfu.to_json(indent),
        }
    }

    pub fn merge_json(&mut self, json: &str) -> Result<(), SnapshotError>
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        match &mut self.inner {
            CacheInner::Lru(lru) => lru.merge_json(json),
            CacheInner::Lfu(lfu) => lfu.merge_json(json),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl<K, V> CoreCache<K, V> for Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        Cache::insert(self, key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        Cache::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        Cache::contains(self, key)
    }

    fn len(&self) -> usize {
        Cache::len(self)
    }

    fn capacity(&self) -> usize {
        Cache::capacity(self)
    }

    fn clear(&mut self) {
        Cache::clear(self);
    }
}

impl<K, V> ResizableCache<K, V> for Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn set_capacity(&mut self, capacity: usize) -> usize {
        Cache::set_capacity(self, capacity)
    }
}

impl<K, V> HitCounters for Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn hits(&self) -> u64 {
        Cache::hits(self)
    }

    fn misses(&self) -> u64 {
        Cache::misses(self)
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Like [`new`](Self::new), rejecting negative capacities.
    pub fn try_new(capacity: i64) -> Result<Self, ConfigError> {
        crate::error::validate_capacity(capacity).map(Self::new)
    }

    /// Build a cache straight from a parsed [`CacheConfig`].
    ///
    /// ```rust
    /// use tallycache::builder::{CacheBuilder, CacheConfig, CachePolicy};
    ///
    /// let config = CacheConfig::from_json(r#"{"policy":"lfu","capacity":2}"#).unwrap();
    /// let cache = CacheBuilder::from_config::<String, i32>(&config);
    /// assert_eq!(cache.policy(), CachePolicy::Lfu);
    /// assert_eq!(cache.capacity(), 2);
    /// ```
    pub fn from_config<K, V>(config: &CacheConfig) -> Cache<K, V>
    where
        K: Clone + Eq + Hash,
    {
        Self::new(config.capacity).build(config.policy)
    }

    /// Build a cache with the specified policy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tallycache::builder::{CacheBuilder, CachePolicy};
    ///
    /// let lru = CacheBuilder::new(100).build::<u64, String>(CachePolicy::Lru);
    /// let lfu = CacheBuilder::new(100).build::<u64, String>(CachePolicy::Lfu);
    /// assert_eq!(lru.capacity(), lfu.capacity());
    /// ```
    pub fn build<K, V>(self, policy: CachePolicy) -> Cache<K, V>
    where
        K: Clone + Eq + Hash,
    {
        let inner = match policy {
            CachePolicy::Lru => CacheInner::Lru(LruCache::new(self.capacity)),
            CachePolicy::Lfu => CacheInner::Lfu(LfuCache::new(self.capacity)),
        };

        Cache { inner }
    }
}
