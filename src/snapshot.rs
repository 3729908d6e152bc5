//! JSON snapshots of cache contents and counters.
//!
//! Both caches export `{ capacity, hits, misses, cache }`; the LFU cache adds
//! per-entry frequencies and an informational `frequencies` index.
//!
//! ```text
//!   LRU  { "capacity": 2, "hits": 1, "misses": 0,
//!          "cache": { "b": 2, "a": 1 } }                     ← oldest first
//!
//!   LFU  { "capacity": 2, "hits": 1, "misses": 0,
//!          "cache": { "c": { "value": 3, "frequency": 1 },
//!                     "a": { "value": 1, "frequency": 2 } },  ← least first
//!          "frequencies": { "1": ["c"], "2": ["a"] } }
//! ```
//!
//! `cache` is written in eviction order, so replaying it front to back through
//! `insert` rebuilds the same recency (LRU) or tie-break (LFU) order.
//!
//! Decoding is permissive: missing or `null` counters read as 0, a missing or
//! `null` `cache` is empty, a missing LFU `frequency` reads as 1, and fields
//! the decoder does not know (including `capacity` and `frequencies`) are
//! ignored. Malformed JSON and wrongly typed fields are
//! [`SnapshotError::Json`].

use std::fmt;
use std::marker::PhantomData;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SnapshotError;

/// Serialized form of an [`LruCache`](crate::policy::lru::LruCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Deserialize<'de>, V: Deserialize<'de>"
))]
pub struct LruSnapshot<K, V> {
    /// Capacity at export time. Not read back.
    #[serde(default, skip_deserializing)]
    pub capacity: usize,
    #[serde(default, deserialize_with = "nullable")]
    pub hits: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub misses: u64,
    /// Entries, least recently used first.
    #[serde(
        default,
        serialize_with = "ordered::serialize",
        deserialize_with = "ordered::deserialize"
    )]
    pub cache: Vec<(K, V)>,
}

/// One LFU entry as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LfuEntry<V> {
    pub value: V,
    #[serde(
        default = "default_frequency",
        deserialize_with = "nullable_frequency"
    )]
    pub frequency: u64,
}

/// Serialized form of an [`LfuCache`](crate::policy::lfu::LfuCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: Deserialize<'de>, V: Deserialize<'de>"
))]
pub struct LfuSnapshot<K, V> {
    /// Capacity at export time. Not read back.
    #[serde(default, skip_deserializing)]
    pub capacity: usize,
    #[serde(default, deserialize_with = "nullable")]
    pub hits: u64,
    #[serde(default, deserialize_with = "nullable")]
    pub misses: u64,
    /// Entries in ascending frequency, oldest in each bucket first.
    #[serde(
        default,
        serialize_with = "ordered::serialize",
        deserialize_with = "ordered::deserialize"
    )]
    pub cache: Vec<(K, LfuEntry<V>)>,
    /// Frequency → keys view of the same entries. Not read back.
    #[serde(default, skip_deserializing, serialize_with = "ordered::serialize")]
    pub frequencies: Vec<(u64, Vec<K>)>,
}

/// Encodes `value` as JSON. `indent == 0` gives the compact form, anything
/// else pretty-prints with that many spaces per level.
pub fn to_string_with_indent<T>(value: &T, indent: usize) -> Result<String, SnapshotError>
where
    T: Serialize + ?Sized,
{
    if indent == 0 {
        return Ok(serde_json::to_string(value)?);
    }
    let pad = vec![b' '; indent];
    let mut out = Vec::with_capacity(128);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&pad);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes UTF-8
    String::from_utf8(out).map_err(|err| {
        SnapshotError::Json(<serde_json::Error as serde::ser::Error>::custom(err))
    })
}

/// Decodes a snapshot (or any other JSON document) from a string.
pub fn from_json<T>(json: &str) -> Result<T, SnapshotError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(json)?)
}

fn default_frequency() -> u64 {
    1
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_frequency<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_else(default_frequency))
}

/// `Vec<(K, V)>` ⇄ JSON object, keeping entry order both ways.
mod ordered {
    use super::*;

    pub fn serialize<S, K, V>(entries: &[(K, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<Vec<(K, V)>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de>,
        V: Deserialize<'de>,
    {
        let entries = Option::<Entries<K, V>>::deserialize(deserializer)?;
        Ok(entries.map(|entries| entries.0).unwrap_or_default())
    }

    struct Entries<K, V>(Vec<(K, V)>);

    impl<'de, K, V> Deserialize<'de> for Entries<K, V>
    where
        K: Deserialize<'de>,
        V: Deserialize<'de>,
    {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(EntriesVisitor(PhantomData))
        }
    }

    struct EntriesVisitor<K, V>(PhantomData<fn() -> (K, V)>);

    impl<'de, K, V> Visitor<'de> for EntriesVisitor<K, V>
    where
        K: Deserialize<'de>,
        V: Deserialize<'de>,
    {
        type Value = Entries<K, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of cache entries")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry()? {
                entries.push((key, value));
            }
            Ok(Entries(entries))
        }
    }
}
