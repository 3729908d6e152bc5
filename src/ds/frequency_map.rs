//! Frequency index for LFU eviction.
//!
//! [`FrequencyMap`] groups handles into buckets keyed by access frequency.
//! It stores handles only (the LFU cache hands it [`SlotId`]s into its node
//! arena) and never owns or drops the records they name.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                          FrequencyMap<H>                              │
//! │                                                                       │
//! │   index: FxHashMap<H, SlotId>     links: SlotArena<Link<H>>           │
//! │   ┌────────┬────────┐             ┌────────┬─────────────────────┐    │
//! │   │ node_3 │ link_0 │────────────►│ link_0 │ freq 1, prev/next   │    │
//! │   │ node_7 │ link_1 │────────────►│ link_1 │ freq 1, prev/next   │    │
//! │   │ node_9 │ link_2 │────────────►│ link_2 │ freq 4, prev/next   │    │
//! │   └────────┴────────┘             └────────┴─────────────────────┘    │
//! │                                                                       │
//! │   buckets: FxHashMap<u64, Bucket>, chained in ascending frequency     │
//! │                                                                       │
//! │   least = 1                                                           │
//! │     │                                                                 │
//! │     ▼                                                                 │
//! │   freq 1: newest ─► [link_1] ◄──► [link_0] ◄── oldest (evicted first) │
//! │      │                                                                │
//! │      └─ next ─► freq 4: newest ─► [link_2] ◄── oldest                 │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Buckets are linked in numeric order and the smallest non-empty frequency
//! is tracked explicitly, so [`least_frequency`](FrequencyMap::least_frequency)
//! never depends on the order in which buckets were created. Empty buckets are
//! dropped as soon as their last handle leaves.
//!
//! ## Operations
//!
//! | Operation        | Time   | Notes                                       |
//! |------------------|--------|---------------------------------------------|
//! | `insert`         | O(1)*  | O(buckets) when the bucket must be spliced  |
//! |                  |        | in above the current minimum                |
//! | `refresh`        | O(1)   | Move to `freq + 1`, newest in that bucket   |
//! | `remove`         | O(1)   |                                             |
//! | `pop_least`      | O(1)   | Oldest handle of the least-frequency bucket |
//! | `least_frequency`| O(1)   |                                             |
//!
//! Within a bucket, ties are broken first-in first-out: the handle that
//! entered the bucket earliest (and is still there) is evicted first.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};

#[derive(Debug, Clone)]
struct Link<H> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    freq: u64,
    handle: H,
}

/// One frequency level. `head` is the newest arrival, `tail` the oldest.
#[derive(Debug, Clone, Default)]
struct Bucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
    lower: Option<u64>,
    higher: Option<u64>,
}

/// Frequency → FIFO bucket of handles.
///
/// # Example
///
/// ```
/// use tallycache::ds::FrequencyMap;
///
/// let mut freq = FrequencyMap::new();
/// freq.insert('a', 1);
/// freq.insert('b', 1);
/// freq.refresh(&'a');
///
/// assert_eq!(freq.frequency(&'a'), Some(2));
/// assert_eq!(freq.least_frequency(), Some(1));
/// assert_eq!(freq.pop_least(), Some(('b', 1)));
/// assert_eq!(freq.least_frequency(), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct FrequencyMap<H> {
    links: SlotArena<Link<H>>,
    index: FxHashMap<H, SlotId>,
    buckets: FxHashMap<u64, Bucket>,
    least: Option<u64>,
}

impl<H> FrequencyMap<H>
where
    H: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            links: SlotArena::new(),
            index: FxHashMap::default(),
            buckets: FxHashMap::default(),
            least: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            links: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            least: None,
        }
    }

    /// Number of tracked handles.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn contains(&self, handle: &H) -> bool {
        self.index.contains_key(handle)
    }

    pub fn frequency(&self, handle: &H) -> Option<u64> {
        let id = *self.index.get(handle)?;
        self.links.get(id).map(|link| link.freq)
    }

    /// Smallest frequency that currently has at least one handle.
    pub fn least_frequency(&self) -> Option<u64> {
        self.least
    }

    /// Number of handles in the bucket for `freq`.
    pub fn bucket_len(&self, freq: u64) -> usize {
        self.buckets.get(&freq).map_or(0, |bucket| bucket.len)
    }

    /// The handle [`pop_least`](Self::pop_least) would return, without removing it.
    pub fn peek_least(&self) -> Option<(&H, u64)> {
        let bucket = self.buckets.get(&self.least?)?;
        let link = self.links.get(bucket.tail?)?;
        Some((&link.handle, link.freq))
    }

    /// Registers `handle` in the bucket for `freq` as its newest member.
    ///
    /// Returns `false` and changes nothing if the handle is already tracked.
    pub fn insert(&mut self, handle: H, freq: u64) -> bool {
        if self.index.contains_key(&handle) {
            return false;
        }
        let id = self.links.insert(Link {
            prev: None,
            next: None,
            freq,
            handle,
        });
        self.index.insert(handle, id);
        self.ensure_bucket(freq);
        self.push_newest(freq, id);
        true
    }

    /// Bumps `handle` to the next frequency and returns it.
    ///
    /// The handle becomes the newest member of its new bucket. At `u64::MAX`
    /// the frequency saturates and the handle is only re-queued as newest.
    pub fn refresh(&mut self, handle: &H) -> Option<u64> {
        let id = *self.index.get(handle)?;
        let current = self.links.get(id)?.freq;

        if current == u64::MAX {
            self.unlink(current, id)?;
            self.push_newest(current, id);
            return Some(current);
        }
        let next_freq = current + 1;

        let (lower, higher) = {
            let bucket = self.buckets.get(&current)?;
            (bucket.lower, bucket.higher)
        };
        self.unlink(current, id)?;
        let emptied = self.bucket_len(current) == 0;
        if emptied {
            self.drop_bucket(current);
        }

        if !self.buckets.contains_key(&next_freq) {
            let below = if emptied { lower } else { Some(current) };
            self.link_bucket(next_freq, below, higher);
        }
        if let Some(link) = self.links.get_mut(id) {
            link.freq = next_freq;
        }
        self.push_newest(next_freq, id);
        Some(next_freq)
    }

    /// Stops tracking `handle` and returns the frequency it had.
    pub fn remove(&mut self, handle: &H) -> Option<u64> {
        let id = *self.index.get(handle)?;
        let freq = self.links.get(id)?.freq;
        self.unlink(freq, id)?;
        if self.bucket_len(freq) == 0 {
            self.drop_bucket(freq);
        }
        self.index.remove(handle);
        self.links.remove(id).map(|link| link.freq)
    }

    /// Removes and returns the oldest handle of the least-frequency bucket.
    pub fn pop_least(&mut self) -> Option<(H, u64)> {
        let handle = *self.peek_least()?.0;
        let freq = self.remove(&handle)?;
        Some((handle, freq))
    }

    /// Non-empty frequencies in ascending order.
    pub fn frequencies(&self) -> Frequencies<'_> {
        Frequencies {
            buckets: &self.buckets,
            current: self.least,
        }
    }

    /// Handles at `freq`, oldest arrival first.
    pub fn iter_bucket(&self, freq: u64) -> BucketIter<'_, H> {
        BucketIter {
            links: &self.links,
            current: self.buckets.get(&freq).and_then(|bucket| bucket.tail),
        }
    }

    pub fn clear(&mut self) {
        self.links.clear();
        self.index.clear();
        self.buckets.clear();
        self.least = None;
    }

    pub fn clear_shrink(&mut self) {
        self.clear();
        self.links.shrink_to_fit();
        self.index.shrink_to_fit();
        self.buckets.shrink_to_fit();
    }

    /// Creates the bucket for `freq` if missing, splicing it into the
    /// ascending chain.
    fn ensure_bucket(&mut self, freq: u64) {
        if self.buckets.contains_key(&freq) {
            return;
        }
        let Some(least) = self.least else {
            self.link_bucket(freq, None, None);
            return;
        };
        if freq < least {
            self.link_bucket(freq, None, Some(least));
            return;
        }

        let mut below = least;
        while let Some(higher) = self.buckets.get(&below).and_then(|bucket| bucket.higher) {
            if higher > freq {
                break;
            }
            below = higher;
        }
        let above = self.buckets.get(&below).and_then(|bucket| bucket.higher);
        self.link_bucket(freq, Some(below), above);
    }

    fn link_bucket(&mut self, freq: u64, lower: Option<u64>, higher: Option<u64>) {
        self.buckets.insert(
            freq,
            Bucket {
                lower,
                higher,
                ..Bucket::default()
            },
        );
        match lower {
            Some(lower) => {
                if let Some(bucket) = self.buckets.get_mut(&lower) {
                    bucket.higher = Some(freq);
                }
            },
            None => self.least = Some(freq),
        }
        if let Some(higher) = higher
            && let Some(bucket) = self.buckets.get_mut(&higher)
        {
            bucket.lower = Some(freq);
        }
    }

    fn drop_bucket(&mut self, freq: u64) {
        let Some(bucket) = self.buckets.remove(&freq) else {
            return;
        };
        match bucket.lower {
            Some(lower) => {
                if let Some(lower_bucket) = self.buckets.get_mut(&lower) {
                    lower_bucket.higher = bucket.higher;
                }
            },
            None => self.least = bucket.higher,
        }
        if let Some(higher) = bucket.higher
            && let Some(higher_bucket) = self.buckets.get_mut(&higher)
        {
            higher_bucket.lower = bucket.lower;
        }
    }

    fn push_newest(&mut self, freq: u64, id: SlotId) {
        let Some(bucket) = self.buckets.get_mut(&freq) else {
            return;
        };
        let old_head = bucket.head;
        bucket.head = Some(id);
        bucket.len += 1;
        if old_head.is_none() {
            bucket.tail = Some(id);
        }

        if let Some(link) = self.links.get_mut(id) {
            link.prev = None;
            link.next = old_head;
        }
        if let Some(old_head) = old_head
            && let Some(link) = self.links.get_mut(old_head)
        {
            link.prev = Some(id);
        }
    }

    fn unlink(&mut self, freq: u64, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let link = self.links.get(id)?;
            (link.prev, link.next)
        };
        let bucket = self.buckets.get_mut(&freq)?;
        match prev {
            Some(prev) => {
                if let Some(link) = self.links.get_mut(prev) {
                    link.next = next;
                }
            },
            None => bucket.head = next,
        }
        match next {
            Some(next) => {
                if let Some(link) = self.links.get_mut(next) {
                    link.prev = prev;
                }
            },
            None => bucket.tail = prev,
        }
        bucket.len -= 1;

        let link = self.links.get_mut(id)?;
        link.prev = None;
        link.next = None;
        Some(())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.links.len(), self.index.len());

        if self.is_empty() {
            assert!(self.buckets.is_empty());
            assert_eq!(self.least, None);
            return;
        }

        let least = self.least.expect("non-empty map without a least frequency");
        assert_eq!(self.buckets[&least].lower, None);

        let mut seen_buckets = 0usize;
        let mut seen_links = 0usize;
        let mut previous: Option<u64> = None;
        let mut current = Some(least);
        while let Some(freq) = current {
            let bucket = &self.buckets[&freq];
            assert_eq!(bucket.lower, previous);
            if let Some(previous) = previous {
                assert!(previous < freq, "bucket chain out of order");
            }
            assert!(bucket.len > 0, "empty bucket {freq} left behind");

            let mut count = 0usize;
            let mut prev = None;
            let mut link_id = bucket.head;
            while let Some(id) = link_id {
                let link = self.links.get(id).expect("bucket link missing");
                assert_eq!(link.freq, freq);
                assert_eq!(link.prev, prev);
                assert_eq!(self.index.get(&link.handle), Some(&id));
                prev = Some(id);
                link_id = link.next;
                count += 1;
            }
            assert_eq!(bucket.tail, prev);
            assert_eq!(count, bucket.len);

            seen_buckets += 1;
            seen_links += count;
            previous = Some(freq);
            current = bucket.higher;
        }
        assert_eq!(seen_buckets, self.buckets.len());
        assert_eq!(seen_links, self.links.len());
    }
}

impl<H> Default for FrequencyMap<H>
where
    H: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Ascending iterator over non-empty frequencies.
pub struct Frequencies<'a> {
    buckets: &'a FxHashMap<u64, Bucket>,
    current: Option<u64>,
}

impl Iterator for Frequencies<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let freq = self.current?;
        self.current = self.buckets.get(&freq).and_then(|bucket| bucket.higher);
        Some(freq)
    }
}

/// Oldest-first iterator over the handles of one bucket.
pub struct BucketIter<'a, H> {
    links: &'a SlotArena<Link<H>>,
    current: Option<SlotId>,
}

impl<'a, H> Iterator for BucketIter<'a, H> {
    type Item = &'a H;

    fn next(&mut self) -> Option<&'a H> {
        let link = self.links.get(self.current?)?;
        self.current = link.prev;
        Some(&link.handle)
    }
}
