// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behavior that must hold for both eviction policies under arbitrary
// operation sequences. These span the policy, ds and builder modules.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tallycache::builder::{CacheBuilder, CachePolicy};
use tallycache::policy::lfu::LfuCache;
use tallycache::policy::lru::LruCache;
use tallycache::traits::{CoreCache, HitCounters, ResizableCache};

const POLICIES: [CachePolicy; 2] = [CachePolicy::Lru, CachePolicy::Lfu];

// ==============================================
// Capacity Bound
// ==============================================

mod capacity_bound {
    use super::*;

    #[test]
    fn size_never_exceeds_capacity() {
        for policy in POLICIES {
            for capacity in [0usize, 1, 2, 7, 32] {
                let mut rng = SmallRng::seed_from_u64(capacity as u64 + 11);
                let mut cache = CacheBuilder::new(capacity).build::<u32, u32>(policy);

                for step in 0..2_000u32 {
                    let key = rng.random_range(0..64);
                    if rng.random_bool(0.6) {
                        cache.insert(key, step);
                    } else {
                        cache.get(&key);
                    }
                    assert!(
                        cache.len() <= capacity,
                        "{policy} cache of capacity {capacity} grew to {}",
                        cache.len()
                    );
                }
            }
        }
    }

    #[test]
    fn indexes_stay_consistent_under_random_ops() {
        let mut rng = SmallRng::seed_from_u64(0xCAFE);
        let mut lru = LruCache::new(16);
        let mut lfu = LfuCache::new(16);

        for step in 0..5_000u32 {
            let key = rng.random_range(0..48u32);
            match rng.random_range(0..10) {
                0..=4 => {
                    lru.insert(key, step);
                    lfu.insert(key, step);
                },
                5..=7 => {
                    lru.get(&key);
                    lfu.get(&key);
                },
                8 => {
                    let freq = rng.random_range(0..6u64);
                    lfu.insert_with_frequency(key, step, freq);
                },
                _ => {
                    let capacity = rng.random_range(0..24usize);
                    lru.set_capacity(capacity);
                    lfu.set_capacity(capacity);
                },
            }
            lru.check_invariants().unwrap();
            lfu.check_invariants().unwrap();
        }
    }
}

// ==============================================
// LRU Eviction Order
// ==============================================
//
// Checked against a VecDeque model: front is most recent, back is evicted.

mod lru_eviction_order {
    use super::*;

    fn touch(model: &mut VecDeque<u32>, key: u32) {
        if let Some(pos) = model.iter().position(|&k| k == key) {
            model.remove(pos);
        }
        model.push_front(key);
    }

    #[test]
    fn matches_reference_model() {
        let capacity = 8;
        let mut rng = SmallRng::seed_from_u64(42);
        let mut cache = LruCache::new(capacity);
        let mut model: VecDeque<u32> = VecDeque::new();

        for step in 0..3_000u32 {
            let key = rng.random_range(0..20);
            if rng.random_bool(0.5) {
                if !model.contains(&key) && model.len() == capacity {
                    let victim = model.pop_back().unwrap();
                    assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(victim));
                }
                touch(&mut model, key);
                cache.insert(key, step);
            } else if cache.get(&key).is_some() {
                touch(&mut model, key);
            } else {
                assert!(!model.contains(&key));
            }
            assert_eq!(cache.keys().copied().collect::<Vec<_>>(), Vec::from(model.clone()));
        }
    }

    #[test]
    fn n_plus_one_inserts_evict_least_recently_touched() {
        let mut cache = LruCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        cache.get(&"a");
        cache.insert("b", 22);
        cache.insert("d", 4);

        assert!(!cache.contains(&"c"));
        assert_eq!(cache.len(), 3);
    }
}

// ==============================================
// LFU Eviction Order
// ==============================================

mod lfu_eviction_order {
    use super::*;

    #[test]
    fn n_plus_one_default_inserts_evict_oldest_frequency_one_key() {
        for capacity in 1..10u32 {
            let mut lfu = LfuCache::new(capacity as usize);
            for key in 0..=capacity {
                lfu.insert(key, key);
            }
            assert!(!lfu.contains(&0), "capacity {capacity} kept key 0");
            assert!((1..=capacity).all(|k| lfu.contains(&k)));
            assert_eq!(lfu.least_frequency(), Some(1));
        }
    }

    #[test]
    fn eviction_is_deterministic_for_a_fixed_sequence() {
        let run = || {
            let mut rng = SmallRng::seed_from_u64(9);
            let mut lfu = LfuCache::new(5);
            let mut evicted = Vec::new();
            for step in 0..500u32 {
                let key = rng.random_range(0..15u32);
                if rng.random_bool(0.5) {
                    let victim = lfu.peek_lfu().map(|(k, _)| *k);
                    let was_full = lfu.len() == lfu.capacity() && !lfu.contains(&key);
                    lfu.insert(key, step);
                    if was_full {
                        evicted.push(victim);
                    }
                } else {
                    lfu.get(&key);
                }
            }
            evicted
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn victim_always_has_minimum_frequency() {
        let mut rng = SmallRng::seed_from_u64(77);
        let mut lfu = LfuCache::new(6);
        for step in 0..2_000u32 {
            let key = rng.random_range(0..20u32);
            if rng.random_bool(0.4) {
                lfu.get(&key);
                continue;
            }
            if lfu.len() == lfu.capacity() && !lfu.contains(&key) {
                let min = lfu.iter().map(|node| node.frequency).min();
                let victim = lfu.peek_lfu().map(|(k, _)| *k).unwrap();
                assert_eq!(lfu.frequency(&victim), min);
            }
            lfu.insert(key, step);
        }
    }
}

// ==============================================
// Hit / Miss Accounting
// ==============================================

mod hit_miss {
    use super::*;

    #[test]
    fn miss_changes_only_the_miss_counter() {
        for policy in POLICIES {
            let mut cache = CacheBuilder::new(4).build::<u32, u32>(policy);
            cache.insert(1, 1);
            cache.insert(2, 2);

            let before = cache.len();
            assert_eq!(cache.get(&99), None);
            assert_eq!(cache.misses(), 1);
            assert_eq!(cache.hits(), 0);
            assert_eq!(cache.len(), before);
        }
    }

    #[test]
    fn hit_changes_only_the_hit_counter() {
        for policy in POLICIES {
            let mut cache = CacheBuilder::new(4).build::<u32, u32>(policy);
            cache.insert(1, 1);
            assert_eq!(cache.get(&1), Some(&1));
            assert_eq!(cache.hits(), 1);
            assert_eq!(cache.misses(), 0);
        }
    }

    #[test]
    fn counters_are_monotonic() {
        let mut rng = SmallRng::seed_from_u64(5);
        for policy in POLICIES {
            let mut cache = CacheBuilder::new(4).build::<u32, u32>(policy);
            let (mut hits, mut misses) = (0, 0);
            for _ in 0..1_000 {
                let key = rng.random_range(0..8);
                match rng.random_range(0..4) {
                    0 => {
                        cache.insert(key, key);
                    },
                    1 => cache.clear(),
                    _ => {
                        cache.get(&key);
                    },
                }
                assert!(cache.hits() >= hits && cache.misses() >= misses);
                hits = cache.hits();
                misses = cache.misses();
            }
            assert!((0.0..=1.0).contains(&cache.hit_ratio()));
        }
    }
}

// ==============================================
// Capacity Changes
// ==============================================

mod capacity_changes {
    use super::*;

    #[test]
    fn shrink_from_n_to_m_evicts_exactly_n_minus_m() {
        for policy in POLICIES {
            for (n, m) in [(10usize, 3usize), (5, 0), (4, 4), (8, 1)] {
                let mut cache = CacheBuilder::new(n).build::<usize, usize>(policy);
                for key in 0..n {
                    cache.insert(key, key);
                }
                assert_eq!(cache.set_capacity(m), n - m, "{policy} {n} -> {m}");
                assert_eq!(cache.len(), m);
            }
        }
    }

    #[test]
    fn generic_resize_through_trait() {
        fn shrink_half<C: ResizableCache<u32, u32>>(cache: &mut C) -> usize {
            let half = cache.capacity() / 2;
            cache.set_capacity(half)
        }

        let mut lru = LruCache::new(6);
        let mut lfu = LfuCache::new(6);
        for key in 0..6 {
            lru.insert(key, key);
            lfu.insert(key, key);
        }
        assert_eq!(shrink_half(&mut lru), 3);
        assert_eq!(shrink_half(&mut lfu), 3);
    }
}

// ==============================================
// Capacity-0 Behavior
// ==============================================

mod zero_capacity {
    use super::*;

    #[test]
    fn every_insert_leaves_size_zero_and_every_get_misses() {
        for policy in POLICIES {
            let mut cache = CacheBuilder::new(0).build::<&str, i32>(policy);
            for (i, key) in ["a", "b", "a", "c"].into_iter().enumerate() {
                cache.insert(key, i as i32);
                assert_eq!(cache.len(), 0);
                assert_eq!(cache.get(&key), None);
            }
            assert_eq!(cache.misses(), 4);
            assert_eq!(cache.hits(), 0);
        }
    }

    #[test]
    fn lfu_insert_with_frequency_is_a_noop() {
        let mut lfu: LfuCache<&str, i32> = LfuCache::new(0);
        lfu.insert_with_frequency("a", 1, 3);
        assert!(CoreCache::is_empty(&lfu));
        assert_eq!(lfu.info().least_frequency, None);
    }
}

// ==============================================
// Documented Scenarios
// ==============================================

mod scenarios {
    use super::*;

    #[test]
    fn lru_two_slots() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.get(&"a");
        cache.insert("c", 3);

        assert!(!cache.contains(&"b"));
        assert!(cache.contains(&"a"));
        assert!(cache.contains(&"c"));
    }

    #[test]
    fn lfu_two_slots() {
        let mut lfu = LfuCache::new(2);
        lfu.insert("a", 1);
        lfu.insert("b", 2);
        lfu.get(&"a");
        lfu.insert("c", 3);

        assert!(!lfu.contains(&"b"));
        assert_eq!(lfu.frequency(&"a"), Some(2));
        assert_eq!(lfu.frequency(&"c"), Some(1));
    }
}
