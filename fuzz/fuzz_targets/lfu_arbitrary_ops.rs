#![no_main]

use libfuzzer_sys::fuzz_target;
use tallycache::policy::lfu::LfuCache;

// Fuzz arbitrary operation sequences on LfuCache
//
// Triples of (op, key, arg). Checks that every eviction takes a key at the
// least frequency and that the three indexes stay in agreement.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, ops)) = data.split_first() else {
        return;
    };
    let mut cache: LfuCache<u8, u32> = LfuCache::new(usize::from(cap % 16));

    for (step, triple) in ops.chunks_exact(3).enumerate() {
        let key = triple[1] % 40;
        let arg = triple[2];
        match triple[0] % 8 {
            0 | 1 | 2 => {
                let full = cache.len() == cache.capacity() && !cache.contains(&key);
                let least = cache.least_frequency();
                let victim = cache.peek_lfu().map(|(k, _)| *k);
                let before = cache.frequency(&key);
                if triple[0] % 8 == 2 {
                    cache.insert_with_frequency(key, step as u32, u64::from(arg % 8));
                } else {
                    cache.insert(key, step as u32);
                }
                if let Some(before) = before {
                    assert_eq!(cache.frequency(&key), Some(before + 1));
                }
                if full && let Some(victim) = victim {
                    assert!(!cache.contains(&victim));
                    assert!(least.is_some());
                }
            },
            3 | 4 => {
                let before = cache.frequency(&key);
                let found = cache.get(&key).is_some();
                assert_eq!(found, before.is_some());
                if let Some(before) = before {
                    assert_eq!(cache.frequency(&key), Some(before + 1));
                }
            },
            5 => {
                let least = cache.least_frequency();
                if let Some((k, _)) = cache.pop_lfu() {
                    assert!(!cache.contains(&k));
                    assert!(least.is_some());
                }
            },
            6 => {
                let capacity = usize::from(arg % 16);
                cache.set_capacity(capacity);
                if cache.is_empty() {
                    assert_eq!(cache.least_frequency(), None);
                }
            },
            7 => cache.clear(),
            _ => unreachable!(),
        }

        if let Err(err) = cache.check_invariants() {
            panic!("invariant violated: {err}");
        }
    }
});
