#![no_main]

use libfuzzer_sys::fuzz_target;
use tallycache::policy::lru::LruCache;

// Fuzz arbitrary operation sequences on LruCache
//
// The first byte picks the capacity; every following pair is (op, key).
// Counters, the capacity bound and index/list agreement are checked after
// each operation.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, ops)) = data.split_first() else {
        return;
    };
    let mut cache: LruCache<u8, u32> = LruCache::new(usize::from(cap % 32));
    let (mut hits, mut misses) = (0u64, 0u64);

    for (step, pair) in ops.chunks_exact(2).enumerate() {
        let key = pair[1] % 48;
        match pair[0] % 7 {
            0 | 1 => {
                cache.insert(key, step as u32);
                if cache.capacity() > 0 {
                    assert_eq!(cache.keys().next(), Some(&key));
                }
            },
            2 | 3 => {
                if cache.get(&key).is_some() {
                    hits += 1;
                    assert_eq!(cache.keys().next(), Some(&key));
                } else {
                    misses += 1;
                }
            },
            4 => {
                let _ = cache.peek(&key);
            },
            5 => {
                let before = cache.len();
                let capacity = usize::from(pair[1] % 32);
                let evicted = cache.set_capacity(capacity);
                assert_eq!(evicted, before.saturating_sub(capacity));
            },
            6 => cache.clear(),
            _ => unreachable!(),
        }

        assert_eq!(cache.hits(), hits);
        assert_eq!(cache.misses(), misses);
        if let Err(err) = cache.check_invariants() {
            panic!("invariant violated: {err}");
        }
    }
});
