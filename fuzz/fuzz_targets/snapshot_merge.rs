#![no_main]

use libfuzzer_sys::fuzz_target;
use tallycache::policy::lfu::LfuCache;
use tallycache::policy::lru::LruCache;

// Fuzz snapshot import with arbitrary text
//
// merge_json must either apply the snapshot or leave the cache untouched,
// and never break the cache's invariants.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut lru: LruCache<String, i64> = LruCache::new(8);
    lru.insert("seed".to_string(), 1);
    if lru.merge_json(text).is_err() {
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.hits() + lru.misses(), 0);
    }
    assert!(lru.check_invariants().is_ok());

    let mut lfu: LfuCache<String, i64> = LfuCache::new(8);
    lfu.insert("seed".to_string(), 1);
    if lfu.merge_json(text).is_err() {
        assert_eq!(lfu.len(), 1);
        assert_eq!(lfu.frequency(&"seed".to_string()), Some(1));
    }
    assert!(lfu.check_invariants().is_ok());
});
