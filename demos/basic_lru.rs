use tallycache::policy::lru::LruCache;

fn main() {
    let mut cache: LruCache<&str, String> = LruCache::new(2);

    cache.insert("a", "alpha".to_string());
    cache.insert("b", "beta".to_string());

    cache.get(&"a");
    cache.insert("c", "gamma".to_string());
    cache.get(&"b");

    println!("contains a? {}", cache.contains(&"a"));
    println!("contains b? {}", cache.contains(&"b"));
    println!("info: {:?}", cache.info());
}

// Expected output:
// contains a? true
// contains b? false
// info: LruInfo { hits: 1, misses: 1, capacity: 2, size: 2 }
//
// Explanation: capacity=2; "a" is touched before inserting "c", so "b" is the
// least recently used entry and gets evicted. The later lookup of "b" misses.
