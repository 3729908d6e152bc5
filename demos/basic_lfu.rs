use tallycache::policy::lfu::LfuCache;

fn main() {
    let mut cache: LfuCache<&str, String> = LfuCache::new(2);

    cache.insert("a", "alpha".to_string());
    cache.insert("b", "beta".to_string());

    cache.get(&"a");
    cache.insert("c", "gamma".to_string());

    println!("contains a? {}", cache.contains(&"a"));
    println!("contains b? {}", cache.contains(&"b"));
    println!("frequency of a: {:?}", cache.frequency(&"a"));
    println!("info: {:?}", cache.info());
}

// Expected output:
// contains a? true
// contains b? false
// frequency of a: Some(2)
// info: LfuInfo { hits: 1, misses: 0, capacity: 2, current_size: 2, least_frequency: Some(1) }
//
// Explanation: capacity=2; "a" is read before inserting "c", so "b" is the
// only frequency-1 entry left to evict.
