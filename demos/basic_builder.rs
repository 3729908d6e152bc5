use tallycache::builder::{CacheBuilder, CacheConfig};

fn main() {
    let config = match CacheConfig::from_json(r#"{"policy": "lfu", "capacity": 3}"#) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bad config: {err}");
            return;
        },
    };

    let mut cache = CacheBuilder::from_config::<u64, String>(&config);
    for id in 0..3 {
        cache.insert(id, format!("user-{id}"));
    }
    cache.get(&0);
    cache.get(&1);
    cache.insert(3, "user-3".to_string());

    println!("policy: {}", cache.policy());
    println!("contains 2? {}", cache.contains(&2));
    println!("hit ratio: {}/{}", cache.hits(), cache.hits() + cache.misses());

    if let Err(err) = CacheConfig::from_json(r#"{"capacity": -5}"#) {
        println!("rejected: {err}");
    }
}

// Expected output:
// policy: lfu
// contains 2? false
// hit ratio: 2/2
// rejected: capacity must be a non-negative integer, got -5
