use tallycache::policy::lfu::LfuCache;
use tallycache::error::SnapshotError;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SnapshotError> {
    // RUST_LOG=tallycache=trace shows each eviction.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut cache: LfuCache<String, u32> = LfuCache::new(3);
    cache.insert("home".to_string(), 200);
    cache.insert("about".to_string(), 200);
    cache.insert_with_frequency("login".to_string(), 302, 4);
    cache.get(&"home".to_string());

    let json = cache.to_json(2)?;
    println!("{json}");

    let mut restored: LfuCache<String, u32> = LfuCache::new(2);
    restored.merge_json(&json)?;
    println!("restored: {:?}", restored.info());
    println!("about survived? {}", restored.contains(&"about".to_string()));

    Ok(())
}

// Expected output (after the pretty-printed snapshot):
// restored: LfuInfo { hits: 1, misses: 0, capacity: 2, current_size: 2, least_frequency: Some(2) }
// about survived? false
//
// Explanation: entries replay in eviction order (about, home, login) into a
// cache of capacity 2, so "about" is evicted when "login" arrives.
