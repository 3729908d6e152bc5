use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tallycache::policy::lru::LruCache;

fn filled(capacity: u64) -> LruCache<u64, u64> {
    let mut cache = LruCache::new(capacity as usize);
    for i in 0..capacity {
        cache.insert(i, i);
    }
    cache
}

fn bench_lru_insert_get(c: &mut Criterion) {
    c.bench_function("lru_insert_get", |b| {
        b.iter_batched(
            || filled(1024),
            |mut cache| {
                for i in 0..1024u64 {
                    cache.insert(std::hint::black_box(i + 10_000), i);
                    let _ = std::hint::black_box(cache.get(&std::hint::black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lru_pop_lru(c: &mut Criterion) {
    c.bench_function("lru_pop_lru", |b| {
        b.iter_batched(
            || filled(1024),
            |mut cache| {
                for _ in 0..1024u64 {
                    let _ = std::hint::black_box(cache.pop_lru());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lru_eviction_churn(c: &mut Criterion) {
    c.bench_function("lru_eviction_churn", |b| {
        b.iter_batched(
            || filled(1024),
            |mut cache| {
                for i in 0..4096u64 {
                    cache.insert(std::hint::black_box(10_000 + i), i);
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lru_random_hotset(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_random");
    group.throughput(Throughput::Elements(4096));
    group.bench_function("get_or_insert_80_20", |b| {
        b.iter_batched(
            || {
                let mut rng = SmallRng::seed_from_u64(0x5EED);
                let keys: Vec<u64> = (0..4096)
                    .map(|_| {
                        if rng.random_bool(0.8) {
                            rng.random_range(0..256)
                        } else {
                            rng.random_range(256..16_384)
                        }
                    })
                    .collect();
                (filled(1024), keys)
            },
            |(mut cache, keys)| {
                for key in keys {
                    if cache.get(&key).is_none() {
                        cache.insert(key, key);
                    }
                }
                std::hint::black_box(cache.info())
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lru_to_json(c: &mut Criterion) {
    let cache = filled(1024);
    c.bench_function("lru_to_json_1024", |b| {
        b.iter(|| std::hint::black_box(cache.to_json(0)))
    });
}

criterion_group!(
    benches,
    bench_lru_insert_get,
    bench_lru_pop_lru,
    bench_lru_eviction_churn,
    bench_lru_random_hotset,
    bench_lru_to_json
);
criterion_main!(benches);
