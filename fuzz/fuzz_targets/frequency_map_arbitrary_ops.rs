#![no_main]

use libfuzzer_sys::fuzz_target;
use tallycache::ds::FrequencyMap;

// Fuzz arbitrary operation sequences on FrequencyMap
//
// Random insert (at arbitrary frequencies), refresh, remove, pop_least and
// clear, validating the bucket chain and the tracked minimum after each op.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let mut freq: FrequencyMap<u32> = FrequencyMap::new();

    for chunk in data.chunks_exact(3) {
        let op = chunk[0] % 8;
        let handle = u32::from(chunk[1] % 64);
        let start = u64::from(chunk[2] % 16);

        match op {
            0 | 1 => {
                let fresh = !freq.contains(&handle);
                assert_eq!(freq.insert(handle, start), fresh);
            },
            2 | 3 => {
                let before = freq.frequency(&handle);
                let after = freq.refresh(&handle);
                assert_eq!(after, before.map(|f| f.saturating_add(1)));
            },
            4 => {
                let before = freq.frequency(&handle);
                assert_eq!(freq.remove(&handle), before);
            },
            5 => {
                let least = freq.least_frequency();
                let peeked = freq.peek_least().map(|(h, f)| (*h, f));
                let popped = freq.pop_least();
                assert_eq!(popped, peeked);
                assert_eq!(popped.map(|(_, f)| f), least);
            },
            6 => {
                let ascending: Vec<u64> = freq.frequencies().collect();
                assert!(ascending.windows(2).all(|w| w[0] < w[1]));
                assert_eq!(ascending.first().copied(), freq.least_frequency());
                let total: usize = ascending.iter().map(|&f| freq.bucket_len(f)).sum();
                assert_eq!(total, freq.len());
            },
            7 => freq.clear(),
            _ => unreachable!(),
        }

        freq.debug_validate_invariants();

        if freq.is_empty() {
            assert_eq!(freq.least_frequency(), None);
            assert_eq!(freq.bucket_count(), 0);
        }
    }
});
