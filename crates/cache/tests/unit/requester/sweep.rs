//! Sweep tests.
//!
//! Drives each engine with every word of the 256 KiB counting image, in order
//! and in a seeded random order. For every access the value must be the word
//! index, and the backing store must be read once exactly when the requester
//! missed and inspection predicted an L2 miss.

use l2cache_core::FillEngine;
use l2cache_core::requester::Minicache;
use l2cache_core::store::{FlatMemory, ReadCounter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use crate::common::harness::{IMAGE_WORDS, direct_mapped, two_way, word_addr};

fn sweep<E: FillEngine>(
    engine: &mut E,
    order: impl IntoIterator<Item = u32>,
    reads: impl Fn(&E) -> u64,
) -> Minicache {
    let mut mini = Minicache::default();
    for word in order {
        let address = word_addr(word);
        let predicted_miss = !engine.inspect(address).is_hit();
        let before = reads(engine);
        let misses = mini.misses();

        assert_eq!(mini.read_u32(&mut *engine, address).unwrap(), word);

        let filled = mini.misses() != misses;
        let expected = u64::from(filled && predicted_miss);
        assert_eq!(reads(engine) - before, expected, "word {word}");
    }
    mini
}

fn random_order(seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..IMAGE_WORDS)
        .map(|_| rng.random_range(0..IMAGE_WORDS as u32))
        .collect()
}

fn store_reads(store: &ReadCounter<FlatMemory>) -> u64 {
    store.reads()
}

/// A sequential sweep misses once per line and hits on the remaining windows.
#[rstest]
#[case::direct_mapped(false)]
#[case::two_way(true)]
fn sequential_sweep(#[case] associative: bool) {
    let words = IMAGE_WORDS as u32;
    let (reads, fills) = if associative {
        let mut cache = two_way();
        let mini = sweep(&mut cache, 0..words, |c| store_reads(c.store()));
        (cache.store().reads(), mini.misses())
    } else {
        let mut cache = direct_mapped();
        let mini = sweep(&mut cache, 0..words, |c| store_reads(c.store()));
        (cache.store().reads(), mini.misses())
    };

    // 256 KiB in 256-byte lines, 32-byte windows.
    assert_eq!(reads, 1024);
    assert_eq!(fills, 8192);
}

#[rstest]
#[case::direct_mapped(false, 1)]
#[case::two_way(true, 1)]
#[case::direct_mapped_other_seed(false, 0xC0FFEE)]
#[case::two_way_other_seed(true, 0xC0FFEE)]
fn random_sweep(#[case] associative: bool, #[case] seed: u64) {
    let order = random_order(seed);
    if associative {
        let mut cache = two_way();
        let _ = sweep(&mut cache, order, |c| store_reads(c.store()));
        if cfg!(feature = "stats") {
            assert_eq!(cache.stats().miss_count, cache.store().reads());
        }
    } else {
        let mut cache = direct_mapped();
        let _ = sweep(&mut cache, order, |c| store_reads(c.store()));
        if cfg!(feature = "stats") {
            assert_eq!(cache.stats().miss_count, cache.store().reads());
        }
    }
}

/// On a working set that fits two ways but not one, the two-way engine reads less.
#[test]
fn two_way_beats_direct_mapped_on_ping_pong() {
    let stride = 16 * 1024 / 4;
    let order: Vec<u32> = (0..64).flat_map(|i| [i * 8, i * 8 + stride]).collect();

    let mut dm = direct_mapped();
    let _ = sweep(&mut dm, order.iter().copied().cycle().take(512), |c| {
        store_reads(c.store())
    });
    let mut tw = two_way();
    let _ = sweep(&mut tw, order.iter().copied().cycle().take(512), |c| {
        store_reads(c.store())
    });

    assert!(tw.store().reads() < dm.store().reads());
}
