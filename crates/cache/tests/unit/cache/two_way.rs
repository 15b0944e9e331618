//! Two-way engine tests.
//!
//! Verifies slot layout, the one-bit recency policy on a scripted collision
//! sequence, and that two colliding lines coexist while a third evicts the
//! older one.

use l2cache_core::cache::{Outcome, TwoWayCache, TwoWayEntry, Way};
use l2cache_core::common::INVALID_TAG;
use l2cache_core::common::CacheGeometry;
use l2cache_core::store::{FlatMemory, ReadCounter};
use l2cache_core::{BackingStoreError, CacheError, FillEngine};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{COLLISION_STRIDE, IMAGE_BASE, geometry, le_word, two_way, word_addr};
use crate::common::mocks::store::{MockStore, counting_fill};

/// Spacing, in words, between colliding addresses of the fixture.
const STRIDE_WORDS: u32 = COLLISION_STRIDE / 4;

#[test]
fn entries_start_invalid_with_way_zero_recent() {
    let cache = two_way();
    assert_eq!(cache.entry(0), Some(TwoWayEntry::INVALID));
    assert_eq!(cache.entry(63).unwrap().last_used, Way::Zero);
    assert_eq!(cache.entry(64), None);
    assert_eq!(cache.data().len(), 2 * 64 * 256);
}

/// With `last_used` at way 0 after setup, the first miss fills way 1.
#[test]
fn first_miss_after_setup_fills_way_one() {
    let mut cache = two_way();
    let fill = cache.service_fill(word_addr(0)).unwrap();
    assert_eq!(fill.outcome, Outcome::Miss { way: Way::One });

    let entry = cache.entry(0).unwrap();
    assert_eq!(entry.tags, [INVALID_TAG, geometry().decompose(word_addr(0)).tag]);
    assert_eq!(entry.last_used, Way::One);
    // Way 1 of index 0 is the second slot in the arena.
    assert_eq!(le_word(cache.data(), 256), 0);
}

/// Scripted collision sequence on one index:
///
/// | access | outcome   | tags     | last |
/// |--------|-----------|----------|------|
/// | A      | miss -> 0 | [A, -]   | 0    |
/// | B      | miss -> 1 | [A, B]   | 1    |
/// | A      | hit 0     | [A, B]   | 0    |
/// | A      | hit 0     | [A, B]   | 0    |
/// | B      | hit 1     | [A, B]   | 1    |
/// | A      | hit 0     | [A, B]   | 0    |
/// | C      | miss -> 1 | [A, C]   | 1    |
#[test]
fn recency_bit_follows_collision_script() {
    let mut cache = two_way();
    let index = 4;
    cache.reset_entry(index, Way::One).unwrap();

    let base_word = index * 64;
    let a = word_addr(base_word);
    let b = word_addr(base_word + STRIDE_WORDS);
    let c = word_addr(base_word + 2 * STRIDE_WORDS);
    let g = geometry();

    let script = [
        (a, Outcome::Miss { way: Way::Zero }, base_word),
        (b, Outcome::Miss { way: Way::One }, base_word + STRIDE_WORDS),
        (a, Outcome::Hit { way: Way::Zero }, base_word),
        (a, Outcome::Hit { way: Way::Zero }, base_word),
        (b, Outcome::Hit { way: Way::One }, base_word + STRIDE_WORDS),
        (a, Outcome::Hit { way: Way::Zero }, base_word),
        (c, Outcome::Miss { way: Way::One }, base_word + 2 * STRIDE_WORDS),
    ];

    for (step, (address, expected, word)) in script.into_iter().enumerate() {
        let fill = cache.service_fill(address).unwrap();
        assert_eq!(fill.outcome, expected, "step {step}");
        assert_eq!(le_word(fill.window(), 0), word, "step {step}");
        assert_eq!(cache.entry(index).unwrap().last_used, expected.way(), "step {step}");
    }

    let entry = cache.entry(index).unwrap();
    assert_eq!(entry.tags, [g.decompose(a).tag, g.decompose(c).tag]);
    assert_eq!(cache.store().reads(), 3);
}

/// Two colliding lines alternate without further reads.
#[test]
fn two_colliding_lines_coexist() {
    let mut cache = two_way();
    let a = word_addr(0);
    let b = word_addr(STRIDE_WORDS);

    for _ in 0..10 {
        let _ = cache.service_fill(a).unwrap();
        let _ = cache.service_fill(b).unwrap();
    }
    assert_eq!(cache.store().reads(), 2);
}

/// A third colliding line replaces the least recently touched of the two.
#[test]
fn third_line_evicts_least_recent() {
    let mut cache = two_way();
    let g = geometry();
    let a = word_addr(0);
    let b = word_addr(STRIDE_WORDS);
    let c = word_addr(2 * STRIDE_WORDS);

    let _ = cache.service_fill(a).unwrap();
    let _ = cache.service_fill(b).unwrap();
    let _ = cache.service_fill(a).unwrap();
    let _ = cache.service_fill(c).unwrap();

    assert!(cache.inspect(a).is_hit());
    assert!(!cache.inspect(b).is_hit());
    assert!(cache.inspect(c).is_hit());
    let tags = cache.entry(0).unwrap().tags;
    assert!(tags.contains(&g.decompose(a).tag));
    assert!(tags.contains(&g.decompose(c).tag));
}

#[test]
fn failed_read_invalidates_victim_only() {
    let mut store = MockStore::new();
    let mut seq = mockall::Sequence::new();
    let _ = store
        .expect_read()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|dst, src| {
            counting_fill(dst, src, IMAGE_BASE);
            Ok(())
        });
    let _ = store
        .expect_read()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(BackingStoreError::Device("ecc".into())));

    let mut cache = TwoWayCache::new(geometry(), store);
    let a = word_addr(0);
    let b = word_addr(STRIDE_WORDS);
    let _ = cache.service_fill(a).unwrap();
    assert!(matches!(cache.service_fill(b), Err(CacheError::Fill { .. })));

    let entry = cache.entry(0).unwrap();
    assert_eq!(entry.tags, [INVALID_TAG, geometry().decompose(a).tag]);
    assert_eq!(entry.last_used, Way::One);
    assert!(cache.inspect(a).is_hit());
}

#[test]
fn reset_entry_selects_next_victim() {
    let mut cache = two_way();
    let _ = cache.service_fill(word_addr(0)).unwrap();

    cache.reset_entry(0, Way::One).unwrap();
    assert_eq!(
        cache.entry(0),
        Some(TwoWayEntry {
            tags: [INVALID_TAG; 2],
            last_used: Way::One,
        })
    );
    assert_eq!(cache.service_fill(word_addr(0)).unwrap().outcome, Outcome::Miss { way: Way::Zero });

    cache.invalidate_index(0).unwrap();
    assert_eq!(cache.entry(0), Some(TwoWayEntry::INVALID));
    assert!(matches!(
        cache.reset_entry(99, Way::Zero),
        Err(CacheError::IndexOutOfRange { index: 99, .. })
    ));
}

#[test]
fn invalidate_all_resets_every_entry() {
    let mut cache = two_way();
    for i in 0..4 {
        let _ = cache.service_fill(word_addr(i * STRIDE_WORDS)).unwrap();
    }
    cache.invalidate_all();
    assert!((0..64).all(|i| cache.entry(i) == Some(TwoWayEntry::INVALID)));
}

#[test]
fn entry_helpers() {
    let entry = TwoWayEntry {
        tags: [7, 9],
        last_used: Way::Zero,
    };
    assert_eq!(entry.lookup(9), Some(Way::One));
    assert_eq!(entry.lookup(INVALID_TAG), None);
    assert_eq!(entry.victim(), Way::One);
    assert_eq!(Way::from_index(1), Some(Way::One));
    assert_eq!(Way::from_index(2), None);
}

#[test]
fn with_buffer_requires_tag_overhead() {
    let store = FlatMemory::new(0, vec![]);
    let err = TwoWayCache::with_buffer(geometry(), vec![0; 2 * 64 * 256], store).unwrap_err();
    assert!(matches!(err, CacheError::BufferTooSmall { required: 33792, .. }));

    let cache =
        TwoWayCache::with_buffer(geometry(), vec![0; 33792], FlatMemory::new(0, vec![])).unwrap();
    assert_eq!(cache.data().len(), 2 * 64 * 256);
}

/// With a single index both ways hold any two lines; a third evicts the older one.
#[rstest]
#[case(32)]
#[case(256)]
fn single_index_cache_keeps_two_lines(#[case] line_size: u32) {
    let geometry = CacheGeometry::new(1, line_size).unwrap();
    assert_eq!(geometry.index_bits(), 0);
    let store = ReadCounter::new(FlatMemory::counting_words(IMAGE_BASE, 4096));
    let mut cache = TwoWayCache::new(geometry, store);

    let a = IMAGE_BASE;
    let b = IMAGE_BASE + line_size;
    let c = IMAGE_BASE + 2 * line_size;

    for _ in 0..4 {
        let _ = cache.service_fill(a).unwrap();
        let _ = cache.service_fill(b).unwrap();
    }
    assert_eq!(cache.store().reads(), 2);

    let fill = cache.service_fill(c).unwrap();
    assert_eq!(fill.outcome, Outcome::Miss { way: Way::One });
    assert_eq!(le_word(fill.window(), 0), 2 * line_size / 4);
    assert!(!cache.inspect(a).is_hit());
    assert!(cache.inspect(b).is_hit());
    assert_eq!(cache.entry(0).unwrap().last_used, Way::One);
}
