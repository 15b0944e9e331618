//! Address decomposition tests.
//!
//! Verifies geometry validation and the tag/index/offset split, including the
//! degenerate case where line and index bits cover the whole address.

use l2cache_core::CacheError;
use l2cache_core::common::{AddressFields, CacheGeometry};
use proptest::prelude::*;
use rstest::rstest;

use crate::common::harness::geometry;

#[test]
fn fixture_geometry_bits() {
    let g = geometry();
    assert_eq!(g.line_bits(), 8);
    assert_eq!(g.index_bits(), 6);
    assert_eq!(g.tag_bits(), 18);
    assert_eq!(g.way_bytes(), 16 * 1024);
}

/// Word 65 of the image (0x4000_0104) lands at index 1, offset 4.
#[test]
fn decompose_known_address() {
    let fields = geometry().decompose(0x4000_0104);
    assert_eq!(
        fields,
        AddressFields {
            tag: 0x4000_0000 >> 14,
            index: 1,
            offset: 4,
        }
    );
}

#[test]
fn addresses_one_way_apart_share_index_not_tag() {
    let g = geometry();
    let a = g.decompose(0x4000_0010);
    let b = g.decompose(0x4000_0010 + 16 * 1024);
    assert_eq!(a.index, b.index);
    assert_eq!(a.offset, b.offset);
    assert_eq!(b.tag, a.tag + 1);
}

#[test]
fn line_base_and_fill_window() {
    let g = geometry();
    assert_eq!(g.line_base(0x4000_01ff), 0x4000_0100);
    assert_eq!(CacheGeometry::fill_request_address(0x4000_01ff), 0x4000_01e0);
    assert_eq!(CacheGeometry::fill_request_address(0x4000_0100), 0x4000_0100);
}

/// Line and index bits summing to 32 leave no tag bits; every tag is zero.
#[test]
fn full_width_geometry_has_zero_tag() {
    let g = CacheGeometry::new(1 << 27, 32).unwrap();
    assert_eq!(g.tag_bits(), 0);
    let fields = g.decompose(0xFFFF_FFFF);
    assert_eq!(fields.tag, 0);
    assert_eq!(fields.index, (1 << 27) - 1);
    assert_eq!(fields.offset, 31);
    assert_eq!(g.compose(fields), 0xFFFF_FFFF);
}

#[rstest]
#[case(64, 255)]
#[case(64, 0)]
#[case(100, 256)]
#[case(0, 256)]
fn rejects_non_power_of_two(#[case] line_count: u32, #[case] line_size: u32) {
    assert!(matches!(
        CacheGeometry::new(line_count, line_size),
        Err(CacheError::NotPowerOfTwo { .. })
    ));
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(16)]
fn rejects_lines_below_fill_window(#[case] line_size: u32) {
    assert!(matches!(
        CacheGeometry::new(64, line_size),
        Err(CacheError::LineTooSmall { min: 32, .. })
    ));
}

#[test]
fn rejects_line_above_two_pow_thirty() {
    assert!(matches!(
        CacheGeometry::new(1, 1 << 31),
        Err(CacheError::LineTooLarge { max_log2: 30, .. })
    ));
    assert!(CacheGeometry::new(1, 1 << 30).is_ok());
}

#[test]
fn rejects_bits_beyond_address_width() {
    let err = CacheGeometry::new(1 << 28, 32).unwrap_err();
    assert!(matches!(
        err,
        CacheError::AddressSpaceExceeded {
            line_bits: 5,
            index_bits: 28,
        }
    ));
}

proptest! {
    /// Decompose then compose is the identity for every valid geometry.
    #[test]
    fn compose_inverts_decompose(
        address in any::<u32>(),
        line_log2 in 5u32..=12,
        index_log2 in 0u32..=12,
    ) {
        let g = CacheGeometry::new(1 << index_log2, 1 << line_log2).unwrap();
        let fields = g.decompose(address);
        prop_assert!(fields.offset < g.line_size_bytes());
        prop_assert!(fields.index < g.line_count());
        prop_assert_eq!(g.compose(fields), address);
        prop_assert_eq!(g.line_base(address) + fields.offset, address);
    }
}
