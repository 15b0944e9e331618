//! Address inspection tests.
//!
//! Inspection must describe a fill without performing it: no reads, no stats,
//! no recency change. Its prediction must then match what the fill does.

use l2cache_core::cache::{
    AddressInfo, EntrySnapshot, FillPlan, Prediction, SlotLocation, Way,
};
use l2cache_core::common::INVALID_TAG;
use l2cache_core::FillEngine;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{COLLISION_STRIDE, IMAGE_BASE, direct_mapped, geometry, two_way, word_addr};

fn assert_side_effect_free<E: FillEngine>(engine: &E, address: u32) -> AddressInfo {
    let stats = *engine.stats();
    let first = engine.inspect(address);
    assert_eq!(engine.inspect(address), first);
    assert_eq!(*engine.stats(), stats);
    first
}

#[test]
fn direct_mapped_cold_inspection() {
    let cache = direct_mapped();
    let address = IMAGE_BASE + 0x1_2344;
    let info = assert_side_effect_free(&cache, address);

    assert_eq!(info.fill_request_address, IMAGE_BASE + 0x1_2340);
    assert_eq!(info.fields, geometry().decompose(address));
    assert_eq!(info.entry, EntrySnapshot::DirectMapped { tag: INVALID_TAG });
    assert_eq!(
        info.prediction,
        Prediction::Miss {
            evict: Way::Zero,
            plan: FillPlan {
                src: IMAGE_BASE + 0x1_2300,
                dst: SlotLocation {
                    index: 0x23,
                    way: Way::Zero,
                    arena_offset: 0x23 * 256,
                },
                bytes: 256,
            },
        }
    );
    assert_eq!(info.cache_offset, 0x23 * 256 + 0x44);
    assert_eq!(cache.store().reads(), 0);
}

#[test]
fn two_way_inspection_reports_victim_and_recency() {
    let mut cache = two_way();
    let a = word_addr(0);
    let _ = cache.service_fill(a).unwrap();

    let b = a + COLLISION_STRIDE;
    let info = assert_side_effect_free(&cache, b);
    assert_eq!(
        info.entry,
        EntrySnapshot::TwoWay {
            tags: [INVALID_TAG, geometry().decompose(a).tag],
            last_used: Way::One,
        }
    );
    let plan = info.fill_plan().unwrap();
    assert_eq!(plan.dst.way, Way::Zero);
    assert_eq!(plan.dst.arena_offset, 0);
    assert_eq!(plan.src, b);

    // Hitting `a` through inspect must not move the recency bit.
    assert!(cache.inspect(a).is_hit());
    assert_eq!(cache.entry(0).unwrap().last_used, Way::One);
    assert_eq!(cache.inspect(a).cache_offset, 256);
}

/// Whatever inspect predicts, the following fill does.
#[rstest]
#[case::direct_mapped(false)]
#[case::two_way(true)]
fn prediction_matches_fill(#[case] associative: bool) {
    let mut engine: Box<dyn FillEngine> = if associative {
        Box::new(two_way())
    } else {
        Box::new(direct_mapped())
    };

    let addresses = [0u32, 4, 64, 4096, 4100, 16 * 1024, 32 * 1024, 0, 16 * 1024, 48 * 1024, 4]
        .map(|offset| IMAGE_BASE + offset);
    for address in addresses {
        let info = engine.inspect(address);
        let fill = engine.service_fill(address).unwrap();
        assert_eq!(fill.outcome.is_hit(), info.is_hit(), "{address:#x}");
        assert_eq!(fill.outcome.way(), info.prediction.way(), "{address:#x}");
        assert_eq!(fill.fields, info.fields);
        assert!(engine.inspect(address).is_hit());
    }
}

#[test]
fn display_lists_fields_and_plan() {
    let cache = direct_mapped();
    let text = cache.inspect(IMAGE_BASE + 0x104).to_string();
    assert!(text.contains("Address:      0x40000104"));
    assert!(text.contains("Fill Request: 0x40000100"));
    assert!(text.contains("Entry Index:  1"));
    assert!(text.contains("Entry Tag:    invalid"));
    assert!(text.contains("[Miss] evict slot 0"));
    assert!(text.contains("read(0x100 <- 0x40000100, 256 bytes)"));
}

#[test]
fn inspection_serializes_to_json() {
    let cache = two_way();
    let value = serde_json::to_value(cache.inspect(IMAGE_BASE)).unwrap();
    assert_eq!(value["fields"]["index"], 0);
    assert_eq!(value["entry"]["TwoWay"]["last_used"], "Zero");
    assert_eq!(value["prediction"]["Miss"]["evict"], "One");
}
