//! Two-Way Set-Associative Read-Only Cache.
//!
//! Every index owns two tagged slots and a single recency bit, `last_used`,
//! naming the way most recently touched by a hit or a fill. A miss evicts the
//! other way.
//!
//! With exactly two ways this one bit is a complete recency order: two
//! addresses colliding on an index can alternate forever without evicting each
//! other, and a third colliding address always replaces the one touched
//! longest ago.
//!
//! # Layout
//!
//! ```text
//!   Index || Tag[0] | Tag[1] | Last || Data[0] | Data[1]
//!   ------------------------------------------------------
//!      0  ||  ...   |  ...   | ...  ||   ...   |   ...
//!     ... ||  ...   |  ...   | ...  ||   ...   |   ...
//! ```
//!
//! Tags and recency live in one record per index; the two data slots of an
//! index are adjacent in the arena.

use std::ops::Range;

use tracing::{debug, trace, warn};

use super::inspect::{AddressInfo, EntrySnapshot, FillPlan, Prediction, SlotLocation};
use super::{Fill, FillEngine, Outcome, Way};
use crate::common::addr::CacheGeometry;
use crate::common::constants::{INVALID_TAG, TWO_WAY_WAYS};
use crate::common::error::CacheError;
use crate::config::{CacheKind, required_buffer_bytes};
use crate::stats::CacheStats;
use crate::store::BackingStore;

/// Tag record for one index of the two-way cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TwoWayEntry {
    /// Tag per way, [`INVALID_TAG`] when the way was never filled.
    pub tags: [u32; TWO_WAY_WAYS],
    /// Way most recently touched by a hit or a fill.
    pub last_used: Way,
}

impl TwoWayEntry {
    /// Entry state right after setup.
    pub const INVALID: Self = Self {
        tags: [INVALID_TAG; TWO_WAY_WAYS],
        last_used: Way::Zero,
    };

    /// Way holding `tag`, if any.
    #[inline(always)]
    pub const fn lookup(&self, tag: u32) -> Option<Way> {
        if self.tags[0] == tag {
            Some(Way::Zero)
        } else if self.tags[1] == tag {
            Some(Way::One)
        } else {
            None
        }
    }

    /// Way a miss at this entry evicts: the one not most recently used.
    #[inline(always)]
    pub const fn victim(&self) -> Way {
        self.last_used.other()
    }

    /// Returns `true` if both ways claim the same valid line.
    const fn is_duplicated(&self) -> bool {
        self.tags[0] == self.tags[1] && self.tags[0] != INVALID_TAG
    }
}

/// Arena byte range of one way's slot.
#[inline(always)]
fn slot_range(geometry: &CacheGeometry, index: u32, way: Way) -> Range<usize> {
    let line = geometry.line_bytes();
    let start = (index as usize * TWO_WAY_WAYS + way.index()) * line;
    start..start + line
}

/// Two-way set-associative cache over backing store `S`.
#[derive(Debug)]
pub struct TwoWayCache<S> {
    geometry: CacheGeometry,
    entries: Vec<TwoWayEntry>,
    data: Vec<u8>,
    store: S,
    stats: CacheStats,
}

impl<S: BackingStore> TwoWayCache<S> {
    /// Creates a cache with every tag invalid and every `last_used` at way 0.
    ///
    /// # Arguments
    ///
    /// * `geometry` - Validated line count and slot size.
    /// * `store` - Reader invoked on every miss.
    pub fn new(geometry: CacheGeometry, store: S) -> Self {
        Self::build(geometry, vec![0; geometry.way_bytes() * TWO_WAY_WAYS], store)
    }

    /// Creates a cache whose data table lives in `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::BufferTooSmall`] if `buffer` is shorter than
    /// `line_count * 2 * (line_size_bytes + 8)` bytes.
    pub fn with_buffer(
        geometry: CacheGeometry,
        mut buffer: Vec<u8>,
        store: S,
    ) -> Result<Self, CacheError> {
        let required = required_buffer_bytes(
            CacheKind::TwoWay,
            geometry.line_count(),
            geometry.line_size_bytes(),
        );
        if buffer.len() < required {
            return Err(CacheError::BufferTooSmall {
                required,
                actual: buffer.len(),
            });
        }
        buffer.truncate(geometry.way_bytes() * TWO_WAY_WAYS);
        Ok(Self::build(geometry, buffer, store))
    }

    fn build(geometry: CacheGeometry, data: Vec<u8>, store: S) -> Self {
        debug!(
            line_size_bytes = geometry.line_size_bytes(),
            line_bits = geometry.line_bits(),
            index_bits = geometry.index_bits(),
            cache_bytes = data.len(),
            entry_bytes = TWO_WAY_WAYS * geometry.line_bytes() + size_of::<TwoWayEntry>(),
            "2-way set associative cache (read-only)"
        );
        Self {
            geometry,
            entries: vec![TwoWayEntry::INVALID; geometry.line_count() as usize],
            data,
            store,
            stats: CacheStats::default(),
        }
    }

    /// Tag record at `index`, or `None` if the index is out of range.
    pub fn entry(&self, index: u32) -> Option<TwoWayEntry> {
        self.entries.get(index as usize).copied()
    }

    /// Invalidates both ways at `index` and sets its recency bit.
    ///
    /// Choosing `last_used` decides which way the next miss at this index
    /// fills: the opposite one.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::IndexOutOfRange`] for an index beyond the table.
    pub fn reset_entry(&mut self, index: u32, last_used: Way) -> Result<(), CacheError> {
        let line_count = self.geometry.line_count();
        let entry = self
            .entries
            .get_mut(index as usize)
            .ok_or(CacheError::IndexOutOfRange { index, line_count })?;
        *entry = TwoWayEntry {
            last_used,
            ..TwoWayEntry::INVALID
        };
        Ok(())
    }

    /// Invalidates both ways at `index` and returns its recency bit to way 0.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::IndexOutOfRange`] for an index beyond the table.
    pub fn invalidate_index(&mut self, index: u32) -> Result<(), CacheError> {
        self.reset_entry(index, Way::Zero)
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The data arena.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl<S: BackingStore> FillEngine for TwoWayCache<S> {
    fn kind(&self) -> CacheKind {
        CacheKind::TwoWay
    }

    fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Services one fill request.
    ///
    /// A hit at way `k` sets `last_used = k`. A miss refills way
    /// `1 - last_used`, then records its tag and sets `last_used` to it.
    fn service_fill(&mut self, address: u32) -> Result<Fill<'_>, CacheError> {
        let fields = self.geometry.decompose(address);
        let index = fields.index;
        let entry = &mut self.entries[index as usize];
        debug_assert!(!entry.is_duplicated(), "two ways hold the same tag at index {index}");

        let outcome = match entry.lookup(fields.tag) {
            Some(way) => {
                self.stats.record_hit();
                entry.last_used = way;
                trace!(address, index, way = way.index(), "l2 hit");
                Outcome::Hit { way }
            }
            None => {
                self.stats.record_miss();
                let way = entry.victim();
                let line_base = self.geometry.line_base(address);
                trace!(address, index, evict = way.index(), line_base, "l2 miss");

                entry.tags[way.index()] = INVALID_TAG;
                let slot = slot_range(&self.geometry, index, way);
                if let Err(source) = self.store.read(&mut self.data[slot], line_base) {
                    warn!(address, line_base, error = %source, "backing-store read failed");
                    return Err(CacheError::Fill { address, source });
                }
                entry.tags[way.index()] = fields.tag;
                entry.last_used = way;
                Outcome::Miss { way }
            }
        };

        Ok(Fill {
            outcome,
            fields,
            line: &self.data[slot_range(&self.geometry, index, outcome.way())],
        })
    }

    fn inspect(&self, address: u32) -> AddressInfo {
        let fields = self.geometry.decompose(address);
        let entry = self.entries[fields.index as usize];
        let location = |way: Way| SlotLocation {
            index: fields.index,
            way,
            arena_offset: slot_range(&self.geometry, fields.index, way).start,
        };

        let prediction = match entry.lookup(fields.tag) {
            Some(way) => Prediction::Hit { way },
            None => {
                let evict = entry.victim();
                Prediction::Miss {
                    evict,
                    plan: FillPlan {
                        src: self.geometry.line_base(address),
                        dst: location(evict),
                        bytes: self.geometry.line_bytes(),
                    },
                }
            }
        };

        AddressInfo {
            address,
            fill_request_address: CacheGeometry::fill_request_address(address),
            fields,
            entry: EntrySnapshot::TwoWay {
                tags: entry.tags,
                last_used: entry.last_used,
            },
            prediction,
            cache_offset: location(prediction.way()).arena_offset + fields.offset as usize,
        }
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn invalidate_all(&mut self) {
        self.entries.fill(TwoWayEntry::INVALID);
    }
}
