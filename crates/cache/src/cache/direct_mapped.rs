//! Direct-Mapped Read-Only Cache.
//!
//! Every index owns one tag and one line-sized slot. A fill for an address
//! whose tag matches the entry is a hit; anything else replaces the slot with
//! the line containing the address.
//!
//! Layout: a tag table of `line_count` words and a data arena of
//! `line_count * line_size_bytes` bytes, both indexed by cache index.

use std::ops::Range;

use tracing::{debug, trace, warn};

use super::inspect::{AddressInfo, EntrySnapshot, FillPlan, Prediction, SlotLocation};
use super::{Fill, FillEngine, Outcome, Way};
use crate::common::addr::CacheGeometry;
use crate::common::constants::INVALID_TAG;
use crate::common::error::CacheError;
use crate::config::{CacheKind, required_buffer_bytes};
use crate::stats::CacheStats;
use crate::store::BackingStore;

/// Direct-mapped cache over backing store `S`.
#[derive(Debug)]
pub struct DirectMappedCache<S> {
    geometry: CacheGeometry,
    tags: Vec<u32>,
    data: Vec<u8>,
    store: S,
    stats: CacheStats,
}

impl<S: BackingStore> DirectMappedCache<S> {
    /// Creates a cache with every tag invalid.
    ///
    /// # Arguments
    ///
    /// * `geometry` - Validated line count and line size.
    /// * `store` - Reader invoked on every miss.
    pub fn new(geometry: CacheGeometry, store: S) -> Self {
        Self::build(geometry, vec![0; geometry.way_bytes()], store)
    }

    /// Creates a cache whose data table lives in `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::BufferTooSmall`] if `buffer` is shorter than
    /// `line_count * (line_size_bytes + 4)` bytes.
    pub fn with_buffer(
        geometry: CacheGeometry,
        mut buffer: Vec<u8>,
        store: S,
    ) -> Result<Self, CacheError> {
        let required = required_buffer_bytes(
            CacheKind::DirectMapped,
            geometry.line_count(),
            geometry.line_size_bytes(),
        );
        if buffer.len() < required {
            return Err(CacheError::BufferTooSmall {
                required,
                actual: buffer.len(),
            });
        }
        buffer.truncate(geometry.way_bytes());
        Ok(Self::build(geometry, buffer, store))
    }

    fn build(geometry: CacheGeometry, data: Vec<u8>, store: S) -> Self {
        debug!(
            line_size_bytes = geometry.line_size_bytes(),
            line_bits = geometry.line_bits(),
            index_bits = geometry.index_bits(),
            cache_bytes = data.len(),
            tag_table_bytes = geometry.line_count() as usize * size_of::<u32>(),
            "direct-mapped cache (read-only)"
        );
        Self {
            geometry,
            tags: vec![INVALID_TAG; geometry.line_count() as usize],
            data,
            store,
            stats: CacheStats::default(),
        }
    }

    /// Tag currently stored at `index`, or `None` if the index is out of range.
    pub fn tag(&self, index: u32) -> Option<u32> {
        self.tags.get(index as usize).copied()
    }

    /// Marks the entry at `index` invalid.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::IndexOutOfRange`] for an index beyond the table.
    pub fn invalidate_index(&mut self, index: u32) -> Result<(), CacheError> {
        let line_count = self.geometry.line_count();
        let tag = self
            .tags
            .get_mut(index as usize)
            .ok_or(CacheError::IndexOutOfRange { index, line_count })?;
        *tag = INVALID_TAG;
        Ok(())
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The data arena.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn slot_range(&self, index: u32) -> Range<usize> {
        let start = index as usize * self.geometry.line_bytes();
        start..start + self.geometry.line_bytes()
    }
}

impl<S: BackingStore> FillEngine for DirectMappedCache<S> {
    fn kind(&self) -> CacheKind {
        CacheKind::DirectMapped
    }

    fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Services one fill request.
    ///
    /// # Arguments
    ///
    /// * `address` - Faulting backing-store address.
    ///
    /// # Returns
    ///
    /// The slot now holding the line containing `address`.
    fn service_fill(&mut self, address: u32) -> Result<Fill<'_>, CacheError> {
        let fields = self.geometry.decompose(address);
        let index = fields.index as usize;
        let slot = self.slot_range(fields.index);

        let outcome = if self.tags[index] == fields.tag {
            self.stats.record_hit();
            trace!(address, index, "l2 hit");
            Outcome::Hit { way: Way::Zero }
        } else {
            self.stats.record_miss();
            let line_base = self.geometry.line_base(address);
            trace!(address, index, line_base, "l2 miss");

            // The slot is about to be overwritten; it must not claim the old line meanwhile.
            self.tags[index] = INVALID_TAG;
            if let Err(source) = self.store.read(&mut self.data[slot.clone()], line_base) {
                warn!(address, line_base, error = %source, "backing-store read failed");
                return Err(CacheError::Fill { address, source });
            }
            self.tags[index] = fields.tag;
            Outcome::Miss { way: Way::Zero }
        };

        Ok(Fill {
            outcome,
            fields,
            line: &self.data[slot],
        })
    }

    fn inspect(&self, address: u32) -> AddressInfo {
        let fields = self.geometry.decompose(address);
        let tag = self.tags[fields.index as usize];
        let slot = SlotLocation {
            index: fields.index,
            way: Way::Zero,
            arena_offset: self.slot_range(fields.index).start,
        };

        let prediction = if tag == fields.tag {
            Prediction::Hit { way: Way::Zero }
        } else {
            Prediction::Miss {
                evict: Way::Zero,
                plan: FillPlan {
                    src: self.geometry.line_base(address),
                    dst: slot,
                    bytes: self.geometry.line_bytes(),
                },
            }
        };

        AddressInfo {
            address,
            fill_request_address: CacheGeometry::fill_request_address(address),
            fields,
            entry: EntrySnapshot::DirectMapped { tag },
            prediction,
            cache_offset: slot.arena_offset + fields.offset as usize,
        }
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn invalidate_all(&mut self) {
        self.tags.fill(INVALID_TAG);
    }
}
