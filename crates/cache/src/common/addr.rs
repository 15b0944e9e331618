//! Cache Geometry and Address Decomposition.
//!
//! This module splits 32-bit backing-store addresses into cache fields. It provides:
//! 1. **Geometry:** A validated, immutable description of line size and line count.
//! 2. **Decomposition:** Tag, index and in-line offset extraction for a faulting address.
//! 3. **Alignment Helpers:** Line base and fill-window base for a given address.
//!
//! Field layout, low to high:
//!
//! ```text
//!  31                                                   0
//!  | tag (remaining bits) | index (index_bits) | offset (line_bits) |
//! ```

use serde::Serialize;

use super::constants::{FILL_WINDOW_MASK, MAX_LINE_SIZE_LOG2, MIN_LINE_SIZE_BYTES};
use super::error::CacheError;

/// The three fields a faulting address is split into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AddressFields {
    /// Upper address bits identifying which line occupies an index.
    pub tag: u32,
    /// Entry of the tag and data tables selected by the address.
    pub index: u32,
    /// Byte position inside the selected line.
    pub offset: u32,
}

/// Validated cache geometry.
///
/// Construction enforces every setup invariant, so holding a `CacheGeometry`
/// means the line size is a power of two of at least one fill window, the line
/// count is a power of two, and tag/index/offset fit in 32 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CacheGeometry {
    line_count: u32,
    line_size_bytes: u32,
    index_bits: u32,
    line_bits: u32,
}

impl CacheGeometry {
    /// Validates a line count and line size.
    ///
    /// # Arguments
    ///
    /// * `line_count` - Number of cache indices; must be a power of two.
    /// * `line_size_bytes` - Bytes fetched per miss; power of two, at least 32.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`CacheError`]. No value is
    /// ever rounded or clamped.
    pub fn new(line_count: u32, line_size_bytes: u32) -> Result<Self, CacheError> {
        if !line_size_bytes.is_power_of_two() {
            return Err(CacheError::NotPowerOfTwo {
                field: "line_size_bytes",
                value: line_size_bytes,
            });
        }
        if line_size_bytes < MIN_LINE_SIZE_BYTES {
            return Err(CacheError::LineTooSmall {
                value: line_size_bytes,
                min: MIN_LINE_SIZE_BYTES,
            });
        }
        let line_bits = line_size_bytes.trailing_zeros();
        if line_bits > MAX_LINE_SIZE_LOG2 {
            return Err(CacheError::LineTooLarge {
                value: line_size_bytes,
                max_log2: MAX_LINE_SIZE_LOG2,
            });
        }

        if !line_count.is_power_of_two() {
            return Err(CacheError::NotPowerOfTwo {
                field: "line_count",
                value: line_count,
            });
        }
        let index_bits = line_count.trailing_zeros();
        if line_bits + index_bits > u32::BITS {
            return Err(CacheError::AddressSpaceExceeded {
                line_bits,
                index_bits,
            });
        }

        Ok(Self {
            line_count,
            line_size_bytes,
            index_bits,
            line_bits,
        })
    }

    /// Number of cache indices.
    #[inline(always)]
    pub const fn line_count(&self) -> u32 {
        self.line_count
    }

    /// Line (slot) size in bytes.
    #[inline(always)]
    pub const fn line_size_bytes(&self) -> u32 {
        self.line_size_bytes
    }

    /// Line size as a `usize`, for slicing slot buffers.
    #[inline(always)]
    pub const fn line_bytes(&self) -> usize {
        self.line_size_bytes as usize
    }

    /// `log2(line_count)`.
    #[inline(always)]
    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// `log2(line_size_bytes)`.
    #[inline(always)]
    pub const fn line_bits(&self) -> u32 {
        self.line_bits
    }

    /// Number of address bits left for the tag.
    pub const fn tag_bits(&self) -> u32 {
        u32::BITS - self.line_bits - self.index_bits
    }

    /// Bytes of cached data held per way (`line_count * line_size_bytes`).
    ///
    /// This is also the address spacing at which two addresses collide on the
    /// same index.
    pub const fn way_bytes(&self) -> usize {
        self.line_count as usize * self.line_size_bytes as usize
    }

    /// Splits `address` into tag, index and offset.
    #[inline(always)]
    pub const fn decompose(&self, address: u32) -> AddressFields {
        let offset = address & (self.line_size_bytes - 1);
        let index = (address >> self.line_bits) & (self.line_count - 1);
        let tag = match address.checked_shr(self.line_bits + self.index_bits) {
            Some(tag) => tag,
            None => 0,
        };
        AddressFields { tag, index, offset }
    }

    /// Rebuilds the address a set of fields was decomposed from.
    pub const fn compose(&self, fields: AddressFields) -> u32 {
        let tag = match fields.tag.checked_shl(self.line_bits + self.index_bits) {
            Some(tag) => tag,
            None => 0,
        };
        tag | (fields.index << self.line_bits) | fields.offset
    }

    /// First address of the line containing `address`.
    #[inline(always)]
    pub const fn line_base(&self, address: u32) -> u32 {
        address & !(self.line_size_bytes - 1)
    }

    /// First address of the 32-byte fill window containing `address`.
    #[inline(always)]
    pub const fn fill_request_address(address: u32) -> u32 {
        address & FILL_WINDOW_MASK
    }
}
