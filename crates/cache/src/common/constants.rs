//! Cache-wide Constants.
//!
//! This module defines the constants shared by both cache variants. It includes:
//! 1. **Tag Constants:** The sentinel marking a never-filled tag entry.
//! 2. **Fill Constants:** The size and alignment of a requester fill window.
//! 3. **Geometry Limits:** Bounds on line size enforced at setup.
//! 4. **Layout Constants:** Per-entry bookkeeping overhead used for buffer sizing.

/// Tag value meaning "invalid / never filled".
///
/// Every computed tag is strictly smaller than this value because a line is at
/// least [`MIN_LINE_SIZE_BYTES`] wide, so at least five address bits are shifted
/// out before the tag is formed.
pub const INVALID_TAG: u32 = 0xFFFF_FFFF;

/// Size in bytes of a single fill request issued by the requester.
pub const FILL_WINDOW_BYTES: usize = 32;

/// Mask that aligns an address down to its fill window.
pub const FILL_WINDOW_MASK: u32 = !(FILL_WINDOW_BYTES as u32 - 1);

/// Smallest permitted cache line size in bytes (one fill window).
pub const MIN_LINE_SIZE_BYTES: u32 = FILL_WINDOW_BYTES as u32;

/// Largest permitted line size, as log2 of the byte count.
pub const MAX_LINE_SIZE_LOG2: u32 = 30;

/// Number of ways held by each entry of the set-associative variant.
pub const TWO_WAY_WAYS: usize = 2;

/// Bytes of tag storage per entry of the direct-mapped variant.
pub const DIRECT_MAPPED_TAG_BYTES: usize = 4;

/// Bytes of tag and recency storage per way of the two-way variant.
///
/// Two tags, the recency word and one padding word per entry, spread across
/// both ways.
pub const TWO_WAY_TAG_BYTES_PER_WAY: usize = 8;
