//! Configuration for the L2 cache engine.
//!
//! This module defines the configuration consumed by cache setup. It provides:
//! 1. **Defaults:** The baseline geometry (64 lines of 256 bytes, direct-mapped).
//! 2. **Structures:** The deserializable [`CacheConfig`] request.
//! 3. **Enums:** The cache organisation ([`CacheKind`]).
//!
//! Configuration is supplied as JSON (e.g. by the CLI's `--config`) or built with
//! `CacheConfig::default()`. It is validated once, at setup, into a
//! [`CacheGeometry`]; nothing here can change after the engine starts.

use serde::{Deserialize, Serialize};

use crate::common::addr::CacheGeometry;
use crate::common::constants::{
    DIRECT_MAPPED_TAG_BYTES, TWO_WAY_TAG_BYTES_PER_WAY, TWO_WAY_WAYS,
};
use crate::common::error::CacheError;

/// Default configuration constants for the cache.
mod defaults {
    /// Default line size as log2 (256 bytes).
    pub const LINE_SIZE_LOG2: u32 = 8;

    /// Default line size in bytes.
    ///
    /// This is the number of bytes read from the backing store per miss. For
    /// the two-way cache it is the size of each way's slot.
    pub const LINE_SIZE_BYTES: u32 = 1 << LINE_SIZE_LOG2;

    /// Default number of cache indices.
    pub const LINE_COUNT: u32 = 64;
}

/// Cache organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    /// One slot per index; a miss always replaces it.
    #[default]
    #[serde(alias = "direct_map", alias = "DirectMapped")]
    DirectMapped,
    /// Two slots per index with a one-bit recency marker.
    #[serde(alias = "two_way_set_associative", alias = "TwoWay")]
    TwoWay,
}

impl CacheKind {
    /// Number of data slots each index holds.
    pub const fn ways(self) -> usize {
        match self {
            Self::DirectMapped => 1,
            Self::TwoWay => TWO_WAY_WAYS,
        }
    }
}

/// Cache setup request.
///
/// # Examples
///
/// ```
/// use l2cache_core::config::{CacheConfig, CacheKind};
///
/// let json = r#"{ "kind": "two_way", "line_count": 128 }"#;
/// let config: CacheConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.kind, CacheKind::TwoWay);
/// assert_eq!(config.line_count, 128);
/// assert_eq!(config.line_size_bytes, 256);
///
/// let geometry = config.validate().unwrap();
/// assert_eq!(geometry.index_bits(), 7);
/// assert_eq!(geometry.line_bits(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Direct-mapped or two-way set-associative.
    #[serde(default)]
    pub kind: CacheKind,

    /// Number of cache indices (power of two).
    #[serde(default = "CacheConfig::default_line_count")]
    pub line_count: u32,

    /// Bytes per line, or per way slot for the two-way cache (power of two, >= 32).
    #[serde(default = "CacheConfig::default_line_size")]
    pub line_size_bytes: u32,
}

impl CacheConfig {
    /// Returns the default line count.
    fn default_line_count() -> u32 {
        defaults::LINE_COUNT
    }

    /// Returns the default line size in bytes.
    fn default_line_size() -> u32 {
        defaults::LINE_SIZE_BYTES
    }

    /// Creates a configuration with an explicit kind and geometry.
    pub const fn new(kind: CacheKind, line_count: u32, line_size_bytes: u32) -> Self {
        Self {
            kind,
            line_count,
            line_size_bytes,
        }
    }

    /// Checks every setup invariant and derives the bit widths.
    ///
    /// # Errors
    ///
    /// See [`CacheGeometry::new`].
    pub fn validate(&self) -> Result<CacheGeometry, CacheError> {
        CacheGeometry::new(self.line_count, self.line_size_bytes)
    }

    /// Bytes a caller-supplied buffer must hold for this configuration.
    ///
    /// Counts tag bookkeeping as part of the buffer: four bytes per line for
    /// the direct-mapped cache, eight per way for the two-way cache.
    pub const fn required_buffer_bytes(&self) -> usize {
        required_buffer_bytes(self.kind, self.line_count, self.line_size_bytes)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::default(),
            line_count: defaults::LINE_COUNT,
            line_size_bytes: defaults::LINE_SIZE_BYTES,
        }
    }
}

/// Buffer bytes needed by a cache of the given kind and geometry.
///
/// * Direct-mapped: `line_count * (line_size_bytes + 4)`.
/// * Two-way: `line_count * 2 * (line_size_bytes + 8)`.
pub const fn required_buffer_bytes(kind: CacheKind, line_count: u32, line_size_bytes: u32) -> usize {
    let line_count = line_count as usize;
    let line_size = line_size_bytes as usize;
    match kind {
        CacheKind::DirectMapped => line_count * (line_size + DIRECT_MAPPED_TAG_BYTES),
        CacheKind::TwoWay => line_count * TWO_WAY_WAYS * (line_size + TWO_WAY_TAG_BYTES_PER_WAY),
    }
}
