//! Read-only L2 Cache Engines.
//!
//! This module implements the fill engines that sit between a requester's
//! small cache and a slow, linearly addressed backing store. It provides:
//! 1. **Engines:** A direct-mapped cache and a two-way set-associative cache.
//! 2. **Fill Results:** The slot bytes and outcome returned for each fill request.
//! 3. **Inspection:** Side-effect-free prediction of what a fill would do.
//! 4. **Sharing:** A locked wrapper for hosts that deliver fills from several threads.
//!
//! Each engine owns its tag table, data arena, backing store and statistics.
//! Requests are serviced through `&mut self`, so a whole request
//! (decompose, check, evict, fill, update) is exclusive by construction.

/// Direct-mapped engine.
pub mod direct_mapped;

/// Address inspection types.
pub mod inspect;

/// Mutex-guarded engine wrapper.
pub mod shared;

/// Two-way set-associative engine.
pub mod two_way;

pub use direct_mapped::DirectMappedCache;
pub use inspect::{AddressInfo, EntrySnapshot, FillPlan, Prediction, SlotLocation};
pub use shared::SharedCache;
pub use two_way::{TwoWayCache, TwoWayEntry};

use serde::Serialize;
use tracing::info;

use crate::common::addr::{AddressFields, CacheGeometry};
use crate::common::constants::FILL_WINDOW_BYTES;
use crate::common::error::CacheError;
use crate::config::{CacheConfig, CacheKind};
use crate::stats::CacheStats;
use crate::store::BackingStore;

/// One way of a cache entry.
///
/// The direct-mapped cache only ever uses [`Way::Zero`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Way {
    /// First slot of an entry.
    #[default]
    Zero,
    /// Second slot of an entry (two-way only).
    One,
}

impl Way {
    /// Slot number, 0 or 1.
    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// The opposite way.
    #[inline(always)]
    pub const fn other(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    /// Way for a slot number, if it is 0 or 1.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            _ => None,
        }
    }
}

/// How a fill request was serviced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The line was resident in `way`; no backing-store read.
    Hit {
        /// Way holding the line.
        way: Way,
    },
    /// The line was read from the backing store into `way`.
    Miss {
        /// Way that was evicted and refilled.
        way: Way,
    },
}

impl Outcome {
    /// Returns `true` for a hit.
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit { .. })
    }

    /// Way that now holds the requested line.
    pub const fn way(&self) -> Way {
        match *self {
            Self::Hit { way } | Self::Miss { way } => way,
        }
    }
}

/// Result of a fill: the now-valid line and where the request falls in it.
#[derive(Clone, Copy, Debug)]
pub struct Fill<'a> {
    /// Hit or miss, and the way used.
    pub outcome: Outcome,
    /// Decomposition of the faulting address.
    pub fields: AddressFields,
    /// The whole slot holding the requested line.
    pub line: &'a [u8],
}

impl<'a> Fill<'a> {
    /// Byte offset of the faulting address inside [`Fill::line`].
    pub const fn offset(&self) -> usize {
        self.fields.offset as usize
    }

    /// Line bytes from the faulting address to the end of the line.
    pub fn data(&self) -> &'a [u8] {
        &self.line[self.offset()..]
    }

    /// Number of valid bytes from the faulting address onward.
    pub fn byte_count(&self) -> usize {
        self.line.len() - self.offset()
    }

    /// The 32-byte window containing the faulting address.
    ///
    /// Always in bounds: lines are at least one window wide and are
    /// window-aligned.
    pub fn window(&self) -> &'a [u8] {
        let start = self.offset() & !(FILL_WINDOW_BYTES - 1);
        &self.line[start..start + FILL_WINDOW_BYTES]
    }

    /// Copies the fill window out of the cache.
    pub fn to_window(&self, geometry: &CacheGeometry) -> FillWindow {
        let mut bytes = [0u8; FILL_WINDOW_BYTES];
        bytes.copy_from_slice(self.window());
        FillWindow {
            address: CacheGeometry::fill_request_address(geometry.compose(self.fields)),
            outcome: self.outcome,
            bytes,
        }
    }
}

/// An owned copy of one fill window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillWindow {
    /// 32-byte-aligned address of the window.
    pub address: u32,
    /// How the fill was serviced.
    pub outcome: Outcome,
    /// Window contents.
    pub bytes: [u8; FILL_WINDOW_BYTES],
}

/// Interface shared by both cache variants.
pub trait FillEngine {
    /// Organisation of this cache.
    fn kind(&self) -> CacheKind;

    /// Validated geometry the cache was set up with.
    fn geometry(&self) -> &CacheGeometry;

    /// Services one fill request for `address`.
    ///
    /// On a hit no backing-store read happens. On a miss the victim slot is
    /// refilled with the whole line containing `address` before the tag is
    /// updated.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Fill`] if the backing-store read fails. The
    /// affected slot is left invalid.
    fn service_fill(&mut self, address: u32) -> Result<Fill<'_>, CacheError>;

    /// Predicts what [`FillEngine::service_fill`] would do, without side effects.
    fn inspect(&self, address: u32) -> AddressInfo;

    /// Current statistics.
    fn stats(&self) -> &CacheStats;

    /// Zeroes the statistics.
    fn reset_stats(&mut self);

    /// Marks every entry invalid.
    fn invalidate_all(&mut self);
}

impl<E: FillEngine + ?Sized> FillEngine for Box<E> {
    fn kind(&self) -> CacheKind {
        (**self).kind()
    }

    fn geometry(&self) -> &CacheGeometry {
        (**self).geometry()
    }

    fn service_fill(&mut self, address: u32) -> Result<Fill<'_>, CacheError> {
        (**self).service_fill(address)
    }

    fn inspect(&self, address: u32) -> AddressInfo {
        (**self).inspect(address)
    }

    fn stats(&self) -> &CacheStats {
        (**self).stats()
    }

    fn reset_stats(&mut self) {
        (**self).reset_stats();
    }

    fn invalidate_all(&mut self) {
        (**self).invalidate_all();
    }
}

/// A type-erased, ready-to-serve cache.
pub type CacheHandle = Box<dyn FillEngine + Send>;

/// Validates `config`, lays out the tag and data tables, marks every tag
/// invalid and returns the engine.
///
/// # Arguments
///
/// * `config` - Cache organisation and geometry.
/// * `store` - Reader invoked on every miss.
///
/// # Errors
///
/// Returns a [`CacheError`] describing the first violated setup invariant.
pub fn setup<S>(config: &CacheConfig, store: S) -> Result<CacheHandle, CacheError>
where
    S: BackingStore + Send + 'static,
{
    let geometry = config.validate()?;
    info!(
        kind = ?config.kind,
        line_count = geometry.line_count(),
        line_size_bytes = geometry.line_size_bytes(),
        "l2 cache setup"
    );
    Ok(match config.kind {
        CacheKind::DirectMapped => Box::new(DirectMappedCache::new(geometry, store)),
        CacheKind::TwoWay => Box::new(TwoWayCache::new(geometry, store)),
    })
}

/// Like [`setup`], but lays the data arena out in a caller-supplied buffer.
///
/// The size check counts tag bookkeeping (four bytes per line, or eight per
/// way for the two-way cache) so a buffer sized by the word-table formula is
/// accepted. Tags are kept in their own table; the buffer is truncated to the
/// data arena.
///
/// # Errors
///
/// Returns [`CacheError::BufferTooSmall`] if `buffer` holds fewer than
/// [`CacheConfig::required_buffer_bytes`] bytes, or any geometry error.
pub fn setup_with_buffer<S>(
    config: &CacheConfig,
    buffer: Vec<u8>,
    store: S,
) -> Result<CacheHandle, CacheError>
where
    S: BackingStore + Send + 'static,
{
    let geometry = config.validate()?;
    info!(
        kind = ?config.kind,
        line_count = geometry.line_count(),
        line_size_bytes = geometry.line_size_bytes(),
        buffer_bytes = buffer.len(),
        "l2 cache setup in caller buffer"
    );
    Ok(match config.kind {
        CacheKind::DirectMapped => Box::new(DirectMappedCache::with_buffer(geometry, buffer, store)?),
        CacheKind::TwoWay => Box::new(TwoWayCache::with_buffer(geometry, buffer, store)?),
    })
}
