//! Backing-store readers.
//!
//! The cache never touches the backing store directly; every miss goes through a
//! [`BackingStore`]. This module provides:
//! 1. **Interface:** The [`BackingStore`] trait, also implemented by plain closures.
//! 2. **Stores:** An in-memory image ([`FlatMemory`]) and a file-backed image ([`ImageFile`]).
//! 3. **Instrumentation:** [`ReadCounter`], which counts and times reads of any store.

/// Read counting and timing wrapper.
pub mod counter;

/// In-memory linear backing store.
pub mod flat;

/// File-backed linear backing store.
pub mod image;

pub use counter::{ReadCounter, mean_duration};
pub use flat::FlatMemory;
pub use image::ImageFile;

use crate::common::error::BackingStoreError;

/// Reader for the linear address space behind the cache.
///
/// Implementations must copy exactly `dst.len()` bytes starting at `src`, or
/// fail. A failure is fatal to the fill that issued the read: the cache does
/// not retry and leaves the line invalid.
///
/// Any `FnMut(&mut [u8], u32) -> Result<(), BackingStoreError>` closure is a
/// backing store, so hosts can pass a reader function directly.
pub trait BackingStore {
    /// Copies `dst.len()` bytes starting at backing-store address `src` into `dst`.
    ///
    /// # Errors
    ///
    /// Returns a [`BackingStoreError`] when the range cannot be read in full.
    fn read(&mut self, dst: &mut [u8], src: u32) -> Result<(), BackingStoreError>;
}

impl<F> BackingStore for F
where
    F: FnMut(&mut [u8], u32) -> Result<(), BackingStoreError>,
{
    #[inline]
    fn read(&mut self, dst: &mut [u8], src: u32) -> Result<(), BackingStoreError> {
        self(dst, src)
    }
}
