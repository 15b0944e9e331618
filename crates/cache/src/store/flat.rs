//! In-memory backing store.
//!
//! Models a flash image mapped linearly at a base address. Used by tests and by
//! the CLI sweep, where the image is the benchmark array whose word `i` holds `i`.

use super::BackingStore;
use crate::common::error::BackingStoreError;

/// A byte image mapped at `base` in the 32-bit address space.
#[derive(Clone, Debug)]
pub struct FlatMemory {
    base: u32,
    bytes: Vec<u8>,
}

impl FlatMemory {
    /// Maps `bytes` at `base`.
    pub const fn new(base: u32, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    /// Builds an image of `words` little-endian `u32` values where word `i` holds `i`.
    pub fn counting_words(base: u32, words: usize) -> Self {
        let bytes = (0..words as u32).flat_map(u32::to_le_bytes).collect();
        Self { base, bytes }
    }

    /// First mapped address.
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Number of mapped bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte range of the image covered by a read, if fully mapped.
    fn span(&self, src: u32, bytes: usize) -> Option<std::ops::Range<usize>> {
        let start = src.checked_sub(self.base)? as usize;
        let end = start.checked_add(bytes)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl BackingStore for FlatMemory {
    fn read(&mut self, dst: &mut [u8], src: u32) -> Result<(), BackingStoreError> {
        let span = self.span(src, dst.len()).ok_or(BackingStoreError::OutOfRange {
            src,
            bytes: dst.len(),
        })?;
        dst.copy_from_slice(&self.bytes[span]);
        Ok(())
    }
}
