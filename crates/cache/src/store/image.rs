//! File-backed backing store.
//!
//! Serves reads from a flash image on disk, mapped at a base address. Every
//! read seeks and reads the exact byte count, so the store behaves like a slow
//! device and a short file surfaces as an error rather than zero fill.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::BackingStore;
use crate::common::error::BackingStoreError;

/// A flash image file mapped at `base`.
#[derive(Debug)]
pub struct ImageFile {
    file: File,
    base: u32,
    len: u64,
}

impl ImageFile {
    /// Opens the image at `path` and maps it at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`BackingStoreError::Io`] if the file cannot be opened or sized.
    pub fn open(path: impl AsRef<Path>, base: u32) -> Result<Self, BackingStoreError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, base, len })
    }

    /// First mapped address.
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Size of the image in bytes.
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the image is empty.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl BackingStore for ImageFile {
    fn read(&mut self, dst: &mut [u8], src: u32) -> Result<(), BackingStoreError> {
        let out_of_range = || BackingStoreError::OutOfRange {
            src,
            bytes: dst.len(),
        };
        let offset = u64::from(src.checked_sub(self.base).ok_or_else(out_of_range)?);
        if offset + dst.len() as u64 > self.len {
            return Err(out_of_range());
        }

        let _ = self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(dst)?;
        Ok(())
    }
}
