//! Cache and Backing-Store Error definitions.
//!
//! This module defines the error types for the cache engine. It provides:
//! 1. **Setup Errors:** Contract violations detected while validating a configuration.
//! 2. **Fill Errors:** Fatal backing-store failures propagated out of a fill.
//! 3. **Store Errors:** Failures reported by a backing-store reader.

use thiserror::Error;

/// Failure reported by a backing-store reader.
///
/// A reader either copies every requested byte or returns one of these. The
/// cache never retries; the error is handed back to the caller of the fill.
#[derive(Debug, Error)]
pub enum BackingStoreError {
    /// The requested range is not covered by the store.
    #[error("read of {bytes} bytes at {src:#010x} is outside the backing store")]
    OutOfRange {
        /// First address of the rejected read.
        src: u32,
        /// Length of the rejected read.
        bytes: usize,
    },

    /// The underlying file or device failed.
    #[error("backing store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Reader-specific failure with a description.
    #[error("backing store device error: {0}")]
    Device(String),
}

/// Errors returned by cache setup and by the fill path.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A size that must be a power of two is not.
    #[error("{field} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Value that was supplied.
        value: u32,
    },

    /// The line size is below the fill window size.
    #[error("line size must be at least {min} bytes, got {value}")]
    LineTooSmall {
        /// Value that was supplied.
        value: u32,
        /// Smallest accepted value.
        min: u32,
    },

    /// The line size exceeds the largest supported line.
    #[error("line size must be at most 2^{max_log2} bytes, got {value}")]
    LineTooLarge {
        /// Value that was supplied.
        value: u32,
        /// Largest accepted value, as log2.
        max_log2: u32,
    },

    /// Line and index bits together do not fit in a 32-bit address.
    #[error("{line_bits} line bits plus {index_bits} index bits exceed a 32-bit address")]
    AddressSpaceExceeded {
        /// log2 of the line size.
        line_bits: u32,
        /// log2 of the line count.
        index_bits: u32,
    },

    /// A caller-supplied buffer cannot hold the cache.
    #[error("cache buffer holds {actual} bytes, {required} required")]
    BufferTooSmall {
        /// Bytes needed for the configured geometry.
        required: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// A maintenance operation named an index beyond the tag table.
    #[error("cache index {index} out of range (line count {line_count})")]
    IndexOutOfRange {
        /// Requested index.
        index: u32,
        /// Number of entries in the cache.
        line_count: u32,
    },

    /// The backing-store read servicing a miss failed.
    #[error("fill of {address:#010x} failed")]
    Fill {
        /// Faulting address of the fill request.
        address: u32,
        /// Reader failure.
        #[source]
        source: BackingStoreError,
    },

    /// A thread panicked while holding a shared cache.
    #[error("shared cache lock poisoned")]
    LockPoisoned,
}
