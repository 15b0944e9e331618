//! Common utilities and types shared by both cache variants.
//!
//! This module provides the building blocks every other component depends on. It includes:
//! 1. **Address Decomposition:** Validated geometry and tag/index/offset extraction.
//! 2. **Constants:** Tag sentinel, fill window size and geometry limits.
//! 3. **Error Handling:** Setup, fill and backing-store error types.

/// Cache geometry and address decomposition.
pub mod addr;

/// Common constants used throughout the cache.
pub mod constants;

/// Error types.
pub mod error;

pub use addr::{AddressFields, CacheGeometry};
pub use constants::{FILL_WINDOW_BYTES, INVALID_TAG};
pub use error::{BackingStoreError, CacheError};
