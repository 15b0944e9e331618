//! Software-managed read-only L2 cache.
//!
//! This crate implements the addressing and replacement engine of a read-only
//! cache placed between a slow, linearly addressed backing store (flash) and a
//! requester that issues 32-byte fill requests when its own small cache misses:
//! 1. **Addressing:** Validated geometry and tag/index/offset decomposition.
//! 2. **Engines:** Direct-mapped and two-way set-associative fill engines.
//! 3. **Diagnostics:** Side-effect-free address inspection and fill statistics.
//! 4. **Collaborators:** Backing-store readers and a requester model for driving the engines.
//!
//! ```
//! use l2cache_core::config::{CacheConfig, CacheKind};
//! use l2cache_core::store::FlatMemory;
//! use l2cache_core::FillEngine;
//!
//! let store = FlatMemory::counting_words(0x4000_0000, 64 * 1024);
//! let config = CacheConfig::new(CacheKind::TwoWay, 64, 256);
//! let mut cache = l2cache_core::setup(&config, store).unwrap();
//!
//! let fill = cache.service_fill(0x4000_0104).unwrap();
//! assert!(!fill.outcome.is_hit());
//! assert_eq!(&fill.window()[4..8], &65u32.to_le_bytes());
//! assert!(cache.inspect(0x4000_0104).is_hit());
//! ```

/// Read-only cache engines, fill results and inspection.
pub mod cache;
/// Shared types: geometry, constants and errors.
pub mod common;
/// Cache configuration (defaults, kind, validation).
pub mod config;
/// Requester model issuing fill requests on its own misses.
pub mod requester;
/// Fill statistics.
pub mod stats;
/// Backing-store readers.
pub mod store;

/// Interface implemented by both engines.
pub use crate::cache::{CacheHandle, FillEngine, setup, setup_with_buffer};
/// Setup request; use `CacheConfig::default()` or deserialize from JSON.
pub use crate::config::CacheConfig;
/// Errors returned by setup and fills.
pub use crate::common::error::{BackingStoreError, CacheError};
