//! Shared engine wrapper.
//!
//! The engines assume fills arrive one at a time. Hosts that deliver fills
//! from several threads wrap the engine in a [`SharedCache`], which holds one
//! lock for the whole request and copies the fill window out before releasing
//! it. Statistics resets take the same lock, so no fill observes a half-reset
//! state.

use std::sync::{Arc, Mutex, MutexGuard};

use super::inspect::AddressInfo;
use super::{FillEngine, FillWindow};
use crate::common::error::CacheError;
use crate::stats::CacheStats;

/// Cloneable, thread-safe handle to one engine.
#[derive(Debug)]
pub struct SharedCache<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> Clone for SharedCache<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: FillEngine> SharedCache<E> {
    /// Takes ownership of `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, E>, CacheError> {
        self.inner.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Services one fill request under the lock and returns a copy of its window.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::LockPoisoned`] if another holder panicked, or the
    /// engine's fill error.
    pub fn service_fill(&self, address: u32) -> Result<FillWindow, CacheError> {
        let mut engine = self.lock()?;
        let geometry = *engine.geometry();
        let fill = engine.service_fill(address)?;
        Ok(fill.to_window(&geometry))
    }

    /// Inspects `address` under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::LockPoisoned`] if another holder panicked.
    pub fn inspect(&self, address: u32) -> Result<AddressInfo, CacheError> {
        Ok(self.lock()?.inspect(address))
    }

    /// Snapshot of the statistics.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::LockPoisoned`] if another holder panicked.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(*self.lock()?.stats())
    }

    /// Zeroes the statistics.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::LockPoisoned`] if another holder panicked.
    pub fn reset_stats(&self) -> Result<(), CacheError> {
        self.lock()?.reset_stats();
        Ok(())
    }

    /// Runs `f` with exclusive access to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::LockPoisoned`] if another holder panicked.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> Result<R, CacheError> {
        let mut engine = self.lock()?;
        Ok(f(&mut engine))
    }
}
