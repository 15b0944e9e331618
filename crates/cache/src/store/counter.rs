//! Backing-store read instrumentation.
//!
//! Wraps a store and records how often and how long it was read. Tests use the
//! read count as the oracle for hit/miss behaviour; the CLI reports the timing.

use std::time::{Duration, Instant};

use super::BackingStore;
use crate::common::error::BackingStoreError;

/// Mean of `count` intervals totalling `total`, or `None` when `count` is zero.
///
/// Counts beyond `u32::MAX` fall back to floating-point division.
pub fn mean_duration(total: Duration, count: u64) -> Option<Duration> {
    match u32::try_from(count) {
        Ok(0) => None,
        Ok(count) => Some(total / count),
        Err(_) => Some(total.div_f64(count as f64)),
    }
}

/// Counts and times every read issued to the wrapped store.
#[derive(Debug)]
pub struct ReadCounter<S> {
    inner: S,
    reads: u64,
    bytes: u64,
    read_time: Duration,
    last_read: Option<(u32, usize)>,
}

impl<S: BackingStore> ReadCounter<S> {
    /// Wraps `inner` with zeroed counters.
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            reads: 0,
            bytes: 0,
            read_time: Duration::ZERO,
            last_read: None,
        }
    }

    /// Number of reads issued, including failed ones.
    pub const fn reads(&self) -> u64 {
        self.reads
    }

    /// Total bytes requested across all reads.
    pub const fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Wall time spent inside the wrapped store.
    pub const fn read_time(&self) -> Duration {
        self.read_time
    }

    /// Mean time per read, or `None` before the first read.
    pub fn average_read_time(&self) -> Option<Duration> {
        mean_duration(self.read_time, self.reads)
    }

    /// `(src, bytes)` of the most recent read.
    pub const fn last_read(&self) -> Option<(u32, usize)> {
        self.last_read
    }

    /// Zeroes all counters.
    pub fn reset(&mut self) {
        self.reads = 0;
        self.bytes = 0;
        self.read_time = Duration::ZERO;
        self.last_read = None;
    }

    /// The wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: BackingStore> BackingStore for ReadCounter<S> {
    fn read(&mut self, dst: &mut [u8], src: u32) -> Result<(), BackingStoreError> {
        self.reads += 1;
        self.bytes += dst.len() as u64;
        self.last_read = Some((src, dst.len()));

        let start = Instant::now();
        let result = self.inner.read(dst, src);
        self.read_time += start.elapsed();
        result
    }
}
