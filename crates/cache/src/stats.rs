//! Fill statistics collection and reporting.
//!
//! This module tracks how the engine serviced fill requests. It provides:
//! 1. **Counters:** Fill requests, hits and misses.
//! 2. **Derived Metrics:** Hit rate as a fraction and as an integer percentage.
//! 3. **Reporting:** A plain-text report via `Display` and JSON via `serde`.
//!
//! Counting is compiled in by the `stats` feature. Without it the recording
//! methods are no-ops and every counter reads zero.

use std::fmt;

use serde::Serialize;

/// Fill request counters owned by one engine.
///
/// Each fill is recorded exactly once, at the point hit or miss is decided and
/// before any backing-store read, so `hit_count + miss_count` always equals
/// `fill_request_count`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of fill requests serviced.
    pub fill_request_count: u64,
    /// Number of fills served without a backing-store read.
    pub hit_count: u64,
    /// Number of fills that triggered a backing-store read.
    pub miss_count: u64,
}

impl CacheStats {
    /// Records a fill that hit.
    #[inline(always)]
    pub fn record_hit(&mut self) {
        #[cfg(feature = "stats")]
        {
            self.fill_request_count += 1;
            self.hit_count += 1;
        }
    }

    /// Records a fill that missed.
    #[inline(always)]
    pub fn record_miss(&mut self) {
        #[cfg(feature = "stats")]
        {
            self.fill_request_count += 1;
            self.miss_count += 1;
        }
    }

    /// Zeroes all three counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fraction of fills that hit, or `None` before the first fill.
    pub fn hit_rate(&self) -> Option<f64> {
        if self.fill_request_count == 0 {
            return None;
        }
        Some(self.hit_count as f64 / self.fill_request_count as f64)
    }

    /// Hit rate as a truncated integer percentage, or `None` before the first fill.
    pub fn hit_rate_percent(&self) -> Option<u32> {
        if self.fill_request_count == 0 {
            return None;
        }
        Some(((self.hit_count * 100) / self.fill_request_count) as u32)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "L2 CACHE STATISTICS")?;
        writeln!(f, "  fill_requests          {}", self.fill_request_count)?;
        writeln!(f, "  hits                   {}", self.hit_count)?;
        writeln!(f, "  misses                 {}", self.miss_count)?;
        match self.hit_rate() {
            Some(rate) => write!(f, "  hit_rate               {:.2}%", rate * 100.0),
            None => write!(f, "  hit_rate               n/a"),
        }
    }
}
