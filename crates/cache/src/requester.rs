//! Requester model.
//!
//! A small direct-mapped cache of 32-byte lines standing in for the hardware
//! cache whose misses drive the L2 engine. Every miss issues exactly one fill
//! request, for the address aligned down to 32 bytes, and copies the returned
//! window. Hits never reach the engine.

use crate::cache::FillEngine;
use crate::common::addr::CacheGeometry;
use crate::common::constants::FILL_WINDOW_BYTES;
use crate::common::error::CacheError;

/// Default number of requester lines.
pub const DEFAULT_MINICACHE_LINES: usize = 8;

#[derive(Clone, Copy, Debug)]
struct MiniLine {
    base: Option<u32>,
    bytes: [u8; FILL_WINDOW_BYTES],
}

impl MiniLine {
    const EMPTY: Self = Self {
        base: None,
        bytes: [0; FILL_WINDOW_BYTES],
    };
}

/// Direct-mapped requester cache.
#[derive(Clone, Debug)]
pub struct Minicache {
    lines: Vec<MiniLine>,
    hits: u64,
    misses: u64,
}

impl Default for Minicache {
    fn default() -> Self {
        Self::new(DEFAULT_MINICACHE_LINES)
    }
}

impl Minicache {
    /// Creates an empty requester cache with `line_count` lines (at least one).
    pub fn new(line_count: usize) -> Self {
        Self {
            lines: vec![MiniLine::EMPTY; line_count.max(1)],
            hits: 0,
            misses: 0,
        }
    }

    /// Drops every line, so the next access to any address issues a fill.
    pub fn invalidate(&mut self) {
        self.lines.fill(MiniLine::EMPTY);
    }

    /// Accesses served locally.
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Accesses that issued a fill request.
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Returns the window containing `address`, filling it through `engine` on a miss.
    fn window<E: FillEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        address: u32,
    ) -> Result<&[u8; FILL_WINDOW_BYTES], CacheError> {
        let base = CacheGeometry::fill_request_address(address);
        let slot = (base as usize / FILL_WINDOW_BYTES) % self.lines.len();

        if self.lines[slot].base == Some(base) {
            self.hits += 1;
        } else {
            self.misses += 1;
            let fill = engine.service_fill(base)?;
            let line = &mut self.lines[slot];
            line.bytes.copy_from_slice(fill.window());
            line.base = Some(base);
        }
        Ok(&self.lines[slot].bytes)
    }

    /// Reads `dst.len()` bytes starting at `address`, one window at a time.
    ///
    /// # Errors
    ///
    /// Propagates the first fill error; `dst` may be partially written.
    pub fn read_bytes<E: FillEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        address: u32,
        dst: &mut [u8],
    ) -> Result<(), CacheError> {
        let mut cursor = address;
        let mut done = 0;
        while done < dst.len() {
            let offset = cursor as usize % FILL_WINDOW_BYTES;
            let take = (FILL_WINDOW_BYTES - offset).min(dst.len() - done);
            let window = self.window(engine, cursor)?;
            dst[done..done + take].copy_from_slice(&window[offset..offset + take]);
            done += take;
            cursor = cursor.wrapping_add(take as u32);
        }
        Ok(())
    }

    /// Reads the little-endian word at `address`.
    ///
    /// # Errors
    ///
    /// Propagates any fill error.
    pub fn read_u32<E: FillEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        address: u32,
    ) -> Result<u32, CacheError> {
        let mut word = [0u8; 4];
        self.read_bytes(engine, address, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }
}
