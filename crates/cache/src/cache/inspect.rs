//! Address inspection.
//!
//! Describes, without touching any state, what a fill for an address would do:
//! its decomposition, the tag entry it selects, whether it would hit, and on a
//! miss exactly which backing-store read would refill which slot. This is the
//! main seam for black-box testing and for the CLI's `inspect` command.

use std::fmt;

use serde::Serialize;

use super::Way;
use crate::common::addr::AddressFields;
use crate::common::constants::INVALID_TAG;

/// A data slot in a cache's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SlotLocation {
    /// Cache index.
    pub index: u32,
    /// Way within the index.
    pub way: Way,
    /// Byte offset of the slot's first byte in the data arena.
    pub arena_offset: usize,
}

/// The backing-store read a miss would issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FillPlan {
    /// First backing-store address read (the line base).
    pub src: u32,
    /// Slot overwritten by the read.
    pub dst: SlotLocation,
    /// Bytes read (the line size).
    pub bytes: usize,
}

/// Tag table contents for one index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EntrySnapshot {
    /// Direct-mapped entry.
    DirectMapped {
        /// Resident tag, or the invalid sentinel.
        tag: u32,
    },
    /// Two-way entry.
    TwoWay {
        /// Tag per way, or the invalid sentinel.
        tags: [u32; 2],
        /// Way most recently touched by a hit or a fill.
        last_used: Way,
    },
}

/// Predicted result of a fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Prediction {
    /// The line is resident.
    Hit {
        /// Way holding the line.
        way: Way,
    },
    /// The line would be fetched.
    Miss {
        /// Way that would be evicted.
        evict: Way,
        /// Read that would refill it.
        plan: FillPlan,
    },
}

impl Prediction {
    /// Way that would hold the line after the fill.
    pub const fn way(&self) -> Way {
        match *self {
            Self::Hit { way } | Self::Miss { evict: way, .. } => way,
        }
    }
}

/// Everything a fill for `address` would read or touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AddressInfo {
    /// Inspected address.
    pub address: u32,
    /// Address aligned down to its 32-byte fill window.
    pub fill_request_address: u32,
    /// Tag, index and offset of `address`.
    pub fields: AddressFields,
    /// Current tag table contents at `fields.index`.
    pub entry: EntrySnapshot,
    /// Hit or miss, and the way involved.
    pub prediction: Prediction,
    /// Arena offset at which the byte for `address` would be found after the fill.
    pub cache_offset: usize,
}

impl AddressInfo {
    /// Returns `true` if a fill would hit.
    pub const fn is_hit(&self) -> bool {
        matches!(self.prediction, Prediction::Hit { .. })
    }

    /// The read a fill would issue, if it would miss.
    pub const fn fill_plan(&self) -> Option<FillPlan> {
        match self.prediction {
            Prediction::Hit { .. } => None,
            Prediction::Miss { plan, .. } => Some(plan),
        }
    }
}

/// Formats a tag, spelling out the sentinel.
struct TagDisplay(u32);

impl fmt::Display for TagDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == INVALID_TAG {
            write!(f, "invalid")
        } else {
            write!(f, "{:#010x}", self.0)
        }
    }
}

impl fmt::Display for AddressInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Address:      {:#010x}", self.address)?;
        writeln!(f, "Fill Request: {:#010x}", self.fill_request_address)?;
        writeln!(f, "Tag:          {:#010x}", self.fields.tag)?;
        writeln!(f, "Entry Index:  {}", self.fields.index)?;
        writeln!(f, "Slot Offset:  {:#x} ({})", self.fields.offset, self.fields.offset)?;
        match self.entry {
            EntrySnapshot::DirectMapped { tag } => {
                writeln!(f, "Entry Tag:    {}", TagDisplay(tag))?;
            }
            EntrySnapshot::TwoWay { tags, last_used } => {
                writeln!(f, "Entry Tags:   [{}, {}]", TagDisplay(tags[0]), TagDisplay(tags[1]))?;
                writeln!(f, "Last Used:    {}", last_used.index())?;
            }
        }
        match self.prediction {
            Prediction::Hit { way } => writeln!(f, "[Hit]  slot {}", way.index())?,
            Prediction::Miss { evict, plan } => {
                writeln!(f, "[Miss] evict slot {}", evict.index())?;
                writeln!(
                    f,
                    "  read({:#x} <- {:#010x}, {} bytes)",
                    plan.dst.arena_offset, plan.src, plan.bytes
                )?;
            }
        }
        write!(f, "Cache Offset: {:#x}", self.cache_offset)
    }
}
