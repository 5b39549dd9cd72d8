//! Coalesced view of the allocator's free list.

use serde::Serialize;

use crate::storage::allocator::FreeList;
use crate::types::{DsStoreError, Result};

/// Half-open byte range `[start, end)` relative to the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FreeRange {
    /// First free byte.
    pub start: u64,
    /// One past the last free byte.
    pub end: u64,
}

impl FreeRange {
    /// Length in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Expands every bucket into ranges, sorts them and merges touching neighbours.
///
/// Ranges that overlap are left as they are; see [`check_consistency`].
pub fn analyze(free_list: &FreeList) -> Vec<FreeRange> {
    let mut ranges: Vec<FreeRange> = free_list
        .buckets()
        .flat_map(|(size_class, offsets)| {
            let size = 1u64 << size_class;
            offsets.iter().map(move |&offset| FreeRange {
                start: u64::from(offset),
                end: u64::from(offset) + size,
            })
        })
        .collect();
    ranges.sort_unstable();

    let mut merged: Vec<FreeRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(prev) if prev.end == range.start => prev.end = range.end,
            _ => merged.push(range),
        }
    }
    merged
}

/// Fails on the first pair of ranges that overlap.
pub fn check_consistency(ranges: &[FreeRange]) -> Result<()> {
    for pair in ranges.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(DsStoreError::FreeListInconsistency {
                first_start: pair[0].start,
                first_end: pair[0].end,
                second_start: pair[1].start,
                second_end: pair[1].end,
            });
        }
    }
    Ok(())
}

/// Total bytes covered by `ranges`.
pub fn total_free(ranges: &[FreeRange]) -> u64 {
    ranges.iter().map(FreeRange::len).sum()
}
