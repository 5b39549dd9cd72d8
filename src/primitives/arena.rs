//! Read-only view over the buddy allocator's arena.

use std::ops::Range;

use crate::primitives::address::BlockAddress;
use crate::types::{BlockNumber, DsStoreError, Result};

/// Block addresses indexed by block number.
///
/// The on-disk table is padded to a multiple of 256 entries; `count` is the
/// number of real blocks and anything past it is treated as unassigned.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BlockAddressTable {
    count: u32,
    entries: Vec<BlockAddress>,
}

impl BlockAddressTable {
    /// Wraps decoded entries. `entries` may be longer than `count`.
    pub fn new(count: u32, entries: Vec<BlockAddress>) -> Self {
        Self { count, entries }
    }

    /// Number of real blocks.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Length of the stored table, padding included.
    pub fn padded_len(&self) -> usize {
        self.entries.len()
    }

    /// Looks up the address of a real block.
    pub fn get(&self, block: BlockNumber) -> Option<BlockAddress> {
        if block.0 >= self.count {
            return None;
        }
        self.entries.get(block.0 as usize).copied()
    }

    /// Iterates over the real blocks and their addresses.
    pub fn iter(&self) -> impl Iterator<Item = (BlockNumber, BlockAddress)> + '_ {
        self.entries
            .iter()
            .take(self.count as usize)
            .enumerate()
            .map(|(idx, addr)| (BlockNumber(idx as u32), *addr))
    }
}

/// The file buffer together with the offset every block address is measured from.
#[derive(Clone, Copy, Debug)]
pub struct Arena<'a> {
    data: &'a [u8],
    base: usize,
}

impl<'a> Arena<'a> {
    /// Creates an arena whose addresses are relative to `base`.
    pub fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, base }
    }

    /// Absolute offset of arena address zero.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Whole underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Resolves a block address to an absolute byte range inside the buffer.
    pub fn resolve(&self, addr: BlockAddress) -> Result<Range<usize>> {
        let start = self.base as u64 + u64::from(addr.offset());
        let end = start + addr.size();
        if end > self.data.len() as u64 {
            return Err(DsStoreError::OutOfBounds {
                offset: start,
                len: addr.size(),
                available: self.data.len() as u64,
            });
        }
        Ok(start as usize..end as usize)
    }

    /// Returns the bytes of `block`, looked up through `table`.
    pub fn dereference(&self, block: BlockNumber, table: &BlockAddressTable) -> Result<&'a [u8]> {
        let addr = table
            .get(block)
            .filter(|addr| !addr.is_unassigned())
            .ok_or(DsStoreError::UnassignedBlock(block))?;
        let range = self.resolve(addr)?;
        Ok(&self.data[range])
    }

    /// Returns everything from arena offset `offset` to the end of the buffer.
    pub fn slice_from(&self, offset: u32) -> Result<&'a [u8]> {
        let start = self.base + offset as usize;
        self.data
            .get(start..)
            .ok_or_else(|| DsStoreError::out_of_bounds(start, 0, self.data.len()))
    }
}
