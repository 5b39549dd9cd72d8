//! Packed buddy-allocator block addresses.
//!
//! The low five bits of an address hold `log2(size)`; clearing them yields the
//! block's byte offset from the start of the arena. Blocks are therefore always
//! 32-byte aligned.

use std::fmt;

use serde::Serialize;

const SIZE_MASK: u32 = 0x1f;
const OFFSET_MASK: u32 = !SIZE_MASK;

/// Returns the block size encoded in `address`.
#[inline]
pub fn size_of(address: u32) -> u64 {
    1u64 << (address & SIZE_MASK)
}

/// Returns the byte offset encoded in `address`.
#[inline]
pub fn offset_of(address: u32) -> u32 {
    address & OFFSET_MASK
}

/// Packs an aligned offset and a size exponent into a block address.
#[inline]
pub fn pack(offset: u32, log2_size: u8) -> u32 {
    debug_assert_eq!(offset & SIZE_MASK, 0, "block offsets are 32-byte aligned");
    (offset & OFFSET_MASK) | (u32::from(log2_size) & SIZE_MASK)
}

/// A raw entry of the block address table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct BlockAddress(pub u32);

impl BlockAddress {
    /// The value stored for block numbers that are not in use.
    pub const UNASSIGNED: BlockAddress = BlockAddress(0);

    /// Byte offset relative to the arena.
    pub fn offset(self) -> u32 {
        offset_of(self.0)
    }

    /// Block size in bytes.
    pub fn size(self) -> u64 {
        size_of(self.0)
    }

    /// Size exponent stored in the low bits.
    pub fn log2_size(self) -> u8 {
        (self.0 & SIZE_MASK) as u8
    }

    /// Whether the address marks an unused block number.
    pub fn is_unassigned(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockAddress(0x{:08x}: offset={}, size={})",
            self.0,
            self.offset(),
            self.size()
        )
    }
}
