//! Buddy allocator header and bookkeeping block.

use std::ops::Range;

use serde::Serialize;
use tracing::{debug, warn};

use crate::primitives::address::BlockAddress;
use crate::primitives::arena::BlockAddressTable;
use crate::primitives::bytes::buf::Cursor;
use crate::types::{BlockNumber, DsStoreError, Result};

/// Magic bytes opening the allocator header.
pub const ALLOCATOR_MAGIC: [u8; 4] = *b"Bud1";
/// Size of the allocator header in bytes.
pub const HEADER_LEN: usize = 32;
/// Number of free-list buckets, one per power-of-two size class.
pub const FREE_LIST_BUCKETS: usize = 32;
/// Directory entry naming the B-tree metadata block.
pub const DSDB_ENTRY: &str = "DSDB";

const HDR_MAGIC: Range<usize> = 0..4;
const HDR_INFO_OFFSET: Range<usize> = 4..8;
const HDR_INFO_SIZE: Range<usize> = 8..12;
const HDR_INFO_OFFSET_BACKUP: Range<usize> = 12..16;
const HDR_RESERVED: Range<usize> = 16..32;

/// Rounds `n` up to the next multiple of 256.
pub fn round_up_to_256(n: u32) -> u64 {
    (u64::from(n) + 255) & !255
}

/// Header at the start of the arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllocatorHeader {
    /// Arena offset of the allocator's bookkeeping block.
    pub info_block_offset: u32,
    /// Size of the bookkeeping block.
    pub info_block_size: u32,
    /// Second copy of `info_block_offset`.
    pub info_block_offset_backup: u32,
    /// Trailing bytes with no known meaning.
    #[serde(serialize_with = "crate::types::serialize_hex")]
    pub reserved: [u8; 16],
}

impl AllocatorHeader {
    /// Decodes and validates the header from the first bytes of the arena.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(DsStoreError::InvalidHeader("allocator header truncated"));
        }
        if buf[HDR_MAGIC] != ALLOCATOR_MAGIC {
            return Err(DsStoreError::InvalidHeader("bad allocator magic"));
        }
        let info_block_offset = u32::from_be_bytes(read4(buf, HDR_INFO_OFFSET));
        let info_block_size = u32::from_be_bytes(read4(buf, HDR_INFO_SIZE));
        let info_block_offset_backup = u32::from_be_bytes(read4(buf, HDR_INFO_OFFSET_BACKUP));
        if info_block_offset != info_block_offset_backup {
            return Err(DsStoreError::InvalidHeader(
                "info block offset does not match its backup copy",
            ));
        }
        let mut reserved = [0u8; 16];
        reserved.copy_from_slice(&buf[HDR_RESERVED]);
        Ok(Self {
            info_block_offset,
            info_block_size,
            info_block_offset_backup,
            reserved,
        })
    }
}

fn read4(buf: &[u8], range: Range<usize>) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&buf[range]);
    out
}

/// One named entry of the allocator directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Entry name, normally ASCII.
    pub name: String,
    /// Block holding the named structure.
    pub block: BlockNumber,
}

/// Free block offsets bucketed by size class.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FreeList {
    buckets: Vec<Vec<u32>>,
}

impl FreeList {
    /// Builds a free list from explicit buckets; missing buckets are empty.
    pub fn from_buckets(mut buckets: Vec<Vec<u32>>) -> Self {
        buckets.resize(FREE_LIST_BUCKETS, Vec::new());
        Self { buckets }
    }

    /// Offsets of free blocks of size `2^size_class`.
    pub fn bucket(&self, size_class: usize) -> &[u32] {
        self.buckets.get(size_class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over `(size_class, offsets)` pairs.
    pub fn buckets(&self) -> impl Iterator<Item = (usize, &[u32])> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .map(|(class, offsets)| (class, offsets.as_slice()))
    }

    /// Total number of free blocks.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Whether no free blocks are recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded allocator bookkeeping block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllocatorInfo {
    /// Word following the block count; always zero in files seen so far.
    pub reserved: u32,
    /// Block addresses indexed by block number.
    pub table: BlockAddressTable,
    /// Named root blocks.
    pub directory: Vec<DirectoryEntry>,
    /// Free blocks per size class.
    pub free_list: FreeList,
}

impl AllocatorInfo {
    /// Decodes the bookkeeping block starting at the beginning of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let block_count = cur.read_u32()?;
        let reserved = cur.read_u32()?;
        if reserved != 0 {
            debug!(reserved, "allocator reserved word is non-zero");
        }

        let padded = round_up_to_256(block_count);
        let table_bytes = padded * 4;
        if table_bytes > cur.remaining() as u64 {
            return Err(DsStoreError::OutOfBounds {
                offset: cur.off as u64,
                len: table_bytes,
                available: buf.len() as u64,
            });
        }
        let mut entries = Vec::with_capacity(padded as usize);
        for _ in 0..padded {
            entries.push(BlockAddress(cur.read_u32()?));
        }
        let table = BlockAddressTable::new(block_count, entries);

        let dir_count = cur.read_u32()?;
        let mut directory = Vec::new();
        for _ in 0..dir_count {
            let name_len = cur.read_u8()? as usize;
            let name = String::from_utf8_lossy(cur.take(name_len)?).into_owned();
            let block = BlockNumber(cur.read_u32()?);
            directory.push(DirectoryEntry { name, block });
        }

        let mut buckets = Vec::with_capacity(FREE_LIST_BUCKETS);
        for _ in 0..FREE_LIST_BUCKETS {
            let count = cur.read_u32()? as usize;
            if count.saturating_mul(4) > cur.remaining() {
                return Err(DsStoreError::out_of_bounds(cur.off, count * 4, buf.len()));
            }
            let mut offsets = Vec::with_capacity(count);
            for _ in 0..count {
                offsets.push(cur.read_u32()?);
            }
            buckets.push(offsets);
        }

        debug!(
            blocks = block_count,
            directory_entries = directory.len(),
            "decoded allocator info"
        );
        Ok(Self {
            reserved,
            table,
            directory,
            free_list: FreeList { buckets },
        })
    }

    /// Number of real blocks.
    pub fn block_count(&self) -> u32 {
        self.table.count()
    }

    /// Finds the block registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<BlockNumber> {
        let found = self
            .directory
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.block);
        if found.is_none() {
            warn!(name, "allocator directory entry missing");
        }
        found.ok_or_else(|| DsStoreError::MissingDirectoryEntry(name.to_string()))
    }
}
