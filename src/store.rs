//! Whole-file decoding.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alias::AliasRecord;
use crate::options::DecodeOptions;
use crate::plist::{BinaryPlistDecoder, EmbeddedPlistDecoder};
use crate::primitives::arena::Arena;
use crate::primitives::bytes::buf::Cursor;
use crate::storage::allocator::{AllocatorHeader, AllocatorInfo, DSDB_ENTRY};
use crate::storage::btree::{BTree, Records};
use crate::storage::freespace::{self, FreeRange};
use crate::storage::record::Record;
use crate::types::Result;

/// Value of the word preceding the arena in every file seen so far.
pub const EXPECTED_PROLOGUE: u32 = 1;
/// Absolute offset every block address is measured from.
pub const ARENA_OFFSET: usize = 4;
/// Filename under which a folder stores properties about itself.
pub const SELF_FILENAME: &str = ".";

/// A decoded `.DS_Store` file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DsStore {
    /// Leading word before the arena.
    pub prologue: u32,
    /// Allocator header at the start of the arena.
    pub header: AllocatorHeader,
    /// Block table, directory and free list.
    pub allocator: AllocatorInfo,
    /// Record tree named by the `DSDB` directory entry.
    pub btree: BTree,
    /// Coalesced free space, sorted by start offset.
    pub free_ranges: Vec<FreeRange>,
}

impl DsStore {
    /// Decodes `bytes` with default options and the built-in plist decoder.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, &DecodeOptions::default(), &BinaryPlistDecoder)
    }

    /// Decodes `bytes` with explicit options and property-list decoder.
    pub fn decode_with(
        bytes: &[u8],
        options: &DecodeOptions,
        plist: &dyn EmbeddedPlistDecoder,
    ) -> Result<Self> {
        let prologue = Cursor::new(bytes).read_u32()?;
        if prologue != EXPECTED_PROLOGUE {
            warn!(prologue, "unexpected file prologue");
        }

        let arena = Arena::new(bytes, ARENA_OFFSET);
        let header = AllocatorHeader::decode(arena.slice_from(0)?)?;
        debug!(
            info_offset = header.info_block_offset,
            info_size = header.info_block_size,
            "allocator header"
        );
        let allocator = AllocatorInfo::decode(arena.slice_from(header.info_block_offset)?)?;
        let meta_block = allocator.lookup(DSDB_ENTRY)?;

        let plist = options.decode_embedded_plists.then_some(plist);
        let btree = BTree::decode(arena, &allocator.table, meta_block, options, plist)?;
        if let Err(err) = btree.verify_counts() {
            warn!(error = %err, "tree metadata disagrees with decoded tree");
        }

        let free_ranges = freespace::analyze(&allocator.free_list);
        if let Err(err) = freespace::check_consistency(&free_ranges) {
            warn!(error = %err, "free list is inconsistent");
        }

        info!(
            records = btree.meta.num_records,
            blocks = allocator.block_count(),
            free_ranges = free_ranges.len(),
            "decoded store"
        );
        Ok(Self {
            prologue,
            header,
            allocator,
            btree,
            free_ranges,
        })
    }

    /// Reads and decodes the file at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &DecodeOptions::default(), &BinaryPlistDecoder)
    }

    /// Reads and decodes the file at `path`.
    pub fn open_with(
        path: impl AsRef<Path>,
        options: &DecodeOptions,
        plist: &dyn EmbeddedPlistDecoder,
    ) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading store");
        let bytes = std::fs::read(path)?;
        Self::decode_with(&bytes, options, plist)
    }

    /// Every record in key order.
    pub fn records(&self) -> Records<'_> {
        self.btree.records()
    }

    /// Bytes covered by free ranges.
    pub fn total_free(&self) -> u64 {
        freespace::total_free(&self.free_ranges)
    }

    /// Record holding the folder's background picture alias, if any.
    pub fn background_alias_record(&self) -> Option<&Record> {
        self.btree
            .records_for(SELF_FILENAME)
            .find(|record| record.background_image_alias().is_some())
    }

    /// Parses the folder's background picture alias.
    pub fn background_alias(&self) -> Result<Option<AliasRecord>> {
        self.background_alias_record()
            .and_then(Record::background_image_alias)
            .map(AliasRecord::parse)
            .transpose()
    }
}
