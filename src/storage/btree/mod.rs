#![forbid(unsafe_code)]

//! The `DSDB` B-tree holding a directory's property records.
//!
//! The directory entry `DSDB` names a metadata block; the metadata names the
//! root page. Pages are decoded eagerly into an owned tree.

mod cursor;
mod node;
mod stats;

pub use cursor::Records;
pub use node::{decode_node, BTreeNode, ChildRef, InternalEntry, NodeDecoder};
pub use stats::TreeStats;

use std::ops::Range;

use serde::Serialize;
use tracing::{debug, warn};

use crate::options::DecodeOptions;
use crate::plist::EmbeddedPlistDecoder;
use crate::primitives::arena::{Arena, BlockAddressTable};
use crate::primitives::bytes::buf::Cursor;
use crate::storage::record::Record;
use crate::types::{BlockNumber, DsStoreError, Result};

/// Fields of the tree metadata block, all big-endian `u32`.
pub mod layout {
    use std::ops::Range;

    /// Root page block number.
    pub const ROOT_BLOCK: Range<usize> = 0..4;
    /// Levels below the root.
    pub const NUM_LEVELS: Range<usize> = 4..8;
    /// Records in the whole tree.
    pub const NUM_RECORDS: Range<usize> = 8..12;
    /// Pages in the tree, the metadata block excluded.
    pub const NUM_NODES: Range<usize> = 12..16;
    /// Declared page size.
    pub const PAGE_SIZE: Range<usize> = 16..20;
    /// Bytes the metadata occupies.
    pub const LEN: usize = 20;
}

/// Tree-wide metadata stored in the block named by the `DSDB` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BTreeMetadata {
    /// Block number of the root page.
    pub root_block: BlockNumber,
    /// Tree height minus one; a lone leaf has zero levels.
    pub num_levels: u32,
    /// Records in the tree.
    pub num_records: u32,
    /// Pages in the tree.
    pub num_nodes: u32,
    /// Declared page size, 4096 in Finder-written files.
    pub page_size: u32,
}

impl BTreeMetadata {
    /// Reads the metadata from the start of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < layout::LEN {
            return Err(DsStoreError::out_of_bounds(0, layout::LEN, buf.len()));
        }
        let field = |range: Range<usize>| {
            let mut cur = Cursor::new(&buf[range]);
            cur.read_u32()
        };
        Ok(Self {
            root_block: BlockNumber(field(layout::ROOT_BLOCK)?),
            num_levels: field(layout::NUM_LEVELS)?,
            num_records: field(layout::NUM_RECORDS)?,
            num_nodes: field(layout::NUM_NODES)?,
            page_size: field(layout::PAGE_SIZE)?,
        })
    }
}

/// A fully decoded tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BTree {
    /// Block the metadata was read from.
    pub meta_block: BlockNumber,
    /// Tree-wide metadata.
    pub meta: BTreeMetadata,
    /// Root page with every subtree materialized.
    pub root: BTreeNode,
}

impl BTree {
    /// Decodes the metadata stored at `meta_block` and the whole tree below it.
    pub fn decode(
        arena: Arena<'_>,
        table: &BlockAddressTable,
        meta_block: BlockNumber,
        options: &DecodeOptions,
        plist: Option<&dyn EmbeddedPlistDecoder>,
    ) -> Result<Self> {
        let meta = BTreeMetadata::decode(arena.dereference(meta_block, table)?)?;
        debug!(
            meta_block = meta_block.0,
            root = meta.root_block.0,
            levels = meta.num_levels,
            records = meta.num_records,
            nodes = meta.num_nodes,
            "tree metadata"
        );
        if meta.page_size != options.expected_page_size {
            warn!(
                page_size = meta.page_size,
                expected = options.expected_page_size,
                "unexpected tree page size"
            );
        }
        if meta.num_levels > options.max_depth {
            return Err(DsStoreError::MaxDepthExceeded {
                depth: meta.num_levels,
                limit: options.max_depth,
            });
        }

        let root = NodeDecoder::new(arena, table)
            .with_plist_decoder(plist)
            .with_depth_limit(meta.num_levels)
            .decode(meta.root_block)?;
        Ok(Self {
            meta_block,
            meta,
            root,
        })
    }

    /// Every record in key order.
    pub fn records(&self) -> Records<'_> {
        Records::new(&self.root)
    }

    /// Records belonging to `filename`.
    pub fn records_for<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records().filter(move |r| r.filename == filename)
    }

    /// Totals gathered from the decoded pages.
    pub fn stats(&self) -> TreeStats {
        TreeStats::collect(&self.root)
    }

    /// Compares the decoded tree against the metadata's record and page
    /// counts and its level count.
    pub fn verify_counts(&self) -> Result<()> {
        let stats = self.stats();
        let checks = [
            ("records", u64::from(self.meta.num_records), stats.records),
            ("nodes", u64::from(self.meta.num_nodes), stats.nodes),
            ("levels", u64::from(self.meta.num_levels), u64::from(stats.max_leaf_depth)),
        ];
        for (what, expected, found) in checks {
            if expected != found {
                return Err(DsStoreError::TreeCountMismatch {
                    what,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}
