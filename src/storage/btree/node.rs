use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

use crate::options::DecodeOptions;
use crate::plist::EmbeddedPlistDecoder;
use crate::primitives::arena::{Arena, BlockAddressTable};
use crate::primitives::bytes::buf::Cursor;
use crate::storage::record::Record;
use crate::types::{BlockNumber, DsStoreError, Result};

/// Smallest possible encoded record: name length, two tags and a bool.
const MIN_RECORD_LEN: usize = 4 + 4 + 4 + 1;

/// A child pointer together with the subtree it points to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChildRef {
    /// Block number stored in the parent.
    pub block: BlockNumber,
    /// Decoded subtree.
    pub node: Box<BTreeNode>,
}

/// One `(child, record)` pair of an internal node. Every record in `child`
/// sorts before `record`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InternalEntry {
    /// Subtree left of `record`.
    pub child: ChildRef,
    /// Separator record.
    pub record: Record,
}

/// A decoded B-tree page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BTreeNode {
    /// Page holding records only.
    Leaf {
        /// Records in key order.
        records: Vec<Record>,
    },
    /// Page holding child pointers interleaved with records.
    Internal {
        /// Child/record pairs in key order.
        entries: Vec<InternalEntry>,
        /// Right-most child, read from the page's leading word.
        trailing: ChildRef,
    },
}

impl BTreeNode {
    /// Whether this is a leaf page.
    pub fn is_leaf(&self) -> bool {
        matches!(self, BTreeNode::Leaf { .. })
    }
}

/// Decodes tree pages reachable from a block number.
///
/// The leading word `P` of a page selects its shape: zero marks a leaf
/// holding `count` records; anything else is the right-most child of an
/// internal page holding `count` `(child, record)` pairs.
///
/// Every block may be materialized once per decode; a second pointer to the
/// same block fails with [`DsStoreError::RepeatedBlock`].
pub struct NodeDecoder<'a> {
    arena: Arena<'a>,
    table: &'a BlockAddressTable,
    plist: Option<&'a dyn EmbeddedPlistDecoder>,
    depth_limit: u32,
}

impl<'a> NodeDecoder<'a> {
    /// Creates a decoder bounded by the default [`DecodeOptions::max_depth`]
    /// and without a plist decoder.
    pub fn new(arena: Arena<'a>, table: &'a BlockAddressTable) -> Self {
        Self {
            arena,
            table,
            plist: None,
            depth_limit: DecodeOptions::default().max_depth,
        }
    }

    /// Decodes embedded property lists with `decoder`.
    pub fn with_plist_decoder(mut self, decoder: Option<&'a dyn EmbeddedPlistDecoder>) -> Self {
        self.plist = decoder;
        self
    }

    /// Rejects pages deeper than `limit` below the root.
    pub fn with_depth_limit(mut self, limit: u32) -> Self {
        self.depth_limit = limit;
        self
    }

    /// Decodes the subtree rooted at `block`.
    pub fn decode(&self, block: BlockNumber) -> Result<BTreeNode> {
        let mut visited = FxHashSet::default();
        self.decode_at(block, 0, &mut visited)
    }

    fn decode_at(
        &self,
        block: BlockNumber,
        depth: u32,
        visited: &mut FxHashSet<BlockNumber>,
    ) -> Result<BTreeNode> {
        if depth > self.depth_limit {
            return Err(DsStoreError::MaxDepthExceeded {
                depth,
                limit: self.depth_limit,
            });
        }
        if !visited.insert(block) {
            return Err(DsStoreError::RepeatedBlock(block));
        }
        let bytes = self.arena.dereference(block, self.table)?;
        let mut cur = Cursor::new(bytes);
        let p = cur.read_u32()?;
        let count = cur.read_u32()? as usize;
        let capacity = count.min(cur.remaining() / MIN_RECORD_LEN);

        if p == 0 {
            let mut records = Vec::with_capacity(capacity);
            for _ in 0..count {
                records.push(Record::decode(&mut cur, self.plist)?);
            }
            debug!(block = block.0, depth, records = count, "decoded leaf");
            return Ok(BTreeNode::Leaf { records });
        }

        let mut entries = Vec::with_capacity(capacity);
        for _ in 0..count {
            let child = BlockNumber(cur.read_u32()?);
            let record = Record::decode(&mut cur, self.plist)?;
            entries.push((child, record));
        }
        let entries = entries
            .into_iter()
            .map(|(child, record)| {
                Ok(InternalEntry {
                    child: self.child(child, depth, visited)?,
                    record,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let trailing = self.child(BlockNumber(p), depth, visited)?;
        debug!(block = block.0, depth, entries = count, trailing = p, "decoded internal node");
        Ok(BTreeNode::Internal { entries, trailing })
    }

    fn child(
        &self,
        block: BlockNumber,
        depth: u32,
        visited: &mut FxHashSet<BlockNumber>,
    ) -> Result<ChildRef> {
        Ok(ChildRef {
            block,
            node: Box::new(self.decode_at(block, depth + 1, visited)?),
        })
    }
}

/// Decodes the subtree rooted at `block` under the default depth limit,
/// keeping property-list payloads as blobs.
pub fn decode_node(
    arena: Arena<'_>,
    table: &BlockAddressTable,
    block: BlockNumber,
) -> Result<BTreeNode> {
    NodeDecoder::new(arena, table).decode(block)
}
