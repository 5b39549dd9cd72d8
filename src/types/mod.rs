#![forbid(unsafe_code)]

//! Shared identifiers, four-character codes and the crate-wide error type.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::plist::PlistError;

/// Index into the allocator's block address table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct BlockNumber(pub u32);

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BlockNumber {
    fn from(value: u32) -> Self {
        BlockNumber(value)
    }
}

/// Four raw bytes naming a record type, data type, file type or creator.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Builds a code from a four-byte literal such as `b"Iloc"`.
    pub const fn new(bytes: &[u8; 4]) -> Self {
        FourCC(*bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Returns the code as text when every byte is printable ASCII.
    pub fn as_str(&self) -> Option<&str> {
        if self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            std::str::from_utf8(&self.0).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => f.write_str(text),
            None => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors raised while decoding a `.DS_Store` file.
#[derive(thiserror::Error, Debug)]
pub enum DsStoreError {
    /// Reading the input file failed.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// The allocator header failed its magic or duplicated-offset check.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),
    /// The allocator directory has no entry with the requested name.
    #[error("directory entry {0:?} not found")]
    MissingDirectoryEntry(String),
    /// A block number maps to no allocated block.
    #[error("block {0} is unassigned")]
    UnassignedBlock(BlockNumber),
    /// A tree page is pointed to more than once.
    #[error("block {0} is referenced by more than one tree page")]
    RepeatedBlock(BlockNumber),
    /// A read or a resolved block extends past the end of its buffer.
    #[error("read of {len} bytes at offset {offset} exceeds buffer of {available} bytes")]
    OutOfBounds {
        /// Absolute or block-relative offset of the failed read.
        offset: u64,
        /// Number of bytes requested.
        len: u64,
        /// Bytes actually available.
        available: u64,
    },
    /// A record carries a type tag outside the known set.
    #[error("unknown record type {0}")]
    UnknownRecordType(FourCC),
    /// Text stored as UTF-16BE could not be decoded.
    #[error("invalid UTF-16 text in {0}")]
    InvalidText(&'static str),
    /// An alias record has a field that contradicts its own layout.
    #[error("invalid alias record: {0}")]
    InvalidAlias(&'static str),
    /// An embedded property list could not be decoded.
    #[error("malformed embedded payload in {record_type} record for {filename:?}: {source}")]
    MalformedEmbeddedPayload {
        /// Filename of the enclosing record.
        filename: String,
        /// Type of the enclosing record.
        record_type: FourCC,
        /// Decoder failure.
        #[source]
        source: PlistError,
    },
    /// Tree recursion went deeper than the metadata or configuration allows.
    #[error("b-tree depth {depth} exceeds limit {limit}")]
    MaxDepthExceeded {
        /// Depth reached.
        depth: u32,
        /// Maximum allowed depth.
        limit: u32,
    },
    /// Two free ranges overlap.
    #[error("free ranges [{first_start}, {first_end}) and [{second_start}, {second_end}) overlap")]
    FreeListInconsistency {
        /// Start of the earlier range.
        first_start: u64,
        /// End of the earlier range.
        first_end: u64,
        /// Start of the later range.
        second_start: u64,
        /// End of the later range.
        second_end: u64,
    },
    /// Walking the tree found different totals than its metadata declares.
    #[error("b-tree {what} mismatch: metadata declares {expected}, tree holds {found}")]
    TreeCountMismatch {
        /// Which counter disagreed.
        what: &'static str,
        /// Value from the metadata block.
        expected: u64,
        /// Value counted while walking.
        found: u64,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DsStoreError>;

impl DsStoreError {
    pub(crate) fn out_of_bounds(offset: usize, len: usize, available: usize) -> Self {
        DsStoreError::OutOfBounds {
            offset: offset as u64,
            len: len as u64,
            available: available as u64,
        }
    }
}

/// Serializes raw bytes as a lowercase hex string.
pub(crate) fn serialize_hex<S: Serializer>(
    bytes: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
