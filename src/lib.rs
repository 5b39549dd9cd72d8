//! Decoder for the macOS `.DS_Store` directory metadata format.
//!
//! A `.DS_Store` file is a buddy-allocated arena holding a B-tree of typed
//! property records keyed by filename. [`DsStore::decode`] reads the whole
//! structure into owned values; the lower layers are public for tools that
//! need to inspect individual blocks.

#![warn(missing_docs)]

pub mod alias;
pub mod logging;
pub mod options;
pub mod plist;
pub mod primitives;
pub mod storage;
pub mod store;
pub mod types;

pub use options::DecodeOptions;
pub use plist::{BinaryPlistDecoder, EmbeddedPlistDecoder, PlistError, PlistValue};
pub use storage::btree::{BTree, BTreeMetadata, BTreeNode};
pub use storage::record::{Record, RecordKind, RecordValue};
pub use store::DsStore;
pub use types::{BlockNumber, DsStoreError, FourCC, Result};
