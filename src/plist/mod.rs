#![forbid(unsafe_code)]

//! Embedded property list decoding.
//!
//! Several record types (`bwsp`, `icvp`, `lsvp`, `lsvP`) store a binary
//! property list inside their blob payload. The record decoder hands those
//! bytes to an [`EmbeddedPlistDecoder`]; [`BinaryPlistDecoder`] is the
//! implementation used unless the caller supplies another one.

mod binary;
mod value;

pub use value::PlistValue;

/// Errors raised by the property list decoder.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlistError {
    /// The payload does not start with `bplist00`.
    #[error("missing bplist00 magic")]
    BadMagic,
    /// A structure extends past the end of the payload.
    #[error("truncated property list: {0}")]
    Truncated(&'static str),
    /// The trailer holds impossible values.
    #[error("invalid property list trailer: {0}")]
    InvalidTrailer(&'static str),
    /// An object reference points past the offset table.
    #[error("object reference {0} out of range")]
    BadObjectRef(u64),
    /// An object marker this decoder does not handle.
    #[error("unsupported object marker 0x{0:02x}")]
    UnsupportedMarker(u8),
    /// A string object is not valid ASCII or UTF-16.
    #[error("invalid string object")]
    InvalidString,
    /// A dictionary key is not a string.
    #[error("dictionary key is not a string")]
    NonStringKey,
    /// An integer does not fit in 64 signed bits.
    #[error("integer does not fit in 64 bits")]
    IntegerTooLarge,
    /// An object contains itself.
    #[error("object {0} references itself")]
    Cycle(u64),
    /// Containers nest deeper than the decoder allows.
    #[error("containers nested too deeply")]
    NestingTooDeep,
    /// Shared references expand to more objects than the payload can hold.
    #[error("property list expands to too many objects")]
    TooManyObjects,
}

/// Decodes the property list bytes carried inside a record blob.
pub trait EmbeddedPlistDecoder {
    /// Decodes `bytes` into a value tree.
    fn decode(&self, bytes: &[u8]) -> Result<PlistValue, PlistError>;
}

/// Decoder for Apple's `bplist00` binary format.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryPlistDecoder;

impl EmbeddedPlistDecoder for BinaryPlistDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PlistValue, PlistError> {
        binary::parse(bytes)
    }
}
