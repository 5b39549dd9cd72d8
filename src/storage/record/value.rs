use serde::{Serialize, Serializer};
use time::{macros::datetime, Duration, OffsetDateTime};

use crate::plist::{PlistError, PlistValue};
use crate::types::FourCC;

/// A `dutc` timestamp: ticks of 1/65536 second since 1904-01-01T00:00:00Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacTimestamp(pub u64);

impl MacTimestamp {
    /// The classic Mac OS epoch.
    pub const EPOCH: OffsetDateTime = datetime!(1904-01-01 0:00 UTC);

    /// Whole seconds since the epoch.
    pub fn seconds(self) -> u64 {
        self.0 >> 16
    }

    /// Converts to a calendar time, `None` if it falls outside `time`'s range.
    pub fn to_datetime(self) -> Option<OffsetDateTime> {
        let secs = i64::try_from(self.seconds()).ok()?;
        let nanos = (((self.0 & 0xffff) * 1_000_000_000) >> 16) as i32;
        Self::EPOCH.checked_add(Duration::new(secs, nanos))
    }
}

impl Serialize for MacTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = self
            .to_datetime()
            .and_then(|dt| dt.format(&time::format_description::well_known::Rfc3339).ok());
        match formatted {
            Some(text) => serializer.serialize_str(&text),
            None => serializer.serialize_u64(self.0),
        }
    }
}

/// Decoded payload of a record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RecordValue {
    /// `long` integer.
    Long(u32),
    /// `shor` integer, stored in four bytes.
    Short(u32),
    /// `bool`.
    Bool(bool),
    /// Opaque `blob` bytes.
    Blob(#[serde(serialize_with = "crate::types::serialize_hex")] Vec<u8>),
    /// `type` four-character code.
    Type(FourCC),
    /// `ustr` text.
    Text(String),
    /// `comp` 64-bit integer.
    Comp(u64),
    /// `dutc` timestamp.
    Date(MacTimestamp),
    /// Blob decoded as an embedded property list.
    PropertyList(PlistValue),
    /// Blob that should hold a property list but failed to decode.
    Undecoded {
        /// The raw blob.
        #[serde(serialize_with = "crate::types::serialize_hex")]
        bytes: Vec<u8>,
        /// Why decoding failed.
        #[serde(serialize_with = "serialize_display")]
        error: PlistError,
    },
}

fn serialize_display<S: Serializer>(err: &PlistError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(err)
}

impl RecordValue {
    /// Raw bytes for blob-shaped payloads, including undecoded property lists.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RecordValue::Blob(bytes) | RecordValue::Undecoded { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// Integer payloads widened to `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RecordValue::Long(v) | RecordValue::Short(v) => Some(u64::from(*v)),
            RecordValue::Comp(v) => Some(*v),
            _ => None,
        }
    }

    /// Embedded property list, when decoded.
    pub fn as_plist(&self) -> Option<&PlistValue> {
        match self {
            RecordValue::PropertyList(value) => Some(value),
            _ => None,
        }
    }
}
