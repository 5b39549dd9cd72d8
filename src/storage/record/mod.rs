#![forbid(unsafe_code)]

//! Property records stored in the B-tree.
//!
//! A record is a UTF-16BE filename, a record-type tag, a data-type tag and a
//! payload. The payload's shape comes from the record-type tag through
//! [`RecordKind`]; the data-type tag is kept but only checked for logging.

mod kind;
mod value;

pub use kind::{RecordKind, ValueShape};
pub use value::{MacTimestamp, RecordValue};

use serde::Serialize;
use tracing::{debug, warn};

use crate::plist::EmbeddedPlistDecoder;
use crate::primitives::bytes::buf::Cursor;
use crate::types::{DsStoreError, FourCC, Result};

/// Property list key holding the background image alias in `icvp` records.
pub const BACKGROUND_ALIAS_KEY: &str = "backgroundImageAlias";

/// One property entry for a file in the directory.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    /// Name of the file the property belongs to; `.` names the directory itself.
    pub filename: String,
    /// Which property this record describes.
    pub record_type: FourCC,
    /// Advertised payload encoding.
    pub data_type: FourCC,
    /// Decoded payload.
    pub value: RecordValue,
}

impl Record {
    /// Decodes one record at the cursor.
    ///
    /// `plist` decodes embedded property lists; pass `None` to keep those
    /// payloads as plain blobs.
    pub fn decode(cur: &mut Cursor<'_>, plist: Option<&dyn EmbeddedPlistDecoder>) -> Result<Self> {
        let name_len = cur.read_u32()? as usize;
        let filename = cur.read_utf16(name_len, "record filename")?;
        let record_type = cur.read_fourcc()?;
        let data_type = cur.read_fourcc()?;

        let kind =
            RecordKind::from_code(record_type).ok_or(DsStoreError::UnknownRecordType(record_type))?;
        let shape = kind.shape();
        if shape.data_type() != data_type {
            debug!(
                %filename,
                %record_type,
                %data_type,
                expected = %shape.data_type(),
                "record data type differs from its record type"
            );
        }

        let value = match shape {
            ValueShape::Long => RecordValue::Long(cur.read_u32()?),
            ValueShape::Short => RecordValue::Short(cur.read_u32()?),
            ValueShape::Bool => RecordValue::Bool(cur.read_u8()? != 0),
            ValueShape::Blob => RecordValue::Blob(read_blob(cur)?),
            ValueShape::Type => RecordValue::Type(cur.read_fourcc()?),
            ValueShape::Text => {
                let chars = cur.read_u32()? as usize;
                RecordValue::Text(cur.read_utf16(chars, "text payload")?)
            }
            ValueShape::Comp => RecordValue::Comp(cur.read_u64()?),
            ValueShape::Date => RecordValue::Date(MacTimestamp(cur.read_u64()?)),
            ValueShape::PropertyList => {
                let bytes = read_blob(cur)?;
                match plist {
                    None => RecordValue::Blob(bytes),
                    Some(decoder) => match decoder.decode(&bytes) {
                        Ok(value) => RecordValue::PropertyList(value),
                        Err(error) => {
                            warn!(%filename, %record_type, %error, "embedded property list not decoded");
                            RecordValue::Undecoded { bytes, error }
                        }
                    },
                }
            }
        };

        Ok(Self {
            filename,
            record_type,
            data_type,
            value,
        })
    }

    /// The record's kind. Always known for decoded records.
    pub fn kind(&self) -> Option<RecordKind> {
        RecordKind::from_code(self.record_type)
    }

    /// The payload failure for property lists that did not decode.
    pub fn payload_error(&self) -> Option<DsStoreError> {
        match &self.value {
            RecordValue::Undecoded { error, .. } => Some(DsStoreError::MalformedEmbeddedPayload {
                filename: self.filename.clone(),
                record_type: self.record_type,
                source: error.clone(),
            }),
            _ => None,
        }
    }

    /// Alias record bytes naming the folder's background picture.
    ///
    /// Found under [`BACKGROUND_ALIAS_KEY`] in `icvp` records, or as the
    /// whole payload of `pict` records.
    pub fn background_image_alias(&self) -> Option<&[u8]> {
        match self.kind()? {
            RecordKind::IconViewSettings => self
                .value
                .as_plist()?
                .get(BACKGROUND_ALIAS_KEY)?
                .as_data(),
            RecordKind::BackgroundPicture => self.value.as_bytes(),
            _ => None,
        }
    }
}

fn read_blob<'a>(cur: &mut Cursor<'a>) -> Result<Vec<u8>> {
    let len = cur.read_u32()? as usize;
    Ok(cur.take(len)?.to_vec())
}
