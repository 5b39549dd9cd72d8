//! Reader for Apple's `bplist00` binary property list encoding.

use std::collections::BTreeMap;

use super::{PlistError, PlistValue};
use crate::primitives::bytes::utf16;

const MAGIC: &[u8; 8] = b"bplist00";
const TRAILER_LEN: usize = 32;
const MAX_NESTING: usize = 64;

#[derive(Debug)]
struct Trailer {
    offset_int_size: usize,
    object_ref_size: usize,
    num_objects: u64,
    top_object: u64,
    offset_table_offset: u64,
}

/// Decodes a complete binary property list.
pub fn parse(data: &[u8]) -> Result<PlistValue, PlistError> {
    if data.len() < MAGIC.len() + TRAILER_LEN {
        return Err(PlistError::Truncated("file shorter than header and trailer"));
    }
    if &data[..MAGIC.len()] != MAGIC {
        return Err(PlistError::BadMagic);
    }
    let body_end = data.len() - TRAILER_LEN;
    let trailer = read_trailer(&data[body_end..])?;

    let table_len = trailer
        .num_objects
        .checked_mul(trailer.offset_int_size as u64)
        .ok_or(PlistError::InvalidTrailer("object count overflows"))?;
    let table_start = trailer.offset_table_offset;
    let table_end = table_start
        .checked_add(table_len)
        .ok_or(PlistError::InvalidTrailer("offset table overflows"))?;
    if table_start < MAGIC.len() as u64 || table_end > body_end as u64 {
        return Err(PlistError::InvalidTrailer("offset table outside body"));
    }
    if trailer.top_object >= trailer.num_objects {
        return Err(PlistError::InvalidTrailer("top object out of range"));
    }

    let mut offsets = Vec::with_capacity(trailer.num_objects as usize);
    let mut pos = table_start as usize;
    for _ in 0..trailer.num_objects {
        let off = read_uint(&data[pos..pos + trailer.offset_int_size]);
        if off < MAGIC.len() as u64 || off >= table_start {
            return Err(PlistError::InvalidTrailer("object offset outside body"));
        }
        offsets.push(off as usize);
        pos += trailer.offset_int_size;
    }

    // Each reference takes at least one byte of the body, so a tree-shaped
    // plist never visits more objects than the body has bytes.
    let mut reader = Reader {
        data: &data[..table_start as usize],
        offsets,
        ref_size: trailer.object_ref_size,
        active: Vec::new(),
        budget: table_start as usize,
    };
    reader.object(trailer.top_object)
}

fn read_trailer(raw: &[u8]) -> Result<Trailer, PlistError> {
    let offset_int_size = raw[6] as usize;
    let object_ref_size = raw[7] as usize;
    if !(1..=8).contains(&offset_int_size) || !(1..=8).contains(&object_ref_size) {
        return Err(PlistError::InvalidTrailer("integer width out of range"));
    }
    Ok(Trailer {
        offset_int_size,
        object_ref_size,
        num_objects: read_uint(&raw[8..16]),
        top_object: read_uint(&raw[16..24]),
        offset_table_offset: read_uint(&raw[24..32]),
    })
}

fn read_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

struct Reader<'a> {
    data: &'a [u8],
    offsets: Vec<usize>,
    ref_size: usize,
    active: Vec<u64>,
    budget: usize,
}

impl<'a> Reader<'a> {
    fn object(&mut self, index: u64) -> Result<PlistValue, PlistError> {
        if self.active.contains(&index) {
            return Err(PlistError::Cycle(index));
        }
        if self.active.len() >= MAX_NESTING {
            return Err(PlistError::NestingTooDeep);
        }
        self.budget = self
            .budget
            .checked_sub(1)
            .ok_or(PlistError::TooManyObjects)?;
        let start = *self
            .offsets
            .get(index as usize)
            .ok_or(PlistError::BadObjectRef(index))?;
        self.active.push(index);
        let value = self.decode_at(start);
        self.active.pop();
        value
    }

    fn bytes(&self, start: usize, len: usize) -> Result<&'a [u8], PlistError> {
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or(PlistError::Truncated("object extends past body"))
    }

    fn decode_at(&mut self, start: usize) -> Result<PlistValue, PlistError> {
        let marker = self.bytes(start, 1)?[0];
        let (kind, low) = (marker >> 4, marker & 0x0f);
        match kind {
            0x0 => match low {
                0x8 => Ok(PlistValue::Boolean(false)),
                0x9 => Ok(PlistValue::Boolean(true)),
                _ => Err(PlistError::UnsupportedMarker(marker)),
            },
            0x1 => self.integer(start + 1, low).map(PlistValue::Integer),
            0x2 => {
                let raw = self.bytes(start + 1, 1usize << low)?;
                match raw.len() {
                    4 => Ok(PlistValue::Real(f64::from(f32::from_bits(
                        read_uint(raw) as u32
                    )))),
                    8 => Ok(PlistValue::Real(f64::from_bits(read_uint(raw)))),
                    _ => Err(PlistError::UnsupportedMarker(marker)),
                }
            }
            0x3 if low == 0x3 => {
                let raw = self.bytes(start + 1, 8)?;
                Ok(PlistValue::Date(f64::from_bits(read_uint(raw))))
            }
            0x4 => {
                let (len, body) = self.length(start, low)?;
                Ok(PlistValue::Data(self.bytes(body, len)?.to_vec()))
            }
            0x5 => {
                let (len, body) = self.length(start, low)?;
                let raw = self.bytes(body, len)?;
                if !raw.is_ascii() {
                    return Err(PlistError::InvalidString);
                }
                Ok(PlistValue::String(
                    String::from_utf8(raw.to_vec()).map_err(|_| PlistError::InvalidString)?,
                ))
            }
            0x6 => {
                let (len, body) = self.length(start, low)?;
                let byte_len = len.checked_mul(2).ok_or(PlistError::InvalidString)?;
                let raw = self.bytes(body, byte_len)?;
                utf16::decode_be(raw)
                    .map(PlistValue::String)
                    .ok_or(PlistError::InvalidString)
            }
            0x8 => {
                let raw = self.bytes(start + 1, low as usize + 1)?;
                if raw.len() > 8 {
                    return Err(PlistError::UnsupportedMarker(marker));
                }
                Ok(PlistValue::Uid(read_uint(raw)))
            }
            0xa | 0xc => {
                let (len, body) = self.length(start, low)?;
                let refs = self.refs(body, len)?;
                let mut items = Vec::with_capacity(refs.len());
                for r in refs {
                    items.push(self.object(r)?);
                }
                Ok(PlistValue::Array(items))
            }
            0xd => {
                let (len, body) = self.length(start, low)?;
                let keys = self.refs(body, len)?;
                let values = self.refs(body + len * self.ref_size, len)?;
                let mut map = BTreeMap::new();
                for (k, v) in keys.into_iter().zip(values) {
                    let key = match self.object(k)? {
                        PlistValue::String(s) => s,
                        _ => return Err(PlistError::NonStringKey),
                    };
                    map.insert(key, self.object(v)?);
                }
                Ok(PlistValue::Dictionary(map))
            }
            _ => Err(PlistError::UnsupportedMarker(marker)),
        }
    }

    fn integer(&self, start: usize, low: u8) -> Result<i64, PlistError> {
        let raw = self.bytes(start, 1usize << low)?;
        match raw.len() {
            1 | 2 | 4 => Ok(read_uint(raw) as i64),
            8 => Ok(read_uint(raw) as i64),
            16 => {
                if raw[..8].iter().any(|b| *b != 0) {
                    return Err(PlistError::IntegerTooLarge);
                }
                i64::try_from(read_uint(&raw[8..])).map_err(|_| PlistError::IntegerTooLarge)
            }
            _ => Err(PlistError::IntegerTooLarge),
        }
    }

    /// Returns `(length, body_offset)` for a marker at `start`.
    fn length(&self, start: usize, low: u8) -> Result<(usize, usize), PlistError> {
        if low != 0x0f {
            return Ok((low as usize, start + 1));
        }
        let int_marker = self.bytes(start + 1, 1)?[0];
        if int_marker >> 4 != 0x1 {
            return Err(PlistError::UnsupportedMarker(int_marker));
        }
        let width_log2 = int_marker & 0x0f;
        let len = self.integer(start + 2, width_log2)?;
        let len = usize::try_from(len).map_err(|_| PlistError::IntegerTooLarge)?;
        Ok((len, start + 2 + (1usize << width_log2)))
    }

    fn refs(&self, start: usize, count: usize) -> Result<Vec<u64>, PlistError> {
        let total = count
            .checked_mul(self.ref_size)
            .ok_or(PlistError::Truncated("reference list overflows"))?;
        let raw = self.bytes(start, total)?;
        Ok(raw.chunks_exact(self.ref_size).map(read_uint).collect())
    }
}
