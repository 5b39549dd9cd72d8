use std::collections::BTreeMap;

use serde::Serialize;

/// A decoded property list value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlistValue {
    /// `true` or `false`.
    Boolean(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// Seconds relative to 2001-01-01T00:00:00Z.
    Date(f64),
    /// Raw bytes.
    Data(#[serde(serialize_with = "crate::types::serialize_hex")] Vec<u8>),
    /// Text.
    String(String),
    /// Keyed-archiver object reference.
    Uid(u64),
    /// Ordered list; sets are decoded as arrays.
    Array(Vec<PlistValue>),
    /// String-keyed mapping.
    Dictionary(BTreeMap<String, PlistValue>),
}

impl PlistValue {
    /// Looks up `key` when this value is a dictionary.
    pub fn get(&self, key: &str) -> Option<&PlistValue> {
        match self {
            PlistValue::Dictionary(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns the dictionary entries, if any.
    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, PlistValue>> {
        match self {
            PlistValue::Dictionary(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the bytes of a data value.
    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            PlistValue::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlistValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlistValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a numeric value as `f64`, accepting integers and reals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PlistValue::Integer(i) => Some(*i as f64),
            PlistValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}
