//! Low-level primitives shared by the decoders.
//!
//! Includes byte cursors, block address packing and the arena view used to
//! resolve addresses into file bytes.

/// Packed block address helpers.
pub mod address;

/// Arena view and block address table.
pub mod arena;

/// Byte-level utilities and decoding.
///
/// Bounds-checked big-endian cursor and UTF-16 helpers.
pub mod bytes;
