#![forbid(unsafe_code)]
//! Big-endian reading utilities shared by every decoder.

pub mod buf {
    //! A slice-backed cursor for bounds-checked parsing.

    use core::fmt;

    use crate::types::{DsStoreError, FourCC, Result};

    /// A cursor for reading bytes from a slice with offset tracking.
    ///
    /// Every read is checked against the slice; running off the end yields
    /// [`DsStoreError::OutOfBounds`] with offsets relative to the slice start.
    #[derive(Clone)]
    pub struct Cursor<'a> {
        /// The underlying byte slice.
        pub buf: &'a [u8],
        /// Current read offset.
        pub off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Takes the next `n` bytes from the cursor, advancing the offset.
        pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
            let end = self
                .off
                .checked_add(n)
                .filter(|end| *end <= self.buf.len())
                .ok_or_else(|| DsStoreError::out_of_bounds(self.off, n, self.buf.len()))?;
            let slice = &self.buf[self.off..end];
            self.off = end;
            Ok(slice)
        }

        /// Takes exactly `N` bytes as an array.
        pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
            let mut out = [0u8; N];
            out.copy_from_slice(self.take(N)?);
            Ok(out)
        }

        /// Reads one byte.
        pub fn read_u8(&mut self) -> Result<u8> {
            Ok(self.take_array::<1>()?[0])
        }

        /// Reads a big-endian `u16`.
        pub fn read_u16(&mut self) -> Result<u16> {
            Ok(u16::from_be_bytes(self.take_array()?))
        }

        /// Reads a big-endian `u32`.
        pub fn read_u32(&mut self) -> Result<u32> {
            Ok(u32::from_be_bytes(self.take_array()?))
        }

        /// Reads a big-endian `u64`.
        pub fn read_u64(&mut self) -> Result<u64> {
            Ok(u64::from_be_bytes(self.take_array()?))
        }

        /// Reads a four-character code.
        pub fn read_fourcc(&mut self) -> Result<FourCC> {
            Ok(FourCC(self.take_array()?))
        }

        /// Reads `chars` UTF-16BE code units and decodes them.
        pub fn read_utf16(&mut self, chars: usize, what: &'static str) -> Result<String> {
            let byte_len = chars
                .checked_mul(2)
                .ok_or_else(|| DsStoreError::out_of_bounds(self.off, usize::MAX, self.buf.len()))?;
            let raw = self.take(byte_len)?;
            super::utf16::decode_be(raw).ok_or(DsStoreError::InvalidText(what))
        }

        /// Skips `n` bytes.
        pub fn skip(&mut self, n: usize) -> Result<()> {
            self.take(n).map(|_| ())
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}

pub mod utf16 {
    //! Big-endian UTF-16 helpers.

    /// Decodes big-endian UTF-16 bytes, returning `None` on odd length or
    /// unpaired surrogates.
    pub fn decode_be(raw: &[u8]) -> Option<String> {
        if raw.len() % 2 != 0 {
            return None;
        }
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    }

    /// Encodes text as big-endian UTF-16, returning the bytes and the number
    /// of code units.
    pub fn encode_be(text: &str) -> (Vec<u8>, usize) {
        let mut out = Vec::with_capacity(text.len() * 2);
        let mut units = 0usize;
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_be_bytes());
            units += 1;
        }
        (out, units)
    }
}
