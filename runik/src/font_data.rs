//! Raw font bytes with typed, bounds-checked reads.

use std::ops::{Bound, Range, RangeBounds};

use runik_types::Scalar;

use crate::error::ReadError;

/// An immutable view into some font bytes.
///
/// All multi-byte reads are big-endian. Views can be carved into bounded
/// sub-views that share the underlying storage without copying.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontData<'a> {
    bytes: &'a [u8],
}

impl<'a> FontData<'a> {
    /// Creates a new `FontData` over the provided bytes.
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }

    /// The length of the underlying data.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns a sub-view covering the provided range, if in bounds.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let range = self.resolve_range(range)?;
        self.bytes.get(range).map(|bytes| FontData { bytes })
    }

    /// Returns a sub-view beginning at the provided offset, if in bounds.
    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(|bytes| FontData { bytes })
    }

    fn resolve_range(&self, range: impl RangeBounds<usize>) -> Option<Range<usize>> {
        let start = match range.start_bound() {
            Bound::Unbounded => 0,
            Bound::Included(start) => *start,
            Bound::Excluded(start) => start.checked_add(1)?,
        };
        let end = match range.end_bound() {
            Bound::Unbounded => self.len(),
            Bound::Included(end) => end.checked_add(1)?,
            Bound::Excluded(end) => *end,
        };
        (start <= end).then_some(start..end)
    }

    /// Reads a scalar at the provided byte offset.
    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        self.bytes
            .get(offset..)
            .and_then(T::read)
            .ok_or(ReadError::OutOfBounds)
    }

    /// Returns a cursor positioned at the start of the data.
    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }
}

impl<'a> From<&'a [u8]> for FontData<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        FontData { bytes }
    }
}

/// A sequential reader over a [`FontData`].
#[derive(Clone)]
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> Cursor<'a> {
    /// The current position, relative to the start of the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to an absolute position.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Advances the cursor by `n` bytes, checking bounds.
    pub fn advance_by(&mut self, n: usize) -> Result<(), ReadError> {
        let new_pos = self.pos.checked_add(n).ok_or(ReadError::OutOfBounds)?;
        if new_pos > self.data.len() {
            return Err(ReadError::OutOfBounds);
        }
        self.pos = new_pos;
        Ok(())
    }

    /// The number of bytes remaining past the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The bytes remaining past the cursor.
    pub fn remaining_bytes(&self) -> &'a [u8] {
        self.data.as_bytes().get(self.pos..).unwrap_or_default()
    }

    /// Reads a scalar, advancing by its encoded length.
    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let value = self.data.read_at::<T>(self.pos)?;
        self.pos += T::RAW_BYTE_LEN;
        Ok(value)
    }

    /// Reads `len` raw bytes, advancing past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        let end = self.pos.checked_add(len).ok_or(ReadError::OutOfBounds)?;
        let bytes = self
            .data
            .as_bytes()
            .get(self.pos..end)
            .ok_or(ReadError::OutOfBounds)?;
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a UIntBase128, the variable-length integer used by WOFF2.
    ///
    /// Big-endian base-128 with a continuation bit; at most five bytes.
    /// A leading zero byte (0x80) and values past 32 bits are rejected.
    ///
    /// See <https://www.w3.org/TR/WOFF2/#DataTypes>
    pub fn read_base128(&mut self) -> Result<u32, ReadError> {
        let mut accum = 0u32;
        for i in 0..5 {
            let byte = self.read::<u8>()?;
            // No leading zeros allowed
            if i == 0 && byte == 0x80 {
                return Err(ReadError::MalformedData("leading zero in UIntBase128"));
            }
            // If any of the top 7 bits are set then accum << 7 would overflow
            if accum & 0xFE00_0000 != 0 {
                return Err(ReadError::MalformedData("UIntBase128 overflows u32"));
            }
            accum = (accum << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(accum);
            }
        }
        Err(ReadError::MalformedData("UIntBase128 exceeds 5 bytes"))
    }

    /// Reads a 255UInt16, the packed u16 variant used by WOFF2.
    ///
    /// A single byte 0..=252 is the literal value; 253 prefixes a full
    /// u16; 254 and 255 add 506 or 253 to a following byte.
    ///
    /// See <https://www.w3.org/TR/WOFF2/#DataTypes>
    pub fn read_packed_u16(&mut self) -> Result<u16, ReadError> {
        const LOWEST_U_CODE: u16 = 253;
        let code = self.read::<u8>()?;
        Ok(match code {
            255 => u16::from(self.read::<u8>()?) + LOWEST_U_CODE,
            254 => u16::from(self.read::<u8>()?) + LOWEST_U_CODE * 2,
            253 => self.read::<u16>()?,
            _ => u16::from(code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runik_types::{F2Dot14, Tag, Uint24};

    #[test]
    fn typed_reads() {
        let bytes = [0x00, 0x01, 0x01, 0x02, 0x03, b'g', b'l', b'y', b'f', 0x70, 0x00];
        let mut cursor = FontData::new(&bytes).cursor();
        assert_eq!(cursor.read::<u16>().unwrap(), 1);
        assert_eq!(cursor.read::<Uint24>().unwrap().to_u32(), 0x010203);
        assert_eq!(cursor.read::<Tag>().unwrap(), Tag::new(b"glyf"));
        assert_eq!(cursor.read::<F2Dot14>().unwrap(), F2Dot14::from_f32(1.75));
        assert!(cursor.is_empty());
        assert!(matches!(cursor.read::<u8>(), Err(ReadError::OutOfBounds)));
    }

    #[test]
    fn carving() {
        let bytes = [0u8, 1, 2, 3, 4, 5];
        let data = FontData::new(&bytes);
        assert_eq!(data.slice(2..4).unwrap().as_bytes(), &[2, 3]);
        assert_eq!(data.split_off(4).unwrap().as_bytes(), &[4, 5]);
        assert!(data.slice(2..9).is_none());
        assert!(data.split_off(7).is_none());
    }

    #[test]
    fn base128() {
        // Single byte
        let mut cursor = FontData::new(&[0x3F]).cursor();
        assert_eq!(cursor.read_base128().unwrap(), 0x3F);
        // Zero
        let mut cursor = FontData::new(&[0x00]).cursor();
        assert_eq!(cursor.read_base128().unwrap(), 0);
        // Multi-byte: 0x81 0x02 => (1 << 7) | 2
        let mut cursor = FontData::new(&[0x81, 0x02]).cursor();
        assert_eq!(cursor.read_base128().unwrap(), 130);
        // Maximum u32
        let mut cursor = FontData::new(&[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]).cursor();
        assert_eq!(cursor.read_base128().unwrap(), u32::MAX);
    }

    #[test]
    fn base128_rejects_leading_zero() {
        let mut cursor = FontData::new(&[0x80, 0x3F]).cursor();
        assert!(cursor.read_base128().is_err());
    }

    #[test]
    fn base128_rejects_overlong() {
        let mut cursor = FontData::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]).cursor();
        assert!(cursor.read_base128().is_err());
        let mut cursor = FontData::new(&[0x90, 0xFF, 0xFF, 0xFF, 0x7F]).cursor();
        assert!(cursor.read_base128().is_err());
    }

    #[test]
    fn packed_u16() {
        let mut cursor = FontData::new(&[0x00]).cursor();
        assert_eq!(cursor.read_packed_u16().unwrap(), 0);
        let mut cursor = FontData::new(&[0xFC]).cursor();
        assert_eq!(cursor.read_packed_u16().unwrap(), 252);
        let mut cursor = FontData::new(&[0xFF, 0x00]).cursor();
        assert_eq!(cursor.read_packed_u16().unwrap(), 253);
        let mut cursor = FontData::new(&[0xFE, 0x00]).cursor();
        assert_eq!(cursor.read_packed_u16().unwrap(), 506);
        let mut cursor = FontData::new(&[0xFD, 0x12, 0x34]).cursor();
        assert_eq!(cursor.read_packed_u16().unwrap(), 0x1234);
    }
}
