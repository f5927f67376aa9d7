//! A growable big-endian writer.

use runik_types::Scalar;

/// A write cursor over an owned, growable byte buffer.
///
/// Writes append at the end of the buffer; fields whose values are only
/// known after later data has been laid out (checksums, lengths) are
/// written with [`patch`](Self::patch), which overwrites in place without
/// moving the append position.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Writer {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends a scalar in its big-endian encoding.
    pub fn write<T: Scalar>(&mut self, value: T) {
        value.write(&mut self.buf);
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends zero bytes until the length is a multiple of `align`.
    pub fn pad_to(&mut self, align: usize) {
        while self.buf.len() % align != 0 {
            self.buf.push(0);
        }
    }

    /// Overwrites a previously written scalar at an absolute offset.
    ///
    /// The append position is unaffected. Panics in debug builds if the
    /// patched range was never written.
    pub fn patch<T: Scalar>(&mut self, offset: usize, value: T) {
        debug_assert!(offset + T::RAW_BYTE_LEN <= self.buf.len());
        let mut raw = Vec::with_capacity(T::RAW_BYTE_LEN);
        value.write(&mut raw);
        self.buf[offset..offset + raw.len()].copy_from_slice(&raw);
    }

    /// Consumes the writer, returning the completed buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runik_types::{Tag, Uint24};

    #[test]
    fn append_and_read_back() {
        let mut writer = Writer::new();
        writer.write(0x0102u16);
        writer.write(Tag::new(b"loca"));
        writer.write(Uint24::new(0x010203));
        assert_eq!(
            writer.as_bytes(),
            [0x01, 0x02, b'l', b'o', b'c', b'a', 0x01, 0x02, 0x03]
        );
    }

    #[test]
    fn u24_writes_three_bytes() {
        let mut writer = Writer::new();
        writer.write(Uint24::new(0x010203));
        writer.write(0u8);
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 4);
        assert_eq!(bytes[3], 0);
        let mut cursor = crate::FontData::new(&bytes).cursor();
        assert_eq!(cursor.read::<Uint24>().unwrap().to_u32(), 0x010203);
    }

    #[test]
    fn padding() {
        let mut writer = Writer::new();
        writer.write_bytes(&[1, 2, 3, 4, 5]);
        writer.pad_to(4);
        assert_eq!(writer.len(), 8);
        writer.pad_to(4);
        assert_eq!(writer.len(), 8);
    }

    #[test]
    fn patching() {
        let mut writer = Writer::new();
        writer.write(0u32);
        writer.write(0xAAu8);
        writer.patch(0, 0xB1B0AFBAu32);
        assert_eq!(writer.as_bytes(), [0xB1, 0xB0, 0xAF, 0xBA, 0xAA]);
    }
}
