//! CFF INDEX structures.

use crate::{error::ReadError, font_data::Cursor};

/// An INDEX: a count-prefixed array of variable length byte objects.
///
/// Offsets in the file are relative to the byte preceding the object
/// data, so lookups subtract one.
#[derive(Clone, Debug, Default)]
pub struct Index<'a> {
    count: usize,
    off_size: u8,
    /// The `count + 1` packed offsets.
    offsets: &'a [u8],
    data: &'a [u8],
}

impl<'a> Index<'a> {
    /// Reads an INDEX, leaving the cursor positioned after it.
    pub fn read(cursor: &mut Cursor<'a>) -> Result<Self, ReadError> {
        let count = cursor.read::<u16>()? as usize;
        if count == 0 {
            return Ok(Index::default());
        }
        let off_size = cursor.read::<u8>()?;
        if !(1..=4).contains(&off_size) {
            return Err(ReadError::MalformedData("invalid INDEX offset size"));
        }
        let offsets = cursor.read_bytes((count + 1) * off_size as usize)?;
        let data_len = read_offset(offsets, count, off_size)?
            .checked_sub(1)
            .ok_or(ReadError::MalformedData("INDEX offset below 1"))?;
        let data = cursor.read_bytes(data_len)?;
        Ok(Index {
            count,
            off_size,
            offsets,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The bytes of object `index`.
    pub fn get(&self, index: usize) -> Result<&'a [u8], ReadError> {
        if index >= self.count {
            return Err(ReadError::MalformedData("INDEX object out of range"));
        }
        let start = read_offset(self.offsets, index, self.off_size)? - 1;
        let end = read_offset(self.offsets, index + 1, self.off_size)? - 1;
        self.data
            .get(start..end)
            .ok_or(ReadError::MalformedData("INDEX offsets out of order"))
    }

    /// The subroutine index bias applied to operands of call operators.
    pub fn subr_bias(&self) -> i32 {
        if self.count < 1240 {
            107
        } else if self.count < 33900 {
            1131
        } else {
            32768
        }
    }
}

fn read_offset(offsets: &[u8], index: usize, off_size: u8) -> Result<usize, ReadError> {
    let start = index * off_size as usize;
    let bytes = offsets
        .get(start..start + off_size as usize)
        .ok_or(ReadError::OutOfBounds)?;
    let mut value = 0usize;
    for byte in bytes {
        value = value << 8 | *byte as usize;
    }
    if value == 0 {
        return Err(ReadError::MalformedData("INDEX offset below 1"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_data::FontData;
    use crate::test_helpers::BeBuffer;

    #[test]
    fn empty_index_is_two_bytes() {
        let bytes = BeBuffer::new().push(0u16).push(0xAAu8).to_vec();
        let data = FontData::new(&bytes);
        let mut cursor = data.cursor();
        let index = Index::read(&mut cursor).unwrap();
        assert_eq!(index.len(), 0);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn objects_and_cursor_position() {
        let bytes = BeBuffer::new()
            .push(2u16) // count
            .push(1u8) // offSize
            .extend([1u8, 3, 6]) // offsets
            .extend([0xAAu8, 0xBB, 0xCC, 0xDD, 0xEE])
            .push(0x55u8) // trailing byte, not part of the INDEX
            .to_vec();
        let data = FontData::new(&bytes);
        let mut cursor = data.cursor();
        let index = Index::read(&mut cursor).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(0).unwrap(), &[0xAA, 0xBB]);
        assert_eq!(index.get(1).unwrap(), &[0xCC, 0xDD, 0xEE]);
        assert!(index.get(2).is_err());
        assert_eq!(cursor.read::<u8>().unwrap(), 0x55);
    }

    #[test]
    fn rejects_zero_offset() {
        let bytes = BeBuffer::new()
            .push(1u16)
            .push(1u8)
            .extend([0u8, 2])
            .extend([0xAAu8])
            .to_vec();
        let data = FontData::new(&bytes);
        let mut cursor = data.cursor();
        let index = Index::read(&mut cursor).unwrap();
        assert!(index.get(0).is_err());
    }

    #[test]
    fn bias_thresholds() {
        let bias = |count: usize| Index {
            count,
            ..Default::default()
        }
        .subr_bias();
        assert_eq!(bias(0), 107);
        assert_eq!(bias(1239), 107);
        assert_eq!(bias(1240), 1131);
        assert_eq!(bias(33899), 1131);
        assert_eq!(bias(33900), 32768);
    }
}
