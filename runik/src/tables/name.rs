//! The [name](https://learn.microsoft.com/en-us/typography/opentype/spec/name) table.

use runik_types::Tag;

use crate::{error::ReadError, font_data::FontData};

/// Well-known name ids.
pub mod name_id {
    pub const FAMILY_NAME: u16 = 1;
    pub const SUBFAMILY_NAME: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION_STRING: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
}

/// A single name record; the string lives in the table's storage area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub length: u16,
    pub string_offset: u16,
}

impl NameRecord {
    /// True if the record's string is UTF-16BE (Unicode and Windows
    /// platforms); otherwise it is treated as Latin-1.
    fn is_utf16(&self) -> bool {
        matches!(self.platform_id, 0 | 3)
    }
}

/// The naming table (format 0).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name {
    pub records: Vec<NameRecord>,
    storage: Vec<u8>,
}

impl Name {
    pub const TAG: Tag = Tag::new(b"name");

    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version = cursor.read::<u16>()?;
        if version > 1 {
            return Err(ReadError::InvalidFormat(version as i64));
        }
        let count = cursor.read::<u16>()?;
        let storage_offset = cursor.read::<u16>()? as usize;
        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            records.push(NameRecord {
                platform_id: cursor.read::<u16>()?,
                encoding_id: cursor.read::<u16>()?,
                language_id: cursor.read::<u16>()?,
                name_id: cursor.read::<u16>()?,
                length: cursor.read::<u16>()?,
                string_offset: cursor.read::<u16>()?,
            });
        }
        let storage = data
            .split_off(storage_offset)
            .ok_or(ReadError::OutOfBounds)?
            .as_bytes()
            .to_vec();
        Ok(Name { records, storage })
    }

    /// Decodes the string for a record.
    pub fn string(&self, record: &NameRecord) -> Option<String> {
        let start = record.string_offset as usize;
        let bytes = self.storage.get(start..start + record.length as usize)?;
        if record.is_utf16() {
            if bytes.len() % 2 != 0 {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        } else {
            // Macintosh platform strings decode as Latin-1
            Some(bytes.iter().map(|&byte| byte as char).collect())
        }
    }

    /// The first record with the given name id, preferring Unicode and
    /// Windows platform entries.
    pub fn find(&self, name_id: u16) -> Option<String> {
        self.records
            .iter()
            .filter(|rec| rec.name_id == name_id)
            .max_by_key(|rec| rec.is_utf16())
            .and_then(|rec| self.string(rec))
    }
}
