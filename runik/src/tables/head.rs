//! The [head](https://learn.microsoft.com/en-us/typography/opentype/spec/head) table.

use runik_types::{Fixed, LongDateTime, Tag};

use crate::{error::ReadError, font_data::FontData};

/// The font header table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Head {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: Fixed,
    /// Adjustment that makes the whole-file checksum come out to
    /// 0xB1B0AFBA. Zeroed when computing the table's own checksum.
    pub checksum_adjustment: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    /// 0 for short (u16, halved) loca offsets, 1 for long (u32).
    pub index_to_loc_format: i16,
    pub glyph_data_format: i16,
}

impl Head {
    pub const TAG: Tag = Tag::new(b"head");

    /// Byte offset of the `checksum_adjustment` field within the table.
    pub const CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;

    const MAGIC: u32 = 0x5F0F3CF5;

    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let major_version = cursor.read::<u16>()?;
        let minor_version = cursor.read::<u16>()?;
        let font_revision = cursor.read::<Fixed>()?;
        let checksum_adjustment = cursor.read::<u32>()?;
        let magic = cursor.read::<u32>()?;
        if magic != Self::MAGIC {
            return Err(ReadError::MalformedData("bad magic number in head"));
        }
        let flags = cursor.read::<u16>()?;
        let units_per_em = cursor.read::<u16>()?;
        let created = cursor.read::<LongDateTime>()?;
        let modified = cursor.read::<LongDateTime>()?;
        let x_min = cursor.read::<i16>()?;
        let y_min = cursor.read::<i16>()?;
        let x_max = cursor.read::<i16>()?;
        let y_max = cursor.read::<i16>()?;
        let mac_style = cursor.read::<u16>()?;
        let lowest_rec_ppem = cursor.read::<u16>()?;
        let font_direction_hint = cursor.read::<i16>()?;
        let index_to_loc_format = cursor.read::<i16>()?;
        if !matches!(index_to_loc_format, 0 | 1) {
            return Err(ReadError::InvalidFormat(index_to_loc_format as i64));
        }
        let glyph_data_format = cursor.read::<i16>()?;
        Ok(Head {
            major_version,
            minor_version,
            font_revision,
            checksum_adjustment,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}
