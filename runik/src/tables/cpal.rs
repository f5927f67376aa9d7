//! The [CPAL](https://learn.microsoft.com/en-us/typography/opentype/spec/cpal) table.

use runik_types::Tag;

use crate::{error::ReadError, font_data::FontData};

/// A color in sRGB with premultiplied alpha, stored BGRA in the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorRecord {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub alpha: u8,
}

/// The color palette table, version 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cpal {
    pub num_palette_entries: u16,
    /// Start index of each palette within `color_records`.
    pub palette_indices: Vec<u16>,
    pub color_records: Vec<ColorRecord>,
}

impl Cpal {
    pub const TAG: Tag = Tag::new(b"CPAL");

    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version = cursor.read::<u16>()?;
        if version > 1 {
            return Err(ReadError::Unsupported("CPAL versions past 1"));
        }
        let num_palette_entries = cursor.read::<u16>()?;
        let num_palettes = cursor.read::<u16>()?;
        let num_color_records = cursor.read::<u16>()? as usize;
        let color_records_offset = cursor.read::<u32>()? as usize;
        let mut palette_indices = Vec::with_capacity(num_palettes as usize);
        for _ in 0..num_palettes {
            palette_indices.push(cursor.read::<u16>()?);
        }
        let mut cursor = data.cursor();
        cursor.seek(color_records_offset);
        let mut color_records = Vec::with_capacity(num_color_records);
        for _ in 0..num_color_records {
            color_records.push(ColorRecord {
                blue: cursor.read::<u8>()?,
                green: cursor.read::<u8>()?,
                red: cursor.read::<u8>()?,
                alpha: cursor.read::<u8>()?,
            });
        }
        Ok(Cpal {
            num_palette_entries,
            palette_indices,
            color_records,
        })
    }

    /// The number of palettes.
    pub fn num_palettes(&self) -> usize {
        self.palette_indices.len()
    }

    /// Looks up an entry within a palette.
    pub fn color(&self, palette: usize, entry: u16) -> Option<ColorRecord> {
        if entry >= self.num_palette_entries {
            return None;
        }
        let start = *self.palette_indices.get(palette)? as usize;
        self.color_records.get(start + entry as usize).copied()
    }
}
