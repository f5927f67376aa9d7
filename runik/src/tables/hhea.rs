//! The [hhea](https://learn.microsoft.com/en-us/typography/opentype/spec/hhea) table.

use runik_types::Tag;

use crate::{error::ReadError, font_data::FontData};

/// The horizontal header table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hhea {
    pub major_version: u16,
    pub minor_version: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    /// Number of (advance, lsb) pairs at the front of `hmtx`.
    pub number_of_h_metrics: u16,
}

impl Hhea {
    pub const TAG: Tag = Tag::new(b"hhea");

    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let major_version = cursor.read::<u16>()?;
        let minor_version = cursor.read::<u16>()?;
        let ascender = cursor.read::<i16>()?;
        let descender = cursor.read::<i16>()?;
        let line_gap = cursor.read::<i16>()?;
        let advance_width_max = cursor.read::<u16>()?;
        let min_left_side_bearing = cursor.read::<i16>()?;
        let min_right_side_bearing = cursor.read::<i16>()?;
        let x_max_extent = cursor.read::<i16>()?;
        let caret_slope_rise = cursor.read::<i16>()?;
        let caret_slope_run = cursor.read::<i16>()?;
        let caret_offset = cursor.read::<i16>()?;
        // Four reserved words
        cursor.advance_by(8)?;
        let metric_data_format = cursor.read::<i16>()?;
        let number_of_h_metrics = cursor.read::<u16>()?;
        Ok(Hhea {
            major_version,
            minor_version,
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            metric_data_format,
            number_of_h_metrics,
        })
    }
}
