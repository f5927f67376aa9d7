//! The [loca](https://learn.microsoft.com/en-us/typography/opentype/spec/loca) table.

use std::ops::Range;

use runik_types::{GlyphId, Tag};

use crate::{error::ReadError, font_data::FontData};

/// The glyph index-to-location table.
///
/// Offsets bound each glyph's byte range in `glyf`: glyph `i` occupies
/// `offsets[i]..offsets[i + 1]`. The short format stores halved u16
/// offsets; the format in use is `head.index_to_loc_format`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loca {
    offsets: Vec<u32>,
}

impl Loca {
    pub const TAG: Tag = Tag::new(b"loca");

    pub fn read(data: FontData, num_glyphs: u16, is_long: bool) -> Result<Self, ReadError> {
        let count = num_glyphs as usize + 1;
        let mut cursor = data.cursor();
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = if is_long {
                cursor.read::<u32>()?
            } else {
                u32::from(cursor.read::<u16>()?) * 2
            };
            if offsets.last().is_some_and(|last| offset < *last) {
                return Err(ReadError::MalformedData("loca offsets decrease"));
            }
            offsets.push(offset);
        }
        Ok(Loca { offsets })
    }

    /// The number of glyphs covered by this table.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw offset at `index` (already unhalved for the short format).
    pub fn get_raw(&self, index: usize) -> Option<u32> {
        self.offsets.get(index).copied()
    }

    /// The byte range of a glyph within `glyf`, or `None` for glyphs with
    /// no outline (an empty range) or ids past the end of the table.
    pub fn glyf_range(&self, glyph_id: GlyphId) -> Option<Range<usize>> {
        let index = glyph_id.to_u16() as usize;
        let start = *self.offsets.get(index)? as usize;
        let end = *self.offsets.get(index + 1)? as usize;
        (start != end).then_some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    #[test]
    fn short_offsets_are_halved() {
        let buf = BeBuffer::new().push_all(&[0u16, 4, 4, 10]);
        let loca = Loca::read(buf.font_data(), 3, false).unwrap();
        assert_eq!(loca.len(), 3);
        assert_eq!(loca.glyf_range(GlyphId::new(0)), Some(0..8));
        // Zero-length range means no outline
        assert_eq!(loca.glyf_range(GlyphId::new(1)), None);
        assert_eq!(loca.glyf_range(GlyphId::new(2)), Some(8..20));
        assert_eq!(loca.glyf_range(GlyphId::new(3)), None);
    }

    #[test]
    fn long_offsets() {
        let buf = BeBuffer::new().push_all(&[0u32, 100, 100, 256]);
        let loca = Loca::read(buf.font_data(), 3, true).unwrap();
        assert_eq!(loca.glyf_range(GlyphId::new(0)), Some(0..100));
        assert_eq!(loca.glyf_range(GlyphId::new(1)), None);
        assert_eq!(loca.glyf_range(GlyphId::new(2)), Some(100..256));
    }

    #[test]
    fn offsets_must_not_decrease() {
        let buf = BeBuffer::new().push_all(&[0u32, 100, 50, 256]);
        assert!(matches!(
            Loca::read(buf.font_data(), 3, true),
            Err(ReadError::MalformedData(_))
        ));
    }

    #[test]
    fn truncated() {
        let buf = BeBuffer::new().push_all(&[0u16, 4]);
        assert!(matches!(
            Loca::read(buf.font_data(), 3, false),
            Err(ReadError::OutOfBounds)
        ));
    }
}
