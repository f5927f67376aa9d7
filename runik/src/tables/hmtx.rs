//! The [hmtx](https://learn.microsoft.com/en-us/typography/opentype/spec/hmtx) table.

use runik_types::{GlyphId, Tag};

use crate::{error::ReadError, font_data::FontData};

/// An advance width and left side bearing pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LongMetric {
    pub advance: u16,
    pub side_bearing: i16,
}

/// The horizontal metrics table.
///
/// The first `number_of_h_metrics` glyphs carry explicit
/// (advance, side bearing) pairs; any remaining glyphs reuse the last
/// advance and store only a side bearing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hmtx {
    pub h_metrics: Vec<LongMetric>,
    pub left_side_bearings: Vec<i16>,
}

impl Hmtx {
    pub const TAG: Tag = Tag::new(b"hmtx");

    /// Reads the table. The counts come from `hhea` and `maxp`.
    pub fn read(
        data: FontData,
        number_of_h_metrics: u16,
        num_glyphs: u16,
    ) -> Result<Self, ReadError> {
        if number_of_h_metrics == 0 || number_of_h_metrics > num_glyphs {
            return Err(ReadError::MalformedData(
                "numberOfHMetrics out of range for glyph count",
            ));
        }
        let mut cursor = data.cursor();
        let mut h_metrics = Vec::with_capacity(number_of_h_metrics as usize);
        for _ in 0..number_of_h_metrics {
            h_metrics.push(LongMetric {
                advance: cursor.read::<u16>()?,
                side_bearing: cursor.read::<i16>()?,
            });
        }
        let mut left_side_bearings =
            Vec::with_capacity((num_glyphs - number_of_h_metrics) as usize);
        for _ in number_of_h_metrics..num_glyphs {
            left_side_bearings.push(cursor.read::<i16>()?);
        }
        Ok(Hmtx {
            h_metrics,
            left_side_bearings,
        })
    }

    /// The advance width for the glyph, reusing the final explicit
    /// advance for glyphs past `number_of_h_metrics`.
    pub fn advance(&self, glyph_id: GlyphId) -> Option<u16> {
        let index = glyph_id.to_u16() as usize;
        if index < self.h_metrics.len() + self.left_side_bearings.len() {
            let index = index.min(self.h_metrics.len() - 1);
            Some(self.h_metrics[index].advance)
        } else {
            None
        }
    }

    /// The left side bearing for the glyph.
    pub fn side_bearing(&self, glyph_id: GlyphId) -> Option<i16> {
        let index = glyph_id.to_u16() as usize;
        if let Some(metric) = self.h_metrics.get(index) {
            Some(metric.side_bearing)
        } else {
            self.left_side_bearings
                .get(index - self.h_metrics.len())
                .copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    #[test]
    fn paired_and_trailing_metrics() {
        let buf = BeBuffer::new()
            .push(500u16)
            .push(10i16)
            .push(600u16)
            .push(-20i16)
            // two trailing glyphs, monospace tail
            .push(5i16)
            .push(6i16);
        let hmtx = Hmtx::read(buf.font_data(), 2, 4).unwrap();
        assert_eq!(hmtx.advance(GlyphId::new(0)), Some(500));
        assert_eq!(hmtx.advance(GlyphId::new(1)), Some(600));
        assert_eq!(hmtx.advance(GlyphId::new(2)), Some(600));
        assert_eq!(hmtx.advance(GlyphId::new(3)), Some(600));
        assert_eq!(hmtx.advance(GlyphId::new(4)), None);
        assert_eq!(hmtx.side_bearing(GlyphId::new(1)), Some(-20));
        assert_eq!(hmtx.side_bearing(GlyphId::new(2)), Some(5));
        assert_eq!(hmtx.side_bearing(GlyphId::new(3)), Some(6));
    }

    #[test]
    fn metric_count_validation() {
        let buf = BeBuffer::new().push(500u16).push(10i16);
        assert!(Hmtx::read(buf.font_data(), 2, 1).is_err());
        assert!(Hmtx::read(buf.font_data(), 0, 1).is_err());
    }

    #[test]
    fn truncated() {
        let buf = BeBuffer::new().push(500u16);
        assert!(matches!(
            Hmtx::read(buf.font_data(), 1, 1),
            Err(ReadError::OutOfBounds)
        ));
    }
}
