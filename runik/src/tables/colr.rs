//! The [COLR](https://learn.microsoft.com/en-us/typography/opentype/spec/colr) table.

use runik_types::{GlyphId, Tag};

use crate::{error::ReadError, font_data::FontData};

/// A base glyph's slice into the layer record list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseGlyph {
    pub glyph_id: GlyphId,
    pub first_layer_index: u16,
    pub num_layers: u16,
}

/// One layer: a glyph drawn with a palette color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layer {
    pub glyph_id: GlyphId,
    /// Index into a `CPAL` palette; 0xFFFF means the text foreground.
    pub palette_index: u16,
}

/// The color table, version 0 (layered color glyphs).
///
/// Version 1 paint graphs are not decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Colr {
    /// Sorted by glyph id, per the table invariant.
    pub base_glyphs: Vec<BaseGlyph>,
    pub layers: Vec<Layer>,
}

impl Colr {
    pub const TAG: Tag = Tag::new(b"COLR");

    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version = cursor.read::<u16>()?;
        if version != 0 {
            return Err(ReadError::Unsupported("COLR versions past 0"));
        }
        let num_base_glyphs = cursor.read::<u16>()? as usize;
        let base_glyphs_offset = cursor.read::<u32>()? as usize;
        let layers_offset = cursor.read::<u32>()? as usize;
        let num_layers = cursor.read::<u16>()? as usize;

        let mut cursor = data.cursor();
        cursor.seek(base_glyphs_offset);
        let mut base_glyphs = Vec::with_capacity(num_base_glyphs);
        for _ in 0..num_base_glyphs {
            base_glyphs.push(BaseGlyph {
                glyph_id: cursor.read::<GlyphId>()?,
                first_layer_index: cursor.read::<u16>()?,
                num_layers: cursor.read::<u16>()?,
            });
        }
        if base_glyphs
            .windows(2)
            .any(|pair| pair[0].glyph_id >= pair[1].glyph_id)
        {
            return Err(ReadError::MalformedData("base glyph records not sorted"));
        }
        let mut cursor = data.cursor();
        cursor.seek(layers_offset);
        let mut layers = Vec::with_capacity(num_layers);
        for _ in 0..num_layers {
            layers.push(Layer {
                glyph_id: cursor.read::<GlyphId>()?,
                palette_index: cursor.read::<u16>()?,
            });
        }
        Ok(Colr {
            base_glyphs,
            layers,
        })
    }

    /// The color layers for a glyph, bottom-most first, or `None` if the
    /// glyph has no color version.
    pub fn layers(&self, glyph_id: GlyphId) -> Option<&[Layer]> {
        let index = self
            .base_glyphs
            .binary_search_by_key(&glyph_id, |base| base.glyph_id)
            .ok()?;
        let base = self.base_glyphs[index];
        let start = base.first_layer_index as usize;
        self.layers.get(start..start + base.num_layers as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    fn colr_bytes() -> Vec<u8> {
        BeBuffer::new()
            .push(0u16) // version
            .push(2u16) // numBaseGlyphRecords
            .push(14u32) // baseGlyphRecordsOffset
            .push(26u32) // layerRecordsOffset
            .push(3u16) // numLayerRecords
            // base glyph records, sorted by glyph id
            .push_all(&[2u16, 0, 2]) // gid 2 -> layers 0..2
            .push_all(&[5u16, 2, 1]) // gid 5 -> layer 2
            // layer records
            .push_all(&[10u16, 0])
            .push_all(&[11u16, 1])
            .push_all(&[12u16, 0xFFFF])
            .to_vec()
    }

    #[test]
    fn layer_lookup() {
        let bytes = colr_bytes();
        let colr = Colr::read(FontData::new(&bytes)).unwrap();
        let layers = colr.layers(GlyphId::new(2)).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].glyph_id, GlyphId::new(10));
        assert_eq!(layers[1].palette_index, 1);
        let layers = colr.layers(GlyphId::new(5)).unwrap();
        assert_eq!(layers[0].palette_index, 0xFFFF);
        assert!(colr.layers(GlyphId::new(3)).is_none());
    }

    #[test]
    fn v1_is_unsupported() {
        let bytes = BeBuffer::new().push(1u16).push(0u16).to_vec();
        assert!(matches!(
            Colr::read(FontData::new(&bytes)),
            Err(ReadError::Unsupported(_))
        ));
    }

    #[test]
    fn unsorted_base_glyphs() {
        let mut bytes = colr_bytes();
        // Swap the two base glyph ids
        bytes[15] = 5;
        bytes[21] = 2;
        assert!(matches!(
            Colr::read(FontData::new(&bytes)),
            Err(ReadError::MalformedData(_))
        ));
    }
}
