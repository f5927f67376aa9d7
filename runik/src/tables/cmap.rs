//! The [cmap](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap) table.

use runik_types::{GlyphId, Tag};

use crate::{error::ReadError, font_data::FontData};

/// A (platform, encoding) to subtable offset record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub offset: u32,
}

impl EncodingRecord {
    /// Preference rank for choosing a subtable; higher is better.
    ///
    /// Full-repertoire Unicode mappings win over BMP-only ones, which
    /// win over everything else.
    fn rank(&self) -> u32 {
        match (self.platform_id, self.encoding_id) {
            (3, 10) | (0, 6) | (0, 4) => 3,
            (3, 1) | (0, 3) => 2,
            (0, _) => 1,
            _ => 0,
        }
    }
}

/// The character to glyph index mapping table.
///
/// All encoding records are retained; lookups go through the best
/// supported Unicode subtable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmap {
    pub records: Vec<EncodingRecord>,
    pub subtable: CmapSubtable,
}

/// A decoded cmap subtable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CmapSubtable {
    Format4(Cmap4),
    Format12(Cmap12),
}

impl Cmap {
    pub const TAG: Tag = Tag::new(b"cmap");

    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let _version = cursor.read::<u16>()?;
        let num_tables = cursor.read::<u16>()?;
        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            records.push(EncodingRecord {
                platform_id: cursor.read::<u16>()?,
                encoding_id: cursor.read::<u16>()?,
                offset: cursor.read::<u32>()?,
            });
        }
        // Try records best-first; skip subtable formats we don't decode.
        let mut by_rank = records.clone();
        by_rank.sort_by_key(|rec| std::cmp::Reverse(rec.rank()));
        let mut subtable = None;
        for record in &by_rank {
            let sub = data
                .split_off(record.offset as usize)
                .ok_or(ReadError::OutOfBounds)?;
            match sub.read_at::<u16>(0)? {
                4 => {
                    subtable = Some(CmapSubtable::Format4(Cmap4::read(sub)?));
                    break;
                }
                12 => {
                    subtable = Some(CmapSubtable::Format12(Cmap12::read(sub)?));
                    break;
                }
                _ => continue,
            }
        }
        let subtable =
            subtable.ok_or(ReadError::Unsupported("no supported cmap subtable format"))?;
        Ok(Cmap { records, subtable })
    }

    /// Maps a unicode codepoint to a glyph id.
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        match &self.subtable {
            CmapSubtable::Format4(sub) => sub.map_codepoint(codepoint),
            CmapSubtable::Format12(sub) => sub.map_codepoint(codepoint),
        }
    }
}

/// Format 4: segment mapping to delta values (BMP only).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmap4 {
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<i16>,
    id_range_offsets: Vec<u16>,
    glyph_ids: Vec<u16>,
}

impl Cmap4 {
    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format = cursor.read::<u16>()?;
        if format != 4 {
            return Err(ReadError::InvalidFormat(format as i64));
        }
        let length = cursor.read::<u16>()? as usize;
        let _language = cursor.read::<u16>()?;
        let seg_count_x2 = cursor.read::<u16>()? as usize;
        if seg_count_x2 % 2 != 0 {
            return Err(ReadError::InvalidArrayLen);
        }
        let seg_count = seg_count_x2 / 2;
        // searchRange, entrySelector, rangeShift are derivable; skip them
        cursor.advance_by(6)?;
        let mut end_codes = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            end_codes.push(cursor.read::<u16>()?);
        }
        cursor.advance_by(2)?; // reservedPad
        let mut start_codes = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            start_codes.push(cursor.read::<u16>()?);
        }
        let mut id_deltas = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            id_deltas.push(cursor.read::<i16>()?);
        }
        let mut id_range_offsets = Vec::with_capacity(seg_count);
        for _ in 0..seg_count {
            id_range_offsets.push(cursor.read::<u16>()?);
        }
        // The remainder of the subtable is the glyph id array
        let remaining = length
            .checked_sub(cursor.position())
            .ok_or(ReadError::InvalidArrayLen)?;
        let mut glyph_ids = Vec::with_capacity(remaining / 2);
        for _ in 0..remaining / 2 {
            glyph_ids.push(cursor.read::<u16>()?);
        }
        Ok(Cmap4 {
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_ids,
        })
    }

    /// Maps a codepoint via binary search over the segments.
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        let codepoint: u16 = codepoint.try_into().ok()?;
        let index = self
            .end_codes
            .partition_point(|&end| end < codepoint);
        let end = *self.end_codes.get(index)?;
        let start = *self.start_codes.get(index)?;
        if codepoint < start || codepoint > end {
            return None;
        }
        let delta = self.id_deltas[index];
        let range_offset = self.id_range_offsets[index] as usize;
        let glyph_id = if range_offset == 0 {
            (codepoint as i32 + delta as i32) as u16
        } else {
            // The stored offset is in bytes from the idRangeOffset entry
            // itself into the trailing glyph id array.
            let seg_count = self.end_codes.len();
            let spur = range_offset / 2 + (codepoint - start) as usize;
            let array_index = spur.checked_sub(seg_count - index)?;
            let glyph_id = *self.glyph_ids.get(array_index)?;
            if glyph_id == 0 {
                return None;
            }
            (glyph_id as i32 + delta as i32) as u16
        };
        (glyph_id != 0).then_some(GlyphId::new(glyph_id))
    }
}

/// Format 12: segmented coverage over the full Unicode repertoire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmap12 {
    groups: Vec<SequentialMapGroup>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SequentialMapGroup {
    start_char: u32,
    end_char: u32,
    start_glyph: u32,
}

impl Cmap12 {
    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format = cursor.read::<u16>()?;
        if format != 12 {
            return Err(ReadError::InvalidFormat(format as i64));
        }
        cursor.advance_by(2)?; // reserved
        let _length = cursor.read::<u32>()?;
        let _language = cursor.read::<u32>()?;
        let num_groups = cursor.read::<u32>()? as usize;
        let mut groups = Vec::with_capacity(num_groups.min(1 << 16));
        for _ in 0..num_groups {
            groups.push(SequentialMapGroup {
                start_char: cursor.read::<u32>()?,
                end_char: cursor.read::<u32>()?,
                start_glyph: cursor.read::<u32>()?,
            });
        }
        Ok(Cmap12 { groups })
    }

    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        let index = self
            .groups
            .partition_point(|group| group.end_char < codepoint);
        let group = self.groups.get(index)?;
        if codepoint < group.start_char {
            return None;
        }
        let glyph_id = group
            .start_glyph
            .checked_add(codepoint - group.start_char)?;
        u16::try_from(glyph_id).ok().map(GlyphId::new)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    /// A format 4 cmap mapping 'A'..='C' to glyphs 1..=3 via idDelta and
    /// 'a' to glyph 7 via the idRangeOffset glyph array.
    pub(crate) fn cmap4_bytes() -> Vec<u8> {
        let seg_count = 3u16; // A-C, a, terminator
        BeBuffer::new()
            .push(0u16) // table version
            .push(1u16) // numTables
            .push_all(&[3u16, 1]) // windows unicode BMP
            .push(12u32) // offset to subtable
            // format 4 subtable
            .push(4u16)
            .push(42u16) // length: 14 header + 2*4*3 + 2 pad + 2 glyph ids
            .push(0u16) // language
            .push(seg_count * 2)
            .push_all(&[4u16, 1, 2]) // search params, unused
            .push_all(&[0x43u16, 0x61, 0xFFFF]) // endCode
            .push(0u16) // reservedPad
            .push_all(&[0x41u16, 0x61, 0xFFFF]) // startCode
            .push_all(&[-0x40i16, 0, 1]) // idDelta
            // idRangeOffset: segment 1 points at the first entry of the
            // glyph id array (2 bytes per remaining segment entry)
            .push_all(&[0u16, 4, 0])
            .push_all(&[7u16]) // glyph id array
            .to_vec()
    }

    #[test]
    fn format4_delta_segments() {
        let bytes = cmap4_bytes();
        let cmap = Cmap::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cmap.map_codepoint('A' as u32), Some(GlyphId::new(1)));
        assert_eq!(cmap.map_codepoint('B' as u32), Some(GlyphId::new(2)));
        assert_eq!(cmap.map_codepoint('C' as u32), Some(GlyphId::new(3)));
        assert_eq!(cmap.map_codepoint('D' as u32), None);
        assert_eq!(cmap.map_codepoint('@' as u32), None);
    }

    #[test]
    fn format4_range_offset_segment() {
        let bytes = cmap4_bytes();
        let cmap = Cmap::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cmap.map_codepoint('a' as u32), Some(GlyphId::new(7)));
        assert_eq!(cmap.map_codepoint('b' as u32), None);
    }

    #[test]
    fn format4_out_of_bmp() {
        let bytes = cmap4_bytes();
        let cmap = Cmap::read(FontData::new(&bytes)).unwrap();
        assert_eq!(cmap.map_codepoint(0x1F600), None);
    }

    #[test]
    fn format12_groups() {
        let bytes = BeBuffer::new()
            .push(0u16)
            .push(1u16)
            .push_all(&[3u16, 10]) // windows unicode full
            .push(12u32)
            // format 12 subtable
            .push(12u16)
            .push(0u16) // reserved
            .push(40u32) // length
            .push(0u32) // language
            .push(2u32) // numGroups
            .push_all(&[0x41u32, 0x43, 1]) // A..=C -> 1..=3
            .push_all(&[0x1F600u32, 0x1F601, 20])
            .to_vec();
        let cmap = Cmap::read(FontData::new(&bytes)).unwrap();
        assert!(matches!(cmap.subtable, CmapSubtable::Format12(_)));
        assert_eq!(cmap.map_codepoint(0x42), Some(GlyphId::new(2)));
        assert_eq!(cmap.map_codepoint(0x1F601), Some(GlyphId::new(21)));
        assert_eq!(cmap.map_codepoint(0x1F602), None);
        assert_eq!(cmap.map_codepoint(0x44), None);
    }

    #[test]
    fn unsupported_formats_only() {
        let bytes = BeBuffer::new()
            .push(0u16)
            .push(1u16)
            .push_all(&[1u16, 0])
            .push(12u32)
            .push(6u16) // format 6, not decoded
            .to_vec();
        assert!(matches!(
            Cmap::read(FontData::new(&bytes)),
            Err(ReadError::Unsupported(_))
        ));
    }
}
