//! Font loading and the sfnt table directory.

use std::sync::OnceLock;

use runik_types::{GlyphId, Pen, Tag};

use crate::{
    error::ReadError,
    font_data::FontData,
    tables::{
        cmap::Cmap,
        colr::Colr,
        cpal::Cpal,
        glyf::{self, Anchor, Glyph},
        head::Head,
        hhea::Hhea,
        hmtx::Hmtx,
        loca::Loca,
        maxp::Maxp,
        name::Name,
    },
};

/// The sfnt version for fonts with TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x0001_0000;
/// The sfnt version for fonts with CFF outlines ('OTTO').
pub const CFF_SFNT_VERSION: u32 = u32::from_be_bytes(*b"OTTO");
/// The legacy Apple sfnt version ('true').
pub const TRUE_SFNT_VERSION: u32 = u32::from_be_bytes(*b"true");
/// The legacy PostScript sfnt version ('typ1').
pub const TYP1_SFNT_VERSION: u32 = u32::from_be_bytes(*b"typ1");

/// The value the whole-file checksum must come out to, after the `head`
/// table's adjustment field is accounted for.
pub const CHECKSUM_TARGET: u32 = 0xB1B0_AFBA;

/// Expansion limit for nested composite glyphs.
const MAX_COMPONENT_DEPTH: u32 = 8;

/// One entry in the sfnt table directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The parsed sfnt header and table directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDirectory {
    pub sfnt_version: u32,
    pub records: Vec<TableRecord>,
}

impl TableDirectory {
    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let sfnt_version = cursor.read::<u32>()?;
        if !matches!(
            sfnt_version,
            TT_SFNT_VERSION | CFF_SFNT_VERSION | TRUE_SFNT_VERSION | TYP1_SFNT_VERSION
        ) {
            return Err(ReadError::InvalidSfnt(sfnt_version));
        }
        let num_tables = cursor.read::<u16>()?;
        let search_range = cursor.read::<u16>()?;
        let entry_selector = cursor.read::<u16>()?;
        let range_shift = cursor.read::<u16>()?;
        let expected = SearchRange::compute(num_tables as usize, TABLE_RECORD_LEN);
        if (search_range, entry_selector, range_shift)
            != (
                expected.search_range,
                expected.entry_selector,
                expected.range_shift,
            )
        {
            // Stale assists are common in the wild; not worth failing over
            log::warn!(
                "search assists ({search_range}, {entry_selector}, {range_shift}) \
                 do not match the table count {num_tables}"
            );
        }
        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            let record = TableRecord {
                tag: cursor.read::<Tag>()?,
                checksum: cursor.read::<u32>()?,
                offset: cursor.read::<u32>()?,
                length: cursor.read::<u32>()?,
            };
            let end = (record.offset as usize)
                .checked_add(round4(record.length as usize))
                .ok_or(ReadError::OutOfBounds)?;
            if end > data.len() {
                return Err(ReadError::OutOfBounds);
            }
            if record.offset % 4 != 0 {
                log::warn!("table '{}' is not 4-byte aligned", record.tag);
            }
            if records
                .iter()
                .any(|existing: &TableRecord| existing.tag == record.tag)
            {
                return Err(ReadError::MalformedData("duplicate table tag"));
            }
            records.push(record);
        }
        Ok(TableDirectory {
            sfnt_version,
            records,
        })
    }

    pub fn record(&self, tag: Tag) -> Option<&TableRecord> {
        self.records.iter().find(|record| record.tag == tag)
    }
}

/// Byte length of one table directory entry.
pub(crate) const TABLE_RECORD_LEN: usize = 16;
/// Byte length of the sfnt header preceding the directory.
pub(crate) const HEADER_LEN: usize = 12;

/// The binary-search assist fields in the sfnt header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SearchRange {
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SearchRange {
    /// Computes the assists for `n_items` records of `item_size` bytes.
    pub fn compute(n_items: usize, item_size: usize) -> Self {
        if n_items == 0 {
            return SearchRange {
                search_range: 0,
                entry_selector: 0,
                range_shift: 0,
            };
        }
        let entry_selector = n_items.ilog2();
        let search_range = (item_size << entry_selector) as u16;
        let range_shift = (n_items * item_size) as u16 - search_range;
        SearchRange {
            search_range,
            entry_selector: entry_selector as u16,
            range_shift,
        }
    }
}

pub(crate) fn round4(len: usize) -> usize {
    (len + 3) & !3
}

/// Computes an sfnt table checksum: the wrapping sum of the table's
/// big-endian u32 words, with a final partial word zero-padded.
pub fn compute_checksum(bytes: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut chunks = bytes.chunks_exact(4);
    for chunk in &mut chunks {
        let word = u32::from_be_bytes(chunk.try_into().unwrap_or_default());
        sum = sum.wrapping_add(word);
    }
    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let mut word = [0u8; 4];
        word[..remainder.len()].copy_from_slice(remainder);
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}

/// Computes a table checksum, special-casing `head` to exclude the
/// `checksumAdjustment` field from the sum.
pub fn compute_table_checksum(tag: Tag, bytes: &[u8]) -> u32 {
    let mut sum = compute_checksum(bytes);
    if tag == Head::TAG {
        if let Ok(adjustment) = FontData::new(bytes).read_at::<u32>(Head::CHECKSUM_ADJUSTMENT_OFFSET)
        {
            sum = sum.wrapping_sub(adjustment);
        }
    }
    sum
}

/// Decode-once storage for table bodies.
#[derive(Default)]
struct TableCache {
    head: OnceLock<Result<Head, ReadError>>,
    maxp: OnceLock<Result<Maxp, ReadError>>,
    hhea: OnceLock<Result<Hhea, ReadError>>,
    hmtx: OnceLock<Result<Hmtx, ReadError>>,
    loca: OnceLock<Result<Loca, ReadError>>,
    cmap: OnceLock<Result<Cmap, ReadError>>,
    name: OnceLock<Result<Name, ReadError>>,
    colr: OnceLock<Result<Colr, ReadError>>,
    cpal: OnceLock<Result<Cpal, ReadError>>,
}

/// A decoded table, or the raw bytes for tags without a decoder.
#[derive(Clone, Debug)]
pub enum Table<'a> {
    Head(Head),
    Maxp(Maxp),
    Hhea(Hhea),
    Hmtx(Hmtx),
    Loca(Loca),
    Cmap(Cmap),
    Name(Name),
    Colr(Colr),
    Cpal(Cpal),
    Raw(&'a [u8]),
}

/// A font backed by a borrowed byte buffer.
///
/// The header and table directory are parsed up front; table bodies are
/// decoded lazily, at most once per tag, and shared thereafter.
pub struct Font<'a> {
    data: FontData<'a>,
    directory: TableDirectory,
    cache: TableCache,
}

impl<'a> Font<'a> {
    /// Parses the sfnt header and table directory, and verifies table
    /// checksums (mismatches are logged, not fatal).
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let directory = TableDirectory::read(data)?;
        let font = Font {
            data,
            directory,
            cache: TableCache::default(),
        };
        font.verify_checksums();
        Ok(font)
    }

    fn verify_checksums(&self) {
        for record in &self.directory.records {
            let Some(bytes) = self.padded_table_bytes(record) else {
                continue;
            };
            let sum = compute_table_checksum(record.tag, bytes);
            if sum != record.checksum {
                log::warn!(
                    "checksum mismatch for '{}': directory says 0x{:08X}, computed 0x{:08X}",
                    record.tag,
                    record.checksum,
                    sum
                );
            }
        }
        if self.directory.record(Head::TAG).is_some() {
            let whole = compute_checksum(self.data.as_bytes());
            if whole != CHECKSUM_TARGET {
                log::warn!(
                    "whole-file checksum is 0x{whole:08X}, expected 0x{:08X}",
                    CHECKSUM_TARGET
                );
            }
        }
    }

    fn padded_table_bytes(&self, record: &TableRecord) -> Option<&'a [u8]> {
        let start = record.offset as usize;
        self.data
            .slice(start..start + round4(record.length as usize))
            .map(|data| data.as_bytes())
    }

    pub fn sfnt_version(&self) -> u32 {
        self.directory.sfnt_version
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }

    /// The tags present in this font, in directory order.
    pub fn table_tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.directory.records.iter().map(|record| record.tag)
    }

    /// The raw bytes of a table (unpadded).
    pub fn table_data(&self, tag: Tag) -> Option<FontData<'a>> {
        let record = self.directory.record(tag)?;
        let start = record.offset as usize;
        self.data.slice(start..start + record.length as usize)
    }

    fn expect_table_data(&self, tag: Tag) -> Result<FontData<'a>, ReadError> {
        self.table_data(tag).ok_or(ReadError::TableIsMissing(tag))
    }

    pub fn head(&self) -> Result<&Head, ReadError> {
        self.cache
            .head
            .get_or_init(|| Head::read(self.expect_table_data(Head::TAG)?))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn maxp(&self) -> Result<&Maxp, ReadError> {
        self.cache
            .maxp
            .get_or_init(|| Maxp::read(self.expect_table_data(Maxp::TAG)?))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn hhea(&self) -> Result<&Hhea, ReadError> {
        self.cache
            .hhea
            .get_or_init(|| Hhea::read(self.expect_table_data(Hhea::TAG)?))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn hmtx(&self) -> Result<&Hmtx, ReadError> {
        self.cache
            .hmtx
            .get_or_init(|| {
                let number_of_h_metrics = self.hhea()?.number_of_h_metrics;
                let num_glyphs = self.maxp()?.num_glyphs;
                Hmtx::read(
                    self.expect_table_data(Hmtx::TAG)?,
                    number_of_h_metrics,
                    num_glyphs,
                )
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn loca(&self) -> Result<&Loca, ReadError> {
        self.cache
            .loca
            .get_or_init(|| {
                let is_long = self.head()?.index_to_loc_format == 1;
                let num_glyphs = self.maxp()?.num_glyphs;
                Loca::read(self.expect_table_data(Loca::TAG)?, num_glyphs, is_long)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn cmap(&self) -> Result<&Cmap, ReadError> {
        self.cache
            .cmap
            .get_or_init(|| Cmap::read(self.expect_table_data(Cmap::TAG)?))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn name(&self) -> Result<&Name, ReadError> {
        self.cache
            .name
            .get_or_init(|| Name::read(self.expect_table_data(Name::TAG)?))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn colr(&self) -> Result<&Colr, ReadError> {
        self.cache
            .colr
            .get_or_init(|| Colr::read(self.expect_table_data(Colr::TAG)?))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn cpal(&self) -> Result<&Cpal, ReadError> {
        self.cache
            .cpal
            .get_or_init(|| Cpal::read(self.expect_table_data(Cpal::TAG)?))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Returns the decoded table for a tag, or its raw bytes for tags
    /// without a dedicated decoder.
    pub fn table(&self, tag: Tag) -> Result<Table<'a>, ReadError> {
        Ok(match tag {
            _ if tag == Head::TAG => Table::Head(self.head()?.clone()),
            _ if tag == Maxp::TAG => Table::Maxp(self.maxp()?.clone()),
            _ if tag == Hhea::TAG => Table::Hhea(self.hhea()?.clone()),
            _ if tag == Hmtx::TAG => Table::Hmtx(self.hmtx()?.clone()),
            _ if tag == Loca::TAG => Table::Loca(self.loca()?.clone()),
            _ if tag == Cmap::TAG => Table::Cmap(self.cmap()?.clone()),
            _ if tag == Name::TAG => Table::Name(self.name()?.clone()),
            _ if tag == Colr::TAG => Table::Colr(self.colr()?.clone()),
            _ if tag == Cpal::TAG => Table::Cpal(self.cpal()?.clone()),
            _ => Table::Raw(self.expect_table_data(tag)?.as_bytes()),
        })
    }

    pub fn num_glyphs(&self) -> Result<u16, ReadError> {
        Ok(self.maxp()?.num_glyphs)
    }

    /// Decodes a glyph outline from `glyf`/`loca`.
    ///
    /// Returns `Ok(None)` for glyphs with no outline (an empty `loca`
    /// range); a glyph id past `numGlyphs` is an error.
    pub fn glyph(&self, glyph_id: GlyphId) -> Result<Option<Glyph>, ReadError> {
        let loca = self.loca()?;
        if glyph_id.to_u16() as usize >= loca.len() {
            return Err(ReadError::MalformedData("glyph id out of range"));
        }
        let Some(range) = loca.glyf_range(glyph_id) else {
            return Ok(None);
        };
        let glyf = self.expect_table_data(glyf::TAG)?;
        let data = glyf.slice(range).ok_or(ReadError::OutOfBounds)?;
        Glyph::read(data).map(Some)
    }

    /// Maps a unicode codepoint through the best `cmap` subtable.
    pub fn map_codepoint(&self, codepoint: u32) -> Option<GlyphId> {
        self.cmap().ok()?.map_codepoint(codepoint)
    }

    /// Walks a glyph's outline into drawing commands, flattening
    /// composite glyphs through their component transforms.
    pub fn outline(&self, glyph_id: GlyphId, pen: &mut impl Pen) -> Result<(), ReadError> {
        // Identity affine: [xx, yx, xy, yy, dx, dy]
        self.outline_impl(glyph_id, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0], pen, 0)
    }

    fn outline_impl(
        &self,
        glyph_id: GlyphId,
        transform: [f32; 6],
        pen: &mut impl Pen,
        depth: u32,
    ) -> Result<(), ReadError> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(ReadError::MalformedData("composite nesting too deep"));
        }
        let Some(glyph) = self.glyph(glyph_id)? else {
            return Ok(());
        };
        match glyph {
            Glyph::Simple(simple) => {
                let mut transformed = TransformPen {
                    transform,
                    inner: pen,
                };
                simple.walk(&mut transformed);
                Ok(())
            }
            Glyph::Composite(composite) => {
                for component in &composite.components {
                    let Anchor::Offset { x, y } = component.anchor else {
                        return Err(ReadError::Unsupported(
                            "point-anchored composite components",
                        ));
                    };
                    let t = &component.transform;
                    let local = [
                        t.xx.to_f32(),
                        t.yx.to_f32(),
                        t.xy.to_f32(),
                        t.yy.to_f32(),
                        x as f32,
                        y as f32,
                    ];
                    let combined = concat_transforms(transform, local);
                    self.outline_impl(component.glyph, combined, pen, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

/// Composes two affines: `outer` applied after `inner`.
fn concat_transforms(outer: [f32; 6], inner: [f32; 6]) -> [f32; 6] {
    [
        outer[0] * inner[0] + outer[2] * inner[1],
        outer[1] * inner[0] + outer[3] * inner[1],
        outer[0] * inner[2] + outer[2] * inner[3],
        outer[1] * inner[2] + outer[3] * inner[3],
        outer[0] * inner[4] + outer[2] * inner[5] + outer[4],
        outer[1] * inner[4] + outer[3] * inner[5] + outer[5],
    ]
}

/// Applies an affine transform to commands before forwarding them.
struct TransformPen<'a, P> {
    transform: [f32; 6],
    inner: &'a mut P,
}

impl<P: Pen> TransformPen<'_, P> {
    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let t = &self.transform;
        (t[0] * x + t[2] * y + t[4], t[1] * x + t[3] * y + t[5])
    }
}

impl<P: Pen> Pen for TransformPen<'_, P> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.apply(x, y);
        self.inner.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.apply(x, y);
        self.inner.line_to(x, y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.apply(cx0, cy0);
        let (x, y) = self.apply(x, y);
        self.inner.quad_to(cx0, cy0, x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.apply(cx0, cy0);
        let (cx1, cy1) = self.apply(cx1, cy1);
        let (x, y) = self.apply(x, y);
        self.inner.curve_to(cx0, cy0, cx1, cy1, x, y);
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_binary_search_assists() {
        // Expected values from the OpenType specification's worked example
        let computed = SearchRange::compute(0x16, TABLE_RECORD_LEN);
        assert_eq!(
            (
                computed.search_range,
                computed.entry_selector,
                computed.range_shift
            ),
            (256, 4, 96)
        );
    }

    #[test]
    fn checksum_of_empty_table_is_zero() {
        assert_eq!(compute_checksum(&[]), 0);
    }

    #[test]
    fn checksum_pads_partial_words() {
        // 0x01020304 + 0x05000000
        assert_eq!(compute_checksum(&[1, 2, 3, 4, 5]), 0x06020304);
        assert_eq!(compute_checksum(&[1, 2, 3, 4, 5, 0, 0, 0]), 0x06020304);
    }

    #[test]
    fn checksum_wraps() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x02];
        assert_eq!(compute_checksum(&bytes), 1);
    }

    #[test]
    fn head_checksum_ignores_adjustment() {
        let mut bytes = vec![0u8; 16];
        bytes[11] = 7; // adjustment field occupies bytes 8..12
        assert_eq!(compute_table_checksum(Head::TAG, &bytes), 0);
        assert_eq!(compute_table_checksum(Tag::new(b"maxp"), &bytes), 7);
    }

    #[test]
    fn rejects_unknown_sfnt_version() {
        let bytes = 0xDEADBEEFu32.to_be_bytes();
        assert!(matches!(
            Font::new(&bytes),
            Err(ReadError::InvalidSfnt(0xDEADBEEF))
        ));
    }

    #[test]
    fn rejects_out_of_bounds_table() {
        let mut bytes = Vec::new();
        bytes.extend(TT_SFNT_VERSION.to_be_bytes());
        bytes.extend(1u16.to_be_bytes());
        bytes.extend([0u8; 6]); // search assists, zeroed
        bytes.extend(*b"maxp");
        bytes.extend(0u32.to_be_bytes()); // checksum
        bytes.extend(28u32.to_be_bytes()); // offset: at end of directory
        bytes.extend(64u32.to_be_bytes()); // length: past the buffer
        assert!(matches!(
            Font::new(&bytes),
            Err(ReadError::OutOfBounds)
        ));
    }
}
