//! Assembling sfnt binaries from raw table data.

use std::borrow::Cow;
use std::collections::BTreeMap;

use runik_types::Tag;

use crate::{
    font::{
        compute_checksum, round4, SearchRange, CFF_SFNT_VERSION, CHECKSUM_TARGET, HEADER_LEN,
        TABLE_RECORD_LEN, TT_SFNT_VERSION,
    },
    tables::head::Head,
    writer::Writer,
};

const CFF_TAG: Tag = Tag::new(b"CFF ");

/// A builder for constructing a font file from raw table bytes.
///
/// Tables are laid out in ascending tag order, each padded to a four
/// byte boundary, with directory checksums and the `head` table's
/// `checksumAdjustment` computed during [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct FontBuilder<'a> {
    tables: BTreeMap<Tag, Cow<'a, [u8]>>,
}

impl<'a> FontBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing any previous data for the tag.
    pub fn add_table(&mut self, tag: Tag, data: impl Into<Cow<'a, [u8]>>) -> &mut Self {
        self.tables.insert(tag, data.into());
        self
    }

    /// Copies every table from a parsed font that is not already present.
    pub fn copy_missing_tables(&mut self, font: &crate::font::Font<'a>) -> &mut Self {
        for tag in font.table_tags().collect::<Vec<_>>() {
            if !self.tables.contains_key(&tag) {
                if let Some(data) = font.table_data(tag) {
                    self.add_table(tag, data.as_bytes());
                }
            }
        }
        self
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Assembles the font, picking 'OTTO' when a CFF table is present
    /// and the TrueType version otherwise.
    pub fn build(&mut self) -> Vec<u8> {
        let version = if self.contains(CFF_TAG) {
            CFF_SFNT_VERSION
        } else {
            TT_SFNT_VERSION
        };
        self.build_with_version(version)
    }

    pub fn build_with_version(&mut self, sfnt_version: u32) -> Vec<u8> {
        // A head table with a stale adjustment would corrupt both its own
        // directory checksum and the whole-file sum, so zero it up front.
        if let Some(head) = self.tables.get_mut(&Head::TAG) {
            let head = head.to_mut();
            if head.len() >= Head::CHECKSUM_ADJUSTMENT_OFFSET + 4 {
                head[Head::CHECKSUM_ADJUSTMENT_OFFSET..Head::CHECKSUM_ADJUSTMENT_OFFSET + 4]
                    .copy_from_slice(&[0; 4]);
            }
        }

        let num_tables = self.tables.len();
        let mut writer = Writer::with_capacity(
            HEADER_LEN
                + num_tables * TABLE_RECORD_LEN
                + self
                    .tables
                    .values()
                    .map(|data| round4(data.len()))
                    .sum::<usize>(),
        );
        writer.write(sfnt_version);
        writer.write(num_tables as u16);
        let assists = SearchRange::compute(num_tables, TABLE_RECORD_LEN);
        writer.write(assists.search_range);
        writer.write(assists.entry_selector);
        writer.write(assists.range_shift);

        // Directory first, with offsets known from the running layout.
        let mut offset = HEADER_LEN + num_tables * TABLE_RECORD_LEN;
        for (tag, data) in &self.tables {
            let mut padded = Cow::Borrowed(data.as_ref());
            if padded.len() % 4 != 0 {
                let mut owned = padded.into_owned();
                owned.resize(round4(owned.len()), 0);
                padded = Cow::Owned(owned);
            }
            writer.write(*tag);
            writer.write(compute_checksum(&padded));
            writer.write(offset as u32);
            writer.write(data.len() as u32);
            offset += padded.len();
        }
        for data in self.tables.values() {
            writer.write_bytes(data);
            writer.pad_to(4);
        }

        let mut bytes = writer.into_inner();
        if let Some(head_offset) = self.head_offset() {
            let adjustment = CHECKSUM_TARGET.wrapping_sub(compute_checksum(&bytes));
            let at = head_offset + Head::CHECKSUM_ADJUSTMENT_OFFSET;
            if at + 4 <= bytes.len() {
                bytes[at..at + 4].copy_from_slice(&adjustment.to_be_bytes());
            }
        }
        bytes
    }

    /// Byte offset of the head table in the built file, if present.
    fn head_offset(&self) -> Option<usize> {
        let mut offset = HEADER_LEN + self.tables.len() * TABLE_RECORD_LEN;
        for (tag, data) in &self.tables {
            if *tag == Head::TAG {
                return Some(offset);
            }
            offset += round4(data.len());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        font::{compute_table_checksum, Font},
        font_data::FontData,
        test_helpers::BeBuffer,
    };

    fn head_bytes() -> Vec<u8> {
        BeBuffer::new()
            .push(0x0001_0000u32) // version
            .push(0x0001_0000u32) // fontRevision
            .push(0xDEAD_BEEFu32) // stale checksumAdjustment
            .push(0x5F0F_3CF5u32) // magicNumber
            .push(0u16) // flags
            .push(1000u16) // unitsPerEm
            .push(0i64) // created
            .push(0i64) // modified
            .push_all(&[0i16, 0, 100, 100]) // bbox
            .push(0u16) // macStyle
            .push(8u16) // lowestRecPPEM
            .push(2i16) // fontDirectionHint
            .push(0i16) // indexToLocFormat
            .push(0i16) // glyphDataFormat
            .to_vec()
    }

    #[test]
    fn tables_in_tag_order_and_padded() {
        let mut builder = FontBuilder::new();
        builder.add_table(Tag::new(b"zzzz"), vec![1u8, 2, 3]);
        builder.add_table(Tag::new(b"aaaa"), vec![9u8; 8]);
        let bytes = builder.build();
        let font = Font::new(&bytes).unwrap();
        let tags: Vec<_> = font.table_tags().collect();
        assert_eq!(tags, vec![Tag::new(b"aaaa"), Tag::new(b"zzzz")]);
        let record = font.directory().record(Tag::new(b"zzzz")).unwrap();
        // 12 byte header + 2 records + 8 padded bytes of 'aaaa'
        assert_eq!(record.offset, 12 + 32 + 8);
        assert_eq!(record.length, 3);
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn directory_checksums_match() {
        let mut builder = FontBuilder::new();
        builder.add_table(Tag::new(b"maxp"), vec![0u8, 0, 0x50, 0, 0, 4]);
        let bytes = builder.build();
        let font = Font::new(&bytes).unwrap();
        let record = font.directory().record(Tag::new(b"maxp")).unwrap();
        let table = font.table_data(Tag::new(b"maxp")).unwrap();
        let mut padded = table.as_bytes().to_vec();
        padded.resize(8, 0);
        assert_eq!(record.checksum, compute_checksum(&padded));
    }

    #[test]
    fn whole_file_checksum_balances() {
        let mut builder = FontBuilder::new();
        builder.add_table(Head::TAG, head_bytes());
        builder.add_table(Tag::new(b"maxp"), vec![0u8, 0, 0x50, 0, 0, 4]);
        let bytes = builder.build();
        assert_eq!(compute_checksum(&bytes), super::CHECKSUM_TARGET);
        // The head record's checksum must exclude the adjustment field
        let font = Font::new(&bytes).unwrap();
        let record = font.directory().record(Head::TAG).unwrap();
        let head = font.table_data(Head::TAG).unwrap();
        assert_eq!(
            record.checksum,
            compute_table_checksum(Head::TAG, head.as_bytes())
        );
    }

    #[test]
    fn picks_otto_for_cff() {
        let mut builder = FontBuilder::new();
        builder.add_table(Tag::new(b"CFF "), vec![1u8]);
        let bytes = builder.build();
        assert_eq!(
            FontData::new(&bytes).read_at::<u32>(0).unwrap(),
            u32::from_be_bytes(*b"OTTO")
        );
    }

    #[test]
    fn round_trips_through_font() {
        let mut builder = FontBuilder::new();
        builder.add_table(Head::TAG, head_bytes());
        let bytes = builder.build();
        let font = Font::new(&bytes).unwrap();
        let head = font.head().unwrap();
        assert_eq!(head.units_per_em, 1000);
        assert_eq!(head.index_to_loc_format, 0);
    }
}
