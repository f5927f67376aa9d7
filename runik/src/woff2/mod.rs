//! Decompressing [WOFF2](https://www.w3.org/TR/WOFF2/) files back into
//! sfnt form.
//!
//! A WOFF2 file is a 48 byte header, a packed table directory, and one
//! Brotli-compressed block holding every table body back to back. The
//! `glyf` and `hmtx` tables may additionally be stored in a transformed
//! encoding that must be reversed before the font is usable; `loca` is
//! never stored at all and is synthesized while rebuilding `glyf`.
//!
//! [`decode`] produces an sfnt buffer that [`Font`](crate::Font) can
//! parse. [`decode_with`] accepts an alternate [`Decompressor`] for
//! callers that bring their own Brotli implementation.

mod glyf;
mod hmtx;

use std::io;

use runik_types::Tag;

use crate::{
    error::ReadError,
    font_builder::FontBuilder,
    font_data::{Cursor, FontData},
    tables::{hhea::Hhea, maxp::Maxp},
};

const SIGNATURE: u32 = 0x774F_4632; // 'wOF2'
const COLLECTION_FLAVOR: u32 = u32::from_be_bytes(*b"ttcf");
const HEADER_LEN: usize = 48;

const GLYF: Tag = Tag::new(b"glyf");
const LOCA: Tag = Tag::new(b"loca");
const HMTX: Tag = Tag::new(b"hmtx");

/// An error produced while decoding a WOFF2 file.
///
/// All variants are fatal to the decode as a whole.
#[derive(Debug)]
pub enum Woff2Error {
    /// A structural read failed.
    Read(ReadError),
    /// The buffer does not begin with the `wOF2` signature.
    InvalidSignature(u32),
    /// The header or table directory is inconsistent.
    MalformedDirectory(&'static str),
    /// The compressed block could not be decompressed.
    Decompression(String),
    /// The decompressed block does not match the directory's total of
    /// per-table lengths.
    DecompressedSizeMismatch { expected: usize, actual: usize },
    /// A transformed table could not be reconstructed.
    Reconstruction(&'static str),
}

impl std::fmt::Display for Woff2Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Woff2Error::Read(error) => error.fmt(f),
            Woff2Error::InvalidSignature(signature) => {
                write!(f, "not a WOFF2 signature: 0x{signature:08X}")
            }
            Woff2Error::MalformedDirectory(msg) => write!(f, "malformed directory: '{msg}'"),
            Woff2Error::Decompression(msg) => write!(f, "decompression failed: {msg}"),
            Woff2Error::DecompressedSizeMismatch { expected, actual } => write!(
                f,
                "decompressed block is {actual} bytes but the directory declares {expected}"
            ),
            Woff2Error::Reconstruction(msg) => write!(f, "table reconstruction failed: '{msg}'"),
        }
    }
}

impl std::error::Error for Woff2Error {}

impl From<ReadError> for Woff2Error {
    fn from(error: ReadError) -> Self {
        Woff2Error::Read(error)
    }
}

/// The decompression primitive for the single compressed block.
///
/// WOFF2 mandates Brotli; [`decode_with`] exists so embedders can route
/// through their own implementation or instrument the boundary in tests.
pub trait Decompressor {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, Woff2Error>;
}

/// The default decompressor, backed by the `brotli-decompressor` crate.
#[derive(Copy, Clone, Debug, Default)]
pub struct Brotli;

impl Decompressor for Brotli {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, Woff2Error> {
        let mut output = Vec::new();
        brotli_decompressor::BrotliDecompress(&mut io::Cursor::new(input), &mut output)
            .map_err(|error| Woff2Error::Decompression(error.to_string()))?;
        Ok(output)
    }
}

/// Decodes a WOFF2 file into an sfnt buffer.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, Woff2Error> {
    decode_with(bytes, &Brotli)
}

/// Decodes a WOFF2 file using the provided decompressor.
pub fn decode_with(bytes: &[u8], decompressor: &impl Decompressor) -> Result<Vec<u8>, Woff2Error> {
    let data = FontData::new(bytes);
    let mut cursor = data.cursor();
    let header = Header::read(&mut cursor)?;
    let mut entries = Vec::with_capacity(header.num_tables as usize);
    for _ in 0..header.num_tables {
        entries.push(TableEntry::read(&mut cursor)?);
    }
    let compressed = cursor.read_bytes(header.total_compressed_size as usize)?;
    let decompressed = decompressor.decompress(compressed)?;
    let expected: usize = entries
        .iter()
        .map(|entry| entry.stream_length() as usize)
        .sum();
    if decompressed.len() != expected {
        return Err(Woff2Error::DecompressedSizeMismatch {
            expected,
            actual: decompressed.len(),
        });
    }

    // Carve the block into per-table slices in directory order.
    let mut tables = Vec::with_capacity(entries.len());
    let mut offset = 0usize;
    for entry in entries {
        let len = entry.stream_length() as usize;
        let table = &decompressed[offset..offset + len];
        offset += len;
        tables.push((entry, table));
    }
    reassemble(header.flavor, &tables)
}

/// Rebuilds the sfnt from the split table slices, reversing the `glyf`
/// and `hmtx` transforms where present.
fn reassemble(flavor: u32, tables: &[(TableEntry, &[u8])]) -> Result<Vec<u8>, Woff2Error> {
    let reconstructed = tables
        .iter()
        .find(|(entry, _)| entry.tag == GLYF && entry.is_transformed())
        .map(|(_, data)| glyf::reconstruct(data))
        .transpose()?;
    let mut builder = FontBuilder::new();
    for (entry, data) in tables {
        match entry.tag {
            GLYF if entry.is_transformed() => {
                let glyf = reconstructed
                    .as_ref()
                    .ok_or(Woff2Error::Reconstruction("glyf reconstruction missing"))?;
                builder.add_table(GLYF, glyf.glyf.clone());
            }
            LOCA if entry.is_transformed() => {
                let glyf = reconstructed
                    .as_ref()
                    .ok_or(Woff2Error::MalformedDirectory(
                        "transformed loca without transformed glyf",
                    ))?;
                if glyf.loca.len() != entry.orig_length as usize {
                    return Err(Woff2Error::Reconstruction(
                        "loca length disagrees with reconstructed glyf",
                    ));
                }
                builder.add_table(LOCA, glyf.loca.clone());
            }
            HMTX if entry.is_transformed() => {
                let glyf = reconstructed
                    .as_ref()
                    .ok_or(Woff2Error::MalformedDirectory(
                        "transformed hmtx without transformed glyf",
                    ))?;
                let maxp = Maxp::read(table_data(tables, Maxp::TAG)?)?;
                let hhea = Hhea::read(table_data(tables, Hhea::TAG)?)?;
                let hmtx = hmtx::reconstruct(
                    data,
                    maxp.num_glyphs,
                    hhea.number_of_h_metrics,
                    &glyf.x_mins,
                )?;
                builder.add_table(HMTX, hmtx);
            }
            tag => {
                builder.add_table(tag, data.to_vec());
            }
        }
    }
    Ok(builder.build_with_version(flavor))
}

fn table_data<'a>(
    tables: &[(TableEntry, &'a [u8])],
    tag: Tag,
) -> Result<FontData<'a>, Woff2Error> {
    tables
        .iter()
        .find(|(entry, _)| entry.tag == tag)
        .map(|(_, data)| FontData::new(data))
        .ok_or(Woff2Error::Read(ReadError::TableIsMissing(tag)))
}

/// The fixed 48 byte file header.
#[derive(Debug)]
struct Header {
    flavor: u32,
    num_tables: u16,
    total_compressed_size: u32,
}

impl Header {
    fn read(cursor: &mut Cursor) -> Result<Self, Woff2Error> {
        let signature = cursor.read::<u32>()?;
        if signature != SIGNATURE {
            return Err(Woff2Error::InvalidSignature(signature));
        }
        let flavor = cursor.read::<u32>()?;
        if flavor == COLLECTION_FLAVOR {
            return Err(Woff2Error::Read(ReadError::Unsupported(
                "WOFF2 font collections",
            )));
        }
        let _length = cursor.read::<u32>()?;
        let num_tables = cursor.read::<u16>()?;
        let reserved = cursor.read::<u16>()?;
        if reserved != 0 {
            return Err(Woff2Error::MalformedDirectory("reserved field is not zero"));
        }
        let _total_sfnt_size = cursor.read::<u32>()?;
        let total_compressed_size = cursor.read::<u32>()?;
        let _major_version = cursor.read::<u16>()?;
        let _minor_version = cursor.read::<u16>()?;
        let _meta_offset = cursor.read::<u32>()?;
        let _meta_length = cursor.read::<u32>()?;
        let _meta_orig_length = cursor.read::<u32>()?;
        let _priv_offset = cursor.read::<u32>()?;
        let _priv_length = cursor.read::<u32>()?;
        Ok(Header {
            flavor,
            num_tables,
            total_compressed_size,
        })
    }
}

/// One entry in the packed table directory.
#[derive(Debug)]
struct TableEntry {
    tag: Tag,
    transform: u8,
    orig_length: u32,
    transform_length: Option<u32>,
}

impl TableEntry {
    fn read(cursor: &mut Cursor) -> Result<Self, Woff2Error> {
        let flags = cursor.read::<u8>()?;
        let tag = match flags & 0x3F {
            0x3F => cursor.read::<Tag>()?,
            index => KNOWN_TAGS[index as usize],
        };
        let transform = flags >> 6;
        let mut entry = TableEntry {
            tag,
            transform,
            orig_length: cursor.read_base128()?,
            transform_length: None,
        };
        entry.validate_transform()?;
        if entry.is_transformed() {
            let transform_length = cursor.read_base128()?;
            if entry.tag == LOCA && transform_length != 0 {
                return Err(Woff2Error::MalformedDirectory(
                    "transformed loca must be empty",
                ));
            }
            entry.transform_length = Some(transform_length);
        }
        Ok(entry)
    }

    /// `glyf` and `loca` use transform id 3 to mean "no transform"; for
    /// every other tag the null transform is id 0.
    fn is_transformed(&self) -> bool {
        if self.tag == GLYF || self.tag == LOCA {
            self.transform != 3
        } else {
            self.transform != 0
        }
    }

    fn validate_transform(&self) -> Result<(), Woff2Error> {
        let valid = if self.tag == GLYF || self.tag == LOCA {
            self.transform == 0 || self.transform == 3
        } else if self.tag == HMTX {
            self.transform == 0 || self.transform == 1
        } else {
            self.transform == 0
        };
        if valid {
            Ok(())
        } else {
            Err(Woff2Error::MalformedDirectory("unknown table transform"))
        }
    }

    /// The number of bytes this table occupies in the decompressed block.
    fn stream_length(&self) -> u32 {
        self.transform_length.unwrap_or(self.orig_length)
    }
}

/// The tags addressable by a 6-bit directory index, in specification
/// order. Index 0x3F instead prefixes an explicit tag.
const KNOWN_TAGS: [Tag; 63] = [
    Tag::new(b"cmap"),
    Tag::new(b"head"),
    Tag::new(b"hhea"),
    Tag::new(b"hmtx"),
    Tag::new(b"maxp"),
    Tag::new(b"name"),
    Tag::new(b"OS/2"),
    Tag::new(b"post"),
    Tag::new(b"cvt "),
    Tag::new(b"fpgm"),
    Tag::new(b"glyf"),
    Tag::new(b"loca"),
    Tag::new(b"prep"),
    Tag::new(b"CFF "),
    Tag::new(b"VORG"),
    Tag::new(b"EBDT"),
    Tag::new(b"EBLC"),
    Tag::new(b"gasp"),
    Tag::new(b"hdmx"),
    Tag::new(b"kern"),
    Tag::new(b"LTSH"),
    Tag::new(b"PCLT"),
    Tag::new(b"VDMX"),
    Tag::new(b"vhea"),
    Tag::new(b"vmtx"),
    Tag::new(b"BASE"),
    Tag::new(b"GDEF"),
    Tag::new(b"GPOS"),
    Tag::new(b"GSUB"),
    Tag::new(b"EBSC"),
    Tag::new(b"JSTF"),
    Tag::new(b"MATH"),
    Tag::new(b"CBDT"),
    Tag::new(b"CBLC"),
    Tag::new(b"COLR"),
    Tag::new(b"CPAL"),
    Tag::new(b"SVG "),
    Tag::new(b"sbix"),
    Tag::new(b"acnt"),
    Tag::new(b"avar"),
    Tag::new(b"bdat"),
    Tag::new(b"bloc"),
    Tag::new(b"bsln"),
    Tag::new(b"cvar"),
    Tag::new(b"fdsc"),
    Tag::new(b"feat"),
    Tag::new(b"fmtx"),
    Tag::new(b"fvar"),
    Tag::new(b"gvar"),
    Tag::new(b"hsty"),
    Tag::new(b"just"),
    Tag::new(b"lcar"),
    Tag::new(b"mort"),
    Tag::new(b"morx"),
    Tag::new(b"opbd"),
    Tag::new(b"prop"),
    Tag::new(b"trak"),
    Tag::new(b"Zapf"),
    Tag::new(b"Silf"),
    Tag::new(b"Glat"),
    Tag::new(b"Gloc"),
    Tag::new(b"Feat"),
    Tag::new(b"Sill"),
];
