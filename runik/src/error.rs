//! Errors reported while parsing font data.

use runik_types::Tag;

/// A structural error encountered while reading font data.
///
/// These are always fatal to the read in progress: either the bytes do not
/// describe what the caller asked for, or the data lies outside the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// A read ran past the end of the available data.
    OutOfBounds,
    /// The buffer does not begin with a known sfnt version.
    InvalidSfnt(u32),
    /// A table or subtable declared a format/version this crate does not
    /// recognize as valid.
    InvalidFormat(i64),
    /// An array length field is inconsistent with the available data.
    InvalidArrayLen,
    /// The data is structurally invalid in some table-specific way.
    MalformedData(&'static str),
    /// A required table is not present in the font.
    TableIsMissing(Tag),
    /// The data is valid but uses a feature this crate does not decode.
    Unsupported(&'static str),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::OutOfBounds => write!(f, "an attempt to read went out of bounds"),
            ReadError::InvalidSfnt(version) => {
                write!(f, "not a known sfnt version: 0x{version:08X}")
            }
            ReadError::InvalidFormat(format) => write!(f, "invalid format value {format}"),
            ReadError::InvalidArrayLen => {
                write!(f, "specified array length not a multiple of item size")
            }
            ReadError::MalformedData(msg) => write!(f, "malformed data: '{msg}'"),
            ReadError::TableIsMissing(tag) => write!(f, "the '{tag}' table is missing"),
            ReadError::Unsupported(msg) => write!(f, "unsupported feature: '{msg}'"),
        }
    }
}

impl std::error::Error for ReadError {}
