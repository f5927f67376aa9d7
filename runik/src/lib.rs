//! Reading, interpreting, and assembling binary font files.
//!
//! This crate parses sfnt containers ([`Font`]), decodes the common
//! TrueType and OpenType tables ([`tables`]), interprets CFF charstrings
//! ([`cff`]) and TrueType hinting programs ([`hint`]), decompresses
//! WOFF2 files back into sfnt form ([`woff2`]), and assembles fonts
//! from raw tables ([`FontBuilder`]).
//!
//! All parsing is zero-copy where practical: [`Font`] borrows its
//! backing buffer and decodes individual tables lazily, at most once.

#![forbid(unsafe_code)]

pub mod cff;
pub mod error;
pub mod font;
pub mod font_builder;
pub mod font_data;
pub mod hint;
pub mod tables;
pub mod woff2;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::ReadError;
pub use font::{Font, Table};
pub use font_builder::FontBuilder;
pub use font_data::FontData;

pub use runik_types as types;
pub use runik_types::{
    F26Dot6, F2Dot14, Fixed, GlyphId, LongDateTime, Pen, Point, Tag, Uint24,
};
