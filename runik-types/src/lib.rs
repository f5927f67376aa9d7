//! Scalar types used in font files.
//!
//! The types in this crate correspond to the data types found in the
//! [OpenType spec][spec], plus a handful of small geometry and sink types
//! shared between the reading and writing halves of the codec.
//!
//! [spec]: https://learn.microsoft.com/en-us/typography/opentype/spec/otff#data-types

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixed;
mod glyph_id;
mod longdatetime;
mod pen;
mod point;
mod scalar;
mod tag;
mod uint24;

pub use fixed::{F26Dot6, F2Dot14, Fixed};
pub use glyph_id::GlyphId;
pub use longdatetime::{DateTime, LongDateTime};
pub use pen::Pen;
pub use point::Point;
pub use scalar::Scalar;
pub use tag::{InvalidTag, Tag};
pub use uint24::Uint24;
