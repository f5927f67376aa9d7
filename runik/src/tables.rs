//! Decoders for individual font tables.

pub mod cmap;
pub mod colr;
pub mod cpal;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;
pub mod name;
