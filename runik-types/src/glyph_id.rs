//! Glyph identifiers.

use crate::Scalar;

/// A 16-bit glyph identifier.
///
/// Glyph ids are dense indices in `0..numGlyphs`; id 0 is always the
/// notdef glyph.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphId(u16);

impl GlyphId {
    /// The identifier reserved for unknown glyphs.
    pub const NOTDEF: GlyphId = GlyphId(0);

    pub const fn new(raw: u16) -> Self {
        GlyphId(raw)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }

    pub const fn to_u32(self) -> u32 {
        self.0 as u32
    }
}

impl From<u16> for GlyphId {
    fn from(raw: u16) -> Self {
        GlyphId(raw)
    }
}

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "GID_{}", self.0)
    }
}

impl Scalar for GlyphId {
    const RAW_BYTE_LEN: usize = 2;

    fn read(bytes: &[u8]) -> Option<Self> {
        u16::read(bytes).map(GlyphId)
    }

    fn write(self, out: &mut Vec<u8>) {
        self.0.write(out)
    }
}
