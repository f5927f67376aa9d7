//! A 24-bit unsigned integer.

use crate::Scalar;

/// A 24-bit unsigned integer, stored big-endian in three bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint24(u32);

impl Uint24 {
    pub const MIN: Self = Uint24(0);
    pub const MAX: Self = Uint24(0xFFFFFF);

    /// Creates a new `Uint24`, clamping to the representable range.
    pub const fn new(raw: u32) -> Uint24 {
        if raw > Self::MAX.0 {
            Self::MAX
        } else {
            Uint24(raw)
        }
    }

    /// Creates a new `Uint24` if the value fits in 24 bits.
    pub const fn checked_new(raw: u32) -> Option<Uint24> {
        if raw > Self::MAX.0 {
            None
        } else {
            Some(Uint24(raw))
        }
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn to_be_bytes(self) -> [u8; 3] {
        let bytes = self.0.to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }

    pub const fn from_be_bytes(bytes: [u8; 3]) -> Self {
        Uint24(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }
}

impl From<Uint24> for u32 {
    fn from(src: Uint24) -> u32 {
        src.0
    }
}

impl std::fmt::Display for Uint24 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for Uint24 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Scalar for Uint24 {
    const RAW_BYTE_LEN: usize = 3;

    fn read(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 3] = bytes.get(..3)?.try_into().ok()?;
        Some(Self::from_be_bytes(raw))
    }

    fn write(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_be_bytes());
    }
}
