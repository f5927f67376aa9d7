//! Four-byte table identifiers.

use crate::Scalar;

/// An OpenType tag.
///
/// A tag is a 4-byte array of printable ASCII, used to identify tables,
/// design axes, features, and scripts. Tags shorter than four bytes are
/// padded with trailing spaces.
///
/// See <https://learn.microsoft.com/en-us/typography/opentype/spec/otff#data-types>
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Constructs a tag from raw bytes.
    ///
    /// Intended for tag literals (`Tag::new(b"glyf")`); does not check
    /// that the bytes are in the printable ASCII range.
    pub const fn new(src: &[u8; 4]) -> Tag {
        Tag(*src)
    }

    /// Attempts to construct a tag from raw bytes, validating them.
    ///
    /// `src` must contain between one and four bytes, each in the
    /// printable ASCII range (0x20..=0x7E); shorter input is padded
    /// with trailing spaces.
    pub const fn new_checked(src: &[u8]) -> Result<Self, InvalidTag> {
        if src.is_empty() || src.len() > 4 {
            return Err(InvalidTag::InvalidLength(src.len()));
        }
        let mut raw = [b' '; 4];
        let mut i = 0;
        while i < src.len() {
            let byte = src[i];
            if byte < 0x20 || byte > 0x7E {
                return Err(InvalidTag::InvalidByte { pos: i, byte });
            }
            raw[i] = byte;
            i += 1;
        }
        Ok(Tag(raw))
    }

    /// Constructs a tag from a big-endian `u32`, without validation.
    pub const fn from_u32(src: u32) -> Self {
        Tag(src.to_be_bytes())
    }

    /// The tag as a big-endian `u32`.
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// The raw bytes of the tag.
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    /// The tag bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::borrow::Borrow<[u8; 4]> for Tag {
    fn borrow(&self) -> &[u8; 4] {
        &self.0
    }
}

impl PartialEq<&[u8; 4]> for Tag {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        &self.0 == *other
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Tag(\"{self}\")")
    }
}

impl Scalar for Tag {
    const RAW_BYTE_LEN: usize = 4;

    fn read(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(Tag(raw))
    }

    fn write(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

/// A malformed tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidTag {
    InvalidLength(usize),
    InvalidByte { pos: usize, byte: u8 },
}

impl std::fmt::Display for InvalidTag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidTag::InvalidLength(len) => write!(f, "invalid tag length {len}"),
            InvalidTag::InvalidByte { pos, byte } => {
                write!(f, "invalid byte 0x{byte:02x} at index {pos}")
            }
        }
    }
}

impl std::error::Error for InvalidTag {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test() {
        assert_eq!(Tag::new(b"head").to_be_bytes(), *b"head");
        assert_eq!(Tag::new_checked(b"CFF").unwrap(), &*b"CFF ");
        assert_eq!(Tag::new(b"glyf").to_string(), "glyf");
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            Tag::new_checked(b""),
            Err(InvalidTag::InvalidLength(0))
        ));
        assert!(matches!(
            Tag::new_checked(b"glyph"),
            Err(InvalidTag::InvalidLength(5))
        ));
        assert!(matches!(
            Tag::new_checked(&[b'a', 0x19]),
            Err(InvalidTag::InvalidByte { pos: 1, byte: 0x19 })
        ));
    }

    #[test]
    fn ordering_is_byte_order() {
        assert!(Tag::new(b"cmap") < Tag::new(b"glyf"));
        assert!(Tag::new(b"glyf") < Tag::new(b"head"));
        assert!(Tag::new(b"OS/2") < Tag::new(b"cmap"));
    }

    #[test]
    fn u32_round_trip() {
        let tag = Tag::new(b"wOF2");
        assert_eq!(Tag::from_u32(tag.to_u32()), tag);
        assert_eq!(tag.to_u32(), 0x774F4632);
    }
}
