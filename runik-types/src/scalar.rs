//! Big-endian conversion for fixed-size field types.

/// A fixed-size field type with a big-endian wire representation.
///
/// All multi-byte quantities in a font file are big-endian; this trait is
/// what lets the cursor and writer move values in and out of raw buffers
/// generically.
pub trait Scalar: Copy + Sized {
    /// The size of the encoded value, in bytes.
    const RAW_BYTE_LEN: usize;

    /// Reads a value from the front of `bytes`.
    ///
    /// Returns `None` if `bytes` is shorter than [`Self::RAW_BYTE_LEN`].
    fn read(bytes: &[u8]) -> Option<Self>;

    /// Appends the big-endian encoding of `self` to `out`.
    fn write(self, out: &mut Vec<u8>);
}

macro_rules! int_scalar {
    ($ty:ty) => {
        impl Scalar for $ty {
            const RAW_BYTE_LEN: usize = std::mem::size_of::<$ty>();

            fn read(bytes: &[u8]) -> Option<Self> {
                let raw = bytes.get(..Self::RAW_BYTE_LEN)?;
                Some(<$ty>::from_be_bytes(raw.try_into().ok()?))
            }

            fn write(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }
        }
    };
}

int_scalar!(u8);
int_scalar!(i8);
int_scalar!(u16);
int_scalar!(i16);
int_scalar!(u32);
int_scalar!(i32);
int_scalar!(u64);
int_scalar!(i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips() {
        let mut buf = Vec::new();
        0x0102u16.write(&mut buf);
        0x03040506u32.write(&mut buf);
        (-7i16).write(&mut buf);
        assert_eq!(u16::read(&buf), Some(0x0102));
        assert_eq!(u32::read(&buf[2..]), Some(0x03040506));
        assert_eq!(i16::read(&buf[6..]), Some(-7));
    }

    #[test]
    fn short_buffer() {
        assert_eq!(u32::read(&[1, 2, 3]), None);
        assert_eq!(u8::read(&[]), None);
    }
}
