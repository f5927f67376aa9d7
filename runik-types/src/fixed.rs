//! Fixed-point numeric types.
//!
//! OpenType uses three fixed-point formats: 16.16 (`Fixed`), 2.14
//! (`F2Dot14`, mostly transform components), and 26.6 (`F26Dot6`, the
//! pixel coordinate space of the hinting interpreter).

use crate::Scalar;

/// Implements a fixed-point type over a two's-complement integer.
macro_rules! fixed_type {
    ($name:ident, $ty:ty, $fract_bits:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($ty);

        impl $name {
            /// Number of fractional bits.
            const FRACT_BITS: u32 = $fract_bits;
            /// Mask covering the integer part.
            const INT_MASK: $ty = !0 << $fract_bits;
            /// Half of one, for rounding.
            const HALF: $ty = 1 << ($fract_bits - 1);

            /// Minimum representable value.
            pub const MIN: Self = Self(<$ty>::MIN);
            /// Maximum representable value.
            pub const MAX: Self = Self(<$ty>::MAX);
            pub const ZERO: Self = Self(0);
            pub const ONE: Self = Self(1 << $fract_bits);

            /// Creates a value from its raw bit representation.
            pub const fn from_bits(bits: $ty) -> Self {
                Self(bits)
            }

            /// The raw bit representation.
            pub const fn to_bits(self) -> $ty {
                self.0
            }

            /// The nearest representable value, rounding ties away
            /// from negative infinity.
            pub fn from_f64(value: f64) -> Self {
                Self((value * Self::ONE.0 as f64).round() as $ty)
            }

            pub fn to_f64(self) -> f64 {
                self.0 as f64 / Self::ONE.0 as f64
            }

            pub fn from_f32(value: f32) -> Self {
                Self((value as f64 * Self::ONE.0 as f64).round() as $ty)
            }

            pub fn to_f32(self) -> f32 {
                self.to_f64() as f32
            }

            /// The largest integral value less than or equal to `self`.
            pub const fn floor(self) -> Self {
                Self(self.0 & Self::INT_MASK)
            }

            /// The nearest integral value, rounding half toward
            /// positive infinity.
            pub const fn round(self) -> Self {
                Self(self.0.wrapping_add(Self::HALF) & Self::INT_MASK)
            }

            /// The smallest integral value greater than or equal to
            /// `self`.
            pub const fn ceil(self) -> Self {
                Self(self.0.wrapping_add(!Self::INT_MASK) & Self::INT_MASK)
            }

            /// The fractional part of `self`, always non-negative.
            pub const fn fract(self) -> Self {
                Self(self.0 & !Self::INT_MASK)
            }

            pub const fn abs(self) -> Self {
                Self(self.0.abs())
            }

            pub const fn wrapping_add(self, other: Self) -> Self {
                Self(self.0.wrapping_add(other.0))
            }

            pub const fn wrapping_sub(self, other: Self) -> Self {
                Self(self.0.wrapping_sub(other.0))
            }

            pub const fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            pub const fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }
        }

        impl std::ops::Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0.wrapping_add(rhs.0))
            }
        }

        impl std::ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                *self = *self + rhs;
            }
        }

        impl std::ops::Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0.wrapping_sub(rhs.0))
            }
        }

        impl std::ops::SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }

        impl std::ops::Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self(self.0.wrapping_neg())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                self.to_f64().fmt(f)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.to_f64())
            }
        }

        impl Scalar for $name {
            const RAW_BYTE_LEN: usize = std::mem::size_of::<$ty>();

            fn read(bytes: &[u8]) -> Option<Self> {
                <$ty>::read(bytes).map(Self)
            }

            fn write(self, out: &mut Vec<u8>) {
                self.0.write(out)
            }
        }
    };
}

fixed_type!(
    Fixed,
    i32,
    16,
    "A 32-bit signed fixed-point number (16.16)."
);
fixed_type!(
    F2Dot14,
    i16,
    14,
    "A 16-bit signed fixed-point number with 14 fractional bits, in the range [-2, 2)."
);
fixed_type!(
    F26Dot6,
    i32,
    6,
    "A 32-bit signed fixed-point number with 6 fractional bits (pixel coordinates)."
);

impl Fixed {
    /// Creates a 16.16 value from a 16-bit integer.
    pub const fn from_i32(value: i32) -> Self {
        Self(value << 16)
    }

    /// The integer part, rounding to nearest.
    pub const fn to_i32(self) -> i32 {
        self.0.wrapping_add(Self::HALF) >> 16
    }
}

impl F26Dot6 {
    /// Creates a 26.6 value from an integer number of pixels.
    pub const fn from_i32(value: i32) -> Self {
        Self(value << 6)
    }

    /// The integer part, rounding to nearest.
    pub const fn to_i32(self) -> i32 {
        self.0.wrapping_add(Self::HALF) >> 6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f2dot14_boundary_values() {
        assert_eq!(F2Dot14::from_bits(0x7fff).to_f32(), 1.99993896484375);
        assert_eq!(F2Dot14::from_bits(-0x8000).to_f32(), -2.0);
        assert_eq!(F2Dot14::from_bits(0).to_f32(), 0.0);
        assert_eq!(F2Dot14::from_bits(0x4000).to_f32(), 1.0);
        assert_eq!(F2Dot14::from_bits(0x7000).to_f32(), 1.75);
    }

    #[test]
    fn f2dot14_round_trips() {
        for bits in [0i16, 1, -1, 0x7fff, -0x8000, 0x1234, -0x1234] {
            let val = F2Dot14::from_bits(bits);
            assert_eq!(F2Dot14::from_f64(val.to_f64()), val);
        }
    }

    #[test]
    fn fixed_floor() {
        assert_eq!(Fixed::from_f64(1.5).floor(), Fixed::from_f64(1.0));
        assert_eq!(Fixed::from_f64(-0.3).floor(), Fixed::from_f64(-1.0));
        assert_eq!(Fixed::from_f64(2.0).floor(), Fixed::from_f64(2.0));
    }

    #[test]
    fn fixed_round() {
        assert_eq!(Fixed::from_f64(1.5).round(), Fixed::from_f64(2.0));
        assert_eq!(Fixed::from_f64(1.49).round(), Fixed::from_f64(1.0));
        assert_eq!(Fixed::from_f64(-1.5).round(), Fixed::from_f64(-1.0));
    }

    #[test]
    fn fixed_ceil() {
        assert_eq!(Fixed::from_f64(1.1).ceil(), Fixed::from_f64(2.0));
        assert_eq!(Fixed::from_f64(-1.1).ceil(), Fixed::from_f64(-1.0));
        assert_eq!(Fixed::from_f64(3.0).ceil(), Fixed::from_f64(3.0));
    }

    #[test]
    fn f26dot6_ints() {
        assert_eq!(F26Dot6::from_i32(5).to_bits(), 320);
        assert_eq!(F26Dot6::from_bits(96).to_i32(), 2);
        assert_eq!(F26Dot6::from_bits(95).to_i32(), 1);
    }

    #[test]
    fn wire_format() {
        let mut buf = Vec::new();
        F2Dot14::from_f32(1.75).write(&mut buf);
        assert_eq!(buf, [0x70, 0x00]);
        assert_eq!(F2Dot14::read(&buf), Some(F2Dot14::from_f32(1.75)));
    }
}
