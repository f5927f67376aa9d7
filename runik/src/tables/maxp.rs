//! The [maxp](https://learn.microsoft.com/en-us/typography/opentype/spec/maxp) table.

use runik_types::{Fixed, Tag};

use crate::{error::ReadError, font_data::FontData};

/// The maximum profile table.
///
/// Version 0.5 (CFF-flavored fonts) carries only the glyph count; version
/// 1.0 adds the TrueType resource limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maxp {
    pub version: Fixed,
    pub num_glyphs: u16,
    /// Extra fields present in version 1.0 tables.
    pub profile: Option<TrueTypeProfile>,
}

/// The version 1.0 resource limits, used to size interpreter state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrueTypeProfile {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

impl Maxp {
    pub const TAG: Tag = Tag::new(b"maxp");

    const VERSION_0_5: Fixed = Fixed::from_bits(0x00005000);
    const VERSION_1_0: Fixed = Fixed::from_bits(0x00010000);

    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let version = cursor.read::<Fixed>()?;
        let num_glyphs = cursor.read::<u16>()?;
        let profile = match version {
            Self::VERSION_0_5 => None,
            Self::VERSION_1_0 => Some(TrueTypeProfile {
                max_points: cursor.read::<u16>()?,
                max_contours: cursor.read::<u16>()?,
                max_composite_points: cursor.read::<u16>()?,
                max_composite_contours: cursor.read::<u16>()?,
                max_zones: cursor.read::<u16>()?,
                max_twilight_points: cursor.read::<u16>()?,
                max_storage: cursor.read::<u16>()?,
                max_function_defs: cursor.read::<u16>()?,
                max_instruction_defs: cursor.read::<u16>()?,
                max_stack_elements: cursor.read::<u16>()?,
                max_size_of_instructions: cursor.read::<u16>()?,
                max_component_elements: cursor.read::<u16>()?,
                max_component_depth: cursor.read::<u16>()?,
            }),
            other => return Err(ReadError::InvalidFormat(other.to_bits() as i64)),
        };
        Ok(Maxp {
            version,
            num_glyphs,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::BeBuffer;

    #[test]
    fn version_0_5() {
        let buf = BeBuffer::new().push(0x00005000u32).push(271u16);
        let maxp = Maxp::read(buf.font_data()).unwrap();
        assert_eq!(maxp.num_glyphs, 271);
        assert!(maxp.profile.is_none());
    }

    #[test]
    fn version_1_0() {
        let buf = BeBuffer::new()
            .push(0x00010000u32)
            .push(4u16) // numGlyphs
            .push_all(&[80u16, 4, 120, 8, 2, 16, 64, 10, 0, 255, 300, 4, 2]);
        let maxp = Maxp::read(buf.font_data()).unwrap();
        assert_eq!(maxp.num_glyphs, 4);
        let profile = maxp.profile.unwrap();
        assert_eq!(profile.max_storage, 64);
        assert_eq!(profile.max_function_defs, 10);
        assert_eq!(profile.max_stack_elements, 255);
        assert_eq!(profile.max_component_depth, 2);
    }

    #[test]
    fn unknown_version() {
        let buf = BeBuffer::new().push(0x00020000u32).push(4u16);
        assert!(matches!(
            Maxp::read(buf.font_data()),
            Err(ReadError::InvalidFormat(_))
        ));
    }
}
