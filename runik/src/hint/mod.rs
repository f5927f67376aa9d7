//! TrueType hinting: bytecode decoding, disassembly and execution.
//!
//! Hint programs adjust outline points in 26.6 device space before
//! rasterization. A [`Hinter`] instance is bound to one size: it runs
//! the font program (`fpgm`) and control value program (`prep`) once,
//! then executes each glyph's instructions over its scaled outline.
//! Errors are fatal to a single glyph's hinting pass; callers fall
//! back to the unhinted outline.

mod call_stack;
mod code;
mod definition;
mod engine;
mod error;
mod graphics;
mod math;
mod program;
mod round;
mod storage;
mod value_stack;
mod zone;

pub use code::{disassemble, Decoder, Instruction, Operands};
pub use engine::{Engine, EngineLimits};
pub use error::{HintError, HintErrorKind};
pub use graphics::{Axis, GraphicsState, ZonePointer};
pub use program::{ProgramKind, Programs};
pub use round::{RoundMode, RoundState};
pub use zone::Zone;

use runik_types::{GlyphId, Point, Tag};

use crate::{
    error::ReadError,
    font::Font,
    tables::glyf::SimpleGlyph,
};

const FPGM: Tag = Tag::new(b"fpgm");
const PREP: Tag = Tag::new(b"prep");
const CVT: Tag = Tag::new(b"cvt ");

/// A hinting instance for one font at one size.
pub struct Hinter<'a> {
    engine: Engine<'a>,
    fpgm: &'a [u8],
    prep: &'a [u8],
    /// Font units to 26.6 pixels, 16.16.
    scale: i32,
    enabled: bool,
}

impl<'a> Hinter<'a> {
    /// Builds a hinting instance at `ppem`.
    ///
    /// Sizes the interpreter from the `maxp` profile, scales the
    /// control values and runs the font and control value programs. A
    /// failure in either disables hinting for this instance instead of
    /// rejecting the font.
    pub fn new(font: &Font<'a>, ppem: u16) -> Result<Self, ReadError> {
        let units_per_em = font.head()?.units_per_em.max(1) as i64;
        let profile = font.maxp()?.profile.clone().unwrap_or_default();
        let scale = ((ppem as i64 * 64) << 16) / units_per_em;
        let scale = i32::try_from(scale).map_err(|_| ReadError::OutOfBounds)?;
        let fpgm = table_bytes(font, FPGM);
        let prep = table_bytes(font, PREP);
        let cvt = read_control_values(font, scale)?;
        let limits = EngineLimits {
            stack: profile.max_stack_elements as usize,
            storage: profile.max_storage as usize,
            functions: profile.max_function_defs as usize,
            twilight_points: profile.max_twilight_points as usize,
        };
        let programs = Programs {
            font: fpgm,
            control_value: prep,
            glyph: &[],
        };
        let mut engine = Engine::new(programs, cvt, limits);
        // Assume 72 dpi: the point size equals the pixel size
        engine.set_size(ppem, ppem as i32 * 64, scale);
        let mut enabled = true;
        if !fpgm.is_empty() {
            if let Err(error) = engine.run_program(ProgramKind::Font, None) {
                log::warn!("font program failed, hinting disabled: {error}");
                enabled = false;
            }
        }
        if enabled && !prep.is_empty() {
            if let Err(error) = engine.run_program(ProgramKind::ControlValue, None) {
                log::warn!("control value program failed, hinting disabled: {error}");
                enabled = false;
            }
        }
        Ok(Hinter {
            engine,
            fpgm,
            prep,
            scale,
            enabled,
        })
    }

    /// False when `fpgm` or `prep` failed and glyphs pass through
    /// unhinted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Hints one simple glyph and returns its adjusted points in 26.6
    /// device space, phantom points included as the last two entries.
    pub fn hint_glyph(
        &mut self,
        glyph_id: GlyphId,
        glyph: &SimpleGlyph,
        advance_width: u16,
        left_side_bearing: i16,
    ) -> Result<Vec<Point<i32>>, HintError> {
        let zone = self.build_zone(glyph, advance_width, left_side_bearing);
        if !self.enabled || glyph.instructions.is_empty() {
            return Ok(zone.points);
        }
        let programs = Programs {
            font: self.fpgm,
            control_value: self.prep,
            glyph: &glyph.instructions,
        };
        let mut engine = core::mem::replace(&mut self.engine, Engine::empty()).rebind(programs);
        engine.set_glyph_zone(zone);
        let result = engine.run_program(ProgramKind::Glyph, Some(glyph_id));
        let zone = engine.take_glyph_zone();
        self.engine = engine.rebind(Programs {
            font: self.fpgm,
            control_value: self.prep,
            glyph: &[],
        });
        result?;
        Ok(zone.points)
    }

    /// Scales the outline and appends the two phantom points derived
    /// from the horizontal metrics.
    fn build_zone(
        &self,
        glyph: &SimpleGlyph,
        advance_width: u16,
        left_side_bearing: i16,
    ) -> Zone {
        let mut unscaled: Vec<Point<i32>> = glyph
            .points
            .iter()
            .map(|point| Point::new(point.x as i32, point.y as i32))
            .collect();
        let origin = glyph.bbox.x_min as i32 - left_side_bearing as i32;
        unscaled.push(Point::new(origin, 0));
        unscaled.push(Point::new(origin + advance_width as i32, 0));
        let original: Vec<Point<i32>> = unscaled
            .iter()
            .map(|point| {
                Point::new(
                    math::mul_div(point.x, self.scale, 1 << 16),
                    math::mul_div(point.y, self.scale, 1 << 16),
                )
            })
            .collect();
        Zone {
            flags: vec![0; unscaled.len()],
            contours: glyph.end_pts_of_contours.clone(),
            points: original.clone(),
            original,
            unscaled,
        }
    }
}

fn table_bytes<'a>(font: &Font<'a>, tag: Tag) -> &'a [u8] {
    font.table_data(tag)
        .map(|data| data.as_bytes())
        .unwrap_or_default()
}

/// The `cvt ` table holds i16 font unit values, scaled to 26.6 at
/// instance creation.
fn read_control_values(font: &Font, scale: i32) -> Result<Vec<i32>, ReadError> {
    let Some(data) = font.table_data(CVT) else {
        return Ok(Vec::new());
    };
    let mut cursor = data.cursor();
    let mut values = Vec::with_capacity(data.len() / 2);
    while cursor.remaining() >= 2 {
        let value = cursor.read::<i16>()? as i32;
        values.push(math::mul_div(value, scale, 1 << 16));
    }
    Ok(values)
}
