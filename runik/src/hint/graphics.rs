//! The graphics state.

use runik_types::Point;

use super::{
    error::HintErrorKind,
    math,
    round::RoundState,
};

/// Coordinate axis selected by the single-bit instruction variants.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Axis {
    X,
    Y,
}

/// Selects the twilight or glyph zone.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum ZonePointer {
    Twilight = 0,
    #[default]
    Glyph = 1,
}

impl TryFrom<i32> for ZonePointer {
    type Error = HintErrorKind;

    fn try_from(value: i32) -> Result<Self, HintErrorKind> {
        match value {
            0 => Ok(ZonePointer::Twilight),
            1 => Ok(ZonePointer::Glyph),
            _ => Err(HintErrorKind::InvalidZoneIndex(value)),
        }
    }
}

/// Interpreter state adjusted by the graphics-state instructions.
///
/// Vectors are 2.14; distances and cut-ins are 26.6.
#[derive(Copy, Clone, Debug)]
pub struct GraphicsState {
    /// Direction along which distances are measured.
    pub proj_vector: Point<i32>,
    /// Projection vector applied to original (unhinted) positions.
    pub dual_proj_vector: Point<i32>,
    /// Direction along which points move.
    pub freedom_vector: Point<i32>,
    /// Dot product of freedom and projection vectors.
    pub fdotp: i32,
    pub rp0: usize,
    pub rp1: usize,
    pub rp2: usize,
    pub zp0: ZonePointer,
    pub zp1: ZonePointer,
    pub zp2: ZonePointer,
    pub round_state: RoundState,
    /// Applies the next point instruction to this many popped points.
    pub loop_counter: u32,
    pub minimum_distance: i32,
    pub control_value_cutin: i32,
    pub single_width_cutin: i32,
    pub single_width: i32,
    pub delta_base: u16,
    pub delta_shift: u16,
    pub auto_flip: bool,
    pub instruct_control: u8,
    pub scan_control: bool,
    pub scan_type: i32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        let x_axis = Point::new(math::ONE14, 0);
        GraphicsState {
            proj_vector: x_axis,
            dual_proj_vector: x_axis,
            freedom_vector: x_axis,
            fdotp: math::ONE14,
            rp0: 0,
            rp1: 0,
            rp2: 0,
            zp0: ZonePointer::Glyph,
            zp1: ZonePointer::Glyph,
            zp2: ZonePointer::Glyph,
            round_state: RoundState::default(),
            loop_counter: 1,
            minimum_distance: 64,
            control_value_cutin: 68,
            single_width_cutin: 0,
            single_width: 0,
            delta_base: 9,
            delta_shift: 3,
            auto_flip: true,
            instruct_control: 0,
            scan_control: false,
            scan_type: 0,
        }
    }
}

impl GraphicsState {
    /// Resets the per-glyph state while keeping what `prep` configured.
    pub fn reset_for_glyph(&mut self) {
        let defaults = GraphicsState::default();
        self.proj_vector = defaults.proj_vector;
        self.dual_proj_vector = defaults.dual_proj_vector;
        self.freedom_vector = defaults.freedom_vector;
        self.fdotp = defaults.fdotp;
        self.rp0 = 0;
        self.rp1 = 0;
        self.rp2 = 0;
        self.zp0 = ZonePointer::Glyph;
        self.zp1 = ZonePointer::Glyph;
        self.zp2 = ZonePointer::Glyph;
        self.loop_counter = 1;
    }

    /// Recomputes the freedom/projection dot product.
    ///
    /// Near-orthogonal vectors would make moves explode, so a tiny dot
    /// product falls back to one.
    pub fn update_fdotp(&mut self) {
        let fv = self.freedom_vector;
        let pv = self.proj_vector;
        let dot = (fv.x as i64 * pv.x as i64 + fv.y as i64 * pv.y as i64) >> 14;
        self.fdotp = if (dot as i32).abs() < 0x400 {
            math::ONE14
        } else {
            dot as i32
        };
    }

    /// Measures a 26.6 delta along the projection vector.
    pub fn project(&self, delta: Point<i32>) -> i32 {
        math::dot14(delta.x, delta.y, self.proj_vector.x, self.proj_vector.y)
    }

    /// Measures a 26.6 delta along the dual projection vector.
    pub fn dual_project(&self, delta: Point<i32>) -> i32 {
        math::dot14(
            delta.x,
            delta.y,
            self.dual_proj_vector.x,
            self.dual_proj_vector.y,
        )
    }

    /// Sets both projection vectors and refreshes the dot product.
    pub fn set_proj_vector(&mut self, vector: Point<i32>) {
        self.proj_vector = vector;
        self.dual_proj_vector = vector;
        self.update_fdotp();
    }

    pub fn set_freedom_vector(&mut self, vector: Point<i32>) {
        self.freedom_vector = vector;
        self.update_fdotp();
    }

    /// Axis-aligned unit vector for the `SVTCA` instruction family.
    pub fn axis_vector(axis: Axis) -> Point<i32> {
        match axis {
            Axis::X => Point::new(math::ONE14, 0),
            Axis::Y => Point::new(0, math::ONE14),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let gs = GraphicsState::default();
        assert_eq!(gs.proj_vector, Point::new(0x4000, 0));
        assert_eq!(gs.fdotp, 0x4000);
        assert_eq!(gs.loop_counter, 1);
        assert_eq!(gs.minimum_distance, 64);
        assert_eq!(gs.control_value_cutin, 68);
        assert_eq!((gs.delta_base, gs.delta_shift), (9, 3));
        assert!(gs.auto_flip);
    }

    #[test]
    fn fdotp_floors_tiny_products() {
        let mut gs = GraphicsState::default();
        gs.freedom_vector = Point::new(0, math::ONE14);
        gs.update_fdotp();
        // Orthogonal vectors fall back to one
        assert_eq!(gs.fdotp, math::ONE14);
        gs.proj_vector = Point::new(0, math::ONE14);
        gs.update_fdotp();
        assert_eq!(gs.fdotp, math::ONE14);
    }

    #[test]
    fn projection_measures_along_vector() {
        let mut gs = GraphicsState::default();
        assert_eq!(gs.project(Point::new(100, 50)), 100);
        gs.set_proj_vector(Point::new(0, math::ONE14));
        assert_eq!(gs.project(Point::new(100, 50)), 50);
    }
}
