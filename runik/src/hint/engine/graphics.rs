//! Graphics state instructions.

use runik_types::Point;

use super::{
    super::{
        code::opcode,
        error::HintErrorKind,
        graphics::{Axis, GraphicsState, ZonePointer},
        math,
        round::{RoundMode, GRID_PERIOD, GRID_PERIOD_45},
    },
    Engine, OpResult,
};

impl<'a> Engine<'a> {
    /// SVTCA, SPVTCA, SFVTCA: set vectors to a coordinate axis.
    pub(super) fn op_svtca(&mut self, op: u8) -> OpResult {
        let axis = if op & 1 != 0 { Axis::X } else { Axis::Y };
        let vector = GraphicsState::axis_vector(axis);
        match op >> 1 {
            0 => {
                self.graphics.set_proj_vector(vector);
                self.graphics.set_freedom_vector(vector);
            }
            1 => self.graphics.set_proj_vector(vector),
            _ => self.graphics.set_freedom_vector(vector),
        }
        Ok(())
    }

    /// SPVTL, SFVTL: set a vector along (or normal to) the line between
    /// two points.
    pub(super) fn op_svtl(&mut self, op: u8) -> OpResult {
        let vector = self.line_vector(op)?;
        if op < opcode::SFVTL0 {
            self.graphics.set_proj_vector(vector);
        } else {
            self.graphics.set_freedom_vector(vector);
        }
        Ok(())
    }

    /// SDPVTL: dual projection from the original outline, projection
    /// from the current one.
    pub(super) fn op_sdpvtl(&mut self, op: u8) -> OpResult {
        let p2 = self.value_stack.pop_usize()?;
        let p1 = self.value_stack.pop_usize()?;
        let gs = &self.graphics;
        let original_delta =
            self.zone(gs.zp1).original(p1)? - self.zone(gs.zp2).original(p2)?;
        let current_delta = self.zone(gs.zp1).point(p1)? - self.zone(gs.zp2).point(p2)?;
        let dual = rotate_if_perpendicular(original_delta, op & 1 != 0);
        let proj = rotate_if_perpendicular(current_delta, op & 1 != 0);
        let (dx, dy) = math::normalize14(dual.x, dual.y);
        self.graphics.dual_proj_vector = Point::new(dx, dy);
        let (px, py) = math::normalize14(proj.x, proj.y);
        self.graphics.proj_vector = Point::new(px, py);
        self.graphics.update_fdotp();
        Ok(())
    }

    /// SPVFS, SFVFS: set a vector from 2.14 components on the stack.
    pub(super) fn op_spvfs(&mut self) -> OpResult {
        let vector = self.pop_vector_components()?;
        self.graphics.set_proj_vector(vector);
        Ok(())
    }

    pub(super) fn op_sfvfs(&mut self) -> OpResult {
        let vector = self.pop_vector_components()?;
        self.graphics.set_freedom_vector(vector);
        Ok(())
    }

    pub(super) fn op_gpv(&mut self) -> OpResult {
        let vector = self.graphics.proj_vector;
        self.value_stack.push(vector.x)?;
        self.value_stack.push(vector.y)
    }

    pub(super) fn op_gfv(&mut self) -> OpResult {
        let vector = self.graphics.freedom_vector;
        self.value_stack.push(vector.x)?;
        self.value_stack.push(vector.y)
    }

    pub(super) fn op_sfvtpv(&mut self) -> OpResult {
        self.graphics.set_freedom_vector(self.graphics.proj_vector);
        Ok(())
    }

    pub(super) fn op_srp0(&mut self) -> OpResult {
        self.graphics.rp0 = self.value_stack.pop_usize()?;
        Ok(())
    }

    pub(super) fn op_srp1(&mut self) -> OpResult {
        self.graphics.rp1 = self.value_stack.pop_usize()?;
        Ok(())
    }

    pub(super) fn op_srp2(&mut self) -> OpResult {
        self.graphics.rp2 = self.value_stack.pop_usize()?;
        Ok(())
    }

    pub(super) fn op_szp0(&mut self) -> OpResult {
        self.graphics.zp0 = self.pop_zone()?;
        Ok(())
    }

    pub(super) fn op_szp1(&mut self) -> OpResult {
        self.graphics.zp1 = self.pop_zone()?;
        Ok(())
    }

    pub(super) fn op_szp2(&mut self) -> OpResult {
        self.graphics.zp2 = self.pop_zone()?;
        Ok(())
    }

    pub(super) fn op_szps(&mut self) -> OpResult {
        let zone = self.pop_zone()?;
        self.graphics.zp0 = zone;
        self.graphics.zp1 = zone;
        self.graphics.zp2 = zone;
        Ok(())
    }

    pub(super) fn op_sloop(&mut self) -> OpResult {
        let count = self.value_stack.pop()?;
        if count < 0 {
            return Err(HintErrorKind::NegativeLoopCounter);
        }
        self.graphics.loop_counter = count as u32;
        Ok(())
    }

    /// RTG, RTHG, RTDG, RUTG, RDTG, ROFF.
    pub(super) fn op_round_mode(&mut self, op: u8) -> OpResult {
        use opcode::*;
        self.graphics.round_state.mode = match op {
            RTG => RoundMode::Grid,
            RTHG => RoundMode::HalfGrid,
            RTDG => RoundMode::DoubleGrid,
            RUTG => RoundMode::UpToGrid,
            RDTG => RoundMode::DownToGrid,
            _ => RoundMode::Off,
        };
        Ok(())
    }

    pub(super) fn op_sround(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        self.graphics
            .round_state
            .set_super(RoundMode::Super, GRID_PERIOD, selector);
        Ok(())
    }

    pub(super) fn op_s45round(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        self.graphics
            .round_state
            .set_super(RoundMode::Super45, GRID_PERIOD_45, selector);
        Ok(())
    }

    pub(super) fn op_smd(&mut self) -> OpResult {
        self.graphics.minimum_distance = self.value_stack.pop()?;
        Ok(())
    }

    pub(super) fn op_scvtci(&mut self) -> OpResult {
        self.graphics.control_value_cutin = self.value_stack.pop()?;
        Ok(())
    }

    pub(super) fn op_sswci(&mut self) -> OpResult {
        self.graphics.single_width_cutin = self.value_stack.pop()?;
        Ok(())
    }

    /// SSW: the single width is given in font units.
    pub(super) fn op_ssw(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        self.graphics.single_width = self.scale_units(value);
        Ok(())
    }

    pub(super) fn op_flipon(&mut self) -> OpResult {
        self.graphics.auto_flip = true;
        Ok(())
    }

    pub(super) fn op_flipoff(&mut self) -> OpResult {
        self.graphics.auto_flip = false;
        Ok(())
    }

    pub(super) fn op_sdb(&mut self) -> OpResult {
        self.graphics.delta_base = self.value_stack.pop()? as u16;
        Ok(())
    }

    pub(super) fn op_sds(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        if !(0..=6).contains(&value) {
            return Err(HintErrorKind::InvalidStackValue(value));
        }
        self.graphics.delta_shift = value as u16;
        Ok(())
    }

    fn pop_zone(&mut self) -> Result<ZonePointer, HintErrorKind> {
        ZonePointer::try_from(self.value_stack.pop()?)
    }

    fn pop_vector_components(&mut self) -> Result<Point<i32>, HintErrorKind> {
        let y = self.value_stack.pop()? as i16 as i32;
        let x = self.value_stack.pop()? as i16 as i32;
        let (x, y) = math::normalize14(x, y);
        Ok(Point::new(x, y))
    }

    /// Shared by SPVTL/SFVTL: pops p2 (zp2) and p1 (zp1) and builds the
    /// unit vector of the line between them.
    fn line_vector(&mut self, op: u8) -> Result<Point<i32>, HintErrorKind> {
        let p2 = self.value_stack.pop_usize()?;
        let p1 = self.value_stack.pop_usize()?;
        let gs = &self.graphics;
        let delta = self.zone(gs.zp1).point(p1)? - self.zone(gs.zp2).point(p2)?;
        let delta = rotate_if_perpendicular(delta, op & 1 != 0);
        let (x, y) = math::normalize14(delta.x, delta.y);
        Ok(Point::new(x, y))
    }
}

/// Counter-clockwise quarter turn for the perpendicular variants.
fn rotate_if_perpendicular(delta: Point<i32>, perpendicular: bool) -> Point<i32> {
    if perpendicular {
        Point::new(-delta.y, delta.x)
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::test_engine;
    use super::*;

    #[test]
    fn axis_vector_variants() {
        let mut engine = test_engine();
        engine.op_svtca(0x00).unwrap();
        assert_eq!(engine.graphics.proj_vector, Point::new(0, 0x4000));
        assert_eq!(engine.graphics.freedom_vector, Point::new(0, 0x4000));
        engine.op_svtca(0x03).unwrap();
        assert_eq!(engine.graphics.proj_vector, Point::new(0x4000, 0));
        // Freedom unchanged by SPVTCA
        assert_eq!(engine.graphics.freedom_vector, Point::new(0, 0x4000));
    }

    #[test]
    fn vector_from_line() {
        let mut engine = test_engine();
        // Points 0 (0,0) and 1 (64,0): parallel variant gives the x axis
        engine.push_all(&[1, 0]);
        engine.op_svtl(opcode::SPVTL0).unwrap();
        assert_eq!(engine.graphics.proj_vector, Point::new(0x4000, 0));
        // Perpendicular variant rotates a quarter turn counter-clockwise
        engine.push_all(&[1, 0]);
        engine.op_svtl(opcode::SPVTL0 + 1).unwrap();
        assert_eq!(engine.graphics.proj_vector, Point::new(0, 0x4000));
    }

    #[test]
    fn vector_from_components() {
        let mut engine = test_engine();
        // Non-normalized input gets normalized
        engine.push_all(&[0x4000, 0x4000]);
        engine.op_spvfs().unwrap();
        let pv = engine.graphics.proj_vector;
        assert!((pv.x - 0x2D41).abs() <= 1, "{pv:?}");
        assert_eq!(pv.x, pv.y);
        engine.op_gpv().unwrap();
        assert_eq!(engine.pop(), pv.y);
        assert_eq!(engine.pop(), pv.x);
    }

    #[test]
    fn zone_and_reference_setters() {
        let mut engine = test_engine();
        engine.push_all(&[0]);
        engine.op_szps().unwrap();
        assert_eq!(engine.graphics.zp0, ZonePointer::Twilight);
        assert_eq!(engine.graphics.zp2, ZonePointer::Twilight);
        engine.push_all(&[2]);
        assert_eq!(
            engine.op_szp0(),
            Err(HintErrorKind::InvalidZoneIndex(2))
        );
        engine.push_all(&[7]);
        engine.op_srp1().unwrap();
        assert_eq!(engine.graphics.rp1, 7);
    }

    #[test]
    fn loop_counter_rejects_negatives() {
        let mut engine = test_engine();
        engine.push_all(&[-1]);
        assert_eq!(engine.op_sloop(), Err(HintErrorKind::NegativeLoopCounter));
        engine.push_all(&[3]);
        engine.op_sloop().unwrap();
        assert_eq!(engine.graphics.loop_counter, 3);
    }

    #[test]
    fn round_mode_selection() {
        let mut engine = test_engine();
        engine.op_round_mode(opcode::RDTG).unwrap();
        assert_eq!(engine.graphics.round_state.mode, RoundMode::DownToGrid);
        engine.push_all(&[0x48]);
        engine.op_sround().unwrap();
        assert_eq!(engine.graphics.round_state.mode, RoundMode::Super);
        assert_eq!(engine.graphics.round_state.period, 64);
    }
}
