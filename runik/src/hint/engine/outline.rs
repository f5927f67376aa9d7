//! Point movement instructions.

use runik_types::Point;

use super::{
    super::{
        code::opcode,
        error::HintErrorKind,
        graphics::{Axis, ZonePointer},
        math,
    },
    Engine, OpResult,
};

// MDRP/MIRP flag bits
const SET_RP0: u8 = 0x10;
const KEEP_MIN_DISTANCE: u8 = 0x08;
const ROUND_DISTANCE: u8 = 0x04;

impl<'a> Engine<'a> {
    /// MDAP: anchor a point, optionally snapping it to the grid.
    pub(super) fn op_mdap(&mut self, op: u8) -> OpResult {
        let p = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let distance = if op == opcode::MDAP1 {
            let current = gs.project(self.zone(gs.zp0).point(p)?);
            gs.round_state.round(current) - current
        } else {
            0
        };
        self.move_point(gs.zp0, p, distance)?;
        self.graphics.rp0 = p;
        self.graphics.rp1 = p;
        Ok(())
    }

    /// MIAP: anchor a point to a control value.
    pub(super) fn op_miap(&mut self, op: u8) -> OpResult {
        let cvt_index = self.value_stack.pop_usize()?;
        let p = self.value_stack.pop_usize()?;
        let mut distance = self.cvt_get(cvt_index)?;
        let gs = self.graphics;
        // Twilight points materialize at the control value position
        if gs.zp0 == ZonePointer::Twilight {
            let position = Point::new(
                math::mul14(distance, gs.proj_vector.x),
                math::mul14(distance, gs.proj_vector.y),
            );
            let zone = self.zone_mut(gs.zp0);
            *zone.original_mut(p)? = position;
            *zone.point_mut(p)? = position;
        }
        let current = gs.project(self.zone(gs.zp0).point(p)?);
        if op == opcode::MIAP1 {
            if (distance - current).abs() > gs.control_value_cutin {
                distance = current;
            }
            distance = gs.round_state.round(distance);
        }
        self.move_point(gs.zp0, p, distance - current)?;
        self.graphics.rp0 = p;
        self.graphics.rp1 = p;
        Ok(())
    }

    /// MDRP: move a point to its original distance from rp0.
    pub(super) fn op_mdrp(&mut self, op: u8) -> OpResult {
        let p = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let original_dist = {
            let target = self.zone(gs.zp1).original(p)?;
            let reference = self.zone(gs.zp0).original(gs.rp0)?;
            gs.dual_project(target - reference)
        };
        let mut distance = self.apply_single_width(original_dist);
        if op & ROUND_DISTANCE != 0 {
            distance = gs.round_state.round(distance);
        }
        if op & KEEP_MIN_DISTANCE != 0 {
            distance = clamp_to_minimum(distance, original_dist, gs.minimum_distance);
        }
        self.move_to_distance(p, distance)?;
        self.finish_relative_move(p, op);
        Ok(())
    }

    /// MIRP: like MDRP but the target distance comes from the CVT.
    pub(super) fn op_mirp(&mut self, op: u8) -> OpResult {
        let cvt_index = self.value_stack.pop_usize()?;
        let p = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let cvt_dist = self.apply_single_width(self.cvt_get(cvt_index)?);
        if gs.zp1 == ZonePointer::Twilight {
            let reference = self.zone(gs.zp0).original(gs.rp0)?;
            let position = Point::new(
                reference.x + math::mul14(cvt_dist, gs.freedom_vector.x),
                reference.y + math::mul14(cvt_dist, gs.freedom_vector.y),
            );
            let zone = self.zone_mut(gs.zp1);
            *zone.original_mut(p)? = position;
            *zone.point_mut(p)? = position;
        }
        let original_dist = {
            let target = self.zone(gs.zp1).original(p)?;
            let reference = self.zone(gs.zp0).original(gs.rp0)?;
            gs.dual_project(target - reference)
        };
        let mut distance = cvt_dist;
        if gs.auto_flip && (original_dist ^ distance) < 0 {
            distance = -distance;
        }
        if op & ROUND_DISTANCE != 0 {
            // The cut-in only applies when both points share a zone
            if gs.zp0 == gs.zp1 && (distance - original_dist).abs() > gs.control_value_cutin {
                distance = original_dist;
            }
            distance = gs.round_state.round(distance);
        }
        if op & KEEP_MIN_DISTANCE != 0 {
            distance = clamp_to_minimum(distance, original_dist, gs.minimum_distance);
        }
        self.move_to_distance(p, distance)?;
        self.finish_relative_move(p, op);
        Ok(())
    }

    /// MSIRP: move to a stack distance from rp0, no rounding or CVT.
    pub(super) fn op_msirp(&mut self, op: u8) -> OpResult {
        let distance = self.value_stack.pop()?;
        let p = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        if gs.zp1 == ZonePointer::Twilight {
            let reference = self.zone(gs.zp0).original(gs.rp0)?;
            let zone = self.zone_mut(gs.zp1);
            *zone.original_mut(p)? = reference;
            *zone.point_mut(p)? = reference;
        }
        self.move_to_distance(p, distance)?;
        self.graphics.rp1 = gs.rp0;
        self.graphics.rp2 = p;
        if op == opcode::MSIRP1 {
            self.graphics.rp0 = p;
        }
        Ok(())
    }

    /// SHP: shift points by the reference point's displacement.
    pub(super) fn op_shp(&mut self, op: u8) -> OpResult {
        let (delta, _, _) = self.point_displacement(op & 1 != 0)?;
        let zp2 = self.graphics.zp2;
        for _ in 0..self.graphics.loop_counter {
            let p = self.value_stack.pop_usize()?;
            self.shift_point(zp2, p, delta, true)?;
        }
        self.graphics.loop_counter = 1;
        Ok(())
    }

    /// SHC: shift a whole contour, skipping the reference point.
    pub(super) fn op_shc(&mut self, op: u8) -> OpResult {
        let (delta, ref_zone, ref_point) = self.point_displacement(op & 1 != 0)?;
        let contour = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let (start, end) = if gs.zp2 == ZonePointer::Glyph {
            let zone = self.zone(gs.zp2);
            let end = zone.contour(contour)? as usize;
            let start = if contour > 0 {
                zone.contour(contour - 1)? as usize + 1
            } else {
                0
            };
            (start, end)
        } else {
            (0, self.zone(gs.zp2).point_count().saturating_sub(1))
        };
        for p in start..=end {
            if gs.zp2 == ref_zone && p == ref_point {
                continue;
            }
            self.shift_point(gs.zp2, p, delta, true)?;
        }
        Ok(())
    }

    /// SHZ: shift every point in a zone without touching them.
    pub(super) fn op_shz(&mut self, op: u8) -> OpResult {
        let (delta, ref_zone, ref_point) = self.point_displacement(op & 1 != 0)?;
        let zone = ZonePointer::try_from(self.value_stack.pop()?)?;
        for p in 0..self.zone(zone).point_count() {
            if zone == ref_zone && p == ref_point {
                continue;
            }
            self.shift_point(zone, p, delta, false)?;
        }
        Ok(())
    }

    /// SHPIX: shift points along the freedom vector by a raw amount.
    pub(super) fn op_shpix(&mut self) -> OpResult {
        let amount = self.value_stack.pop()?;
        let gs = self.graphics;
        let delta = Point::new(
            math::mul14(amount, gs.freedom_vector.x),
            math::mul14(amount, gs.freedom_vector.y),
        );
        for _ in 0..gs.loop_counter {
            let p = self.value_stack.pop_usize()?;
            self.shift_point(gs.zp2, p, delta, true)?;
        }
        self.graphics.loop_counter = 1;
        Ok(())
    }

    /// IP: interpolate points to preserve their relative position
    /// between rp1 and rp2.
    pub(super) fn op_ip(&mut self) -> OpResult {
        let gs = self.graphics;
        let original1 = self.zone(gs.zp0).original(gs.rp1)?;
        let current1 = self.zone(gs.zp0).point(gs.rp1)?;
        let original_range = {
            let original2 = self.zone(gs.zp1).original(gs.rp2)?;
            gs.dual_project(original2 - original1)
        };
        let current_range = {
            let current2 = self.zone(gs.zp1).point(gs.rp2)?;
            gs.project(current2 - current1)
        };
        for _ in 0..gs.loop_counter {
            let p = self.value_stack.pop_usize()?;
            let original_dist = gs.dual_project(self.zone(gs.zp2).original(p)? - original1);
            let current_dist = gs.project(self.zone(gs.zp2).point(p)? - current1);
            let target = if original_range != 0 {
                math::mul_div(original_dist, current_range, original_range)
            } else {
                original_dist
            };
            self.move_point(gs.zp2, p, target - current_dist)?;
        }
        self.graphics.loop_counter = 1;
        Ok(())
    }

    /// ALIGNRP: move points onto rp0's projected position.
    pub(super) fn op_alignrp(&mut self) -> OpResult {
        let gs = self.graphics;
        let reference = self.zone(gs.zp0).point(gs.rp0)?;
        for _ in 0..gs.loop_counter {
            let p = self.value_stack.pop_usize()?;
            let distance = gs.project(self.zone(gs.zp1).point(p)? - reference);
            self.move_point(gs.zp1, p, -distance)?;
        }
        self.graphics.loop_counter = 1;
        Ok(())
    }

    /// ALIGNPTS: move two points to their projected midpoint.
    pub(super) fn op_alignpts(&mut self) -> OpResult {
        let p2 = self.value_stack.pop_usize()?;
        let p1 = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let distance = {
            let a = self.zone(gs.zp0).point(p2)?;
            let b = self.zone(gs.zp1).point(p1)?;
            gs.project(a - b) / 2
        };
        self.move_point(gs.zp1, p1, distance)?;
        self.move_point(gs.zp0, p2, -distance)?;
        Ok(())
    }

    /// UTP: clear the touch flags selected by the freedom vector.
    pub(super) fn op_utp(&mut self) -> OpResult {
        let p = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let zone = self.zone_mut(gs.zp0);
        if gs.freedom_vector.x != 0 {
            zone.untouch(p, Axis::X)?;
        }
        if gs.freedom_vector.y != 0 {
            zone.untouch(p, Axis::Y)?;
        }
        Ok(())
    }

    /// IUP: interpolate untouched points in the glyph zone.
    pub(super) fn op_iup(&mut self, op: u8) -> OpResult {
        let axis = if op == opcode::IUP1 { Axis::X } else { Axis::Y };
        self.zones[1].iup(axis)
    }

    /// GC: push a point's projected coordinate.
    pub(super) fn op_gc(&mut self, op: u8) -> OpResult {
        let p = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let value = if op == opcode::GC1 {
            gs.dual_project(self.zone(gs.zp2).original(p)?)
        } else {
            gs.project(self.zone(gs.zp2).point(p)?)
        };
        self.value_stack.push(value)
    }

    /// SCFS: set a point's projected coordinate.
    pub(super) fn op_scfs(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let p = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let current = gs.project(self.zone(gs.zp2).point(p)?);
        self.move_point(gs.zp2, p, value - current)?;
        if gs.zp2 == ZonePointer::Twilight {
            let current = self.zone(gs.zp2).point(p)?;
            *self.zone_mut(gs.zp2).original_mut(p)? = current;
        }
        Ok(())
    }

    /// MD: measure the distance between two points.
    pub(super) fn op_md(&mut self, op: u8) -> OpResult {
        let p2 = self.value_stack.pop_usize()?;
        let p1 = self.value_stack.pop_usize()?;
        let gs = self.graphics;
        let distance = if op == opcode::MD1 {
            gs.project(self.zone(gs.zp0).point(p1)? - self.zone(gs.zp1).point(p2)?)
        } else {
            gs.dual_project(self.zone(gs.zp0).original(p1)? - self.zone(gs.zp1).original(p2)?)
        };
        self.value_stack.push(distance)
    }

    /// Replaces a distance close to the single width with the single
    /// width itself, keeping the sign.
    fn apply_single_width(&self, distance: i32) -> i32 {
        let gs = &self.graphics;
        if gs.single_width_cutin > 0
            && (distance - gs.single_width).abs() < gs.single_width_cutin
        {
            if distance >= 0 {
                gs.single_width
            } else {
                -gs.single_width
            }
        } else {
            distance
        }
    }

    /// Moves `p` in zp1 so its projected distance from rp0 becomes
    /// `distance`.
    fn move_to_distance(&mut self, p: usize, distance: i32) -> Result<(), HintErrorKind> {
        let gs = self.graphics;
        let current_dist = {
            let target = self.zone(gs.zp1).point(p)?;
            let reference = self.zone(gs.zp0).point(gs.rp0)?;
            gs.project(target - reference)
        };
        self.move_point(gs.zp1, p, distance - current_dist)
    }

    fn finish_relative_move(&mut self, p: usize, op: u8) {
        self.graphics.rp1 = self.graphics.rp0;
        self.graphics.rp2 = p;
        if op & SET_RP0 != 0 {
            self.graphics.rp0 = p;
        }
    }
}

/// Distances never round below the minimum, in the direction of the
/// original distance.
fn clamp_to_minimum(distance: i32, original: i32, minimum: i32) -> i32 {
    if original >= 0 {
        distance.max(minimum)
    } else {
        distance.min(-minimum)
    }
}
