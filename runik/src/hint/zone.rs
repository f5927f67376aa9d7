//! Outline zones operated on by the interpreter.

use runik_types::Point;

use super::{
    error::HintErrorKind,
    graphics::Axis,
    math,
};

/// Point touched in x (set by moves while the freedom vector has an x
/// component).
pub const TOUCH_X: u8 = 1;
/// Point touched in y.
pub const TOUCH_Y: u8 = 2;

impl Axis {
    pub fn touch_flag(self) -> u8 {
        match self {
            Axis::X => TOUCH_X,
            Axis::Y => TOUCH_Y,
        }
    }
}

/// A set of points the bytecode can address: either the twilight zone
/// or the glyph outline plus its phantom points.
///
/// All coordinates are 26.6 device space. `original` holds the scaled
/// but unhinted positions; `unscaled` the font unit positions used by
/// dual projection.
#[derive(Clone, Default, Debug)]
pub struct Zone {
    pub unscaled: Vec<Point<i32>>,
    pub original: Vec<Point<i32>>,
    pub points: Vec<Point<i32>>,
    pub flags: Vec<u8>,
    /// Index of each contour's last point.
    pub contours: Vec<u16>,
}

impl Zone {
    /// An empty twilight zone with the given capacity, all points at
    /// the origin.
    pub fn twilight(max_points: usize) -> Self {
        Zone {
            unscaled: vec![Point::default(); max_points],
            original: vec![Point::default(); max_points],
            points: vec![Point::default(); max_points],
            flags: vec![0; max_points],
            contours: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.unscaled.clear();
        self.original.clear();
        self.points.clear();
        self.flags.clear();
        self.contours.clear();
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn point(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.points
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidPointIndex(index))
    }

    pub fn point_mut(&mut self, index: usize) -> Result<&mut Point<i32>, HintErrorKind> {
        self.points
            .get_mut(index)
            .ok_or(HintErrorKind::InvalidPointIndex(index))
    }

    pub fn original(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.original
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidPointIndex(index))
    }

    pub fn original_mut(&mut self, index: usize) -> Result<&mut Point<i32>, HintErrorKind> {
        self.original
            .get_mut(index)
            .ok_or(HintErrorKind::InvalidPointIndex(index))
    }

    pub fn unscaled(&self, index: usize) -> Result<Point<i32>, HintErrorKind> {
        self.unscaled
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidPointIndex(index))
    }

    pub fn touch(&mut self, index: usize, axis: Axis) -> Result<(), HintErrorKind> {
        let flag = self
            .flags
            .get_mut(index)
            .ok_or(HintErrorKind::InvalidPointIndex(index))?;
        *flag |= axis.touch_flag();
        Ok(())
    }

    pub fn untouch(&mut self, index: usize, axis: Axis) -> Result<(), HintErrorKind> {
        let flag = self
            .flags
            .get_mut(index)
            .ok_or(HintErrorKind::InvalidPointIndex(index))?;
        *flag &= !axis.touch_flag();
        Ok(())
    }

    pub fn is_touched(&self, index: usize, axis: Axis) -> Result<bool, HintErrorKind> {
        let flag = self
            .flags
            .get(index)
            .ok_or(HintErrorKind::InvalidPointIndex(index))?;
        Ok(flag & axis.touch_flag() != 0)
    }

    pub fn contour(&self, index: usize) -> Result<u16, HintErrorKind> {
        self.contours
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidContourIndex(index))
    }

    /// Interpolates untouched points in one axis (`IUP`).
    ///
    /// Walks each contour: runs of untouched points between two touched
    /// neighbors are linearly interpolated when their original
    /// coordinate lies between the neighbors' originals, and shifted by
    /// the nearer neighbor's delta otherwise.
    pub fn iup(&mut self, axis: Axis) -> Result<(), HintErrorKind> {
        let mut start = 0usize;
        for i in 0..self.contours.len() {
            let end = self.contour(i)? as usize;
            if end >= self.points.len() || end < start {
                return Err(HintErrorKind::InvalidPointRange(start, end));
            }
            self.iup_contour(axis, start, end)?;
            start = end + 1;
        }
        Ok(())
    }

    fn iup_contour(&mut self, axis: Axis, start: usize, end: usize) -> Result<(), HintErrorKind> {
        let touch = axis.touch_flag();
        let first_touched = match (start..=end).find(|&i| self.flags[i] & touch != 0) {
            Some(index) => index,
            None => return Ok(()),
        };
        let mut prev_touched = first_touched;
        let mut i = first_touched + 1;
        while i <= end {
            if self.flags[i] & touch != 0 {
                self.iup_interpolate(axis, prev_touched + 1..i, prev_touched, i);
                prev_touched = i;
            }
            i += 1;
        }
        // Wrap the tail of the contour back to the first touched point
        if prev_touched == first_touched {
            self.iup_shift(axis, start..=end, first_touched);
        } else {
            self.iup_interpolate(axis, prev_touched + 1..end + 1, prev_touched, first_touched);
            if first_touched > start {
                self.iup_interpolate(axis, start..first_touched, prev_touched, first_touched);
            }
        }
        Ok(())
    }

    /// Single touched point in the contour: every other point shifts
    /// by the same delta.
    fn iup_shift(
        &mut self,
        axis: Axis,
        range: core::ops::RangeInclusive<usize>,
        reference: usize,
    ) {
        let delta = coord(self.points[reference], axis) - coord(self.original[reference], axis);
        if delta == 0 {
            return;
        }
        for i in range {
            if i != reference {
                let value = coord(self.points[i], axis) + delta;
                set_coord(&mut self.points[i], axis, value);
            }
        }
    }

    fn iup_interpolate(
        &mut self,
        axis: Axis,
        range: core::ops::Range<usize>,
        ref1: usize,
        ref2: usize,
    ) {
        if range.is_empty() {
            return;
        }
        let mut orig1 = coord(self.original[ref1], axis);
        let mut orig2 = coord(self.original[ref2], axis);
        let mut cur1 = coord(self.points[ref1], axis);
        let mut cur2 = coord(self.points[ref2], axis);
        if orig1 > orig2 {
            core::mem::swap(&mut orig1, &mut orig2);
            core::mem::swap(&mut cur1, &mut cur2);
        }
        let delta1 = cur1 - orig1;
        let delta2 = cur2 - orig2;
        for i in range {
            let orig = coord(self.original[i], axis);
            let value = if orig <= orig1 {
                orig + delta1
            } else if orig >= orig2 {
                orig + delta2
            } else if orig2 == orig1 {
                orig + delta1
            } else {
                cur1 + math::mul_div(orig - orig1, cur2 - cur1, orig2 - orig1)
            };
            set_coord(&mut self.points[i], axis, value);
        }
    }
}

fn coord(point: Point<i32>, axis: Axis) -> i32 {
    match axis {
        Axis::X => point.x,
        Axis::Y => point.y,
    }
}

fn set_coord(point: &mut Point<i32>, axis: Axis, value: i32) {
    match axis {
        Axis::X => point.x = value,
        Axis::Y => point.y = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_with_points(original: &[(i32, i32)]) -> Zone {
        let original: Vec<_> = original.iter().map(|&(x, y)| Point::new(x, y)).collect();
        Zone {
            unscaled: original.clone(),
            points: original.clone(),
            flags: vec![0; original.len()],
            contours: vec![(original.len() - 1) as u16],
            original,
        }
    }

    #[test]
    fn bounds_checked_access() {
        let zone = zone_with_points(&[(0, 0), (64, 0)]);
        assert!(zone.point(1).is_ok());
        assert_eq!(zone.point(2), Err(HintErrorKind::InvalidPointIndex(2)));
        assert_eq!(zone.contour(1), Err(HintErrorKind::InvalidContourIndex(1)));
    }

    #[test]
    fn touch_flags_per_axis() {
        let mut zone = zone_with_points(&[(0, 0)]);
        zone.touch(0, Axis::X).unwrap();
        assert_eq!(zone.is_touched(0, Axis::X), Ok(true));
        assert_eq!(zone.is_touched(0, Axis::Y), Ok(false));
        zone.touch(0, Axis::Y).unwrap();
        zone.untouch(0, Axis::X).unwrap();
        assert_eq!(zone.is_touched(0, Axis::X), Ok(false));
        assert_eq!(zone.is_touched(0, Axis::Y), Ok(true));
    }

    #[test]
    fn iup_interpolates_between_touched_points() {
        // Four collinear points; the ends move right by a pixel
        let mut zone = zone_with_points(&[(0, 0), (64, 0), (128, 0), (192, 0)]);
        zone.points[0].x = 64;
        zone.points[3].x = 256;
        zone.touch(0, Axis::X).unwrap();
        zone.touch(3, Axis::X).unwrap();
        zone.iup(Axis::X).unwrap();
        // Interior points interpolate to keep their relative position
        assert_eq!(zone.points[1].x, 128);
        assert_eq!(zone.points[2].x, 192);
        // The y axis is untouched
        assert_eq!(zone.points[1].y, 0);
    }

    #[test]
    fn iup_shifts_points_outside_reference_span() {
        // Touched points at x=64 and x=128; point 0 sits below the span
        // and point 3 above, so each shifts with its nearer neighbor
        let mut zone = zone_with_points(&[(0, 0), (64, 0), (128, 0), (256, 0)]);
        zone.points[1].x = 96; // +32
        zone.points[2].x = 160; // +32
        zone.touch(1, Axis::X).unwrap();
        zone.touch(2, Axis::X).unwrap();
        zone.iup(Axis::X).unwrap();
        assert_eq!(zone.points[0].x, 32);
        assert_eq!(zone.points[3].x, 288);
    }

    #[test]
    fn iup_single_touched_point_shifts_contour() {
        let mut zone = zone_with_points(&[(0, 0), (64, 32), (128, -32)]);
        zone.points[1].y = 96; // +64
        zone.touch(1, Axis::Y).unwrap();
        zone.iup(Axis::Y).unwrap();
        assert_eq!(zone.points[0].y, 64);
        assert_eq!(zone.points[2].y, 32);
        // x untouched
        assert_eq!(zone.points[0].x, 0);
    }

    #[test]
    fn iup_without_touched_points_is_a_no_op() {
        let mut zone = zone_with_points(&[(0, 0), (64, 0)]);
        zone.iup(Axis::X).unwrap();
        assert_eq!(zone.points[1].x, 64);
    }
}
