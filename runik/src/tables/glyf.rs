//! The [glyf](https://learn.microsoft.com/en-us/typography/opentype/spec/glyf) table.

use runik_types::{F2Dot14, GlyphId, Pen, Tag};

use crate::{
    error::ReadError,
    font_data::{Cursor, FontData},
};

pub const TAG: Tag = Tag::new(b"glyf");

/// A glyph bounding box in font units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bbox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl Bbox {
    fn read(cursor: &mut Cursor) -> Result<Self, ReadError> {
        Ok(Bbox {
            x_min: cursor.read::<i16>()?,
            y_min: cursor.read::<i16>()?,
            x_max: cursor.read::<i16>()?,
            y_max: cursor.read::<i16>()?,
        })
    }
}

/// An outline point in font units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CurvePoint {
    pub x: i16,
    pub y: i16,
    /// True if the point is on the curve; off-curve points are quadratic
    /// control points.
    pub on_curve: bool,
}

impl CurvePoint {
    pub const fn new(x: i16, y: i16, on_curve: bool) -> Self {
        CurvePoint { x, y, on_curve }
    }
}

/// A decoded entry in the `glyf` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Glyph {
    Simple(SimpleGlyph),
    Composite(CompositeGlyph),
}

impl Glyph {
    /// Decodes the glyph occupying `data` (one `loca`-bounded range).
    pub fn read(data: FontData) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let n_contours = cursor.read::<i16>()?;
        let bbox = Bbox::read(&mut cursor)?;
        match n_contours {
            // Composite is signalled by -1; anything more negative is garbage
            -1 => CompositeGlyph::read_body(cursor, bbox).map(Glyph::Composite),
            n if n < -1 => Err(ReadError::InvalidFormat(n as i64)),
            n => SimpleGlyph::read_body(cursor, n as usize, bbox).map(Glyph::Simple),
        }
    }

    pub fn bbox(&self) -> Bbox {
        match self {
            Glyph::Simple(glyph) => glyph.bbox,
            Glyph::Composite(glyph) => glyph.bbox,
        }
    }

    /// The raw hint program attached to the glyph.
    pub fn instructions(&self) -> &[u8] {
        match self {
            Glyph::Simple(glyph) => &glyph.instructions,
            Glyph::Composite(glyph) => &glyph.instructions,
        }
    }
}

/// Flags for a point in a simple glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimpleGlyphFlags(u8);

impl SimpleGlyphFlags {
    pub const ON_CURVE_POINT: Self = Self(0x01);
    pub const X_SHORT_VECTOR: Self = Self(0x02);
    pub const Y_SHORT_VECTOR: Self = Self(0x04);
    pub const REPEAT_FLAG: Self = Self(0x08);
    pub const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR: Self = Self(0x10);
    pub const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR: Self = Self(0x20);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A glyph defined by its own contours.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimpleGlyph {
    pub bbox: Bbox,
    /// Index of the final point of each contour, ascending.
    pub end_pts_of_contours: Vec<u16>,
    pub points: Vec<CurvePoint>,
    pub instructions: Vec<u8>,
}

impl SimpleGlyph {
    fn read_body(
        mut cursor: Cursor,
        n_contours: usize,
        bbox: Bbox,
    ) -> Result<Self, ReadError> {
        let mut end_pts_of_contours = Vec::with_capacity(n_contours);
        let mut prev_end = None;
        for _ in 0..n_contours {
            let end = cursor.read::<u16>()?;
            if prev_end.is_some_and(|prev| end < prev) {
                return Err(ReadError::MalformedData("contour end points decrease"));
            }
            prev_end = Some(end);
            end_pts_of_contours.push(end);
        }
        let n_points = prev_end.map(|last| last as usize + 1).unwrap_or(0);
        let ins_len = cursor.read::<u16>()? as usize;
        let instructions = cursor.read_bytes(ins_len)?.to_vec();
        let flags = read_flags(&mut cursor, n_points)?;
        let points = read_points(&mut cursor, &flags)?;
        Ok(SimpleGlyph {
            bbox,
            end_pts_of_contours,
            points,
            instructions,
        })
    }

    /// Walks the contours into drawing commands.
    ///
    /// Runs of consecutive off-curve points imply an on-curve point at
    /// the midpoint between each pair, per the TrueType rasterization
    /// model.
    pub fn walk(&self, pen: &mut impl Pen) {
        let mut start = 0usize;
        for &end in &self.end_pts_of_contours {
            let end = end as usize;
            let Some(contour) = self.points.get(start..=end) else {
                return;
            };
            walk_contour(contour, pen);
            start = end + 1;
        }
    }
}

fn read_flags(cursor: &mut Cursor, n_points: usize) -> Result<Vec<SimpleGlyphFlags>, ReadError> {
    let mut flags = Vec::with_capacity(n_points);
    while flags.len() < n_points {
        let flag = SimpleGlyphFlags::from_bits(cursor.read::<u8>()?);
        flags.push(flag);
        if flag.contains(SimpleGlyphFlags::REPEAT_FLAG) {
            let count = cursor.read::<u8>()? as usize;
            if flags.len() + count > n_points {
                return Err(ReadError::MalformedData("flag repeat overruns point count"));
            }
            flags.extend(std::iter::repeat(flag).take(count));
        }
    }
    Ok(flags)
}

fn read_points(
    cursor: &mut Cursor,
    flags: &[SimpleGlyphFlags],
) -> Result<Vec<CurvePoint>, ReadError> {
    let mut points = vec![CurvePoint::default(); flags.len()];
    // x deltas, then y deltas; coordinates are running sums
    let mut x = 0i16;
    for (point, flag) in points.iter_mut().zip(flags) {
        x = x.wrapping_add(read_delta(
            cursor,
            *flag,
            SimpleGlyphFlags::X_SHORT_VECTOR,
            SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
        )?);
        point.x = x;
        point.on_curve = flag.contains(SimpleGlyphFlags::ON_CURVE_POINT);
    }
    let mut y = 0i16;
    for (point, flag) in points.iter_mut().zip(flags) {
        y = y.wrapping_add(read_delta(
            cursor,
            *flag,
            SimpleGlyphFlags::Y_SHORT_VECTOR,
            SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
        )?);
        point.y = y;
    }
    Ok(points)
}

fn read_delta(
    cursor: &mut Cursor,
    flag: SimpleGlyphFlags,
    short: SimpleGlyphFlags,
    same_or_positive: SimpleGlyphFlags,
) -> Result<i16, ReadError> {
    if flag.contains(short) {
        let value = cursor.read::<u8>()? as i16;
        Ok(if flag.contains(same_or_positive) {
            value
        } else {
            -value
        })
    } else if flag.contains(same_or_positive) {
        Ok(0)
    } else {
        cursor.read::<i16>()
    }
}

fn walk_contour(points: &[CurvePoint], pen: &mut impl Pen) {
    let Some(first) = points.first() else {
        return;
    };
    let last = points[points.len() - 1];
    // Pick a starting on-curve point, synthesizing one between the first
    // and last points if the contour has none at either end.
    let (start, body): ((f32, f32), &[CurvePoint]) = if first.on_curve {
        ((first.x as f32, first.y as f32), &points[1..])
    } else if last.on_curve {
        ((last.x as f32, last.y as f32), &points[..points.len() - 1])
    } else {
        (
            (
                (first.x as f32 + last.x as f32) / 2.0,
                (first.y as f32 + last.y as f32) / 2.0,
            ),
            points,
        )
    };
    pen.move_to(start.0, start.1);
    let mut pending: Option<(f32, f32)> = None;
    for point in body {
        let pos = (point.x as f32, point.y as f32);
        if point.on_curve {
            match pending.take() {
                Some(ctrl) => pen.quad_to(ctrl.0, ctrl.1, pos.0, pos.1),
                None => pen.line_to(pos.0, pos.1),
            }
        } else if let Some(ctrl) = pending.replace(pos) {
            // Two off-curve points in a row imply an on-curve midpoint
            let mid = ((ctrl.0 + pos.0) / 2.0, (ctrl.1 + pos.1) / 2.0);
            pen.quad_to(ctrl.0, ctrl.1, mid.0, mid.1);
        }
    }
    match pending {
        Some(ctrl) => pen.quad_to(ctrl.0, ctrl.1, start.0, start.1),
        None => pen.line_to(start.0, start.1),
    }
    pen.close();
}

/// Flags for a component of a composite glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompositeGlyphFlags(u16);

impl CompositeGlyphFlags {
    pub const ARG_1_AND_2_ARE_WORDS: Self = Self(0x0001);
    pub const ARGS_ARE_XY_VALUES: Self = Self(0x0002);
    pub const ROUND_XY_TO_GRID: Self = Self(0x0004);
    pub const WE_HAVE_A_SCALE: Self = Self(0x0008);
    pub const MORE_COMPONENTS: Self = Self(0x0020);
    pub const WE_HAVE_AN_X_AND_Y_SCALE: Self = Self(0x0040);
    pub const WE_HAVE_A_TWO_BY_TWO: Self = Self(0x0080);
    pub const WE_HAVE_INSTRUCTIONS: Self = Self(0x0100);
    pub const USE_MY_METRICS: Self = Self(0x0200);
    pub const OVERLAP_COMPOUND: Self = Self(0x0400);
    pub const SCALED_COMPONENT_OFFSET: Self = Self(0x0800);
    pub const UNSCALED_COMPONENT_OFFSET: Self = Self(0x1000);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Placement of a component: either an offset in font units or a pair of
/// point indices to align (base glyph point, component point).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Offset { x: i16, y: i16 },
    Point { base: u16, component: u16 },
}

/// A 2x2 transform applied to a component's points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transform {
    pub xx: F2Dot14,
    pub yx: F2Dot14,
    pub xy: F2Dot14,
    pub yy: F2Dot14,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            xx: F2Dot14::from_f32(1.0),
            yx: F2Dot14::ZERO,
            xy: F2Dot14::ZERO,
            yy: F2Dot14::from_f32(1.0),
        }
    }
}

/// One component of a composite glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub glyph: GlyphId,
    pub anchor: Anchor,
    pub flags: CompositeGlyphFlags,
    pub transform: Transform,
}

/// A glyph defined as transformed placements of other glyphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeGlyph {
    pub bbox: Bbox,
    pub components: Vec<Component>,
    pub instructions: Vec<u8>,
}

impl CompositeGlyph {
    fn read_body(mut cursor: Cursor, bbox: Bbox) -> Result<Self, ReadError> {
        let mut components = Vec::new();
        let mut have_instructions = false;
        loop {
            let flags = CompositeGlyphFlags::from_bits(cursor.read::<u16>()?);
            let glyph = cursor.read::<GlyphId>()?;
            let anchor = if flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) {
                let arg1 = cursor.read::<i16>()?;
                let arg2 = cursor.read::<i16>()?;
                if flags.contains(CompositeGlyphFlags::ARGS_ARE_XY_VALUES) {
                    Anchor::Offset { x: arg1, y: arg2 }
                } else {
                    Anchor::Point {
                        base: arg1 as u16,
                        component: arg2 as u16,
                    }
                }
            } else {
                let arg1 = cursor.read::<u8>()?;
                let arg2 = cursor.read::<u8>()?;
                if flags.contains(CompositeGlyphFlags::ARGS_ARE_XY_VALUES) {
                    Anchor::Offset {
                        x: arg1 as i8 as i16,
                        y: arg2 as i8 as i16,
                    }
                } else {
                    Anchor::Point {
                        base: arg1 as u16,
                        component: arg2 as u16,
                    }
                }
            };
            let mut transform = Transform::default();
            if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
                let scale = cursor.read::<F2Dot14>()?;
                transform.xx = scale;
                transform.yy = scale;
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
                transform.xx = cursor.read::<F2Dot14>()?;
                transform.yy = cursor.read::<F2Dot14>()?;
            } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
                transform.xx = cursor.read::<F2Dot14>()?;
                transform.yx = cursor.read::<F2Dot14>()?;
                transform.xy = cursor.read::<F2Dot14>()?;
                transform.yy = cursor.read::<F2Dot14>()?;
            }
            have_instructions |= flags.contains(CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS);
            components.push(Component {
                glyph,
                anchor,
                flags,
                transform,
            });
            if !flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
                break;
            }
        }
        let instructions = if have_instructions {
            let len = cursor.read::<u16>()? as usize;
            cursor.read_bytes(len)?.to_vec()
        } else {
            Vec::new()
        };
        Ok(CompositeGlyph {
            bbox,
            components,
            instructions,
        })
    }
}
