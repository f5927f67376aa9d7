//! Reversing the WOFF2 `glyf` transform.
//!
//! The transformed table splits glyph data into seven typed sub-streams
//! sized by a fixed header: contour counts, per-contour point counts,
//! point flags, variable-width coordinate triplets (shared with the
//! per-glyph instruction lengths), composite component records, an
//! explicit bounding box bitmap plus values, and instruction bytes.
//! Reconstruction walks all streams in lockstep, re-emitting standard
//! glyph records and deriving `loca` from the running record lengths.

use crate::{
    error::ReadError,
    font_data::{Cursor, FontData},
    tables::glyf::{Bbox, CompositeGlyphFlags, SimpleGlyphFlags},
    writer::Writer,
};

use super::Woff2Error;

/// The standard tables rebuilt from one transformed `glyf`, along with
/// the per-glyph `xMin` values the `hmtx` transform derives lsbs from.
pub(super) struct ReconstructedGlyf {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub x_mins: Vec<i16>,
}

/// The seven sub-streams, carved from the transformed table body.
struct Streams<'a> {
    contours: Cursor<'a>,
    point_counts: Cursor<'a>,
    flags: Cursor<'a>,
    /// Coordinate triplets interleaved with 255UInt16 instruction lengths.
    glyphs: Cursor<'a>,
    composites: FontData<'a>,
    composite_pos: usize,
    /// One bit per glyph; set bits read an explicit bounding box.
    bbox_bitmap: &'a [u8],
    bboxes: Cursor<'a>,
    instructions: Cursor<'a>,
}

impl<'a> Streams<'a> {
    fn has_explicit_bbox(&self, glyph_index: usize) -> bool {
        self.bbox_bitmap
            .get(glyph_index >> 3)
            .is_some_and(|byte| byte & (0x80 >> (glyph_index & 7)) != 0)
    }
}

pub(super) fn reconstruct(data: &[u8]) -> Result<ReconstructedGlyf, Woff2Error> {
    let data = FontData::new(data);
    let mut cursor = data.cursor();
    let _version = cursor.read::<u32>()?;
    let num_glyphs = cursor.read::<u16>()? as usize;
    let index_format = cursor.read::<u16>()?;
    let long_loca = match index_format {
        0 => false,
        1 => true,
        _ => return Err(Woff2Error::Reconstruction("unknown loca index format")),
    };
    let mut streams = carve_streams(&data, &mut cursor, num_glyphs)?;

    let mut glyf = Writer::new();
    let mut offsets = Vec::with_capacity(num_glyphs + 1);
    let mut x_mins = Vec::with_capacity(num_glyphs);
    for glyph_index in 0..num_glyphs {
        offsets.push(glyf.len());
        let n_contours = streams.contours.read::<i16>()?;
        let explicit_bbox = streams.has_explicit_bbox(glyph_index);
        match n_contours {
            0 => {
                if explicit_bbox {
                    return Err(Woff2Error::Reconstruction(
                        "empty glyph with an explicit bounding box",
                    ));
                }
                x_mins.push(0);
            }
            -1 => x_mins.push(reconstruct_composite(&mut streams, explicit_bbox, &mut glyf)?),
            n if n > 0 => x_mins.push(reconstruct_simple(
                &mut streams,
                n as usize,
                explicit_bbox,
                &mut glyf,
            )?),
            _ => return Err(Woff2Error::Reconstruction("negative contour count")),
        }
        // Short loca stores offsets halved, so records stay even
        if !long_loca {
            glyf.pad_to(2);
        }
    }
    offsets.push(glyf.len());

    let mut loca = Writer::with_capacity((num_glyphs + 1) * if long_loca { 4 } else { 2 });
    for offset in offsets {
        if long_loca {
            loca.write(u32::try_from(offset).map_err(|_| too_large())?);
        } else {
            let halved = offset >> 1;
            loca.write(u16::try_from(halved).map_err(|_| too_large())?);
        }
    }
    Ok(ReconstructedGlyf {
        glyf: glyf.into_inner(),
        loca: loca.into_inner(),
        x_mins,
    })
}

fn too_large() -> Woff2Error {
    Woff2Error::Reconstruction("glyph data exceeds the loca offset range")
}

fn carve_streams<'a>(
    data: &FontData<'a>,
    cursor: &mut Cursor<'a>,
    num_glyphs: usize,
) -> Result<Streams<'a>, Woff2Error> {
    let mut sizes = [0usize; 7];
    for size in sizes.iter_mut() {
        *size = cursor.read::<u32>()? as usize;
    }
    let mut offset = cursor.position();
    let mut next = |len: usize| -> Result<FontData<'a>, Woff2Error> {
        let slice = data
            .slice(offset..offset + len)
            .ok_or(Woff2Error::Read(ReadError::OutOfBounds))?;
        offset += len;
        Ok(slice)
    };
    let contours = next(sizes[0])?;
    let point_counts = next(sizes[1])?;
    let flags = next(sizes[2])?;
    let glyphs = next(sizes[3])?;
    let composites = next(sizes[4])?;
    let bbox_stream = next(sizes[5])?;
    let instructions = next(sizes[6])?;
    // The bitmap is padded to a whole number of 32-bit words
    let bitmap_len = ((num_glyphs + 31) >> 5) << 2;
    let bbox_bitmap = bbox_stream
        .slice(..bitmap_len)
        .ok_or(Woff2Error::Read(ReadError::OutOfBounds))?
        .as_bytes();
    let mut bboxes = bbox_stream.cursor();
    bboxes.seek(bitmap_len);
    Ok(Streams {
        contours: contours.cursor(),
        point_counts: point_counts.cursor(),
        flags: flags.cursor(),
        glyphs: glyphs.cursor(),
        composites,
        composite_pos: 0,
        bbox_bitmap,
        bboxes,
        instructions: instructions.cursor(),
    })
}

/// A decoded point delta with the absolute position it lands on.
struct TripletPoint {
    dx: i16,
    dy: i16,
    x: i16,
    y: i16,
    on_curve: bool,
}

fn reconstruct_simple(
    streams: &mut Streams,
    n_contours: usize,
    explicit_bbox: bool,
    glyf: &mut Writer,
) -> Result<i16, Woff2Error> {
    let mut end_points = Vec::with_capacity(n_contours);
    let mut total_points = 0usize;
    for _ in 0..n_contours {
        let count = streams.point_counts.read_packed_u16()? as usize;
        total_points += count;
        let end = total_points
            .checked_sub(1)
            .ok_or(Woff2Error::Reconstruction("contour with no points"))?;
        end_points.push(u16::try_from(end).map_err(|_| {
            Woff2Error::Reconstruction("point count exceeds the glyph point limit")
        })?);
    }

    let mut points = Vec::with_capacity(total_points);
    let mut x = 0i32;
    let mut y = 0i32;
    for _ in 0..total_points {
        let flag = streams.flags.read::<u8>()?;
        let on_curve = flag & 0x80 == 0;
        let (dx, dy) = triplet(flag & 0x7F, &mut streams.glyphs)?;
        x += dx;
        y += dy;
        let out_of_range = || Woff2Error::Reconstruction("point coordinate overflows i16");
        points.push(TripletPoint {
            dx: i16::try_from(dx).map_err(|_| out_of_range())?,
            dy: i16::try_from(dy).map_err(|_| out_of_range())?,
            x: i16::try_from(x).map_err(|_| out_of_range())?,
            y: i16::try_from(y).map_err(|_| out_of_range())?,
            on_curve,
        });
    }

    let bbox = if explicit_bbox {
        read_bbox(&mut streams.bboxes)?
    } else {
        computed_bbox(&points)
    };
    let instruction_len = streams.glyphs.read_packed_u16()? as usize;
    let instructions = streams.instructions.read_bytes(instruction_len)?;

    glyf.write(n_contours as u16 as i16);
    write_bbox(glyf, bbox);
    for end in end_points {
        glyf.write(end);
    }
    glyf.write(instruction_len as u16);
    glyf.write_bytes(instructions);
    write_points(glyf, &points);
    Ok(bbox.x_min)
}

fn reconstruct_composite(
    streams: &mut Streams,
    explicit_bbox: bool,
    glyf: &mut Writer,
) -> Result<i16, Woff2Error> {
    if !explicit_bbox {
        return Err(Woff2Error::Reconstruction(
            "composite glyph without an explicit bounding box",
        ));
    }
    let start = streams.composite_pos;
    let mut cursor = streams.composites.cursor();
    cursor.seek(start);
    let mut have_instructions = false;
    loop {
        let flags = CompositeGlyphFlags::from_bits(cursor.read::<u16>()?);
        let _component = cursor.read::<u16>()?;
        if flags.contains(CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS) {
            have_instructions = true;
        }
        let mut arg_len = if flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) {
            4
        } else {
            2
        };
        if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
            arg_len += 8;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            arg_len += 4;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
            arg_len += 2;
        }
        cursor.advance_by(arg_len)?;
        if !flags.contains(CompositeGlyphFlags::MORE_COMPONENTS) {
            break;
        }
    }
    let end = cursor.position();
    streams.composite_pos = end;
    let components = streams
        .composites
        .slice(start..end)
        .ok_or(Woff2Error::Read(ReadError::OutOfBounds))?;

    let bbox = read_bbox(&mut streams.bboxes)?;
    glyf.write(-1i16);
    write_bbox(glyf, bbox);
    glyf.write_bytes(components.as_bytes());
    if have_instructions {
        let instruction_len = streams.glyphs.read_packed_u16()? as usize;
        let instructions = streams.instructions.read_bytes(instruction_len)?;
        glyf.write(instruction_len as u16);
        glyf.write_bytes(instructions);
    }
    Ok(bbox.x_min)
}

fn read_bbox(cursor: &mut Cursor) -> Result<Bbox, ReadError> {
    Ok(Bbox {
        x_min: cursor.read::<i16>()?,
        y_min: cursor.read::<i16>()?,
        x_max: cursor.read::<i16>()?,
        y_max: cursor.read::<i16>()?,
    })
}

fn write_bbox(glyf: &mut Writer, bbox: Bbox) {
    glyf.write(bbox.x_min);
    glyf.write(bbox.y_min);
    glyf.write(bbox.x_max);
    glyf.write(bbox.y_max);
}

fn computed_bbox(points: &[TripletPoint]) -> Bbox {
    let mut bbox = match points.first() {
        Some(point) => Bbox {
            x_min: point.x,
            y_min: point.y,
            x_max: point.x,
            y_max: point.y,
        },
        None => return Bbox::default(),
    };
    for point in &points[1..] {
        bbox.x_min = bbox.x_min.min(point.x);
        bbox.y_min = bbox.y_min.min(point.y);
        bbox.x_max = bbox.x_max.max(point.x);
        bbox.y_max = bbox.y_max.max(point.y);
    }
    bbox
}

/// Decodes one coordinate triplet.
///
/// The low seven bits of the point flag select one of twelve bands that
/// fix how many data bytes follow, how their bits split between the two
/// deltas, an implicit bias, and the sign of each delta.
fn triplet(flag: u8, cursor: &mut Cursor) -> Result<(i32, i32), ReadError> {
    fn with_sign(flag: i32, value: i32) -> i32 {
        if flag & 1 != 0 {
            value
        } else {
            -value
        }
    }
    let flag = flag as i32;
    Ok(match flag {
        0..=9 => {
            let b0 = cursor.read::<u8>()? as i32;
            (0, with_sign(flag, ((flag & 14) << 7) + b0))
        }
        10..=19 => {
            let b0 = cursor.read::<u8>()? as i32;
            (with_sign(flag, (((flag - 10) & 14) << 7) + b0), 0)
        }
        20..=83 => {
            let bits = flag - 20;
            let b0 = cursor.read::<u8>()? as i32;
            (
                with_sign(flag, 1 + (bits & 0x30) + (b0 >> 4)),
                with_sign(flag >> 1, 1 + ((bits & 0x0C) << 2) + (b0 & 0x0F)),
            )
        }
        84..=119 => {
            let bits = flag - 84;
            let b0 = cursor.read::<u8>()? as i32;
            let b1 = cursor.read::<u8>()? as i32;
            (
                with_sign(flag, 1 + ((bits / 12) << 8) + b0),
                with_sign(flag >> 1, 1 + (((bits % 12) >> 2) << 8) + b1),
            )
        }
        120..=123 => {
            let b0 = cursor.read::<u8>()? as i32;
            let b1 = cursor.read::<u8>()? as i32;
            let b2 = cursor.read::<u8>()? as i32;
            (
                with_sign(flag, (b0 << 4) | (b1 >> 4)),
                with_sign(flag >> 1, ((b1 & 0x0F) << 8) | b2),
            )
        }
        _ => {
            let b0 = cursor.read::<u8>()? as i32;
            let b1 = cursor.read::<u8>()? as i32;
            let b2 = cursor.read::<u8>()? as i32;
            let b3 = cursor.read::<u8>()? as i32;
            (
                with_sign(flag, (b0 << 8) | b1),
                with_sign(flag >> 1, (b2 << 8) | b3),
            )
        }
    })
}

/// Emits the standard flag, x and y coordinate arrays.
///
/// Zero deltas become "same" flags with no data; deltas within a byte
/// use the short form with the sign carried in the flag. No repeat
/// compression is applied.
fn write_points(glyf: &mut Writer, points: &[TripletPoint]) {
    let mut flags = Vec::with_capacity(points.len());
    let mut xs = Writer::new();
    let mut ys = Writer::new();
    for point in points {
        let mut flag = SimpleGlyphFlags::default();
        if point.on_curve {
            flag = flag.union(SimpleGlyphFlags::ON_CURVE_POINT);
        }
        match point.dx {
            0 => flag = flag.union(SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR),
            -255..=255 => {
                flag = flag.union(SimpleGlyphFlags::X_SHORT_VECTOR);
                if point.dx > 0 {
                    flag = flag.union(SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR);
                }
                xs.write(point.dx.unsigned_abs() as u8);
            }
            dx => xs.write(dx),
        }
        match point.dy {
            0 => flag = flag.union(SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR),
            -255..=255 => {
                flag = flag.union(SimpleGlyphFlags::Y_SHORT_VECTOR);
                if point.dy > 0 {
                    flag = flag.union(SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR);
                }
                ys.write(point.dy.unsigned_abs() as u8);
            }
            dy => ys.write(dy),
        }
        flags.push(flag.bits());
    }
    glyf.write_bytes(&flags);
    glyf.write_bytes(xs.as_bytes());
    glyf.write_bytes(ys.as_bytes());
}
