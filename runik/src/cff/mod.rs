//! The [CFF](https://learn.microsoft.com/en-us/typography/opentype/spec/cff) table
//! and its Type2 charstring interpreter.

use runik_types::{GlyphId, Pen, Tag};

use crate::{error::ReadError, font_data::FontData};

pub mod charstring;
pub mod dict;
pub mod index;

pub use charstring::CommandSink;
pub use index::Index;

pub const TAG: Tag = Tag::new(b"CFF ");

/// Glyph extents accumulated from every visited point, control points
/// included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// Metrics produced by running one charstring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphMetrics {
    pub advance_width: f64,
    /// `None` for glyphs that draw nothing.
    pub bounds: Option<Bounds>,
}

/// A parsed CFF table with its charstrings and subroutine indices.
pub struct Cff<'a> {
    charstrings: Index<'a>,
    global_subrs: Index<'a>,
    local_subrs: Index<'a>,
    default_width: f64,
    nominal_width: f64,
}

impl<'a> Cff<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, ReadError> {
        let data = FontData::new(data);
        let mut cursor = data.cursor();
        let major = cursor.read::<u8>()?;
        if major != 1 {
            return Err(ReadError::InvalidFormat(major as i64));
        }
        let _minor = cursor.read::<u8>()?;
        let header_size = cursor.read::<u8>()? as usize;
        let _off_size = cursor.read::<u8>()?;

        let mut cursor = data.cursor();
        cursor.seek(header_size);
        let _names = Index::read(&mut cursor)?;
        let top_dicts = Index::read(&mut cursor)?;
        let _strings = Index::read(&mut cursor)?;
        let global_subrs = Index::read(&mut cursor)?;

        let top_dict = dict::parse(top_dicts.get(0)?)?;
        if let Some(entry) = dict::find(&top_dict, dict::op::CHARSTRING_TYPE) {
            let charstring_type = entry.operand(0)?.as_i32()?;
            if charstring_type != 2 {
                return Err(ReadError::Unsupported("type 1 charstrings"));
            }
        }
        let charstrings_offset = dict::find(&top_dict, dict::op::CHARSTRINGS)
            .ok_or(ReadError::MalformedData("top DICT missing CharStrings"))?
            .operand(0)?
            .as_i32()? as usize;
        let mut cursor = data.cursor();
        cursor.seek(charstrings_offset);
        let charstrings = Index::read(&mut cursor)?;

        let mut local_subrs = Index::default();
        let mut default_width = 0.0;
        let mut nominal_width = 0.0;
        if let Some(entry) = dict::find(&top_dict, dict::op::PRIVATE) {
            let size = entry.operand(0)?.as_i32()? as usize;
            let offset = entry.operand(1)?.as_i32()? as usize;
            let private_data = data
                .slice(offset..offset + size)
                .ok_or(ReadError::OutOfBounds)?;
            let private = dict::parse(private_data.as_bytes())?;
            if let Some(entry) = dict::find(&private, dict::op::DEFAULT_WIDTH_X) {
                default_width = entry.operand(0)?.as_f64();
            }
            if let Some(entry) = dict::find(&private, dict::op::NOMINAL_WIDTH_X) {
                nominal_width = entry.operand(0)?.as_f64();
            }
            if let Some(entry) = dict::find(&private, dict::op::SUBRS) {
                // Subrs offsets are relative to the private DICT start
                let subrs_offset = offset + entry.operand(0)?.as_i32()? as usize;
                let mut cursor = data.cursor();
                cursor.seek(subrs_offset);
                local_subrs = Index::read(&mut cursor)?;
            }
        }

        Ok(Cff {
            charstrings,
            global_subrs,
            local_subrs,
            default_width,
            nominal_width,
        })
    }

    pub fn num_glyphs(&self) -> usize {
        self.charstrings.len()
    }

    /// Runs a glyph's charstring into `sink`, returning its metrics.
    pub fn outline(
        &self,
        glyph_id: GlyphId,
        sink: &mut impl CommandSink,
    ) -> Result<GlyphMetrics, ReadError> {
        let program = self.charstrings.get(glyph_id.to_u16() as usize)?;
        let mut bounded = BoundsSink {
            inner: sink,
            bounds: None,
        };
        let advance_width = charstring::run(
            program,
            &self.global_subrs,
            &self.local_subrs,
            self.default_width,
            self.nominal_width,
            &mut bounded,
        )?;
        Ok(GlyphMetrics {
            advance_width,
            bounds: bounded.bounds,
        })
    }

    /// Draws a glyph into a pen.
    pub fn draw(&self, glyph_id: GlyphId, pen: &mut impl Pen) -> Result<GlyphMetrics, ReadError> {
        let mut sink = PenSink { pen };
        self.outline(glyph_id, &mut sink)
    }
}

/// Forwards commands while growing the bounding box over every point.
struct BoundsSink<'a, S> {
    inner: &'a mut S,
    bounds: Option<Bounds>,
}

impl<S> BoundsSink<'_, S> {
    fn add(&mut self, x: f64, y: f64) {
        let bounds = self.bounds.get_or_insert(Bounds {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        });
        bounds.x_min = bounds.x_min.min(x);
        bounds.y_min = bounds.y_min.min(y);
        bounds.x_max = bounds.x_max.max(x);
        bounds.y_max = bounds.y_max.max(y);
    }
}

impl<S: CommandSink> CommandSink for BoundsSink<'_, S> {
    fn hstem(&mut self, y: f64, dy: f64) {
        self.inner.hstem(y, dy);
    }
    fn vstem(&mut self, x: f64, dx: f64) {
        self.inner.vstem(x, dx);
    }
    fn hint_mask(&mut self, mask: &[u8]) {
        self.inner.hint_mask(mask);
    }
    fn move_to(&mut self, x: f64, y: f64) {
        self.add(x, y);
        self.inner.move_to(x, y);
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.add(x, y);
        self.inner.line_to(x, y);
    }
    fn curve_to(&mut self, cx0: f64, cy0: f64, cx1: f64, cy1: f64, x: f64, y: f64) {
        self.add(cx0, cy0);
        self.add(cx1, cy1);
        self.add(x, y);
        self.inner.curve_to(cx0, cy0, cx1, cy1, x, y);
    }
    fn close(&mut self) {
        self.inner.close();
    }
}

struct PenSink<'a, P> {
    pen: &'a mut P,
}

impl<P: Pen> CommandSink for PenSink<'_, P> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.pen.move_to(x as f32, y as f32);
    }
    fn line_to(&mut self, x: f64, y: f64) {
        self.pen.line_to(x as f32, y as f32);
    }
    fn curve_to(&mut self, cx0: f64, cy0: f64, cx1: f64, cy1: f64, x: f64, y: f64) {
        self.pen.curve_to(
            cx0 as f32, cy0 as f32, cx1 as f32, cy1 as f32, x as f32, y as f32,
        );
    }
    fn close(&mut self) {
        self.pen.close();
    }
}

#[cfg(test)]
mod tests {
    use super::charstring::tests::CaptureCommandSink;
    use super::*;

    /// Builds a minimal CFF table with two glyphs: an empty .notdef and
    /// a box with a leading width operand.
    fn cff_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        // header
        bytes.extend([1u8, 0, 4, 1]);
        // name INDEX: one entry, "test"
        bytes.extend(1u16.to_be_bytes());
        bytes.extend([1u8, 1, 5]);
        bytes.extend(b"test");
        // top dict INDEX; fixed-width operands keep the offsets stable
        let top_dict = [
            29u8, 0, 0, 0, 53, 17, // CharStrings at 53
            29, 0, 0, 0, 12, 29, 0, 0, 0, 39, 18, // Private: size 12 at 39
        ];
        bytes.extend(1u16.to_be_bytes());
        bytes.extend([1u8, 1, 1 + top_dict.len() as u8]);
        bytes.extend(top_dict);
        // empty string and global subr INDEXes
        bytes.extend(0u16.to_be_bytes());
        bytes.extend(0u16.to_be_bytes());
        assert_eq!(bytes.len(), 39);
        // private DICT: defaultWidthX 500, nominalWidthX 100, Subrs at +12
        bytes.extend([28u8, 0x01, 0xF4, 20]);
        bytes.extend([28u8, 0x00, 0x64, 21]);
        bytes.extend([28u8, 0x00, 0x0C, 19]);
        // empty local subr INDEX
        bytes.extend(0u16.to_be_bytes());
        assert_eq!(bytes.len(), 53);
        // charstrings INDEX
        let notdef = [14u8];
        let box_glyph = [
            247u8, 142, // width delta 250
            149, 149, 21, // 10 10 rmoveto
            219, 6, // 80 hlineto
            219, 7, // 80 vlineto
            14,
        ];
        bytes.extend(2u16.to_be_bytes());
        bytes.push(1); // offSize
        bytes.push(1);
        bytes.push(1 + notdef.len() as u8);
        bytes.push(1 + (notdef.len() + box_glyph.len()) as u8);
        bytes.extend(notdef);
        bytes.extend(box_glyph);
        bytes
    }

    #[test]
    fn parses_and_counts_glyphs() {
        let bytes = cff_bytes();
        let cff = Cff::new(&bytes).unwrap();
        assert_eq!(cff.num_glyphs(), 2);
    }

    #[test]
    fn empty_glyph_uses_default_width() {
        let bytes = cff_bytes();
        let cff = Cff::new(&bytes).unwrap();
        let mut sink = CaptureCommandSink::default();
        let metrics = cff.outline(GlyphId::new(0), &mut sink).unwrap();
        assert_eq!(metrics.advance_width, 500.0);
        assert_eq!(metrics.bounds, None);
        assert!(sink.commands.is_empty());
    }

    #[test]
    fn outline_width_and_bounds() {
        let bytes = cff_bytes();
        let cff = Cff::new(&bytes).unwrap();
        let mut sink = CaptureCommandSink::default();
        let metrics = cff.outline(GlyphId::new(1), &mut sink).unwrap();
        assert_eq!(metrics.advance_width, 350.0); // nominal 100 + 250
        let bounds = metrics.bounds.unwrap();
        assert_eq!(
            (bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max),
            (10.0, 10.0, 90.0, 90.0)
        );
        assert_eq!(sink.commands, vec!["m 10 10", "l 90 10", "l 90 90", "z"]);
    }

    #[test]
    fn glyph_out_of_range() {
        let bytes = cff_bytes();
        let cff = Cff::new(&bytes).unwrap();
        let mut sink = CaptureCommandSink::default();
        assert!(cff.outline(GlyphId::new(2), &mut sink).is_err());
    }

    #[test]
    fn rejects_wrong_major_version() {
        let bytes = [2u8, 0, 4, 1];
        assert!(matches!(
            Cff::new(&bytes),
            Err(ReadError::InvalidFormat(2))
        ));
    }
}
