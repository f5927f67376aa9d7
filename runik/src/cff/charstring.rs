//! Type2 charstring evaluation.

use crate::error::ReadError;

use super::index::Index;

/// Maximum size of the operand stack.
const MAX_STACK: usize = 48;

/// Maximum nesting depth for subroutine calls.
const NESTING_DEPTH_LIMIT: u32 = 10;

/// Sink for the commands produced by charstring evaluation.
///
/// Stem hints and hint masks are reported but may be ignored by sinks
/// that only care about geometry.
pub trait CommandSink {
    fn hstem(&mut self, y: f64, dy: f64) {
        let _ = (y, dy);
    }
    fn vstem(&mut self, x: f64, dx: f64) {
        let _ = (x, dx);
    }
    fn hint_mask(&mut self, mask: &[u8]) {
        let _ = mask;
    }
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn curve_to(&mut self, cx0: f64, cy0: f64, cx1: f64, cy1: f64, x: f64, y: f64);
    fn close(&mut self);
}

/// Evaluates a charstring, feeding drawing commands to `sink`.
///
/// Returns the advance width: `nominal_width` plus the optional leading
/// operand on the first stack-clearing operator, or `default_width` when
/// no leading operand is present.
pub fn run(
    charstring: &[u8],
    global_subrs: &Index,
    local_subrs: &Index,
    default_width: f64,
    nominal_width: f64,
    sink: &mut impl CommandSink,
) -> Result<f64, ReadError> {
    let mut evaluator = Evaluator {
        global_subrs,
        local_subrs,
        nominal_width,
        stack: Vec::with_capacity(MAX_STACK),
        x: 0.0,
        y: 0.0,
        num_stems: 0,
        width: None,
        width_resolved: false,
        contour_open: false,
    };
    let ended = evaluator.eval(charstring, sink, 0)?;
    if !ended {
        return Err(ReadError::MalformedData("charstring missing endchar"));
    }
    Ok(evaluator.width.unwrap_or(default_width))
}

// Operators. Escaped two-byte operators are handled inline.
const HSTEM: u8 = 1;
const VSTEM: u8 = 3;
const VMOVETO: u8 = 4;
const RLINETO: u8 = 5;
const HLINETO: u8 = 6;
const VLINETO: u8 = 7;
const RRCURVETO: u8 = 8;
const CALLSUBR: u8 = 10;
const RETURN: u8 = 11;
const ESCAPE: u8 = 12;
const ENDCHAR: u8 = 14;
const HSTEMHM: u8 = 18;
const HINTMASK: u8 = 19;
const CNTRMASK: u8 = 20;
const RMOVETO: u8 = 21;
const HMOVETO: u8 = 22;
const VSTEMHM: u8 = 23;
const RCURVELINE: u8 = 24;
const RLINECURVE: u8 = 25;
const VVCURVETO: u8 = 26;
const HHCURVETO: u8 = 27;
const CALLGSUBR: u8 = 29;
const VHCURVETO: u8 = 30;
const HVCURVETO: u8 = 31;

const HFLEX: u8 = 34;
const FLEX: u8 = 35;
const HFLEX1: u8 = 36;
const FLEX1: u8 = 37;

struct Evaluator<'a> {
    global_subrs: &'a Index<'a>,
    local_subrs: &'a Index<'a>,
    nominal_width: f64,
    stack: Vec<f64>,
    x: f64,
    y: f64,
    num_stems: usize,
    width: Option<f64>,
    width_resolved: bool,
    contour_open: bool,
}

impl Evaluator<'_> {
    /// Runs one program. Returns true if `endchar` was executed.
    fn eval(
        &mut self,
        program: &[u8],
        sink: &mut impl CommandSink,
        depth: u32,
    ) -> Result<bool, ReadError> {
        if depth > NESTING_DEPTH_LIMIT {
            return Err(ReadError::MalformedData("subroutine calls nested too deep"));
        }
        let mut pos = 0usize;
        while pos < program.len() {
            let b0 = program[pos];
            pos += 1;
            match b0 {
                28 => {
                    let bytes = program
                        .get(pos..pos + 2)
                        .ok_or(ReadError::OutOfBounds)?;
                    self.push(i16::from_be_bytes([bytes[0], bytes[1]]) as f64)?;
                    pos += 2;
                }
                32..=246 => self.push(b0 as f64 - 139.0)?,
                247..=250 => {
                    let b1 = *program.get(pos).ok_or(ReadError::OutOfBounds)?;
                    pos += 1;
                    self.push(((b0 as i32 - 247) * 256 + b1 as i32 + 108) as f64)?;
                }
                251..=254 => {
                    let b1 = *program.get(pos).ok_or(ReadError::OutOfBounds)?;
                    pos += 1;
                    self.push((-(b0 as i32 - 251) * 256 - b1 as i32 - 108) as f64)?;
                }
                255 => {
                    let bytes = program
                        .get(pos..pos + 4)
                        .ok_or(ReadError::OutOfBounds)?;
                    let raw = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    self.push(raw as f64 / 65536.0)?;
                    pos += 4;
                }
                HSTEM | HSTEMHM => self.stem_hints(true, sink),
                VSTEM | VSTEMHM => self.stem_hints(false, sink),
                HINTMASK | CNTRMASK => {
                    // Leftover operands are an implied vstem list
                    self.stem_hints(false, sink);
                    let len = (self.num_stems + 7) / 8;
                    let mask = program
                        .get(pos..pos + len)
                        .ok_or(ReadError::OutOfBounds)?;
                    sink.hint_mask(mask);
                    pos += len;
                }
                RMOVETO => {
                    self.take_width(self.stack.len() > 2);
                    let [dx, dy] = self.args::<2>()?;
                    self.move_to(dx, dy, sink);
                }
                HMOVETO => {
                    self.take_width(self.stack.len() > 1);
                    let [dx] = self.args::<1>()?;
                    self.move_to(dx, 0.0, sink);
                }
                VMOVETO => {
                    self.take_width(self.stack.len() > 1);
                    let [dy] = self.args::<1>()?;
                    self.move_to(0.0, dy, sink);
                }
                RLINETO => {
                    self.require_args(2)?;
                    let stack = std::mem::take(&mut self.stack);
                    for pair in stack.chunks_exact(2) {
                        self.line_to(pair[0], pair[1], sink);
                    }
                }
                HLINETO | VLINETO => {
                    self.require_args(1)?;
                    let mut horizontal = b0 == HLINETO;
                    let stack = std::mem::take(&mut self.stack);
                    for delta in stack {
                        if horizontal {
                            self.line_to(delta, 0.0, sink);
                        } else {
                            self.line_to(0.0, delta, sink);
                        }
                        horizontal = !horizontal;
                    }
                }
                RRCURVETO => {
                    self.require_args(6)?;
                    let stack = std::mem::take(&mut self.stack);
                    for curve in stack.chunks_exact(6) {
                        self.rel_curve(curve.try_into().unwrap_or([0.0; 6]), sink);
                    }
                }
                RCURVELINE => {
                    self.require_args(8)?;
                    let stack = std::mem::take(&mut self.stack);
                    let (curves, line) = stack.split_at(stack.len() - 2);
                    for curve in curves.chunks_exact(6) {
                        self.rel_curve(curve.try_into().unwrap_or([0.0; 6]), sink);
                    }
                    self.line_to(line[0], line[1], sink);
                }
                RLINECURVE => {
                    self.require_args(8)?;
                    let stack = std::mem::take(&mut self.stack);
                    let (lines, curve) = stack.split_at(stack.len() - 6);
                    for pair in lines.chunks_exact(2) {
                        self.line_to(pair[0], pair[1], sink);
                    }
                    self.rel_curve(curve.try_into().unwrap_or([0.0; 6]), sink);
                }
                HHCURVETO | VVCURVETO => {
                    self.require_args(4)?;
                    let stack = std::mem::take(&mut self.stack);
                    let (mut cross, groups) = if stack.len() % 4 == 1 {
                        (stack[0], &stack[1..])
                    } else {
                        (0.0, &stack[..])
                    };
                    for group in groups.chunks_exact(4) {
                        let curve = if b0 == HHCURVETO {
                            [group[0], cross, group[1], group[2], group[3], 0.0]
                        } else {
                            [cross, group[0], group[1], group[2], 0.0, group[3]]
                        };
                        self.rel_curve(curve, sink);
                        cross = 0.0;
                    }
                }
                HVCURVETO | VHCURVETO => {
                    self.require_args(4)?;
                    let mut horizontal = b0 == HVCURVETO;
                    let stack = std::mem::take(&mut self.stack);
                    let mut rest = &stack[..];
                    while rest.len() >= 4 {
                        let trailing = if rest.len() == 5 { rest[4] } else { 0.0 };
                        let curve = if horizontal {
                            [rest[0], 0.0, rest[1], rest[2], trailing, rest[3]]
                        } else {
                            [0.0, rest[0], rest[1], rest[2], rest[3], trailing]
                        };
                        self.rel_curve(curve, sink);
                        horizontal = !horizontal;
                        rest = &rest[4..];
                    }
                }
                CALLSUBR | CALLGSUBR => {
                    let operand = self
                        .stack
                        .pop()
                        .ok_or(ReadError::MalformedData("charstring stack underflow"))?;
                    let subrs = if b0 == CALLSUBR {
                        self.local_subrs
                    } else {
                        self.global_subrs
                    };
                    let index = operand as i32 + subrs.subr_bias();
                    let index = usize::try_from(index)
                        .map_err(|_| ReadError::MalformedData("subroutine index out of range"))?;
                    let body = subrs.get(index)?;
                    if self.eval(body, sink, depth + 1)? {
                        return Ok(true);
                    }
                }
                RETURN => return Ok(false),
                ENDCHAR => {
                    self.take_width(self.stack.len() == 1 || self.stack.len() == 5);
                    if !self.stack.is_empty() {
                        return Err(ReadError::Unsupported("seac accent composition"));
                    }
                    if self.contour_open {
                        sink.close();
                        self.contour_open = false;
                    }
                    return Ok(true);
                }
                ESCAPE => {
                    let b1 = *program.get(pos).ok_or(ReadError::OutOfBounds)?;
                    pos += 1;
                    self.escaped_op(b1, sink)?;
                }
                _ => return Err(ReadError::MalformedData("reserved charstring operator")),
            }
        }
        Ok(false)
    }

    fn escaped_op(&mut self, b1: u8, sink: &mut impl CommandSink) -> Result<(), ReadError> {
        match b1 {
            FLEX => {
                let args = self.args::<13>()?;
                self.rel_curve([args[0], args[1], args[2], args[3], args[4], args[5]], sink);
                self.rel_curve([args[6], args[7], args[8], args[9], args[10], args[11]], sink);
            }
            HFLEX => {
                let [dx1, dx2, dy2, dx3, dx4, dx5, dx6] = self.args::<7>()?;
                let y0 = self.y;
                self.rel_curve([dx1, 0.0, dx2, dy2, dx3, 0.0], sink);
                let back = y0 - self.y;
                self.rel_curve([dx4, 0.0, dx5, back, dx6, 0.0], sink);
            }
            HFLEX1 => {
                let [dx1, dy1, dx2, dy2, dx3, dx4, dx5, dy5, dx6] = self.args::<9>()?;
                let y0 = self.y;
                self.rel_curve([dx1, dy1, dx2, dy2, dx3, 0.0], sink);
                let back = y0 - (self.y + dy5);
                self.rel_curve([dx4, 0.0, dx5, dy5, dx6, back], sink);
            }
            FLEX1 => {
                let [dx1, dy1, dx2, dy2, dx3, dy3, dx4, dy4, dx5, dy5, d6] =
                    self.args::<11>()?;
                let (x0, y0) = (self.x, self.y);
                let dx = dx1 + dx2 + dx3 + dx4 + dx5;
                let dy = dy1 + dy2 + dy3 + dy4 + dy5;
                self.rel_curve([dx1, dy1, dx2, dy2, dx3, dy3], sink);
                // The last point's missing coordinate returns to the start
                let (dx6, dy6) = if dx.abs() > dy.abs() {
                    (d6, y0 - (self.y + dy4 + dy5))
                } else {
                    (x0 - (self.x + dx4 + dx5), d6)
                };
                self.rel_curve([dx4, dy4, dx5, dy5, dx6, dy6], sink);
            }
            _ => return Err(ReadError::Unsupported("escaped charstring operator")),
        }
        Ok(())
    }

    fn push(&mut self, value: f64) -> Result<(), ReadError> {
        if self.stack.len() >= MAX_STACK {
            return Err(ReadError::MalformedData("charstring stack overflow"));
        }
        self.stack.push(value);
        Ok(())
    }

    /// Resolves the optional leading width operand on the first
    /// stack-clearing operator.
    fn take_width(&mut self, has_width: bool) {
        if self.width_resolved {
            return;
        }
        self.width_resolved = true;
        if has_width && !self.stack.is_empty() {
            self.width = Some(self.nominal_width + self.stack[0]);
            self.stack.remove(0);
        }
    }

    fn require_args(&mut self, n: usize) -> Result<(), ReadError> {
        self.take_width(false);
        if self.stack.len() < n {
            return Err(ReadError::MalformedData("charstring stack underflow"));
        }
        Ok(())
    }

    /// Pops exactly `N` arguments, clearing the stack.
    fn args<const N: usize>(&mut self) -> Result<[f64; N], ReadError> {
        if self.stack.len() < N {
            return Err(ReadError::MalformedData("charstring stack underflow"));
        }
        let mut out = [0.0; N];
        out.copy_from_slice(&self.stack[..N]);
        self.stack.clear();
        Ok(out)
    }

    fn stem_hints(&mut self, horizontal: bool, sink: &mut impl CommandSink) {
        self.take_width(self.stack.len() % 2 == 1);
        if self.stack.len() % 2 == 1 {
            // Odd leftover after width resolution; drop the stray operand
            self.stack.remove(0);
        }
        self.num_stems += self.stack.len() / 2;
        let mut edge = 0.0;
        for pair in self.stack.chunks_exact(2) {
            edge += pair[0];
            if horizontal {
                sink.hstem(edge, pair[1]);
            } else {
                sink.vstem(edge, pair[1]);
            }
            edge += pair[1];
        }
        self.stack.clear();
    }

    fn move_to(&mut self, dx: f64, dy: f64, sink: &mut impl CommandSink) {
        if self.contour_open {
            sink.close();
        }
        self.x += dx;
        self.y += dy;
        sink.move_to(self.x, self.y);
        self.contour_open = true;
    }

    fn line_to(&mut self, dx: f64, dy: f64, sink: &mut impl CommandSink) {
        self.x += dx;
        self.y += dy;
        sink.line_to(self.x, self.y);
    }

    /// Emits one cubic from six relative deltas
    /// `[dx1, dy1, dx2, dy2, dx3, dy3]`.
    fn rel_curve(&mut self, deltas: [f64; 6], sink: &mut impl CommandSink) {
        let cx0 = self.x + deltas[0];
        let cy0 = self.y + deltas[1];
        let cx1 = cx0 + deltas[2];
        let cy1 = cy0 + deltas[3];
        self.x = cx1 + deltas[4];
        self.y = cy1 + deltas[5];
        sink.curve_to(cx0, cy0, cx1, cy1, self.x, self.y);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::font_data::FontData;

    /// Records every command for assertions.
    #[derive(Default, Debug, PartialEq)]
    pub(crate) struct CaptureCommandSink {
        pub commands: Vec<String>,
    }

    impl CommandSink for CaptureCommandSink {
        fn hstem(&mut self, y: f64, dy: f64) {
            self.commands.push(format!("hstem {y} {dy}"));
        }
        fn vstem(&mut self, x: f64, dx: f64) {
            self.commands.push(format!("vstem {x} {dx}"));
        }
        fn hint_mask(&mut self, mask: &[u8]) {
            self.commands.push(format!("mask {mask:02X?}"));
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.commands.push(format!("m {x} {y}"));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.commands.push(format!("l {x} {y}"));
        }
        fn curve_to(&mut self, cx0: f64, cy0: f64, cx1: f64, cy1: f64, x: f64, y: f64) {
            self.commands
                .push(format!("c {cx0} {cy0} {cx1} {cy1} {x} {y}"));
        }
        fn close(&mut self) {
            self.commands.push("z".into());
        }
    }

    fn run_bare(program: &[u8]) -> (f64, Vec<String>) {
        let empty = Index::default();
        let mut sink = CaptureCommandSink::default();
        let width = run(program, &empty, &empty, 500.0, 100.0, &mut sink).unwrap();
        (width, sink.commands)
    }

    // Operand encodings: 139 is 0, 247/251 families are two-byte.
    fn num(value: i32) -> Vec<u8> {
        match value {
            -107..=107 => vec![(value + 139) as u8],
            108..=1131 => {
                let value = value - 108;
                vec![(value >> 8) as u8 + 247, value as u8]
            }
            -1131..=-108 => {
                let value = -value - 108;
                vec![(value >> 8) as u8 + 251, value as u8]
            }
            _ => {
                let mut out = vec![28];
                out.extend((value as i16).to_be_bytes());
                out
            }
        }
    }

    fn program(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn box_outline_with_default_width() {
        // rmoveto 10 10, hlineto 80, vlineto 80, hlineto -80, endchar
        let program = program(&[
            &num(10), &num(10), &[RMOVETO],
            &num(80), &[HLINETO],
            &num(80), &[VLINETO],
            &num(-80), &[HLINETO],
            &[ENDCHAR],
        ]);
        let (width, commands) = run_bare(&program);
        assert_eq!(width, 500.0);
        assert_eq!(
            commands,
            vec!["m 10 10", "l 90 10", "l 90 90", "l 10 90", "z"]
        );
    }

    #[test]
    fn leading_width_operand() {
        // Width delta 250 before the rmoveto args
        let program = program(&[&num(250), &num(0), &num(0), &[RMOVETO], &[ENDCHAR]]);
        let (width, commands) = run_bare(&program);
        assert_eq!(width, 350.0); // nominal 100 + 250
        assert_eq!(commands, vec!["m 0 0", "z"]);
    }

    #[test]
    fn width_on_vmoveto() {
        let program = program(&[&num(40), &num(5), &[VMOVETO], &[ENDCHAR]]);
        let (width, commands) = run_bare(&program);
        assert_eq!(width, 140.0);
        assert_eq!(commands, vec!["m 0 5", "z"]);
    }

    #[test]
    fn alternating_lines() {
        let program = program(&[
            &num(0), &num(0), &[RMOVETO],
            &num(10), &num(20), &num(30), &[HLINETO],
            &[ENDCHAR],
        ]);
        let (_, commands) = run_bare(&program);
        assert_eq!(
            commands,
            vec!["m 0 0", "l 10 0", "l 10 20", "l 40 20", "z"]
        );
    }

    #[test]
    fn rrcurveto_groups() {
        let program = program(&[
            &num(0), &num(0), &[RMOVETO],
            &num(10), &num(0), &num(10), &num(10), &num(0), &num(10),
            &num(-10), &num(0), &num(-10), &num(-10), &num(0), &num(-10),
            &[RRCURVETO],
            &[ENDCHAR],
        ]);
        let (_, commands) = run_bare(&program);
        assert_eq!(
            commands,
            vec![
                "m 0 0",
                "c 10 0 20 10 20 20",
                "c 10 20 0 10 0 0",
                "z"
            ]
        );
    }

    #[test]
    fn hhcurveto_with_leading_dy() {
        // Odd count: first operand bends the first control point
        let program = program(&[
            &num(0), &num(0), &[RMOVETO],
            &num(5), &num(10), &num(10), &num(10), &num(10), &[HHCURVETO],
            &[ENDCHAR],
        ]);
        let (_, commands) = run_bare(&program);
        assert_eq!(commands, vec!["m 0 0", "c 10 5 20 15 30 15", "z"]);
    }

    #[test]
    fn hvcurveto_alternates() {
        let program = program(&[
            &num(0), &num(0), &[RMOVETO],
            // horizontal start, then vertical, trailing fifth operand
            &num(10), &num(10), &num(10), &num(10),
            &num(10), &num(10), &num(10), &num(10), &num(3),
            &[HVCURVETO],
            &[ENDCHAR],
        ]);
        let (_, commands) = run_bare(&program);
        assert_eq!(
            commands,
            vec![
                "m 0 0",
                "c 10 0 20 10 20 20",
                "c 20 30 30 40 40 43",
                "z"
            ]
        );
    }

    #[test]
    fn stems_and_hintmask() {
        let program = program(&[
            &num(0), &num(20), &num(40), &num(20), &[HSTEM],
            &num(0), &num(20), &[HINTMASK], &[0b1100_0000],
            &num(0), &num(0), &[RMOVETO],
            &[ENDCHAR],
        ]);
        let (_, commands) = run_bare(&program);
        assert_eq!(
            commands,
            vec![
                "hstem 0 20",
                "hstem 60 20",
                "vstem 0 20",
                "mask [C0]",
                "m 0 0",
                "z"
            ]
        );
    }

    #[test]
    fn subroutine_call() {
        // One local subr drawing a line; bias for a small index is 107
        let subr = program(&[&num(50), &num(0), &[RLINETO], &[RETURN]]);
        let index_bytes = {
            let mut bytes = Vec::new();
            bytes.extend(1u16.to_be_bytes());
            bytes.push(1); // offSize
            bytes.push(1);
            bytes.push(1 + subr.len() as u8);
            bytes.extend(&subr);
            bytes
        };
        let data = FontData::new(&index_bytes);
        let mut cursor = data.cursor();
        let locals = Index::read(&mut cursor).unwrap();
        let globals = Index::default();
        let main = program(&[
            &num(0), &num(0), &[RMOVETO],
            &num(-107), &[CALLSUBR],
            &[ENDCHAR],
        ]);
        let mut sink = CaptureCommandSink::default();
        let width = run(&main, &globals, &locals, 500.0, 100.0, &mut sink).unwrap();
        assert_eq!(width, 500.0);
        assert_eq!(sink.commands, vec!["m 0 0", "l 50 0", "z"]);
    }

    #[test]
    fn sixteen_dot_sixteen_operand() {
        let mut program = vec![255, 0x00, 0x0A, 0x80, 0x00]; // 10.5
        program.extend(num(0));
        program.push(RMOVETO);
        program.push(ENDCHAR);
        let (_, commands) = run_bare(&program);
        assert_eq!(commands, vec!["m 10.5 0", "z"]);
    }

    #[test]
    fn missing_endchar() {
        let empty = Index::default();
        let mut sink = CaptureCommandSink::default();
        let program = program(&[&num(0), &num(0), &[RMOVETO]]);
        assert!(matches!(
            run(&program, &empty, &empty, 0.0, 0.0, &mut sink),
            Err(ReadError::MalformedData(_))
        ));
    }

    #[test]
    fn deep_recursion_is_rejected() {
        // A subr that calls itself forever
        let subr = program(&[&num(-107), &[CALLSUBR], &[RETURN]]);
        let mut index_bytes = Vec::new();
        index_bytes.extend(1u16.to_be_bytes());
        index_bytes.push(1);
        index_bytes.push(1);
        index_bytes.push(1 + subr.len() as u8);
        index_bytes.extend(&subr);
        let data = FontData::new(&index_bytes);
        let mut cursor = data.cursor();
        let locals = Index::read(&mut cursor).unwrap();
        let globals = Index::default();
        let main = program(&[&num(-107), &[CALLSUBR], &[ENDCHAR]]);
        let mut sink = CaptureCommandSink::default();
        assert!(run(&main, &globals, &locals, 0.0, 0.0, &mut sink).is_err());
    }
}
