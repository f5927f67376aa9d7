//! Control value table instructions.

use super::{Engine, OpResult};

impl<'a> Engine<'a> {
    pub(super) fn op_rcvt(&mut self) -> OpResult {
        let index = self.value_stack.pop_usize()?;
        let value = self.cvt_get(index)?;
        self.value_stack.push(value)
    }

    /// WCVTP: write a value already in pixels.
    pub(super) fn op_wcvtp(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let index = self.value_stack.pop_usize()?;
        self.cvt_set(index, value)
    }

    /// WCVTF: write a value given in font units.
    pub(super) fn op_wcvtf(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let index = self.value_stack.pop_usize()?;
        let scaled = self.scale_units(value);
        self.cvt_set(index, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{super::error::HintErrorKind, mock::test_engine};

    #[test]
    fn pixel_write_and_read() {
        let mut engine = test_engine();
        engine.push_all(&[2, 80]);
        engine.op_wcvtp().unwrap();
        engine.push_all(&[2]);
        engine.op_rcvt().unwrap();
        assert_eq!(engine.pop(), 80);
    }

    #[test]
    fn font_unit_write_scales() {
        let mut engine = test_engine();
        // Identity scale in the test engine: one font unit is one 26.6
        // pixel step
        engine.push_all(&[1, 100]);
        engine.op_wcvtf().unwrap();
        engine.push_all(&[1]);
        engine.op_rcvt().unwrap();
        assert_eq!(engine.pop(), 100);
    }

    #[test]
    fn bounds() {
        let mut engine = test_engine();
        engine.push_all(&[64]);
        assert_eq!(engine.op_rcvt(), Err(HintErrorKind::InvalidCvtIndex(64)));
    }
}
