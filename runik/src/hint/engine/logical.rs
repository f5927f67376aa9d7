//! Comparison and boolean instructions.

use super::{
    super::{code::opcode, math},
    Engine, OpResult,
};

impl<'a> Engine<'a> {
    /// LT through EVEN: pops operands and pushes 1 or 0.
    pub(super) fn op_compare(&mut self, op: u8) -> OpResult {
        use opcode::*;
        match op {
            LT => self.value_stack.apply_binary(|a, b| Ok((a < b) as i32)),
            LTEQ => self.value_stack.apply_binary(|a, b| Ok((a <= b) as i32)),
            GT => self.value_stack.apply_binary(|a, b| Ok((a > b) as i32)),
            GTEQ => self.value_stack.apply_binary(|a, b| Ok((a >= b) as i32)),
            EQ => self.value_stack.apply_binary(|a, b| Ok((a == b) as i32)),
            NEQ => self.value_stack.apply_binary(|a, b| Ok((a != b) as i32)),
            // Parity of the value after rounding to the pixel grid
            ODD => {
                let round_state = self.graphics.round_state;
                self.value_stack
                    .apply_unary(|a| Ok((math::floor(round_state.round(a)) >> 6) & 1))
            }
            _ => {
                let round_state = self.graphics.round_state;
                self.value_stack
                    .apply_unary(|a| Ok(((math::floor(round_state.round(a)) >> 6) & 1) ^ 1))
            }
        }
    }

    pub(super) fn op_and(&mut self) -> OpResult {
        self.value_stack
            .apply_binary(|a, b| Ok((a != 0 && b != 0) as i32))
    }

    pub(super) fn op_or(&mut self) -> OpResult {
        self.value_stack
            .apply_binary(|a, b| Ok((a != 0 || b != 0) as i32))
    }

    pub(super) fn op_not(&mut self) -> OpResult {
        self.value_stack.apply_unary(|a| Ok((a == 0) as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::test_engine;
    use super::opcode::*;

    #[test]
    fn comparisons() {
        let mut engine = test_engine();
        for (op, a, b, expected) in [
            (LT, 1, 2, 1),
            (LT, 2, 2, 0),
            (LTEQ, 2, 2, 1),
            (GT, 3, 2, 1),
            (GTEQ, 2, 3, 0),
            (EQ, 7, 7, 1),
            (NEQ, 7, 7, 0),
        ] {
            engine.push_all(&[a, b]);
            engine.op_compare(op).unwrap();
            assert_eq!(engine.pop(), expected, "op 0x{op:02X} {a} {b}");
        }
    }

    #[test]
    fn parity_rounds_first() {
        let mut engine = test_engine();
        // 1.5px rounds to 2px: even
        engine.push_all(&[96]);
        engine.op_compare(ODD).unwrap();
        assert_eq!(engine.pop(), 0);
        // 0.75px rounds to 1px: odd
        engine.push_all(&[48]);
        engine.op_compare(ODD).unwrap();
        assert_eq!(engine.pop(), 1);
        engine.push_all(&[48]);
        engine.op_compare(EVEN).unwrap();
        assert_eq!(engine.pop(), 0);
    }

    #[test]
    fn boolean_ops() {
        let mut engine = test_engine();
        engine.push_all(&[5, 0]);
        engine.op_and().unwrap();
        assert_eq!(engine.pop(), 0);
        engine.push_all(&[5, 0]);
        engine.op_or().unwrap();
        assert_eq!(engine.pop(), 1);
        engine.push_all(&[0]);
        engine.op_not().unwrap();
        assert_eq!(engine.pop(), 1);
    }
}
