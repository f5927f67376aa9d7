//! Arithmetic on 26.6 stack values.

use super::{
    super::{error::HintErrorKind, math},
    Engine, OpResult,
};

impl<'a> Engine<'a> {
    pub(super) fn op_add(&mut self) -> OpResult {
        self.value_stack
            .apply_binary(|a, b| Ok(a.wrapping_add(b)))
    }

    pub(super) fn op_sub(&mut self) -> OpResult {
        self.value_stack
            .apply_binary(|a, b| Ok(a.wrapping_sub(b)))
    }

    /// 26.6 division, truncating like the reference rasterizer.
    pub(super) fn op_div(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| {
            if b == 0 {
                return Err(HintErrorKind::DivideByZero);
            }
            Ok((a as i64 * 64 / b as i64) as i32)
        })
    }

    pub(super) fn op_mul(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok(math::mul(a, b)))
    }

    pub(super) fn op_abs(&mut self) -> OpResult {
        self.value_stack
            .apply_unary(|a| Ok(a.wrapping_abs()))
    }

    pub(super) fn op_neg(&mut self) -> OpResult {
        self.value_stack.apply_unary(|a| Ok(a.wrapping_neg()))
    }

    pub(super) fn op_floor(&mut self) -> OpResult {
        self.value_stack.apply_unary(|a| Ok(math::floor(a)))
    }

    pub(super) fn op_ceiling(&mut self) -> OpResult {
        self.value_stack.apply_unary(|a| Ok(math::ceil(a)))
    }

    pub(super) fn op_max(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok(a.max(b)))
    }

    pub(super) fn op_min(&mut self) -> OpResult {
        self.value_stack.apply_binary(|a, b| Ok(a.min(b)))
    }

    /// ROUND: applies the current round state. Engine compensation for
    /// the distance type bits is not modeled.
    pub(super) fn op_round(&mut self) -> OpResult {
        let round_state = self.graphics.round_state;
        self.value_stack.apply_unary(|a| Ok(round_state.round(a)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::test_engine;
    use super::*;

    #[test]
    fn binary_operand_order() {
        let mut engine = test_engine();
        engine.push_all(&[100, 30]);
        engine.op_sub().unwrap();
        assert_eq!(engine.pop(), 70);
        engine.push_all(&[128, 256]);
        engine.op_div().unwrap();
        // 2px / 4px = 0.5
        assert_eq!(engine.pop(), 32);
    }

    #[test]
    fn division_truncates_toward_zero() {
        let mut engine = test_engine();
        engine.push_all(&[-3, 2]);
        engine.op_div().unwrap();
        assert_eq!(engine.pop(), -96);
        engine.push_all(&[1, 3]);
        engine.op_div().unwrap();
        assert_eq!(engine.pop(), 21);
        engine.push_all(&[5, 0]);
        assert_eq!(engine.op_div(), Err(HintErrorKind::DivideByZero));
    }

    #[test]
    fn rounding_uses_round_state() {
        let mut engine = test_engine();
        engine.push_all(&[95]);
        engine.op_round().unwrap();
        assert_eq!(engine.pop(), 64);
    }

    #[test]
    fn grid_ops() {
        let mut engine = test_engine();
        engine.push_all(&[-65]);
        engine.op_floor().unwrap();
        assert_eq!(engine.pop(), -128);
        engine.push_all(&[-65]);
        engine.op_ceiling().unwrap();
        assert_eq!(engine.pop(), -64);
        engine.push_all(&[-65]);
        engine.op_abs().unwrap();
        assert_eq!(engine.pop(), 65);
    }
}
