//! Stack manipulation instructions.

use super::{
    super::code::Instruction,
    Engine, OpResult,
};

impl<'a> Engine<'a> {
    /// NPUSHB, NPUSHW, PUSHB, PUSHW: push the inline operands.
    pub(super) fn op_push(&mut self, ins: &Instruction) -> OpResult {
        for value in ins.operands.values() {
            self.value_stack.push(value)?;
        }
        Ok(())
    }

    pub(super) fn op_depth(&mut self) -> OpResult {
        let depth = self.value_stack.len() as i32;
        self.value_stack.push(depth)
    }

    pub(super) fn op_cindex(&mut self) -> OpResult {
        let n = self.value_stack.pop()?;
        self.value_stack.copy_index(n)
    }

    pub(super) fn op_mindex(&mut self) -> OpResult {
        let n = self.value_stack.pop()?;
        self.value_stack.move_index(n)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{super::code::disassemble, mock::test_engine};

    #[test]
    fn push_variants() {
        let mut engine = test_engine();
        // NPUSHW 300 -300, PUSHB[000] 7
        let bytecode = [0x41, 2, 0x01, 0x2C, 0xFE, 0xD4, 0xB0, 7];
        for ins in disassemble(&bytecode) {
            engine.op_push(&ins).unwrap();
        }
        assert_eq!(engine.pop(), 7);
        assert_eq!(engine.pop(), -300);
        assert_eq!(engine.pop(), 300);
    }

    #[test]
    fn depth_and_cindex() {
        let mut engine = test_engine();
        engine.push_all(&[10, 20, 30]);
        engine.op_depth().unwrap();
        assert_eq!(engine.pop(), 3);
        engine.push_all(&[3]);
        engine.op_cindex().unwrap();
        assert_eq!(engine.pop(), 10);
    }
}
