//! Branches and jumps.

use super::{
    super::{code::opcode, error::HintErrorKind},
    Engine, OpResult,
};

impl<'a> Engine<'a> {
    /// IF: a false condition skips to the matching ELSE or EIF.
    pub(super) fn op_if(&mut self) -> OpResult {
        if self.value_stack.pop()? != 0 {
            return Ok(());
        }
        let mut depth = 1usize;
        loop {
            let ins = self.decoder.next_instruction()?;
            match ins.opcode {
                opcode::IF => depth += 1,
                opcode::ELSE if depth == 1 => return Ok(()),
                opcode::EIF => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// ELSE reached by execution means the true branch just finished;
    /// skip to the matching EIF.
    pub(super) fn op_else(&mut self) -> OpResult {
        let mut depth = 1usize;
        loop {
            let ins = self.decoder.next_instruction()?;
            match ins.opcode {
                opcode::IF => depth += 1,
                opcode::EIF => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    pub(super) fn op_jmpr(&mut self, pc: usize) -> OpResult {
        let offset = self.value_stack.pop()?;
        self.jump(pc, offset)
    }

    pub(super) fn op_jrot(&mut self, pc: usize) -> OpResult {
        let condition = self.value_stack.pop()?;
        let offset = self.value_stack.pop()?;
        if condition != 0 {
            self.jump(pc, offset)?;
        }
        Ok(())
    }

    pub(super) fn op_jrof(&mut self, pc: usize) -> OpResult {
        let condition = self.value_stack.pop()?;
        let offset = self.value_stack.pop()?;
        if condition == 0 {
            self.jump(pc, offset)?;
        }
        Ok(())
    }

    /// Relative jump from the opcode byte. A zero offset would loop on
    /// the jump itself; targets outside the current program or, inside
    /// a function, outside its body are rejected.
    fn jump(&mut self, pc: usize, offset: i32) -> OpResult {
        if offset == 0 {
            return Err(HintErrorKind::InvalidJump);
        }
        let target = pc as i64 + offset as i64;
        let (start, end) = self.jump_bounds();
        if target < start as i64 || target > end as i64 {
            return Err(HintErrorKind::InvalidJump);
        }
        self.decoder.pc = target as usize;
        Ok(())
    }
}
