//! Storage area instructions.

use super::{Engine, OpResult};

impl<'a> Engine<'a> {
    pub(super) fn op_rs(&mut self) -> OpResult {
        let index = self.value_stack.pop_usize()?;
        let value = self.storage.read(index)?;
        self.value_stack.push(value)
    }

    pub(super) fn op_ws(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        let index = self.value_stack.pop_usize()?;
        self.storage.write(index, value)
    }
}
