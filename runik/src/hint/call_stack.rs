//! The interpreter's call stack.

use super::{definition::Definition, error::HintErrorKind, program::ProgramKind};

/// Matches the FreeType limit; deeper nesting is a broken font.
const MAX_DEPTH: usize = 32;

/// One activation record for CALL or LOOPCALL.
#[derive(Copy, Clone, Debug)]
pub struct CallRecord {
    pub caller_program: ProgramKind,
    pub return_pc: usize,
    /// Remaining iterations for LOOPCALL (1 for CALL).
    pub remaining: u32,
    pub definition: Definition,
}

/// Fixed-depth stack of activation records.
#[derive(Default)]
pub struct CallStack {
    records: Vec<CallRecord>,
}

impl CallStack {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: CallRecord) -> Result<(), HintErrorKind> {
        if self.records.len() >= MAX_DEPTH {
            return Err(HintErrorKind::CallStackOverflow);
        }
        self.records.push(record);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<CallRecord, HintErrorKind> {
        self.records.pop().ok_or(HintErrorKind::CallStackUnderflow)
    }

    pub fn peek(&self) -> Option<&CallRecord> {
        self.records.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut CallRecord> {
        self.records.last_mut()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_limit() {
        let record = CallRecord {
            caller_program: ProgramKind::Font,
            return_pc: 0,
            remaining: 1,
            definition: Definition::default(),
        };
        let mut stack = CallStack::default();
        for _ in 0..MAX_DEPTH {
            stack.push(record).unwrap();
        }
        assert_eq!(stack.push(record), Err(HintErrorKind::CallStackOverflow));
        for _ in 0..MAX_DEPTH {
            stack.pop().unwrap();
        }
        assert_eq!(
            stack.pop().map(|_| ()),
            Err(HintErrorKind::CallStackUnderflow)
        );
    }
}
