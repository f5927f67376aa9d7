//! Function and instruction definitions.

use core::ops::Range;

use super::{error::HintErrorKind, program::ProgramKind};

/// The byte range of an FDEF or IDEF body within its source program.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Definition {
    pub program: ProgramKind,
    start: u32,
    end: u32,
    active: bool,
}

impl Definition {
    pub fn new(program: ProgramKind, range: Range<usize>) -> Self {
        Definition {
            program,
            start: range.start as u32,
            end: range.end as u32,
            active: true,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Definitions indexed by function number or, for IDEF, by opcode.
pub struct DefinitionMap {
    entries: Vec<Definition>,
}

impl DefinitionMap {
    pub fn new(limit: usize) -> Self {
        DefinitionMap {
            entries: vec![Definition::default(); limit],
        }
    }

    pub fn get(&self, index: usize) -> Result<Definition, HintErrorKind> {
        let entry = self
            .entries
            .get(index)
            .copied()
            .ok_or(HintErrorKind::InvalidDefinitionIndex(index))?;
        if !entry.is_active() {
            return Err(HintErrorKind::InvalidDefinitionIndex(index));
        }
        Ok(entry)
    }

    pub fn set(&mut self, index: usize, value: Definition) -> Result<(), HintErrorKind> {
        *self
            .entries
            .get_mut(index)
            .ok_or(HintErrorKind::InvalidDefinitionIndex(index))? = value;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.entries.fill(Definition::default());
    }
}
