//! Function and instruction definitions and calls.

use super::{
    super::{
        call_stack::CallRecord,
        code::{opcode, Decoder},
        definition::Definition,
        error::HintErrorKind,
        program::ProgramKind,
    },
    Engine, OpResult,
};

impl<'a> Engine<'a> {
    /// FDEF: records the body range and skips past the ENDF.
    pub(super) fn op_fdef(&mut self) -> OpResult {
        let index = self.value_stack.pop_usize()?;
        let definition = self.scan_definition()?;
        self.functions.set(index, definition)
    }

    /// IDEF: like FDEF but keyed by the opcode being defined.
    pub(super) fn op_idef(&mut self) -> OpResult {
        let index = self.value_stack.pop_usize()?;
        if index > 0xFF {
            return Err(HintErrorKind::InvalidStackValue(index as i32));
        }
        let definition = self.scan_definition()?;
        self.instruction_defs.set(index, definition)
    }

    /// ENDF: returns to the caller, or restarts the body for a pending
    /// LOOPCALL iteration.
    pub(super) fn op_endf(&mut self) -> OpResult {
        let record = self.call_stack.pop()?;
        if record.remaining > 1 {
            self.call_stack.push(CallRecord {
                remaining: record.remaining - 1,
                ..record
            })?;
            self.decoder.pc = record.definition.range().start;
        } else {
            self.program = record.caller_program;
            self.decoder = Decoder::new(self.programs.get(record.caller_program), record.return_pc);
        }
        Ok(())
    }

    pub(super) fn op_call(&mut self) -> OpResult {
        let index = self.value_stack.pop_usize()?;
        let definition = self.functions.get(index)?;
        self.call_definition(definition, 1)
    }

    pub(super) fn op_loopcall(&mut self) -> OpResult {
        let index = self.value_stack.pop_usize()?;
        let count = self.value_stack.pop()?;
        if count <= 0 {
            return Ok(());
        }
        let definition = self.functions.get(index)?;
        self.call_definition(definition, count as u32)
    }

    /// Reserved opcodes dispatch through IDEF when one is registered.
    pub(super) fn op_unknown(&mut self, op: u8) -> OpResult {
        match self.instruction_defs.get(op as usize) {
            Ok(definition) => self.call_definition(definition, 1),
            Err(_) => Err(HintErrorKind::UnhandledOpcode(op)),
        }
    }

    fn call_definition(&mut self, definition: Definition, count: u32) -> OpResult {
        self.call_stack.push(CallRecord {
            caller_program: self.program,
            return_pc: self.decoder.pc,
            remaining: count,
            definition,
        })?;
        self.program = definition.program;
        self.decoder = Decoder::new(
            self.programs.get(definition.program),
            definition.range().start,
        );
        Ok(())
    }

    /// Scans from the current pc to the matching ENDF. Definitions may
    /// not nest and may not appear in glyph programs.
    fn scan_definition(&mut self) -> Result<Definition, HintErrorKind> {
        if self.program == ProgramKind::Glyph {
            return Err(HintErrorKind::DefinitionInGlyphProgram);
        }
        let start = self.decoder.pc;
        loop {
            let ins = self.decoder.next_instruction()?;
            match ins.opcode {
                opcode::FDEF | opcode::IDEF => return Err(HintErrorKind::NestedDefinition),
                // The body range includes the ENDF so it executes
                // within its own jump bounds
                opcode::ENDF => return Ok(Definition::new(self.program, start..self.decoder.pc)),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        super::program::{ProgramKind, Programs},
        EngineLimits,
    };
    use super::*;

    fn engine_with(programs: Programs) -> Engine {
        Engine::new(
            programs,
            Vec::new(),
            EngineLimits {
                stack: 32,
                storage: 0,
                functions: 8,
                twilight_points: 0,
            },
        )
    }

    #[test]
    fn define_and_call_function() {
        // Function 0 doubles the top of the stack
        let font = [
            0xB0, 0, 0x2C, // PUSHB 0, FDEF
            0x20, 0x60, // DUP, ADD
            0x2D, // ENDF
            0xB1, 21, 0, // PUSHB[001] 21 0
            0x2B, // CALL
        ];
        let programs = Programs {
            font: &font,
            control_value: &[],
            glyph: &[],
        };
        let mut engine = engine_with(programs);
        engine.run_program(ProgramKind::Font, None).unwrap();
        assert_eq!(engine.pop(), 42);
    }

    #[test]
    fn loopcall_repeats_body() {
        // Function 1 adds 1; LOOPCALL runs it five times
        let font = [
            0xB0, 1, 0x2C, // PUSHB 1, FDEF
            0xB0, 1, 0x60, // PUSHB 1, ADD
            0x2D, // ENDF
            0xB2, 0, 5, 1, // PUSHB[010] 0 5 1
            0x2A, // LOOPCALL
        ];
        let programs = Programs {
            font: &font,
            control_value: &[],
            glyph: &[],
        };
        let mut engine = engine_with(programs);
        engine.run_program(ProgramKind::Font, None).unwrap();
        assert_eq!(engine.pop(), 5);
    }

    #[test]
    fn functions_survive_into_later_programs() {
        let font = [0xB0, 0, 0x2C, 0xB0, 9, 0x2D]; // fn 0 pushes 9
        let prep = [0xB0, 0, 0x2B]; // CALL 0
        let programs = Programs {
            font: &font,
            control_value: &prep,
            glyph: &[],
        };
        let mut engine = engine_with(programs);
        engine.run_program(ProgramKind::Font, None).unwrap();
        engine.run_program(ProgramKind::ControlValue, None).unwrap();
        assert_eq!(engine.pop(), 9);
    }

    #[test]
    fn definition_rejected_in_glyph_program() {
        let glyph = [0xB0, 0, 0x2C, 0x2D];
        let programs = Programs {
            font: &[],
            control_value: &[],
            glyph: &glyph,
        };
        let mut engine = engine_with(programs);
        let error = engine.run_program(ProgramKind::Glyph, None).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::DefinitionInGlyphProgram);
    }

    #[test]
    fn nested_definition_rejected() {
        let font = [0xB0, 0, 0x2C, 0xB0, 1, 0x2C, 0x2D, 0x2D];
        let programs = Programs {
            font: &font,
            control_value: &[],
            glyph: &[],
        };
        let mut engine = engine_with(programs);
        let error = engine.run_program(ProgramKind::Font, None).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::NestedDefinition);
    }

    #[test]
    fn idef_handles_reserved_opcode() {
        // Define opcode 0x28 to push 64
        let font = [0xB0, 0x28, 0x89, 0xB0, 64, 0x2D];
        let prep = [0x28];
        let programs = Programs {
            font: &font,
            control_value: &prep,
            glyph: &[],
        };
        let mut engine = engine_with(programs);
        engine.run_program(ProgramKind::Font, None).unwrap();
        engine.run_program(ProgramKind::ControlValue, None).unwrap();
        assert_eq!(engine.pop(), 64);
    }

    #[test]
    fn call_to_undefined_function_fails() {
        let font = [0xB0, 3, 0x2B];
        let programs = Programs {
            font: &font,
            control_value: &[],
            glyph: &[],
        };
        let mut engine = engine_with(programs);
        let error = engine.run_program(ProgramKind::Font, None).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::InvalidDefinitionIndex(3));
    }

    #[test]
    fn truncated_function_body_fails() {
        let font = [0xB0, 0, 0x2C, 0x20];
        let programs = Programs {
            font: &font,
            control_value: &[],
            glyph: &[],
        };
        let mut engine = engine_with(programs);
        let error = engine.run_program(ProgramKind::Font, None).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::UnexpectedEndOfBytecode);
    }
}
