//! Instruction decoding and dispatch.

use super::{
    super::code::{opcode::*, Instruction},
    Engine, HintError, HintErrorKind,
};

/// Upper bound on instructions executed per program, ensuring broken
/// fonts terminate. Matches FreeType's default.
const MAX_RUN_INSTRUCTIONS: usize = 1_000_000;

impl<'a> Engine<'a> {
    /// Executes the current program to completion.
    pub(super) fn run(&mut self) -> Result<(), HintError> {
        let mut count = 0usize;
        loop {
            let Some(next) = self.decoder.maybe_next() else {
                // Running off the end of a function body is an error;
                // off the end of the program is completion.
                if self.call_stack.is_empty() {
                    return Ok(());
                }
                return Err(self.error_at(
                    self.decoder.pc,
                    None,
                    HintErrorKind::UnexpectedEndOfBytecode,
                ));
            };
            let ins = next.map_err(|kind| self.error_at(self.decoder.pc, None, kind))?;
            self.dispatch(&ins)
                .map_err(|kind| self.error_at(ins.pc, Some(ins.opcode), kind))?;
            count += 1;
            if count > MAX_RUN_INSTRUCTIONS {
                return Err(self.error_at(
                    ins.pc,
                    Some(ins.opcode),
                    HintErrorKind::ExceededExecutionBudget,
                ));
            }
        }
    }

    fn error_at(&self, pc: usize, opcode: Option<u8>, kind: HintErrorKind) -> HintError {
        HintError {
            program: self.program,
            glyph_id: self.glyph_id,
            pc,
            opcode,
            kind,
        }
    }

    fn dispatch(&mut self, ins: &Instruction) -> Result<(), HintErrorKind> {
        let opcode = ins.opcode;
        match opcode {
            SVTCA0..=0x05 => self.op_svtca(opcode),
            SPVTL0..=0x09 => self.op_svtl(opcode),
            SPVFS => self.op_spvfs(),
            SFVFS => self.op_sfvfs(),
            GPV => self.op_gpv(),
            GFV => self.op_gfv(),
            SFVTPV => self.op_sfvtpv(),
            SRP0 => self.op_srp0(),
            SRP1 => self.op_srp1(),
            SRP2 => self.op_srp2(),
            SZP0 => self.op_szp0(),
            SZP1 => self.op_szp1(),
            SZP2 => self.op_szp2(),
            SZPS => self.op_szps(),
            SLOOP => self.op_sloop(),
            RTG | RTHG | RTDG | RUTG | RDTG | ROFF => self.op_round_mode(opcode),
            SMD => self.op_smd(),
            ELSE => self.op_else(),
            JMPR => self.op_jmpr(ins.pc),
            SCVTCI => self.op_scvtci(),
            SSWCI => self.op_sswci(),
            SSW => self.op_ssw(),
            DUP => self.value_stack.dup(),
            POP => self.value_stack.pop().map(|_| ()),
            CLEAR => {
                self.value_stack.clear();
                Ok(())
            }
            SWAP => self.value_stack.swap(),
            DEPTH => self.op_depth(),
            CINDEX => self.op_cindex(),
            MINDEX => self.op_mindex(),
            ALIGNPTS => self.op_alignpts(),
            UTP => self.op_utp(),
            LOOPCALL => self.op_loopcall(),
            CALL => self.op_call(),
            FDEF => self.op_fdef(),
            ENDF => self.op_endf(),
            MDAP0 | MDAP1 => self.op_mdap(opcode),
            IUP0 | IUP1 => self.op_iup(opcode),
            SHP0..=0x33 => self.op_shp(opcode),
            SHC0..=0x35 => self.op_shc(opcode),
            SHZ0..=0x37 => self.op_shz(opcode),
            SHPIX => self.op_shpix(),
            IP => self.op_ip(),
            MSIRP0 | MSIRP1 => self.op_msirp(opcode),
            ALIGNRP => self.op_alignrp(),
            MIAP0 | MIAP1 => self.op_miap(opcode),
            NPUSHB | NPUSHW => self.op_push(ins),
            WS => self.op_ws(),
            RS => self.op_rs(),
            WCVTP => self.op_wcvtp(),
            RCVT => self.op_rcvt(),
            GC0 | GC1 => self.op_gc(opcode),
            SCFS => self.op_scfs(),
            MD0 | MD1 => self.op_md(opcode),
            MPPEM => self.op_mppem(),
            MPS => self.op_mps(),
            FLIPON => self.op_flipon(),
            FLIPOFF => self.op_flipoff(),
            // Pops and discards its argument outside a debugger
            DEBUG => self.value_stack.pop().map(|_| ()),
            LT..=EVEN => self.op_compare(opcode),
            IF => self.op_if(),
            EIF => Ok(()),
            AND => self.op_and(),
            OR => self.op_or(),
            NOT => self.op_not(),
            SDB => self.op_sdb(),
            SDS => self.op_sds(),
            ADD => self.op_add(),
            SUB => self.op_sub(),
            DIV => self.op_div(),
            MUL => self.op_mul(),
            ABS => self.op_abs(),
            NEG => self.op_neg(),
            FLOOR => self.op_floor(),
            CEILING => self.op_ceiling(),
            ROUND0..=ROUND3 => self.op_round(),
            // No-round still pops and pushes the value unchanged
            NROUND0..=NROUND3 => Ok(()),
            WCVTF => self.op_wcvtf(),
            SROUND => self.op_sround(),
            S45ROUND => self.op_s45round(),
            JROT => self.op_jrot(ins.pc),
            JROF => self.op_jrof(ins.pc),
            // Deprecated; pops one argument
            SANGW | AA => self.value_stack.pop().map(|_| ()),
            SCANCTRL => self.op_scanctrl(),
            SDPVTL0 | SDPVTL1 => self.op_sdpvtl(opcode),
            GETINFO => self.op_getinfo(),
            IDEF => self.op_idef(),
            ROLL => self.value_stack.roll(),
            MAX => self.op_max(),
            MIN => self.op_min(),
            SCANTYPE => self.op_scantype(),
            INSTCTRL => self.op_instctrl(),
            PUSHB0..=PUSHW7 => self.op_push(ins),
            MDRP_BASE..=0xDF => self.op_mdrp(opcode),
            MIRP_BASE..=0xFF => self.op_mirp(opcode),
            _ => self.op_unknown(opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        super::{
            error::HintErrorKind,
            program::{ProgramKind, Programs},
        },
        EngineLimits,
    };
    use super::*;

    fn engine_for(bytecode: &[u8]) -> Engine {
        let programs = Programs {
            font: bytecode,
            control_value: &[],
            glyph: &[],
        };
        Engine::new(
            programs,
            vec![0; 4],
            EngineLimits {
                stack: 32,
                storage: 4,
                functions: 4,
                twilight_points: 0,
            },
        )
    }

    #[test]
    fn runs_a_straight_line_program() {
        // PUSHW[001] 192 256, ADD, DUP, MUL: (3px + 4px) squared
        let bytecode = [0xB9, 0, 192, 1, 0, 0x60, 0x20, 0x63];
        let mut engine = engine_for(&bytecode);
        engine.run_program(ProgramKind::Font, None).unwrap();
        assert_eq!(engine.pop(), 49 * 64);
    }

    #[test]
    fn reports_error_location() {
        // PUSHB[000] 1, DIV with one operand missing
        let bytecode = [0xB0, 1, 0x62];
        let mut engine = engine_for(&bytecode);
        let error = engine.run_program(ProgramKind::Font, None).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::ValueStackUnderflow);
        assert_eq!(error.pc, 2);
        assert_eq!(error.opcode, Some(0x62));
        assert_eq!(error.program, ProgramKind::Font);
    }

    #[test]
    fn reserved_opcode_is_unhandled() {
        let bytecode = [0x28];
        let mut engine = engine_for(&bytecode);
        let error = engine.run_program(ProgramKind::Font, None).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::UnhandledOpcode(0x28));
    }

    #[test]
    fn infinite_loop_hits_budget() {
        // PUSHW[000] -3, JMPR: jumps back to the push forever
        let bytecode = [0xB8, 0xFF, 0xFD, 0x1C];
        let mut engine = engine_for(&bytecode);
        let error = engine.run_program(ProgramKind::Font, None).unwrap_err();
        assert_eq!(error.kind, HintErrorKind::ExceededExecutionBudget);
    }
}
