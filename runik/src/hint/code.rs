//! TrueType bytecode decoding and disassembly.

use super::error::HintErrorKind;

/// Raw instruction opcodes.
///
/// Opcodes with variant bits are named by their base value; the variants
/// occupy the following byte values.
pub mod opcode {
    pub const SVTCA0: u8 = 0x00;
    pub const SVTCA1: u8 = 0x01;
    pub const SPVTCA0: u8 = 0x02;
    pub const SFVTCA0: u8 = 0x04;
    pub const SPVTL0: u8 = 0x06;
    pub const SFVTL0: u8 = 0x08;
    pub const SPVFS: u8 = 0x0A;
    pub const SFVFS: u8 = 0x0B;
    pub const GPV: u8 = 0x0C;
    pub const GFV: u8 = 0x0D;
    pub const SFVTPV: u8 = 0x0E;
    pub const ISECT: u8 = 0x0F;
    pub const SRP0: u8 = 0x10;
    pub const SRP1: u8 = 0x11;
    pub const SRP2: u8 = 0x12;
    pub const SZP0: u8 = 0x13;
    pub const SZP1: u8 = 0x14;
    pub const SZP2: u8 = 0x15;
    pub const SZPS: u8 = 0x16;
    pub const SLOOP: u8 = 0x17;
    pub const RTG: u8 = 0x18;
    pub const RTHG: u8 = 0x19;
    pub const SMD: u8 = 0x1A;
    pub const ELSE: u8 = 0x1B;
    pub const JMPR: u8 = 0x1C;
    pub const SCVTCI: u8 = 0x1D;
    pub const SSWCI: u8 = 0x1E;
    pub const SSW: u8 = 0x1F;
    pub const DUP: u8 = 0x20;
    pub const POP: u8 = 0x21;
    pub const CLEAR: u8 = 0x22;
    pub const SWAP: u8 = 0x23;
    pub const DEPTH: u8 = 0x24;
    pub const CINDEX: u8 = 0x25;
    pub const MINDEX: u8 = 0x26;
    pub const ALIGNPTS: u8 = 0x27;
    pub const UTP: u8 = 0x29;
    pub const LOOPCALL: u8 = 0x2A;
    pub const CALL: u8 = 0x2B;
    pub const FDEF: u8 = 0x2C;
    pub const ENDF: u8 = 0x2D;
    pub const MDAP0: u8 = 0x2E;
    pub const MDAP1: u8 = 0x2F;
    pub const IUP0: u8 = 0x30;
    pub const IUP1: u8 = 0x31;
    pub const SHP0: u8 = 0x32;
    pub const SHC0: u8 = 0x34;
    pub const SHZ0: u8 = 0x36;
    pub const SHPIX: u8 = 0x38;
    pub const IP: u8 = 0x39;
    pub const MSIRP0: u8 = 0x3A;
    pub const MSIRP1: u8 = 0x3B;
    pub const ALIGNRP: u8 = 0x3C;
    pub const RTDG: u8 = 0x3D;
    pub const MIAP0: u8 = 0x3E;
    pub const MIAP1: u8 = 0x3F;
    pub const NPUSHB: u8 = 0x40;
    pub const NPUSHW: u8 = 0x41;
    pub const WS: u8 = 0x42;
    pub const RS: u8 = 0x43;
    pub const WCVTP: u8 = 0x44;
    pub const RCVT: u8 = 0x45;
    pub const GC0: u8 = 0x46;
    pub const GC1: u8 = 0x47;
    pub const SCFS: u8 = 0x48;
    pub const MD0: u8 = 0x49;
    pub const MD1: u8 = 0x4A;
    pub const MPPEM: u8 = 0x4B;
    pub const MPS: u8 = 0x4C;
    pub const FLIPON: u8 = 0x4D;
    pub const FLIPOFF: u8 = 0x4E;
    pub const DEBUG: u8 = 0x4F;
    pub const LT: u8 = 0x50;
    pub const LTEQ: u8 = 0x51;
    pub const GT: u8 = 0x52;
    pub const GTEQ: u8 = 0x53;
    pub const EQ: u8 = 0x54;
    pub const NEQ: u8 = 0x55;
    pub const ODD: u8 = 0x56;
    pub const EVEN: u8 = 0x57;
    pub const IF: u8 = 0x58;
    pub const EIF: u8 = 0x59;
    pub const AND: u8 = 0x5A;
    pub const OR: u8 = 0x5B;
    pub const NOT: u8 = 0x5C;
    pub const DELTAP1: u8 = 0x5D;
    pub const SDB: u8 = 0x5E;
    pub const SDS: u8 = 0x5F;
    pub const ADD: u8 = 0x60;
    pub const SUB: u8 = 0x61;
    pub const DIV: u8 = 0x62;
    pub const MUL: u8 = 0x63;
    pub const ABS: u8 = 0x64;
    pub const NEG: u8 = 0x65;
    pub const FLOOR: u8 = 0x66;
    pub const CEILING: u8 = 0x67;
    pub const ROUND0: u8 = 0x68;
    pub const ROUND3: u8 = 0x6B;
    pub const NROUND0: u8 = 0x6C;
    pub const NROUND3: u8 = 0x6F;
    pub const WCVTF: u8 = 0x70;
    pub const DELTAP2: u8 = 0x71;
    pub const DELTAP3: u8 = 0x72;
    pub const DELTAC1: u8 = 0x73;
    pub const DELTAC3: u8 = 0x75;
    pub const SROUND: u8 = 0x76;
    pub const S45ROUND: u8 = 0x77;
    pub const JROT: u8 = 0x78;
    pub const JROF: u8 = 0x79;
    pub const ROFF: u8 = 0x7A;
    pub const RUTG: u8 = 0x7C;
    pub const RDTG: u8 = 0x7D;
    pub const SANGW: u8 = 0x7E;
    pub const AA: u8 = 0x7F;
    pub const FLIPPT: u8 = 0x80;
    pub const FLIPRGON: u8 = 0x81;
    pub const FLIPRGOFF: u8 = 0x82;
    pub const SCANCTRL: u8 = 0x85;
    pub const SDPVTL0: u8 = 0x86;
    pub const SDPVTL1: u8 = 0x87;
    pub const GETINFO: u8 = 0x88;
    pub const IDEF: u8 = 0x89;
    pub const ROLL: u8 = 0x8A;
    pub const MAX: u8 = 0x8B;
    pub const MIN: u8 = 0x8C;
    pub const SCANTYPE: u8 = 0x8D;
    pub const INSTCTRL: u8 = 0x8E;
    pub const GETVARIATION: u8 = 0x91;
    pub const PUSHB0: u8 = 0xB0;
    pub const PUSHB7: u8 = 0xB7;
    pub const PUSHW0: u8 = 0xB8;
    pub const PUSHW7: u8 = 0xBF;
    pub const MDRP_BASE: u8 = 0xC0;
    pub const MIRP_BASE: u8 = 0xE0;
}

use opcode::*;

/// Mnemonic and variant-bit width for an opcode; `None` for reserved
/// byte values.
fn describe(op: u8) -> Option<(&'static str, u8, u8)> {
    Some(match op {
        0x00..=0x01 => ("SVTCA", SVTCA0, 1),
        0x02..=0x03 => ("SPVTCA", SPVTCA0, 1),
        0x04..=0x05 => ("SFVTCA", SFVTCA0, 1),
        0x06..=0x07 => ("SPVTL", SPVTL0, 1),
        0x08..=0x09 => ("SFVTL", SFVTL0, 1),
        SPVFS => ("SPVFS", op, 0),
        SFVFS => ("SFVFS", op, 0),
        GPV => ("GPV", op, 0),
        GFV => ("GFV", op, 0),
        SFVTPV => ("SFVTPV", op, 0),
        ISECT => ("ISECT", op, 0),
        SRP0 => ("SRP0", op, 0),
        SRP1 => ("SRP1", op, 0),
        SRP2 => ("SRP2", op, 0),
        SZP0 => ("SZP0", op, 0),
        SZP1 => ("SZP1", op, 0),
        SZP2 => ("SZP2", op, 0),
        SZPS => ("SZPS", op, 0),
        SLOOP => ("SLOOP", op, 0),
        RTG => ("RTG", op, 0),
        RTHG => ("RTHG", op, 0),
        SMD => ("SMD", op, 0),
        ELSE => ("ELSE", op, 0),
        JMPR => ("JMPR", op, 0),
        SCVTCI => ("SCVTCI", op, 0),
        SSWCI => ("SSWCI", op, 0),
        SSW => ("SSW", op, 0),
        DUP => ("DUP", op, 0),
        POP => ("POP", op, 0),
        CLEAR => ("CLEAR", op, 0),
        SWAP => ("SWAP", op, 0),
        DEPTH => ("DEPTH", op, 0),
        CINDEX => ("CINDEX", op, 0),
        MINDEX => ("MINDEX", op, 0),
        ALIGNPTS => ("ALIGNPTS", op, 0),
        UTP => ("UTP", op, 0),
        LOOPCALL => ("LOOPCALL", op, 0),
        CALL => ("CALL", op, 0),
        FDEF => ("FDEF", op, 0),
        ENDF => ("ENDF", op, 0),
        0x2E..=0x2F => ("MDAP", MDAP0, 1),
        0x30..=0x31 => ("IUP", IUP0, 1),
        0x32..=0x33 => ("SHP", SHP0, 1),
        0x34..=0x35 => ("SHC", SHC0, 1),
        0x36..=0x37 => ("SHZ", SHZ0, 1),
        SHPIX => ("SHPIX", op, 0),
        IP => ("IP", op, 0),
        0x3A..=0x3B => ("MSIRP", MSIRP0, 1),
        ALIGNRP => ("ALIGNRP", op, 0),
        RTDG => ("RTDG", op, 0),
        0x3E..=0x3F => ("MIAP", MIAP0, 1),
        NPUSHB => ("NPUSHB", op, 0),
        NPUSHW => ("NPUSHW", op, 0),
        WS => ("WS", op, 0),
        RS => ("RS", op, 0),
        WCVTP => ("WCVTP", op, 0),
        RCVT => ("RCVT", op, 0),
        0x46..=0x47 => ("GC", GC0, 1),
        SCFS => ("SCFS", op, 0),
        0x49..=0x4A => ("MD", MD0, 1),
        MPPEM => ("MPPEM", op, 0),
        MPS => ("MPS", op, 0),
        FLIPON => ("FLIPON", op, 0),
        FLIPOFF => ("FLIPOFF", op, 0),
        DEBUG => ("DEBUG", op, 0),
        LT => ("LT", op, 0),
        LTEQ => ("LTEQ", op, 0),
        GT => ("GT", op, 0),
        GTEQ => ("GTEQ", op, 0),
        EQ => ("EQ", op, 0),
        NEQ => ("NEQ", op, 0),
        ODD => ("ODD", op, 0),
        EVEN => ("EVEN", op, 0),
        IF => ("IF", op, 0),
        EIF => ("EIF", op, 0),
        AND => ("AND", op, 0),
        OR => ("OR", op, 0),
        NOT => ("NOT", op, 0),
        DELTAP1 => ("DELTAP1", op, 0),
        SDB => ("SDB", op, 0),
        SDS => ("SDS", op, 0),
        ADD => ("ADD", op, 0),
        SUB => ("SUB", op, 0),
        DIV => ("DIV", op, 0),
        MUL => ("MUL", op, 0),
        ABS => ("ABS", op, 0),
        NEG => ("NEG", op, 0),
        FLOOR => ("FLOOR", op, 0),
        CEILING => ("CEILING", op, 0),
        0x68..=0x6B => ("ROUND", ROUND0, 2),
        0x6C..=0x6F => ("NROUND", NROUND0, 2),
        WCVTF => ("WCVTF", op, 0),
        DELTAP2 => ("DELTAP2", op, 0),
        DELTAP3 => ("DELTAP3", op, 0),
        0x73..=0x75 => {
            match op {
                0x73 => ("DELTAC1", op, 0),
                0x74 => ("DELTAC2", op, 0),
                _ => ("DELTAC3", op, 0),
            }
        }
        SROUND => ("SROUND", op, 0),
        S45ROUND => ("S45ROUND", op, 0),
        JROT => ("JROT", op, 0),
        JROF => ("JROF", op, 0),
        ROFF => ("ROFF", op, 0),
        RUTG => ("RUTG", op, 0),
        RDTG => ("RDTG", op, 0),
        SANGW => ("SANGW", op, 0),
        AA => ("AA", op, 0),
        FLIPPT => ("FLIPPT", op, 0),
        FLIPRGON => ("FLIPRGON", op, 0),
        FLIPRGOFF => ("FLIPRGOFF", op, 0),
        SCANCTRL => ("SCANCTRL", op, 0),
        0x86..=0x87 => ("SDPVTL", SDPVTL0, 1),
        GETINFO => ("GETINFO", op, 0),
        IDEF => ("IDEF", op, 0),
        ROLL => ("ROLL", op, 0),
        MAX => ("MAX", op, 0),
        MIN => ("MIN", op, 0),
        SCANTYPE => ("SCANTYPE", op, 0),
        INSTCTRL => ("INSTCTRL", op, 0),
        GETVARIATION => ("GETVARIATION", op, 0),
        0xB0..=0xB7 => ("PUSHB", PUSHB0, 3),
        0xB8..=0xBF => ("PUSHW", PUSHW0, 3),
        0xC0..=0xDF => ("MDRP", MDRP_BASE, 5),
        0xE0..=0xFF => ("MIRP", MIRP_BASE, 5),
        _ => return None,
    })
}

/// Byte length of the instruction at `op`, given the byte after it (used
/// by the variable length push forms). `None` when a count byte is
/// required but missing.
fn instruction_len(op: u8, next: Option<u8>) -> Option<usize> {
    Some(match op {
        NPUSHB => 2 + next? as usize,
        NPUSHW => 2 + 2 * next? as usize,
        0xB0..=0xB7 => 2 + (op - PUSHB0) as usize,
        0xB8..=0xBF => 1 + 2 * ((op - PUSHW0) as usize + 1),
        _ => 1,
    })
}

fn is_push_words(op: u8) -> bool {
    (PUSHW0..=PUSHW7).contains(&op) || op == NPUSHW
}

/// Inline operands of a push instruction.
#[derive(Copy, Clone, Default, Debug)]
pub struct Operands<'a> {
    raw: &'a [u8],
    is_words: bool,
}

impl<'a> Operands<'a> {
    pub fn len(&self) -> usize {
        if self.is_words {
            self.raw.len() / 2
        } else {
            self.raw.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The operand values: bytes zero-extend, words sign-extend.
    pub fn values(&self) -> impl Iterator<Item = i32> + 'a + Clone {
        let (bytes, words) = if self.is_words {
            (&[][..], self.raw)
        } else {
            (self.raw, &[][..])
        };
        bytes.iter().map(|byte| *byte as i32).chain(
            words
                .chunks_exact(2)
                .map(|pair| i16::from_be_bytes([pair[0], pair[1]]) as i32),
        )
    }
}

/// One decoded instruction.
#[derive(Copy, Clone, Debug)]
pub struct Instruction<'a> {
    /// Offset of the opcode byte within the program.
    pub pc: usize,
    pub opcode: u8,
    pub operands: Operands<'a>,
}

impl Instruction<'_> {
    /// Base mnemonic, without variant bits; `None` for reserved opcodes.
    pub fn name(&self) -> Option<&'static str> {
        describe(self.opcode).map(|(name, _, _)| name)
    }

    pub fn is_unknown(&self) -> bool {
        describe(self.opcode).is_none()
    }
}

impl core::fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match describe(self.opcode) {
            Some((name, _, 0)) => write!(f, "{name}")?,
            Some((name, base, bits)) => {
                let variant = self.opcode - base;
                write!(f, "{name}[{variant:0width$b}]", width = bits as usize)?;
            }
            None => write!(f, "UNKNOWN[0x{:02X}]", self.opcode)?,
        }
        for value in self.operands.values() {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

/// Streaming bytecode decoder.
#[derive(Copy, Clone)]
pub struct Decoder<'a> {
    pub bytecode: &'a [u8],
    pub pc: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytecode: &'a [u8], pc: usize) -> Self {
        Decoder { bytecode, pc }
    }

    /// Decodes the instruction at the current program counter, or `None`
    /// at the end of the stream.
    pub fn maybe_next(&mut self) -> Option<Result<Instruction<'a>, HintErrorKind>> {
        let op = *self.bytecode.get(self.pc)?;
        Some(self.next_inner(op))
    }

    pub fn next_instruction(&mut self) -> Result<Instruction<'a>, HintErrorKind> {
        let op = *self
            .bytecode
            .get(self.pc)
            .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?;
        self.next_inner(op)
    }

    fn next_inner(&mut self, op: u8) -> Result<Instruction<'a>, HintErrorKind> {
        let len = instruction_len(op, self.bytecode.get(self.pc + 1).copied())
            .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?;
        let count_len = usize::from(op == NPUSHB || op == NPUSHW);
        let pc = self.pc;
        let operand_start = pc + 1 + count_len;
        let operand_len = len - 1 - count_len;
        let mut operands = Operands::default();
        if operand_len > 0 {
            operands.raw = self
                .bytecode
                .get(operand_start..operand_start + operand_len)
                .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?;
            operands.is_words = is_push_words(op);
        }
        self.pc += len;
        Ok(Instruction {
            pc,
            opcode: op,
            operands,
        })
    }
}

/// Decodes a whole program for tooling.
///
/// Never fails: reserved opcodes come out as unknown instructions and a
/// push truncated by the end of the stream keeps whatever operand bytes
/// remain.
pub fn disassemble(bytecode: &[u8]) -> Vec<Instruction> {
    let mut out = Vec::new();
    let mut pc = 0;
    while pc < bytecode.len() {
        let mut decoder = Decoder::new(bytecode, pc);
        match decoder.next_instruction() {
            Ok(instruction) => {
                out.push(instruction);
                pc = decoder.pc;
            }
            Err(_) => {
                let op = bytecode[pc];
                let count_len = usize::from(op == NPUSHB || op == NPUSHW);
                let raw = &bytecode[(pc + 1 + count_len).min(bytecode.len())..];
                out.push(Instruction {
                    pc,
                    opcode: op,
                    operands: Operands {
                        raw,
                        is_words: is_push_words(op),
                    },
                });
                break;
            }
        }
    }
    out
}
