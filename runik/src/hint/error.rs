//! Hinting error types.

use runik_types::GlyphId;

use super::program::ProgramKind;

/// Reasons a hint program failed.
///
/// Any of these aborts the current glyph's hinting pass; callers should
/// fall back to the unhinted outline rather than reject the font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HintErrorKind {
    UnexpectedEndOfBytecode,
    ValueStackOverflow,
    ValueStackUnderflow,
    CallStackOverflow,
    CallStackUnderflow,
    InvalidStackValue(i32),
    InvalidPointIndex(usize),
    InvalidPointRange(usize, usize),
    InvalidContourIndex(usize),
    InvalidCvtIndex(usize),
    InvalidStorageIndex(usize),
    InvalidZoneIndex(i32),
    InvalidDefinitionIndex(usize),
    DefinitionInGlyphProgram,
    NestedDefinition,
    DivideByZero,
    InvalidJump,
    NegativeLoopCounter,
    ExceededExecutionBudget,
    UnhandledOpcode(u8),
}

impl core::fmt::Display for HintErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use HintErrorKind::*;
        match self {
            UnexpectedEndOfBytecode => write!(f, "unexpected end of bytecode"),
            ValueStackOverflow => write!(f, "value stack overflow"),
            ValueStackUnderflow => write!(f, "value stack underflow"),
            CallStackOverflow => write!(f, "call stack overflow"),
            CallStackUnderflow => write!(f, "call stack underflow"),
            InvalidStackValue(value) => write!(f, "stack value {value} invalid for operation"),
            InvalidPointIndex(index) => write!(f, "point index {index} out of bounds"),
            InvalidPointRange(start, end) => {
                write!(f, "point range {start}..{end} out of bounds")
            }
            InvalidContourIndex(index) => write!(f, "contour index {index} out of bounds"),
            InvalidCvtIndex(index) => write!(f, "cvt index {index} out of bounds"),
            InvalidStorageIndex(index) => write!(f, "storage index {index} out of bounds"),
            InvalidZoneIndex(index) => write!(f, "zone index {index} out of bounds"),
            InvalidDefinitionIndex(index) => {
                write!(f, "function or instruction index {index} out of bounds")
            }
            DefinitionInGlyphProgram => {
                write!(f, "FDEF or IDEF instruction in glyph program")
            }
            NestedDefinition => {
                write!(f, "FDEF or IDEF instruction inside another definition")
            }
            DivideByZero => write!(f, "attempt to divide by 0"),
            InvalidJump => write!(f, "jump outside the current program"),
            NegativeLoopCounter => write!(f, "negative loop counter"),
            ExceededExecutionBudget => write!(f, "too many instructions executed"),
            UnhandledOpcode(opcode) => write!(f, "unhandled opcode 0x{opcode:02X}"),
        }
    }
}

/// A hinting failure annotated with where it happened.
#[derive(Clone, Debug)]
pub struct HintError {
    pub program: ProgramKind,
    pub glyph_id: Option<GlyphId>,
    pub pc: usize,
    pub opcode: Option<u8>,
    pub kind: HintErrorKind,
}

impl core::fmt::Display for HintError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.program {
            ProgramKind::ControlValue => write!(f, "prep")?,
            ProgramKind::Font => write!(f, "fpgm")?,
            ProgramKind::Glyph => {
                write!(f, "glyf")?;
                if let Some(glyph_id) = self.glyph_id {
                    write!(f, "[{}]", glyph_id.to_u16())?;
                }
            }
        }
        if let Some(opcode) = self.opcode {
            write!(f, "+{} (0x{opcode:02X})", self.pc)?;
        } else {
            write!(f, "+{}", self.pc)?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for HintError {}

impl From<HintErrorKind> for HintError {
    fn from(kind: HintErrorKind) -> Self {
        HintError {
            program: ProgramKind::Glyph,
            glyph_id: None,
            pc: 0,
            opcode: None,
            kind,
        }
    }
}
