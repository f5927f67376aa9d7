//! Hint program sources.

/// Which bytecode stream an instruction came from.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum ProgramKind {
    /// The `fpgm` table: function and instruction definitions.
    #[default]
    Font,
    /// The `prep` table: per-size control value and state setup.
    ControlValue,
    /// The instructions attached to one glyph.
    Glyph,
}

/// The three program sources available to the interpreter.
#[derive(Copy, Clone, Default)]
pub struct Programs<'a> {
    pub font: &'a [u8],
    pub control_value: &'a [u8],
    pub glyph: &'a [u8],
}

impl<'a> Programs<'a> {
    pub fn get(&self, kind: ProgramKind) -> &'a [u8] {
        match kind {
            ProgramKind::Font => self.font,
            ProgramKind::ControlValue => self.control_value,
            ProgramKind::Glyph => self.glyph,
        }
    }
}
