//! Environment queries and raster control.

use super::{
    super::{error::HintErrorKind, program::ProgramKind},
    Engine, OpResult,
};

/// Interpreter version reported by GETINFO, matching the v40 behavior
/// fonts probe for.
const ENGINE_VERSION: i32 = 40;

impl<'a> Engine<'a> {
    pub(super) fn op_mppem(&mut self) -> OpResult {
        self.value_stack.push(self.ppem as i32)
    }

    pub(super) fn op_mps(&mut self) -> OpResult {
        self.value_stack.push(self.point_size)
    }

    pub(super) fn op_getinfo(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        let mut result = 0;
        if selector & 1 != 0 {
            result |= ENGINE_VERSION;
        }
        if selector & 2 != 0 && self.rotated {
            result |= 1 << 8;
        }
        // Stretching is never applied, bit 9 stays clear. Grayscale
        // rendering is always reported.
        if selector & 32 != 0 {
            result |= 1 << 12;
        }
        self.value_stack.push(result)
    }

    /// SCANCTRL: decides dropout control from ppem thresholds and the
    /// rotation state.
    pub(super) fn op_scanctrl(&mut self) -> OpResult {
        let flags = self.value_stack.pop()?;
        let threshold = flags & 0xFF;
        if threshold == 0xFF {
            self.graphics.scan_control = true;
        } else if threshold == 0 {
            self.graphics.scan_control = false;
        }
        if flags & 0x100 != 0 && (self.ppem as i32) <= threshold {
            self.graphics.scan_control = true;
        }
        if flags & 0x200 != 0 && self.rotated {
            self.graphics.scan_control = true;
        }
        if flags & 0x800 != 0 && (self.ppem as i32) > threshold {
            self.graphics.scan_control = false;
        }
        if flags & 0x1000 != 0 && !self.rotated {
            self.graphics.scan_control = false;
        }
        Ok(())
    }

    pub(super) fn op_scantype(&mut self) -> OpResult {
        let value = self.value_stack.pop()?;
        if value >= 0 {
            self.graphics.scan_type = value & 0xFFFF;
        }
        Ok(())
    }

    /// INSTCTRL: only honored in the control value program.
    pub(super) fn op_instctrl(&mut self) -> OpResult {
        let selector = self.value_stack.pop()?;
        let value = self.value_stack.pop()?;
        if !(1..=3).contains(&selector) {
            return Err(HintErrorKind::InvalidStackValue(selector));
        }
        if self.program != ProgramKind::ControlValue {
            return Ok(());
        }
        let bit = 1 << (selector - 1);
        if value != 0 {
            self.graphics.instruct_control |= bit;
        } else {
            self.graphics.instruct_control &= !bit;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::test_engine;
    use super::*;

    #[test]
    fn size_queries() {
        let mut engine = test_engine();
        engine.op_mppem().unwrap();
        assert_eq!(engine.pop(), 16);
        engine.op_mps().unwrap();
        assert_eq!(engine.pop(), 16 * 64);
    }

    #[test]
    fn getinfo_version_and_grayscale() {
        let mut engine = test_engine();
        engine.push_all(&[1]);
        engine.op_getinfo().unwrap();
        assert_eq!(engine.pop(), ENGINE_VERSION);
        engine.push_all(&[32]);
        engine.op_getinfo().unwrap();
        assert_eq!(engine.pop(), 1 << 12);
        // Not rotated: bit 8 stays clear
        engine.push_all(&[2]);
        engine.op_getinfo().unwrap();
        assert_eq!(engine.pop(), 0);
    }

    #[test]
    fn scanctrl_threshold() {
        let mut engine = test_engine();
        // Enable at or below 17 ppem; the test engine runs at 16
        engine.push_all(&[0x100 | 17]);
        engine.op_scanctrl().unwrap();
        assert!(engine.graphics.scan_control);
        // Disable above 10 ppem
        engine.push_all(&[0x800 | 10]);
        engine.op_scanctrl().unwrap();
        assert!(!engine.graphics.scan_control);
    }

    #[test]
    fn instctrl_requires_prep() {
        let mut engine = test_engine();
        // Outside the control value program the bits do not change
        engine.push_all(&[1, 1]);
        engine.op_instctrl().unwrap();
        assert_eq!(engine.graphics.instruct_control, 0);
        engine.program = ProgramKind::ControlValue;
        engine.push_all(&[1, 1]);
        engine.op_instctrl().unwrap();
        assert_eq!(engine.graphics.instruct_control, 1);
        engine.push_all(&[1, 9]);
        assert_eq!(
            engine.op_instctrl(),
            Err(HintErrorKind::InvalidStackValue(9))
        );
    }
}
