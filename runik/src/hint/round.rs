//! Rounding state.

use super::math;

/// Rounding strategies, selected by the `R*` and `S*ROUND` instructions.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum RoundMode {
    /// Round to the closest grid line (`RTG`).
    #[default]
    Grid,
    /// Round to the nearest half grid line (`RTHG`).
    HalfGrid,
    /// Round to the closest half or integer pixel (`RTDG`).
    DoubleGrid,
    /// Round down to the closest grid line (`RDTG`).
    DownToGrid,
    /// Round up to the closest grid line (`RUTG`).
    UpToGrid,
    /// Rounding disabled (`ROFF`).
    Off,
    /// Custom period/phase/threshold (`SROUND`).
    Super,
    /// Like `Super` with a sqrt(2)/2 pixel grid period (`S45ROUND`).
    Super45,
}

/// The round state: mode plus the super-round parameters, all 26.6.
#[derive(Copy, Clone, Debug)]
pub struct RoundState {
    pub mode: RoundMode,
    pub threshold: i32,
    pub phase: i32,
    pub period: i32,
}

impl Default for RoundState {
    fn default() -> Self {
        RoundState {
            mode: RoundMode::Grid,
            threshold: 0,
            phase: 0,
            period: 64,
        }
    }
}

/// Grid period passed to super-round setup by `SROUND`.
pub const GRID_PERIOD: i32 = 0x4000;
/// Grid period for `S45ROUND`: sqrt(2)/2 of a pixel.
pub const GRID_PERIOD_45: i32 = 0x5A82;

impl RoundState {
    /// Applies the current rounding mode to a 26.6 distance.
    ///
    /// Rounding never crosses zero: a positive distance stays
    /// non-negative and vice versa.
    pub fn round(&self, distance: i32) -> i32 {
        use RoundMode::*;
        match self.mode {
            Grid => {
                if distance >= 0 {
                    math::round(distance).max(0)
                } else {
                    (-math::round(-distance)).min(0)
                }
            }
            HalfGrid => {
                if distance >= 0 {
                    (math::floor(distance) + 32).max(0)
                } else {
                    (-(math::floor(-distance) + 32)).min(0)
                }
            }
            DoubleGrid => {
                if distance >= 0 {
                    (distance.wrapping_add(16) & !31).max(0)
                } else {
                    (-((-distance).wrapping_add(16) & !31)).min(0)
                }
            }
            DownToGrid => {
                if distance >= 0 {
                    math::floor(distance).max(0)
                } else {
                    (-math::floor(-distance)).min(0)
                }
            }
            UpToGrid => {
                if distance >= 0 {
                    math::ceil(distance).max(0)
                } else {
                    (-math::ceil(-distance)).min(0)
                }
            }
            Off => distance,
            Super => {
                if distance >= 0 {
                    let value =
                        ((distance + (self.threshold - self.phase)) & -self.period) + self.phase;
                    if value < 0 {
                        self.phase
                    } else {
                        value
                    }
                } else {
                    let value =
                        -(((self.threshold - self.phase) - distance) & -self.period) - self.phase;
                    if value > 0 {
                        -self.phase
                    } else {
                        value
                    }
                }
            }
            // The 45 degree period is not a power of two, so the masking
            // trick does not apply
            Super45 => {
                if distance >= 0 {
                    let value = ((distance + (self.threshold - self.phase)) / self.period)
                        * self.period
                        + self.phase;
                    if value < 0 {
                        self.phase
                    } else {
                        value
                    }
                } else {
                    let value = -((((self.threshold - self.phase) - distance) / self.period)
                        * self.period)
                        - self.phase;
                    if value > 0 {
                        -self.phase
                    } else {
                        value
                    }
                }
            }
        }
    }

    /// Configures super rounding from an `SROUND`/`S45ROUND` selector.
    pub fn set_super(&mut self, mode: RoundMode, grid_period: i32, selector: i32) {
        self.mode = mode;
        let period = match selector & 0xC0 {
            0x00 => grid_period / 2,
            0x40 => grid_period,
            0x80 => grid_period * 2,
            _ => grid_period,
        };
        self.period = period >> 8;
        self.phase = match selector & 0x30 {
            0x00 => 0,
            0x10 => self.period / 4,
            0x20 => self.period / 2,
            _ => self.period * 3 / 4,
        };
        self.threshold = match selector & 0x0F {
            0 => self.period - 1,
            bits => (bits - 4) * self.period / 8,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_cases(mode: RoundMode, cases: &[(i32, i32)]) {
        let state = RoundState {
            mode,
            ..Default::default()
        };
        for (value, expected) in cases.iter().copied() {
            assert_eq!(
                state.round(value),
                expected,
                "mismatch for {mode:?}({value})"
            );
        }
    }

    #[test]
    fn basic_modes() {
        round_cases(
            RoundMode::Grid,
            &[(0, 0), (32, 64), (-32, -64), (31, 0), (-95, -64)],
        );
        round_cases(RoundMode::HalfGrid, &[(0, 32), (64, 96), (-64, -96)]);
        round_cases(RoundMode::DoubleGrid, &[(15, 0), (16, 32), (-50, -64)]);
        round_cases(RoundMode::DownToGrid, &[(63, 0), (-63, 0), (65, 64)]);
        round_cases(RoundMode::UpToGrid, &[(1, 64), (-1, -64), (64, 64)]);
        round_cases(RoundMode::Off, &[(37, 37), (-5, -5)]);
    }

    #[test]
    fn super_round_selector() {
        let mut state = RoundState::default();
        // Period 1px, phase 0, threshold period/2 (selector low bits 8)
        state.set_super(RoundMode::Super, GRID_PERIOD, 0x48);
        assert_eq!((state.period, state.phase, state.threshold), (64, 0, 32));
        assert_eq!(state.round(32), 64);
        assert_eq!(state.round(31), 0);
        // Half pixel period with quarter phase
        state.set_super(RoundMode::Super, GRID_PERIOD, 0x10);
        assert_eq!((state.period, state.phase), (32, 8));
    }

    #[test]
    fn rounding_never_crosses_zero() {
        let state = RoundState {
            mode: RoundMode::Grid,
            ..Default::default()
        };
        assert_eq!(state.round(1), 0);
        assert_eq!(state.round(-1), 0);
        let state = RoundState {
            mode: RoundMode::UpToGrid,
            ..Default::default()
        };
        assert_eq!(state.round(-1), -64);
    }
}
