//! Top and Private DICT parsing.

use crate::error::ReadError;

/// Operator keys; two-byte escaped operators are `0x0c00 | b1`.
pub mod op {
    pub const CHARSTRING_TYPE: u16 = 0x0c06;
    pub const CHARSTRINGS: u16 = 17;
    pub const PRIVATE: u16 = 18;
    pub const SUBRS: u16 = 19;
    pub const DEFAULT_WIDTH_X: u16 = 20;
    pub const NOMINAL_WIDTH_X: u16 = 21;
}

/// A DICT operand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i32),
    Real(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Real(value) => value,
        }
    }

    pub fn as_i32(self) -> Result<i32, ReadError> {
        match self {
            Number::Int(value) => Ok(value),
            Number::Real(value) => {
                if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
                    Ok(value as i32)
                } else {
                    Err(ReadError::MalformedData("expected an integer DICT operand"))
                }
            }
        }
    }
}

/// One key/value pair from a DICT.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub operator: u16,
    pub operands: Vec<Number>,
}

impl Entry {
    pub fn operand(&self, index: usize) -> Result<Number, ReadError> {
        self.operands
            .get(index)
            .copied()
            .ok_or(ReadError::MalformedData("missing DICT operand"))
    }
}

const MAX_OPERANDS: usize = 48;

/// Parses a DICT body into its entries.
pub fn parse(data: &[u8]) -> Result<Vec<Entry>, ReadError> {
    let mut entries = Vec::new();
    let mut operands = Vec::new();
    let mut bytes = data.iter().copied().enumerate();
    while let Some((pos, b0)) = bytes.next() {
        match b0 {
            0..=21 => {
                let operator = if b0 == 12 {
                    let (_, b1) = bytes.next().ok_or(ReadError::OutOfBounds)?;
                    0x0c00 | b1 as u16
                } else {
                    b0 as u16
                };
                entries.push(Entry {
                    operator,
                    operands: std::mem::take(&mut operands),
                });
            }
            28 => {
                let value = take_int(data, pos + 1, 2)? as i16 as i32;
                operands.push(Number::Int(value));
                advance(&mut bytes, 2)?;
            }
            29 => {
                let value = take_int(data, pos + 1, 4)? as i32;
                operands.push(Number::Int(value));
                advance(&mut bytes, 4)?;
            }
            30 => {
                let (value, len) = parse_real(&data[pos + 1..])?;
                operands.push(Number::Real(value));
                advance(&mut bytes, len)?;
            }
            32..=246 => operands.push(Number::Int(b0 as i32 - 139)),
            247..=250 => {
                let (_, b1) = bytes.next().ok_or(ReadError::OutOfBounds)?;
                operands.push(Number::Int((b0 as i32 - 247) * 256 + b1 as i32 + 108));
            }
            251..=254 => {
                let (_, b1) = bytes.next().ok_or(ReadError::OutOfBounds)?;
                operands.push(Number::Int(-(b0 as i32 - 251) * 256 - b1 as i32 - 108));
            }
            _ => return Err(ReadError::MalformedData("reserved byte in DICT")),
        }
        if operands.len() > MAX_OPERANDS {
            return Err(ReadError::MalformedData("too many DICT operands"));
        }
    }
    Ok(entries)
}

fn take_int(data: &[u8], pos: usize, len: usize) -> Result<u32, ReadError> {
    let bytes = data.get(pos..pos + len).ok_or(ReadError::OutOfBounds)?;
    let mut value = 0u32;
    for byte in bytes {
        value = value << 8 | *byte as u32;
    }
    // Sign-extend two-byte values
    if len == 2 {
        value = value as u16 as i16 as i32 as u32;
    }
    Ok(value)
}

fn advance(bytes: &mut impl Iterator, n: usize) -> Result<(), ReadError> {
    for _ in 0..n {
        bytes.next().ok_or(ReadError::OutOfBounds)?;
    }
    Ok(())
}

/// Decodes a nibble-packed real number, returning the value and the
/// number of bytes consumed.
fn parse_real(data: &[u8]) -> Result<(f64, usize), ReadError> {
    let mut text = String::new();
    for (consumed, byte) in data.iter().enumerate() {
        for nibble in [byte >> 4, byte & 0x0F] {
            match nibble {
                0..=9 => text.push((b'0' + nibble) as char),
                0xA => text.push('.'),
                0xB => text.push('E'),
                0xC => text.push_str("E-"),
                0xE => text.push('-'),
                0xF => {
                    let value = text
                        .parse::<f64>()
                        .map_err(|_| ReadError::MalformedData("malformed real number"))?;
                    return Ok((value, consumed + 1));
                }
                _ => return Err(ReadError::MalformedData("reserved nibble in real number")),
            }
        }
    }
    Err(ReadError::OutOfBounds)
}

/// Finds an entry by operator.
pub fn find(entries: &[Entry], operator: u16) -> Option<&Entry> {
    entries.iter().find(|entry| entry.operator == operator)
}
