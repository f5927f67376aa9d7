//! Fixed point helpers for the interpreter.
//!
//! Distances and coordinates are 26.6, projection and freedom vectors
//! are 2.14.

/// One in 2.14.
pub const ONE14: i32 = 0x4000;

/// 26.6 floor.
pub fn floor(value: i32) -> i32 {
    value & !63
}

/// 26.6 round to nearest, ties away from zero handled grid-wise.
pub fn round(value: i32) -> i32 {
    floor(value.wrapping_add(32))
}

/// 26.6 ceiling.
pub fn ceil(value: i32) -> i32 {
    floor(value.wrapping_add(63))
}

/// `a * b / c` in 64 bits with rounding, matching the interpreter's
/// divisor semantics.
pub fn mul_div(a: i32, b: i32, c: i32) -> i32 {
    if c == 0 {
        return 0;
    }
    let product = a as i64 * b as i64;
    let c = c as i64;
    let sign = if (product < 0) != (c < 0) { -1 } else { 1 };
    let value = (product.unsigned_abs() + c.unsigned_abs() / 2) / c.unsigned_abs();
    (sign * value as i64) as i32
}

/// Multiplies a 26.6 value by a 2.14 value.
pub fn mul14(a: i32, b: i32) -> i32 {
    let product = a as i64 * b as i64;
    let rounding = if product < 0 { -0x2000 } else { 0x2000 };
    ((product + rounding) >> 14) as i32
}

/// Projects a 26.6 delta onto a 2.14 unit vector.
pub fn dot14(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
    let product = ax as i64 * bx as i64 + ay as i64 * by as i64;
    let rounding = if product < 0 { -0x2000 } else { 0x2000 };
    ((product + rounding) >> 14) as i32
}

/// 26.6 division: `(a << 6) / b` with rounding.
pub fn div(a: i32, b: i32) -> i32 {
    mul_div(a, 64, b)
}

/// 26.6 multiplication: `a * b >> 6` with rounding.
pub fn mul(a: i32, b: i32) -> i32 {
    let product = a as i64 * b as i64;
    let rounding = if product < 0 { -32 } else { 32 };
    ((product + rounding) >> 6) as i32
}

/// Normalizes an arbitrary vector to a 2.14 unit vector.
///
/// A zero input yields the x axis.
pub fn normalize14(x: i32, y: i32) -> (i32, i32) {
    if x == 0 && y == 0 {
        return (ONE14, 0);
    }
    let fx = x as f64;
    let fy = y as f64;
    let magnitude = (fx * fx + fy * fy).sqrt();
    (
        (fx / magnitude * ONE14 as f64).round() as i32,
        (fy / magnitude * ONE14 as f64).round() as i32,
    )
}
