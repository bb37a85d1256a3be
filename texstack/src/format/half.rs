//! IEEE 754 half-precision helpers.
//!
//! Half floats are stored as raw `u16` bit patterns. Narrowing conversions
//! saturate: values outside the half range clamp to the largest finite half,
//! infinities clamp the same way and NaN becomes zero.

/// Largest finite half-precision value.
pub const F16_MAX: f32 = 65504.0;

const F16_MAX_BITS: u16 = 0x7BFF;

/// Widen a half-precision bit pattern to `f32`. Exact for every input.
pub fn f16_to_f32(bits: u16) -> f32 {
    let sign = ((bits & 0x8000) as u32) << 16;
    let exp = ((bits >> 10) & 0x1F) as u32;
    let man = (bits & 0x3FF) as u32;

    let out = match (exp, man) {
        (0, 0) => sign,
        (0, _) => {
            // Subnormal: renormalize into an f32 exponent.
            let mut shift = 0u32;
            let mut m = man;
            while m & 0x400 == 0 {
                m <<= 1;
                shift += 1;
            }
            sign | ((113 - shift) << 23) | ((m & 0x3FF) << 13)
        }
        (0x1F, 0) => sign | 0x7F80_0000,
        (0x1F, _) => sign | 0x7FC0_0000 | (man << 13),
        _ => sign | ((exp + 112) << 23) | (man << 13),
    };
    f32::from_bits(out)
}

/// Narrow an `f32` to half precision, rounding to nearest even and
/// saturating at the finite half range.
pub fn f32_to_f16(value: f32) -> u16 {
    if value.is_nan() {
        return 0;
    }
    let sign = if value.is_sign_negative() { 0x8000 } else { 0 };
    if value.abs() >= F16_MAX {
        return sign | F16_MAX_BITS;
    }

    let x = value.to_bits();
    let exp = ((x >> 23) & 0xFF) as i32;
    let man = x & 0x7F_FFFF;
    let e = exp - 127 + 15;

    if e <= 0 {
        if e < -10 {
            return sign;
        }
        let m = man | 0x80_0000;
        let shift = (14 - e) as u32;
        let mut half = m >> shift;
        let rem = m & ((1 << shift) - 1);
        let halfway = 1 << (shift - 1);
        if rem > halfway || (rem == halfway && half & 1 == 1) {
            half += 1;
        }
        return sign | half as u16;
    }

    let mut half = ((e as u32) << 10) | (man >> 13);
    let rem = man & 0x1FFF;
    if rem > 0x1000 || (rem == 0x1000 && half & 1 == 1) {
        half += 1;
    }
    // Rounding can only carry up to F16_MAX here since larger inputs were clamped.
    sign | (half as u16).min(F16_MAX_BITS)
}

/// Narrow an `f64` to `f32` with the same saturating rules.
pub fn f64_to_f32(value: f64) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-(f32::MAX as f64), f32::MAX as f64) as f32
    }
}
