//! Little-endian channel sample access.
//!
//! Channels are read into `f64` holding their raw numeric value: integers and
//! normalized kinds as their stored integer, floats as their value. Writing
//! rounds half away from zero and clamps to the destination's range.

use super::half::{f16_to_f32, f32_to_f16, f64_to_f32};
use super::{PixelFormat, PrimitiveKind};

/// Read one channel sample. `bytes` must be exactly `format.channel_bytes()` long.
pub(crate) fn read(format: &PixelFormat, bytes: &[u8]) -> f64 {
    let signed = matches!(format.primitive(), PrimitiveKind::Sint | PrimitiveKind::Snorm);
    match (format.primitive(), format.bits()) {
        (PrimitiveKind::Float, 16) => f16_to_f32(u16::from_le_bytes([bytes[0], bytes[1]])) as f64,
        (PrimitiveKind::Float, 32) => f32::from_le_bytes(array(bytes)) as f64,
        (PrimitiveKind::Float, _) => f64::from_le_bytes(array(bytes)),
        (_, 8) if signed => bytes[0] as i8 as f64,
        (_, 8) => bytes[0] as f64,
        (_, 16) if signed => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
        (_, 16) => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
        (_, 32) if signed => i32::from_le_bytes(array(bytes)) as f64,
        (_, 32) => u32::from_le_bytes(array(bytes)) as f64,
        (_, _) if signed => i64::from_le_bytes(array(bytes)) as f64,
        (_, _) => u64::from_le_bytes(array(bytes)) as f64,
    }
}

/// Write one channel sample into `out` (`format.channel_bytes()` long).
pub(crate) fn write(format: &PixelFormat, value: f64, out: &mut [u8]) {
    let signed = matches!(format.primitive(), PrimitiveKind::Sint | PrimitiveKind::Snorm);
    match (format.primitive(), format.bits()) {
        (PrimitiveKind::Float, 16) => {
            out.copy_from_slice(&f32_to_f16(f64_to_f32(value)).to_le_bytes())
        }
        (PrimitiveKind::Float, 32) => out.copy_from_slice(&f64_to_f32(value).to_le_bytes()),
        (PrimitiveKind::Float, _) => out.copy_from_slice(&value.to_le_bytes()),
        (_, 8) if signed => out[0] = round_clamp(value, i8::MIN as f64, i8::MAX as f64) as i8 as u8,
        (_, 8) => out[0] = round_clamp(value, 0.0, u8::MAX as f64) as u8,
        (_, 16) if signed => out.copy_from_slice(
            &(round_clamp(value, i16::MIN as f64, i16::MAX as f64) as i16).to_le_bytes(),
        ),
        (_, 16) => out
            .copy_from_slice(&(round_clamp(value, 0.0, u16::MAX as f64) as u16).to_le_bytes()),
        (_, 32) if signed => out.copy_from_slice(
            &(round_clamp(value, i32::MIN as f64, i32::MAX as f64) as i32).to_le_bytes(),
        ),
        (_, 32) => out
            .copy_from_slice(&(round_clamp(value, 0.0, u32::MAX as f64) as u32).to_le_bytes()),
        // `as` saturates for the 64-bit integer casts
        (_, _) if signed => out.copy_from_slice(&(value.round() as i64).to_le_bytes()),
        (_, _) => out.copy_from_slice(&(value.round() as u64).to_le_bytes()),
    }
}

fn round_clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.round().clamp(min, max)
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}
