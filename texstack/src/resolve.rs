//! Flag resolution.
//!
//! Turns [`TextureFlags`] into a texture type, memory usage and a
//! [`FormatRule`]: the part of the pixel format fixed by the flags, with the
//! rest inherited from the first decoded image. Everything that can be
//! rejected without reading a file is rejected here.

use std::fmt;

use crate::error::{ConvertError, ConvertResult};
use crate::flags::{MemoryUsage, TextureDimension, TextureFlags};
use crate::format::{PixelFormat, PrimitiveKind, BIT_DEPTHS};

/// Base dimension plus whether the texture is an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureType {
    pub dimension: TextureDimension,
    pub array: bool,
}

impl TextureType {
    pub fn new(dimension: TextureDimension, array: bool) -> Self {
        Self { dimension, array }
    }

    /// One-byte code for container files (bits 0-2 dimension, bit 3 array).
    pub fn code(&self) -> u8 {
        let dimension = match self.dimension {
            TextureDimension::OneD => 0,
            TextureDimension::TwoD => 1,
            TextureDimension::ThreeD => 2,
            TextureDimension::Cube => 3,
            TextureDimension::Multisample => 4,
        };
        dimension | (self.array as u8) << 3
    }

    /// Inverse of [`code`](Self::code).
    pub fn from_code(code: u8) -> ConvertResult<Self> {
        let dimension = match code & 0x7 {
            0 => TextureDimension::OneD,
            1 => TextureDimension::TwoD,
            2 => TextureDimension::ThreeD,
            3 => TextureDimension::Cube,
            4 => TextureDimension::Multisample,
            other => {
                return Err(ConvertError::InvalidType(format!(
                    "unknown texture type code {}",
                    other
                )))
            }
        };
        let array = code & 0x8 != 0;
        if code >> 4 != 0 || (array && dimension == TextureDimension::ThreeD) {
            return Err(ConvertError::InvalidType(format!(
                "unknown texture type code {:#04x}",
                code
            )));
        }
        Ok(Self { dimension, array })
    }
}

impl fmt::Display for TextureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.dimension {
            TextureDimension::OneD => "1D",
            TextureDimension::TwoD => "2D",
            TextureDimension::ThreeD => "3D",
            TextureDimension::Cube => "Cube",
            TextureDimension::Multisample => "2D multisample",
        };
        if self.array {
            write!(f, "{} array", name)
        } else {
            f.write_str(name)
        }
    }
}

/// The pixel format as far as the flags fix it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatRule {
    pub channels: Option<u8>,
    pub primitive: Option<PrimitiveKind>,
    pub bits: Option<u8>,
    pub srgb: bool,
}

impl FormatRule {
    /// Fill inherited fields from a source format and validate the result.
    ///
    /// Decoded images report FLOAT or UNORM (see
    /// [`DecodedImage::format`](crate::codec::DecodedImage::format)), so an
    /// inherited primitive is FLOAT for float sources and UNORM otherwise.
    pub fn finalize(&self, source: &PixelFormat) -> ConvertResult<PixelFormat> {
        PixelFormat::new(
            self.channels.unwrap_or(source.channels()),
            self.bits.unwrap_or(source.bits()),
            self.primitive.unwrap_or(source.primitive()),
            self.srgb,
        )
    }

    /// Whether every field is fixed, so the format is known up front.
    pub fn fixed(&self) -> Option<PixelFormat> {
        match (self.channels, self.primitive, self.bits) {
            (Some(c), Some(p), Some(b)) => PixelFormat::new(c, b, p, self.srgb).ok(),
            _ => None,
        }
    }
}

/// Result of resolving a flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub texture_type: TextureType,
    pub rule: FormatRule,
    pub memory: MemoryUsage,
}

/// Validate flags and split them into type, format rule and memory usage.
///
/// # Errors
///
/// - `INVALID_TYPE` for a 3D array
/// - `INVALID_CHANNELS` / `INVALID_BITS` for values outside 1-4 / 8-64
/// - `INVALID_FORMAT` for 8-bit floats, 32/64-bit normalized channels, or sRGB
///   combined with a fixed field that can't be sRGB
pub fn resolve(flags: &TextureFlags) -> ConvertResult<Resolution> {
    if flags.array && flags.dimension == TextureDimension::ThreeD {
        return Err(ConvertError::InvalidType(
            "3D textures can't be arrays".to_string(),
        ));
    }

    if let Some(channels) = flags.channels {
        if !(1..=4).contains(&channels) {
            return Err(ConvertError::InvalidChannels(format!(
                "{} channels (expected 1-4)",
                channels
            )));
        }
    }
    if let Some(bits) = flags.bits {
        if !BIT_DEPTHS.contains(&bits) {
            return Err(ConvertError::InvalidBits(format!(
                "{} bits per channel (expected 8, 16, 32 or 64)",
                bits
            )));
        }
    }

    match (flags.bits, flags.primitive) {
        (Some(8), Some(PrimitiveKind::Float)) => {
            return Err(ConvertError::InvalidFormat(
                "8-bit channels can't be floating point".to_string(),
            ))
        }
        (Some(bits), Some(p)) if bits > 16 && p.is_normalized() => {
            return Err(ConvertError::InvalidFormat(format!(
                "{}-bit channels can't be {}",
                bits, p
            )))
        }
        _ => {}
    }

    if flags.srgb {
        let bad_bits = flags.bits.is_some_and(|b| b != 8);
        let bad_channels = flags.channels.is_some_and(|c| c < 3);
        let bad_primitive = flags.primitive.is_some_and(|p| p != PrimitiveKind::Unorm);
        if bad_bits || bad_channels || bad_primitive {
            return Err(ConvertError::InvalidFormat(
                "sRGB requires 8-bit RGB or RGBA UNORM".to_string(),
            ));
        }
    }

    Ok(Resolution {
        texture_type: TextureType::new(flags.dimension, flags.array),
        rule: FormatRule {
            channels: flags.channels,
            primitive: flags.primitive,
            bits: flags.bits,
            srgb: flags.srgb,
        },
        memory: flags.memory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::bits;

    fn decoded(channels: u8, bits: u8, float: bool) -> PixelFormat {
        let primitive = if float {
            PrimitiveKind::Float
        } else {
            PrimitiveKind::Unorm
        };
        PixelFormat::new(channels, bits, primitive, false).unwrap()
    }

    // ========================================================================
    // Early validation
    // ========================================================================

    #[test]
    fn test_8_bit_float_rejected_up_front() {
        let flags = TextureFlags::from_bits(bits::IS_8_BIT | bits::IS_FLOAT).unwrap();
        let err = resolve(&flags).unwrap_err();
        assert_eq!(err.code(), 0x05);
    }

    #[test]
    fn test_wide_normalized_rejected_up_front() {
        let flags = TextureFlags::none()
            .with_bits(32)
            .with_primitive(PrimitiveKind::Snorm);
        assert_eq!(resolve(&flags).unwrap_err().code(), 0x05);
    }

    #[test]
    fn test_srgb_with_incompatible_fixed_field() {
        let base = TextureFlags::none().with_srgb(true);
        assert!(resolve(&base).is_ok());
        assert!(resolve(&base.with_bits(16)).is_err());
        assert!(resolve(&base.with_channels(2)).is_err());
        assert!(resolve(&base.with_primitive(PrimitiveKind::Uint)).is_err());
        assert!(resolve(&base.with_channels(4).with_bits(8)).is_ok());
    }

    #[test]
    fn test_out_of_range_typed_values() {
        assert_eq!(resolve(&TextureFlags::none().with_channels(5)).unwrap_err().code(), 0x02);
        assert_eq!(resolve(&TextureFlags::none().with_bits(12)).unwrap_err().code(), 0x04);
    }

    #[test]
    fn test_3d_array_rejected() {
        let flags = TextureFlags::none()
            .with_dimension(TextureDimension::ThreeD)
            .with_array(true);
        assert_eq!(resolve(&flags).unwrap_err().code(), 0x01);
    }

    #[test]
    fn test_resolution_carries_type_and_memory() {
        let flags = TextureFlags::from_bits(bits::IS_CUBE | bits::IS_ARRAY | bits::MEMORY_SHARED)
            .unwrap();
        let resolution = resolve(&flags).unwrap();
        assert_eq!(
            resolution.texture_type,
            TextureType::new(TextureDimension::Cube, true)
        );
        assert_eq!(resolution.memory, flags.memory);
        assert_eq!(resolution.rule.fixed(), None);
    }

    // ========================================================================
    // Finalization
    // ========================================================================

    #[test]
    fn test_inherit_everything() {
        let rule = resolve(&TextureFlags::none()).unwrap().rule;
        assert_eq!(rule.finalize(&decoded(3, 16, false)).unwrap(), decoded(3, 16, false));
        assert_eq!(rule.finalize(&decoded(4, 32, true)).unwrap(), decoded(4, 32, true));
    }

    #[test]
    fn test_partial_override() {
        let rule = resolve(&TextureFlags::none().with_bits(16)).unwrap().rule;
        assert_eq!(rule.finalize(&decoded(4, 32, true)).unwrap(), decoded(4, 16, true));
    }

    #[test]
    fn test_finalize_can_still_fail() {
        // sRGB inherited onto a 16-bit source
        let rule = resolve(&TextureFlags::none().with_srgb(true)).unwrap().rule;
        assert_eq!(rule.finalize(&decoded(4, 16, false)).unwrap_err().code(), 0x05);

        // float override onto an 8-bit source
        let rule = resolve(&TextureFlags::none().with_primitive(PrimitiveKind::Float))
            .unwrap()
            .rule;
        assert_eq!(rule.finalize(&decoded(4, 8, false)).unwrap_err().code(), 0x05);
    }

    #[test]
    fn test_type_codes_roundtrip() {
        for dimension in [
            TextureDimension::OneD,
            TextureDimension::TwoD,
            TextureDimension::Cube,
            TextureDimension::Multisample,
        ] {
            for array in [false, true] {
                let ty = TextureType::new(dimension, array);
                assert_eq!(TextureType::from_code(ty.code()).unwrap(), ty);
            }
        }
        assert!(TextureType::from_code(0x0A).is_err());
        assert!(TextureType::from_code(0x07).is_err());
    }
}
