//! Canonical pixel formats.
//!
//! A [`PixelFormat`] is the single resolved description (channel count, bits per
//! channel, primitive kind, colorspace) that every subresource of one stored
//! format must match. Construction validates the combination, so an illegal
//! format can never exist:
//!
//! - 8-bit channels can't be floating point
//! - 32/64-bit channels can't be normalized (UNORM/SNORM)
//! - sRGB is only valid for 8-bit, 3 or 4 channel UNORM
//!
//! # Example
//!
//! ```
//! use texstack::format::{PixelFormat, PrimitiveKind};
//!
//! let rgba8 = PixelFormat::new(4, 8, PrimitiveKind::Unorm, false).unwrap();
//! assert_eq!(rgba8.stride(), 4);
//! assert_eq!(rgba8.name(), "RGBA8_UNORM");
//!
//! assert!(PixelFormat::new(4, 8, PrimitiveKind::Float, false).is_err());
//! ```

pub mod half;
pub(crate) mod sample;

use std::fmt;

use crate::error::{ConvertError, ConvertResult};

/// How a raw channel value maps to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    /// Unsigned integer.
    Uint,
    /// Signed integer.
    Sint,
    /// Unsigned normalized fraction in [0, 1].
    Unorm,
    /// Signed normalized fraction in [-1, 1].
    Snorm,
    /// IEEE floating point.
    Float,
}

impl PrimitiveKind {
    /// All primitive kinds, in declaration order.
    pub const ALL: [PrimitiveKind; 5] = [
        PrimitiveKind::Uint,
        PrimitiveKind::Sint,
        PrimitiveKind::Unorm,
        PrimitiveKind::Snorm,
        PrimitiveKind::Float,
    ];

    /// Upper-case suffix used in format names.
    pub fn suffix(self) -> &'static str {
        match self {
            PrimitiveKind::Uint => "UINT",
            PrimitiveKind::Sint => "SINT",
            PrimitiveKind::Unorm => "UNORM",
            PrimitiveKind::Snorm => "SNORM",
            PrimitiveKind::Float => "FLOAT",
        }
    }

    /// Whether values are normalized fractions.
    pub fn is_normalized(self) -> bool {
        matches!(self, PrimitiveKind::Unorm | PrimitiveKind::Snorm)
    }

    /// Whether values carry a sign.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Sint | PrimitiveKind::Snorm | PrimitiveKind::Float
        )
    }

    fn index(self) -> u16 {
        match self {
            PrimitiveKind::Uint => 0,
            PrimitiveKind::Sint => 1,
            PrimitiveKind::Unorm => 2,
            PrimitiveKind::Snorm => 3,
            PrimitiveKind::Float => 4,
        }
    }

    fn from_index(index: u16) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Parse a primitive name (`uint`, `sint`, `unorm`, `snorm`, `float`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "uint" => Some(PrimitiveKind::Uint),
            "sint" => Some(PrimitiveKind::Sint),
            "unorm" => Some(PrimitiveKind::Unorm),
            "snorm" => Some(PrimitiveKind::Snorm),
            "float" => Some(PrimitiveKind::Float),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Legal bit depths per channel.
pub const BIT_DEPTHS: [u8; 4] = [8, 16, 32, 64];

/// A validated canonical pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelFormat {
    channels: u8,
    bits: u8,
    primitive: PrimitiveKind,
    srgb: bool,
}

impl PixelFormat {
    /// Create a pixel format, validating the combination.
    ///
    /// # Errors
    ///
    /// - [`ConvertError::InvalidChannels`] if `channels` isn't 1-4
    /// - [`ConvertError::InvalidBits`] if `bits` isn't 8, 16, 32 or 64
    /// - [`ConvertError::InvalidFormat`] for 8-bit floats, 32/64-bit normalized
    ///   values, or sRGB on anything but 8-bit RGB/RGBA UNORM
    pub fn new(channels: u8, bits: u8, primitive: PrimitiveKind, srgb: bool) -> ConvertResult<Self> {
        if !(1..=4).contains(&channels) {
            return Err(ConvertError::InvalidChannels(format!(
                "{} channels (expected 1-4)",
                channels
            )));
        }
        if !BIT_DEPTHS.contains(&bits) {
            return Err(ConvertError::InvalidBits(format!(
                "{} bits per channel (expected 8, 16, 32 or 64)",
                bits
            )));
        }
        if bits == 8 && primitive == PrimitiveKind::Float {
            return Err(ConvertError::InvalidFormat(
                "8-bit channels can't be floating point".to_string(),
            ));
        }
        if bits > 16 && primitive.is_normalized() {
            return Err(ConvertError::InvalidFormat(format!(
                "{}-bit channels can't be {}",
                bits, primitive
            )));
        }
        if srgb && !(bits == 8 && channels >= 3 && primitive == PrimitiveKind::Unorm) {
            return Err(ConvertError::InvalidFormat(format!(
                "sRGB requires 8-bit RGB or RGBA UNORM, not {} channels {}-bit {}",
                channels, bits, primitive
            )));
        }

        Ok(Self {
            channels,
            bits,
            primitive,
            srgb,
        })
    }

    /// Number of channels (1-4).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Bits per channel (8, 16, 32 or 64).
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Primitive kind of every channel.
    pub fn primitive(&self) -> PrimitiveKind {
        self.primitive
    }

    /// Whether color channels are sRGB encoded.
    pub fn is_srgb(&self) -> bool {
        self.srgb
    }

    /// Whether channels are floating point.
    pub fn is_float(&self) -> bool {
        self.primitive == PrimitiveKind::Float
    }

    /// Bytes per channel.
    pub fn channel_bytes(&self) -> usize {
        self.bits as usize / 8
    }

    /// Bytes per pixel (element stride).
    pub fn stride(&self) -> usize {
        self.channels as usize * self.channel_bytes()
    }

    /// Same format with a different bit depth.
    pub fn with_bits(&self, bits: u8) -> ConvertResult<Self> {
        Self::new(self.channels, bits, self.primitive, self.srgb)
    }

    /// The format an external encoding sees: sRGB is stored as plain UNORM.
    pub fn linear(&self) -> Self {
        Self {
            srgb: false,
            ..*self
        }
    }

    /// Display name, e.g. `RGBA8_UNORM`, `RG16_FLOAT`, `RGB8_SRGB`.
    pub fn name(&self) -> String {
        let letters = &"RGBA"[..self.channels as usize];
        let suffix = if self.srgb {
            "SRGB"
        } else {
            self.primitive.suffix()
        };
        format!("{}{}_{}", letters, self.bits, suffix)
    }

    /// Stable 16-bit identifier used in container files.
    ///
    /// Layout: bits 0-1 channel count - 1, bits 2-3 bit-depth index,
    /// bits 4-6 primitive index, bit 7 sRGB.
    pub fn id(&self) -> u16 {
        let bits_index = BIT_DEPTHS
            .iter()
            .position(|&b| b == self.bits)
            .unwrap_or_default() as u16;
        (self.channels as u16 - 1)
            | (bits_index << 2)
            | (self.primitive.index() << 4)
            | ((self.srgb as u16) << 7)
    }

    /// Rebuild a format from [`id`](Self::id), validating it.
    pub fn from_id(id: u16) -> ConvertResult<Self> {
        if id >> 8 != 0 {
            return Err(ConvertError::InvalidFormat(format!(
                "unknown format id {:#06x}",
                id
            )));
        }
        let channels = (id & 0x3) as u8 + 1;
        let bits = BIT_DEPTHS[((id >> 2) & 0x3) as usize];
        let primitive = PrimitiveKind::from_index((id >> 4) & 0x7).ok_or_else(|| {
            ConvertError::InvalidFormat(format!("unknown primitive in format id {:#06x}", id))
        })?;
        Self::new(channels, bits, primitive, id & 0x80 != 0)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(channels: u8, bits: u8, primitive: PrimitiveKind) -> ConvertResult<PixelFormat> {
        PixelFormat::new(channels, bits, primitive, false)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_8_bit_float_is_invalid_format() {
        let result = fmt(4, 8, PrimitiveKind::Float);
        assert!(matches!(result, Err(ConvertError::InvalidFormat(_))));
    }

    #[test]
    fn test_wide_normalized_is_invalid_format() {
        for bits in [32, 64] {
            for primitive in [PrimitiveKind::Unorm, PrimitiveKind::Snorm] {
                let result = fmt(1, bits, primitive);
                assert!(
                    matches!(result, Err(ConvertError::InvalidFormat(_))),
                    "{} bit {} should be rejected",
                    bits,
                    primitive
                );
            }
        }
    }

    #[test]
    fn test_srgb_only_for_8_bit_rgb_rgba_unorm() {
        assert!(PixelFormat::new(3, 8, PrimitiveKind::Unorm, true).is_ok());
        assert!(PixelFormat::new(4, 8, PrimitiveKind::Unorm, true).is_ok());
        assert!(PixelFormat::new(2, 8, PrimitiveKind::Unorm, true).is_err());
        assert!(PixelFormat::new(4, 16, PrimitiveKind::Unorm, true).is_err());
        assert!(PixelFormat::new(4, 8, PrimitiveKind::Uint, true).is_err());
    }

    #[test]
    fn test_channel_and_bit_ranges() {
        assert!(matches!(
            fmt(0, 8, PrimitiveKind::Unorm),
            Err(ConvertError::InvalidChannels(_))
        ));
        assert!(matches!(
            fmt(5, 8, PrimitiveKind::Unorm),
            Err(ConvertError::InvalidChannels(_))
        ));
        assert!(matches!(
            fmt(4, 12, PrimitiveKind::Unorm),
            Err(ConvertError::InvalidBits(_))
        ));
    }

    #[test]
    fn test_legal_formats() {
        assert!(fmt(4, 16, PrimitiveKind::Float).is_ok());
        assert!(fmt(4, 64, PrimitiveKind::Float).is_ok());
        assert!(fmt(2, 32, PrimitiveKind::Sint).is_ok());
        assert!(fmt(1, 16, PrimitiveKind::Snorm).is_ok());
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    #[test]
    fn test_stride() {
        assert_eq!(fmt(4, 8, PrimitiveKind::Unorm).unwrap().stride(), 4);
        assert_eq!(fmt(3, 16, PrimitiveKind::Float).unwrap().stride(), 6);
        assert_eq!(fmt(2, 64, PrimitiveKind::Float).unwrap().stride(), 16);
    }

    #[test]
    fn test_names() {
        assert_eq!(fmt(4, 8, PrimitiveKind::Unorm).unwrap().name(), "RGBA8_UNORM");
        assert_eq!(fmt(1, 32, PrimitiveKind::Uint).unwrap().name(), "R32_UINT");
        assert_eq!(fmt(2, 16, PrimitiveKind::Float).unwrap().name(), "RG16_FLOAT");
        assert_eq!(
            PixelFormat::new(3, 8, PrimitiveKind::Unorm, true)
                .unwrap()
                .name(),
            "RGB8_SRGB"
        );
    }

    #[test]
    fn test_id_roundtrip_for_every_legal_format() {
        for channels in 1..=4 {
            for bits in BIT_DEPTHS {
                for primitive in PrimitiveKind::ALL {
                    for srgb in [false, true] {
                        if let Ok(format) = PixelFormat::new(channels, bits, primitive, srgb) {
                            assert_eq!(PixelFormat::from_id(format.id()).unwrap(), format);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_id_rejects_garbage() {
        assert!(PixelFormat::from_id(0xFF00).is_err());
        // primitive index 7 doesn't exist
        assert!(PixelFormat::from_id(0x70).is_err());
    }

    #[test]
    fn test_linear_drops_srgb() {
        let srgb = PixelFormat::new(4, 8, PrimitiveKind::Unorm, true).unwrap();
        assert!(!srgb.linear().is_srgb());
        assert_eq!(srgb.linear().name(), "RGBA8_UNORM");
    }

    #[test]
    fn test_primitive_from_name() {
        assert_eq!(PrimitiveKind::from_name("FLOAT"), Some(PrimitiveKind::Float));
        assert_eq!(PrimitiveKind::from_name("snorm"), Some(PrimitiveKind::Snorm));
        assert_eq!(PrimitiveKind::from_name("half"), None);
    }
}
