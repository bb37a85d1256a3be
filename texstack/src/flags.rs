//! Conversion flags.
//!
//! Flags are a set of mutually-exclusive option groups: texture type, channel
//! count, primitive kind, bit depth, memory usage and mip filter, plus a few
//! independent switches. [`TextureFlags`] keeps one typed field per group, so
//! two choices from the same group can't be expressed at all.
//!
//! The packed 32-bit word used by tools and config files is still supported
//! through [`TextureFlags::from_bits`], which rejects words that set more than
//! one option in a group:
//!
//! ```
//! use texstack::flags::{bits, TextureFlags};
//!
//! let flags = TextureFlags::from_bits(bits::IS_CUBE | bits::IS_RGBA).unwrap();
//! assert_eq!(flags.channels, Some(4));
//!
//! // IS_R and IS_RG are the same group
//! let err = TextureFlags::from_bits(bits::IS_R | bits::IS_RG).unwrap_err();
//! assert_eq!(err.code(), 0x02);
//! ```

use std::fmt;

use crate::error::{ConvertError, ConvertResult};
use crate::format::PrimitiveKind;

/// Bit positions of the packed flag word.
pub mod bits {
    pub const IS_1D: u32 = 1 << 0;
    pub const IS_2D: u32 = 1 << 1;
    pub const IS_3D: u32 = 1 << 2;
    pub const IS_CUBE: u32 = 1 << 3;
    pub const IS_MS: u32 = 1 << 4;
    pub const PROPERTY_TYPE: u32 = IS_1D | IS_2D | IS_3D | IS_CUBE | IS_MS;

    pub const IS_ARRAY: u32 = 1 << 5;

    pub const GENERATE_MIPS: u32 = 1 << 6;
    pub const DO_COMPRESSION: u32 = 1 << 7;

    pub const IS_SRGB: u32 = 1 << 8;

    pub const IS_R: u32 = 1 << 9;
    pub const IS_RG: u32 = 1 << 10;
    pub const IS_RGB: u32 = 1 << 11;
    pub const IS_RGBA: u32 = 1 << 12;
    pub const PROPERTY_CHANNELS: u32 = IS_R | IS_RG | IS_RGB | IS_RGBA;

    pub const IS_SINT: u32 = 1 << 13;
    pub const IS_UINT: u32 = 1 << 14;
    pub const IS_UNORM: u32 = 1 << 15;
    pub const IS_SNORM: u32 = 1 << 16;
    pub const IS_FLOAT: u32 = 1 << 17;
    pub const PROPERTY_PRIMITIVE: u32 = IS_SINT | IS_UINT | IS_UNORM | IS_SNORM | IS_FLOAT;

    pub const IS_8_BIT: u32 = 1 << 18;
    pub const IS_16_BIT: u32 = 1 << 19;
    pub const IS_32_BIT: u32 = 1 << 20;
    pub const IS_64_BIT: u32 = 1 << 21;
    pub const PROPERTY_BITS: u32 = IS_8_BIT | IS_16_BIT | IS_32_BIT | IS_64_BIT;

    pub const MEMORY_SHARED: u32 = 1 << 22;
    pub const MEMORY_PREFER: u32 = 1 << 23;
    pub const MEMORY_CPU_WRITE: u32 = 1 << 24;
    pub const MEMORY_GPU_WRITE: u32 = 1 << 25;

    pub const MIP_NEAREST: u32 = 1 << 26;
    pub const MIP_MIN: u32 = 1 << 27;
    pub const MIP_MAX: u32 = 1 << 28;
    pub const PROPERTY_MIP_FILTER: u32 = MIP_NEAREST | MIP_MIN | MIP_MAX;

    pub const DEFAULT: u32 = GENERATE_MIPS | DO_COMPRESSION | IS_2D;
    pub const DEFAULT_NO_COMPRESSION: u32 = DEFAULT & !DO_COMPRESSION;
}

/// Base texture type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// Every image is read as a single row.
    OneD,
    #[default]
    TwoD,
    /// Images are depth slices of a volume.
    ThreeD,
    /// Six faces per array slice.
    Cube,
    /// Layers hold multisample indices.
    Multisample,
}

impl TextureDimension {
    /// Parse a dimension name (`1d`, `2d`, `3d`, `cube`, `ms`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "1d" => Some(TextureDimension::OneD),
            "2d" => Some(TextureDimension::TwoD),
            "3d" => Some(TextureDimension::ThreeD),
            "cube" => Some(TextureDimension::Cube),
            "ms" | "multisample" => Some(TextureDimension::Multisample),
            _ => None,
        }
    }

    /// Short lowercase name, the inverse of [`from_name`](Self::from_name).
    pub fn name(self) -> &'static str {
        match self {
            TextureDimension::OneD => "1d",
            TextureDimension::TwoD => "2d",
            TextureDimension::ThreeD => "3d",
            TextureDimension::Cube => "cube",
            TextureDimension::Multisample => "ms",
        }
    }
}

impl fmt::Display for TextureDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a texture's memory should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryLocation {
    /// Dedicated device memory.
    #[default]
    Local,
    /// Host-visible shared memory.
    Shared,
}

/// Memory placement and access hints carried into the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryUsage {
    pub location: MemoryLocation,
    /// The location is a preference rather than a requirement.
    pub prefer: bool,
    pub cpu_write: bool,
    pub gpu_write: bool,
}

impl MemoryUsage {
    /// Pack into one byte (bit 0 shared, 1 prefer, 2 cpu write, 3 gpu write).
    pub fn to_byte(self) -> u8 {
        (self.location == MemoryLocation::Shared) as u8
            | (self.prefer as u8) << 1
            | (self.cpu_write as u8) << 2
            | (self.gpu_write as u8) << 3
    }

    /// Inverse of [`to_byte`](Self::to_byte); unknown bits are ignored.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            location: if byte & 1 != 0 {
                MemoryLocation::Shared
            } else {
                MemoryLocation::Local
            },
            prefer: byte & 2 != 0,
            cpu_write: byte & 4 != 0,
            gpu_write: byte & 8 != 0,
        }
    }
}

/// Downsampling policy used when mips are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipFilter {
    /// Box average of each 2×2 (2×2×2 for volumes) footprint.
    #[default]
    Linear,
    /// First texel of each footprint.
    Nearest,
    /// Component-wise minimum.
    Min,
    /// Component-wise maximum.
    Max,
}

impl MipFilter {
    /// Parse a filter name (`linear`, `nearest`, `min`, `max`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linear" => Some(MipFilter::Linear),
            "nearest" => Some(MipFilter::Nearest),
            "min" => Some(MipFilter::Min),
            "max" => Some(MipFilter::Max),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MipFilter::Linear => "linear",
            MipFilter::Nearest => "nearest",
            MipFilter::Min => "min",
            MipFilter::Max => "max",
        }
    }
}

/// Parse a channel layout name (`r`, `rg`, `rgb`, `rgba`) into a channel count.
pub fn channels_from_name(name: &str) -> Option<u8> {
    match name.to_ascii_lowercase().as_str() {
        "r" => Some(1),
        "rg" => Some(2),
        "rgb" => Some(3),
        "rgba" => Some(4),
        _ => None,
    }
}

/// Typed conversion flags; one field per option group.
///
/// `None` in `channels`, `primitive` or `bits` means "inherit from the decoded
/// source image".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureFlags {
    pub dimension: TextureDimension,
    pub array: bool,
    pub generate_mips: bool,
    /// Compression hint; accepted but no compressed formats are produced.
    pub compress: bool,
    pub srgb: bool,
    pub channels: Option<u8>,
    pub primitive: Option<PrimitiveKind>,
    pub bits: Option<u8>,
    pub memory: MemoryUsage,
    pub mip_filter: MipFilter,
}

impl Default for TextureFlags {
    fn default() -> Self {
        Self {
            dimension: TextureDimension::TwoD,
            array: false,
            generate_mips: true,
            compress: true,
            srgb: false,
            channels: None,
            primitive: None,
            bits: None,
            memory: MemoryUsage::default(),
            mip_filter: MipFilter::Linear,
        }
    }
}

impl TextureFlags {
    /// Default flags without the compression hint.
    pub fn no_compression() -> Self {
        Self {
            compress: false,
            ..Self::default()
        }
    }

    /// Flags with every optional behavior off: 2D, no mips, no compression,
    /// everything inherited.
    pub fn none() -> Self {
        Self {
            generate_mips: false,
            compress: false,
            ..Self::default()
        }
    }

    pub fn with_dimension(mut self, dimension: TextureDimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_array(mut self, array: bool) -> Self {
        self.array = array;
        self
    }

    pub fn with_generate_mips(mut self, generate: bool) -> Self {
        self.generate_mips = generate;
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }

    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_primitive(mut self, primitive: PrimitiveKind) -> Self {
        self.primitive = Some(primitive);
        self
    }

    pub fn with_bits(mut self, bits: u8) -> Self {
        self.bits = Some(bits);
        self
    }

    pub fn with_memory(mut self, memory: MemoryUsage) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_mip_filter(mut self, filter: MipFilter) -> Self {
        self.mip_filter = filter;
        self
    }

    /// Decode a packed flag word.
    ///
    /// # Errors
    ///
    /// Returns the code of the first group (type, channels, primitive, bits,
    /// mip filter) that has more than one option set. Bits 29-31 are ignored.
    pub fn from_bits(word: u32) -> ConvertResult<Self> {
        use bits::*;
        const IS_MS_2D: u32 = IS_MS | IS_2D;

        let dimension = match word & PROPERTY_TYPE {
            0 | IS_2D => TextureDimension::TwoD,
            IS_1D => TextureDimension::OneD,
            IS_3D => TextureDimension::ThreeD,
            IS_CUBE => TextureDimension::Cube,
            IS_MS | IS_MS_2D => TextureDimension::Multisample,
            other => {
                return Err(ConvertError::InvalidType(format!(
                    "conflicting type bits {:#07b}",
                    other
                )))
            }
        };

        let array = word & IS_ARRAY != 0;
        if array && dimension == TextureDimension::ThreeD {
            return Err(ConvertError::InvalidType(
                "3D textures can't be arrays".to_string(),
            ));
        }

        let channels = match word & PROPERTY_CHANNELS {
            0 => None,
            IS_R => Some(1),
            IS_RG => Some(2),
            IS_RGB => Some(3),
            IS_RGBA => Some(4),
            other => {
                return Err(ConvertError::InvalidChannels(format!(
                    "conflicting channel bits {:#x}",
                    other
                )))
            }
        };

        let primitive = match word & PROPERTY_PRIMITIVE {
            0 => None,
            IS_SINT => Some(PrimitiveKind::Sint),
            IS_UINT => Some(PrimitiveKind::Uint),
            IS_UNORM => Some(PrimitiveKind::Unorm),
            IS_SNORM => Some(PrimitiveKind::Snorm),
            IS_FLOAT => Some(PrimitiveKind::Float),
            other => {
                return Err(ConvertError::InvalidPrimitive(format!(
                    "conflicting primitive bits {:#x}",
                    other
                )))
            }
        };

        let bit_depth = match word & PROPERTY_BITS {
            0 => None,
            IS_8_BIT => Some(8),
            IS_16_BIT => Some(16),
            IS_32_BIT => Some(32),
            IS_64_BIT => Some(64),
            other => {
                return Err(ConvertError::InvalidBits(format!(
                    "conflicting bit depth bits {:#x}",
                    other
                )))
            }
        };

        let mip_filter = match word & PROPERTY_MIP_FILTER {
            0 => MipFilter::Linear,
            MIP_NEAREST => MipFilter::Nearest,
            MIP_MIN => MipFilter::Min,
            MIP_MAX => MipFilter::Max,
            other => {
                return Err(ConvertError::InvalidOperation(format!(
                    "conflicting mip filter bits {:#x}",
                    other
                )))
            }
        };

        Ok(Self {
            dimension,
            array,
            generate_mips: word & GENERATE_MIPS != 0,
            compress: word & DO_COMPRESSION != 0,
            srgb: word & IS_SRGB != 0,
            channels,
            primitive,
            bits: bit_depth,
            memory: MemoryUsage {
                location: if word & MEMORY_SHARED != 0 {
                    MemoryLocation::Shared
                } else {
                    MemoryLocation::Local
                },
                prefer: word & MEMORY_PREFER != 0,
                cpu_write: word & MEMORY_CPU_WRITE != 0,
                gpu_write: word & MEMORY_GPU_WRITE != 0,
            },
            mip_filter,
        })
    }

    /// Encode into a packed flag word.
    ///
    /// Values outside a group's enumeration (e.g. 5 channels) have no bit and
    /// are dropped; they are rejected by the resolver instead.
    pub fn bits(&self) -> u32 {
        use bits::*;

        let mut word = match self.dimension {
            TextureDimension::OneD => IS_1D,
            TextureDimension::TwoD => IS_2D,
            TextureDimension::ThreeD => IS_3D,
            TextureDimension::Cube => IS_CUBE,
            TextureDimension::Multisample => IS_MS,
        };

        let switches = [
            (self.array, IS_ARRAY),
            (self.generate_mips, GENERATE_MIPS),
            (self.compress, DO_COMPRESSION),
            (self.srgb, IS_SRGB),
            (
                self.memory.location == MemoryLocation::Shared,
                MEMORY_SHARED,
            ),
            (self.memory.prefer, MEMORY_PREFER),
            (self.memory.cpu_write, MEMORY_CPU_WRITE),
            (self.memory.gpu_write, MEMORY_GPU_WRITE),
        ];
        for (on, bit) in switches {
            if on {
                word |= bit;
            }
        }

        word |= match self.channels {
            Some(1) => IS_R,
            Some(2) => IS_RG,
            Some(3) => IS_RGB,
            Some(4) => IS_RGBA,
            _ => 0,
        };
        word |= match self.primitive {
            Some(PrimitiveKind::Sint) => IS_SINT,
            Some(PrimitiveKind::Uint) => IS_UINT,
            Some(PrimitiveKind::Unorm) => IS_UNORM,
            Some(PrimitiveKind::Snorm) => IS_SNORM,
            Some(PrimitiveKind::Float) => IS_FLOAT,
            None => 0,
        };
        word |= match self.bits {
            Some(8) => IS_8_BIT,
            Some(16) => IS_16_BIT,
            Some(32) => IS_32_BIT,
            Some(64) => IS_64_BIT,
            _ => 0,
        };
        word |= match self.mip_filter {
            MipFilter::Linear => 0,
            MipFilter::Nearest => MIP_NEAREST,
            MipFilter::Min => MIP_MIN,
            MipFilter::Max => MIP_MAX,
        };
        word
    }

    /// Whether single-path conversion must discover sibling files.
    pub fn needs_addressing(&self) -> bool {
        self.array
            || !self.generate_mips
            || matches!(
                self.dimension,
                TextureDimension::ThreeD | TextureDimension::Cube | TextureDimension::Multisample
            )
    }
}
