//! What an external encoding can store.

use std::fmt;
use std::ops::BitOr;

use crate::format::PrimitiveKind;

/// Bit set of primitive kinds, bit depths and channel counts an external
/// encoding can hold, plus whether it encodes losslessly, lossily, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExternalCapability(u16);

impl ExternalCapability {
    pub const UINT: Self = Self(1 << 0);
    pub const SINT: Self = Self(1 << 1);
    pub const UNORM: Self = Self(1 << 2);
    pub const SNORM: Self = Self(1 << 3);
    pub const FLOAT: Self = Self(1 << 4);

    pub const BITS_8: Self = Self(1 << 5);
    pub const BITS_16: Self = Self(1 << 6);
    pub const BITS_32: Self = Self(1 << 7);
    pub const BITS_64: Self = Self(1 << 8);

    pub const R: Self = Self(1 << 9);
    pub const RG: Self = Self(1 << 10);
    pub const RGB: Self = Self(1 << 11);
    pub const RGBA: Self = Self(1 << 12);

    pub const LOSSLESS: Self = Self(1 << 13);
    pub const LOSSY: Self = Self(1 << 14);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Bit for a primitive kind.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Uint => Self::UINT,
            PrimitiveKind::Sint => Self::SINT,
            PrimitiveKind::Unorm => Self::UNORM,
            PrimitiveKind::Snorm => Self::SNORM,
            PrimitiveKind::Float => Self::FLOAT,
        }
    }

    /// Bit for a bit depth; empty for depths with no bit.
    pub fn bit_depth(bits: u8) -> Self {
        match bits {
            8 => Self::BITS_8,
            16 => Self::BITS_16,
            32 => Self::BITS_32,
            64 => Self::BITS_64,
            _ => Self::empty(),
        }
    }

    /// Bit for a channel count; empty for counts with no bit.
    pub fn channel_count(channels: u8) -> Self {
        match channels {
            1 => Self::R,
            2 => Self::RG,
            3 => Self::RGB,
            4 => Self::RGBA,
            _ => Self::empty(),
        }
    }
}

impl BitOr for ExternalCapability {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for ExternalCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ExternalCapability, &str); 15] = [
            (ExternalCapability::UINT, "uint"),
            (ExternalCapability::SINT, "sint"),
            (ExternalCapability::UNORM, "unorm"),
            (ExternalCapability::SNORM, "snorm"),
            (ExternalCapability::FLOAT, "float"),
            (ExternalCapability::BITS_8, "8"),
            (ExternalCapability::BITS_16, "16"),
            (ExternalCapability::BITS_32, "32"),
            (ExternalCapability::BITS_64, "64"),
            (ExternalCapability::R, "r"),
            (ExternalCapability::RG, "rg"),
            (ExternalCapability::RGB, "rgb"),
            (ExternalCapability::RGBA, "rgba"),
            (ExternalCapability::LOSSLESS, "lossless"),
            (ExternalCapability::LOSSY, "lossy"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}
