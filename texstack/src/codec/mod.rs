//! External image codecs.
//!
//! A [`Codec`] turns encoded bytes (PNG, EXR, ...) into a [`DecodedImage`]
//! and a raw [`ImageView`] back into encoded bytes. Conversion and export only
//! see the trait, so tests can substitute fakes with restricted capabilities.
//!
//! ```text
//! ┌────────────────┐      ┌────────────────┐
//! │   Assembler    │      │    Exporter    │
//! └───────┬────────┘      └───────┬────────┘
//!         │ decode                │ encode
//!         ▼                       ▼
//! ┌─────────────────────────────────────────┐
//! │  CodecRegistry (priority ordered)       │
//! │   Arc<dyn Codec>, Arc<dyn Codec>, ...   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Pixel bytes crossing the trait are always little-endian.

mod capability;
mod image_codec;
mod registry;

use std::fmt;

pub use capability::ExternalCapability;
pub use image_codec::ImageCodec;
pub use registry::CodecRegistry;

use crate::error::{ConvertError, ConvertResult};
use crate::format::{PixelFormat, PrimitiveKind};

/// Errors raised by a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The bytes aren't in this codec's encoding or are corrupt.
    DecodeFailed(String),
    /// Encoding failed.
    EncodeFailed(String),
    /// The image's layout can't be represented by this codec.
    UnsupportedLayout(String),
    /// No registered codec accepted the bytes.
    NoCodec,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::DecodeFailed(msg) => write!(f, "Decoding failed: {}", msg),
            CodecError::EncodeFailed(msg) => write!(f, "Encoding failed: {}", msg),
            CodecError::UnsupportedLayout(msg) => write!(f, "Unsupported layout: {}", msg),
            CodecError::NoCodec => write!(f, "No codec recognizes the data"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for ConvertError {
    fn from(err: CodecError) -> Self {
        ConvertError::InvalidFileData(err.to_string())
    }
}

/// An image as produced by a codec.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Bits per channel.
    pub bits: u8,
    pub is_float: bool,
    /// Tightly packed little-endian samples, row-major.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Pixel format of the decoded samples: floats stay float, everything
    /// else is treated as UNORM.
    pub fn format(&self) -> ConvertResult<PixelFormat> {
        let primitive = if self.is_float {
            PrimitiveKind::Float
        } else {
            PrimitiveKind::Unorm
        };
        PixelFormat::new(self.channels, self.bits, primitive, false)
    }
}

/// Borrowed raw image handed to an encoder.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Tightly packed little-endian samples, row-major.
    pub pixels: &'a [u8],
}

/// An external image encoding.
pub trait Codec: Send + Sync {
    /// Human-readable name, e.g. `PNG`.
    fn name(&self) -> &str;

    /// File extension without the dot.
    fn extension(&self) -> &str;

    /// What this codec can encode.
    fn capability(&self) -> ExternalCapability;

    /// Cheap check whether `bytes` look like this codec's encoding.
    fn can_decode(&self, bytes: &[u8]) -> bool;

    /// Decode a whole image.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Encode a raw image; `quality` is in (0, 1], with 1 meaning lossless.
    fn encode(&self, image: &ImageView<'_>, quality: f32) -> Result<Vec<u8>, CodecError>;
}
