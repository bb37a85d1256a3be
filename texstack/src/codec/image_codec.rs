//! Codecs backed by the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};

use super::{Codec, CodecError, DecodedImage, ExternalCapability, ImageView};
use crate::format::PrimitiveKind;

const ALL_CHANNELS: ExternalCapability = ExternalCapability::R
    .union(ExternalCapability::RG)
    .union(ExternalCapability::RGB)
    .union(ExternalCapability::RGBA);

/// An external encoding implemented by the `image` crate.
///
/// # Example
///
/// ```
/// use texstack::codec::{Codec, ImageCodec};
///
/// let png = ImageCodec::png();
/// assert_eq!(png.extension(), "png");
/// assert_eq!(png.name(), "PNG");
/// ```
#[derive(Debug, Clone)]
pub struct ImageCodec {
    format: ImageFormat,
    name: &'static str,
    extension: &'static str,
    capability: ExternalCapability,
}

impl ImageCodec {
    /// PNG: 8/16-bit UNORM, 1-4 channels, lossless.
    pub fn png() -> Self {
        Self {
            format: ImageFormat::Png,
            name: "PNG",
            extension: "png",
            capability: ExternalCapability::UNORM
                | ExternalCapability::BITS_8
                | ExternalCapability::BITS_16
                | ALL_CHANNELS
                | ExternalCapability::LOSSLESS,
        }
    }

    /// OpenEXR: 32-bit float RGB/RGBA, lossless.
    pub fn open_exr() -> Self {
        Self {
            format: ImageFormat::OpenExr,
            name: "OpenEXR",
            extension: "exr",
            capability: ExternalCapability::FLOAT
                | ExternalCapability::BITS_32
                | ExternalCapability::RGB
                | ExternalCapability::RGBA
                | ExternalCapability::LOSSLESS,
        }
    }

    /// Truevision TGA: 8-bit UNORM, 1-4 channels, lossless.
    pub fn tga() -> Self {
        Self {
            format: ImageFormat::Tga,
            name: "TGA",
            extension: "tga",
            capability: ExternalCapability::UNORM
                | ExternalCapability::BITS_8
                | ALL_CHANNELS
                | ExternalCapability::LOSSLESS,
        }
    }

    /// Windows bitmap: 8-bit UNORM RGB/RGBA, lossless. Gray layouts come
    /// back as RGB, so they aren't claimed.
    pub fn bmp() -> Self {
        Self {
            format: ImageFormat::Bmp,
            name: "BMP",
            extension: "bmp",
            capability: ExternalCapability::UNORM
                | ExternalCapability::BITS_8
                | ExternalCapability::RGB
                | ExternalCapability::RGBA
                | ExternalCapability::LOSSLESS,
        }
    }

    /// JPEG: 8-bit UNORM gray or RGB, lossy only.
    pub fn jpeg() -> Self {
        Self {
            format: ImageFormat::Jpeg,
            name: "JPEG",
            extension: "jpg",
            capability: ExternalCapability::UNORM
                | ExternalCapability::BITS_8
                | ExternalCapability::R
                | ExternalCapability::RGB
                | ExternalCapability::LOSSY,
        }
    }

    /// Radiance HDR: shared-exponent RGB float, lossy.
    pub fn hdr() -> Self {
        Self {
            format: ImageFormat::Hdr,
            name: "HDR",
            extension: "hdr",
            capability: ExternalCapability::FLOAT
                | ExternalCapability::BITS_32
                | ExternalCapability::RGB
                | ExternalCapability::LOSSY,
        }
    }

    /// Every built-in codec in export priority order.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::png(),
            Self::open_exr(),
            Self::tga(),
            Self::bmp(),
            Self::jpeg(),
            Self::hdr(),
        ]
    }

    /// The `image` crate format this codec wraps.
    pub fn image_format(&self) -> ImageFormat {
        self.format
    }
}

/// `image` color type for a raw layout, if it has one.
fn color_type(view: &ImageView<'_>) -> Result<ExtendedColorType, CodecError> {
    let format = view.format.linear();
    let color = match (format.primitive(), format.bits(), format.channels()) {
        (PrimitiveKind::Unorm, 8, 1) => ExtendedColorType::L8,
        (PrimitiveKind::Unorm, 8, 2) => ExtendedColorType::La8,
        (PrimitiveKind::Unorm, 8, 3) => ExtendedColorType::Rgb8,
        (PrimitiveKind::Unorm, 8, 4) => ExtendedColorType::Rgba8,
        (PrimitiveKind::Unorm, 16, 1) => ExtendedColorType::L16,
        (PrimitiveKind::Unorm, 16, 2) => ExtendedColorType::La16,
        (PrimitiveKind::Unorm, 16, 3) => ExtendedColorType::Rgb16,
        (PrimitiveKind::Unorm, 16, 4) => ExtendedColorType::Rgba16,
        (PrimitiveKind::Float, 32, 3) => ExtendedColorType::Rgb32F,
        (PrimitiveKind::Float, 32, 4) => ExtendedColorType::Rgba32F,
        _ => {
            return Err(CodecError::UnsupportedLayout(format!(
                "{} has no external color type",
                view.format
            )))
        }
    };
    Ok(color)
}

/// Reorder little-endian samples into native order for the `image` encoders.
fn native_samples(pixels: &[u8], sample_bytes: usize) -> Vec<u8> {
    let mut out = pixels.to_vec();
    if cfg!(target_endian = "big") && sample_bytes > 1 {
        for sample in out.chunks_exact_mut(sample_bytes) {
            sample.reverse();
        }
    }
    out
}

fn le_bytes_u16(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn le_bytes_f32(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

impl Codec for ImageCodec {
    fn name(&self) -> &str {
        self.name
    }

    fn extension(&self) -> &str {
        self.extension
    }

    fn capability(&self) -> ExternalCapability {
        self.capability
    }

    fn can_decode(&self, bytes: &[u8]) -> bool {
        image::guess_format(bytes)
            .map(|f| f == self.format)
            .unwrap_or(false)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let image = image::load_from_memory_with_format(bytes, self.format)
            .map_err(|e| CodecError::DecodeFailed(format!("{}: {}", self.name, e)))?;

        let (width, height) = (image.width(), image.height());
        let (channels, bits, is_float, pixels) = match image {
            DynamicImage::ImageLuma8(img) => (1, 8, false, img.into_raw()),
            DynamicImage::ImageLumaA8(img) => (2, 8, false, img.into_raw()),
            DynamicImage::ImageRgb8(img) => (3, 8, false, img.into_raw()),
            DynamicImage::ImageRgba8(img) => (4, 8, false, img.into_raw()),
            DynamicImage::ImageLuma16(img) => (1, 16, false, le_bytes_u16(img.as_raw())),
            DynamicImage::ImageLumaA16(img) => (2, 16, false, le_bytes_u16(img.as_raw())),
            DynamicImage::ImageRgb16(img) => (3, 16, false, le_bytes_u16(img.as_raw())),
            DynamicImage::ImageRgba16(img) => (4, 16, false, le_bytes_u16(img.as_raw())),
            DynamicImage::ImageRgb32F(img) => (3, 32, true, le_bytes_f32(img.as_raw())),
            DynamicImage::ImageRgba32F(img) => (4, 32, true, le_bytes_f32(img.as_raw())),
            other => {
                return Err(CodecError::UnsupportedLayout(format!(
                    "{} decoded to {:?}",
                    self.name,
                    other.color()
                )))
            }
        };

        Ok(DecodedImage {
            width,
            height,
            channels,
            bits,
            is_float,
            pixels,
        })
    }

    fn encode(&self, view: &ImageView<'_>, quality: f32) -> Result<Vec<u8>, CodecError> {
        let color = color_type(view)?;
        let expected = view.width as usize * view.height as usize * view.format.stride();
        if view.pixels.len() != expected {
            return Err(CodecError::EncodeFailed(format!(
                "{}×{} {} needs {} bytes, got {}",
                view.width,
                view.height,
                view.format,
                expected,
                view.pixels.len()
            )));
        }

        let samples = native_samples(view.pixels, view.format.channel_bytes());
        let mut out = Cursor::new(Vec::new());

        let result = if self.format == ImageFormat::Jpeg {
            let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            JpegEncoder::new_with_quality(&mut out, q).write_image(
                &samples,
                view.width,
                view.height,
                color,
            )
        } else {
            image::write_buffer_with_format(
                &mut out,
                &samples,
                view.width,
                view.height,
                color,
                self.format,
            )
        };
        result.map_err(|e| CodecError::EncodeFailed(format!("{}: {}", self.name, e)))?;

        Ok(out.into_inner())
    }
}
