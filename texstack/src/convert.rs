//! Source decoding and pixel conversion.
//!
//! [`PixelConverter`] reads one source (an encoded file or a subresource of
//! an existing container), checks it against the texture's dimension rules,
//! and converts it into the resolved pixel format. The only conversions
//! performed are:
//!
//! - none, when the source already has the target format
//! - an sRGB relabel of 8-bit RGB/RGBA UNORM data
//! - a float width change between 16, 32 and 64-bit FLOAT with the same
//!   channel count
//!
//! Narrowing floats saturates to the largest finite value of the target width
//! (infinities included) and turns NaN into zero.

use tracing::trace;

use crate::address::{mip_extent, FileDescriptor, ImageSource, SubresourceKey};
use crate::codec::CodecRegistry;
use crate::error::{ConvertError, ConvertResult};
use crate::flags::TextureDimension;
use crate::format::{sample, PixelFormat, PrimitiveKind};
use crate::resolve::FormatRule;
use crate::store::FileStore;

/// Largest accepted encoded source, exclusive.
pub const MAX_SOURCE_BYTES: usize = 1 << 31;

/// Largest accepted width or height, exclusive.
pub const MAX_IMAGE_EXTENT: u32 = 0xFFFF;

/// One source converted into the target format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Little-endian samples, row-major.
    pub pixels: Vec<u8>,
}

/// Raw source pixels before conversion.
struct SourceImage {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

/// Decodes and converts the sources of one conversion.
///
/// The first converted image fixes the base size and the target format; every
/// later image must agree with it.
pub struct PixelConverter<'a> {
    codecs: &'a CodecRegistry,
    store: &'a dyn FileStore,
    rule: FormatRule,
    dimension: TextureDimension,
    base: Option<(u32, u32, PixelFormat)>,
}

impl<'a> PixelConverter<'a> {
    pub fn new(
        codecs: &'a CodecRegistry,
        store: &'a dyn FileStore,
        rule: FormatRule,
        dimension: TextureDimension,
    ) -> Self {
        Self {
            codecs,
            store,
            rule,
            dimension,
            base: None,
        }
    }

    /// Base size and format, once the first image is converted.
    pub fn base(&self) -> Option<(u32, u32, PixelFormat)> {
        self.base
    }

    /// Read, check and convert the source of one descriptor.
    ///
    /// # Errors
    ///
    /// - `INVALID_FILE_PATH` when the file can't be read
    /// - `INVALID_FILE_BOUNDS` for empty or oversized sources
    /// - `INVALID_FILE_DATA` when no codec decodes the bytes
    /// - `INVALID_IMAGE_SIZE` for zero or oversized dimensions
    /// - `INVALID_FORMAT` when the inherited format is illegal
    /// - `CONFLICTING_IMAGE_SIZE` / `CONFLICTING_IMAGE_FORMAT` against the first image
    /// - `INCOMPATIBLE_FORMATS` when the source can't become the target format
    pub fn convert(&mut self, descriptor: &FileDescriptor<'_>) -> ConvertResult<ConvertedImage> {
        let source = self.load(&descriptor.source, descriptor.key)?;
        let source = self.reshape(source)?;
        let target = self.rule.finalize(&source.format)?;

        match self.base {
            None => self.base = Some((source.width, source.height, target)),
            Some((width, height, format)) => {
                let (w, h) = (
                    mip_extent(width, descriptor.key.mip),
                    mip_extent(height, descriptor.key.mip),
                );
                if (source.width, source.height) != (w, h) {
                    return Err(ConvertError::ConflictingImageSize {
                        width: w,
                        height: h,
                        actual_width: source.width,
                        actual_height: source.height,
                    });
                }
                if target != format {
                    return Err(ConvertError::ConflictingImageFormat {
                        expected: format,
                        actual: target,
                    });
                }
            }
        }

        let pixels = convert_pixels(source.pixels, &source.format, &target)?;
        trace!(
            key = %descriptor.key,
            width = source.width,
            height = source.height,
            format = %target,
            "Converted source image"
        );
        Ok(ConvertedImage {
            width: source.width,
            height: source.height,
            format: target,
            pixels,
        })
    }

    fn load(&self, source: &ImageSource<'_>, key: SubresourceKey) -> ConvertResult<SourceImage> {
        match *source {
            ImageSource::Path(path) => {
                let bytes = self.store.read(path)?;
                if bytes.is_empty() || bytes.len() >= MAX_SOURCE_BYTES {
                    return Err(ConvertError::InvalidFileBounds { len: bytes.len() });
                }
                let decoded = self.codecs.decode(&bytes).map_err(|e| {
                    ConvertError::InvalidFileData(format!("{}: {}", path.display(), e))
                })?;
                Ok(SourceImage {
                    width: decoded.width,
                    height: decoded.height,
                    format: decoded.format()?,
                    pixels: decoded.pixels,
                })
            }
            ImageSource::Container { container, format } => {
                let view = container.view(format, key)?;
                Ok(SourceImage {
                    width: view.width,
                    height: view.height,
                    format: view.format,
                    pixels: view.pixels.to_vec(),
                })
            }
        }
    }

    /// Apply 1D reinterpretation and the dimension limits.
    fn reshape(&self, mut source: SourceImage) -> ConvertResult<SourceImage> {
        if self.dimension == TextureDimension::OneD {
            let width = source.width as u64 * source.height as u64;
            if width >= MAX_IMAGE_EXTENT as u64 {
                return Err(ConvertError::InvalidImageSize(format!(
                    "{}×{} is too long for a 1D texture",
                    source.width, source.height
                )));
            }
            source.width = width as u32;
            source.height = 1;
        }

        let valid = |d: u32| d > 0 && d < MAX_IMAGE_EXTENT;
        if !valid(source.width) || !valid(source.height) {
            return Err(ConvertError::InvalidImageSize(format!(
                "{}×{} (each side must be 1-{})",
                source.width,
                source.height,
                MAX_IMAGE_EXTENT - 1
            )));
        }
        Ok(source)
    }
}

/// Convert raw pixels between two formats, or fail with
/// `INCOMPATIBLE_FORMATS`.
pub fn convert_pixels(
    pixels: Vec<u8>,
    from: &PixelFormat,
    to: &PixelFormat,
) -> ConvertResult<Vec<u8>> {
    // Same bytes: identical format or an sRGB relabel.
    if from.linear() == to.linear() {
        return Ok(pixels);
    }

    let float_resize = from.primitive() == PrimitiveKind::Float
        && to.primitive() == PrimitiveKind::Float
        && from.channels() == to.channels()
        && from.bits() >= 16
        && to.bits() >= 16;
    if !float_resize {
        return Err(ConvertError::IncompatibleFormats {
            from: *from,
            to: *to,
        });
    }

    let (src_bytes, dst_bytes) = (from.channel_bytes(), to.channel_bytes());
    let samples = pixels.len() / src_bytes;
    let mut out = vec![0u8; samples * dst_bytes];
    for (src, dst) in pixels
        .chunks_exact(src_bytes)
        .zip(out.chunks_exact_mut(dst_bytes))
    {
        sample::write(to, sample::read(from, src), dst);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, ImageCodec, ImageView};
    use crate::flags::TextureFlags;
    use crate::format::half::f32_to_f16;
    use crate::resolve::resolve;
    use crate::store::MemoryFileStore;
    use std::path::Path;

    fn float(channels: u8, bits: u8) -> PixelFormat {
        PixelFormat::new(channels, bits, PrimitiveKind::Float, false).unwrap()
    }

    fn unorm(channels: u8, bits: u8) -> PixelFormat {
        PixelFormat::new(channels, bits, PrimitiveKind::Unorm, false).unwrap()
    }

    fn png(width: u32, height: u32, format: PixelFormat) -> Vec<u8> {
        let pixels: Vec<u8> = (0..width as usize * height as usize * format.stride())
            .map(|i| i as u8)
            .collect();
        ImageCodec::png()
            .encode(
                &ImageView {
                    width,
                    height,
                    format,
                    pixels: &pixels,
                },
                1.0,
            )
            .unwrap()
    }

    fn converter<'a>(
        codecs: &'a CodecRegistry,
        store: &'a MemoryFileStore,
        flags: TextureFlags,
    ) -> PixelConverter<'a> {
        let resolution = resolve(&flags).unwrap();
        PixelConverter::new(codecs, store, resolution.rule, flags.dimension)
    }

    fn at(path: &Path) -> FileDescriptor<'_> {
        FileDescriptor::path(path, SubresourceKey::default())
    }

    // ========================================================================
    // Pixel conversion
    // ========================================================================

    #[test]
    fn test_identity_and_srgb_relabel_keep_bytes() {
        let bytes = vec![1, 2, 3, 4];
        assert_eq!(
            convert_pixels(bytes.clone(), &unorm(4, 8), &unorm(4, 8)).unwrap(),
            bytes
        );
        let srgb = PixelFormat::new(4, 8, PrimitiveKind::Unorm, true).unwrap();
        assert_eq!(convert_pixels(bytes.clone(), &unorm(4, 8), &srgb).unwrap(), bytes);
    }

    #[test]
    fn test_float_narrowing_saturates() {
        let values = [1.5f32, 1.0e6, f32::INFINITY, f32::NEG_INFINITY, f32::NAN];
        let pixels: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let out = convert_pixels(pixels, &float(1, 32), &float(1, 16)).unwrap();
        let halves: Vec<u16> = out
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(
            halves,
            vec![f32_to_f16(1.5), 0x7BFF, 0x7BFF, 0xFBFF, 0x0000]
        );
    }

    #[test]
    fn test_float_widening_is_exact() {
        let pixels: Vec<u8> = [0.1f32, -2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let out = convert_pixels(pixels, &float(2, 32), &float(2, 64)).unwrap();
        let first = f64::from_le_bytes(out[..8].try_into().unwrap());
        assert_eq!(first, 0.1f32 as f64);
    }

    #[test]
    fn test_other_changes_are_incompatible() {
        let pairs = [
            (unorm(4, 8), unorm(4, 16)),
            (unorm(4, 8), unorm(3, 8)),
            (float(4, 32), float(3, 32)),
            (unorm(1, 16), float(1, 16)),
        ];
        for (from, to) in pairs {
            let err = convert_pixels(vec![0; from.stride()], &from, &to).unwrap_err();
            assert_eq!(err.code(), 0x0F, "{} -> {}", from, to);
        }
    }

    // ========================================================================
    // Sources
    // ========================================================================

    #[test]
    fn test_empty_source_is_out_of_bounds() {
        let codecs = CodecRegistry::with_defaults();
        let store = MemoryFileStore::new();
        store.insert("empty.png", vec![]);
        let mut c = converter(&codecs, &store, TextureFlags::none());
        let err = c.convert(&at(Path::new("empty.png"))).unwrap_err();
        assert_eq!(err, ConvertError::InvalidFileBounds { len: 0 });
    }

    #[test]
    fn test_garbage_is_invalid_file_data() {
        let codecs = CodecRegistry::with_defaults();
        let store = MemoryFileStore::new();
        store.insert("bad.png", b"definitely not a png".to_vec());
        let mut c = converter(&codecs, &store, TextureFlags::none());
        assert_eq!(c.convert(&at(Path::new("bad.png"))).unwrap_err().code(), 0x07);
    }

    #[test]
    fn test_missing_file_is_invalid_file_path() {
        let codecs = CodecRegistry::with_defaults();
        let store = MemoryFileStore::new();
        let mut c = converter(&codecs, &store, TextureFlags::none());
        assert_eq!(c.convert(&at(Path::new("nope.png"))).unwrap_err().code(), 0x06);
    }

    #[test]
    fn test_one_d_reshapes_rows() {
        let codecs = CodecRegistry::with_defaults();
        let store = MemoryFileStore::new();
        store.insert("strip.png", png(4, 3, unorm(1, 8)));
        let flags = TextureFlags::none().with_dimension(TextureDimension::OneD);
        let mut c = converter(&codecs, &store, flags);
        let image = c.convert(&at(Path::new("strip.png"))).unwrap();
        assert_eq!((image.width, image.height), (12, 1));
        assert_eq!(image.pixels, (0..12).collect::<Vec<u8>>());
    }

    #[test]
    fn test_later_images_must_match_first() {
        let codecs = CodecRegistry::with_defaults();
        let store = MemoryFileStore::new();
        store.insert("a.png", png(4, 4, unorm(4, 8)));
        store.insert("b.png", png(8, 4, unorm(4, 8)));
        store.insert("c.png", png(4, 4, unorm(3, 8)));
        let mut c = converter(&codecs, &store, TextureFlags::none());

        c.convert(&at(Path::new("a.png"))).unwrap();
        assert_eq!(c.convert(&at(Path::new("b.png"))).unwrap_err().code(), 0x41);
        assert_eq!(c.convert(&at(Path::new("c.png"))).unwrap_err().code(), 0x42);
    }

    #[test]
    fn test_later_mips_use_halved_size() {
        let codecs = CodecRegistry::with_defaults();
        let store = MemoryFileStore::new();
        store.insert("m0.png", png(8, 4, unorm(1, 8)));
        store.insert("m1.png", png(4, 2, unorm(1, 8)));
        let mut c = converter(&codecs, &store, TextureFlags::none());

        c.convert(&at(Path::new("m0.png"))).unwrap();
        let mip1 = FileDescriptor::path(Path::new("m1.png"), SubresourceKey::new(0, 0, 1));
        assert_eq!(c.convert(&mip1).unwrap().width, 4);
    }

    #[test]
    fn test_fixed_format_mismatch_is_incompatible() {
        let codecs = CodecRegistry::with_defaults();
        let store = MemoryFileStore::new();
        store.insert("a.png", png(2, 2, unorm(4, 8)));
        let mut c = converter(&codecs, &store, TextureFlags::none().with_bits(16));
        assert_eq!(c.convert(&at(Path::new("a.png"))).unwrap_err().code(), 0x0F);
    }
}
