//! Exporting containers to external image encodings.
//!
//! Every stored format is matched against the codec table in priority order;
//! the first codec whose capability holds the format at the requested quality
//! encodes one image per subresource. Formats nothing can hold are reported
//! back instead of failing the export.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::address::SubresourceKey;
use crate::codec::{Codec, CodecError, CodecRegistry, ExternalCapability};
use crate::container::Container;
use crate::format::PixelFormat;
use crate::store::{FileStore, LocalFileStore};

/// Whether an encoding with `capability` can hold `format` at `quality`.
///
/// `quality` must be in (0, 1]; 1 asks for a lossless encoding. sRGB formats
/// are checked as the 8-bit UNORM data they store.
pub fn supports(capability: ExternalCapability, format: &PixelFormat, quality: f32) -> bool {
    if !(quality > 0.0 && quality <= 1.0) {
        return false;
    }
    let format = format.linear();
    let mode = if quality == 1.0 {
        ExternalCapability::LOSSLESS
    } else {
        ExternalCapability::LOSSY
    };
    let bit_depth = ExternalCapability::bit_depth(format.bits());
    let channels = ExternalCapability::channel_count(format.channels());
    if bit_depth.bits() == 0 || channels.bits() == 0 {
        return false;
    }
    capability.contains(
        ExternalCapability::primitive(format.primitive()) | bit_depth | channels | mode,
    )
}

/// One encoded subresource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// Name suffix including the extension, e.g. `_1_2.png`.
    pub name: String,
    pub key: SubresourceKey,
    pub bytes: Vec<u8>,
}

/// Result of an in-memory export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutput {
    pub images: BTreeMap<PixelFormat, Vec<ExportedImage>>,
    /// Formats that couldn't be encoded, in container order.
    pub unsupported: Vec<PixelFormat>,
}

impl ExportOutput {
    /// Whether every format was exported.
    pub fn is_complete(&self) -> bool {
        self.unsupported.is_empty()
    }
}

/// Encodes containers into external image files.
#[derive(Clone)]
pub struct ExternalFormatExporter {
    codecs: CodecRegistry,
    store: Arc<dyn FileStore>,
}

impl Default for ExternalFormatExporter {
    fn default() -> Self {
        Self::new(CodecRegistry::with_defaults(), Arc::new(LocalFileStore::new()))
    }
}

impl ExternalFormatExporter {
    pub fn new(codecs: CodecRegistry, store: Arc<dyn FileStore>) -> Self {
        Self { codecs, store }
    }

    /// First codec that can hold `format` at `quality`.
    pub fn select(&self, format: &PixelFormat, quality: f32) -> Option<&Arc<dyn Codec>> {
        self.codecs
            .codecs()
            .iter()
            .find(|codec| supports(codec.capability(), format, quality))
    }

    /// Encode every subresource of every supported format.
    ///
    /// An encode failure drops the whole format into `unsupported`.
    pub fn to_memory(&self, container: &Container, quality: f32) -> ExportOutput {
        let mut output = ExportOutput::default();
        let namer = Namer::new(container);

        for (index, format) in container.formats().iter().enumerate() {
            let Some(codec) = self.select(format, quality) else {
                warn!(format = %format, quality, "No encoding supports format");
                output.unsupported.push(*format);
                continue;
            };
            debug!(format = %format, codec = codec.name(), "Selected encoding");

            match encode_format(container, index, codec.as_ref(), quality, &namer) {
                Ok(images) => {
                    output.images.insert(*format, images);
                }
                Err(e) => {
                    warn!(format = %format, codec = codec.name(), error = %e, "Encoding failed");
                    output.unsupported.push(*format);
                }
            }
        }
        output
    }

    /// Encode and write every subresource as `base` + name suffix.
    ///
    /// Returns the formats that weren't fully written: no encoding, an encode
    /// failure or a write failure. Never stops early.
    pub fn to_disk(&self, container: &Container, base: &Path, quality: f32) -> Vec<PixelFormat> {
        let output = self.to_memory(container, quality);
        let mut failed = output.unsupported;
        let mut written = 0usize;

        for (format, images) in &output.images {
            for image in images {
                let path = suffixed(base, &image.name);
                if let Err(e) = self.store.write(&path, &image.bytes) {
                    warn!(path = %path.display(), error = %e, "Failed to write image");
                    if !failed.contains(format) {
                        failed.push(*format);
                    }
                    continue;
                }
                written += 1;
            }
        }

        info!(
            base = %base.display(),
            written,
            failed = failed.len(),
            "Export finished"
        );
        failed
    }
}

impl std::fmt::Debug for ExternalFormatExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalFormatExporter")
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

fn encode_format(
    container: &Container,
    index: usize,
    codec: &dyn Codec,
    quality: f32,
    namer: &Namer,
) -> Result<Vec<ExportedImage>, CodecError> {
    let format = container.formats()[index];
    container
        .keys()
        .into_iter()
        .map(|key| {
            let view = container
                .view(index, key)
                .map_err(|e| CodecError::EncodeFailed(e.to_string()))?;
            let bytes = codec.encode(&view, quality)?;
            Ok(ExportedImage {
                name: namer.name(key, &format, codec.extension()),
                key,
                bytes,
            })
        })
        .collect()
}

/// Builds name suffixes from the axes that vary in a container.
struct Namer {
    depth: bool,
    layers: bool,
    mips: bool,
    formats: bool,
}

impl Namer {
    fn new(container: &Container) -> Self {
        let geometry = container.geometry();
        Self {
            depth: geometry.depth > 1,
            layers: geometry.layers > 1,
            mips: geometry.mips > 1,
            formats: container.formats().len() > 1,
        }
    }

    fn name(&self, key: SubresourceKey, format: &PixelFormat, extension: &str) -> String {
        let mut name = String::new();
        if self.depth {
            name.push_str(&format!("_{}", key.z));
        }
        if self.layers {
            name.push_str(&format!("_{}", key.layer));
        }
        if self.mips {
            name.push_str(&format!("_{}", key.mip));
        }
        if self.formats {
            name.push_str(&format!("_{}", format.name()));
        }
        name.push('.');
        name.push_str(extension);
        name
    }
}

fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}
