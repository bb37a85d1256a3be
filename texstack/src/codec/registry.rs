//! Priority-ordered codec table.

use std::sync::Arc;

use tracing::trace;

use super::{Codec, CodecError, DecodedImage, ImageCodec};

/// Read-only list of codecs in priority order.
///
/// Decoding tries the first codec that recognizes the bytes, then every
/// codec in order for encodings without a signature (TGA). Export uses the
/// first codec whose capability fits.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Registry with the built-in codecs (PNG, OpenEXR, TGA, BMP, JPEG, HDR).
    pub fn with_defaults() -> Self {
        ImageCodec::defaults()
            .into_iter()
            .fold(Self::empty(), |registry, codec| registry.with_codec(Arc::new(codec)))
    }

    /// Append a codec at the lowest priority.
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codecs.push(codec);
        self
    }

    /// Codecs in priority order.
    pub fn codecs(&self) -> &[Arc<dyn Codec>] {
        &self.codecs
    }

    /// Codec by file extension (case-insensitive).
    pub fn by_extension(&self, ext: &str) -> Option<&Arc<dyn Codec>> {
        self.codecs
            .iter()
            .find(|c| c.extension().eq_ignore_ascii_case(ext))
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Decode with the first codec that accepts the bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        if let Some(codec) = self.codecs.iter().find(|c| c.can_decode(bytes)) {
            trace!(codec = codec.name(), "Decoding by signature");
            return codec.decode(bytes);
        }

        let mut last_error = CodecError::NoCodec;
        for codec in &self.codecs {
            match codec.decode(bytes) {
                Ok(image) => {
                    trace!(codec = codec.name(), "Decoded without signature");
                    return Ok(image);
                }
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.codecs.iter().map(|c| c.name()).collect();
        f.debug_struct("CodecRegistry").field("codecs", &names).finish()
    }
}
