//! Container persistence.
//!
//! File layout:
//!
//! ```text
//! "TXSK"            magic
//! u16 LE            version
//! bincode body      header + per-format, per-mip buffers
//! ```
//!
//! The body is re-validated against the layout rules on load, so a file that
//! deserializes but doesn't describe a consistent texture is rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Container;
use crate::address::{Geometry, SubresourceKey, CUBE_FACES};
use crate::convert::MAX_IMAGE_EXTENT;
use crate::error::{ConvertError, ConvertResult};
use crate::flags::{MemoryUsage, TextureDimension};
use crate::format::PixelFormat;
use crate::resolve::TextureType;
use crate::store::FileStore;

/// Leading bytes of every container file.
pub const CONTAINER_MAGIC: [u8; 4] = *b"TXSK";

/// Current container file version.
pub const CONTAINER_VERSION: u16 = 1;

const PREAMBLE_LEN: usize = CONTAINER_MAGIC.len() + 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FileHeader {
    texture_type: u8,
    memory: u8,
    width: u32,
    height: u32,
    depth: u16,
    layers: u16,
    mips: u16,
    formats: Vec<u16>,
}

#[derive(Serialize)]
struct FileBodyRef<'a> {
    header: FileHeader,
    data: &'a [Vec<Vec<u8>>],
}

#[derive(Deserialize)]
struct FileBody {
    header: FileHeader,
    data: Vec<Vec<Vec<u8>>>,
}

/// Bounds every built container satisfies; a file breaking one of them is
/// `INVALID_FILE_DATA`.
fn check_header(
    header: &FileHeader,
    texture_type: TextureType,
    formats: &[PixelFormat],
) -> ConvertResult<()> {
    let reject = |reason: String| Err(ConvertError::InvalidFileData(reason));
    let extent_ok = |d: u32| d > 0 && d < MAX_IMAGE_EXTENT;

    if !extent_ok(header.width) || !extent_ok(header.height) {
        return reject(format!("image size {}×{} is out of range", header.width, header.height));
    }
    if header.depth == 0 || header.layers == 0 || header.mips == 0 {
        return reject(format!(
            "empty geometry: depth {}, layers {}, mips {}",
            header.depth, header.layers, header.mips
        ));
    }
    let sentinel = SubresourceKey::SENTINEL;
    if header.depth >= sentinel || header.layers >= sentinel || header.mips >= sentinel {
        return reject("geometry reaches the sentinel index".to_string());
    }
    if header.depth > 1 && texture_type.dimension != TextureDimension::ThreeD {
        return reject(format!("depth {} on a {} texture", header.depth, texture_type));
    }
    if texture_type.dimension == TextureDimension::Cube && header.layers % CUBE_FACES != 0 {
        return reject(format!("{} layers is not a whole number of cubes", header.layers));
    }
    if formats.is_empty() {
        return reject("no formats".to_string());
    }
    for (i, format) in formats.iter().enumerate() {
        if formats[..i].contains(format) {
            return reject(format!("format {} is stored twice", format));
        }
    }
    Ok(())
}

impl Container {
    /// Serialize into the container file format.
    pub fn to_bytes(&self) -> ConvertResult<Vec<u8>> {
        let body = FileBodyRef {
            header: FileHeader {
                texture_type: self.texture_type.code(),
                memory: self.memory.to_byte(),
                width: self.width,
                height: self.height,
                depth: self.geometry.depth,
                layers: self.geometry.layers,
                mips: self.geometry.mips,
                formats: self.formats.iter().map(PixelFormat::id).collect(),
            },
            data: &self.data,
        };

        let mut out = Vec::with_capacity(PREAMBLE_LEN + self.info().data_bytes + 64);
        out.extend_from_slice(&CONTAINER_MAGIC);
        out.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
        bincode::serialize_into(&mut out, &body).map_err(|e| {
            ConvertError::InvalidOperation(format!("Failed to serialize container: {}", e))
        })?;
        Ok(out)
    }

    /// Parse and validate a container file.
    ///
    /// # Errors
    ///
    /// - `INVALID_FILE_BOUNDS` for empty input
    /// - `INVALID_FILE_DATA` for a wrong magic or version, a truncated body,
    ///   or a body whose buffers don't match its header
    pub fn from_bytes(bytes: &[u8]) -> ConvertResult<Self> {
        if bytes.is_empty() {
            return Err(ConvertError::InvalidFileBounds { len: 0 });
        }
        if bytes.len() < PREAMBLE_LEN || bytes[..4] != CONTAINER_MAGIC {
            return Err(ConvertError::InvalidFileData(
                "not a texture container".to_string(),
            ));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != CONTAINER_VERSION {
            return Err(ConvertError::InvalidFileData(format!(
                "unsupported container version {} (expected {})",
                version, CONTAINER_VERSION
            )));
        }

        let body: FileBody = bincode::deserialize(&bytes[PREAMBLE_LEN..]).map_err(|e| {
            ConvertError::InvalidFileData(format!("Failed to deserialize container: {}", e))
        })?;
        let header = body.header;

        let invalid = |e: ConvertError| ConvertError::InvalidFileData(e.to_string());
        let texture_type = TextureType::from_code(header.texture_type).map_err(invalid)?;
        let formats = header
            .formats
            .iter()
            .map(|&id| PixelFormat::from_id(id))
            .collect::<ConvertResult<Vec<_>>>()
            .map_err(invalid)?;
        check_header(&header, texture_type, &formats)?;

        Container::from_parts(
            texture_type,
            Geometry::new(header.depth, header.layers, header.mips),
            MemoryUsage::from_byte(header.memory),
            header.width,
            header.height,
            formats,
            body.data,
        )
        .map_err(invalid)
    }

    /// Write the container to `path`.
    pub fn save(&self, path: &Path, store: &dyn FileStore) -> ConvertResult<()> {
        let bytes = self.to_bytes()?;
        store.write(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Saved container");
        Ok(())
    }

    /// Read a container from `path`.
    pub fn load(path: &Path, store: &dyn FileStore) -> ConvertResult<Self> {
        let container = Self::from_bytes(&store.read(path)?)?;
        debug!(path = %path.display(), "Loaded container");
        Ok(container)
    }
}
