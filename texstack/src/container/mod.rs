//! Texture containers.
//!
//! A [`Container`] holds one or more pixel formats of the same texture. For
//! every format it stores one contiguous little-endian buffer per mip level,
//! laid out as `[layer][z][y][x][channel]`:
//!
//! ```text
//! mip m buffer: layers × depth(m) × height(m) × width(m) × stride bytes
//! subresource (z, layer, m) starts at (layer × depth(m) + z) × imageBytes(m)
//! ```
//!
//! with `dim(m) = max(1, ceil(dim / 2^m))`. Containers are produced by
//! [`ContainerBuilder`] and are immutable afterwards.

mod builder;
mod file;

pub use builder::ContainerBuilder;
pub use file::{CONTAINER_MAGIC, CONTAINER_VERSION};

use serde::Serialize;

use crate::address::{mip_extent, Geometry, SubresourceKey};
use crate::codec::ImageView;
use crate::error::{ConvertError, ConvertResult};
use crate::flags::MemoryUsage;
use crate::format::PixelFormat;
use crate::resolve::TextureType;

/// A finished texture container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    texture_type: TextureType,
    geometry: Geometry,
    memory: MemoryUsage,
    width: u32,
    height: u32,
    formats: Vec<PixelFormat>,
    /// format → mip → bytes
    data: Vec<Vec<Vec<u8>>>,
}

impl Container {
    /// Assemble a container, checking every buffer against the layout.
    pub(crate) fn from_parts(
        texture_type: TextureType,
        geometry: Geometry,
        memory: MemoryUsage,
        width: u32,
        height: u32,
        formats: Vec<PixelFormat>,
        data: Vec<Vec<Vec<u8>>>,
    ) -> ConvertResult<Self> {
        let container = Self {
            texture_type,
            geometry,
            memory,
            width,
            height,
            formats,
            data,
        };
        if container.data.len() != container.formats.len() {
            return Err(ConvertError::InvalidOperation(format!(
                "{} formats but {} buffers",
                container.formats.len(),
                container.data.len()
            )));
        }
        for (f, mips) in container.data.iter().enumerate() {
            if mips.len() != geometry.mips as usize {
                return Err(ConvertError::InvalidOperation(format!(
                    "format {} has {} mips, expected {}",
                    f,
                    mips.len(),
                    geometry.mips
                )));
            }
            for (m, bytes) in mips.iter().enumerate() {
                let expected = container.mip_bytes(f, m as u16)?;
                if bytes.len() != expected {
                    return Err(ConvertError::InvalidImageSize(format!(
                        "format {} mip {} holds {} bytes, expected {}",
                        f,
                        m,
                        bytes.len(),
                        expected
                    )));
                }
            }
        }
        Ok(container)
    }

    pub fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn memory(&self) -> MemoryUsage {
        self.memory
    }

    /// Base width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Base height.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn formats(&self) -> &[PixelFormat] {
        &self.formats
    }

    pub fn format(&self, index: usize) -> Option<PixelFormat> {
        self.formats.get(index).copied()
    }

    pub fn mip_width(&self, mip: u16) -> u32 {
        mip_extent(self.width, mip)
    }

    pub fn mip_height(&self, mip: u16) -> u32 {
        mip_extent(self.height, mip)
    }

    pub fn mip_depth(&self, mip: u16) -> u32 {
        self.geometry.depth_at(mip)
    }

    /// Bytes of one subresource of a format at a mip level.
    pub fn image_bytes(&self, format: usize, mip: u16) -> ConvertResult<usize> {
        let pixel = self.format_checked(format)?;
        image_bytes(self.mip_width(mip), self.mip_height(mip), &pixel)
    }

    /// Bytes of a whole mip level of a format.
    pub fn mip_bytes(&self, format: usize, mip: u16) -> ConvertResult<usize> {
        let image = self.image_bytes(format, mip)?;
        image
            .checked_mul(self.geometry.images_at(mip))
            .ok_or_else(|| ConvertError::InvalidImageSize("mip level too large".to_string()))
    }

    /// A whole mip level's buffer.
    pub fn mip_data(&self, format: usize, mip: u16) -> ConvertResult<&[u8]> {
        self.data
            .get(format)
            .and_then(|mips| mips.get(mip as usize))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                ConvertError::InvalidResourceIndex(format!("format {} mip {}", format, mip))
            })
    }

    /// The bytes of one subresource.
    pub fn subresource(&self, format: usize, key: SubresourceKey) -> ConvertResult<&[u8]> {
        if key.layer >= self.geometry.layers
            || key.mip >= self.geometry.mips
            || key.z as u32 >= self.mip_depth(key.mip)
        {
            return Err(ConvertError::InvalidResourceIndex(format!(
                "{} outside {} layers, {} mips, depth {}",
                key,
                self.geometry.layers,
                self.geometry.mips,
                self.mip_depth(key.mip)
            )));
        }
        let size = self.image_bytes(format, key.mip)?;
        let index = key.layer as usize * self.mip_depth(key.mip) as usize + key.z as usize;
        let data = self.mip_data(format, key.mip)?;
        Ok(&data[index * size..(index + 1) * size])
    }

    /// One subresource as an encoder view.
    pub fn view(&self, format: usize, key: SubresourceKey) -> ConvertResult<ImageView<'_>> {
        let pixels = self.subresource(format, key)?;
        Ok(ImageView {
            width: self.mip_width(key.mip),
            height: self.mip_height(key.mip),
            format: self.format_checked(format)?,
            pixels,
        })
    }

    /// Every valid key in export order: mip, then layer, then z.
    pub fn keys(&self) -> Vec<SubresourceKey> {
        let mut keys = Vec::new();
        for mip in 0..self.geometry.mips {
            for layer in 0..self.geometry.layers {
                for z in 0..self.mip_depth(mip) as u16 {
                    keys.push(SubresourceKey::new(z, layer, mip));
                }
            }
        }
        keys
    }

    /// Summary for display and JSON output.
    pub fn info(&self) -> ContainerInfo {
        ContainerInfo {
            texture_type: self.texture_type.to_string(),
            width: self.width,
            height: self.height,
            depth: self.geometry.depth,
            layers: self.geometry.layers,
            mips: self.geometry.mips,
            formats: self.formats.iter().map(PixelFormat::name).collect(),
            memory_shared: self.memory.location == crate::flags::MemoryLocation::Shared,
            memory_prefer: self.memory.prefer,
            cpu_write: self.memory.cpu_write,
            gpu_write: self.memory.gpu_write,
            data_bytes: self
                .data
                .iter()
                .flat_map(|mips| mips.iter().map(Vec::len))
                .sum(),
        }
    }

    fn format_checked(&self, format: usize) -> ConvertResult<PixelFormat> {
        self.format(format).ok_or_else(|| {
            ConvertError::InvalidResourceIndex(format!(
                "format {} of {}",
                format,
                self.formats.len()
            ))
        })
    }

    pub(crate) fn into_parts(self) -> (Vec<PixelFormat>, Vec<Vec<Vec<u8>>>) {
        (self.formats, self.data)
    }
}

/// Bytes of one `width × height` image.
pub(crate) fn image_bytes(width: u32, height: u32, format: &PixelFormat) -> ConvertResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(format.stride()))
        .ok_or_else(|| ConvertError::InvalidImageSize(format!("{}×{} is too large", width, height)))
}

/// Serializable container summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub texture_type: String,
    pub width: u32,
    pub height: u32,
    pub depth: u16,
    pub layers: u16,
    pub mips: u16,
    pub formats: Vec<String>,
    pub memory_shared: bool,
    pub memory_prefer: bool,
    pub cpu_write: bool,
    pub gpu_write: bool,
    pub data_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::TextureDimension;
    use crate::format::PrimitiveKind;

    fn cube_with_mips() -> Container {
        let r8 = PixelFormat::new(1, 8, PrimitiveKind::Unorm, false).unwrap();
        let mut builder = ContainerBuilder::new(
            TextureType::new(TextureDimension::Cube, false),
            Geometry::new(1, 6, 2),
            MemoryUsage::default(),
        );
        let f = builder.allocate(2, 2, r8).unwrap();
        for layer in 0..6 {
            builder
                .insert(f, SubresourceKey::new(0, layer, 0), &[layer as u8; 4])
                .unwrap();
            builder
                .insert(f, SubresourceKey::new(0, layer, 1), &[layer as u8 + 10])
                .unwrap();
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_keys_are_mip_major() {
        let keys = cube_with_mips().keys();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], SubresourceKey::new(0, 0, 0));
        assert_eq!(keys[5], SubresourceKey::new(0, 5, 0));
        assert_eq!(keys[6], SubresourceKey::new(0, 0, 1));
    }

    #[test]
    fn test_view_uses_mip_extent() {
        let container = cube_with_mips();
        let view = container.view(0, SubresourceKey::new(0, 3, 1)).unwrap();
        assert_eq!((view.width, view.height), (1, 1));
        assert_eq!(view.pixels, &[13]);
        assert!(container.view(1, SubresourceKey::default()).is_err());
        assert!(container.view(0, SubresourceKey::new(0, 6, 0)).is_err());
    }

    #[test]
    fn test_info_serializes() {
        let info = cube_with_mips().info();
        assert_eq!(info.texture_type, "Cube");
        assert_eq!(info.data_bytes, 6 * 4 + 6);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["layers"], 6);
        assert_eq!(json["formats"][0], "R8_UNORM");
    }
}
