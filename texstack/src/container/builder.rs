//! Incremental container construction.

use tracing::trace;

use super::{image_bytes, Container};
use crate::address::{mip_extent, Geometry, SubresourceKey};
use crate::error::{ConvertError, ConvertResult};
use crate::flags::{MemoryUsage, MipFilter, TextureDimension};
use crate::format::PixelFormat;
use crate::mips;
use crate::resolve::TextureType;

/// Builds a [`Container`] one subresource at a time.
///
/// The first format allocated fixes the base width and height. Buffers are
/// zeroed on allocation; every cell must then be inserted exactly once.
#[derive(Debug)]
pub struct ContainerBuilder {
    texture_type: TextureType,
    geometry: Geometry,
    memory: MemoryUsage,
    size: Option<(u32, u32)>,
    formats: Vec<PixelFormat>,
    data: Vec<Vec<Vec<u8>>>,
    /// format → mip → cell
    filled: Vec<Vec<Vec<bool>>>,
}

impl ContainerBuilder {
    pub fn new(texture_type: TextureType, geometry: Geometry, memory: MemoryUsage) -> Self {
        Self {
            texture_type,
            geometry,
            memory,
            size: None,
            formats: Vec::new(),
            data: Vec::new(),
            filled: Vec::new(),
        }
    }

    /// Continue from an existing container; its formats count as fully
    /// inserted.
    pub fn from_container(container: Container) -> Self {
        let texture_type = container.texture_type();
        let geometry = container.geometry();
        let memory = container.memory();
        let size = Some((container.width(), container.height()));
        let (formats, data) = container.into_parts();
        let filled = data
            .iter()
            .map(|mips| {
                (0..mips.len())
                    .map(|m| vec![true; geometry.images_at(m as u16)])
                    .collect()
            })
            .collect();
        Self {
            texture_type,
            geometry,
            memory,
            size,
            formats,
            data,
            filled,
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Base size, once the first format is allocated.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    pub fn formats(&self) -> &[PixelFormat] {
        &self.formats
    }

    /// Allocate zeroed buffers for a new format and return its index.
    ///
    /// The first call fixes the base size; later calls must match it. Each
    /// format can be stored once (`CONFLICTING_IMAGE_FORMAT` otherwise).
    pub fn allocate(&mut self, width: u32, height: u32, format: PixelFormat) -> ConvertResult<usize> {
        if self.formats.contains(&format) {
            return Err(ConvertError::ConflictingImageFormat {
                expected: format,
                actual: format,
            });
        }
        match self.size {
            None => self.size = Some((width, height)),
            Some((w, h)) if (w, h) != (width, height) => {
                return Err(ConvertError::ConflictingImageSize {
                    width: w,
                    height: h,
                    actual_width: width,
                    actual_height: height,
                })
            }
            Some(_) => {}
        }

        let mut mips = Vec::with_capacity(self.geometry.mips as usize);
        let mut filled = Vec::with_capacity(self.geometry.mips as usize);
        for mip in 0..self.geometry.mips {
            let image = image_bytes(mip_extent(width, mip), mip_extent(height, mip), &format)?;
            let cells = self.geometry.images_at(mip);
            let bytes = image.checked_mul(cells).ok_or_else(|| {
                ConvertError::InvalidImageSize(format!("mip {} of {} is too large", mip, format))
            })?;
            mips.push(vec![0u8; bytes]);
            filled.push(vec![false; cells]);
        }

        trace!(
            format = %format,
            width,
            height,
            mips = self.geometry.mips,
            "Allocated container format"
        );
        self.formats.push(format);
        self.data.push(mips);
        self.filled.push(filled);
        Ok(self.formats.len() - 1)
    }

    /// Copy one subresource into place.
    ///
    /// # Errors
    ///
    /// - `INVALID_RESOURCE_INDEX` for an out-of-range format, mip, layer or z
    /// - `INVALID_IMAGE_SIZE` when `bytes` isn't exactly one image
    /// - `CONFLICTING_RESOURCE_INDEX` when the cell was already inserted
    pub fn insert(&mut self, format: usize, key: SubresourceKey, bytes: &[u8]) -> ConvertResult<()> {
        let (width, height) = self.size.ok_or_else(|| {
            ConvertError::InvalidOperation("insert before any format was allocated".to_string())
        })?;
        let pixel = *self.formats.get(format).ok_or_else(|| {
            ConvertError::InvalidResourceIndex(format!("format {} of {}", format, self.formats.len()))
        })?;

        let depth = self.geometry.depth_at(key.mip);
        if key.mip >= self.geometry.mips
            || key.layer >= self.geometry.layers
            || key.z as u32 >= depth
        {
            return Err(ConvertError::InvalidResourceIndex(format!(
                "{} outside {} layers, {} mips, depth {}",
                key, self.geometry.layers, self.geometry.mips, depth
            )));
        }

        let image = image_bytes(
            mip_extent(width, key.mip),
            mip_extent(height, key.mip),
            &pixel,
        )?;
        if bytes.len() != image {
            return Err(ConvertError::InvalidImageSize(format!(
                "{} bytes for {}, expected {}",
                bytes.len(),
                key,
                image
            )));
        }

        let cell = key.layer as usize * depth as usize + key.z as usize;
        let filled = &mut self.filled[format][key.mip as usize][cell];
        if *filled {
            return Err(ConvertError::ConflictingResourceIndex { key });
        }
        *filled = true;

        let offset = cell * image;
        self.data[format][key.mip as usize][offset..offset + image].copy_from_slice(bytes);
        Ok(())
    }

    /// Replace the single base level of every format with a full mip chain.
    pub fn generate_mips(&mut self, filter: MipFilter) -> ConvertResult<()> {
        if self.geometry.mips != 1 {
            return Err(ConvertError::TooManyMips {
                mips: self.geometry.mips,
            });
        }
        let (width, height) = self.size.ok_or_else(|| {
            ConvertError::InvalidOperation("mip generation before any image".to_string())
        })?;

        let volume = self.texture_type.dimension == TextureDimension::ThreeD;
        let extent = mips::Extent {
            width,
            height,
            depth: self.geometry.depth as u32,
        };
        let count = mips::mip_count(extent, volume);
        if count == 1 {
            return Ok(());
        }

        for (f, format) in self.formats.iter().enumerate() {
            let chain = mips::generate_chain(
                &self.data[f][0],
                extent,
                self.geometry.layers as usize,
                format,
                filter,
                volume,
                count,
            )?;
            self.data[f].extend(chain);
        }

        self.geometry.mips = count;
        for filled in &mut self.filled {
            for mip in 1..count {
                filled.push(vec![true; self.geometry.images_at(mip)]);
            }
        }
        Ok(())
    }

    /// Finish the container; every cell of every format must be filled.
    pub fn finish(self) -> ConvertResult<Container> {
        let (width, height) = self.size.ok_or(ConvertError::MissingPaths)?;

        for filled in &self.filled {
            for (mip, cells) in filled.iter().enumerate() {
                let depth = self.geometry.depth_at(mip as u16) as usize;
                if let Some(cell) = cells.iter().position(|f| !f) {
                    return Err(ConvertError::MissingResourceIndex {
                        key: SubresourceKey::new(
                            (cell % depth) as u16,
                            (cell / depth) as u16,
                            mip as u16,
                        ),
                    });
                }
            }
        }

        Container::from_parts(
            self.texture_type,
            self.geometry,
            self.memory,
            width,
            height,
            self.formats,
            self.data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PrimitiveKind;

    fn rgba8() -> PixelFormat {
        PixelFormat::new(4, 8, PrimitiveKind::Unorm, false).unwrap()
    }

    fn r8() -> PixelFormat {
        PixelFormat::new(1, 8, PrimitiveKind::Unorm, false).unwrap()
    }

    fn builder(dimension: TextureDimension, geometry: Geometry) -> ContainerBuilder {
        ContainerBuilder::new(
            TextureType::new(dimension, false),
            geometry,
            MemoryUsage::default(),
        )
    }

    // ========================================================================
    // Allocation and insertion
    // ========================================================================

    #[test]
    fn test_two_layer_layout() {
        let mut b = builder(TextureDimension::TwoD, Geometry::new(1, 2, 1));
        let f = b.allocate(64, 64, rgba8()).unwrap();
        b.insert(f, SubresourceKey::new(0, 0, 0), &vec![1u8; 64 * 64 * 4])
            .unwrap();
        b.insert(f, SubresourceKey::new(0, 1, 0), &vec![2u8; 64 * 64 * 4])
            .unwrap();
        let container = b.finish().unwrap();

        let data = container.mip_data(0, 0).unwrap();
        assert_eq!(data.len(), 2 * 64 * 64 * 4);
        assert!(data[..64 * 64 * 4].iter().all(|&b| b == 1));
        assert!(data[64 * 64 * 4..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_insert_offsets_follow_layer_then_z() {
        let mut b = builder(TextureDimension::ThreeD, Geometry::new(2, 1, 2));
        let f = b.allocate(2, 1, r8()).unwrap();
        b.insert(f, SubresourceKey::new(1, 0, 0), &[3, 4]).unwrap();
        b.insert(f, SubresourceKey::new(0, 0, 0), &[1, 2]).unwrap();
        b.insert(f, SubresourceKey::new(0, 0, 1), &[9]).unwrap();
        let container = b.finish().unwrap();

        assert_eq!(container.mip_data(0, 0).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(container.mip_data(0, 1).unwrap(), &[9]);
        assert_eq!(
            container.subresource(0, SubresourceKey::new(1, 0, 0)).unwrap(),
            &[3, 4]
        );
    }

    #[test]
    fn test_duplicate_insert_is_conflicting_resource_index() {
        let mut b = builder(TextureDimension::TwoD, Geometry::default());
        let f = b.allocate(1, 1, r8()).unwrap();
        let key = SubresourceKey::new(0, 0, 0);
        b.insert(f, key, &[1]).unwrap();
        let err = b.insert(f, key, &[2]).unwrap_err();
        assert_eq!(err, ConvertError::ConflictingResourceIndex { key });
    }

    #[test]
    fn test_insert_wrong_size() {
        let mut b = builder(TextureDimension::TwoD, Geometry::default());
        let f = b.allocate(2, 2, r8()).unwrap();
        let err = b.insert(f, SubresourceKey::new(0, 0, 0), &[0; 3]).unwrap_err();
        assert_eq!(err.code(), 0x09);
    }

    #[test]
    fn test_insert_out_of_range() {
        let mut b = builder(TextureDimension::TwoD, Geometry::new(1, 2, 1));
        let f = b.allocate(1, 1, r8()).unwrap();
        for key in [
            SubresourceKey::new(0, 2, 0),
            SubresourceKey::new(1, 0, 0),
            SubresourceKey::new(0, 0, 1),
        ] {
            assert_eq!(b.insert(f, key, &[0]).unwrap_err().code(), 0x0A);
        }
        assert_eq!(
            b.insert(3, SubresourceKey::new(0, 0, 0), &[0]).unwrap_err().code(),
            0x0A
        );
    }

    #[test]
    fn test_second_format_must_match_size() {
        let mut b = builder(TextureDimension::TwoD, Geometry::default());
        b.allocate(4, 4, r8()).unwrap();
        let err = b.allocate(8, 4, rgba8()).unwrap_err();
        assert_eq!(err.code(), 0x41);
    }

    #[test]
    fn test_format_stored_once() {
        let mut b = builder(TextureDimension::TwoD, Geometry::default());
        b.allocate(4, 4, r8()).unwrap();
        let err = b.allocate(4, 4, r8()).unwrap_err();
        assert_eq!(err.code(), 0x42);
        assert_eq!(b.formats().len(), 1);
    }

    #[test]
    fn test_finish_reports_unfilled_cell() {
        let mut b = builder(TextureDimension::TwoD, Geometry::new(1, 2, 1));
        let f = b.allocate(1, 1, r8()).unwrap();
        b.insert(f, SubresourceKey::new(0, 0, 0), &[1]).unwrap();
        let err = b.finish().unwrap_err();
        assert_eq!(
            err,
            ConvertError::MissingResourceIndex {
                key: SubresourceKey::new(0, 1, 0)
            }
        );
    }

    // ========================================================================
    // Mip generation
    // ========================================================================

    #[test]
    fn test_generate_mips_builds_full_chain() {
        let mut b = builder(TextureDimension::TwoD, Geometry::default());
        let f = b.allocate(4, 2, r8()).unwrap();
        b.insert(f, SubresourceKey::new(0, 0, 0), &[0, 2, 4, 6, 8, 10, 12, 14])
            .unwrap();
        b.generate_mips(MipFilter::Linear).unwrap();
        let container = b.finish().unwrap();

        assert_eq!(container.geometry().mips, 3);
        assert_eq!(container.mip_data(0, 1).unwrap(), &[5, 9]);
        assert_eq!(container.mip_data(0, 2).unwrap(), &[7]);
    }

    #[test]
    fn test_generate_mips_single_texel_is_noop() {
        let mut b = builder(TextureDimension::TwoD, Geometry::default());
        let f = b.allocate(1, 1, r8()).unwrap();
        b.insert(f, SubresourceKey::new(0, 0, 0), &[3]).unwrap();
        b.generate_mips(MipFilter::Max).unwrap();
        assert_eq!(b.finish().unwrap().geometry().mips, 1);
    }

    // ========================================================================
    // Continuing from a container
    // ========================================================================

    #[test]
    fn test_from_container_adds_format() {
        let mut b = builder(TextureDimension::TwoD, Geometry::default());
        let f = b.allocate(1, 1, r8()).unwrap();
        b.insert(f, SubresourceKey::new(0, 0, 0), &[5]).unwrap();
        let container = b.finish().unwrap();

        let mut b = ContainerBuilder::from_container(container);
        let g = b.allocate(1, 1, rgba8()).unwrap();
        assert_eq!(g, 1);
        b.insert(g, SubresourceKey::new(0, 0, 0), &[1, 2, 3, 4]).unwrap();
        let container = b.finish().unwrap();
        assert_eq!(container.formats(), &[r8(), rgba8()]);
        assert_eq!(container.mip_data(1, 0).unwrap(), &[1, 2, 3, 4]);
    }
}
