//! Address space types shared by the addresser, converter and container.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::container::Container;

/// Position of one stored image: depth slice, array layer and mip level.
///
/// Layers are composite indices; for cube maps they enumerate six faces per
/// array slice, for multisample textures they enumerate samples.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SubresourceKey {
    pub z: u16,
    pub layer: u16,
    pub mip: u16,
}

impl SubresourceKey {
    /// Index value meaning "unspecified"; never valid in a finished address.
    pub const SENTINEL: u16 = 0xFFFF;

    pub fn new(z: u16, layer: u16, mip: u16) -> Self {
        Self { z, layer, mip }
    }

    /// Whether any component is the sentinel.
    pub fn has_sentinel(&self) -> bool {
        self.z == Self::SENTINEL || self.layer == Self::SENTINEL || self.mip == Self::SENTINEL
    }
}

impl fmt::Display for SubresourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(z={}, layer={}, mip={})", self.z, self.layer, self.mip)
    }
}

/// Where the bytes of one subresource come from.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    /// An encoded image file read through the file store.
    Path(&'a Path),
    /// The subresource at the descriptor's key in an existing container.
    Container {
        container: &'a Container,
        format: usize,
    },
}

/// An owned path source, used by the filename heuristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDescriptor {
    pub path: PathBuf,
    pub key: SubresourceKey,
}

impl PathDescriptor {
    pub fn new(path: impl Into<PathBuf>, key: SubresourceKey) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    /// Borrow as a [`FileDescriptor`].
    pub fn as_descriptor(&self) -> FileDescriptor<'_> {
        FileDescriptor {
            source: ImageSource::Path(&self.path),
            key: self.key,
        }
    }
}

/// One input image and the subresource it fills.
#[derive(Debug, Clone, Copy)]
pub struct FileDescriptor<'a> {
    pub source: ImageSource<'a>,
    pub key: SubresourceKey,
}

impl<'a> FileDescriptor<'a> {
    pub fn path(path: &'a Path, key: SubresourceKey) -> Self {
        Self {
            source: ImageSource::Path(path),
            key,
        }
    }

    pub fn container(container: &'a Container, format: usize, key: SubresourceKey) -> Self {
        Self {
            source: ImageSource::Container { container, format },
            key,
        }
    }
}

/// Extent of a texture's address space outside of width and height.
///
/// Each field is one more than the largest index observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub depth: u16,
    pub layers: u16,
    pub mips: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            depth: 1,
            layers: 1,
            mips: 1,
        }
    }
}

impl Geometry {
    pub fn new(depth: u16, layers: u16, mips: u16) -> Self {
        Self {
            depth,
            layers,
            mips,
        }
    }

    /// Depth at a mip level.
    pub fn depth_at(&self, mip: u16) -> u32 {
        mip_extent(self.depth as u32, mip)
    }

    /// Number of subresources in a mip level.
    pub fn images_at(&self, mip: u16) -> usize {
        self.layers as usize * self.depth_at(mip) as usize
    }
}

/// Size of a dimension at a mip level: `max(1, ceil(base / 2^mip))`.
pub fn mip_extent(base: u32, mip: u16) -> u32 {
    if mip >= 32 {
        return 1;
    }
    let divisor = 1u64 << mip;
    (((base as u64) + divisor - 1) / divisor).max(1) as u32
}

/// Number of levels in a full mip chain, down to a single texel:
/// `ceil(log2(max extent)) + 1`.
pub fn full_mip_count(width: u32, height: u32, depth: u32) -> u16 {
    let largest = width.max(height).max(depth).max(1);
    (u32::BITS - (largest - 1).leading_zeros()) as u16 + 1
}
