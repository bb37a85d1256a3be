//! Subresource address validation and discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::filename::{descriptors_from_names, is_sibling_of, CUBE_FACES};
use super::types::{Geometry, PathDescriptor, SubresourceKey};
use crate::error::{ConvertError, ConvertResult};
use crate::flags::{TextureDimension, TextureFlags};
use crate::store::FileStore;

/// Turns inputs into a validated set of subresource keys and the texture's
/// geometry.
#[derive(Debug, Clone, Copy)]
pub struct SubresourceAddresser {
    flags: TextureFlags,
}

impl SubresourceAddresser {
    pub fn new(flags: TextureFlags) -> Self {
        Self { flags }
    }

    /// Validate explicit keys and derive the geometry from their maxima.
    ///
    /// Checks, in order:
    /// 1. no keys → `MISSING_PATHS`
    /// 2. any sentinel, or a depth index on a non-3D texture → `INVALID_RESOURCE_INDEX`
    /// 3. more than one mip level with mip generation on → `TOO_MANY_MIPS`
    /// 4. every (z, layer, mip) cell covered → `MISSING_RESOURCE_INDEX` otherwise
    /// 5. cube layers a multiple of six → `MISSING_FACE` otherwise
    ///
    /// Duplicate keys pass here; they fail on insertion into the container.
    pub fn validate(&self, keys: &[SubresourceKey]) -> ConvertResult<Geometry> {
        if keys.is_empty() {
            return Err(ConvertError::MissingPaths);
        }

        let mut geometry = Geometry::new(0, 0, 0);
        for key in keys {
            if key.has_sentinel() {
                return Err(ConvertError::InvalidResourceIndex(format!(
                    "unspecified index in {}",
                    key
                )));
            }
            if key.z != 0 && self.flags.dimension != TextureDimension::ThreeD {
                return Err(ConvertError::InvalidResourceIndex(format!(
                    "depth index in {} on a {} texture",
                    key, self.flags.dimension
                )));
            }
            geometry.depth = geometry.depth.max(key.z + 1);
            geometry.layers = geometry.layers.max(key.layer + 1);
            geometry.mips = geometry.mips.max(key.mip + 1);
        }

        if self.flags.generate_mips && geometry.mips != 1 {
            return Err(ConvertError::TooManyMips {
                mips: geometry.mips,
            });
        }

        let present: HashSet<SubresourceKey> = keys.iter().copied().collect();
        for mip in 0..geometry.mips {
            for layer in 0..geometry.layers {
                for z in 0..geometry.depth_at(mip) as u16 {
                    let key = SubresourceKey::new(z, layer, mip);
                    if !present.contains(&key) {
                        return Err(ConvertError::MissingResourceIndex { key });
                    }
                }
            }
        }

        if self.flags.dimension == TextureDimension::Cube && geometry.layers % CUBE_FACES != 0 {
            return Err(ConvertError::MissingFace(format!(
                "{} layers is not a whole number of cubes",
                geometry.layers
            )));
        }

        debug!(
            depth = geometry.depth,
            layers = geometry.layers,
            mips = geometry.mips,
            "Subresources addressed"
        );
        Ok(geometry)
    }

    /// Address bare paths by file name and validate the result.
    pub fn address_paths(
        &self,
        paths: &[PathBuf],
    ) -> ConvertResult<(Vec<PathDescriptor>, Geometry)> {
        let descriptors = descriptors_from_names(paths, &self.flags)?;
        let keys: Vec<SubresourceKey> = descriptors.iter().map(|d| d.key).collect();
        let geometry = self.validate(&keys)?;
        Ok((descriptors, geometry))
    }

    /// Address a single path, discovering its siblings when the flags need
    /// more than one image.
    pub fn address_single(
        &self,
        path: &Path,
        store: &dyn FileStore,
    ) -> ConvertResult<(Vec<PathDescriptor>, Geometry)> {
        if !self.flags.needs_addressing() {
            let descriptors = vec![PathDescriptor::new(path, SubresourceKey::default())];
            return Ok((descriptors, Geometry::default()));
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConvertError::InvalidFilePath {
                path: path.to_path_buf(),
                reason: "path has no file name".to_string(),
            })?;
        let listed = store.list_siblings(path)?;
        let listed_count = listed.len();
        let siblings: Vec<PathBuf> = listed
            .into_iter()
            .filter(|candidate| is_sibling_of(candidate, stem, &self.flags))
            .collect();
        debug!(
            path = %path.display(),
            listed = listed_count,
            count = siblings.len(),
            "Discovered sibling images"
        );
        if siblings.is_empty() {
            return Err(ConvertError::MissingPaths);
        }
        self.address_paths(&siblings)
    }
}
