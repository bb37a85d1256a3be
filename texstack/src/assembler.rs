//! Conversion entry points.
//!
//! [`Assembler`] runs one conversion call through its stages:
//!
//! ```text
//! ResolveFlags → AddressSubresources → {DecodeConvertInsert}* → [GenerateMips] → [Compress] → Done
//! ```
//!
//! The first error ends the call; no partial container is returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::address::{FileDescriptor, Geometry, PathDescriptor, SubresourceAddresser, SubresourceKey};
use crate::codec::CodecRegistry;
use crate::container::{Container, ContainerBuilder};
use crate::convert::PixelConverter;
use crate::error::ConvertResult;
use crate::flags::TextureFlags;
use crate::resolve::{resolve, Resolution};
use crate::store::{FileStore, LocalFileStore};

/// Assembles texture containers from source images.
///
/// Holds the codec table and the file store; both are read-only, so one
/// assembler can serve any number of conversion calls.
#[derive(Clone)]
pub struct Assembler {
    codecs: CodecRegistry,
    store: Arc<dyn FileStore>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(CodecRegistry::with_defaults(), Arc::new(LocalFileStore::new()))
    }
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

impl Assembler {
    pub fn new(codecs: CodecRegistry, store: Arc<dyn FileStore>) -> Self {
        Self { codecs, store }
    }

    /// Replace the codec table.
    pub fn with_codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Replace the file store.
    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = store;
        self
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn store(&self) -> &dyn FileStore {
        self.store.as_ref()
    }

    /// Convert from one path.
    ///
    /// When the flags need filename addressing (arrays, cubes, volumes,
    /// multisample or explicit mips) the path's siblings named
    /// `{stem}*.{ext}` are addressed instead.
    pub fn convert_path(&self, path: &Path, flags: &TextureFlags) -> ConvertResult<Container> {
        let resolution = resolve(flags)?;
        let (descriptors, geometry) =
            SubresourceAddresser::new(*flags).address_single(path, self.store.as_ref())?;
        self.assemble_paths(&descriptors, geometry, resolution, flags)
    }

    /// Convert from paths whose subresources are encoded in their file names.
    pub fn convert_paths(&self, paths: &[PathBuf], flags: &TextureFlags) -> ConvertResult<Container> {
        let resolution = resolve(flags)?;
        let (descriptors, geometry) = SubresourceAddresser::new(*flags).address_paths(paths)?;
        self.assemble_paths(&descriptors, geometry, resolution, flags)
    }

    /// Convert from explicitly addressed sources.
    pub fn convert_descriptors(
        &self,
        descriptors: &[FileDescriptor<'_>],
        flags: &TextureFlags,
    ) -> ConvertResult<Container> {
        let resolution = resolve(flags)?;
        let keys: Vec<SubresourceKey> = descriptors.iter().map(|d| d.key).collect();
        let geometry = SubresourceAddresser::new(*flags).validate(&keys)?;
        let builder =
            ContainerBuilder::new(resolution.texture_type, geometry, resolution.memory);
        self.assemble(descriptors, builder, resolution, flags)
    }

    /// Re-encode the first format of `container` into the format `flags`
    /// request, returning a container that holds both.
    ///
    /// Texture type, geometry and memory usage come from `container`; only
    /// the format fields of `flags` apply. Existing mips are kept, so mip
    /// generation is never repeated.
    #[instrument(skip_all, fields(formats = container.formats().len()))]
    pub fn append_format(&self, container: &Container, flags: &TextureFlags) -> ConvertResult<Container> {
        let resolution = resolve(flags)?;
        let resolution = Resolution {
            texture_type: container.texture_type(),
            memory: container.memory(),
            ..resolution
        };
        let keys = container.keys();
        let descriptors: Vec<FileDescriptor<'_>> = keys
            .iter()
            .map(|&key| FileDescriptor::container(container, 0, key))
            .collect();

        let builder = ContainerBuilder::from_container(container.clone());
        let flags = TextureFlags {
            generate_mips: false,
            ..*flags
        };
        self.assemble(&descriptors, builder, resolution, &flags)
    }

    fn assemble_paths(
        &self,
        descriptors: &[PathDescriptor],
        geometry: Geometry,
        resolution: Resolution,
        flags: &TextureFlags,
    ) -> ConvertResult<Container> {
        let descriptors: Vec<FileDescriptor<'_>> =
            descriptors.iter().map(PathDescriptor::as_descriptor).collect();
        let builder =
            ContainerBuilder::new(resolution.texture_type, geometry, resolution.memory);
        self.assemble(&descriptors, builder, resolution, flags)
    }

    /// Decode, convert and insert every source, then finish the container.
    fn assemble(
        &self,
        descriptors: &[FileDescriptor<'_>],
        mut builder: ContainerBuilder,
        resolution: Resolution,
        flags: &TextureFlags,
    ) -> ConvertResult<Container> {
        let started = Instant::now();

        // Base level first so the first image fixes the container's size.
        let mut order: Vec<&FileDescriptor<'_>> = descriptors.iter().collect();
        order.sort_by_key(|d| (d.key.mip, d.key.layer, d.key.z));

        let mut converter = PixelConverter::new(
            &self.codecs,
            self.store.as_ref(),
            resolution.rule,
            resolution.texture_type.dimension,
        );
        let mut slot = None;
        for descriptor in order {
            let image = converter.convert(descriptor)?;
            let format = match slot {
                Some(format) => format,
                None => {
                    let format = builder.allocate(image.width, image.height, image.format)?;
                    slot = Some(format);
                    format
                }
            };
            builder.insert(format, descriptor.key, &image.pixels)?;
        }
        debug!(
            images = descriptors.len(),
            texture_type = %resolution.texture_type,
            "Inserted subresources"
        );

        if flags.generate_mips {
            builder.generate_mips(flags.mip_filter)?;
            debug!(
                mips = builder.geometry().mips,
                filter = flags.mip_filter.name(),
                "Generated mip chain"
            );
        }

        if flags.compress {
            debug!("Compression requested; storing uncompressed");
        }

        let container = builder.finish()?;
        info!(
            texture_type = %container.texture_type(),
            width = container.width(),
            height = container.height(),
            depth = container.geometry().depth,
            layers = container.geometry().layers,
            mips = container.geometry().mips,
            formats = container.formats().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Container assembled"
        );
        Ok(container)
    }
}
