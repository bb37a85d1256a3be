//! texstack - texture container assembly
//!
//! Builds GPU-style texture containers (arrays, cube maps, volumes,
//! multisample layers and mip chains) from ordinary image files, and slices
//! finished containers back out into image files.
//!
//! ```text
//! TextureFlags ──► resolve ──► address ──► convert ──► ContainerBuilder ──► Container
//!                                 ▲            ▲             │                 │
//!                             FileStore   CodecRegistry    mips          ExternalFormatExporter
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use texstack::{Assembler, TextureFlags};
//!
//! let container = Assembler::default()
//!     .convert_path(Path::new("albedo.png"), &TextureFlags::default())
//!     .unwrap();
//! println!("{} mips", container.geometry().mips);
//! ```

pub mod address;
pub mod assembler;
pub mod codec;
pub mod config;
pub mod container;
pub mod convert;
pub mod error;
pub mod export;
pub mod flags;
pub mod format;
pub mod logging;
pub mod mips;
pub mod resolve;
pub mod store;

pub use address::{FileDescriptor, Geometry, ImageSource, PathDescriptor, SubresourceKey};
pub use assembler::Assembler;
pub use codec::{Codec, CodecRegistry, ExternalCapability, ImageCodec};
pub use container::{Container, ContainerBuilder, ContainerInfo};
pub use error::{ConvertError, ConvertResult, ErrorCategory};
pub use export::{ExportOutput, ExportedImage, ExternalFormatExporter};
pub use flags::{MemoryLocation, MemoryUsage, MipFilter, TextureDimension, TextureFlags};
pub use format::{PixelFormat, PrimitiveKind};
pub use resolve::{resolve, FormatRule, Resolution, TextureType};
pub use store::{FileStore, LocalFileStore, MemoryFileStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
