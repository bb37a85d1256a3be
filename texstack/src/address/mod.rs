//! Subresource addressing.
//!
//! Every input image fills one subresource `(z, layer, mip)`. Addresses come
//! from explicit descriptors, from file names, or from a single path whose
//! siblings are discovered through the [`FileStore`](crate::store::FileStore).

mod addresser;
pub mod filename;
mod types;

pub use addresser::SubresourceAddresser;
pub use filename::{descriptors_from_names, is_sibling_of, parse_file_name, ParsedName, CUBE_FACES};
pub use types::{
    full_mip_count, mip_extent, FileDescriptor, Geometry, ImageSource, PathDescriptor,
    SubresourceKey,
};
