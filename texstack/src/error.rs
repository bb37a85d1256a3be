//! Error types for texture conversion.
//!
//! Every failure in the conversion pipeline maps onto exactly one result code.
//! Codes are grouped by their leading hex nibble:
//!
//! | Range       | Category                                  |
//! |-------------|-------------------------------------------|
//! | `0x01-0x0F` | invalid input (flags, files, sizes, ...)  |
//! | `0x21-0x2F` | missing data (faces, paths, subresources) |
//! | `0x41-0x4F` | conflicting data between inputs           |
//! | `0x61`      | limits (too many mips)                    |
//!
//! `0x00` is reserved for success and is never produced by an error.

use std::path::PathBuf;

use thiserror::Error;

use crate::address::SubresourceKey;
use crate::format::PixelFormat;

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result code reported for a successful conversion.
pub const SUCCESS_CODE: u8 = 0x00;

/// Severity bucket of a [`ConvertError`], derived from its result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Structural or validation failure (`0x01-0x0F`).
    Invalid,
    /// Required data was not supplied (`0x21-0x2F`).
    Missing,
    /// Two inputs disagree with each other (`0x41-0x4F`).
    Conflicting,
    /// A limit was exceeded (`0x61`).
    Limit,
}

/// Errors that can occur while assembling or slicing a texture container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Texture type flags were combined illegally.
    #[error("Invalid texture type: {0}")]
    InvalidType(String),

    /// More than one channel count was requested.
    #[error("Invalid channel selection: {0}")]
    InvalidChannels(String),

    /// More than one primitive kind was requested.
    #[error("Invalid primitive selection: {0}")]
    InvalidPrimitive(String),

    /// More than one bit depth was requested.
    #[error("Invalid bit depth selection: {0}")]
    InvalidBits(String),

    /// Channels, bit depth, primitive and colorspace don't form a legal format.
    #[error("Invalid pixel format: {0}")]
    InvalidFormat(String),

    /// A source or destination path couldn't be opened.
    #[error("Cannot access {}: {reason}", path.display())]
    InvalidFilePath { path: PathBuf, reason: String },

    /// Source bytes couldn't be understood by any codec.
    #[error("Unreadable image data: {0}")]
    InvalidFileData(String),

    /// Source is empty or too large to decode.
    #[error("Image data out of bounds: {len} bytes")]
    InvalidFileBounds { len: usize },

    /// Decoded or supplied image has an unusable size.
    #[error("Invalid image size: {0}")]
    InvalidImageSize(String),

    /// A z, layer, mip or format index is out of range or unspecified.
    #[error("Invalid resource index: {0}")]
    InvalidResourceIndex(String),

    /// A cube face couldn't be found in a file name.
    #[error("No cube face in file name: {0}")]
    InvalidFileNameFace(String),

    /// An array slice, sample or depth index couldn't be found in a file name.
    #[error("No slice index in file name: {0}")]
    InvalidFileNameSlice(String),

    /// A mip index couldn't be found in a file name.
    #[error("No mip index in file name: {0}")]
    InvalidFileNameMip(String),

    /// The requested operation isn't available.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The decoded format can't be converted into the requested one.
    #[error("Cannot convert {from} into {to}")]
    IncompatibleFormats { from: PixelFormat, to: PixelFormat },

    /// A cube map is missing one or more faces.
    #[error("Cube map is missing faces: {0}")]
    MissingFace(String),

    /// No input images were supplied.
    #[error("No input paths supplied")]
    MissingPaths,

    /// A required subresource has no source image.
    #[error("Missing subresource {key}")]
    MissingResourceIndex { key: SubresourceKey },

    /// An image differs in size from the first image.
    #[error("Image is {actual_width}×{actual_height}, expected {width}×{height}")]
    ConflictingImageSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// An image differs in pixel format from the first image.
    #[error("Image format {actual} conflicts with {expected}")]
    ConflictingImageFormat {
        expected: PixelFormat,
        actual: PixelFormat,
    },

    /// Two images target the same subresource.
    #[error("Subresource {key} supplied more than once")]
    ConflictingResourceIndex { key: SubresourceKey },

    /// Mip generation was requested but more than the base mip was supplied.
    #[error("Mip generation requested but {mips} mip levels were supplied")]
    TooManyMips { mips: u16 },
}

impl ConvertError {
    /// Stable one-byte result code for this error.
    pub fn code(&self) -> u8 {
        match self {
            ConvertError::InvalidType(_) => 0x01,
            ConvertError::InvalidChannels(_) => 0x02,
            ConvertError::InvalidPrimitive(_) => 0x03,
            ConvertError::InvalidBits(_) => 0x04,
            ConvertError::InvalidFormat(_) => 0x05,
            ConvertError::InvalidFilePath { .. } => 0x06,
            ConvertError::InvalidFileData(_) => 0x07,
            ConvertError::InvalidFileBounds { .. } => 0x08,
            ConvertError::InvalidImageSize(_) => 0x09,
            ConvertError::InvalidResourceIndex(_) => 0x0A,
            ConvertError::InvalidFileNameFace(_) => 0x0B,
            ConvertError::InvalidFileNameSlice(_) => 0x0C,
            ConvertError::InvalidFileNameMip(_) => 0x0D,
            ConvertError::InvalidOperation(_) => 0x0E,
            ConvertError::IncompatibleFormats { .. } => 0x0F,
            ConvertError::MissingFace(_) => 0x21,
            ConvertError::MissingPaths => 0x22,
            ConvertError::MissingResourceIndex { .. } => 0x23,
            ConvertError::ConflictingImageSize { .. } => 0x41,
            ConvertError::ConflictingImageFormat { .. } => 0x42,
            ConvertError::ConflictingResourceIndex { .. } => 0x43,
            ConvertError::TooManyMips { .. } => 0x61,
        }
    }

    /// Severity bucket, taken from the leading nibble of [`code`](Self::code).
    pub fn category(&self) -> ErrorCategory {
        match self.code() >> 4 {
            0x0 => ErrorCategory::Invalid,
            0x2 => ErrorCategory::Missing,
            0x4 => ErrorCategory::Conflicting,
            _ => ErrorCategory::Limit,
        }
    }

    /// Build an [`ConvertError::InvalidFilePath`] from an I/O failure.
    pub fn file_path(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        ConvertError::InvalidFilePath {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
