// SPDX-License-Identifier: MPL-2.0
//! Error types for the viewer engine.
//!
//! [`LoadError`] is what a caller sees when an image cannot be opened, either
//! synchronously from [`crate::media::ImageSource`] construction or
//! asynchronously through [`crate::engine::ViewerEvent::LoadFailed`].
//! [`DecodeError`] travels back from a [`crate::application::port::TileDecoder`]
//! with a failed completion.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Why an image source could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The file does not exist.
    #[error("image not found")]
    NotFound,

    /// The file exists but cannot be read.
    #[error("permission denied")]
    PermissionDenied,

    /// Not enough memory to hold the decoded image.
    #[error("allocation failed")]
    AllocationFailed,

    /// The data is truncated or malformed.
    #[error("corrupt image data: {0}")]
    CorruptData(String),

    /// The container or codec is not recognized.
    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("failed to load image: {0}")]
    Generic(String),
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound,
            io::ErrorKind::PermissionDenied => LoadError::PermissionDenied,
            io::ErrorKind::OutOfMemory => LoadError::AllocationFailed,
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                LoadError::CorruptData(err.to_string())
            }
            _ => LoadError::Generic(err.to_string()),
        }
    }
}

impl From<image_rs::ImageError> for LoadError {
    fn from(err: image_rs::ImageError) -> Self {
        use image_rs::ImageError;

        match err {
            ImageError::IoError(io_err) => LoadError::from(io_err),
            ImageError::Decoding(decoding) => LoadError::CorruptData(decoding.to_string()),
            ImageError::Unsupported(_) => LoadError::UnsupportedFormat,
            ImageError::Limits(_) => LoadError::AllocationFailed,
            other => LoadError::Generic(other.to_string()),
        }
    }
}

/// Failure reported by a tile or base-layer decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Source(#[from] LoadError),

    #[error("region {x},{y} {width}x{height} lies outside the {image_width}x{image_height} image")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// The source locator cannot be resolved by this decoder.
    #[error("decoder cannot resolve source: {0}")]
    UnsupportedLocator(String),

    /// The worker running the decode went away.
    #[error("decode worker failed: {0}")]
    Worker(String),
}

impl DecodeError {
    /// Classifies a failed base-layer decode for [`LoadError`] consumers.
    #[must_use]
    pub fn into_load_error(self) -> LoadError {
        match self {
            DecodeError::Source(err) => err,
            DecodeError::UnsupportedLocator(_) => LoadError::UnsupportedFormat,
            other => LoadError::Generic(other.to_string()),
        }
    }
}

impl From<image_rs::ImageError> for DecodeError {
    fn from(err: image_rs::ImageError) -> Self {
        DecodeError::Source(LoadError::from(err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
