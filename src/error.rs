//! Error types shared by the transform, extraction and analysis stages.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by library operations.
///
/// Every error is reported by the call that detected it; nothing is
/// retried and no partial result is returned alongside an error.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument is outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The pixel layout has no defined representation.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// The image path does not resolve to a file.
    #[error("no image file at {}", .0.display())]
    NotFound(PathBuf),
    /// The codec failed to decode or encode an image.
    #[cfg(feature = "codec")]
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedFormat(msg.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
