//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the four operations that touch real image
//! data outside the numeric core: decode, resize, blur and encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock so session logic can run without files.

use super::buffer::{BufferError, PixelBuffer};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Could not encode {path}: {reason}")]
    Encode { path: String, reason: String },
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image I/O backends.
pub trait ImageBackend {
    /// Decode a file into RGBA8.
    fn decode(&self, path: &Path) -> Result<PixelBuffer, BackendError>;

    /// Resample to exact dimensions.
    fn resize(&self, buffer: &PixelBuffer, target: Dimensions)
    -> Result<PixelBuffer, BackendError>;

    /// Gaussian blur with the given radius in pixels. Radius 0 returns a copy.
    fn blur(&self, buffer: &PixelBuffer, radius: u32) -> Result<PixelBuffer, BackendError>;

    /// Encode to `path`, format chosen from the extension.
    fn encode(&self, buffer: &PixelBuffer, path: &Path) -> Result<(), BackendError>;
}
