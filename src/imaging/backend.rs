//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three container operations the
//! watermark pipeline needs: open, read_metadata and save. Everything between
//! open and save happens on in-memory pixels in
//! [`operations`](super::operations).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate for pixels and `kamadak-exif` for metadata.

use super::params::Quality;
use crate::metadata::{CaptureMetadata, MetadataError};
use image::{DynamicImage, RgbImage};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image container backends.
///
/// Kept narrow so the pipeline can be driven by a mock in tests.
pub trait ImageBackend: Sync {
    /// Decode the image at `path`.
    fn open(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Read embedded capture metadata. `Ok(None)` means the file has none.
    fn read_metadata(&self, path: &Path) -> Result<Option<CaptureMetadata>, BackendError>;

    /// Encode `image` to `path`, choosing the format from the extension.
    fn save(&self, image: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError>;
}
