//! Pure Rust image backend, statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, BMP) | `image::ImageReader`, format sniffed from content |
//! | EXIF metadata | `kamadak-exif` via [`crate::metadata`] |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with a quality setting |
//! | Encode → PNG / TIFF / BMP | `image` lossless encoders, chosen by extension |

use super::backend::{BackendError, ImageBackend};
use super::params::Quality;
use crate::metadata::{self, CaptureMetadata};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions the watermark run accepts, paired with their container.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Lowercase extensions that can be both decoded and re-encoded.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn output_format(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    ImageFormat::from_extension(&ext)
        .filter(|fmt| fmt.writing_enabled())
        .ok_or(BackendError::UnsupportedFormat(ext))
}

fn save_jpeg(image: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let writer = BufWriter::new(File::create(path)?);
    let encoder = JpegEncoder::new_with_quality(writer, quality.value() as u8);
    image
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))
}

impl ImageBackend for RustBackend {
    fn open(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to decode {}: {}",
                    path.display(),
                    e
                ))
            })
    }

    fn read_metadata(&self, path: &Path) -> Result<Option<CaptureMetadata>, BackendError> {
        Ok(metadata::read_capture_metadata(path)?)
    }

    fn save(&self, image: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
        match output_format(path)? {
            ImageFormat::Jpeg => save_jpeg(image, path, quality),
            format => image.save_with_format(path, format).map_err(|e| {
                BackendError::ProcessingFailed(format!(
                    "Failed to encode {}: {}",
                    path.display(),
                    e
                ))
            }),
        }
    }
}
