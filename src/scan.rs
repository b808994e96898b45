//! Input discovery and output layout.
//!
//! A run reads one flat directory. Only its direct children are considered;
//! subdirectories (including a previous run's output) are never entered.
//!
//! ```text
//! trip/                     # input directory
//! ├── IMG_0001.JPG          # picked up (extension match ignores case)
//! ├── IMG_0002.png
//! ├── notes.txt             # ignored
//! └── raw/                  # ignored, not recursed
//! trip_watermark/           # created next to the input, same file names
//! ├── IMG_0001.JPG
//! └── IMG_0002.png
//! ```

use crate::imaging::supported_input_extensions;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Suffix appended to the input directory's name for the output directory.
pub const OUTPUT_SUFFIX: &str = "_watermark";

/// Whether `path` has an extension the backend can decode and re-encode.
pub fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

/// List the supported image files directly inside `dir`, sorted by name.
pub fn scan_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// `<parent>/<name>_watermark` for an input directory.
///
/// `input` should already be absolute; a bare `.` has no name to extend.
pub fn output_dir_for(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let parent = input.parent().unwrap_or(input);
    parent.join(format!("{name}{OUTPUT_SUFFIX}"))
}

/// Output path for one image: same file name, inside `output_dir`.
pub fn output_path_for(output_dir: &Path, image: &Path) -> PathBuf {
    match image.file_name() {
        Some(name) => output_dir.join(name),
        None => output_dir.to_path_buf(),
    }
}
