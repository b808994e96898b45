//! Batch watermarking.
//!
//! Takes a flat input directory and writes a date-stamped copy of every
//! supported image into `<name>_watermark/` beside it.
//!
//! ## Per-image flow
//!
//! ```text
//! resolve date ──► open ──► normalize to RGB8 ──► rasterize label
//!      │                                               │
//!  EXIF → mtime → today                      place by anchor, blend shadow
//!                                                then text ──► save
//! ```
//!
//! The font is selected once, when the [`RunContext`] is built, and reused for
//! every image. Images are processed one at a time in file-name order.
//!
//! ## Failures
//!
//! A missing input directory stops the run before anything is written. Any
//! error on a single image (decode, encode, write) is reported as
//! [`ProcessEvent::ImageFailed`], counted, and the batch moves on.

use crate::config::{ConfigError, WatermarkConfig};
use crate::date::{DateSource, resolve_date};
use crate::imaging::{
    BackendError, FontSelector, FontSource, ImageBackend, Quality, RustBackend, SelectedFont,
    WatermarkStyle, compose_watermark,
};
use crate::scan::{self, ScanError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Everything shared by the images of one run. Read-only once built.
#[derive(Debug)]
pub struct RunContext {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub font: SelectedFont,
    pub style: WatermarkStyle,
    pub quality: Quality,
    /// Resolve and report dates without writing anything.
    pub dry_run: bool,
}

/// Fail with [`ProcessError::InputNotFound`] unless `input_dir` is a directory.
pub fn ensure_input_dir(input_dir: &Path) -> Result<(), ProcessError> {
    if input_dir.is_dir() {
        Ok(())
    } else {
        Err(ProcessError::InputNotFound(input_dir.to_path_buf()))
    }
}

impl RunContext {
    /// Check the input directory, derive the output directory and pick the font.
    pub fn new(
        input_dir: &Path,
        config: &WatermarkConfig,
        fonts: &FontSelector,
        dry_run: bool,
    ) -> Result<Self, ProcessError> {
        ensure_input_dir(input_dir)?;
        let input_dir = fs::canonicalize(input_dir)?;
        let output_dir = scan::output_dir_for(&input_dir);
        let style = config.style()?;
        let font = fonts.select(&config.fonts.candidates, config.font_size);

        Ok(Self {
            input_dir,
            output_dir,
            font,
            style,
            quality: config.quality(),
            dry_run,
        })
    }
}

/// Progress events emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    RunStarted {
        input_dir: PathBuf,
        output_dir: PathBuf,
        font_size: u32,
        style: WatermarkStyle,
        font: FontSource,
        dry_run: bool,
    },
    ImagesFound {
        count: usize,
    },
    NoImages,
    ImageProcessed {
        index: usize,
        source: PathBuf,
        /// `None` on a dry run.
        output: Option<PathBuf>,
        date: String,
        date_source: DateSource,
    },
    ImageFailed {
        index: usize,
        source: PathBuf,
        error: String,
    },
}

/// Counts for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub watermarked: usize,
    /// Dates resolved on a dry run.
    pub previewed: usize,
    pub failed: usize,
}

/// Outcome of one successfully handled image.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub output: Option<PathBuf>,
    pub date: String,
    pub date_source: DateSource,
}

pub fn run(
    ctx: &RunContext,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, ProcessError> {
    run_with_backend(&RustBackend::new(), ctx, progress)
}

/// Run the batch using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    ctx: &RunContext,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, ProcessError> {
    let emit = |event: ProcessEvent| {
        if let Some(tx) = &progress {
            // A closed receiver only means nobody is printing.
            tx.send(event).ok();
        }
    };

    emit(ProcessEvent::RunStarted {
        input_dir: ctx.input_dir.clone(),
        output_dir: ctx.output_dir.clone(),
        font_size: ctx.font.spec.size_px,
        style: ctx.style,
        font: ctx.font.spec.source.clone(),
        dry_run: ctx.dry_run,
    });

    if !ctx.dry_run {
        fs::create_dir_all(&ctx.output_dir)?;
    }

    let images = scan::scan_images(&ctx.input_dir)?;
    let mut summary = RunSummary {
        discovered: images.len(),
        ..RunSummary::default()
    };
    if images.is_empty() {
        emit(ProcessEvent::NoImages);
        return Ok(summary);
    }
    emit(ProcessEvent::ImagesFound {
        count: images.len(),
    });

    for (i, source) in images.iter().enumerate() {
        let index = i + 1;
        match process_image(backend, ctx, source) {
            Ok(done) => {
                if done.output.is_some() {
                    summary.watermarked += 1;
                } else {
                    summary.previewed += 1;
                }
                emit(ProcessEvent::ImageProcessed {
                    index,
                    source: source.clone(),
                    output: done.output,
                    date: done.date,
                    date_source: done.date_source,
                });
            }
            Err(e) => {
                warn!(path = %source.display(), error = %e, "image failed");
                summary.failed += 1;
                emit(ProcessEvent::ImageFailed {
                    index,
                    source: source.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

/// Watermark a single image into the run's output directory.
pub fn process_image(
    backend: &impl ImageBackend,
    ctx: &RunContext,
    source: &Path,
) -> Result<ProcessedImage, ProcessError> {
    let resolved = resolve_date(backend, source);
    let date = resolved.text();

    if ctx.dry_run {
        return Ok(ProcessedImage {
            output: None,
            date,
            date_source: resolved.source,
        });
    }

    let image = backend.open(source)?;
    let stamped = compose_watermark(image, &date, ctx.font.renderer(), &ctx.style);
    debug!(
        path = %source.display(),
        x = stamped.placement.x,
        y = stamped.placement.y,
        width = stamped.footprint.0,
        height = stamped.footprint.1,
        "label placed"
    );

    let output = scan::output_path_for(&ctx.output_dir, source);
    if let Err(e) = backend.save(&stamped.image, &output, ctx.quality) {
        // Don't leave a half-written file behind.
        if output.exists() {
            if let Err(cleanup) = fs::remove_file(&output) {
                warn!(path = %output.display(), error = %cleanup, "could not remove partial output");
            }
        }
        return Err(e.into());
    }

    Ok(ProcessedImage {
        output: Some(output),
        date,
        date_source: resolved.source,
    })
}
