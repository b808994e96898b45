//! # Photo Watermark
//!
//! Batch-stamps a directory of photos with the date each was taken, as a
//! shadowed text label in a chosen corner.
//!
//! ```text
//! photos/IMG_0001.JPG  ──►  photos_watermark/IMG_0001.JPG   (2023年05月01日 bottom-right)
//! ```
//!
//! # Pipeline
//!
//! For every supported file in the input directory, in name order:
//!
//! ```text
//! 1. Date      EXIF DateTime → DateTimeOriginal → DateTimeDigitized → mtime → today
//! 2. Decode    any supported container, normalized to 8-bit RGB
//! 3. Place     rasterize the label, anchor it with a fixed margin
//! 4. Stamp     blend a drop shadow, then the label
//! 5. Encode    same file name, same format, in <input>_watermark/
//! ```
//!
//! The font is chosen once per run from an ordered candidate list; when no
//! candidate loads, a bitmap font compiled into the binary is used instead.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists supported images in the input directory; output layout |
//! | [`metadata`] | EXIF decoding into a tag-name keyed map |
//! | [`date`] | Capture date resolution with file-time and clock fallbacks |
//! | [`imaging`] | Decode/encode backend, placement math, glyph rendering, compositing |
//! | [`config`] | `watermark.toml` loading, validation, merging with CLI flags |
//! | [`process`] | The batch run: context, per-image flow, progress events |
//! | [`output`] | CLI output formatting of progress events and the summary |
//!
//! # Design Decisions
//!
//! ## Nothing Fails the Date
//!
//! Every image gets a label. Missing or malformed metadata falls through to
//! the file's modification time, then to today's date. Each fallback is
//! reported through [`date::DateSource`] so output and tests can tell which
//! one was used.
//!
//! ## One Image at a Time
//!
//! The run is single-threaded and synchronous. The only shared state is the
//! [`process::RunContext`], built before the first image and read-only after.
//!
//! ## Unclamped Placement
//!
//! [`imaging::calculate_position`] returns signed coordinates and never clamps.
//! A label larger than the photo simply gets clipped when it is drawn.

pub mod config;
pub mod date;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
