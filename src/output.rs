//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Input:    /home/me/trip
//! Output:   /home/me/trip_watermark
//! Font:     /usr/share/fonts/truetype/msttcorefonts/arial.ttf (24px)
//! Color:    #ffffff, shadow #000000 at +2+2
//! Position: bottom-right, margin 20
//! --------------------------------------------------
//! Found 2 images
//! 001 IMG_0001.JPG
//!     Date: 2023年05月01日 (EXIF DateTime)
//!     Output: IMG_0001.JPG
//! 002 broken.png
//!     Failed: Image processing failed: ...
//!
//! Watermarked 1 of 2 images, 1 failed → /home/me/trip_watermark
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::process::{ProcessEvent, RunSummary};
use std::path::Path;

const RULE_WIDTH: usize = 50;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "image" } else { "images" }
}

/// Format a single progress event as display lines.
///
/// Each image leads with its positional index and file name; the date and
/// outcome follow as indented context.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::RunStarted {
            input_dir,
            output_dir,
            font_size,
            style,
            font,
            dry_run,
        } => {
            let mut lines = vec![
                format!("Input:    {}", input_dir.display()),
                format!("Output:   {}", output_dir.display()),
                format!("Font:     {} ({}px)", font, font_size),
                format!(
                    "Color:    {}, shadow {} at {:+}{:+}",
                    style.color, style.shadow.color, style.shadow.offset.0, style.shadow.offset.1
                ),
                format!("Position: {}, margin {}", style.anchor, style.margin),
            ];
            if *dry_run {
                lines.push("Mode:     dry run (nothing is written)".to_string());
            }
            lines.push("-".repeat(RULE_WIDTH));
            lines
        }
        ProcessEvent::ImagesFound { count } => {
            vec![format!("Found {} {}", count, plural(*count))]
        }
        ProcessEvent::NoImages => vec!["No supported images found".to_string()],
        ProcessEvent::ImageProcessed {
            index,
            source,
            output,
            date,
            date_source,
        } => {
            let mut lines = vec![
                format!("{} {}", format_index(*index), file_name(source)),
                format!("{}Date: {} ({})", indent(1), date, date_source),
            ];
            if let Some(output) = output {
                lines.push(format!("{}Output: {}", indent(1), file_name(output)));
            }
            lines
        }
        ProcessEvent::ImageFailed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name(source)),
            format!("{}Failed: {}", indent(1), error),
        ],
    }
}

pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

/// Format the end-of-run summary. Empty when nothing was discovered (the
/// run already said so).
pub fn format_summary(summary: &RunSummary, output_dir: &Path) -> Vec<String> {
    if summary.discovered == 0 {
        return Vec::new();
    }

    let failed = if summary.failed > 0 {
        format!(", {} failed", summary.failed)
    } else {
        String::new()
    };

    let line = if summary.previewed > 0 {
        format!(
            "Resolved dates for {} of {} {}{} (dry run, nothing written)",
            summary.previewed,
            summary.discovered,
            plural(summary.discovered),
            failed
        )
    } else {
        format!(
            "Watermarked {} of {} {}{} → {}",
            summary.watermarked,
            summary.discovered,
            plural(summary.discovered),
            failed,
            output_dir.display()
        )
    };
    vec![String::new(), line]
}

pub fn print_summary(summary: &RunSummary, output_dir: &Path) {
    for line in format_summary(summary, output_dir) {
        println!("{}", line);
    }
}
