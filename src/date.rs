//! Capture date resolution.
//!
//! Every image gets a date label, so resolution never fails. Sources are
//! tried in order and the first that yields a real calendar date wins:
//!
//! 1. **Embedded metadata**: the [`DATE_TAGS`] fields, in that order. A field
//!    counts only if it is text at least 10 characters long whose part before
//!    the first space parses as `YYYY:MM:DD`. The time of day is discarded.
//! 2. **File modification time**, as a local calendar date.
//! 3. **Today**, local time.
//!
//! The first tag that parses wins even when a later tag holds a different
//! date. `DateTime` is listed first because cameras and editors that only
//! write one date field write that one.
//!
//! The label is rendered as `2023年05月01日` (zero-padded month and day).

use crate::imaging::ImageBackend;
use crate::metadata::CaptureMetadata;
use chrono::{DateTime, Local, NaiveDate};
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Date fields probed, highest priority first.
pub const DATE_TAGS: [&str; 3] = ["DateTime", "DateTimeOriginal", "DateTimeDigitized"];

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d";
const LABEL_FORMAT: &str = "%Y年%m月%d日";

/// Which fallback produced a [`ResolvedDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Parsed from the named metadata field.
    Metadata(&'static str),
    FileModified,
    Now,
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSource::Metadata(tag) => write!(f, "EXIF {tag}"),
            DateSource::FileModified => f.write_str("file modified time"),
            DateSource::Now => f.write_str("current date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

impl ResolvedDate {
    /// The watermark label for this date.
    pub fn text(&self) -> String {
        format_date(self.date)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(LABEL_FORMAT).to_string()
}

/// First date field in [`DATE_TAGS`] order that parses, with its tag name.
pub fn shooting_date(metadata: &CaptureMetadata) -> Option<(NaiveDate, &'static str)> {
    DATE_TAGS.iter().find_map(|&tag| {
        let text = metadata.get(tag)?.as_text()?;
        if text.chars().count() < 10 {
            return None;
        }
        let day = text.split(' ').next().unwrap_or(text);
        match NaiveDate::parse_from_str(day, EXIF_DATE_FORMAT) {
            Ok(date) => Some((date, tag)),
            Err(e) => {
                warn!(tag, value = text, error = %e, "unparseable date field");
                None
            }
        }
    })
}

/// Resolve the label date for the image at `path`.
///
/// Metadata read errors are logged and treated as "no metadata".
pub fn resolve_date(backend: &impl ImageBackend, path: &Path) -> ResolvedDate {
    let metadata = match backend.read_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read metadata");
            None
        }
    };

    if let Some((date, tag)) = metadata.as_ref().and_then(shooting_date) {
        return ResolvedDate {
            date,
            source: DateSource::Metadata(tag),
        };
    }

    match modified_date(path) {
        Ok(date) => ResolvedDate {
            date,
            source: DateSource::FileModified,
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "no modification time, using today");
            ResolvedDate {
                date: Local::now().date_naive(),
                source: DateSource::Now,
            }
        }
    }
}

fn modified_date(path: &Path) -> std::io::Result<NaiveDate> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::metadata::MetadataValue;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text_fields(fields: &[(&str, &str)]) -> CaptureMetadata {
        fields
            .iter()
            .map(|(k, v)| (*k, MetadataValue::Text(v.to_string())))
            .collect()
    }

    // =========================================================================
    // format_date
    // =========================================================================

    #[test]
    fn format_pads_month_and_day() {
        assert_eq!(format_date(ymd(2023, 5, 1)), "2023年05月01日");
        assert_eq!(format_date(ymd(1999, 12, 31)), "1999年12月31日");
    }

    // =========================================================================
    // shooting_date
    // =========================================================================

    #[test]
    fn first_tag_in_priority_order_wins() {
        let meta = text_fields(&[
            ("DateTime", "2022:01:01 00:00:00"),
            ("DateTimeOriginal", "2023:05:01 10:00:00"),
        ]);
        assert_eq!(shooting_date(&meta), Some((ymd(2022, 1, 1), "DateTime")));
    }

    #[test]
    fn digitized_used_when_only_one_present() {
        let meta = text_fields(&[("DateTimeDigitized", "2020:02:29 23:59:59")]);
        assert_eq!(
            shooting_date(&meta),
            Some((ymd(2020, 2, 29), "DateTimeDigitized"))
        );
    }

    #[test]
    fn wrong_separators_fall_through_to_next_tag() {
        let meta = text_fields(&[
            ("DateTime", "2023/05/01 10:00:00"),
            ("DateTimeOriginal", "2021:07:04 08:30:00"),
        ]);
        assert_eq!(
            shooting_date(&meta),
            Some((ymd(2021, 7, 4), "DateTimeOriginal"))
        );
    }

    #[test]
    fn impossible_calendar_date_is_rejected() {
        let meta = text_fields(&[("DateTime", "2023:02:30 10:00:00")]);
        assert_eq!(shooting_date(&meta), None);
    }

    #[test]
    fn short_values_are_skipped() {
        let meta = text_fields(&[
            ("DateTime", "2023:05"),
            ("DateTimeOriginal", "2019:11:11"),
        ]);
        assert_eq!(
            shooting_date(&meta),
            Some((ymd(2019, 11, 11), "DateTimeOriginal"))
        );
    }

    #[test]
    fn non_text_values_are_skipped() {
        let meta: CaptureMetadata = [
            ("DateTime", MetadataValue::Integer(20230501)),
            (
                "DateTimeOriginal",
                MetadataValue::Other("2023:05:01 10:00:00".into()),
            ),
            (
                "DateTimeDigitized",
                MetadataValue::Text("2018:08:08 08:08:08".into()),
            ),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            shooting_date(&meta),
            Some((ymd(2018, 8, 8), "DateTimeDigitized"))
        );
    }

    #[test]
    fn unrelated_fields_yield_nothing() {
        let meta = text_fields(&[("Make", "Acme Camera Co")]);
        assert_eq!(shooting_date(&meta), None);
    }

    // =========================================================================
    // resolve_date
    // =========================================================================

    #[test]
    fn resolve_prefers_metadata() {
        let backend = MockBackend::with_metadata(vec![Some(text_fields(&[(
            "DateTimeOriginal",
            "2023:05:01 10:00:00",
        )]))]);
        let resolved = resolve_date(&backend, Path::new("/photos/a.jpg"));

        assert_eq!(resolved.source, DateSource::Metadata("DateTimeOriginal"));
        assert_eq!(resolved.text(), "2023年05月01日");
    }

    #[test]
    fn resolve_without_metadata_uses_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        create_test_png(&path, 4, 4);
        set_mtime(&path, 2021, 3, 4);

        let resolved = resolve_date(&MockBackend::new(), &path);
        assert_eq!(resolved.source, DateSource::FileModified);
        assert_eq!(resolved.text(), "2021年03月04日");
    }

    #[test]
    fn resolve_with_unparseable_metadata_uses_mtime() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.jpg");
        create_test_jpeg(&path, 4, 4);
        set_mtime(&path, 2015, 10, 21);

        let backend =
            MockBackend::with_metadata(vec![Some(text_fields(&[("DateTime", "2023/05/01")]))]);
        let resolved = resolve_date(&backend, &path);
        assert_eq!(resolved.source, DateSource::FileModified);
        assert_eq!(resolved.date, ymd(2015, 10, 21));
    }

    #[test]
    fn resolve_metadata_error_is_recovered() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.jpg");
        create_test_jpeg(&path, 4, 4);
        set_mtime(&path, 2010, 1, 2);

        let backend = MockBackend {
            fail_metadata: true,
            ..MockBackend::default()
        };
        let resolved = resolve_date(&backend, &path);
        assert_eq!(resolved.source, DateSource::FileModified);
        assert_eq!(resolved.date, ymd(2010, 1, 2));
    }

    #[test]
    fn resolve_missing_file_uses_today() {
        let before = Local::now().date_naive();
        let resolved = resolve_date(&MockBackend::new(), Path::new("/nonexistent/a.jpg"));
        let after = Local::now().date_naive();

        assert_eq!(resolved.source, DateSource::Now);
        assert!(resolved.date == before || resolved.date == after);
    }

    #[test]
    fn resolve_reads_real_exif() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exif.tif");
        write_exif_tiff(
            &path,
            &[
                (0x0132, "2022:01:01 00:00:00"),
                (0x9003, "2023:05:01 10:00:00"),
            ],
            None,
        );

        let resolved = resolve_date(&RustBackend::new(), &path);
        assert_eq!(resolved.source, DateSource::Metadata("DateTime"));
        assert_eq!(resolved.text(), "2022年01月01日");
    }

    #[test]
    fn date_source_display() {
        assert_eq!(DateSource::Metadata("DateTime").to_string(), "EXIF DateTime");
        assert_eq!(DateSource::FileModified.to_string(), "file modified time");
        assert_eq!(DateSource::Now.to_string(), "current date");
    }
}
