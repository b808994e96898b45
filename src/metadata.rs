//! Embedded capture metadata.
//!
//! Photos carry an EXIF block describing how and when they were taken. This
//! module decodes that block into a [`CaptureMetadata`] map keyed by tag name,
//! which the [`date`](crate::date) resolver probes for a capture date.
//!
//! ## Tag names
//!
//! EXIF identifies fields by numeric id. Names come from the fixed
//! [`TAG_NAMES`] table below; ids it does not list keep a hexadecimal name
//! such as `0xa420`, so nothing is dropped.
//!
//! Only primary-image fields from the TIFF and Exif IFDs are kept. Thumbnail
//! IFD fields would shadow the primary ones and GPS/Interop ids collide with
//! the TIFF id space.
//!
//! ## Values
//!
//! | EXIF type | [`MetadataValue`] |
//! |---|---|
//! | ASCII | `Text` (first string, trailing NULs stripped) |
//! | single SHORT / LONG | `Integer` |
//! | anything else | `Other` (human-readable rendering) |

use exif::{Context, In, Reader, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("EXIF decode failed: {0}")]
    Exif(#[from] exif::Error),
}

/// Tag id → name for the TIFF/Exif fields photographers run into.
pub const TAG_NAMES: &[(u16, &str)] = &[
    (0x010e, "ImageDescription"),
    (0x010f, "Make"),
    (0x0110, "Model"),
    (0x0112, "Orientation"),
    (0x011a, "XResolution"),
    (0x011b, "YResolution"),
    (0x0128, "ResolutionUnit"),
    (0x0131, "Software"),
    (0x0132, "DateTime"),
    (0x013b, "Artist"),
    (0x0213, "YCbCrPositioning"),
    (0x8298, "Copyright"),
    (0x829a, "ExposureTime"),
    (0x829d, "FNumber"),
    (0x8769, "ExifOffset"),
    (0x8822, "ExposureProgram"),
    (0x8825, "GPSInfo"),
    (0x8827, "ISOSpeedRatings"),
    (0x9000, "ExifVersion"),
    (0x9003, "DateTimeOriginal"),
    (0x9004, "DateTimeDigitized"),
    (0x9010, "OffsetTime"),
    (0x9011, "OffsetTimeOriginal"),
    (0x9012, "OffsetTimeDigitized"),
    (0x9201, "ShutterSpeedValue"),
    (0x9202, "ApertureValue"),
    (0x9204, "ExposureBiasValue"),
    (0x9207, "MeteringMode"),
    (0x9209, "Flash"),
    (0x920a, "FocalLength"),
    (0x927c, "MakerNote"),
    (0x9286, "UserComment"),
    (0x9290, "SubsecTime"),
    (0x9291, "SubsecTimeOriginal"),
    (0x9292, "SubsecTimeDigitized"),
    (0xa001, "ColorSpace"),
    (0xa002, "ExifImageWidth"),
    (0xa003, "ExifImageHeight"),
    (0xa402, "ExposureMode"),
    (0xa403, "WhiteBalance"),
    (0xa405, "FocalLengthIn35mmFilm"),
    (0xa406, "SceneCaptureType"),
    (0xa432, "LensSpecification"),
    (0xa433, "LensMake"),
    (0xa434, "LensModel"),
];

/// Name for a tag id, or `0x....` when the table doesn't list it.
pub fn tag_name(id: u16) -> String {
    TAG_NAMES
        .iter()
        .find(|(tag, _)| *tag == id)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("0x{id:04x}"))
}

/// A decoded metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Text(String),
    Integer(u32),
    Other(String),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Read-only view of an image's embedded metadata, keyed by tag name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMetadata {
    fields: BTreeMap<String, MetadataValue>,
}

impl CaptureMetadata {
    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, MetadataValue)> for CaptureMetadata {
    fn from_iter<I: IntoIterator<Item = (K, MetadataValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Decode the EXIF block of the file at `path`.
///
/// Returns `Ok(None)` when the container simply has no EXIF block, and `Err`
/// when reading or decoding fails. Callers treat both as "no metadata"; the
/// distinction only decides whether it's worth a log line.
pub fn read_capture_metadata(path: &Path) -> Result<Option<CaptureMetadata>, MetadataError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let metadata: CaptureMetadata = exif
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .filter(|f| matches!(f.tag.context(), Context::Tiff | Context::Exif))
        .map(|f| (tag_name(f.tag.number()), convert_value(f)))
        .collect();

    Ok(if metadata.is_empty() {
        None
    } else {
        Some(metadata)
    })
}

fn convert_value(field: &exif::Field) -> MetadataValue {
    match &field.value {
        Value::Ascii(parts) => {
            let first = parts.first().map(Vec::as_slice).unwrap_or_default();
            let text = String::from_utf8_lossy(first);
            MetadataValue::Text(text.trim_end_matches('\0').to_string())
        }
        Value::Short(v) if v.len() == 1 => MetadataValue::Integer(v[0] as u32),
        Value::Long(v) if v.len() == 1 => MetadataValue::Integer(v[0]),
        _ => MetadataValue::Other(field.display_value().to_string()),
    }
}
