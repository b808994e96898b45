//! Shared test utilities for the photo-watermark test suite.
//!
//! Synthetic image writers (one per supported container) and a tiny TIFF
//! builder for EXIF fixtures, so tests never depend on binary files in the
//! repository.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let jpg = tmp.path().join("a.jpg");
//! create_test_jpeg(&jpg, 200, 100);
//! set_mtime(&jpg, 2021, 3, 4);
//! ```

use image::codecs::bmp::BmpEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageFormat, RgbImage};
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid JPEG with a gradient.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

/// Write a small valid RGB PNG with a gradient.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write a small valid BMP with a gradient.
pub fn create_test_bmp(path: &Path, width: u32, height: u32) {
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(path, ImageFormat::Bmp)
        .unwrap();
}

/// Write a single-channel grayscale PNG (not direct-color RGB).
pub fn create_gray_png(path: &Path, width: u32, height: u32) {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, image::Luma([90])))
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write an 8-bit indexed BMP: one palette byte per pixel.
pub fn create_palette_bmp(path: &Path, width: u32, height: u32) {
    let palette: Vec<[u8; 3]> = (0..=255u8).map(|i| [i, 255 - i, 64]).collect();
    let indices: Vec<u8> = (0..width * height).map(|i| (i % 256) as u8).collect();
    let mut file = std::fs::File::create(path).unwrap();
    BmpEncoder::new(&mut file)
        .encode_with_palette(&indices, width, height, ExtendedColorType::L8, Some(&palette))
        .unwrap();
}

/// Bits per pixel from a BMP's info header.
pub fn bmp_bit_count(path: &Path) -> u16 {
    let bytes = std::fs::read(path).unwrap();
    u16::from_le_bytes([bytes[28], bytes[29]])
}

// =========================================================================
// EXIF fixtures
// =========================================================================

const TIFF_ASCII: u16 = 2;
const TIFF_SHORT: u16 = 3;

/// Write a bare little-endian TIFF whose IFD0 holds the given ASCII fields
/// and, optionally, an Orientation SHORT.
///
/// It carries no pixel data: it exists only to exercise EXIF decoding.
pub fn write_exif_tiff(path: &Path, ascii: &[(u16, &str)], orientation: Option<u16>) {
    let mut entries: Vec<(u16, u16, Vec<u8>, u32)> = ascii
        .iter()
        .map(|(tag, text)| {
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(0);
            let count = bytes.len() as u32;
            (*tag, TIFF_ASCII, bytes, count)
        })
        .collect();
    if let Some(o) = orientation {
        entries.push((0x0112, TIFF_SHORT, o.to_le_bytes().to_vec(), 1));
    }
    entries.sort_by_key(|e| e.0);

    let ifd_offset = 8u32;
    let ifd_len = 2 + 12 * entries.len() as u32 + 4;
    let mut data_offset = ifd_offset + ifd_len;

    let mut ifd = Vec::new();
    let mut data = Vec::new();
    ifd.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for (tag, kind, bytes, count) in &entries {
        ifd.extend_from_slice(&tag.to_le_bytes());
        ifd.extend_from_slice(&kind.to_le_bytes());
        ifd.extend_from_slice(&count.to_le_bytes());
        if bytes.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..bytes.len()].copy_from_slice(bytes);
            ifd.extend_from_slice(&inline);
        } else {
            ifd.extend_from_slice(&data_offset.to_le_bytes());
            data.extend_from_slice(bytes);
            data_offset += bytes.len() as u32;
            if bytes.len() % 2 == 1 {
                data.push(0);
                data_offset += 1;
            }
        }
    }
    ifd.extend_from_slice(&0u32.to_le_bytes());

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&ifd_offset.to_le_bytes());
    out.extend_from_slice(&ifd);
    out.extend_from_slice(&data);
    std::fs::write(path, out).unwrap();
}

// =========================================================================
// Filesystem
// =========================================================================

/// Pin a file's modification time to local noon on the given date.
pub fn set_mtime(path: &Path, year: i32, month: u32, day: u32) {
    use chrono::{Local, NaiveDate, TimeZone};
    let noon = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap();
    let local = Local.from_local_datetime(&noon).single().unwrap();
    let ft = filetime::FileTime::from_unix_time(local.timestamp(), 0);
    filetime::set_file_mtime(path, ft).unwrap();
}
