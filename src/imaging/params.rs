//! Parameter types for watermark operations.
//!
//! These structs describe *what* to draw, not *how*. They sit between the
//! [`operations`](super::operations) module (which decides where the label
//! goes) and the [`glyphs`](super::glyphs) renderers (which produce pixels).
//!
//! ## Types
//!
//! - [`Quality`] — JPEG encoding quality (1–100, default 95). Clamped on construction.
//! - [`TextColor`] — RGB color parsed from a name (`white`) or hex (`#fff`, `#ffffff`).
//! - [`Shadow`] — Drop-shadow color and pixel offset.
//! - [`WatermarkStyle`] — Everything the composer needs besides the text and renderer.

use super::calculations::Anchor;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown color '{0}' (use a name like 'white' or a hex value like '#ffcc00')")]
pub struct ColorParseError(pub String);

/// Named colors accepted on the command line and in `watermark.toml`.
///
/// Values follow the CSS/X11 definitions, so `green` is `#008000`, not `#00ff00`.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("orange", [255, 165, 0]),
    ("gold", [255, 215, 0]),
    ("purple", [128, 0, 128]),
    ("pink", [255, 192, 203]),
    ("brown", [165, 42, 42]),
    ("navy", [0, 0, 128]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("teal", [0, 128, 128]),
];

/// An opaque RGB text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextColor(pub [u8; 3]);

impl TextColor {
    pub const WHITE: TextColor = TextColor([255, 255, 255]);
    pub const BLACK: TextColor = TextColor([0, 0, 0]);

    pub fn rgb(self) -> image::Rgb<u8> {
        image::Rgb(self.0)
    }
}

impl FromStr for TextColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(hex) = name.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorParseError(s.to_string()));
        }
        NAMED_COLORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, rgb)| TextColor(*rgb))
            .ok_or_else(|| ColorParseError(s.to_string()))
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

fn parse_hex(hex: &str) -> Option<TextColor> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        // #RGB: each digit doubles, 0xF -> 0xFF
        3 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&hex[i..i + 1], 16).ok()? * 17;
            }
            Some(TextColor(rgb))
        }
        6 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
            }
            Some(TextColor(rgb))
        }
        _ => None,
    }
}

/// Drop shadow drawn underneath the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shadow {
    pub color: TextColor,
    /// Offset from the label origin, in pixels (right, down).
    pub offset: (i32, i32),
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: TextColor::BLACK,
            offset: (2, 2),
        }
    }
}

/// Full description of how a label is placed and painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkStyle {
    pub color: TextColor,
    pub shadow: Shadow,
    pub anchor: Anchor,
    /// Distance from every edge the anchor touches.
    pub margin: u32,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            color: TextColor::WHITE,
            shadow: Shadow::default(),
            anchor: Anchor::BottomRight,
            margin: 20,
        }
    }
}
