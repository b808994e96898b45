//! Pure placement math for watermark labels.
//!
//! All functions here are pure and testable without any I/O or images.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named reference position for the label on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    TopCenter,
    BottomCenter,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown position '{0}' (expected one of: {names})", names = Anchor::names().join(", "))]
pub struct AnchorParseError(pub String);

impl Anchor {
    pub const ALL: [Anchor; 7] = [
        Anchor::TopLeft,
        Anchor::TopRight,
        Anchor::BottomLeft,
        Anchor::BottomRight,
        Anchor::Center,
        Anchor::TopCenter,
        Anchor::BottomCenter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopRight => "top-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomRight => "bottom-right",
            Anchor::Center => "center",
            Anchor::TopCenter => "top-center",
            Anchor::BottomCenter => "bottom-center",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|a| a.name()).collect()
    }

    /// Exact, case-sensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Anchor> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Lenient lookup: anything unrecognized lands top-left.
    pub fn from_name_or_default(name: &str) -> Anchor {
        Self::from_name(name).unwrap_or_default()
    }
}

impl FromStr for Anchor {
    type Err = AnchorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| AnchorParseError(s.to_string()))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-left corner of the label's bounding box, in canvas pixels.
///
/// Not clamped: when the label is larger than the canvas minus margins the
/// coordinates can be negative or run past the far edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
}

impl Placement {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Calculate where the label's bounding box starts.
///
/// # Arguments
/// * `anchor` - Reference position
/// * `image` - Canvas size `(width, height)`
/// * `text` - Label footprint `(width, height)`
/// * `margin` - Gap kept on every edge the anchor touches
///
/// Centered axes use floor division, so odd leftovers round toward the
/// top-left and oversized labels go negative rather than toward zero.
///
/// ```
/// # use photo_watermark::imaging::{Anchor, Placement, calculate_position};
/// assert_eq!(
///     calculate_position(Anchor::Center, (200, 100), (50, 20), 20),
///     Placement::new(75, 40)
/// );
/// ```
pub fn calculate_position(
    anchor: Anchor,
    image: (u32, u32),
    text: (u32, u32),
    margin: u32,
) -> Placement {
    let (img_w, img_h) = (image.0 as i64, image.1 as i64);
    let (txt_w, txt_h) = (text.0 as i64, text.1 as i64);
    let m = margin as i64;

    let left = m;
    let right = img_w - txt_w - m;
    let h_center = (img_w - txt_w).div_euclid(2);
    let top = m;
    let bottom = img_h - txt_h - m;
    let v_center = (img_h - txt_h).div_euclid(2);

    let (x, y) = match anchor {
        Anchor::TopLeft => (left, top),
        Anchor::TopRight => (right, top),
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomRight => (right, bottom),
        Anchor::Center => (h_center, v_center),
        Anchor::TopCenter => (h_center, top),
        Anchor::BottomCenter => (h_center, bottom),
    };

    Placement::new(saturate(x), saturate(y))
}

fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
