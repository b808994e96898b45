//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` (JPEG, PNG, TIFF, BMP) |
//! | **EXIF metadata** | `kamadak-exif` |
//! | **Outline text** | `ab_glyph` |
//! | **Fallback text** | `spleen-font` bitmap faces |
//!
//! The module is split into:
//! - **Calculations**: Pure placement math (unit testable)
//! - **Parameters**: Colors, shadow and style describing a label
//! - **Glyphs**: Text rasterizers and font selection
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Compositing a rasterized label onto pixels

pub mod backend;
mod calculations;
pub mod glyphs;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{Anchor, AnchorParseError, Placement, calculate_position};
pub use glyphs::{
    BitmapRenderer, FontSelector, FontSource, GlyphMask, GlyphRenderer, MAX_FONT_SIZE,
    OutlineRenderer, RenderSpec, SelectedFont,
};
pub use operations::{Watermarked, compose_watermark, normalize_rgb};
pub use params::{ColorParseError, Quality, Shadow, TextColor, WatermarkStyle};
pub use rust_backend::{RustBackend, supported_input_extensions};
