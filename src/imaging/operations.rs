//! High-level image operations.
//!
//! These functions combine the placement math with a glyph renderer. They
//! work on in-memory pixels only; decoding and encoding stay in the backend.

use super::calculations::{Placement, calculate_position};
use super::glyphs::{GlyphMask, GlyphRenderer};
use super::params::{TextColor, WatermarkStyle};
use image::{DynamicImage, RgbImage};

/// Convert any decoded image to 8-bit RGB.
///
/// Already-RGB8 images pass through without a copy. Palette, grayscale,
/// alpha and 16-bit inputs are converted; alpha is dropped.
pub fn normalize_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

/// A composited image plus where its label landed.
#[derive(Debug, Clone)]
pub struct Watermarked {
    pub image: RgbImage,
    pub placement: Placement,
    pub footprint: (u32, u32),
}

/// Stamp `text` onto `image` with a drop shadow.
///
/// The text is rasterized once; its cropped mask size is the footprint fed
/// to [`calculate_position`]. The shadow is blended first at
/// `placement + style.shadow.offset`, then the text at `placement`.
pub fn compose_watermark(
    image: DynamicImage,
    text: &str,
    renderer: &dyn GlyphRenderer,
    style: &WatermarkStyle,
) -> Watermarked {
    let mut canvas = normalize_rgb(image);
    let mask = renderer.rasterize(text);
    let footprint = (mask.width, mask.height);
    let placement = calculate_position(style.anchor, canvas.dimensions(), footprint, style.margin);

    if !mask.is_empty() {
        let (dx, dy) = style.shadow.offset;
        blend_mask(&mut canvas, &mask, placement.offset(dx, dy), style.shadow.color);
        blend_mask(&mut canvas, &mask, placement, style.color);
    }

    Watermarked {
        image: canvas,
        placement,
        footprint,
    }
}

/// Blend `color` into `canvas` through `mask`, with the mask's top-left at
/// `at`. Coverage is a linear alpha; pixels off the canvas are skipped.
pub fn blend_mask(canvas: &mut RgbImage, mask: &GlyphMask, at: Placement, color: TextColor) {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);

    for my in 0..mask.height {
        let y = at.y as i64 + my as i64;
        if !(0..canvas_h).contains(&y) {
            continue;
        }
        for mx in 0..mask.width {
            let x = at.x as i64 + mx as i64;
            if !(0..canvas_w).contains(&x) {
                continue;
            }
            let alpha = mask.get(mx, my).clamp(0.0, 1.0);
            if alpha == 0.0 {
                continue;
            }
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            for (channel, ink) in pixel.0.iter_mut().zip(color.rgb().0) {
                let mixed = *channel as f32 * (1.0 - alpha) + ink as f32 * alpha;
                *channel = mixed.round() as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::Anchor;
    use crate::imaging::glyphs::BitmapRenderer;
    use crate::imaging::params::Shadow;
    use image::{GrayImage, Rgb, RgbaImage};

    const GRAY: Rgb<u8> = Rgb([100, 100, 100]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    /// Renders every string as a solid block of fixed size.
    struct BlockRenderer {
        width: u32,
        height: u32,
    }

    impl GlyphRenderer for BlockRenderer {
        fn rasterize(&self, text: &str) -> GlyphMask {
            if text.is_empty() {
                return GlyphMask::empty();
            }
            GlyphMask {
                width: self.width,
                height: self.height,
                coverage: vec![1.0; (self.width * self.height) as usize],
            }
        }
    }

    fn gray_canvas(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, GRAY))
    }

    fn style(anchor: Anchor) -> WatermarkStyle {
        WatermarkStyle {
            anchor,
            ..WatermarkStyle::default()
        }
    }

    // =========================================================================
    // normalize_rgb
    // =========================================================================

    #[test]
    fn normalize_keeps_rgb8_pixels() {
        let img = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let out = normalize_rgb(DynamicImage::ImageRgb8(img.clone()));
        assert_eq!(out, img);
    }

    #[test]
    fn normalize_expands_grayscale() {
        let gray = GrayImage::from_pixel(5, 4, image::Luma([90]));
        let out = normalize_rgb(DynamicImage::ImageLuma8(gray));
        assert_eq!(out.dimensions(), (5, 4));
        assert_eq!(*out.get_pixel(0, 0), Rgb([90, 90, 90]));
    }

    #[test]
    fn normalize_drops_alpha() {
        let rgba = RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 0]));
        let out = normalize_rgb(DynamicImage::ImageRgba8(rgba));
        assert_eq!(*out.get_pixel(1, 1), Rgb([10, 20, 30]));
    }

    #[test]
    fn normalize_narrows_16_bit() {
        let wide = image::ImageBuffer::<Rgb<u16>, Vec<u16>>::from_pixel(2, 2, Rgb([65535, 0, 0]));
        let out = normalize_rgb(DynamicImage::ImageRgb16(wide));
        assert_eq!(*out.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    // =========================================================================
    // compose_watermark
    // =========================================================================

    #[test]
    fn compose_preserves_dimensions() {
        let renderer = BlockRenderer { width: 50, height: 20 };
        let out = compose_watermark(
            gray_canvas(200, 100),
            "label",
            &renderer,
            &style(Anchor::BottomRight),
        );
        assert_eq!(out.image.dimensions(), (200, 100));
        assert_eq!(out.footprint, (50, 20));
        assert_eq!(out.placement, Placement::new(130, 60));
    }

    #[test]
    fn text_is_drawn_over_shadow() {
        // Text occupies (20..30, 20..25); shadow (22..32, 22..27).
        let renderer = BlockRenderer { width: 10, height: 5 };
        let out = compose_watermark(gray_canvas(100, 50), "x", &renderer, &style(Anchor::TopLeft));
        let img = &out.image;

        assert_eq!(*img.get_pixel(20, 20), WHITE);
        assert_eq!(*img.get_pixel(24, 23), WHITE, "overlap shows text, not shadow");
        assert_eq!(*img.get_pixel(31, 26), BLACK, "shadow peeks out bottom-right");
        assert_eq!(*img.get_pixel(19, 19), GRAY);
        assert_eq!(*img.get_pixel(32, 27), GRAY);
    }

    #[test]
    fn shadow_uses_configured_color_and_offset() {
        let renderer = BlockRenderer { width: 4, height: 4 };
        let custom = WatermarkStyle {
            anchor: Anchor::TopLeft,
            margin: 10,
            color: TextColor([255, 0, 0]),
            shadow: Shadow {
                color: TextColor([0, 0, 255]),
                offset: (5, 0),
            },
        };
        let out = compose_watermark(gray_canvas(50, 50), "x", &renderer, &custom);

        assert_eq!(*out.image.get_pixel(10, 10), Rgb([255, 0, 0]));
        assert_eq!(*out.image.get_pixel(16, 10), Rgb([0, 0, 255]));
        assert_eq!(*out.image.get_pixel(10, 14), GRAY, "no vertical shadow offset");
    }

    #[test]
    fn compose_accepts_grayscale_input() {
        let gray = GrayImage::from_pixel(60, 40, image::Luma([50]));
        let renderer = BlockRenderer { width: 8, height: 8 };
        let out = compose_watermark(
            DynamicImage::ImageLuma8(gray),
            "x",
            &renderer,
            &style(Anchor::Center),
        );
        assert_eq!(out.image.dimensions(), (60, 40));
        assert_eq!(*out.image.get_pixel(26, 16), WHITE);
    }

    #[test]
    fn decoded_palette_and_gray_files_save_as_rgb() {
        use crate::imaging::{ImageBackend, Quality, RustBackend};
        use crate::test_helpers::{bmp_bit_count, create_gray_png, create_palette_bmp};

        let tmp = tempfile::TempDir::new().unwrap();
        let backend = RustBackend::new();
        let renderer = BlockRenderer { width: 8, height: 8 };

        let palette = tmp.path().join("indexed.bmp");
        create_palette_bmp(&palette, 90, 70);
        let gray = tmp.path().join("gray.png");
        create_gray_png(&gray, 80, 60);

        for (source, dims) in [(palette, (90, 70)), (gray, (80, 60))] {
            let image = backend.open(&source).unwrap();
            let out = compose_watermark(image, "x", &renderer, &style(Anchor::TopLeft));

            let saved = tmp.path().join(format!("out_{}", source.file_name().unwrap().to_string_lossy()));
            backend.save(&out.image, &saved, Quality::default()).unwrap();
            let reopened = backend.open(&saved).unwrap();
            assert_eq!(reopened.color(), image::ColorType::Rgb8, "{}", source.display());
            assert_eq!((reopened.width(), reopened.height()), dims);
        }
        assert_eq!(bmp_bit_count(&tmp.path().join("out_indexed.bmp")), 24);
    }

    #[test]
    fn oversized_label_is_clipped_without_panic() {
        let renderer = BlockRenderer { width: 101, height: 20 };
        let out = compose_watermark(gray_canvas(40, 30), "x", &renderer, &style(Anchor::Center));

        assert_eq!(out.placement, Placement::new(-31, 5));
        assert_eq!(out.image.dimensions(), (40, 30));
        // The label spans the full width of the canvas.
        assert_eq!(*out.image.get_pixel(0, 5), WHITE);
        assert_eq!(*out.image.get_pixel(39, 5), WHITE);
    }

    #[test]
    fn label_entirely_off_canvas_leaves_image_untouched() {
        let renderer = BlockRenderer { width: 10, height: 10 };
        let wide_margin = WatermarkStyle {
            anchor: Anchor::TopLeft,
            margin: 500,
            ..WatermarkStyle::default()
        };
        let out = compose_watermark(gray_canvas(20, 20), "x", &renderer, &wide_margin);
        assert!(out.image.pixels().all(|p| *p == GRAY));
    }

    #[test]
    fn empty_text_leaves_image_untouched() {
        let renderer = BlockRenderer { width: 10, height: 10 };
        let out = compose_watermark(gray_canvas(30, 30), "", &renderer, &style(Anchor::Center));
        assert_eq!(out.footprint, (0, 0));
        assert!(out.image.pixels().all(|p| *p == GRAY));
    }

    #[test]
    fn built_in_font_renders_date_label() {
        let renderer = BitmapRenderer::new(24);
        let out = compose_watermark(
            gray_canvas(400, 120),
            "2023年05月01日",
            &renderer,
            &style(Anchor::BottomRight),
        );

        let (w, h) = out.footprint;
        assert!(w > 0 && h > 0);
        let changed = out.image.pixels().filter(|p| **p != GRAY).count();
        assert!(changed > 0);
        // Label ink stays inside its footprint plus the shadow offset.
        let Placement { x, y } = out.placement;
        for (px, py, p) in out.image.enumerate_pixels() {
            if *p != GRAY {
                assert!(px as i32 >= x && px as i32 <= x + w as i32 + 2);
                assert!(py as i32 >= y && py as i32 <= y + h as i32 + 2);
            }
        }
    }

    // =========================================================================
    // blend_mask
    // =========================================================================

    #[test]
    fn blend_is_linear_in_coverage() {
        let mut canvas = RgbImage::from_pixel(2, 1, BLACK);
        let mask = GlyphMask {
            width: 2,
            height: 1,
            coverage: vec![0.5, 0.25],
        };
        blend_mask(&mut canvas, &mask, Placement::new(0, 0), TextColor::WHITE);

        assert_eq!(*canvas.get_pixel(0, 0), Rgb([128, 128, 128]));
        assert_eq!(*canvas.get_pixel(1, 0), Rgb([64, 64, 64]));
    }

    #[test]
    fn blend_clips_negative_origin() {
        let mut canvas = RgbImage::from_pixel(3, 3, BLACK);
        let mask = GlyphMask {
            width: 3,
            height: 3,
            coverage: vec![1.0; 9],
        };
        blend_mask(&mut canvas, &mask, Placement::new(-2, -2), TextColor::WHITE);

        assert_eq!(*canvas.get_pixel(0, 0), WHITE);
        assert_eq!(*canvas.get_pixel(1, 0), BLACK);
        assert_eq!(*canvas.get_pixel(0, 1), BLACK);
    }
}
