//! Text rasterizing and font selection.
//!
//! Two renderers implement [`GlyphRenderer`]:
//!
//! | Renderer | Source | Coverage |
//! |---|---|---|
//! | [`OutlineRenderer`] | TTF/OTF/TTC file via `ab_glyph` | anti-aliased, any script the font covers |
//! | [`BitmapRenderer`] | Spleen PSF2 data compiled into the binary | 1-bit, Latin; unknown glyphs draw as boxes |
//!
//! [`FontSelector::select`] walks an ordered candidate list and returns the
//! first outline font that loads. When nothing loads it returns the bitmap
//! renderer, which has no external dependency and cannot fail.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use spleen_font::{FONT_6X12, FONT_12X24, PSF2Font};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Largest label height accepted from config or the command line.
pub const MAX_FONT_SIZE: u32 = 1000;

/// Upper bound on rasterized label area, in pixels.
const MAX_MASK_PIXELS: usize = 1 << 26;

/// Element count of a `width * height` buffer, `None` past [`MAX_MASK_PIXELS`].
fn mask_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|&len| len <= MAX_MASK_PIXELS)
}

/// Tightly-cropped coverage mask for a rendered string.
///
/// `coverage` is row-major, `width * height` long, each value in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<f32>,
}

impl GlyphMask {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            coverage: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    /// Crop an uncropped buffer to its inked rows and columns.
    fn from_buffer(width: u32, height: u32, buffer: Vec<f32>) -> Self {
        let inked = |x: u32, y: u32| buffer[y as usize * width as usize + x as usize] > 0.0;

        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        for y in 0..height {
            for x in 0..width {
                if inked(x, y) {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if min_x == u32::MAX {
            return Self::empty();
        }

        let crop_w = max_x - min_x + 1;
        let crop_h = max_y - min_y + 1;
        let mut coverage = Vec::with_capacity(crop_w as usize * crop_h as usize);
        for y in min_y..=max_y {
            let row = y as usize * width as usize;
            coverage.extend_from_slice(&buffer[row + min_x as usize..=row + max_x as usize]);
        }
        Self {
            width: crop_w,
            height: crop_h,
            coverage,
        }
    }
}

/// Anything that can turn a string into a coverage mask.
pub trait GlyphRenderer: Send + Sync {
    /// Rasterize `text` into a mask cropped to its ink.
    ///
    /// The mask's dimensions are the text footprint used for placement.
    fn rasterize(&self, text: &str) -> GlyphMask;
}

// ============================================================================
// Outline fonts (ab_glyph)
// ============================================================================

/// Anti-aliased renderer over a parsed TrueType/OpenType font.
pub struct OutlineRenderer {
    font: FontVec,
    scale: PxScale,
}

impl OutlineRenderer {
    /// Parse font bytes. Collections (`.ttc`) use their first face.
    pub fn from_bytes(data: Vec<u8>, size_px: u32) -> Result<Self, FontLoadError> {
        let font = FontVec::try_from_vec_and_index(data, 0)
            .map_err(|e| FontLoadError::Invalid(e.to_string()))?;
        Ok(Self {
            font,
            scale: PxScale::from(size_px as f32),
        })
    }

    pub fn from_file(path: &Path, size_px: u32) -> Result<Self, FontLoadError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, size_px)
    }
}

impl GlyphRenderer for OutlineRenderer {
    fn rasterize(&self, text: &str) -> GlyphMask {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = scaled.ascent();

        let mut outlined = Vec::new();
        let mut caret = 0.0f32;
        let mut prev: Option<ab_glyph::GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(self.scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);
            if let Some(o) = self.font.outline_glyph(glyph) {
                outlined.push(o);
            }
        }

        let Some(first) = outlined.first() else {
            return GlyphMask::empty();
        };
        let mut bounds = first.px_bounds();
        for o in &outlined[1..] {
            let b = o.px_bounds();
            bounds.min.x = bounds.min.x.min(b.min.x);
            bounds.min.y = bounds.min.y.min(b.min.y);
            bounds.max.x = bounds.max.x.max(b.max.x);
            bounds.max.y = bounds.max.y.max(b.max.y);
        }

        let width = (bounds.max.x - bounds.min.x).ceil().max(0.0) as u32;
        let height = (bounds.max.y - bounds.min.y).ceil().max(0.0) as u32;
        let Some(len) = mask_len(width, height) else {
            warn!(width, height, "label too large to rasterize");
            return GlyphMask::empty();
        };
        let mut buffer = vec![0.0f32; len];

        for o in &outlined {
            let b = o.px_bounds();
            let ox = (b.min.x - bounds.min.x) as i64;
            let oy = (b.min.y - bounds.min.y) as i64;
            o.draw(|px, py, c| {
                let x = ox + px as i64;
                let y = oy + py as i64;
                if x >= 0 && y >= 0 && x < width as i64 && y < height as i64 {
                    let idx = y as usize * width as usize + x as usize;
                    buffer[idx] = (buffer[idx] + c).min(1.0);
                }
            });
        }

        GlyphMask::from_buffer(width, height, buffer)
    }
}

// ============================================================================
// Built-in bitmap font (Spleen)
// ============================================================================

/// A Spleen face compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BitmapFace {
    data: &'static [u8],
    cell_w: u32,
    cell_h: u32,
}

const SPLEEN_6X12: BitmapFace = BitmapFace {
    data: FONT_6X12,
    cell_w: 6,
    cell_h: 12,
};

const SPLEEN_12X24: BitmapFace = BitmapFace {
    data: FONT_12X24,
    cell_w: 12,
    cell_h: 24,
};

/// Renderer of last resort. Needs no files and never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapRenderer {
    face: BitmapFace,
    scale: u32,
}

impl BitmapRenderer {
    /// Pick the Spleen face and integer scale that land nearest `size_px` tall.
    pub fn new(size_px: u32) -> Self {
        let face = if size_px < SPLEEN_12X24.cell_h {
            SPLEEN_6X12
        } else {
            SPLEEN_12X24
        };
        let scale = ((size_px as f32 / face.cell_h as f32).round() as u32).max(1);
        Self { face, scale }
    }

    /// Rendered cell height in pixels (before cropping to ink).
    pub fn line_height(&self) -> u32 {
        self.face.cell_h.saturating_mul(self.scale)
    }

    fn stamp_cell(&self, buffer: &mut [f32], stride: usize, origin_x: usize, cell: &[bool]) {
        let (cw, ch) = (self.face.cell_w as usize, self.face.cell_h as usize);
        let s = self.scale as usize;
        for cy in 0..ch {
            for cx in 0..cw {
                if !cell[cy * cw + cx] {
                    continue;
                }
                for dy in 0..s {
                    for dx in 0..s {
                        let x = origin_x + cx * s + dx;
                        let y = cy * s + dy;
                        buffer[y * stride + x] = 1.0;
                    }
                }
            }
        }
    }

    /// Hollow rectangle for characters the face does not cover.
    fn box_cell(&self) -> Vec<bool> {
        let (w, h) = (self.face.cell_w, self.face.cell_h);
        let mut cell = vec![false; (w * h) as usize];
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                if y == 1 || y == h - 2 || x == 1 || x == w - 2 {
                    cell[(y * w + x) as usize] = true;
                }
            }
        }
        cell
    }
}

impl GlyphRenderer for BitmapRenderer {
    fn rasterize(&self, text: &str) -> GlyphMask {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return GlyphMask::empty();
        }

        let advance = self.face.cell_w.saturating_mul(self.scale);
        let height = self.line_height();
        let width = u32::try_from(chars.len())
            .ok()
            .and_then(|n| n.checked_mul(advance));
        let Some((width, len)) = width.and_then(|w| Some((w, mask_len(w, height)?))) else {
            warn!(chars = chars.len(), height, "label too large to rasterize");
            return GlyphMask::empty();
        };
        let mut buffer = vec![0.0f32; len];

        let mut font = PSF2Font::new(self.face.data).ok();
        let (cw, ch) = (self.face.cell_w as usize, self.face.cell_h as usize);

        for (i, c) in chars.iter().enumerate() {
            let utf8 = c.to_string();
            let glyph_cell = font.as_mut().and_then(|f| {
                f.glyph_for_utf8(utf8.as_bytes()).map(|glyph| {
                    let mut cell = vec![false; cw * ch];
                    for (row_y, row) in glyph.enumerate() {
                        for (col_x, on) in row.enumerate() {
                            if row_y < ch && col_x < cw {
                                cell[row_y * cw + col_x] = on;
                            }
                        }
                    }
                    cell
                })
            });
            let cell = glyph_cell.unwrap_or_else(|| self.box_cell());
            self.stamp_cell(&mut buffer, width as usize, i * advance as usize, &cell);
        }

        GlyphMask::from_buffer(width, height, buffer)
    }
}

// ============================================================================
// Font selection
// ============================================================================

#[derive(Error, Debug)]
pub enum FontLoadError {
    #[error("not found in any font directory")]
    NotFound,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a usable font: {0}")]
    Invalid(String),
}

/// Where the active renderer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// A candidate font file, resolved to its on-disk path.
    Candidate(PathBuf),
    /// The compiled-in Spleen bitmap font.
    BuiltIn,
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Candidate(path) => write!(f, "{}", path.display()),
            FontSource::BuiltIn => f.write_str("built-in bitmap font"),
        }
    }
}

/// The resolved font resource and size used for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSpec {
    pub source: FontSource,
    pub size_px: u32,
}

/// A loaded renderer together with the spec that produced it.
pub struct SelectedFont {
    pub spec: RenderSpec,
    renderer: Box<dyn GlyphRenderer>,
}

impl SelectedFont {
    pub fn built_in(size_px: u32) -> Self {
        Self {
            spec: RenderSpec {
                source: FontSource::BuiltIn,
                size_px,
            },
            renderer: Box::new(BitmapRenderer::new(size_px)),
        }
    }

    pub fn renderer(&self) -> &dyn GlyphRenderer {
        self.renderer.as_ref()
    }
}

impl fmt::Debug for SelectedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFont").field("spec", &self.spec).finish()
    }
}

/// Resolves candidate font names against a set of font directories.
#[derive(Debug, Clone, Default)]
pub struct FontSelector {
    search_dirs: Vec<PathBuf>,
}

impl FontSelector {
    /// Search the platform's usual font directories.
    pub fn system() -> Self {
        Self {
            search_dirs: system_font_dirs(),
        }
    }

    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Return the first candidate that loads, else the built-in font.
    ///
    /// Failures are logged at debug level and otherwise ignored.
    pub fn select<S: AsRef<str>>(&self, candidates: &[S], size_px: u32) -> SelectedFont {
        for candidate in candidates {
            let candidate = candidate.as_ref();
            match self.load(candidate, size_px) {
                Ok((path, renderer)) => {
                    debug!(candidate, path = %path.display(), "font candidate loaded");
                    return SelectedFont {
                        spec: RenderSpec {
                            source: FontSource::Candidate(path),
                            size_px,
                        },
                        renderer: Box::new(renderer),
                    };
                }
                Err(e) => debug!(candidate, error = %e, "font candidate unavailable"),
            }
        }
        debug!("no candidate font loaded, using built-in bitmap font");
        SelectedFont::built_in(size_px)
    }

    fn load(
        &self,
        candidate: &str,
        size_px: u32,
    ) -> Result<(PathBuf, OutlineRenderer), FontLoadError> {
        let path = self.resolve(candidate).ok_or(FontLoadError::NotFound)?;
        let renderer = OutlineRenderer::from_file(&path, size_px)?;
        Ok((path, renderer))
    }

    /// A literal path wins; otherwise match the file name (any case) inside
    /// the search directories, recursively.
    pub fn resolve(&self, candidate: &str) -> Option<PathBuf> {
        let literal = Path::new(candidate);
        if literal.is_file() {
            return Some(literal.to_path_buf());
        }
        let wanted = literal.file_name()?.to_str()?;
        self.search_dirs
            .iter()
            .filter(|dir| dir.is_dir())
            .flat_map(|dir| WalkDir::new(dir).follow_links(true).into_iter())
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.eq_ignore_ascii_case(wanted))
            })
            .map(|entry| entry.into_path())
    }
}

#[cfg(target_os = "windows")]
const SYSTEM_FONT_ROOTS: &[&str] = &["C:\\Windows\\Fonts"];

#[cfg(target_os = "macos")]
const SYSTEM_FONT_ROOTS: &[&str] = &["/System/Library/Fonts", "/Library/Fonts"];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const SYSTEM_FONT_ROOTS: &[&str] = &["/usr/share/fonts", "/usr/local/share/fonts"];

/// Per-user font directories first, then the fixed OS roots. No duplicates.
fn system_font_dirs() -> Vec<PathBuf> {
    let mut user = vec![
        dirs::font_dir(),
        dirs::data_dir().map(|d| d.join("fonts")),
        dirs::home_dir().map(|h| h.join(".fonts")),
    ];
    if cfg!(target_os = "windows") {
        user.push(dirs::data_local_dir().map(|d| d.join("Microsoft").join("Windows").join("Fonts")));
    }

    let mut found: Vec<PathBuf> = Vec::new();
    let roots = SYSTEM_FONT_ROOTS.iter().map(PathBuf::from);
    for dir in user.into_iter().flatten().chain(roots) {
        if !found.contains(&dir) {
            found.push(dir);
        }
    }
    found
}
