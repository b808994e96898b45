//! Watermark configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Stock defaults (below).
//! 2. `watermark.toml` in the input directory, or the file given with
//!    `--config`.
//! 3. Command-line flags (`--font-size`, `--color`, `--position`).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! font_size = 24               # Label height in pixels (1-1000)
//! color = "white"              # Color name or #RGB / #RRGGBB
//! position = "bottom-right"    # top-left, top-right, bottom-left, bottom-right,
//!                              # center, top-center, bottom-center
//! margin = 20                  # Gap from the edges the position touches
//! quality = 95                 # JPEG quality (1-100)
//!
//! [shadow]
//! color = "black"
//! offset = [2, 2]              # Right, down in pixels
//!
//! [fonts]
//! candidates = ["arial.ttf", "msyh.ttc", "simsun.ttc"]
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::{Anchor, MAX_FONT_SIZE, Quality, Shadow, TextColor, WatermarkStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the input directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "watermark.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Run configuration loaded from `watermark.toml`.
///
/// All fields have defaults; a config file only names what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Label height in pixels.
    pub font_size: u32,
    /// Label color: a name or `#RGB` / `#RRGGBB`.
    pub color: String,
    pub position: Anchor,
    /// Pixels kept clear between the label and the edges its position touches.
    pub margin: u32,
    /// JPEG encoding quality. Other formats are lossless.
    pub quality: u32,
    pub shadow: ShadowConfig,
    pub fonts: FontsConfig,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_size: 24,
            color: "white".to_string(),
            position: Anchor::BottomRight,
            margin: 20,
            quality: 95,
            shadow: ShadowConfig::default(),
            fonts: FontsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowConfig {
    pub color: String,
    /// `[right, down]` offset from the label, in pixels.
    pub offset: [i32; 2],
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            color: "black".to_string(),
            offset: [2, 2],
        }
    }
}

/// Outline fonts to try, most preferred first.
///
/// Each entry is a path or a bare file name searched for in the system font
/// directories. The built-in bitmap font is used when none loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    pub candidates: Vec<String>,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                "arial.ttf".to_string(),
                "msyh.ttc".to_string(),
                "simsun.ttc".to_string(),
            ],
        }
    }
}

impl WatermarkConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(ConfigError::Validation(format!(
                "font_size must be 1-{MAX_FONT_SIZE}"
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        parse_color("color", &self.color)?;
        parse_color("shadow.color", &self.shadow.color)?;
        Ok(())
    }

    /// The compositor's view of this config.
    pub fn style(&self) -> Result<WatermarkStyle, ConfigError> {
        let [dx, dy] = self.shadow.offset;
        Ok(WatermarkStyle {
            color: parse_color("color", &self.color)?,
            shadow: Shadow {
                color: parse_color("shadow.color", &self.shadow.color)?,
                offset: (dx, dy),
            },
            anchor: self.position,
            margin: self.margin,
        })
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

fn parse_color(key: &str, value: &str) -> Result<TextColor, ConfigError> {
    value
        .parse::<TextColor>()
        .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))
}

/// Values given on the command line, applied over any config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub font_size: Option<u32>,
    pub color: Option<String>,
    pub position: Option<Anchor>,
}

impl ConfigOverrides {
    /// As a sparse TOML table, ready for [`merge_toml`].
    pub fn to_toml(&self) -> toml::Value {
        let mut table = toml::map::Map::new();
        if let Some(size) = self.font_size {
            table.insert("font_size".into(), toml::Value::Integer(size as i64));
        }
        if let Some(color) = &self.color {
            table.insert("color".into(), toml::Value::String(color.clone()));
        }
        if let Some(position) = self.position {
            table.insert(
                "position".into(),
                toml::Value::String(position.name().to_string()),
            );
        }
        toml::Value::Table(table)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(WatermarkConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a TOML file as a raw value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<WatermarkConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: WatermarkConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the run configuration.
///
/// With `explicit` set, that file must exist. Otherwise `watermark.toml` in
/// `input_dir` is used when present. CLI `overrides` go on top.
pub fn load_config(
    input_dir: &Path,
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<WatermarkConfig, ConfigError> {
    let file_layer = match explicit {
        Some(path) => Some(load_raw_config(path)?.ok_or_else(|| ConfigError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
        })?),
        None => load_raw_config(&input_dir.join(CONFIG_FILE_NAME))?,
    };
    let layers = file_layer.into_iter().chain([overrides.to_toml()]);
    resolve_config(stock_defaults_value()?, layers)
}

/// Returns a fully-commented stock `watermark.toml` with all keys.
///
/// Printed by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Watermark Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as watermark.toml inside the photo directory, or pass it
# with --config. Command-line flags override values from this file.
# Unknown keys will cause an error.

# Label height in pixels, 1-1000.
font_size = 24

# Label color: a name (white, black, red, yellow, ...) or #RGB / #RRGGBB.
color = "white"

# Where the label goes. One of:
#   top-left, top-right, bottom-left, bottom-right,
#   center, top-center, bottom-center
position = "bottom-right"

# Gap in pixels between the label and the edges its position touches.
margin = 20

# JPEG encoding quality (1 = worst, 100 = best). PNG, TIFF and BMP are lossless.
quality = 95

# ---------------------------------------------------------------------------
# Drop shadow drawn under the label
# ---------------------------------------------------------------------------
[shadow]
color = "black"
# [right, down] in pixels.
offset = [2, 2]

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
# Tried in order; the first that loads is used for the whole run.
# Each entry is a path or a file name searched for in the system font
# directories. A built-in bitmap font is used when none loads (it has no
# CJK glyphs, so the date label's 年/月/日 show as boxes).
candidates = ["arial.ttf", "msyh.ttc", "simsun.ttc"]
"##
}
