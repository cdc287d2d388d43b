//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file in the gallery directory overrides any subset
//! of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [media]
//! thumbnail_prefix = "zThumb_"   # File name prefix of thumbnails
//! optimized_prefix = "zOpt_"     # File name prefix of optimized renditions
//! rendition_file_type = "jpg"    # Extension renditions are written as
//!
//! [thumbnails]
//! max_length = 115               # Longer edge in pixels
//! quality = 70                   # JPEG quality (1-100)
//! sharpen = false
//! # aspect_ratio = [1, 1]        # Crop instead of fit
//!
//! [optimized]
//! max_length = 640
//! quality = 70
//! sharpen = false
//!
//! [mime_types]
//! allowed_extensions = ["*"]     # "*" allows every known type
//!
//! [metadata]
//! extract_on_add = true
//! caption_sidecar = true
//! hidden_items = []              # e.g. ["CameraMake", "IsoSpeed"]
//!
//! [cache]
//! capacity = 1000                # Shared read-only objects kept in memory
//!
//! [logging]
//! filter = "gallery_core=info"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, RenditionSpec, Sharpening};
use crate::metadata::MetadataItemName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Rendition naming.
    pub media: MediaConfig,
    /// Thumbnail rendition settings.
    pub thumbnails: RenditionConfig,
    /// Optimized rendition settings.
    pub optimized: RenditionConfig,
    /// Which file types may be added.
    pub mime_types: MimeTypesConfig,
    /// Metadata extraction and visibility.
    pub metadata: MetadataConfig,
    /// Shared object cache.
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            media: MediaConfig::default(),
            thumbnails: RenditionConfig::default(),
            optimized: RenditionConfig::optimized(),
            mime_types: MimeTypesConfig::default(),
            metadata: MetadataConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, rendition) in [("thumbnails", &self.thumbnails), ("optimized", &self.optimized)] {
            if rendition.quality == 0 || rendition.quality > 100 {
                return Err(ConfigError::Validation(format!("{section}.quality must be 1-100")));
            }
            if rendition.max_length == 0 {
                return Err(ConfigError::Validation(format!("{section}.max_length must be non-zero")));
            }
            if let Some([w, h]) = rendition.aspect_ratio {
                if w == 0 || h == 0 {
                    return Err(ConfigError::Validation(format!(
                        "{section}.aspect_ratio values must be non-zero"
                    )));
                }
            }
        }
        let file_type = &self.media.rendition_file_type;
        if file_type.is_empty() || file_type.contains(['.', '/', '\\']) {
            return Err(ConfigError::Validation(
                "media.rendition_file_type must be a bare extension like \"jpg\"".into(),
            ));
        }
        if self.media.thumbnail_prefix == self.media.optimized_prefix {
            return Err(ConfigError::Validation(
                "media.thumbnail_prefix and media.optimized_prefix must differ".into(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Validation("cache.capacity must be non-zero".into()));
        }
        Ok(())
    }
}

/// Rendition naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    pub thumbnail_prefix: String,
    pub optimized_prefix: String,
    /// Extension renditions are written as, without the dot.
    pub rendition_file_type: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            thumbnail_prefix: "zThumb_".into(),
            optimized_prefix: "zOpt_".into(),
            rendition_file_type: "jpg".into(),
        }
    }
}

/// Size and encoding of one rendition kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenditionConfig {
    /// Longer edge in pixels (short edge of the crop box when cropping).
    pub max_length: u32,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Apply an unsharp mask after resizing.
    pub sharpen: bool,
    /// Crop to `[width, height]` instead of fitting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<[u32; 2]>,
}

impl Default for RenditionConfig {
    fn default() -> Self {
        Self {
            max_length: 115,
            quality: 70,
            sharpen: false,
            aspect_ratio: None,
        }
    }
}

impl RenditionConfig {
    fn optimized() -> Self {
        Self {
            max_length: 640,
            ..Self::default()
        }
    }

    pub fn rendition_spec(&self) -> RenditionSpec {
        RenditionSpec {
            max_length: self.max_length,
            quality: Quality::new(self.quality),
            sharpening: self.sharpen.then(Sharpening::light),
            crop_aspect: self.aspect_ratio.map(|[w, h]| (w, h)),
        }
    }
}

/// Allow-list of addable file types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MimeTypesConfig {
    /// Extensions, with or without the dot; `"*"` allows everything known.
    pub allowed_extensions: Vec<String>,
}

impl Default for MimeTypesConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["*".into()],
        }
    }
}

/// Metadata extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Extract metadata when a media item is created.
    pub extract_on_add: bool,
    /// Read and write captions in a `<stem>.txt` file next to the original.
    pub caption_sidecar: bool,
    /// Items that exist but are not shown by default.
    pub hidden_items: Vec<MetadataItemName>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            extract_on_add: true,
            caption_sidecar: true,
            hidden_items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum shared instances kept.
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "gallery_core=info".into(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
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

/// `config.toml` from a directory as a raw TOML value, or `None` when the
/// directory has none.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(base: toml::Value, overlay: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, on top of the
/// stock defaults.
pub fn load_config(root: &Path) -> Result<GalleryConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// A fully commented stock `config.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Rendition naming
# ---------------------------------------------------------------------------
[media]
# Renditions are written next to the original as <prefix><stem>.<type>.
thumbnail_prefix = "zThumb_"
optimized_prefix = "zOpt_"
rendition_file_type = "jpg"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Longer edge in pixels.
max_length = 115
# JPEG quality (1 = worst, 100 = best).
quality = 70
# Unsharp mask after resizing.
sharpen = false
# Crop to this [width, height] ratio instead of fitting.
# aspect_ratio = [1, 1]

# ---------------------------------------------------------------------------
# Optimized renditions
# ---------------------------------------------------------------------------
[optimized]
# Originals no larger than this are used as their own optimized rendition.
max_length = 640
quality = 70
sharpen = false

# ---------------------------------------------------------------------------
# File types
# ---------------------------------------------------------------------------
[mime_types]
# Extensions that may be added to the gallery. "*" allows all known types.
allowed_extensions = ["*"]

# ---------------------------------------------------------------------------
# Metadata
# ---------------------------------------------------------------------------
[metadata]
# Read embedded IPTC/EXIF when a media item is added.
extract_on_add = true
# Keep captions in <stem>.txt next to the original.
caption_sidecar = true
# Items extracted but hidden by default, e.g. ["CameraMake", "IsoSpeed"].
hidden_items = []

# ---------------------------------------------------------------------------
# Cache
# ---------------------------------------------------------------------------
[cache]
# Shared read-only objects kept in memory.
capacity = 1000

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Used when RUST_LOG is not set.
filter = "gallery_core=info"
"##
}
