//! Application Configuration
//!
//! User settings stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Record store settings
    pub storage: StorageSettings,
    /// Main window settings
    pub window: WindowSettings,
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Directory holding det.onnx, rec.onnx and dict.txt (defaults to the data dir)
    pub model_dir: Option<PathBuf>,
    /// Download missing models on startup
    pub auto_download: bool,
    /// Try GPU execution before falling back to CPU
    pub use_gpu: bool,
    /// Longest side of the detection input
    pub det_limit_side_len: u32,
    /// Probability threshold used to binarise the detection map
    pub det_db_thresh: f32,
    /// Minimum mean probability inside a candidate box
    pub det_db_box_thresh: f32,
    /// Box expansion ratio
    pub det_db_unclip_ratio: f32,
    /// Maximum number of contours examined per image
    pub max_candidates: usize,
    /// Recognition input height
    pub rec_image_height: u32,
    /// Minimum recognition input width; narrower crops are zero-padded to it
    pub rec_image_width: u32,
    /// Recognitions scoring below this are discarded
    pub drop_score: f32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            model_dir: None,
            auto_download: true,
            use_gpu: true,
            det_limit_side_len: 960,
            det_db_thresh: 0.3,
            det_db_box_thresh: 0.6,
            det_db_unclip_ratio: 1.5,
            max_candidates: 1000,
            rec_image_height: 48,
            rec_image_width: 320,
            drop_score: 0.5,
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Persist recognitions to SQLite
    pub enabled: bool,
    /// Database file (defaults to the data dir)
    pub database_path: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None,
        }
    }
}

/// Main window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
    /// Width of the result panel on the right
    pub result_panel_width: f32,
    /// Font file with CJK glyphs, registered ahead of the built-in fonts
    pub font_path: Option<PathBuf>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1400.0,
            height: 900.0,
            result_panel_width: 450.0,
            font_path: None,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
