//! Editor configuration.

use crate::animation::{DEFAULT_DURATION_MS, DEFAULT_EXPORT_FPS, MIN_DURATION_MS};
use crate::clipboard::PASTE_OFFSET;
use crate::snap::SNAP_THRESHOLD;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default page edge length in pixels.
pub const DEFAULT_PAGE_SIZE: f64 = 1080.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Editor tunables. Every field is optional in JSON and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Snapping distance in page pixels.
    pub snap_threshold: f64,
    /// Diagonal step applied on each paste.
    pub paste_offset: f64,
    pub min_animation_duration: f64,
    pub default_animation_duration: f64,
    pub export_fps: u32,
    pub page_width: f64,
    pub page_height: f64,
    /// Size of the viewport the page is fitted into.
    pub container_width: f64,
    pub container_height: f64,
    /// Margin kept around the page when fitting zoom.
    pub fit_padding: f64,
    /// Maximum number of history entries (unbounded when absent).
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: SNAP_THRESHOLD,
            paste_offset: PASTE_OFFSET,
            min_animation_duration: MIN_DURATION_MS,
            default_animation_duration: DEFAULT_DURATION_MS,
            export_fps: DEFAULT_EXPORT_FPS,
            page_width: DEFAULT_PAGE_SIZE,
            page_height: DEFAULT_PAGE_SIZE,
            container_width: 1280.0,
            container_height: 800.0,
            fit_padding: 40.0,
            history_limit: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn page_size(&self) -> Size {
        Size::new(self.page_width, self.page_height)
    }

    pub fn container_size(&self) -> Size {
        Size::new(self.container_width, self.container_height)
    }
}
