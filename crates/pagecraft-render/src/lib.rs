//! PageCraft Render Library
//!
//! The export surface for PageCraft pages: scenes are written as SVG, rasterized
//! with resvg and encoded to image files or a WebM video.

pub mod color;
pub mod export;
pub mod raster;
pub mod svg;
pub mod video;

pub use export::{ExportFormat, export_page, save_page};
pub use raster::{Frame, Rasterizer, rasterize};
pub use svg::{SvgOptions, scene_to_svg};
pub use video::{FfmpegWebmSink, VideoError};

use thiserror::Error;

/// Render errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("SVG generation failed: {0}")]
    Svg(String),
    #[error("Rasterization failed: {0}")]
    Raster(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Scene(#[from] pagecraft_core::SceneError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
