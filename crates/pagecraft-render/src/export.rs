//! Page export to PNG, JPEG, SVG and JSON.

use crate::color::{parse_css_color, to_rgba8};
use crate::raster::{Frame, Rasterizer};
use crate::svg::{SvgOptions, scene_to_svg};
use crate::{RenderError, RenderResult};
use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use kurbo::Size;
use pagecraft_core::Scene;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// JPEG quality used for exports.
pub const JPEG_QUALITY: u8 = 92;

/// Export file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
    Json,
}

impl ExportFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Svg => "svg",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "svg" => Ok(ExportFormat::Svg),
            "json" => Ok(ExportFormat::Json),
            _ => Err(RenderError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Render a page to bytes in `format`.
///
/// Raster formats are produced at `pixel_ratio` times the page size; the view's
/// zoom never applies.
pub fn export_page(
    scene: &Scene,
    size: Size,
    format: ExportFormat,
    pixel_ratio: f64,
) -> RenderResult<Vec<u8>> {
    log::info!(
        "Exporting {}x{} page as {} (pixel ratio {})",
        size.width,
        size.height,
        format,
        pixel_ratio
    );
    match format {
        ExportFormat::Json => Ok(scene.to_json()?.into_bytes()),
        ExportFormat::Svg => Ok(scene_to_svg(scene, size, &SvgOptions::default())?.into_bytes()),
        ExportFormat::Png => {
            let frame = render_frame(scene, size, pixel_ratio)?;
            encode_png(&frame)
        }
        ExportFormat::Jpeg => {
            let frame = render_frame(scene, size, pixel_ratio)?;
            let background = parse_css_color(&scene.background)
                .map(to_rgba8)
                .map_or([255, 255, 255], |[r, g, b, _]| [r, g, b]);
            encode_jpeg(&frame, background)
        }
    }
}

/// [`export_page`] and write the result to `path`.
pub fn save_page(
    scene: &Scene,
    size: Size,
    format: ExportFormat,
    pixel_ratio: f64,
    path: &Path,
) -> RenderResult<()> {
    let bytes = export_page(scene, size, format, pixel_ratio)?;
    std::fs::write(path, &bytes)?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn render_frame(scene: &Scene, size: Size, pixel_ratio: f64) -> RenderResult<Frame> {
    let svg = scene_to_svg(scene, size, &SvgOptions::default())?;
    Rasterizer::new().rasterize(&svg, size.width, size.height, pixel_ratio)
}

/// Encode a frame as PNG.
pub fn encode_png(frame: &Frame) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("PNG header: {e}")))?;
        writer
            .write_image_data(&frame.data)
            .map_err(|e| RenderError::Encode(format!("PNG data: {e}")))?;
    }
    Ok(png_data)
}

/// Encode a frame as JPEG, flattened over `background`.
pub fn encode_jpeg(frame: &Frame, background: [u8; 3]) -> RenderResult<Vec<u8>> {
    let rgb = frame.flatten_rgb(background);
    let mut jpeg_data = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_data, JPEG_QUALITY)
        .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(format!("JPEG: {e}")))?;
    Ok(jpeg_data)
}
