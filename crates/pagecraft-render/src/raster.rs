//! SVG rasterization through usvg/resvg.

use crate::{RenderError, RenderResult};
use std::sync::Arc;

/// Largest raster edge in pixels.
pub const MAX_DIM: u32 = 16_384;

/// A straight-alpha RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Composite over an opaque color and drop the alpha channel.
    pub fn flatten_rgb(&self, background: [u8; 3]) -> Vec<u8> {
        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for px in self.data.chunks_exact(4) {
            let a = px[3] as u16;
            let inv = 255 - a;
            for c in 0..3 {
                let v = (px[c] as u16 * a + background[c] as u16 * inv + 127) / 255;
                rgb.push(v as u8);
            }
        }
        rgb
    }
}

/// Reusable rasterizer holding a loaded font database.
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    /// Create a rasterizer with the system fonts loaded.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("Loaded {} font face(s)", db.faces().count());
        Self { fontdb: Arc::new(db) }
    }

    /// Render `svg` at `pixel_ratio` times its logical `width`×`height`.
    pub fn rasterize(&self, svg: &str, width: f64, height: f64, pixel_ratio: f64) -> RenderResult<Frame> {
        let (px_w, px_h) = pixel_size(width, height, pixel_ratio)?;

        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts)
            .map_err(|e| RenderError::Raster(format!("parse svg tree: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(px_w, px_h)
            .ok_or_else(|| RenderError::Raster("failed to allocate pixmap".into()))?;
        let sx = px_w as f32 / tree.size().width();
        let sy = px_h as f32 / tree.size().height();
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        let mut data = Vec::with_capacity((px_w * px_h * 4) as usize);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(Frame {
            width: px_w,
            height: px_h,
            data,
        })
    }
}

/// One-shot rasterization with a fresh font database.
pub fn rasterize(svg: &str, width: f64, height: f64, pixel_ratio: f64) -> RenderResult<Frame> {
    Rasterizer::new().rasterize(svg, width, height, pixel_ratio)
}

fn pixel_size(width: f64, height: f64, pixel_ratio: f64) -> RenderResult<(u32, u32)> {
    fn to_px(v: f64) -> RenderResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(RenderError::Raster(format!("invalid raster dimension {v}")));
        }
        let px = (v.round() as u32).max(1);
        if px > MAX_DIM {
            return Err(RenderError::Raster(format!(
                "raster size too large: {px} (max {MAX_DIM})"
            )));
        }
        Ok(px)
    }
    Ok((to_px(width * pixel_ratio)?, to_px(height * pixel_ratio)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4" viewBox="0 0 4 4"><rect width="2" height="4" fill="#ff0000"/></svg>"##;

    #[test]
    fn test_rasterize_pixels() {
        let frame = rasterize(RED_SQUARE, 4.0, 4.0, 1.0).unwrap();
        assert_eq!((frame.width, frame.height), (4, 4));
        assert_eq!(frame.data.len(), 64);
        assert_eq!(&frame.data[0..4], &[255, 0, 0, 255]);
        // right half is transparent
        assert_eq!(frame.data[3 * 4 + 3], 0);
    }

    #[test]
    fn test_pixel_ratio_scales_output() {
        let frame = rasterize(RED_SQUARE, 4.0, 4.0, 2.0).unwrap();
        assert_eq!((frame.width, frame.height), (8, 8));
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(matches!(pixel_size(0.0, 10.0, 1.0), Err(RenderError::Raster(_))));
        assert!(matches!(pixel_size(10.0, 10.0, f64::NAN), Err(RenderError::Raster(_))));
        assert!(pixel_size(20_000.0, 10.0, 1.0).is_err());
        assert!(matches!(
            rasterize("not svg", 4.0, 4.0, 1.0),
            Err(RenderError::Raster(_))
        ));
    }

    #[test]
    fn test_flatten_rgb() {
        let frame = Frame {
            width: 2,
            height: 1,
            data: vec![255, 0, 0, 255, 0, 0, 0, 0],
        };
        assert_eq!(frame.flatten_rgb([10, 20, 30]), vec![255, 0, 0, 10, 20, 30]);
    }
}
