//! Stage zoom and pan for displaying a page inside its container.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.05;
pub const MAX_ZOOM: f64 = 8.0;

/// View transform from page coordinates to container (screen) coordinates.
///
/// Only affects display and pointer mapping; exports always render the page at
/// identity scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub offset: Vec2,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    pub fn screen_to_page(&self, screen: Point) -> Point {
        self.transform().inverse() * screen
    }

    pub fn page_to_screen(&self, page: Point) -> Point {
        self.transform() * page
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Multiply zoom by `factor`, keeping `anchor` (in screen space) fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        if (zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let fixed = self.screen_to_page(anchor);
        self.zoom = zoom;
        self.offset += anchor - self.page_to_screen(fixed);
    }

    /// Zoom so the whole page fits inside `container` with `padding` on each side,
    /// centered.
    pub fn fit_page(&mut self, page: Size, container: Size, padding: f64) {
        if page.is_zero_area() {
            *self = Self::default();
            return;
        }
        let avail_w = (container.width - padding * 2.0).max(1.0);
        let avail_h = (container.height - padding * 2.0).max(1.0);
        self.zoom = (avail_w / page.width)
            .min(avail_h / page.height)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        self.offset = Vec2::new(
            (container.width - page.width * self.zoom) / 2.0,
            (container.height - page.height * self.zoom) / 2.0,
        );
    }

    /// Zoom as a whole percentage for display.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round().max(0.0) as u32
    }
}
