//! Alignment snapping for dragged objects.
//!
//! Guide stops come from the page (start, center, end on each axis) and from every
//! other visible object. The dragged object's own start, center and end edges are
//! compared against those stops independently per axis.

use crate::shapes::{CanvasObject, ObjectKind};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Distance (in page pixels) within which an edge snaps to a guide.
pub const SNAP_THRESHOLD: f64 = 5.0;

/// Axis of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GuideOrientation {
    /// A vertical line at some x.
    Vertical,
    /// A horizontal line at some y.
    Horizontal,
}

/// Which edge of the dragged object matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapKind {
    Start,
    Center,
    End,
}

/// An active alignment line to draw while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    pub orientation: GuideOrientation,
    /// The x (vertical) or y (horizontal) of the line.
    pub line_guide: f64,
    pub snap: SnapKind,
}

/// Result of a snap query.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// Position to assign to the dragged object.
    pub position: Point,
    /// Zero, one or two guides (at most one per axis).
    pub guides: Vec<Guide>,
}

impl SnapResult {
    /// A result with no snapping.
    pub fn none(position: Point) -> Self {
        Self {
            position,
            guides: Vec::new(),
        }
    }

    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }

    pub fn vertical(&self) -> Option<&Guide> {
        self.guides
            .iter()
            .find(|g| g.orientation == GuideOrientation::Vertical)
    }

    pub fn horizontal(&self) -> Option<&Guide> {
        self.guides
            .iter()
            .find(|g| g.orientation == GuideOrientation::Horizontal)
    }
}

/// Candidate stops on both axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuideStops {
    pub vertical: Vec<f64>,
    pub horizontal: Vec<f64>,
}

/// One edge of the dragged object: where it is and how far it lies from the
/// object's origin.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ObjectEdge {
    guide: f64,
    offset: f64,
    snap: SnapKind,
}

#[derive(Debug, Clone, Copy)]
struct Match {
    line_guide: f64,
    diff: f64,
    offset: f64,
    snap: SnapKind,
}

/// Client rectangle used for snapping. Circles use center ± radius so the
/// rotation of a circle never inflates its extent.
fn snap_bounds(object: &CanvasObject) -> Rect {
    match object.kind {
        ObjectKind::Circle { radius } => {
            let rx = radius * object.scale_x.abs();
            let ry = radius * object.scale_y.abs();
            Rect::new(object.x - rx, object.y - ry, object.x + rx, object.y + ry)
        }
        _ => object.bounds(),
    }
}

/// Collect guide stops from the page and every visible object except `skip_id`.
///
/// Order is page stops first, then objects in z-order; ties are resolved in
/// favour of the earliest stop.
pub fn guide_stops(objects: &[CanvasObject], page: Size, skip_id: &str) -> GuideStops {
    let mut stops = GuideStops {
        vertical: vec![0.0, page.width / 2.0, page.width],
        horizontal: vec![0.0, page.height / 2.0, page.height],
    };
    for object in objects {
        if object.id == skip_id || !object.is_visible() {
            continue;
        }
        let b = snap_bounds(object);
        stops.vertical.extend([b.x0, b.center().x, b.x1]);
        stops.horizontal.extend([b.y0, b.center().y, b.y1]);
    }
    stops
}

fn object_edges(bounds: Rect, origin: Point) -> ([ObjectEdge; 3], [ObjectEdge; 3]) {
    let c = bounds.center();
    let edge = |guide: f64, origin: f64, snap| ObjectEdge {
        guide,
        offset: origin - guide,
        snap,
    };
    (
        [
            edge(bounds.x0, origin.x, SnapKind::Start),
            edge(c.x, origin.x, SnapKind::Center),
            edge(bounds.x1, origin.x, SnapKind::End),
        ],
        [
            edge(bounds.y0, origin.y, SnapKind::Start),
            edge(c.y, origin.y, SnapKind::Center),
            edge(bounds.y1, origin.y, SnapKind::End),
        ],
    )
}

/// Closest stop to any edge, by true distance `|stop - edge|`.
fn closest(stops: &[f64], edges: &[ObjectEdge; 3], threshold: f64) -> Option<Match> {
    let mut best: Option<Match> = None;
    for &line_guide in stops {
        for edge in edges {
            let diff = (line_guide - edge.guide).abs();
            if diff >= threshold {
                continue;
            }
            if best.is_none_or(|b| diff < b.diff) {
                best = Some(Match {
                    line_guide,
                    diff,
                    offset: edge.offset,
                    snap: edge.snap,
                });
            }
        }
    }
    best
}

/// Snap `dragged_id` at its proposed position against the page and the other objects.
///
/// Returns the proposed position unchanged (and no guides) when nothing lies within
/// `threshold` or when the dragged object is not in `objects`.
pub fn snap_position(
    objects: &[CanvasObject],
    page: Size,
    dragged_id: &str,
    proposed: Point,
    threshold: f64,
) -> SnapResult {
    let Some(dragged) = objects.iter().find(|o| o.id == dragged_id) else {
        log::debug!("Snap skipped: object {} not in scene", dragged_id);
        return SnapResult::none(proposed);
    };

    let mut moved = dragged.clone();
    moved.set_position(proposed);
    let (vertical_edges, horizontal_edges) = object_edges(snap_bounds(&moved), proposed);
    let stops = guide_stops(objects, page, dragged_id);

    let mut result = SnapResult::none(proposed);
    if let Some(m) = closest(&stops.vertical, &vertical_edges, threshold) {
        result.position.x = m.line_guide + m.offset;
        result.guides.push(Guide {
            orientation: GuideOrientation::Vertical,
            line_guide: m.line_guide,
            snap: m.snap,
        });
    }
    if let Some(m) = closest(&stops.horizontal, &horizontal_edges, threshold) {
        result.position.y = m.line_guide + m.offset;
        result.guides.push(Guide {
            orientation: GuideOrientation::Horizontal,
            line_guide: m.line_guide,
            snap: m.snap,
        });
    }
    result
}

/// Guides currently shown by the surface. Cleared when a drag ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapState {
    guides: Vec<Guide>,
    dragging: bool,
}

impl SnapState {
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Record one drag step and its guides.
    pub fn set(&mut self, guides: Vec<Guide>) {
        self.guides = guides;
        self.dragging = true;
    }

    pub fn clear(&mut self) {
        self.guides.clear();
        self.dragging = false;
    }

    /// End the drag. Returns whether one was in progress.
    pub fn finish(&mut self) -> bool {
        let was_dragging = self.dragging;
        self.clear();
        was_dragging
    }
}
