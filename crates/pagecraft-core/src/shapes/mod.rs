//! Drawable object definitions for a page scene.

mod factory;
mod geometry;

pub use factory::{ShapePreset, StyleDefaults};
pub(crate) use factory::{image_object, stroke_object, text_object};
pub use geometry::{
    arrow_head, cross_points, diamond_points, flatten_points, heart_points, pair_points,
    points_bounds, regular_polygon_vertices, star_vertices, triangle_points,
};

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for scene objects.
pub type ObjectId = String;

/// Generate a fresh object identifier.
pub fn new_object_id() -> ObjectId {
    Uuid::new_v4().to_string()
}

fn default_one() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_font_size() -> f64 {
    24.0
}

fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_normal() -> String {
    "normal".to_string()
}

fn default_align() -> String {
    "left".to_string()
}

/// Paint attributes shared by every object type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    /// Fill color (CSS color string, empty = no fill).
    #[serde(default)]
    pub fill: String,
    /// Stroke color (CSS color string, empty = no stroke).
    #[serde(default)]
    pub stroke: String,
    /// Stroke width in page pixels.
    #[serde(default)]
    pub stroke_width: f64,
    /// Dash pattern (empty = solid).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
}

/// Geometry and type-specific attributes, discriminated by `type`.
///
/// Point-based shapes store a flat `[x0, y0, x1, y1, ...]` list relative to the
/// object's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ObjectKind {
    Rect {
        width: f64,
        height: f64,
        #[serde(default)]
        corner_radius: f64,
    },
    Circle {
        radius: f64,
    },
    Text {
        text: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default = "default_normal")]
        font_weight: String,
        #[serde(default = "default_normal")]
        font_style: String,
        #[serde(default)]
        text_decoration: String,
        #[serde(default = "default_align")]
        align: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
    },
    Image {
        src: String,
        width: f64,
        height: f64,
    },
    Line {
        points: Vec<f64>,
        #[serde(default)]
        tension: f64,
    },
    Polygon {
        points: Vec<f64>,
    },
    RegularPolygon {
        sides: u32,
        radius: f64,
    },
    Star {
        num_points: u32,
        inner_radius: f64,
        outer_radius: f64,
    },
    Arrow {
        points: Vec<f64>,
        pointer_length: f64,
        pointer_width: f64,
    },
}

impl ObjectKind {
    /// The `type` tag used in persisted documents.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectKind::Rect { .. } => "rect",
            ObjectKind::Circle { .. } => "circle",
            ObjectKind::Text { .. } => "text",
            ObjectKind::Image { .. } => "image",
            ObjectKind::Line { .. } => "line",
            ObjectKind::Polygon { .. } => "polygon",
            ObjectKind::RegularPolygon { .. } => "regularPolygon",
            ObjectKind::Star { .. } => "star",
            ObjectKind::Arrow { .. } => "arrow",
        }
    }

    /// Bounding box in the object's own coordinate space (before transform).
    pub fn local_bounds(&self) -> Rect {
        match self {
            ObjectKind::Rect { width, height, .. } | ObjectKind::Image { width, height, .. } => {
                Rect::new(0.0, 0.0, *width, *height)
            }
            ObjectKind::Circle { radius } => Rect::new(-radius, -radius, *radius, *radius),
            ObjectKind::Text {
                text,
                font_size,
                width,
                ..
            } => {
                let (w, h) = estimate_text_size(text, *font_size);
                Rect::new(0.0, 0.0, width.unwrap_or(w), h)
            }
            ObjectKind::Line { points, .. }
            | ObjectKind::Polygon { points }
            | ObjectKind::Arrow { points, .. } => points_bounds(points),
            ObjectKind::RegularPolygon { sides, radius } => {
                let pts = regular_polygon_vertices(*sides, *radius);
                points_bounds(&flatten_points(&pts))
            }
            ObjectKind::Star {
                num_points,
                inner_radius,
                outer_radius,
            } => {
                let pts = star_vertices(*num_points, *inner_radius, *outer_radius);
                points_bounds(&flatten_points(&pts))
            }
        }
    }

    /// Whether this is a circle (positioned by its center).
    pub fn is_circle(&self) -> bool {
        matches!(self, ObjectKind::Circle { .. })
    }

    /// Whether this is a text object.
    pub fn is_text(&self) -> bool {
        matches!(self, ObjectKind::Text { .. })
    }
}

/// Rough text metrics used when no renderer measurement is available.
///
/// Width uses an average glyph advance of 0.6em; height is one line per `\n`.
pub fn estimate_text_size(text: &str, font_size: f64) -> (f64, f64) {
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let lines = text.lines().count().max(1);
    (longest as f64 * font_size * 0.6, lines as f64 * font_size)
}

/// The animatable transform subset of an object (the attributes a render node
/// exposes for playback).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttrs {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub opacity: f64,
}

/// A drawable primitive on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasObject {
    /// Immutable identifier, unique within the scene.
    pub id: ObjectId,
    #[serde(flatten)]
    pub kind: ObjectKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(flatten)]
    pub paint: Paint,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_one")]
    pub opacity: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_one")]
    pub scale_x: f64,
    #[serde(default = "default_one")]
    pub scale_y: f64,
    #[serde(default = "default_true")]
    pub draggable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Named image filters (e.g. `grayscale`, `blur`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
}

impl CanvasObject {
    /// Create an object with a fresh id at the given position.
    pub fn new(kind: ObjectKind, position: Point, paint: Paint) -> Self {
        Self {
            id: new_object_id(),
            kind,
            x: position.x,
            y: position.y,
            paint,
            opacity: 1.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            draggable: true,
            visible: None,
            locked: None,
            name: None,
            filters: Vec::new(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn is_visible(&self) -> bool {
        self.visible.unwrap_or(true)
    }

    pub fn is_locked(&self) -> bool {
        self.locked.unwrap_or(false)
    }

    /// Object-to-page transform: translate, then rotate, then scale.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Axis-aligned client rectangle in page coordinates.
    pub fn bounds(&self) -> Rect {
        self.transform().transform_rect_bbox(self.kind.local_bounds())
    }

    /// Current values of the animatable attributes.
    pub fn node_attrs(&self) -> NodeAttrs {
        NodeAttrs {
            x: self.x,
            y: self.y,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            rotation: self.rotation,
            opacity: self.opacity,
        }
    }

    /// Overwrite the animatable attributes.
    pub fn apply_node_attrs(&mut self, attrs: &NodeAttrs) {
        self.x = attrs.x;
        self.y = attrs.y;
        self.scale_x = attrs.scale_x;
        self.scale_y = attrs.scale_y;
        self.rotation = attrs.rotation;
        self.opacity = attrs.opacity;
    }

    /// Clone with a freshly generated id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: new_object_id(),
            ..self.clone()
        }
    }
}

/// A partial attribute update applied to selected objects.
///
/// Type-specific fields are ignored for objects that do not carry them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub dash: Option<Vec<f64>>,
    pub opacity: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub draggable: Option<bool>,
    pub name: Option<String>,
    pub filters: Option<Vec<String>>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub radius: Option<f64>,
    pub corner_radius: Option<f64>,
    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub text_decoration: Option<String>,
    pub align: Option<String>,
    pub src: Option<String>,
}

impl ObjectPatch {
    /// Apply every present field to `object`.
    pub fn apply(&self, object: &mut CanvasObject) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut object.x, &self.x);
        set(&mut object.y, &self.y);
        set(&mut object.paint.fill, &self.fill);
        set(&mut object.paint.stroke, &self.stroke);
        set(&mut object.paint.stroke_width, &self.stroke_width);
        set(&mut object.paint.dash, &self.dash);
        if let Some(opacity) = self.opacity {
            object.opacity = opacity.clamp(0.0, 1.0);
        }
        set(&mut object.rotation, &self.rotation);
        set(&mut object.scale_x, &self.scale_x);
        set(&mut object.scale_y, &self.scale_y);
        set(&mut object.draggable, &self.draggable);
        set(&mut object.filters, &self.filters);
        if self.name.is_some() {
            object.name = self.name.clone();
        }

        match &mut object.kind {
            ObjectKind::Rect {
                width,
                height,
                corner_radius,
            } => {
                set(width, &self.width);
                set(height, &self.height);
                set(corner_radius, &self.corner_radius);
            }
            ObjectKind::Image { src, width, height } => {
                set(src, &self.src);
                set(width, &self.width);
                set(height, &self.height);
            }
            ObjectKind::Circle { radius } | ObjectKind::RegularPolygon { radius, .. } => {
                set(radius, &self.radius);
            }
            ObjectKind::Text {
                text,
                font_size,
                font_family,
                font_weight,
                font_style,
                text_decoration,
                align,
                width,
            } => {
                set(text, &self.text);
                set(font_size, &self.font_size);
                set(font_family, &self.font_family);
                set(font_weight, &self.font_weight);
                set(font_style, &self.font_style);
                set(text_decoration, &self.text_decoration);
                set(align, &self.align);
                if self.width.is_some() {
                    *width = self.width;
                }
            }
            ObjectKind::Star { outer_radius, .. } => {
                set(outer_radius, &self.radius);
            }
            ObjectKind::Line { .. } | ObjectKind::Polygon { .. } | ObjectKind::Arrow { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> CanvasObject {
        CanvasObject::new(
            ObjectKind::Rect {
                width: w,
                height: h,
                corner_radius: 0.0,
            },
            Point::new(x, y),
            Paint::default(),
        )
    }

    #[test]
    fn test_rect_bounds() {
        let obj = rect(10.0, 20.0, 100.0, 50.0);
        let b = obj.bounds();
        assert!((b.x0 - 10.0).abs() < 1e-9);
        assert!((b.y0 - 20.0).abs() < 1e-9);
        assert!((b.x1 - 110.0).abs() < 1e-9);
        assert!((b.y1 - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_scaled_and_rotated_bounds() {
        let mut obj = rect(0.0, 0.0, 100.0, 50.0);
        obj.scale_x = 2.0;
        assert!((obj.bounds().width() - 200.0).abs() < 1e-9);

        obj.scale_x = 1.0;
        obj.rotation = 90.0;
        let b = obj.bounds();
        assert!((b.width() - 50.0).abs() < 1e-9);
        assert!((b.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_circle_bounds_are_centered() {
        let obj = CanvasObject::new(
            ObjectKind::Circle { radius: 25.0 },
            Point::new(100.0, 100.0),
            Paint::default(),
        );
        let b = obj.bounds();
        assert!((b.x0 - 75.0).abs() < 1e-9);
        assert!((b.x1 - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_json_shape() {
        let obj = rect(1.0, 2.0, 3.0, 4.0);
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["type"], "rect");
        assert_eq!(value["strokeWidth"], 0.0);
        assert_eq!(value["scaleX"], 1.0);
        assert!(value.get("visible").is_none());

        let parsed: CanvasObject = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, obj);
    }

    #[test]
    fn test_json_defaults() {
        let json = r##"{"id":"a","type":"text","text":"Hi","x":5,"y":6,"fill":"#000"}"##;
        let obj: CanvasObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.opacity, 1.0);
        assert!(obj.draggable);
        match obj.kind {
            ObjectKind::Text {
                font_size,
                ref font_family,
                ref align,
                ..
            } => {
                assert_eq!(font_size, 24.0);
                assert_eq!(font_family, "Arial");
                assert_eq!(align, "left");
            }
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_regular_polygon_tag() {
        let json = r#"{"id":"p","type":"regularPolygon","sides":6,"radius":40}"#;
        let obj: CanvasObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.kind.type_name(), "regularPolygon");
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut obj = rect(0.0, 0.0, 10.0, 10.0);
        obj.paint.stroke = "#111".into();
        let patch = ObjectPatch {
            fill: Some("#ff0000".into()),
            width: Some(40.0),
            opacity: Some(3.0),
            font_size: Some(99.0),
            ..Default::default()
        };
        patch.apply(&mut obj);
        assert_eq!(obj.paint.fill, "#ff0000");
        assert_eq!(obj.paint.stroke, "#111");
        assert_eq!(obj.opacity, 1.0);
        assert!(matches!(obj.kind, ObjectKind::Rect { width, .. } if width == 40.0));
    }

    #[test]
    fn test_duplicate_gets_new_id() {
        let obj = rect(0.0, 0.0, 10.0, 10.0);
        let copy = obj.duplicate();
        assert_ne!(obj.id, copy.id);
        assert_eq!(obj.kind, copy.kind);
    }
}
