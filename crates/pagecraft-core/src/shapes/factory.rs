//! Preset shape factories.

use super::geometry::{cross_points, diamond_points, flatten_points, heart_points, triangle_points};
use super::{CanvasObject, ObjectKind, Paint};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Top-left origin used by box-shaped presets.
const PRESET_ORIGIN: Point = Point::new(100.0, 100.0);
/// Center used by presets positioned by their center.
const PRESET_CENTER: Point = Point::new(150.0, 150.0);
/// Edge length of preset bounding boxes.
const PRESET_SIZE: f64 = 100.0;

/// Styling applied to newly created objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleDefaults {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub dash: Vec<f64>,
    pub font_family: String,
    pub font_size: f64,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            fill: "#3b82f6".to_string(),
            stroke: "#000000".to_string(),
            stroke_width: 0.0,
            dash: Vec::new(),
            font_family: "Arial".to_string(),
            font_size: 24.0,
        }
    }
}

impl StyleDefaults {
    /// Paint for filled shapes.
    pub fn paint(&self) -> Paint {
        Paint {
            fill: self.fill.clone(),
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
            dash: self.dash.clone(),
        }
    }

    /// Paint for open strokes (lines, arrows): the fill color becomes the stroke.
    pub fn line_paint(&self) -> Paint {
        Paint {
            fill: self.fill.clone(),
            stroke: self.fill.clone(),
            stroke_width: self.stroke_width.max(4.0),
            dash: self.dash.clone(),
        }
    }
}

/// Built-in shapes offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapePreset {
    Rectangle,
    Circle,
    Triangle,
    Diamond,
    Star,
    Arrow,
    Pentagon,
    Hexagon,
    Octagon,
    RegularPolygon(u32),
    Heart,
    Cross,
    Line,
}

impl ShapePreset {
    /// Build the preset with default geometry and the given styling.
    pub fn build(self, style: &StyleDefaults) -> CanvasObject {
        let (kind, position, paint) = match self {
            ShapePreset::Rectangle => (
                ObjectKind::Rect {
                    width: PRESET_SIZE,
                    height: PRESET_SIZE,
                    corner_radius: 0.0,
                },
                PRESET_ORIGIN,
                style.paint(),
            ),
            ShapePreset::Circle => (
                ObjectKind::Circle {
                    radius: PRESET_SIZE / 2.0,
                },
                PRESET_CENTER,
                style.paint(),
            ),
            ShapePreset::Triangle => (
                ObjectKind::Polygon {
                    points: triangle_points(PRESET_SIZE, PRESET_SIZE),
                },
                PRESET_ORIGIN,
                style.paint(),
            ),
            ShapePreset::Diamond => (
                ObjectKind::Polygon {
                    points: diamond_points(PRESET_SIZE, PRESET_SIZE),
                },
                PRESET_ORIGIN,
                style.paint(),
            ),
            ShapePreset::Star => (
                ObjectKind::Star {
                    num_points: 5,
                    inner_radius: PRESET_SIZE / 4.0,
                    outer_radius: PRESET_SIZE / 2.0,
                },
                PRESET_CENTER,
                style.paint(),
            ),
            ShapePreset::Arrow => (
                ObjectKind::Arrow {
                    points: flatten_points(&[Point::ZERO, Point::new(PRESET_SIZE * 1.5, 0.0)]),
                    pointer_length: 10.0,
                    pointer_width: 10.0,
                },
                PRESET_ORIGIN,
                style.line_paint(),
            ),
            ShapePreset::Pentagon => return ShapePreset::RegularPolygon(5).build(style),
            ShapePreset::Hexagon => return ShapePreset::RegularPolygon(6).build(style),
            ShapePreset::Octagon => return ShapePreset::RegularPolygon(8).build(style),
            ShapePreset::RegularPolygon(sides) => (
                ObjectKind::RegularPolygon {
                    sides: sides.max(3),
                    radius: PRESET_SIZE / 2.0,
                },
                PRESET_CENTER,
                style.paint(),
            ),
            ShapePreset::Heart => (
                ObjectKind::Polygon {
                    points: heart_points(PRESET_SIZE, 64),
                },
                PRESET_ORIGIN,
                style.paint(),
            ),
            ShapePreset::Cross => (
                ObjectKind::Polygon {
                    points: cross_points(PRESET_SIZE, PRESET_SIZE / 3.0),
                },
                PRESET_ORIGIN,
                style.paint(),
            ),
            ShapePreset::Line => (
                ObjectKind::Line {
                    points: flatten_points(&[Point::ZERO, Point::new(PRESET_SIZE * 1.5, 0.0)]),
                    tension: 0.0,
                },
                PRESET_ORIGIN,
                style.line_paint(),
            ),
        };
        CanvasObject::new(kind, position, paint)
    }
}

/// Text object using the current font defaults.
pub(crate) fn text_object(text: &str, style: &StyleDefaults) -> CanvasObject {
    CanvasObject::new(
        ObjectKind::Text {
            text: text.to_string(),
            font_size: style.font_size,
            font_family: style.font_family.clone(),
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            text_decoration: String::new(),
            align: "left".to_string(),
            width: None,
        },
        PRESET_ORIGIN,
        Paint {
            fill: style.fill.clone(),
            ..Paint::default()
        },
    )
}

/// Image object sized to its source.
pub(crate) fn image_object(src: &str, width: f64, height: f64) -> CanvasObject {
    CanvasObject::new(
        ObjectKind::Image {
            src: src.to_string(),
            width,
            height,
        },
        PRESET_ORIGIN,
        Paint::default(),
    )
}

/// Freehand stroke: points become relative to the first point, which becomes the
/// object's position.
pub(crate) fn stroke_object(points: &[Point], style: &StyleDefaults) -> Option<CanvasObject> {
    let origin = *points.first()?;
    if points.len() < 2 {
        return None;
    }
    let relative: Vec<Point> = points
        .iter()
        .map(|p| Point::new(p.x - origin.x, p.y - origin.y))
        .collect();
    Some(CanvasObject::new(
        ObjectKind::Line {
            points: flatten_points(&relative),
            tension: 0.5,
        },
        origin,
        Paint {
            fill: String::new(),
            stroke: style.stroke.clone(),
            stroke_width: style.stroke_width.max(1.0),
            dash: style.dash.clone(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_inherit_style() {
        let style = StyleDefaults {
            fill: "#ff0000".into(),
            stroke: "#00ff00".into(),
            stroke_width: 3.0,
            dash: vec![4.0, 2.0],
            ..Default::default()
        };
        let rect = ShapePreset::Rectangle.build(&style);
        assert_eq!(rect.paint.fill, "#ff0000");
        assert_eq!(rect.paint.stroke, "#00ff00");
        assert_eq!(rect.paint.stroke_width, 3.0);
        assert_eq!(rect.paint.dash, vec![4.0, 2.0]);
    }

    #[test]
    fn test_named_polygons() {
        let style = StyleDefaults::default();
        let hex = ShapePreset::Hexagon.build(&style);
        assert!(matches!(hex.kind, ObjectKind::RegularPolygon { sides: 6, .. }));
        let tri = ShapePreset::Triangle.build(&style);
        assert!(matches!(tri.kind, ObjectKind::Polygon { ref points } if points.len() == 6));
        let degenerate = ShapePreset::RegularPolygon(1).build(&style);
        assert!(matches!(degenerate.kind, ObjectKind::RegularPolygon { sides: 3, .. }));
    }

    #[test]
    fn test_presets_get_unique_ids() {
        let style = StyleDefaults::default();
        let a = ShapePreset::Circle.build(&style);
        let b = ShapePreset::Circle.build(&style);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_stroke_object_is_relative() {
        let style = StyleDefaults::default();
        let obj = stroke_object(
            &[Point::new(10.0, 10.0), Point::new(20.0, 15.0)],
            &style,
        )
        .unwrap();
        assert_eq!(obj.position(), Point::new(10.0, 10.0));
        assert!(matches!(obj.kind, ObjectKind::Line { ref points, .. } if points == &vec![0.0, 0.0, 10.0, 5.0]));
        assert!(stroke_object(&[Point::new(1.0, 1.0)], &style).is_none());
    }
}
