//! Scene to SVG document conversion.
//!
//! Object geometry is written in local coordinates inside a `<g>` carrying the
//! object's transform, so the output mirrors the scene graph one-to-one.

use crate::color::svg_paint;
use crate::{RenderError, RenderResult};
use kurbo::{Affine, BezPath, Point, Size};
use pagecraft_core::Scene;
use pagecraft_core::shapes::{
    CanvasObject, ObjectKind, Paint, arrow_head, estimate_text_size, pair_points,
    regular_polygon_vertices, star_vertices,
};
use pagecraft_core::snap::{Guide, GuideOrientation};
use std::fmt::{self, Write};

/// Color of alignment guides in previews.
pub const GUIDE_COLOR: &str = "#00a1ff";

/// Options for [`scene_to_svg`].
#[derive(Debug, Clone, Default)]
pub struct SvgOptions {
    /// Snap guides drawn as dashed lines above the content.
    pub guides: Vec<Guide>,
    /// Leave out the background rectangle.
    pub transparent: bool,
}

/// Write `scene` as a standalone SVG document of the given page size.
///
/// Hidden objects are skipped. The page is always drawn at identity scale.
pub fn scene_to_svg(scene: &Scene, size: Size, options: &SvgOptions) -> RenderResult<String> {
    let mut out = String::new();
    write_document(&mut out, scene, size, options).map_err(|e| RenderError::Svg(e.to_string()))?;
    Ok(out)
}

fn write_document(out: &mut String, scene: &Scene, size: Size, options: &SvgOptions) -> fmt::Result {
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(size.width),
        h = num(size.height)
    )?;

    if !options.transparent {
        if let Some((color, alpha)) = svg_paint(&scene.background) {
            write!(out, r#"<rect width="100%" height="100%" fill="{}""#, color)?;
            write_opacity(out, "fill-opacity", alpha)?;
            writeln!(out, "/>")?;
        }
    }

    for (index, object) in scene.objects.iter().enumerate() {
        if object.is_visible() {
            write_object(out, object, index)?;
        }
    }

    for guide in &options.guides {
        write_guide(out, guide, size)?;
    }

    writeln!(out, "</svg>")
}

fn write_object(out: &mut String, object: &CanvasObject, index: usize) -> fmt::Result {
    let filter = filter_primitives(&object.filters);
    if !filter.is_empty() {
        writeln!(
            out,
            r#"<defs><filter id="filter-{}" x="-20%" y="-20%" width="140%" height="140%">{}</filter></defs>"#,
            index, filter
        )?;
    }

    write!(out, r#"<g transform="{}""#, matrix(object.transform()))?;
    write_opacity(out, "opacity", object.opacity.clamp(0.0, 1.0))?;
    if !filter.is_empty() {
        write!(out, r#" filter="url(#filter-{})""#, index)?;
    }
    out.push('>');

    let paint = &object.paint;
    match &object.kind {
        ObjectKind::Rect {
            width,
            height,
            corner_radius,
        } => {
            write!(out, r#"<rect width="{}" height="{}""#, num(*width), num(*height))?;
            if *corner_radius > 0.0 {
                write!(out, r#" rx="{}""#, num(*corner_radius))?;
            }
            write_paint(out, paint, true)?;
            out.push_str("/>");
        }
        ObjectKind::Circle { radius } => {
            write!(out, r#"<circle r="{}""#, num(*radius))?;
            write_paint(out, paint, true)?;
            out.push_str("/>");
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
            let box_width = width.unwrap_or_else(|| estimate_text_size(text, *font_size).0);
            let (anchor, x) = match align.as_str() {
                "center" => ("middle", box_width / 2.0),
                "right" => ("end", box_width),
                _ => ("start", 0.0),
            };
            write!(
                out,
                r#"<text font-size="{}" font-family="{}" font-weight="{}" font-style="{}" text-anchor="{}""#,
                num(*font_size),
                escape_xml(font_family),
                escape_xml(font_weight),
                escape_xml(font_style),
                anchor
            )?;
            if !text_decoration.is_empty() && text_decoration != "none" {
                write!(out, r#" text-decoration="{}""#, escape_xml(text_decoration))?;
            }
            write_paint(out, paint, true)?;
            out.push('>');
            for (line_index, line) in text.lines().enumerate() {
                write!(
                    out,
                    r#"<tspan x="{}" y="{}">{}</tspan>"#,
                    num(x),
                    num((line_index as f64 + 0.8) * font_size),
                    escape_xml(line)
                )?;
            }
            out.push_str("</text>");
        }
        ObjectKind::Image { src, width, height } => {
            write!(
                out,
                r#"<image xlink:href="{}" width="{}" height="{}" preserveAspectRatio="none"/>"#,
                escape_xml(src),
                num(*width),
                num(*height)
            )?;
        }
        ObjectKind::Line { points, tension } => {
            let path = tension_path(&pair_points(points), *tension);
            write!(out, r#"<path d="{}""#, path.to_svg())?;
            write_paint(out, paint, false)?;
            out.push_str(r#" stroke-linecap="round" stroke-linejoin="round"/>"#);
        }
        ObjectKind::Polygon { points } => {
            write_polygon(out, &pair_points(points), paint)?;
        }
        ObjectKind::RegularPolygon { sides, radius } => {
            write_polygon(out, &regular_polygon_vertices(*sides, *radius), paint)?;
        }
        ObjectKind::Star {
            num_points,
            inner_radius,
            outer_radius,
        } => {
            write_polygon(
                out,
                &star_vertices(*num_points, *inner_radius, *outer_radius),
                paint,
            )?;
        }
        ObjectKind::Arrow {
            points,
            pointer_length,
            pointer_width,
        } => {
            let path = tension_path(&pair_points(points), 0.0);
            write!(out, r#"<path d="{}""#, path.to_svg())?;
            write_paint(out, paint, false)?;
            out.push_str(r#" stroke-linecap="round"/>"#);

            if let Some(head) = arrow_head(points, *pointer_length, *pointer_width) {
                let head_fill = if paint.fill.is_empty() {
                    &paint.stroke
                } else {
                    &paint.fill
                };
                let head_paint = Paint {
                    fill: head_fill.clone(),
                    ..paint.clone()
                };
                write_polygon(out, &head, &head_paint)?;
            }
        }
    }

    writeln!(out, "</g>")
}

fn write_polygon(out: &mut String, points: &[Point], paint: &Paint) -> fmt::Result {
    out.push_str(r#"<polygon points=""#);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write!(out, "{},{}", num(p.x), num(p.y))?;
    }
    out.push('"');
    write_paint(out, paint, true)?;
    out.push_str(r#" stroke-linejoin="round"/>"#);
    Ok(())
}

fn write_paint(out: &mut String, paint: &Paint, filled: bool) -> fmt::Result {
    match svg_paint(&paint.fill).filter(|_| filled) {
        Some((color, alpha)) => {
            write!(out, r#" fill="{}""#, color)?;
            write_opacity(out, "fill-opacity", alpha)?;
        }
        None => out.push_str(r#" fill="none""#),
    }

    let stroke = svg_paint(&paint.stroke).filter(|_| paint.stroke_width > 0.0);
    if let Some((color, alpha)) = stroke {
        write!(
            out,
            r#" stroke="{}" stroke-width="{}""#,
            color,
            num(paint.stroke_width)
        )?;
        write_opacity(out, "stroke-opacity", alpha)?;
        if !paint.dash.is_empty() {
            let dash: Vec<String> = paint.dash.iter().map(|d| num(*d).to_string()).collect();
            write!(out, r#" stroke-dasharray="{}""#, dash.join(" "))?;
        }
    }
    Ok(())
}

fn write_opacity(out: &mut String, attr: &str, value: f64) -> fmt::Result {
    if value < 1.0 {
        write!(out, r#" {}="{}""#, attr, num(value))?;
    }
    Ok(())
}

fn write_guide(out: &mut String, guide: &Guide, size: Size) -> fmt::Result {
    let (x1, y1, x2, y2) = match guide.orientation {
        GuideOrientation::Vertical => (guide.line_guide, 0.0, guide.line_guide, size.height),
        GuideOrientation::Horizontal => (0.0, guide.line_guide, size.width, guide.line_guide),
    };
    writeln!(
        out,
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1" stroke-dasharray="4 6"/>"#,
        num(x1),
        num(y1),
        num(x2),
        num(y2),
        GUIDE_COLOR
    )
}

/// Filter primitives for the named image filters. Unknown names are skipped.
fn filter_primitives(filters: &[String]) -> String {
    let mut out = String::new();
    for name in filters {
        match name.to_ascii_lowercase().as_str() {
            "grayscale" => out.push_str(r#"<feColorMatrix type="saturate" values="0"/>"#),
            "sepia" => out.push_str(
                r#"<feColorMatrix type="matrix" values="0.393 0.769 0.189 0 0 0.349 0.686 0.168 0 0 0.272 0.534 0.131 0 0 0 0 0 1 0"/>"#,
            ),
            "invert" => out.push_str(
                r#"<feComponentTransfer><feFuncR type="table" tableValues="1 0"/><feFuncG type="table" tableValues="1 0"/><feFuncB type="table" tableValues="1 0"/></feComponentTransfer>"#,
            ),
            "blur" => out.push_str(r#"<feGaussianBlur stdDeviation="5"/>"#),
            "brighten" => out.push_str(
                r#"<feComponentTransfer><feFuncR type="linear" slope="1" intercept="0.2"/><feFuncG type="linear" slope="1" intercept="0.2"/><feFuncB type="linear" slope="1" intercept="0.2"/></feComponentTransfer>"#,
            ),
            other => log::debug!("Unsupported filter {:?}", other),
        }
    }
    out
}

/// Path through `points`, smoothed with cardinal-spline control points when
/// `tension` is positive.
fn tension_path(points: &[Point], tension: f64) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = points.first() else {
        return path;
    };
    path.move_to(first);

    if tension <= 0.0 || points.len() < 3 {
        for p in &points[1..] {
            path.line_to(*p);
        }
        return path;
    }

    // (before, after) control points for each interior point.
    let controls: Vec<(Point, Point)> = points
        .windows(3)
        .map(|w| {
            let (p0, p1, p2) = (w[0], w[1], w[2]);
            let d01 = p0.distance(p1);
            let d12 = p1.distance(p2);
            let total = d01 + d12;
            let (fa, fb) = if total > 0.0 {
                (tension * d01 / total, tension * d12 / total)
            } else {
                (0.0, 0.0)
            };
            let span = p2 - p0;
            (p1 - span * fa, p1 + span * fb)
        })
        .collect();

    let last = points.len() - 1;
    path.quad_to(controls[0].0, points[1]);
    for i in 1..last - 1 {
        path.curve_to(controls[i - 1].1, controls[i].0, points[i + 1]);
    }
    path.quad_to(controls[last - 2].1, points[last]);
    path
}

fn matrix(affine: Affine) -> String {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        num(a),
        num(b),
        num(c),
        num(d),
        num(e),
        num(f)
    )
}

/// Normalize negative zero so it prints as `0`.
fn num(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_core::AnimatedProperties;
    use pagecraft_core::snap::SnapKind;
    use std::collections::HashMap;

    fn rect(x: f64, y: f64) -> CanvasObject {
        CanvasObject::new(
            ObjectKind::Rect {
                width: 40.0,
                height: 20.0,
                corner_radius: 0.0,
            },
            Point::new(x, y),
            Paint {
                fill: "#ff0000".into(),
                ..Default::default()
            },
        )
    }

    fn page() -> Size {
        Size::new(200.0, 100.0)
    }

    #[test]
    fn test_document_header_and_background() {
        let svg = scene_to_svg(&Scene::default(), page(), &SvgOptions::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 200 100""#));
        assert!(svg.contains(r##"<rect width="100%" height="100%" fill="#ffffff""##));
        assert!(svg.trim_end().ends_with("</svg>"));

        let options = SvgOptions {
            transparent: true,
            ..Default::default()
        };
        let svg = scene_to_svg(&Scene::default(), page(), &options).unwrap();
        assert!(!svg.contains("100%"));
    }

    #[test]
    fn test_rect_with_transform_and_paint() {
        let mut scene = Scene::default();
        scene.push(rect(10.0, 20.0));
        let svg = scene_to_svg(&scene, page(), &SvgOptions::default()).unwrap();
        assert!(svg.contains(r#"<g transform="matrix(1 0 0 1 10 20)">"#));
        assert!(svg.contains(r##"<rect width="40" height="20" fill="#ff0000"/>"##));
    }

    #[test]
    fn test_hidden_objects_skipped() {
        let mut scene = Scene::default();
        let mut hidden = rect(0.0, 0.0);
        hidden.visible = Some(false);
        scene.push(hidden);
        let svg = scene_to_svg(&scene, page(), &SvgOptions::default()).unwrap();
        assert!(!svg.contains("<g"));
    }

    #[test]
    fn test_overrides_show_in_output() {
        let mut scene = Scene::default();
        let object = rect(0.0, 0.0);
        let id = object.id.clone();
        scene.push(object);

        let mut overrides = HashMap::new();
        overrides.insert(
            id,
            AnimatedProperties {
                x: Some(50.0),
                y: Some(5.0),
                opacity: Some(0.5),
                ..Default::default()
            },
        );
        let svg = scene_to_svg(&scene.presented(&overrides), page(), &SvgOptions::default()).unwrap();
        assert!(svg.contains("matrix(1 0 0 1 50 5)"));
        assert!(svg.contains(r#"opacity="0.5""#));
    }

    #[test]
    fn test_text_is_escaped_and_split() {
        let mut scene = Scene::default();
        scene.push(CanvasObject::new(
            ObjectKind::Text {
                text: "a<b\n&c".into(),
                font_size: 10.0,
                font_family: "Arial".into(),
                font_weight: "bold".into(),
                font_style: "normal".into(),
                text_decoration: String::new(),
                align: "left".into(),
                width: None,
            },
            Point::ZERO,
            Paint {
                fill: "black".into(),
                ..Default::default()
            },
        ));
        let svg = scene_to_svg(&scene, page(), &SvgOptions::default()).unwrap();
        assert!(svg.contains(r#"<tspan x="0" y="8">a&lt;b</tspan>"#));
        assert!(svg.contains(r#"<tspan x="0" y="18">&amp;c</tspan>"#));
        assert!(svg.contains(r#"font-weight="bold""#));
    }

    #[test]
    fn test_filters_become_defs() {
        let mut scene = Scene::default();
        let mut object = rect(0.0, 0.0);
        object.filters = vec!["Grayscale".into(), "Blur".into(), "Pixelate".into()];
        scene.push(object);
        let svg = scene_to_svg(&scene, page(), &SvgOptions::default()).unwrap();
        assert!(svg.contains(r#"<filter id="filter-0""#));
        assert!(svg.contains("feColorMatrix"));
        assert!(svg.contains("feGaussianBlur"));
        assert!(svg.contains(r#"filter="url(#filter-0)""#));
    }

    #[test]
    fn test_stroke_and_dash() {
        let mut scene = Scene::default();
        scene.push(CanvasObject::new(
            ObjectKind::Line {
                points: vec![0.0, 0.0, 10.0, 10.0],
                tension: 0.0,
            },
            Point::ZERO,
            Paint {
                fill: "#00ff00".into(),
                stroke: "#000000".into(),
                stroke_width: 2.0,
                dash: vec![4.0, 2.0],
            },
        ));
        let svg = scene_to_svg(&scene, page(), &SvgOptions::default()).unwrap();
        assert!(svg.contains(r##"fill="none" stroke="#000000" stroke-width="2" stroke-dasharray="4 2""##));
    }

    #[test]
    fn test_arrow_has_head() {
        let mut scene = Scene::default();
        scene.push(CanvasObject::new(
            ObjectKind::Arrow {
                points: vec![0.0, 0.0, 100.0, 0.0],
                pointer_length: 10.0,
                pointer_width: 10.0,
            },
            Point::ZERO,
            Paint {
                stroke: "#000000".into(),
                stroke_width: 2.0,
                ..Default::default()
            },
        ));
        let svg = scene_to_svg(&scene, page(), &SvgOptions::default()).unwrap();
        assert!(svg.contains(r##"<polygon points="100,0 90,5 90,-5" fill="#000000""##));
    }

    #[test]
    fn test_guides_drawn_dashed() {
        let options = SvgOptions {
            guides: vec![Guide {
                orientation: GuideOrientation::Vertical,
                line_guide: 100.0,
                snap: SnapKind::Center,
            }],
            transparent: false,
        };
        let svg = scene_to_svg(&Scene::default(), page(), &options).unwrap();
        assert!(svg.contains(r#"<line x1="100" y1="0" x2="100" y2="100""#));
        assert!(svg.contains(GUIDE_COLOR));
    }

    #[test]
    fn test_tension_path_curves() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 10.0),
        ];
        let straight = tension_path(&points, 0.0);
        assert_eq!(straight.elements().len(), 4);

        let smooth = tension_path(&points, 0.5);
        let svg = smooth.to_svg();
        assert!(svg.contains('Q'));
        assert!(svg.contains('C'));
        assert_eq!(smooth.elements().len(), 4);
    }
}
