//! Point-list formulas for polygon-like shapes.

use kurbo::{Point, Rect, Vec2};
use std::f64::consts::{PI, TAU};

/// Flatten points into `[x0, y0, x1, y1, ...]`.
pub fn flatten_points(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Pair up a flat coordinate list. A trailing odd coordinate is ignored.
pub fn pair_points(flat: &[f64]) -> Vec<Point> {
    flat.chunks_exact(2).map(|c| Point::new(c[0], c[1])).collect()
}

/// Bounding box of a flat coordinate list (zero rect when empty).
pub fn points_bounds(flat: &[f64]) -> Rect {
    let mut iter = flat.chunks_exact(2);
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    let mut rect = Rect::new(first[0], first[1], first[0], first[1]);
    for c in iter {
        rect = rect.union_pt(Point::new(c[0], c[1]));
    }
    rect
}

/// Vertices of a regular polygon centered on the origin, first vertex pointing up.
pub fn regular_polygon_vertices(sides: u32, radius: f64) -> Vec<Point> {
    let sides = sides.max(3);
    (0..sides)
        .map(|i| {
            let angle = i as f64 * TAU / sides as f64;
            Point::new(radius * angle.sin(), -radius * angle.cos())
        })
        .collect()
}

/// Vertices of a star centered on the origin, alternating outer and inner radius.
pub fn star_vertices(num_points: u32, inner_radius: f64, outer_radius: f64) -> Vec<Point> {
    let n = num_points.max(2) * 2;
    (0..n)
        .map(|i| {
            let r = if i % 2 == 0 { outer_radius } else { inner_radius };
            let angle = i as f64 * PI / num_points.max(2) as f64;
            Point::new(r * angle.sin(), -r * angle.cos())
        })
        .collect()
}

/// Isosceles triangle with its apex at the top center of a `width`×`height` box.
pub fn triangle_points(width: f64, height: f64) -> Vec<f64> {
    vec![width / 2.0, 0.0, width, height, 0.0, height]
}

/// Diamond touching the midpoints of a `width`×`height` box.
pub fn diamond_points(width: f64, height: f64) -> Vec<f64> {
    vec![
        width / 2.0,
        0.0,
        width,
        height / 2.0,
        width / 2.0,
        height,
        0.0,
        height / 2.0,
    ]
}

/// Heart outline sampled from the classic parametric curve and fitted into a
/// `size`×`size` box.
pub fn heart_points(size: f64, samples: usize) -> Vec<f64> {
    let samples = samples.max(8);
    let raw: Vec<Point> = (0..samples)
        .map(|i| {
            let t = i as f64 * TAU / samples as f64;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
            Point::new(x, -y)
        })
        .collect();

    let bounds = points_bounds(&flatten_points(&raw));
    let scale = size / bounds.width().max(bounds.height()).max(f64::EPSILON);
    let fitted: Vec<Point> = raw
        .iter()
        .map(|p| Point::new((p.x - bounds.x0) * scale, (p.y - bounds.y0) * scale))
        .collect();
    flatten_points(&fitted)
}

/// Plus-shaped cross in a `size`×`size` box with arms of the given thickness.
pub fn cross_points(size: f64, thickness: f64) -> Vec<f64> {
    let a = (size - thickness) / 2.0;
    let b = a + thickness;
    vec![
        a, 0.0, b, 0.0, b, a, size, a, size, b, b, b, b, size, a, size, a, b, 0.0, b, 0.0, a, a,
        a,
    ]
}

/// Arrow head triangle at the end of the last segment: `[tip, left, right]`.
///
/// Returns `None` when fewer than two points exist or the last segment is degenerate.
pub fn arrow_head(flat: &[f64], length: f64, width: f64) -> Option<[Point; 3]> {
    let pts = pair_points(flat);
    if pts.len() < 2 {
        return None;
    }
    let tip = pts[pts.len() - 1];
    let prev = pts[pts.len() - 2];
    let dir = tip - prev;
    let len = dir.hypot();
    if len < f64::EPSILON {
        return None;
    }
    let unit = dir / len;
    let normal = Vec2::new(-unit.y, unit.x);
    let base = tip - unit * length;
    Some([
        tip,
        base + normal * (width / 2.0),
        base - normal * (width / 2.0),
    ])
}
