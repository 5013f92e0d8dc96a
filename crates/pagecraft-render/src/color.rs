//! CSS color strings as stored on objects, normalized through peniko.

use peniko::Color;
use peniko::color::{Srgb, parse_color};

/// Parse a CSS color (`#rgb`, `#rrggbb`, `rgb()`, named colors...).
///
/// Empty strings mean "no paint" and return `None`, as do unparseable values.
pub fn parse_css_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    match parse_color(s) {
        Ok(color) => Some(color.to_alpha_color::<Srgb>()),
        Err(_) => {
            log::debug!("Ignoring unparseable color {:?}", s);
            None
        }
    }
}

/// Straight-alpha RGBA8 components.
pub fn to_rgba8(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// `(#rrggbb, alpha)` for use in SVG paint attributes.
pub(crate) fn svg_paint(s: &str) -> Option<(String, f64)> {
    let color = parse_css_color(s)?;
    let [r, g, b, a] = to_rgba8(color);
    if a == 0 {
        return None;
    }
    Some((format!("#{:02x}{:02x}{:02x}", r, g, b), a as f64 / 255.0))
}
