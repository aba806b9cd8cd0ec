//! Rounded rectangle decomposition.
//!
//! A rounded rectangle is drawn as four edges joined by quarter-ellipse
//! corner arcs. Degenerate sizes and radii collapse to simpler shapes.

use crate::path_element::PathElement;
use crate::point::Point;

/// Rectangle with elliptical corners, starting at `org` and spanning `size`
/// (either component may be negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub org: Point,
    pub size: Point,
    pub corner_radii: Point,
}

impl RoundedRect {
    pub fn new(org: Point, size: Point, corner_radii: Point) -> Self {
        Self {
            org,
            size,
            corner_radii,
        }
    }

    /// The equivalent sequence of plain path elements.
    ///
    /// - zero size: nothing;
    /// - zero width or height: a closed line;
    /// - a zero corner radius: a plain rectangle;
    /// - otherwise edges and corner arcs, with radii clamped to the size and
    ///   signed to follow its direction.
    pub fn decompose(&self) -> Vec<PathElement> {
        let (x, y) = (self.org.x, self.org.y);
        let (w, h) = (self.size.x, self.size.y);

        if w == 0.0 && h == 0.0 {
            return Vec::new();
        }
        if w == 0.0 || h == 0.0 {
            return vec![
                PathElement::Move(self.org),
                PathElement::Line(self.org + self.size),
                PathElement::Close,
            ];
        }
        if self.corner_radii.x == 0.0 || self.corner_radii.y == 0.0 {
            return vec![PathElement::Rectangle {
                org: self.org,
                size: self.size,
            }];
        }

        let sign_w = if w >= 0.0 { 1.0 } else { -1.0 };
        let sign_h = if h >= 0.0 { 1.0 } else { -1.0 };
        let mut rx = self.corner_radii.x;
        let mut ry = self.corner_radii.y;
        if rx.abs() > w.abs() {
            rx = w;
        }
        if ry.abs() > h.abs() {
            ry = h;
        }
        let rx = sign_w * rx.abs();
        let ry = sign_h * ry.abs();
        let corner = |end: Point| PathElement::Arc {
            radii: Point::new(rx, ry),
            rotation: 0.0,
            large: false,
            sweep: true,
            end,
        };

        vec![
            PathElement::Move(Point::new(x + rx, y)),
            PathElement::Line(Point::new(x + w - rx, y)),
            corner(Point::new(x + w, y + ry)),
            PathElement::Line(Point::new(x + w, y + h - ry)),
            corner(Point::new(x + w - rx, y + h)),
            PathElement::Line(Point::new(x + rx, y + h)),
            corner(Point::new(x, y + h - ry)),
            PathElement::Line(Point::new(x, y + ry)),
            corner(Point::new(x + rx, y)),
            PathElement::Close,
        ]
    }
}

// ============================================================================
// Tests
// ============================================================================
