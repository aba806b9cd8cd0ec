//! Ellipse decomposition into four quarter arcs.

use crate::path_element::PathElement;
use crate::point::Point;

/// Axis-aligned ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub radii: Point,
    pub center: Point,
}

impl Ellipse {
    pub fn new(radii: Point, center: Point) -> Self {
        Self { radii, center }
    }

    /// Move to the rightmost point, then four quarter arcs back to it and a
    /// close. Empty when either radius is zero.
    pub fn decompose(&self) -> Vec<PathElement> {
        let rx = self.radii.x.abs();
        let ry = self.radii.y.abs();
        if rx == 0.0 || ry == 0.0 {
            return Vec::new();
        }
        let (cx, cy) = (self.center.x, self.center.y);
        let quarter = |end: Point| PathElement::Arc {
            radii: Point::new(rx, ry),
            rotation: 0.0,
            large: false,
            sweep: true,
            end,
        };
        vec![
            PathElement::Move(Point::new(cx + rx, cy)),
            quarter(Point::new(cx, cy + ry)),
            quarter(Point::new(cx - rx, cy)),
            quarter(Point::new(cx, cy - ry)),
            quarter(Point::new(cx + rx, cy)),
            PathElement::Close,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose() {
        let e = Ellipse::new(Point::new(-2.0, 3.0), Point::new(10.0, 10.0));
        let items = e.decompose();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0], PathElement::Move(Point::new(12.0, 10.0)));
        assert_eq!(items[5], PathElement::Close);
        assert!(Ellipse::new(Point::new(0.0, 3.0), Point::origin()).decompose().is_empty());
    }
}
