//! Axis-aligned bounding boxes.
//!
//! Boxes are merged bottom-up while walking a drawing. The empty box is
//! the identity of [`BoundingBox::merge`], so walks start from it and fold
//! every element's box in.

use std::hash::{Hash, Hasher};

use crate::point::{round_to, Point};
use crate::style::{GraphicsStyle, PathPaintRule, StyleValue};
use crate::trans_affine::Transform;

/// Tolerance used by [`BoundingBox`] equality.
pub const BBOX_TOLERANCE: f64 = 1e-6;

/// Axis-aligned box `(x0, y0)`-`(x1, y1)`.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The empty box. Merging it with any box yields that box.
    pub const fn empty() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY)
    }

    /// A box is valid when it encloses at least one point.
    pub fn is_valid(&self) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1
    }

    /// Smallest box containing all `points`. Empty when there are none.
    pub fn from_points(points: &[Point]) -> Self {
        points.iter().fold(Self::empty(), |bbox, p| {
            Self::new(
                bbox.x0.min(p.x),
                bbox.y0.min(p.y),
                bbox.x1.max(p.x),
                bbox.y1.max(p.y),
            )
        })
    }

    /// Union of two boxes.
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        if !self.is_valid() {
            return *other;
        }
        if !other.is_valid() {
            return *self;
        }
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Map all four corners through `tf` and re-derive the box.
    ///
    /// Rotated boxes grow, since the result must contain the rotated corners.
    pub fn transformed(&self, tf: &Transform) -> BoundingBox {
        if !self.is_valid() {
            return *self;
        }
        let corners = [
            Point::new(self.x0, self.y0),
            Point::new(self.x1, self.y0),
            Point::new(self.x0, self.y1),
            Point::new(self.x1, self.y1),
        ];
        let mapped = corners.map(|p| p.transformed(tf));
        Self::from_points(&mapped)
    }

    /// Grow by `dx` horizontally and `dy` vertically on each side.
    pub fn expanded(&self, dx: f64, dy: f64) -> BoundingBox {
        Self::new(self.x0 - dx, self.y0 - dy, self.x1 + dx, self.y1 + dy)
    }

    /// Grow by half the stroke width, scaled per axis by `row_norms`.
    ///
    /// Only applies when the resolved paint rule strokes and the stroke is
    /// not fully transparent. An unset or inherited width counts as 1, a
    /// zero width (hairline) does not grow the box.
    pub fn expanded_to_stroke(&self, style: &GraphicsStyle, row_norms: (f64, f64)) -> BoundingBox {
        let strokes = matches!(
            style.resolve_paint_rule(),
            PathPaintRule::Stroke | PathPaintRule::StrokeFillNonzero | PathPaintRule::StrokeFillEvenodd
        );
        if !strokes {
            return *self;
        }
        if let StyleValue::Value(opacity) = style.stroke_opacity() {
            if opacity <= 0.0 {
                return *self;
            }
        }
        let width = match style.stroke_width() {
            StyleValue::Value(w) => w,
            StyleValue::Inherit | StyleValue::Unset => 1.0,
        };
        if width == 0.0 {
            return *self;
        }
        let r = 0.5 * width;
        let (nx, ny) = row_norms;
        self.expanded(r * nx, r * ny)
    }

    pub fn to_tuple(&self) -> (f64, f64, f64, f64) {
        (self.x0, self.y0, self.x1, self.y1)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundingBox({}, {}, {}, {})", self.x0, self.y0, self.x1, self.y1)
    }
}

/// Equal within [`BBOX_TOLERANCE`] on every edge. All empty boxes are equal.
impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_valid(), other.is_valid()) {
            (false, false) => true,
            (true, true) => {
                (self.x0 - other.x0).abs() < BBOX_TOLERANCE
                    && (self.y0 - other.y0).abs() < BBOX_TOLERANCE
                    && (self.x1 - other.x1).abs() < BBOX_TOLERANCE
                    && (self.y1 - other.y1).abs() < BBOX_TOLERANCE
            }
            _ => false,
        }
    }
}

impl Eq for BoundingBox {}

impl Hash for BoundingBox {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if !self.is_valid() {
            state.write_u8(0);
            return;
        }
        for v in [self.x0, self.y0, self.x1, self.y1] {
            // +0.0 and -0.0 must hash alike
            (round_to(v, 6) + 0.0).to_bits().hash(state);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DeviceGray;
    use std::collections::HashSet;

    #[test]
    fn test_empty() {
        let e = BoundingBox::empty();
        assert!(!e.is_valid());
        assert_eq!(e, BoundingBox::empty());
        assert_eq!(BoundingBox::from_points(&[]), e);
    }

    #[test]
    fn test_merge_identity() {
        let a = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a.merge(&BoundingBox::empty()), a);
        assert_eq!(BoundingBox::empty().merge(&a), a);
    }

    #[test]
    fn test_merge_commutes() {
        let a = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let b = BoundingBox::new(-1.0, 3.0, 2.0, 10.0);
        assert_eq!(a.merge(&b), b.merge(&a));
        assert_eq!(a.merge(&b), BoundingBox::new(-1.0, 2.0, 3.0, 10.0));
    }

    #[test]
    fn test_from_points() {
        let b = BoundingBox::from_points(&[
            Point::new(3.0, -1.0),
            Point::new(-2.0, 5.0),
            Point::new(0.0, 0.0),
        ]);
        assert_eq!(b, BoundingBox::new(-2.0, -1.0, 3.0, 5.0));
        assert_eq!(b.width(), 5.0);
        assert_eq!(b.height(), 6.0);
    }

    #[test]
    fn test_transformed_rotation_grows() {
        let b = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let r = b.transformed(&Transform::rotation_d(45.0));
        let half_diag = 10.0 * std::f64::consts::SQRT_2;
        assert!((r.width() - half_diag).abs() < 1e-9);
        assert!((r.height() - half_diag).abs() < 1e-9);
    }

    #[test]
    fn test_transformed_empty_stays_empty() {
        let r = BoundingBox::empty().transformed(&Transform::scaling(-1.0, 2.0));
        assert!(!r.is_valid());
    }

    #[test]
    fn test_equality_tolerance() {
        let a = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let b = BoundingBox::new(1.0 + 1e-8, 2.0, 3.0, 4.0 - 1e-8);
        assert_eq!(a, b);
        assert_ne!(a, BoundingBox::new(1.0001, 2.0, 3.0, 4.0));
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&BoundingBox::new(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn test_expanded_to_stroke_width() {
        let b = BoundingBox::new(10.0, 20.0, 90.0, 80.0);
        let mut style = GraphicsStyle::default();
        style.set_paint_rule(PathPaintRule::Stroke);
        style.set_stroke_width(StyleValue::Value(4.0));
        let e = b.expanded_to_stroke(&style, (1.0, 1.0));
        assert_eq!(e, BoundingBox::new(8.0, 18.0, 92.0, 82.0));
        let e = b.expanded_to_stroke(&style, (2.0, 0.5));
        assert_eq!(e, BoundingBox::new(6.0, 19.0, 94.0, 81.0));
    }

    #[test]
    fn test_expanded_to_stroke_skips_fill_only() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let mut style = GraphicsStyle::default();
        style.set_paint_rule(PathPaintRule::FillNonzero);
        style.set_stroke_width(StyleValue::Value(4.0));
        assert_eq!(b.expanded_to_stroke(&style, (1.0, 1.0)), b);
    }

    #[test]
    fn test_expanded_to_stroke_transparent_or_hairline() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let mut style = GraphicsStyle::default();
        style.set_stroke_color(StyleValue::Value(DeviceGray::new(0.0).unwrap().into()));
        style.set_stroke_width(StyleValue::Value(6.0));
        style.set_stroke_opacity(StyleValue::Value(0.0)).unwrap();
        assert_eq!(b.expanded_to_stroke(&style, (1.0, 1.0)), b);

        let mut style = GraphicsStyle::default();
        style.set_stroke_width(StyleValue::Value(0.0));
        assert_eq!(b.expanded_to_stroke(&style, (1.0, 1.0)), b);
    }

    #[test]
    fn test_expanded_to_stroke_default_width() {
        // An all-inherit style resolves to stroke+fill with a unit width.
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let e = b.expanded_to_stroke(&GraphicsStyle::default(), (1.0, 1.0));
        assert_eq!(e, BoundingBox::new(-0.5, -0.5, 1.5, 1.5));
    }
}
