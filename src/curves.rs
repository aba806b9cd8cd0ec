//! Bezier curve geometry.
//!
//! Exact bounding boxes for cubic Bezier curves, and the degree elevation
//! that lets quadratic curves reuse them:
//!
//! - the derivative of a cubic is a quadratic, so its extrema per axis are
//!   the roots of that quadratic inside `(0, 1)`;
//! - evaluating the curve at those roots and at both ends gives the box.

use crate::bounding_rect::BoundingBox;
use crate::point::Point;

// ============================================================================
// Constants
// ============================================================================

/// Coefficients smaller than this are treated as zero when solving for
/// extrema.
const CURVE_COEFFICIENT_EPSILON: f64 = 1e-12;

// ============================================================================
// 1D helpers
// ============================================================================

/// Value of a 1D cubic Bezier at parameter `t`.
#[inline]
pub fn eval_cubic_1d(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * (u * u) * t * p1 + 3.0 * u * (t * t) * p2 + t * t * t * p3
}

/// Parameters in `(0, 1)` where the 1D cubic's derivative vanishes.
pub fn cubic_critical_ts_1d(p0: f64, p1: f64, p2: f64, p3: f64) -> Vec<f64> {
    let a = -3.0 * p0 + 9.0 * p1 - 9.0 * p2 + 3.0 * p3;
    let b = 6.0 * p0 - 12.0 * p1 + 6.0 * p2;
    let c = -3.0 * p0 + 3.0 * p1;

    let in_range = |t: &f64| *t > 0.0 && *t < 1.0;
    if a.abs() < CURVE_COEFFICIENT_EPSILON {
        // Derivative is linear.
        if b.abs() > CURVE_COEFFICIENT_EPSILON {
            return Some(-c / b).into_iter().filter(in_range).collect();
        }
        return Vec::new();
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Vec::new();
    }
    let r = disc.sqrt();
    [(-b + r) / (2.0 * a), (-b - r) / (2.0 * a)]
        .into_iter()
        .filter(in_range)
        .collect()
}

/// Min and max of a 1D cubic over `[0, 1]`.
fn cubic_extent_1d(p0: f64, p1: f64, p2: f64, p3: f64) -> (f64, f64) {
    let mut ts = vec![0.0, 1.0];
    ts.extend(cubic_critical_ts_1d(p0, p1, p2, p3));
    ts.iter()
        .map(|&t| eval_cubic_1d(t, p0, p1, p2, p3))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

// ============================================================================
// CubicBezier
// ============================================================================

/// The three points of a cubic Bezier segment following a current point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl CubicBezier {
    pub fn new(c1: Point, c2: Point, end: Point) -> Self {
        Self { c1, c2, end }
    }

    /// Point at parameter `t` for a curve starting at `start`.
    pub fn eval(&self, start: Point, t: f64) -> Point {
        Point::new(
            eval_cubic_1d(t, start.x, self.c1.x, self.c2.x, self.end.x),
            eval_cubic_1d(t, start.y, self.c1.y, self.c2.y, self.end.y),
        )
    }

    /// Tight bounding box of the curve starting at `start`.
    pub fn bounding_box(&self, start: Point) -> BoundingBox {
        let (x0, x1) = cubic_extent_1d(start.x, self.c1.x, self.c2.x, self.end.x);
        let (y0, y1) = cubic_extent_1d(start.y, self.c1.y, self.c2.y, self.end.y);
        BoundingBox::new(x0, y0, x1, y1)
    }

    /// Exact cubic form of the quadratic `start`, `ctrl`, `end`.
    pub fn from_quadratic(start: Point, ctrl: Point, end: Point) -> Self {
        let c1 = Point::new(
            start.x + 2.0 * (ctrl.x - start.x) / 3.0,
            start.y + 2.0 * (ctrl.y - start.y) / 3.0,
        );
        let c2 = Point::new(
            end.x + 2.0 * (ctrl.x - end.x) / 3.0,
            end.y + 2.0 * (ctrl.y - end.y) / 3.0,
        );
        Self::new(c1, c2, end)
    }
}

// ============================================================================
// Tests
// ============================================================================
