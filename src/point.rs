//! 2D point / vector algebra.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::basics::number_to_str;
use crate::trans_affine::Transform;

/// An (x, y) pair in user space, doubling as a vector from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin.
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Render as `"x y"` for a content stream.
    pub fn render(&self) -> String {
        format!("{} {}", number_to_str(self.x), number_to_str(self.y))
    }

    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Distance from the origin.
    pub fn mag(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Signed angle from `self` to `other`, in radians, within `(-pi, pi]`.
    ///
    /// Clockwise travel is positive in the device frame, so the angle from
    /// `(1, 0)` to `(0, 1)` is `+pi/2`. Zero-length vectors give `0`.
    pub fn angle(&self, other: Point) -> f64 {
        let cross = self.x * other.y - self.y * other.x;
        let sign = if cross >= 0.0 { 1.0 } else { -1.0 };
        let mags = self.mag() * other.mag();
        if mags == 0.0 {
            return 0.0;
        }
        // acos is undefined just past +/-1, which rounding error can reach
        let cos = round_to(self.dot(other) / mags, 8).clamp(-1.0, 1.0);
        sign * cos.acos()
    }

    /// Apply an affine transform.
    pub fn transformed(&self, tf: &Transform) -> Point {
        Point::new(
            tf.a * self.x + tf.c * self.y + tf.e,
            tf.b * self.x + tf.d * self.y + tf.f,
        )
    }
}

/// Round half away from zero to `digits` decimal places.
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Point(x={}, y={})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point {
        rhs * self
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// `point * transform` maps the point through the transform.
impl Mul<Transform> for Point {
    type Output = Point;
    fn mul(self, rhs: Transform) -> Point {
        self.transformed(&rhs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::PI;

    const EPS: f64 = 1e-10;

    #[test]
    fn test_arithmetic() {
        let p = Point::new(1.0, 2.0);
        let q = Point::new(3.0, -1.0);
        assert_eq!(p + q, Point::new(4.0, 1.0));
        assert_eq!(p - q, Point::new(-2.0, 3.0));
        assert_eq!(-p, Point::new(-1.0, -2.0));
        assert_eq!(p * 2.0, Point::new(2.0, 4.0));
        assert_eq!(2.0 * p, Point::new(2.0, 4.0));
        assert_eq!(p / 2.0, Point::new(0.5, 1.0));
    }

    #[test]
    fn test_dot_and_mag() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(p.mag(), 5.0);
        assert_eq!(p.dot(Point::new(1.0, 1.0)), 7.0);
    }

    #[test]
    fn test_angle_signs() {
        let x = Point::new(1.0, 0.0);
        assert!((x.angle(Point::new(0.0, 1.0)) - PI / 2.0).abs() < EPS);
        assert!((x.angle(Point::new(0.0, -1.0)) + PI / 2.0).abs() < EPS);
        assert!((Point::new(0.0, -1.0).angle(x) - PI / 2.0).abs() < EPS);
        assert!((x.angle(Point::new(-1.0, 0.0)) - PI).abs() < EPS);
    }

    #[test]
    fn test_angle_zero_vector() {
        assert_eq!(Point::new(1.0, 1.0).angle(Point::origin()), 0.0);
        assert_eq!(Point::origin().angle(Point::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_render() {
        assert_eq!(Point::new(1.0, 2.5).render(), "1 2.5");
        assert_eq!(Point::new(-0.00001, 1.0 / 3.0).render(), "0 0.3333");
    }

    #[test]
    fn test_transform() {
        let p = Point::new(1.0, 1.0) * Transform::translation(1.0, 1.0);
        assert_eq!(p, Point::new(2.0, 2.0));
        let p = Point::new(1.0, 1.0) * Transform::scaling(2.0, 3.0);
        assert_eq!(p, Point::new(2.0, 3.0));
        let p = Point::new(1.0, 1.0) * Transform::shearing(1.0, 0.0);
        assert_eq!(p, Point::new(2.0, 1.0));
    }

    #[test]
    fn test_round_trip_through_inverse() {
        let tf = Transform::rotation_d(33.0)
            .scale(2.0, 0.5)
            .translate(10.0, -4.0)
            .shear(0.25, 0.1);
        let inv = tf.inverse().unwrap();
        for p in [Point::new(1.0, 2.0), Point::new(-7.5, 0.25), Point::origin()] {
            let back = p * tf * inv;
            assert!((back.x - p.x).abs() < 1e-9);
            assert!((back.y - p.y).abs() < 1e-9);
        }
    }
}
