//! Affine transformation matrix.
//!
//! 2D affine transformations in PDF matrix order: rotation, scaling,
//! translation, shearing and skewing, composed left to right.

use crate::basics::{deg2rad, is_equal_eps, number_to_str};
use crate::error::{Error, Result};
use crate::path_element::PathElement;

/// Epsilon for affine matrix comparisons.
pub const AFFINE_EPSILON: f64 = 1e-14;

/// 2D affine transformation matrix.
///
/// Stores six components `(a, b, c, d, e, f)` representing the matrix:
///
/// ```text
///   | a  b  0 |
///   | c  d  0 |
///   | e  f  1 |
/// ```
///
/// Row vectors are transformed as `[x' y' 1] = [x y 1] * M`, i.e.
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`. This is the operand order of
/// the PDF `cm` operator.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Matrix from six components.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Identity matrix.
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Construct from a `[a, b, c, d, e, f]` array.
    pub fn from_array(m: &[f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    // ====================================================================
    // Named constructors
    // ====================================================================

    /// Translation matrix.
    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Non-uniform scaling matrix.
    pub fn scaling(x: f64, y: f64) -> Self {
        Self::new(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    /// Uniform scaling matrix.
    pub fn scaling_uniform(s: f64) -> Self {
        Self::scaling(s, s)
    }

    /// Rotation by `theta` radians. Positive angles turn clockwise on the page.
    pub fn rotation(theta: f64) -> Self {
        let (sa, ca) = theta.sin_cos();
        Self::new(ca, sa, -sa, ca, 0.0, 0.0)
    }

    /// Rotation by `theta_d` degrees.
    pub fn rotation_d(theta_d: f64) -> Self {
        Self::rotation(deg2rad(theta_d))
    }

    /// Shearing matrix: `x' = x + x_shear*y`, `y' = y + y_shear*x`.
    pub fn shearing(x: f64, y: f64) -> Self {
        Self::new(1.0, y, x, 1.0, 0.0, 0.0)
    }

    /// Skewing matrix from angles in radians.
    pub fn skewing(ax: f64, ay: f64) -> Self {
        Self::new(1.0, ay.tan(), ax.tan(), 1.0, 0.0, 0.0)
    }

    /// Skewing matrix from angles in degrees.
    ///
    /// Fails for angles within `1e-12` of `90 + k*180` degrees, where the
    /// shear would be infinite.
    pub fn skewing_d(ax_d: f64, ay_d: f64) -> Result<Self> {
        let ax = deg2rad(ax_d);
        let ay = deg2rad(ay_d);
        const EPS: f64 = 1e-12;
        if ax.cos().abs() < EPS {
            return Err(Error::InvalidAngle(ax_d));
        }
        if ay.cos().abs() < EPS {
            return Err(Error::InvalidAngle(ay_d));
        }
        Ok(Self::skewing(ax, ay))
    }

    // ====================================================================
    // Chaining (each post-multiplies and returns a new matrix)
    // ====================================================================

    /// `self` followed by a translation.
    pub fn translate(self, x: f64, y: f64) -> Self {
        self * Self::translation(x, y)
    }

    /// `self` followed by a scaling.
    pub fn scale(self, x: f64, y: f64) -> Self {
        self * Self::scaling(x, y)
    }

    /// `self` followed by a uniform scaling.
    pub fn scale_uniform(self, s: f64) -> Self {
        self * Self::scaling_uniform(s)
    }

    /// `self` followed by a rotation in radians.
    pub fn rotate(self, theta: f64) -> Self {
        self * Self::rotation(theta)
    }

    /// `self` followed by a rotation in degrees.
    pub fn rotate_d(self, theta_d: f64) -> Self {
        self * Self::rotation_d(theta_d)
    }

    /// `self` followed by a shearing.
    pub fn shear(self, x: f64, y: f64) -> Self {
        self * Self::shearing(x, y)
    }

    /// `self` followed by a skew in radians.
    pub fn skew(self, ax: f64, ay: f64) -> Self {
        self * Self::skewing(ax, ay)
    }

    /// `self` followed by a skew in degrees.
    pub fn skew_d(self, ax_d: f64, ay_d: f64) -> Result<Self> {
        Ok(self * Self::skewing_d(ax_d, ay_d)?)
    }

    /// Apply `self` as if `(x, y)` were the origin.
    pub fn about(self, x: f64, y: f64) -> Self {
        Self::translation(-x, -y) * self * Self::translation(x, y)
    }

    /// Post-multiply: the result applies `self` first, then `m`.
    pub fn multiply(&self, m: &Transform) -> Transform {
        Transform::new(
            self.a * m.a + self.b * m.c,
            self.a * m.b + self.b * m.d,
            self.c * m.a + self.d * m.c,
            self.c * m.b + self.d * m.d,
            self.e * m.a + self.f * m.c + m.e,
            self.e * m.b + self.f * m.d + m.f,
        )
    }

    /// The inverse matrix. Fails when the determinant is exactly zero.
    pub fn inverse(&self) -> Result<Transform> {
        let det = self.determinant();
        if det == 0.0 {
            return Err(Error::SingularTransform);
        }
        Ok(Transform::new(
            self.d / det,
            -self.b / det,
            -self.c / det,
            self.a / det,
            (self.c * self.f - self.d * self.e) / det,
            (self.b * self.e - self.a * self.f) / det,
        ))
    }

    // ====================================================================
    // Auxiliary
    // ====================================================================

    /// Determinant of the 2x2 portion.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Euclidean norms `(hypot(a, c), hypot(b, d))`.
    ///
    /// These bound how far the matrix can stretch geometry along the device
    /// X and Y axes, which is what stroke inflation of a bounding box needs.
    pub fn row_norms(&self) -> (f64, f64) {
        (self.a.hypot(self.c), self.b.hypot(self.d))
    }

    /// Check if this is an identity matrix.
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.is_equal(&Transform::identity(), epsilon)
    }

    /// Check if two matrices are equal within epsilon.
    pub fn is_equal(&self, m: &Transform, epsilon: f64) -> bool {
        is_equal_eps(self.a, m.a, epsilon)
            && is_equal_eps(self.b, m.b, epsilon)
            && is_equal_eps(self.c, m.c, epsilon)
            && is_equal_eps(self.d, m.d, epsilon)
            && is_equal_eps(self.e, m.e, epsilon)
            && is_equal_eps(self.f, m.f, epsilon)
    }

    /// The six components in `[a, b, c, d, e, f]` order.
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Render as a `cm` operator. `last_item` passes through unchanged.
    pub fn render(&self, last_item: PathElement) -> (String, PathElement) {
        let text = format!(
            "{} {} {} {} {} {} cm",
            number_to_str(self.a),
            number_to_str(self.b),
            number_to_str(self.c),
            number_to_str(self.d),
            number_to_str(self.e),
            number_to_str(self.f),
        );
        (text, last_item)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other, AFFINE_EPSILON)
    }
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transform(a={}, b={}, c={}, d={}, e={}, f={})",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

/// Composition: `t1 * t2` applies `t1` first, then `t2`.
impl std::ops::Mul for Transform {
    type Output = Transform;
    fn mul(self, rhs: Transform) -> Transform {
        self.multiply(&rhs)
    }
}

impl std::ops::MulAssign for Transform {
    fn mul_assign(&mut self, rhs: Transform) {
        *self = self.multiply(&rhs);
    }
}

/// Scale every component.
impl std::ops::Mul<f64> for Transform {
    type Output = Transform;
    fn mul(self, rhs: f64) -> Transform {
        Transform::new(
            self.a * rhs,
            self.b * rhs,
            self.c * rhs,
            self.d * rhs,
            self.e * rhs,
            self.f * rhs,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
