//! Elliptical arc to cubic Bezier conversion.
//!
//! Arcs use the SVG endpoint parameterization: radii, axis rotation, the
//! large-arc and sweep flags, and an end point; the start point is the
//! current point. [`approximate_arc`] recovers the center form and emits
//! one cubic segment per quarter turn (or less) of sweep.

use crate::basics::PI;
use crate::curves::CubicBezier;
use crate::point::{round_to, Point};
use crate::trans_affine::Transform;

/// Unit-circle cubic segments covering `sweep_angle`, each spanning at most
/// a quarter turn.
///
/// Every segment is the standard circular-arc approximation with
/// `kappa = 4/3 * tan(delta / 4)`, rotated to its offset along the sweep.
/// The sign of `sweep_angle` is ignored; callers mirror the result.
pub fn subdivide_sweep(sweep_angle: f64) -> Vec<CubicBezier> {
    let sweep_angle = sweep_angle.abs();
    let quarter_turn = PI / 2.0;
    let chunks = (sweep_angle / quarter_turn).ceil() as usize;
    if chunks == 0 {
        return Vec::new();
    }
    let sweep_segment = sweep_angle / chunks as f64;
    let (sin_t, cos_t) = sweep_segment.sin_cos();
    let kappa = 4.0 / 3.0 * (sweep_segment / 4.0).tan();

    let ctrl1 = Point::new(1.0, kappa);
    let ctrl2 = Point::new(cos_t + kappa * sin_t, sin_t - kappa * cos_t);
    let end = Point::new(cos_t, sin_t);

    (0..chunks)
        .map(|i| {
            let tf = Transform::rotation(sweep_segment * i as f64);
            CubicBezier::new(ctrl1 * tf, ctrl2 * tf, end * tf)
        })
        .collect()
}

/// Center parameterization of an endpoint arc.
///
/// Returns the transform mapping the unit circle onto the arc's ellipse,
/// with `(1, 0)` landing on `start`, and the signed sweep angle. Radii too
/// small to reach `end` are scaled up uniformly until they just do, which
/// yields a half-ellipse. Coincident end points or a zero radius have no
/// frame.
pub fn arc_frame(
    start: Point,
    radii: Point,
    rotation: f64,
    large: bool,
    sweep: bool,
    end: Point,
) -> Option<(Transform, f64)> {
    if start == end || radii.x == 0.0 || radii.y == 0.0 {
        return None;
    }

    let reverse = Transform::rotation(-rotation);
    let forward = Transform::rotation(rotation);
    let prime = ((start - end) * 0.5) * reverse;

    let mut radii = radii;
    let lambda = (prime.x / radii.x).powi(2) + (prime.y / radii.y).powi(2);
    if lambda > 1.0 {
        let scale = lambda.sqrt();
        log::debug!("arc radii ({}, {}) cannot span the chord, scaling by {scale}", radii.x, radii.y);
        radii = Point::new(scale * radii.x, scale * radii.y);
    }

    let sign = if large != sweep { 1.0 } else { -1.0 };
    let rxry2 = (radii.x * radii.y).powi(2);
    let rxpy2 = (radii.x * prime.y).powi(2);
    let rypx2 = (radii.y * prime.x).powi(2);
    // Rounding absorbs the noise left after scaling radii to fit exactly.
    let sq = (round_to(rxry2 - rxpy2 - rypx2, 8) / (rxpy2 + rypx2)).max(0.0);
    let center_prime = sign
        * sq.sqrt()
        * Point::new(radii.x * prime.y / radii.y, -radii.y * prime.x / radii.x);
    let center = center_prime * forward + (start + end) * 0.5;

    let arc_start = Point::new(
        (prime.x - center_prime.x) / radii.x,
        (prime.y - center_prime.y) / radii.y,
    );
    let arc_end = Point::new(
        (-prime.x - center_prime.x) / radii.x,
        (-prime.y - center_prime.y) / radii.y,
    );

    let theta = Point::new(1.0, 0.0).angle(arc_start);
    let mut delta_theta = arc_start.angle(arc_end);
    if !sweep && delta_theta > 0.0 {
        delta_theta -= 2.0 * PI;
    } else if sweep && delta_theta < 0.0 {
        delta_theta += 2.0 * PI;
    }
    let sweep_sign = if delta_theta >= 0.0 { 1.0 } else { -1.0 };

    let tf = Transform::scaling(1.0, sweep_sign)
        .rotate(theta)
        .scale(radii.x, radii.y)
        .rotate(rotation)
        .translate(center.x, center.y);
    Some((tf, delta_theta))
}

/// Approximate the arc from `start` to `end` by cubic segments.
///
/// Degenerate arcs (see [`arc_frame`]) produce no segments.
pub fn approximate_arc(
    start: Point,
    radii: Point,
    rotation: f64,
    large: bool,
    sweep: bool,
    end: Point,
) -> Vec<CubicBezier> {
    let Some((tf, delta_theta)) = arc_frame(start, radii, rotation, large, sweep, end) else {
        return Vec::new();
    };
    subdivide_sweep(delta_theta)
        .into_iter()
        .map(|c| CubicBezier::new(c.c1 * tf, c.c2 * tf, c.end * tf))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding_rect::BoundingBox;

    const EPS: f64 = 1e-6;

    fn close(a: Point, b: Point) -> bool {
        close_within(a, b, EPS)
    }

    fn close_within(a: Point, b: Point, tol: f64) -> bool {
        (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol
    }

    #[test]
    fn test_subdivide_sweep_counts() {
        assert!(subdivide_sweep(0.0).is_empty());
        assert_eq!(subdivide_sweep(PI / 2.0).len(), 1);
        assert_eq!(subdivide_sweep(PI / 2.0 + 0.01).len(), 2);
        assert_eq!(subdivide_sweep(-PI).len(), 2);
        assert_eq!(subdivide_sweep(2.0 * PI).len(), 4);
    }

    #[test]
    fn test_subdivide_sweep_stays_on_circle() {
        let segs = subdivide_sweep(3.0);
        let last = segs.last().unwrap().end;
        assert!(close(last, Point::new(3.0f64.cos(), 3.0f64.sin())));
        for s in &segs {
            assert!((s.end.mag() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_quarter_circle_bbox() {
        let curves = approximate_arc(
            Point::new(0.0, 0.0),
            Point::new(50.0, 50.0),
            0.0,
            false,
            true,
            Point::new(50.0, 50.0),
        );
        assert_eq!(curves.len(), 1);
        let bbox = curves[0].bounding_box(Point::new(0.0, 0.0));
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn test_chain_hits_endpoints() {
        let cases = [
            (Point::new(0.0, 0.0), Point::new(30.0, 10.0), 0.3, false, false, Point::new(40.0, 25.0)),
            (Point::new(0.0, 0.0), Point::new(30.0, 10.0), 0.3, true, false, Point::new(40.0, 25.0)),
            (Point::new(10.0, -5.0), Point::new(20.0, 20.0), -1.0, true, true, Point::new(-15.0, 5.0)),
            (Point::new(1.0, 1.0), Point::new(60.0, 15.0), 2.0, false, true, Point::new(3.0, 8.0)),
        ];
        for (start, radii, rotation, large, sweep, end) in cases {
            let (tf, _) = arc_frame(start, radii, rotation, large, sweep, end).unwrap();
            // angles are recovered through an 8-digit cosine
            assert!(close_within(Point::new(1.0, 0.0) * tf, start, 1e-3));
            let curves = approximate_arc(start, radii, rotation, large, sweep, end);
            assert!(!curves.is_empty());
            assert!(curves.len() <= 4);
            assert!(close_within(curves.last().unwrap().end, end, 1e-3));
        }
    }

    #[test]
    fn test_small_radii_scale_to_half_ellipse() {
        let curves = approximate_arc(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            0.0,
            false,
            true,
            Point::new(10.0, 0.0),
        );
        // a half turn needs exactly two quarter-turn segments
        assert_eq!(curves.len(), 2);
        assert!(close(curves[0].end, Point::new(5.0, -5.0)) || close(curves[0].end, Point::new(5.0, 5.0)));
        assert!(close(curves[1].end, Point::new(10.0, 0.0)));
    }

    #[test]
    fn test_degenerate_arcs() {
        let p = Point::new(3.0, 4.0);
        assert!(arc_frame(p, Point::new(5.0, 5.0), 0.0, false, true, p).is_none());
        assert!(approximate_arc(p, Point::new(5.0, 5.0), 0.0, false, true, p).is_empty());
        assert!(approximate_arc(p, Point::new(0.0, 5.0), 0.0, false, true, Point::origin()).is_empty());
    }
}
