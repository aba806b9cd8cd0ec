//! Path elements.
//!
//! Each element is measured and rendered relative to the element before it.
//! Rendering "resolves" an element into an absolute one (a relative line
//! becomes a [`PathElement::Line`], an arc becomes its final cubic segment)
//! so the next element can find the current point. Closing a subpath needs
//! the subpath's first point as well, which is threaded through as
//! `initial_point`.

use std::fmt;

use crate::bezier_arc::approximate_arc;
use crate::bounding_rect::BoundingBox;
use crate::curves::CubicBezier;
use crate::ellipse::Ellipse;
use crate::point::Point;
use crate::rounded_rect::RoundedRect;
use crate::style::GraphicsStyle;

/// One segment or shape in a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathElement {
    /// Start a new subpath at `pt`.
    Move(Point),
    RelativeMove(Point),
    Line(Point),
    RelativeLine(Point),
    /// Line to the given abscissa, keeping the current ordinate.
    HorizontalLine(f64),
    RelativeHorizontalLine(f64),
    /// Line to the given ordinate, keeping the current abscissa.
    VerticalLine(f64),
    RelativeVerticalLine(f64),
    BezierCurve {
        c1: Point,
        c2: Point,
        end: Point,
    },
    /// Control points and end are offsets from the current point.
    RelativeBezierCurve {
        c1: Point,
        c2: Point,
        end: Point,
    },
    QuadraticBezierCurve {
        ctrl: Point,
        end: Point,
    },
    RelativeQuadraticBezierCurve {
        ctrl: Point,
        end: Point,
    },
    /// Elliptical arc in endpoint form. `rotation` is in radians.
    Arc {
        radii: Point,
        rotation: f64,
        large: bool,
        sweep: bool,
        end: Point,
    },
    RelativeArc {
        radii: Point,
        rotation: f64,
        large: bool,
        sweep: bool,
        end: Point,
    },
    /// A closed rectangle; a subpath of its own.
    Rectangle {
        org: Point,
        size: Point,
    },
    RoundedRectangle {
        org: Point,
        size: Point,
        corner_radii: Point,
    },
    Ellipse {
        radii: Point,
        center: Point,
    },
    /// Close inserted by the path builder; only emitted when auto-close is
    /// enabled.
    ImplicitClose,
    Close,
}

impl PathElement {
    /// End point of an absolute element. Relative elements and shapes have
    /// none until resolved.
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            PathElement::Move(pt) | PathElement::Line(pt) => Some(pt),
            PathElement::BezierCurve { end, .. }
            | PathElement::QuadraticBezierCurve { end, .. }
            | PathElement::Arc { end, .. } => Some(end),
            _ => None,
        }
    }

    /// Bounding box of the element drawn from `start`, and the point the
    /// next element starts from.
    pub fn bounding_box(&self, start: Point) -> (BoundingBox, Point) {
        match *self {
            PathElement::Move(pt) => (BoundingBox::empty(), pt),
            PathElement::RelativeMove(pt) => (BoundingBox::empty(), start + pt),
            PathElement::Line(pt) => (BoundingBox::from_points(&[start, pt]), pt),
            PathElement::RelativeLine(pt) => {
                let end = start + pt;
                (BoundingBox::from_points(&[start, end]), end)
            }
            PathElement::HorizontalLine(x) => {
                let end = Point::new(x, start.y);
                (BoundingBox::from_points(&[start, end]), end)
            }
            PathElement::RelativeHorizontalLine(dx) => {
                let end = Point::new(start.x + dx, start.y);
                (BoundingBox::from_points(&[start, end]), end)
            }
            PathElement::VerticalLine(y) => {
                let end = Point::new(start.x, y);
                (BoundingBox::from_points(&[start, end]), end)
            }
            PathElement::RelativeVerticalLine(dy) => {
                let end = Point::new(start.x, start.y + dy);
                (BoundingBox::from_points(&[start, end]), end)
            }
            PathElement::BezierCurve { c1, c2, end } => {
                (CubicBezier::new(c1, c2, end).bounding_box(start), end)
            }
            PathElement::RelativeBezierCurve { c1, c2, end } => {
                let end = start + end;
                let curve = CubicBezier::new(start + c1, start + c2, end);
                (curve.bounding_box(start), end)
            }
            PathElement::QuadraticBezierCurve { ctrl, end } => {
                (CubicBezier::from_quadratic(start, ctrl, end).bounding_box(start), end)
            }
            PathElement::RelativeQuadraticBezierCurve { ctrl, end } => {
                let end = start + end;
                let curve = CubicBezier::from_quadratic(start, start + ctrl, end);
                (curve.bounding_box(start), end)
            }
            PathElement::Arc {
                radii,
                rotation,
                large,
                sweep,
                end,
            } => (arc_bounding_box(start, radii, rotation, large, sweep, end), end),
            PathElement::RelativeArc {
                radii,
                rotation,
                large,
                sweep,
                end,
            } => {
                let end = start + end;
                (arc_bounding_box(start, radii, rotation, large, sweep, end), end)
            }
            PathElement::Rectangle { org, size } => {
                let far = org + size;
                let bbox = BoundingBox::from_points(&[
                    org,
                    Point::new(far.x, org.y),
                    Point::new(org.x, far.y),
                    far,
                ]);
                (bbox, org)
            }
            PathElement::RoundedRectangle { org, .. } => {
                (replay_bounding_box(&self.decompose(), start), org)
            }
            PathElement::Ellipse { center, .. } => {
                (replay_bounding_box(&self.decompose(), start), center)
            }
            PathElement::ImplicitClose | PathElement::Close => (BoundingBox::empty(), start),
        }
    }

    /// Plain elements equivalent to a compound shape. Other elements are
    /// returned as is.
    pub fn decompose(&self) -> Vec<PathElement> {
        match *self {
            PathElement::RoundedRectangle {
                org,
                size,
                corner_radii,
            } => RoundedRect::new(org, size, corner_radii).decompose(),
            PathElement::Ellipse { radii, center } => Ellipse::new(radii, center).decompose(),
            other => vec![other],
        }
    }

    /// Render as content stream operators.
    ///
    /// Returns the operators, the resolved element for the next element to
    /// continue from, and the updated subpath start.
    pub fn render(
        &self,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
    ) -> (String, PathElement, Point) {
        let last = current_point(last_item);
        match *self {
            PathElement::Move(pt) => (render_move(pt), *self, pt),
            PathElement::RelativeMove(pt) => {
                let pt = last + pt;
                (render_move(pt), PathElement::Move(pt), pt)
            }
            PathElement::Line(pt) => (render_line(pt), *self, initial_point),
            PathElement::RelativeLine(pt) => resolved_line(last + pt, initial_point),
            PathElement::HorizontalLine(x) => resolved_line(Point::new(x, last.y), initial_point),
            PathElement::RelativeHorizontalLine(dx) => {
                resolved_line(Point::new(last.x + dx, last.y), initial_point)
            }
            PathElement::VerticalLine(y) => resolved_line(Point::new(last.x, y), initial_point),
            PathElement::RelativeVerticalLine(dy) => {
                resolved_line(Point::new(last.x, last.y + dy), initial_point)
            }
            PathElement::BezierCurve { c1, c2, end } => {
                (render_curve(&CubicBezier::new(c1, c2, end)), *self, initial_point)
            }
            PathElement::RelativeBezierCurve { c1, c2, end } => {
                let curve = CubicBezier::new(last + c1, last + c2, last + end);
                (render_curve(&curve), curve_element(&curve), initial_point)
            }
            PathElement::QuadraticBezierCurve { ctrl, end } => {
                let cubic = CubicBezier::from_quadratic(last, ctrl, end);
                (render_curve(&cubic), *self, initial_point)
            }
            PathElement::RelativeQuadraticBezierCurve { ctrl, end } => {
                let absolute = PathElement::QuadraticBezierCurve {
                    ctrl: last + ctrl,
                    end: last + end,
                };
                absolute.render(style, last_item, initial_point)
            }
            PathElement::Arc {
                radii,
                rotation,
                large,
                sweep,
                end,
            } => {
                let curves = approximate_arc(last, radii, rotation, large, sweep, end);
                render_arc(&curves, last_item, initial_point)
            }
            PathElement::RelativeArc { .. } => {
                self.absolute_arc(last).render(style, last_item, initial_point)
            }
            PathElement::Rectangle { org, size } => (
                format!("{} {} re", org.render(), size.render()),
                PathElement::Line(org),
                initial_point,
            ),
            PathElement::RoundedRectangle { org, .. } => {
                self.render_shape(style, last_item, initial_point, PathElement::Line(org))
            }
            PathElement::Ellipse { center, .. } => {
                self.render_shape(style, last_item, initial_point, PathElement::Move(center))
            }
            PathElement::ImplicitClose => {
                let text = if style.auto_close_enabled() { "h" } else { "" };
                (text.to_string(), *last_item, initial_point)
            }
            PathElement::Close => ("h".to_string(), PathElement::Move(initial_point), initial_point),
        }
    }

    /// Like [`render`](Self::render), also writing a description of how the
    /// element resolved to `out`. Nested lines are indented with `pfx`.
    pub fn render_debug(
        &self,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
        out: &mut String,
        pfx: &str,
    ) -> (String, PathElement, Point) {
        match *self {
            PathElement::Move(_)
            | PathElement::Line(_)
            | PathElement::BezierCurve { .. }
            | PathElement::Close => {
                let result = self.render(style, last_item, initial_point);
                out.push_str(&format!("{self}\n"));
                result
            }
            PathElement::RelativeMove(_)
            | PathElement::RelativeLine(_)
            | PathElement::HorizontalLine(_)
            | PathElement::RelativeHorizontalLine(_)
            | PathElement::VerticalLine(_)
            | PathElement::RelativeVerticalLine(_)
            | PathElement::RelativeBezierCurve { .. } => {
                let result = self.render(style, last_item, initial_point);
                out.push_str(&format!("{self} resolved to {}\n", result.1));
                result
            }
            PathElement::QuadraticBezierCurve { ctrl, end } => {
                let result = self.render(style, last_item, initial_point);
                let cubic = CubicBezier::from_quadratic(current_point(last_item), ctrl, end);
                out.push_str(&format!("{self} resolved to {}\n", curve_element(&cubic)));
                result
            }
            PathElement::RelativeQuadraticBezierCurve { .. } => {
                let result = self.render(style, last_item, initial_point);
                let last = current_point(last_item);
                if let PathElement::QuadraticBezierCurve { ctrl, end } = result.1 {
                    let cubic = CubicBezier::from_quadratic(last, ctrl, end);
                    out.push_str(&format!(
                        "{self} resolved to {} then to {}\n",
                        result.1,
                        curve_element(&cubic)
                    ));
                }
                result
            }
            PathElement::Arc {
                radii,
                rotation,
                large,
                sweep,
                end,
            } => {
                let curves = approximate_arc(current_point(last_item), radii, rotation, large, sweep, end);
                out.push_str(&format!("{self} resolved to:\n"));
                let elements: Vec<PathElement> = curves.iter().map(curve_element).collect();
                write_tree_lines(out, pfx, &elements);
                render_arc(&curves, last_item, initial_point)
            }
            PathElement::RelativeArc { .. } => {
                out.push_str(&format!("{self} resolved to "));
                self.absolute_arc(current_point(last_item))
                    .render_debug(style, last_item, initial_point, out, pfx)
            }
            PathElement::RoundedRectangle { .. } | PathElement::Ellipse { .. } => {
                out.push_str(&format!("{self} resolved to:\n"));
                write_tree_lines(out, pfx, &self.decompose());
                self.render(style, last_item, initial_point)
            }
            PathElement::Rectangle { .. } | PathElement::ImplicitClose => {
                let result = self.render(style, last_item, initial_point);
                out.push_str(&format!("{self} resolved to {}\n", result.0));
                result
            }
        }
    }

    fn absolute_arc(&self, last: Point) -> PathElement {
        match *self {
            PathElement::RelativeArc {
                radii,
                rotation,
                large,
                sweep,
                end,
            } => PathElement::Arc {
                radii,
                rotation,
                large,
                sweep,
                end: last + end,
            },
            other => other,
        }
    }

    fn render_shape(
        &self,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
        resolved: PathElement,
    ) -> (String, PathElement, Point) {
        let components = self.decompose();
        if components.is_empty() {
            return (String::new(), *last_item, initial_point);
        }
        let mut last = *last_item;
        let mut initial = initial_point;
        let mut parts = Vec::with_capacity(components.len());
        for item in &components {
            let (text, next, next_initial) = item.render(style, &last, initial);
            parts.push(text);
            last = next;
            initial = next_initial;
        }
        (parts.join(" "), resolved, initial)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn current_point(last_item: &PathElement) -> Point {
    // resolved elements always carry an end point
    last_item.end_point().unwrap_or_default()
}

fn render_move(pt: Point) -> String {
    format!("{} m", pt.render())
}

fn render_line(pt: Point) -> String {
    format!("{} l", pt.render())
}

fn render_curve(curve: &CubicBezier) -> String {
    format!("{} {} {} c", curve.c1.render(), curve.c2.render(), curve.end.render())
}

fn resolved_line(pt: Point, initial_point: Point) -> (String, PathElement, Point) {
    (render_line(pt), PathElement::Line(pt), initial_point)
}

fn curve_element(curve: &CubicBezier) -> PathElement {
    PathElement::BezierCurve {
        c1: curve.c1,
        c2: curve.c2,
        end: curve.end,
    }
}

fn render_arc(
    curves: &[CubicBezier],
    last_item: &PathElement,
    initial_point: Point,
) -> (String, PathElement, Point) {
    match curves.last() {
        None => (String::new(), *last_item, initial_point),
        Some(final_curve) => {
            let text = curves.iter().map(render_curve).collect::<Vec<_>>().join(" ");
            (text, curve_element(final_curve), initial_point)
        }
    }
}

fn arc_bounding_box(
    start: Point,
    radii: Point,
    rotation: f64,
    large: bool,
    sweep: bool,
    end: Point,
) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    let mut prev = start;
    for curve in approximate_arc(start, radii, rotation, large, sweep, end) {
        bbox = bbox.merge(&curve.bounding_box(prev));
        prev = curve.end;
    }
    bbox
}

fn replay_bounding_box(items: &[PathElement], start: Point) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    let mut current = start;
    for item in items {
        let (b, next) = item.bounding_box(current);
        bbox = bbox.merge(&b);
        current = next;
    }
    bbox
}

fn write_tree_lines(out: &mut String, pfx: &str, items: &[PathElement]) {
    match items.split_last() {
        None => out.push_str(&format!("{pfx} └─ nothing\n")),
        Some((last, rest)) => {
            for item in rest {
                out.push_str(&format!("{pfx} ├─ {item}\n"));
            }
            out.push_str(&format!("{pfx} └─ {last}\n"));
        }
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Move(pt) => write!(f, "Move(pt={pt})"),
            PathElement::RelativeMove(pt) => write!(f, "RelativeMove(pt={pt})"),
            PathElement::Line(pt) => write!(f, "Line(pt={pt})"),
            PathElement::RelativeLine(pt) => write!(f, "RelativeLine(pt={pt})"),
            PathElement::HorizontalLine(x) => write!(f, "HorizontalLine(x={x})"),
            PathElement::RelativeHorizontalLine(x) => write!(f, "RelativeHorizontalLine(x={x})"),
            PathElement::VerticalLine(y) => write!(f, "VerticalLine(y={y})"),
            PathElement::RelativeVerticalLine(y) => write!(f, "RelativeVerticalLine(y={y})"),
            PathElement::BezierCurve { c1, c2, end } => {
                write!(f, "BezierCurve(c1={c1}, c2={c2}, end={end})")
            }
            PathElement::RelativeBezierCurve { c1, c2, end } => {
                write!(f, "RelativeBezierCurve(c1={c1}, c2={c2}, end={end})")
            }
            PathElement::QuadraticBezierCurve { ctrl, end } => {
                write!(f, "QuadraticBezierCurve(ctrl={ctrl}, end={end})")
            }
            PathElement::RelativeQuadraticBezierCurve { ctrl, end } => {
                write!(f, "RelativeQuadraticBezierCurve(ctrl={ctrl}, end={end})")
            }
            PathElement::Arc {
                radii,
                rotation,
                large,
                sweep,
                end,
            } => write!(
                f,
                "Arc(radii={radii}, rotation={rotation}, large={large}, sweep={sweep}, end={end})"
            ),
            PathElement::RelativeArc {
                radii,
                rotation,
                large,
                sweep,
                end,
            } => write!(
                f,
                "RelativeArc(radii={radii}, rotation={rotation}, large={large}, sweep={sweep}, end={end})"
            ),
            PathElement::Rectangle { org, size } => write!(f, "Rectangle(org={org}, size={size})"),
            PathElement::RoundedRectangle {
                org,
                size,
                corner_radii,
            } => write!(
                f,
                "RoundedRectangle(org={org}, size={size}, corner_radii={corner_radii})"
            ),
            PathElement::Ellipse { radii, center } => {
                write!(f, "Ellipse(radii={radii}, center={center})")
            }
            PathElement::ImplicitClose => write!(f, "ImplicitClose()"),
            PathElement::Close => write!(f, "Close()"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
