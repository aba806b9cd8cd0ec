//! Painted paths and clipping paths.
//!
//! [`PaintedPath`] is the builder most drawings are made with: a cursor-style
//! API (`move_to`, `line_to`, `arc_to`, ...) that records path elements into
//! a [`GraphicsContext`] tree and renders them followed by a paint operator.
//!
//! Subpaths left open are closed implicitly. The close is recorded in the
//! context the subpath started in, which is not necessarily the current one
//! when a transform group opened in between.

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

use crate::basics::deg2rad;
use crate::bounding_rect::BoundingBox;
use crate::error::{Error, Result};
use crate::graphics_context::{GraphicsContext, PathItem};
use crate::path_element::PathElement;
use crate::point::Point;
use crate::resources::ResourceRegistry;
use crate::style::{ClippingPathIntersectionRule, GraphicsStyle, PathPaintRule, StyleValue};
use crate::trans_affine::Transform;

/// Where a pending implicit close goes: the open context at `depth`
/// (0 is the root), then down through the nested contexts at `path`.
#[derive(Debug, Clone, PartialEq, Default)]
struct CloseAnchor {
    depth: usize,
    path: Vec<usize>,
}

// ============================================================================
// PaintedPath
// ============================================================================

/// A path with its own style, transform and clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedPath {
    root: GraphicsContext,
    groups: Vec<GraphicsContext>,
    closed: bool,
    close_anchor: CloseAnchor,
    starter_move: Option<PathElement>,
}

impl Default for PaintedPath {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl PaintedPath {
    /// Empty path whose first subpath starts at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            root: GraphicsContext::new(),
            groups: Vec::new(),
            closed: true,
            close_anchor: CloseAnchor::default(),
            starter_move: Some(PathElement::Move(Point::new(x, y))),
        }
    }

    /// Copy of the path. Fails inside a [`PaintedPath::transform_group`]
    /// callback, where the path is only partially built.
    pub fn try_clone(&self) -> Result<Self> {
        if !self.groups.is_empty() {
            return Err(Error::PathBeingModified);
        }
        Ok(self.clone())
    }

    pub fn style(&self) -> &GraphicsStyle {
        &self.root.style
    }

    pub fn style_mut(&mut self) -> &mut GraphicsStyle {
        &mut self.root.style
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.root.transform()
    }

    pub fn set_transform(&mut self, transform: Option<Transform>) {
        self.root.set_transform(transform);
    }

    pub fn auto_close(&self) -> StyleValue<bool> {
        self.root.style.auto_close()
    }

    pub fn set_auto_close(&mut self, auto_close: bool) {
        self.root.style.set_auto_close(auto_close);
    }

    pub fn paint_rule(&self) -> StyleValue<PathPaintRule> {
        self.root.style.paint_rule()
    }

    pub fn set_paint_rule(&mut self, rule: impl Into<StyleValue<PathPaintRule>>) {
        self.root.style.set_paint_rule(rule);
    }

    pub fn clipping_path(&self) -> Option<&ClippingPath> {
        self.root.clipping_path()
    }

    pub fn set_clipping_path(&mut self, clipping_path: Option<ClippingPath>) {
        self.root.set_clipping_path(clipping_path);
    }

    /// The root context holding everything built so far.
    pub fn graphics_context(&self) -> &GraphicsContext {
        &self.root
    }

    fn current_mut(&mut self) -> &mut GraphicsContext {
        match self.groups.last_mut() {
            Some(group) => group,
            None => &mut self.root,
        }
    }

    fn current_anchor(&self) -> CloseAnchor {
        CloseAnchor {
            depth: self.groups.len(),
            path: Vec::new(),
        }
    }

    /// Build part of the path under `transform`. Everything `build` adds
    /// lands in a nested context attached when it returns.
    pub fn transform_group(&mut self, transform: Transform, build: impl FnOnce(&mut Self)) -> &mut Self {
        self.groups.push(GraphicsContext::with_transform(transform));
        let depth = self.groups.len();
        build(self);
        if let Some(group) = self.groups.pop() {
            let parent = self.current_mut();
            let index = parent.items().len();
            parent.add_item(group);
            if self.close_anchor.depth == depth {
                self.close_anchor.depth -= 1;
                self.close_anchor.path.insert(0, index);
            }
        }
        self
    }

    /// Append an item to the current context, first emitting the pending
    /// starting move if there is one.
    pub fn add_path_element(&mut self, item: impl Into<PathItem>) -> &mut Self {
        if let Some(starter) = self.starter_move.take() {
            self.closed = false;
            self.current_mut().add_item(starter);
            self.close_anchor = self.current_anchor();
        }
        self.current_mut().add_item(item);
        self
    }

    pub fn remove_last_path_element(&mut self) -> Option<PathItem> {
        self.current_mut().remove_last_item()
    }

    fn insert_implicit_close_if_open(&mut self) {
        if self.closed {
            return;
        }
        let current = self.current_anchor();
        let anchor = std::mem::replace(&mut self.close_anchor, current);
        let base = match anchor.depth {
            0 => Some(&mut self.root),
            depth => self.groups.get_mut(depth - 1),
        };
        let anchored = match base.map(|ctx| ctx.context_at_mut(&anchor.path)) {
            Some(Ok(ctx)) => {
                ctx.add_item(PathElement::ImplicitClose);
                true
            }
            _ => false,
        };
        if !anchored {
            log::debug!("subpath context is gone, closing in the current context");
            self.current_mut().add_item(PathElement::ImplicitClose);
        }
        self.closed = true;
    }

    /// The root, with the implicit close of an open subpath applied.
    fn closed_root(&self) -> Cow<'_, GraphicsContext> {
        if self.closed || self.close_anchor.depth != 0 {
            return Cow::Borrowed(&self.root);
        }
        let mut root = self.root.clone();
        let anchored = match root.context_at_mut(&self.close_anchor.path) {
            Ok(ctx) => {
                ctx.add_item(PathElement::ImplicitClose);
                true
            }
            Err(_) => false,
        };
        if !anchored {
            root.add_item(PathElement::ImplicitClose);
        }
        Cow::Owned(root)
    }

    // ------------------------------------------------------------------
    // Shapes
    // ------------------------------------------------------------------

    /// Rectangle with optional corner radii, as its own closed subpath.
    pub fn rectangle(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> &mut Self {
        self.insert_implicit_close_if_open();
        self.add_path_element(PathElement::RoundedRectangle {
            org: Point::new(x, y),
            size: Point::new(w, h),
            corner_radii: Point::new(rx, ry),
        });
        self.closed = true;
        self.move_to(x, y)
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64) -> &mut Self {
        self.ellipse(cx, cy, r, r)
    }

    pub fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64) -> &mut Self {
        self.insert_implicit_close_if_open();
        self.add_path_element(PathElement::Ellipse {
            radii: Point::new(rx, ry),
            center: Point::new(cx, cy),
        });
        self.closed = true;
        self.move_to(cx, cy)
    }

    // ------------------------------------------------------------------
    // Subpath construction
    // ------------------------------------------------------------------

    /// Start a new subpath at `(x, y)`. The move is only emitted once
    /// something is drawn from it.
    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.insert_implicit_close_if_open();
        self.starter_move = Some(PathElement::Move(Point::new(x, y)));
        self
    }

    /// Start a new subpath offset from the current point.
    pub fn move_relative(&mut self, x: f64, y: f64) -> &mut Self {
        self.insert_implicit_close_if_open();
        if let Some(starter) = self.starter_move.take() {
            self.closed = false;
            self.current_mut().add_item(starter);
            self.close_anchor = self.current_anchor();
        }
        self.starter_move = Some(PathElement::RelativeMove(Point::new(x, y)));
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.add_path_element(PathElement::Line(Point::new(x, y)))
    }

    pub fn line_relative(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.add_path_element(PathElement::RelativeLine(Point::new(dx, dy)))
    }

    pub fn horizontal_line_to(&mut self, x: f64) -> &mut Self {
        self.add_path_element(PathElement::HorizontalLine(x))
    }

    pub fn horizontal_line_relative(&mut self, dx: f64) -> &mut Self {
        self.add_path_element(PathElement::RelativeHorizontalLine(dx))
    }

    pub fn vertical_line_to(&mut self, y: f64) -> &mut Self {
        self.add_path_element(PathElement::VerticalLine(y))
    }

    pub fn vertical_line_relative(&mut self, dy: f64) -> &mut Self {
        self.add_path_element(PathElement::RelativeVerticalLine(dy))
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> &mut Self {
        self.add_path_element(PathElement::BezierCurve {
            c1: Point::new(x1, y1),
            c2: Point::new(x2, y2),
            end: Point::new(x3, y3),
        })
    }

    pub fn curve_relative(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx3: f64, dy3: f64) -> &mut Self {
        self.add_path_element(PathElement::RelativeBezierCurve {
            c1: Point::new(dx1, dy1),
            c2: Point::new(dx2, dy2),
            end: Point::new(dx3, dy3),
        })
    }

    pub fn quadratic_curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> &mut Self {
        self.add_path_element(PathElement::QuadraticBezierCurve {
            ctrl: Point::new(x1, y1),
            end: Point::new(x2, y2),
        })
    }

    pub fn quadratic_curve_relative(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64) -> &mut Self {
        self.add_path_element(PathElement::RelativeQuadraticBezierCurve {
            ctrl: Point::new(dx1, dy1),
            end: Point::new(dx2, dy2),
        })
    }

    /// Elliptical arc to `(x, y)`. `rotation` is in degrees. A zero radius
    /// degenerates to a straight line.
    #[allow(clippy::too_many_arguments)]
    pub fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        positive_sweep: bool,
        x: f64,
        y: f64,
    ) -> &mut Self {
        if rx == 0.0 || ry == 0.0 {
            return self.line_to(x, y);
        }
        self.add_path_element(PathElement::Arc {
            radii: Point::new(rx.abs(), ry.abs()),
            rotation: deg2rad(rotation),
            large: large_arc,
            sweep: positive_sweep,
            end: Point::new(x, y),
        })
    }

    /// [`PaintedPath::arc_to`] with the end point relative to the current
    /// point.
    #[allow(clippy::too_many_arguments)]
    pub fn arc_relative(
        &mut self,
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        positive_sweep: bool,
        dx: f64,
        dy: f64,
    ) -> &mut Self {
        if rx == 0.0 || ry == 0.0 {
            return self.line_relative(dx, dy);
        }
        self.add_path_element(PathElement::RelativeArc {
            radii: Point::new(rx.abs(), ry.abs()),
            rotation: deg2rad(rotation),
            large: large_arc,
            sweep: positive_sweep,
            end: Point::new(dx, dy),
        })
    }

    /// Close the current subpath. The next one starts where it began.
    pub fn close(&mut self) -> &mut Self {
        self.add_path_element(PathElement::Close);
        self.closed = true;
        self.move_relative(0.0, 0.0)
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Bounding box in the parent space, grown by the path's own stroke.
    pub fn bounding_box(&self, start: Point) -> (BoundingBox, Point) {
        self.root.bounding_box(start, Some(&self.root.style), true)
    }

    /// Render as a `q ... Q` block with the paint operator before the `Q`.
    /// A path with nothing in it renders as an empty string.
    pub fn render(
        &self,
        registry: &mut dyn ResourceRegistry,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
        debug: Option<&mut String>,
        pfx: &str,
    ) -> Result<(String, PathElement, Point)> {
        let root = self.closed_root();
        let (mut list, last_item, initial_point) =
            root.build_render_list(registry, style, last_item, initial_point, debug, pfx, true)?;
        if !list.is_empty() {
            let rule = GraphicsStyle::merge(style, &self.root.style).resolve_paint_rule();
            list.insert(list.len() - 1, rule.operator().to_string());
        }
        Ok((list.join(" "), last_item, initial_point))
    }
}

// ============================================================================
// ClippingPath
// ============================================================================

/// A path used to clip a context instead of being painted.
///
/// Derefs to [`PaintedPath`] for building.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippingPath {
    path: PaintedPath,
}

impl Default for ClippingPath {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl ClippingPath {
    pub fn new(x: f64, y: f64) -> Self {
        let mut path = PaintedPath::new(x, y);
        path.set_paint_rule(PathPaintRule::DontPaint);
        Self { path }
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            path: self.path.try_clone()?,
        })
    }

    /// Path operators followed by the clip operator (`W` or `W*`) and the
    /// paint operator, with no `q`/`Q`. Open subpaths are left open.
    pub fn render(
        &self,
        registry: &mut dyn ResourceRegistry,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
        mut debug: Option<&mut String>,
        pfx: &str,
    ) -> Result<(String, PathElement, Point)> {
        if let Some(out) = debug.as_deref_mut() {
            out.push_str("<ClippingPath> ");
        }
        let (mut list, last_item, initial_point) =
            self.path
                .root
                .build_render_list(registry, style, last_item, initial_point, debug, pfx, false)?;
        let merged = GraphicsStyle::merge(style, self.path.style());
        let intersection = match merged.intersection_rule() {
            StyleValue::Value(rule) => ClippingPathIntersectionRule::from(rule),
            StyleValue::Inherit | StyleValue::Unset => ClippingPathIntersectionRule::Nonzero,
        };
        list.push(intersection.operator().to_string());
        list.push(merged.resolve_paint_rule().operator().to_string());
        Ok((list.join(" "), last_item, initial_point))
    }
}

impl Deref for ClippingPath {
    type Target = PaintedPath;
    fn deref(&self) -> &PaintedPath {
        &self.path
    }
}

impl DerefMut for ClippingPath {
    fn deref_mut(&mut self) -> &mut PaintedPath {
        &mut self.path
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceCatalog;

    fn origin() -> Point {
        Point::origin()
    }

    fn render(path: &PaintedPath) -> String {
        let mut catalog = ResourceCatalog::new();
        path.render(&mut catalog, &GraphicsStyle::new(), &PathElement::Move(origin()), origin(), None, "")
            .unwrap()
            .0
    }

    fn render_clip(path: &ClippingPath) -> String {
        let mut catalog = ResourceCatalog::new();
        path.render(&mut catalog, &GraphicsStyle::new(), &PathElement::Move(origin()), origin(), None, "")
            .unwrap()
            .0
    }

    fn check(build: impl Fn(&mut PaintedPath), expected_path: &str, expected_clip: &str) {
        let mut path = PaintedPath::new(0.0, 0.0);
        build(&mut path);
        assert_eq!(render(&path), expected_path);
        let mut clip = ClippingPath::new(0.0, 0.0);
        build(clip.deref_mut());
        assert_eq!(render_clip(&clip), expected_clip);
    }

    #[test]
    fn test_shapes() {
        check(
            |p| {
                p.rectangle(1.0, 2.0, 3.0, 4.0, 0.0, 0.0);
            },
            "q 0 0 m 1 2 3 4 re B Q",
            "0 0 m 1 2 3 4 re W n",
        );
        check(
            |p| {
                p.circle(1.0, 2.0, 3.0);
            },
            "q 0 0 m 4 2 m 4 3.6569 2.6569 5 1 5 c -0.6569 5 -2 3.6569 -2 2 c -2 0.3431 \
             -0.6569 -1 1 -1 c 2.6569 -1 4 0.3431 4 2 c h B Q",
            "0 0 m 4 2 m 4 3.6569 2.6569 5 1 5 c -0.6569 5 -2 3.6569 -2 2 c -2 0.3431 \
             -0.6569 -1 1 -1 c 2.6569 -1 4 0.3431 4 2 c h W n",
        );
    }

    #[test]
    fn test_lines_close_implicitly() {
        check(
            |p| {
                p.line_to(2.0, 1.0);
            },
            "q 0 0 m 2 1 l h B Q",
            "0 0 m 2 1 l W n",
        );
        check(
            |p| {
                p.horizontal_line_relative(2.0);
            },
            "q 0 0 m 2 0 l h B Q",
            "0 0 m 2 0 l W n",
        );
        check(
            |p| {
                p.vertical_line_to(2.0);
            },
            "q 0 0 m 0 2 l h B Q",
            "0 0 m 0 2 l W n",
        );
    }

    #[test]
    fn test_curves() {
        check(
            |p| {
                p.curve_relative(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
            },
            "q 0 0 m 1 2 3 4 5 6 c h B Q",
            "0 0 m 1 2 3 4 5 6 c W n",
        );
        check(
            |p| {
                p.quadratic_curve_to(1.0, 2.0, 3.0, 4.0);
            },
            "q 0 0 m 0.6667 1.3333 1.6667 2.6667 3 4 c h B Q",
            "0 0 m 0.6667 1.3333 1.6667 2.6667 3 4 c W n",
        );
        check(
            |p| {
                p.arc_to(3.0, 3.0, 0.0, false, false, 1.0, 1.0);
            },
            "q 0 0 m 0.2489 0.4083 0.5917 0.7511 1 1 c h B Q",
            "0 0 m 0.2489 0.4083 0.5917 0.7511 1 1 c W n",
        );
    }

    #[test]
    fn test_explicit_close() {
        check(
            |p| {
                p.close();
            },
            "q 0 0 m h B Q",
            "0 0 m h W n",
        );
    }

    #[test]
    fn test_zero_radius_arc_is_a_line() {
        let mut path = PaintedPath::new(0.0, 0.0);
        path.arc_to(0.0, 3.0, 0.0, false, false, 1.0, 1.0);
        assert_eq!(
            path.graphics_context().items().last(),
            Some(&PathItem::Element(PathElement::Line(Point::new(1.0, 1.0))))
        );
    }

    #[test]
    fn test_empty_path_renders_nothing() {
        assert_eq!(render(&PaintedPath::new(3.0, 4.0)), "");
    }

    #[test]
    fn test_clipping_path_on_painted_path() {
        let mut clip = ClippingPath::new(0.0, 0.0);
        clip.move_to(1.0, 1.0).line_to(9.0, 1.0).line_to(9.0, 9.0).line_to(1.0, 9.0).close();
        let mut path = PaintedPath::new(0.0, 0.0);
        path.line_to(10.0, 0.0).line_to(5.0, 10.0).close();
        path.set_clipping_path(Some(clip));
        assert_eq!(
            render(&path),
            "q 1 1 m 9 1 l 9 9 l 1 9 l h W n 0 0 m 10 0 l 5 10 l h B Q"
        );
    }

    #[test]
    fn test_transform_group_nests_context() {
        let mut path = PaintedPath::new(0.0, 0.0);
        path.line_to(1.0, 0.0);
        path.transform_group(Transform::scaling(2.0, 2.0), |p| {
            assert_eq!(p.try_clone(), Err(Error::PathBeingModified));
            p.line_to(1.0, 1.0);
        });
        assert!(path.try_clone().is_ok());
        assert_eq!(
            render(&path),
            "q 0 0 m 1 0 l q 2 0 0 2 0 0 cm 1 1 l Q h B Q"
        );
    }

    #[test]
    fn test_implicit_close_goes_to_starting_context() {
        let mut path = PaintedPath::new(0.0, 0.0);
        path.transform_group(Transform::translation(5.0, 5.0), |p| {
            p.line_to(1.0, 1.0);
        });
        path.move_to(3.0, 3.0);
        let PathItem::Context(group) = &path.graphics_context().items()[0] else {
            panic!("expected a nested context");
        };
        assert_eq!(group.items().last(), Some(&PathItem::Element(PathElement::ImplicitClose)));
    }

    #[test]
    fn test_render_does_not_mutate() {
        let mut path = PaintedPath::new(0.0, 0.0);
        path.line_to(2.0, 1.0);
        let before = path.clone();
        assert_eq!(render(&path), "q 0 0 m 2 1 l h B Q");
        assert_eq!(path, before);
    }

    #[test]
    fn test_bounding_box_includes_stroke() {
        let mut path = PaintedPath::new(0.0, 0.0);
        path.rectangle(0.0, 0.0, 10.0, 10.0, 0.0, 0.0);
        path.style_mut().set_stroke_width(2.0);
        let (bbox, _) = path.bounding_box(origin());
        assert_eq!(bbox, BoundingBox::new(-1.0, -1.0, 11.0, 11.0));

        path.set_paint_rule(PathPaintRule::FillNonzero);
        let (bbox, _) = path.bounding_box(origin());
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
    }
}
