//! Graphics context tree.
//!
//! A [`GraphicsContext`] groups path items under a style delta, an optional
//! transform and an optional clipping path. Contexts nest, and both the
//! bounding box and the render pass walk the tree with the same
//! accumulator: the transform and the style composed from the root down
//! (see [`Frame`] and [`walk`]).

use crate::bounding_rect::BoundingBox;
use crate::comp_op::PaintComposite;
use crate::error::{Error, Result};
use crate::painted_path::{ClippingPath, PaintedPath};
use crate::path_element::PathElement;
use crate::point::Point;
use crate::resources::ResourceRegistry;
use crate::style::{render_dash, GraphicsStyle, Paint, StyleValue};
use crate::trans_affine::Transform;

// ============================================================================
// PathItem
// ============================================================================

/// Anything that can sit in a graphics context.
#[derive(Debug, Clone, PartialEq)]
pub enum PathItem {
    Element(PathElement),
    Context(GraphicsContext),
    Path(PaintedPath),
    Composite(PaintComposite),
}

impl PathItem {
    /// Bounding box when drawn from `start`, in the item's parent space,
    /// and the point the next item starts from.
    pub fn bounding_box(&self, start: Point) -> (BoundingBox, Point) {
        match self {
            PathItem::Element(element) => element.bounding_box(start),
            PathItem::Context(ctx) => ctx.bounding_box(start, None, true),
            PathItem::Path(path) => path.bounding_box(start),
            PathItem::Composite(composite) => composite.bounding_box(start),
        }
    }

    /// Render under the ambient `style`. With `debug`, a description of the
    /// item is written there, nested lines prefixed by `pfx`.
    pub fn render(
        &self,
        registry: &mut dyn ResourceRegistry,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
        debug: Option<&mut String>,
        pfx: &str,
    ) -> Result<(String, PathElement, Point)> {
        match self {
            PathItem::Element(element) => Ok(match debug {
                Some(out) => element.render_debug(style, last_item, initial_point, out, pfx),
                None => element.render(style, last_item, initial_point),
            }),
            PathItem::Context(ctx) => ctx.render(registry, style, last_item, initial_point, debug, pfx),
            PathItem::Path(path) => path.render(registry, style, last_item, initial_point, debug, pfx),
            PathItem::Composite(composite) => {
                composite.render(registry, style, last_item, initial_point, debug, pfx)
            }
        }
    }
}

impl From<PathElement> for PathItem {
    fn from(element: PathElement) -> Self {
        PathItem::Element(element)
    }
}

impl From<GraphicsContext> for PathItem {
    fn from(ctx: GraphicsContext) -> Self {
        PathItem::Context(ctx)
    }
}

impl From<PaintedPath> for PathItem {
    fn from(path: PaintedPath) -> Self {
        PathItem::Path(path)
    }
}

impl From<PaintComposite> for PathItem {
    fn from(composite: PaintComposite) -> Self {
        PathItem::Composite(composite)
    }
}

// ============================================================================
// Tree walk
// ============================================================================

/// State accumulated from the root down to a context.
#[derive(Debug, Clone)]
pub struct Frame {
    pub transform: Transform,
    pub style: GraphicsStyle,
}

impl Frame {
    pub fn new(style: GraphicsStyle) -> Self {
        Self {
            transform: Transform::identity(),
            style,
        }
    }

    /// The frame inside `ctx`.
    pub fn enter(&self, ctx: &GraphicsContext) -> Frame {
        Frame {
            transform: match ctx.transform {
                Some(local) => self.transform * local,
                None => self.transform,
            },
            style: GraphicsStyle::merge(&self.style, &ctx.style),
        }
    }
}

/// Callbacks for [`walk`].
pub trait ContextVisitor {
    /// Entering `ctx`, whose parent frame is `ambient`.
    fn enter_context(
        &mut self,
        ctx: &GraphicsContext,
        ambient: &Frame,
        frame: &Frame,
        is_last: bool,
    ) -> Result<()>;

    /// An item other than a nested context.
    fn visit_item(&mut self, item: &PathItem, frame: &Frame, is_last: bool) -> Result<()>;

    /// Leaving `ctx`.
    fn exit_context(&mut self, ctx: &GraphicsContext, frame: &Frame) -> Result<()>;
}

/// Depth-first walk of `ctx` and its nested contexts.
pub fn walk(ctx: &GraphicsContext, ambient: &Frame, visitor: &mut dyn ContextVisitor) -> Result<()> {
    walk_inner(ctx, ambient, visitor, true)
}

fn walk_inner(
    ctx: &GraphicsContext,
    ambient: &Frame,
    visitor: &mut dyn ContextVisitor,
    is_last: bool,
) -> Result<()> {
    let frame = ambient.enter(ctx);
    visitor.enter_context(ctx, ambient, &frame, is_last)?;
    let count = ctx.items.len();
    for (i, item) in ctx.items.iter().enumerate() {
        let last = i + 1 == count;
        match item {
            PathItem::Context(child) => walk_inner(child, &frame, visitor, last)?,
            other => visitor.visit_item(other, &frame, last)?,
        }
    }
    visitor.exit_context(ctx, &frame)
}

// ============================================================================
// Bounding box pass
// ============================================================================

struct BoundsVisitor {
    bbox: BoundingBox,
    current: Point,
    norms: (f64, f64),
}

impl ContextVisitor for BoundsVisitor {
    fn enter_context(&mut self, _: &GraphicsContext, _: &Frame, frame: &Frame, _: bool) -> Result<()> {
        let (nx, ny) = frame.transform.row_norms();
        self.norms = (self.norms.0.max(nx), self.norms.1.max(ny));
        Ok(())
    }

    fn visit_item(&mut self, item: &PathItem, frame: &Frame, _: bool) -> Result<()> {
        let (bbox, end) = item.bounding_box(self.current);
        self.bbox = self.bbox.merge(&bbox.transformed(&frame.transform));
        self.current = end;
        Ok(())
    }

    fn exit_context(&mut self, _: &GraphicsContext, _: &Frame) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Render pass
// ============================================================================

struct Level {
    pfx: String,
    list: Vec<String>,
    active: bool,
    transform: Option<Transform>,
}

struct RenderVisitor<'a> {
    registry: &'a mut dyn ResourceRegistry,
    debug: Option<&'a mut String>,
    root_pfx: String,
    push_stack: bool,
    last_item: PathElement,
    initial_point: Point,
    stack: Vec<Level>,
    result: Vec<String>,
}

impl RenderVisitor<'_> {
    fn write(&mut self, text: &str) {
        if let Some(out) = self.debug.as_deref_mut() {
            out.push_str(text);
        }
    }

    /// Prefix for a child of the innermost level, writing its connector.
    fn child_pfx(&mut self, is_last: bool) -> String {
        let parent = self.stack.last().map(|l| l.pfx.clone()).unwrap_or_default();
        let (connector, extension) = if is_last { (" └─ ", "    ") } else { (" ├─ ", " │  ") };
        self.write(&format!("{parent}{connector}"));
        format!("{parent}{extension}")
    }

    fn write_header(&mut self, ctx: &GraphicsContext, frame: &Frame, pfx: &str) {
        if self.debug.is_none() {
            return;
        }
        let mut text = String::from("GraphicsContext");
        if let Some(tf) = &ctx.transform {
            text.push_str(&format!("({tf})"));
        }
        let own: Vec<&'static str> = ctx.style.describe().into_iter().map(|(name, _)| name).collect();
        let merged = frame.style.describe();
        if merged.is_empty() {
            text.push('\n');
        } else {
            text.push_str(" {\n");
            for (name, value) in merged {
                let inherited = if own.contains(&name) { "" } else { " (inherited)" };
                text.push_str(&format!("{pfx}    {name}: {value}{inherited}\n"));
            }
            text.push_str(&format!("{pfx}}}┐\n"));
        }
        self.write(&text);
    }

    /// Graphics state, colors and dash for `ctx`.
    fn emit_state(&mut self, ctx: &GraphicsContext, ambient: &Frame, frame: &Frame) -> Result<Vec<String>> {
        let mut list = Vec::new();
        let merged = &frame.style;
        let mut emit_style = ctx.style.clone();
        if merged.allow_transparency() != ctx.style.allow_transparency() {
            emit_style.set_allow_transparency(merged.allow_transparency());
        }

        let dash_pattern = merged.stroke_dash_pattern().clone();
        let dash_phase = merged.stroke_dash_phase();
        let mut emit_dash = None;
        if &dash_pattern != ambient.style.stroke_dash_pattern() || dash_phase != ambient.style.stroke_dash_phase() {
            emit_style.set_stroke_dash_pattern(dash_pattern.clone());
            emit_style.set_stroke_dash_phase(dash_phase.clone());
            emit_dash = Some((dash_pattern, dash_phase));
        }

        if let StyleValue::Value(mask) = emit_style.soft_mask() {
            if mask.object_id().is_none() {
                self.registry.register_soft_mask(mask)?;
            }
        }
        if let Some(name) = self.registry.register_graphics_style(&emit_style) {
            list.push(format!("/{name} gs"));
        }

        if let StyleValue::Value(paint) = ctx.style.fill_color() {
            list.push(match paint {
                Paint::Gradient(gradient) => {
                    let (bbox, _) = ctx.bounding_box(self.initial_point, Some(&ctx.style), false);
                    gradient.emit_fill(&mut *self.registry, Some(&bbox))?
                }
                Paint::Color(color) => color.serialize().to_lowercase(),
            });
        }
        if let StyleValue::Value(paint) = ctx.style.stroke_color() {
            list.push(match paint {
                Paint::Gradient(gradient) => {
                    let (bbox, _) = ctx.bounding_box(self.initial_point, Some(&ctx.style), false);
                    gradient.emit_stroke(&mut *self.registry, Some(&bbox))?
                }
                Paint::Color(color) => color.serialize().to_uppercase(),
            });
        }
        if let Some((pattern, phase)) = emit_dash {
            let pattern = pattern.value().cloned().unwrap_or_default();
            let phase = phase.value().copied().unwrap_or(0.0);
            list.push(render_dash(&pattern, phase));
        }
        Ok(list)
    }
}

impl ContextVisitor for RenderVisitor<'_> {
    fn enter_context(
        &mut self,
        ctx: &GraphicsContext,
        ambient: &Frame,
        frame: &Frame,
        is_last: bool,
    ) -> Result<()> {
        let pfx = if self.stack.is_empty() {
            self.root_pfx.clone()
        } else {
            self.child_pfx(is_last)
        };
        if ctx.items.is_empty() {
            self.stack.push(Level {
                pfx,
                list: Vec::new(),
                active: false,
                transform: None,
            });
            return Ok(());
        }

        self.write_header(ctx, frame, &pfx);
        let mut list = self.emit_state(ctx, ambient, frame)?;

        if let Some(clip) = &ctx.clipping_path {
            let (connector, extension) = (" ├─ ", " │  ");
            self.write(&format!("{pfx}{connector}"));
            let clip_pfx = format!("{pfx}{extension}");
            let (rendered, _, _) = clip.render(
                &mut *self.registry,
                &frame.style,
                &self.last_item,
                self.initial_point,
                self.debug.as_deref_mut(),
                &clip_pfx,
            )?;
            if !rendered.is_empty() {
                list.push(rendered);
            }
        }

        self.stack.push(Level {
            pfx,
            list,
            active: true,
            transform: ctx.transform,
        });
        Ok(())
    }

    fn visit_item(&mut self, item: &PathItem, frame: &Frame, is_last: bool) -> Result<()> {
        let pfx = self.child_pfx(is_last);
        let (rendered, last_item, initial_point) = item.render(
            &mut *self.registry,
            &frame.style,
            &self.last_item,
            self.initial_point,
            self.debug.as_deref_mut(),
            &pfx,
        )?;
        self.last_item = last_item;
        self.initial_point = initial_point;
        if !rendered.is_empty() {
            if let Some(level) = self.stack.last_mut() {
                level.list.push(rendered);
            }
        }
        Ok(())
    }

    fn exit_context(&mut self, _: &GraphicsContext, _: &Frame) -> Result<()> {
        let Some(mut level) = self.stack.pop() else {
            return Ok(());
        };
        let is_root = self.stack.is_empty();
        if level.active {
            if let Some(tf) = level.transform {
                level.list.insert(0, tf.render(self.last_item).0);
            }
            if !is_root || self.push_stack {
                level.list.insert(0, "q".to_string());
                level.list.push("Q".to_string());
            }
        }
        match self.stack.last_mut() {
            Some(parent) => {
                if !level.list.is_empty() {
                    parent.list.push(level.list.join(" "));
                }
            }
            None => self.result = level.list,
        }
        Ok(())
    }
}

// ============================================================================
// GraphicsContext
// ============================================================================

/// A group of path items sharing a style delta, a transform and a clip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicsContext {
    pub style: GraphicsStyle,
    items: Vec<PathItem>,
    transform: Option<Transform>,
    clipping_path: Option<Box<ClippingPath>>,
}

impl GraphicsContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transform(transform: Transform) -> Self {
        Self {
            transform: Some(transform),
            ..Self::default()
        }
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    pub fn set_transform(&mut self, transform: Option<Transform>) {
        self.transform = transform;
    }

    pub fn clipping_path(&self) -> Option<&ClippingPath> {
        self.clipping_path.as_deref()
    }

    pub fn set_clipping_path(&mut self, clipping_path: Option<ClippingPath>) {
        self.clipping_path = clipping_path.map(Box::new);
    }

    pub fn items(&self) -> &[PathItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<PathItem> {
        &mut self.items
    }

    /// Append an item. The context takes ownership; clone first to keep
    /// using the original.
    pub fn add_item(&mut self, item: impl Into<PathItem>) {
        self.items.push(item.into());
    }

    pub fn remove_last_item(&mut self) -> Option<PathItem> {
        self.items.pop()
    }

    /// Move all of `other`'s items to the end of this context. Its style,
    /// transform and clip are dropped.
    pub fn merge(&mut self, other: GraphicsContext) {
        self.items.extend(other.items);
    }

    /// Bounding box of everything in the context drawn from `start`, in the
    /// context's parent space.
    ///
    /// With `expand_for_stroke`, the box grows once by the stroke of the
    /// context's style merged over `style`, scaled by the largest row norms
    /// of any transform in the subtree.
    pub fn bounding_box(
        &self,
        start: Point,
        style: Option<&GraphicsStyle>,
        expand_for_stroke: bool,
    ) -> (BoundingBox, Point) {
        let ambient = Frame::new(style.cloned().unwrap_or_default());
        let mut visitor = BoundsVisitor {
            bbox: BoundingBox::empty(),
            current: start,
            norms: (0.0, 0.0),
        };
        // the bounds visitor never fails
        let _ = walk(self, &ambient, &mut visitor);
        let bbox = if expand_for_stroke {
            let effective = GraphicsStyle::merge(&ambient.style, &self.style);
            visitor.bbox.expanded_to_stroke(&effective, visitor.norms)
        } else {
            visitor.bbox
        };
        (bbox, visitor.current)
    }

    /// Operators for the context, unjoined.
    ///
    /// An empty context renders nothing. Otherwise the list holds, in
    /// order: the transform, the graphics state, local colors, the dash,
    /// the clip and then the items, bracketed by `q`/`Q` when `push_stack`.
    pub fn build_render_list(
        &self,
        registry: &mut dyn ResourceRegistry,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
        debug: Option<&mut String>,
        pfx: &str,
        push_stack: bool,
    ) -> Result<(Vec<String>, PathElement, Point)> {
        let ambient = Frame::new(style.clone());
        let mut visitor = RenderVisitor {
            registry,
            debug,
            root_pfx: pfx.to_string(),
            push_stack,
            last_item: *last_item,
            initial_point,
            stack: Vec::new(),
            result: Vec::new(),
        };
        walk(self, &ambient, &mut visitor)?;
        Ok((visitor.result, visitor.last_item, visitor.initial_point))
    }

    /// Render the context as a `q ... Q` block.
    pub fn render(
        &self,
        registry: &mut dyn ResourceRegistry,
        style: &GraphicsStyle,
        last_item: &PathElement,
        initial_point: Point,
        debug: Option<&mut String>,
        pfx: &str,
    ) -> Result<(String, PathElement, Point)> {
        let (list, last_item, initial_point) =
            self.build_render_list(registry, style, last_item, initial_point, debug, pfx, true)?;
        Ok((list.join(" "), last_item, initial_point))
    }

    /// Context at `path`, a list of item indices each naming a nested
    /// context.
    pub(crate) fn context_at_mut(&mut self, path: &[usize]) -> Result<&mut GraphicsContext> {
        let mut ctx = self;
        for &index in path {
            ctx = match ctx.items.get_mut(index) {
                Some(PathItem::Context(child)) => child,
                _ => return Err(Error::Unsupported(format!("no nested context at index {index}"))),
            };
        }
        Ok(ctx)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{DeviceGray, DeviceRGB};
    use crate::resources::ResourceCatalog;

    const EPS: f64 = 1e-6;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn square(org: Point, size: f64) -> GraphicsContext {
        let mut ctx = GraphicsContext::new();
        ctx.add_item(PathElement::Move(org));
        ctx.add_item(PathElement::Line(org + p(size, 0.0)));
        ctx.add_item(PathElement::Line(org + p(size, size)));
        ctx.add_item(PathElement::Close);
        ctx
    }

    fn render(ctx: &GraphicsContext, style: &GraphicsStyle) -> String {
        let mut catalog = ResourceCatalog::new();
        ctx.render(&mut catalog, style, &PathElement::Move(p(0.0, 0.0)), p(0.0, 0.0), None, "")
            .unwrap()
            .0
    }

    #[test]
    fn test_empty_context_renders_nothing() {
        assert_eq!(render(&GraphicsContext::new(), &GraphicsStyle::new()), "");
        let (bbox, end) = GraphicsContext::new().bounding_box(p(3.0, 4.0), None, true);
        assert!(!bbox.is_valid());
        assert_eq!(end, p(3.0, 4.0));
    }

    #[test]
    fn test_render_order() {
        let mut ctx = square(p(0.0, 0.0), 10.0);
        ctx.set_transform(Some(Transform::translation(5.0, 5.0)));
        ctx.style.set_fill_color(DeviceRGB::new(1.0, 0.0, 0.0).unwrap());
        ctx.style.set_stroke_color(DeviceGray::new(0.5).unwrap());
        assert_eq!(
            render(&ctx, &GraphicsStyle::new()),
            "q 1 0 0 1 5 5 cm /GS1 gs 1 0 0 rg 0.5 G 0 0 m 10 0 l 10 10 l h Q"
        );
    }

    #[test]
    fn test_dash_emitted_on_change() {
        let mut ctx = square(p(0.0, 0.0), 1.0);
        ctx.style.set_stroke_dash_pattern(vec![3.0, 1.0]);
        let text = render(&ctx, &GraphicsStyle::new());
        assert!(text.starts_with("q /GS1 gs [3 1] 0 d 0 0 m"));

        // same dash as the ambient style: nothing to emit
        let mut ambient = GraphicsStyle::new();
        ambient.set_stroke_dash_pattern(vec![3.0, 1.0]);
        let text = render(&ctx, &ambient);
        assert!(text.starts_with("q /GS1 gs 0 0 m"));
    }

    #[test]
    fn test_nested_context() {
        let mut outer = GraphicsContext::new();
        let mut inner = square(p(0.0, 0.0), 2.0);
        inner.set_transform(Some(Transform::scaling(2.0, 2.0)));
        outer.add_item(inner);
        outer.add_item(PathElement::Line(p(1.0, 1.0)));
        assert_eq!(
            render(&outer, &GraphicsStyle::new()),
            "q q 2 0 0 2 0 0 cm 0 0 m 2 0 l 2 2 l h Q 1 1 l Q"
        );

        let (bbox, _) = outer.bounding_box(p(0.0, 0.0), None, false);
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn test_bbox_expands_once_with_max_norms() {
        let mut outer = GraphicsContext::new();
        outer.style.set_stroke_width(StyleValue::Value(2.0));
        outer.style.set_stroke_color(DeviceGray::new(0.0).unwrap());
        let mut inner = square(p(0.0, 0.0), 10.0);
        inner.set_transform(Some(Transform::scaling(3.0, 1.0)));
        outer.add_item(inner);
        let (bbox, _) = outer.bounding_box(p(0.0, 0.0), None, true);
        assert!((bbox.x0 + 3.0).abs() < EPS);
        assert!((bbox.y0 + 1.0).abs() < EPS);
        assert!((bbox.x1 - 33.0).abs() < EPS);
        assert!((bbox.y1 - 11.0).abs() < EPS);
    }

    #[test]
    fn test_merge_and_remove() {
        let mut a = square(p(0.0, 0.0), 1.0);
        let b = square(p(5.0, 5.0), 1.0);
        a.merge(b);
        assert_eq!(a.items().len(), 8);
        assert_eq!(a.remove_last_item(), Some(PathItem::Element(PathElement::Close)));
        assert_eq!(a.items().len(), 7);
    }

    #[test]
    fn test_render_debug_tree() {
        let ctx = square(p(0.0, 0.0), 1.0);
        let mut catalog = ResourceCatalog::new();
        let mut out = String::new();
        ctx.render(
            &mut catalog,
            &GraphicsStyle::new(),
            &PathElement::Move(p(0.0, 0.0)),
            p(0.0, 0.0),
            Some(&mut out),
            "",
        )
        .unwrap();
        assert_eq!(
            out,
            "GraphicsContext\n \
             ├─ Move(pt=Point(x=0, y=0))\n \
             ├─ Line(pt=Point(x=1, y=0))\n \
             ├─ Line(pt=Point(x=1, y=1))\n \
             └─ Close()\n"
        );
    }
}
