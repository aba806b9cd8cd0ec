//! Drawing surface.
//!
//! A [`DrawingContext`] is the top of a drawing: a list of contexts, painted
//! paths and composites rendered inside one `q ... Q` block that flips the
//! page's y axis and applies the document scale.

use crate::error::{Error, Result};
use crate::graphics_context::PathItem;
use crate::path_element::PathElement;
use crate::point::Point;
use crate::resources::ResourceRegistry;
use crate::style::{render_dash, GraphicsStyle, IntersectionRule, PathPaintRule, StyleValue};
use crate::trans_affine::Transform;

/// Parameters for [`DrawingContext::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Where the drawing's first subpath starts.
    pub first_point: Point,
    /// User space units per device unit.
    pub scale: f64,
    /// Page height, in user space units. The y axis is flipped about its
    /// middle.
    pub height: f64,
    /// Style the drawing starts from.
    pub starting_style: GraphicsStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            first_point: Point::origin(),
            scale: 1.0,
            height: 0.0,
            starting_style: GraphicsStyle::new(),
        }
    }
}

impl RenderOptions {
    pub fn new(first_point: Point, scale: f64, height: f64) -> Self {
        Self {
            first_point,
            scale,
            height,
            ..Self::default()
        }
    }

    pub fn with_starting_style(mut self, style: GraphicsStyle) -> Self {
        self.starting_style = style;
        self
    }

    /// The page transform: flip y about half the height, then scale.
    pub fn page_transform(&self) -> Transform {
        Transform::scaling(1.0, -1.0)
            .about(0.0, self.height / 2.0)
            .scale_uniform(self.scale)
    }

    /// The starting style with the drawing-wide defaults applied.
    fn root_style(&self) -> GraphicsStyle {
        let mut style = self.starting_style.clone();
        style.set_auto_close(true);
        style.set_paint_rule(PathPaintRule::Auto);
        style.set_intersection_rule(IntersectionRule::Nonzero);
        style
    }
}

/// Top-level container of a drawing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawingContext {
    items: Vec<PathItem>,
}

impl DrawingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PathItem] {
        &self.items
    }

    /// Add a graphics context, painted path or composite. Bare path
    /// elements must go in a path.
    pub fn add_item(&mut self, item: impl Into<PathItem>) -> Result<()> {
        match item.into() {
            PathItem::Element(element) => Err(Error::Unsupported(format!(
                "{element} as a top-level drawing item"
            ))),
            item => {
                self.items.push(item);
                Ok(())
            }
        }
    }

    /// Content stream for the drawing. Empty when nothing in it renders.
    pub fn render(&self, registry: &mut dyn ResourceRegistry, options: &RenderOptions) -> Result<String> {
        self.render_inner(registry, options, None)
    }

    /// Like [`DrawingContext::render`], also returning a dump of the tree
    /// with the style each node resolves to.
    pub fn render_debug(
        &self,
        registry: &mut dyn ResourceRegistry,
        options: &RenderOptions,
    ) -> Result<(String, String)> {
        let mut dump = String::new();
        let rendered = self.render_inner(registry, options, Some(&mut dump))?;
        Ok((rendered, dump))
    }

    fn render_inner(
        &self,
        registry: &mut dyn ResourceRegistry,
        options: &RenderOptions,
        mut debug: Option<&mut String>,
    ) -> Result<String> {
        if let Some(out) = debug.as_deref_mut() {
            out.push_str("ROOT\n");
        }
        if self.items.is_empty() {
            return Ok(String::new());
        }

        let style = options.root_style();
        let (page, mut last_item) = options.page_transform().render(PathElement::Move(options.first_point));
        let mut initial_point = options.first_point;
        let mut list = vec!["q".to_string(), page];

        let count = self.items.len();
        for (i, item) in self.items.iter().enumerate() {
            let (connector, pfx) = if i + 1 == count { (" └─ ", "    ") } else { (" ├─ ", " │  ") };
            if let Some(out) = debug.as_deref_mut() {
                out.push_str(connector);
            }
            let (rendered, last, initial) =
                item.render(registry, &style, &last_item, initial_point, debug.as_deref_mut(), pfx)?;
            last_item = last;
            initial_point = initial;
            if !rendered.is_empty() {
                list.push(rendered);
            }
        }
        if list.len() == 2 {
            log::debug!("drawing with {count} items rendered nothing");
            return Ok(String::new());
        }

        if let StyleValue::Value(mask) = style.soft_mask() {
            if mask.object_id().is_none() {
                registry.register_soft_mask(mask)?;
            }
        }
        if let Some(name) = registry.register_graphics_style(&style) {
            let pattern = style.stroke_dash_pattern().value().cloned().unwrap_or_default();
            let phase = style.stroke_dash_phase().value().copied().unwrap_or(0.0);
            list.insert(2, format!("/{name} gs"));
            list.insert(3, render_dash(&pattern, phase));
        }
        list.push("Q".to_string());
        Ok(list.join(" "))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DeviceRGB;
    use crate::comp_op::{CompositingOperation, PaintComposite};
    use crate::graphics_context::GraphicsContext;
    use crate::painted_path::PaintedPath;
    use crate::resources::ResourceCatalog;

    fn triangle() -> PaintedPath {
        let mut path = PaintedPath::new(10.0, 10.0);
        path.line_to(20.0, 10.0).line_to(15.0, 20.0).close();
        path
    }

    #[test]
    fn test_empty_drawing() {
        let drawing = DrawingContext::new();
        let mut catalog = ResourceCatalog::new();
        assert_eq!(drawing.render(&mut catalog, &RenderOptions::default()).unwrap(), "");
    }

    #[test]
    fn test_rejects_bare_elements() {
        let mut drawing = DrawingContext::new();
        let err = drawing.add_item(PathElement::Close);
        assert!(matches!(err, Err(Error::Unsupported(_))));
        assert!(drawing.items().is_empty());
    }

    #[test]
    fn test_page_transform() {
        let options = RenderOptions::new(Point::origin(), 2.0, 10.0);
        assert_eq!(options.page_transform(), Transform::new(2.0, 0.0, 0.0, -2.0, 0.0, 20.0));
    }

    #[test]
    fn test_render_triangle() {
        let mut drawing = DrawingContext::new();
        let mut path = triangle();
        path.style_mut().set_fill_color(DeviceRGB::new(1.0, 0.0, 0.0).unwrap());
        drawing.add_item(path).unwrap();
        let mut catalog = ResourceCatalog::new();
        let text = drawing
            .render(&mut catalog, &RenderOptions::new(Point::origin(), 1.0, 100.0))
            .unwrap();
        assert_eq!(
            text,
            "q 1 0 0 -1 0 100 cm q 1 0 0 rg 10 10 m 20 10 l 15 20 l h B Q Q"
        );
    }

    #[test]
    fn test_starting_style_graphics_state() {
        let mut drawing = DrawingContext::new();
        drawing.add_item(triangle()).unwrap();
        let mut style = GraphicsStyle::new();
        style.set_stroke_width(2.0);
        let options = RenderOptions::new(Point::origin(), 1.0, 0.0).with_starting_style(style);
        let mut catalog = ResourceCatalog::new();
        let text = drawing.render(&mut catalog, &options).unwrap();
        assert!(text.starts_with("q 1 0 0 -1 0 0 cm /GS1 gs [] 0 d q "));
        assert!(text.ends_with(" Q Q"));
    }

    #[test]
    fn test_empty_items_render_nothing() {
        let mut drawing = DrawingContext::new();
        drawing.add_item(GraphicsContext::new()).unwrap();
        drawing.add_item(PaintedPath::new(0.0, 0.0)).unwrap();
        let mut catalog = ResourceCatalog::new();
        assert_eq!(drawing.render(&mut catalog, &RenderOptions::default()).unwrap(), "");
    }

    #[test]
    fn test_composite_item() {
        let mut drawing = DrawingContext::new();
        let mut other = PaintedPath::new(0.0, 0.0);
        other.rectangle(0.0, 0.0, 5.0, 5.0, 0.0, 0.0);
        let composite = PaintComposite::new(triangle(), other, CompositingOperation::DestinationOver).unwrap();
        drawing.add_item(composite).unwrap();
        let mut catalog = ResourceCatalog::new();
        let text = drawing.render(&mut catalog, &RenderOptions::default()).unwrap();
        let rect = text.find("0 0 5 5 re").unwrap();
        let tri = text.find("10 10 m").unwrap();
        assert!(rect < tri);
    }

    #[test]
    fn test_render_debug_tree() {
        let mut drawing = DrawingContext::new();
        drawing.add_item(triangle()).unwrap();
        drawing.add_item(triangle()).unwrap();
        let mut catalog = ResourceCatalog::new();
        let (text, dump) = drawing.render_debug(&mut catalog, &RenderOptions::default()).unwrap();
        assert_eq!(text, drawing.render(&mut ResourceCatalog::new(), &RenderOptions::default()).unwrap());
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "ROOT");
        assert!(lines[1].starts_with(" ├─ GraphicsContext"));
        assert!(lines.iter().any(|l| l.starts_with(" │   ├─ Move(")));
        assert!(lines.iter().any(|l| l.starts_with(" └─ GraphicsContext")));
        assert!(lines.iter().any(|l| l.starts_with("     └─ ")));
    }
}
