//! Compositing operations and soft masks.
//!
//! PDF has no Porter-Duff operators, so a [`PaintComposite`] expresses each
//! mode as one or two ordinary draws of its operands, some of them clipped by
//! a [`PaintSoftMask`] made from the other operand's coverage.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::bounding_rect::BoundingBox;
use crate::color::color_from_hex_string;
use crate::error::{Error, Result};
use crate::painted_path::PaintedPath;
use crate::path_element::PathElement;
use crate::pdf_primitive::{Name, PdfSerialize};
use crate::point::Point;
use crate::resources::{resource_dictionary, ResourceRegistry, ResourceType};
use crate::style::{coerce, GraphicsStyle, PathPaintRule};

// ============================================================================
// CompositingOperation
// ============================================================================

/// Porter-Duff compositing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositingOperation {
    Clear,
    Source,
    Destination,
    SourceOver,
    DestinationOver,
    SourceIn,
    DestinationIn,
    SourceOut,
    DestinationOut,
    SourceAtop,
    DestinationAtop,
    Xor,
    Lighter,
}

impl CompositingOperation {
    pub const ALL: [CompositingOperation; 13] = [
        CompositingOperation::Clear,
        CompositingOperation::Source,
        CompositingOperation::Destination,
        CompositingOperation::SourceOver,
        CompositingOperation::DestinationOver,
        CompositingOperation::SourceIn,
        CompositingOperation::DestinationIn,
        CompositingOperation::SourceOut,
        CompositingOperation::DestinationOut,
        CompositingOperation::SourceAtop,
        CompositingOperation::DestinationAtop,
        CompositingOperation::Xor,
        CompositingOperation::Lighter,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CompositingOperation::Clear => "clear",
            CompositingOperation::Source => "source",
            CompositingOperation::Destination => "destination",
            CompositingOperation::SourceOver => "source_over",
            CompositingOperation::DestinationOver => "destination_over",
            CompositingOperation::SourceIn => "source_in",
            CompositingOperation::DestinationIn => "destination_in",
            CompositingOperation::SourceOut => "source_out",
            CompositingOperation::DestinationOut => "destination_out",
            CompositingOperation::SourceAtop => "source_atop",
            CompositingOperation::DestinationAtop => "destination_atop",
            CompositingOperation::Xor => "xor",
            CompositingOperation::Lighter => "lighter",
        }
    }

    pub fn value(&self) -> &'static str {
        match self {
            CompositingOperation::Clear => "Clear",
            CompositingOperation::Source => "Source",
            CompositingOperation::Destination => "Destination",
            CompositingOperation::SourceOver => "SourceOver",
            CompositingOperation::DestinationOver => "DestinationOver",
            CompositingOperation::SourceIn => "SourceIn",
            CompositingOperation::DestinationIn => "DestinationIn",
            CompositingOperation::SourceOut => "SourceOut",
            CompositingOperation::DestinationOut => "DestinationOut",
            CompositingOperation::SourceAtop => "SourceAtop",
            CompositingOperation::DestinationAtop => "DestinationAtop",
            CompositingOperation::Xor => "Xor",
            CompositingOperation::Lighter => "Lighter",
        }
    }

    /// Draw steps for the mode, `None` when it has no PDF rendition.
    fn steps(&self) -> Option<&'static [Step]> {
        Some(match self {
            CompositingOperation::Clear => &[],
            CompositingOperation::SourceOver => SOURCE_OVER,
            CompositingOperation::DestinationOver => DESTINATION_OVER,
            CompositingOperation::SourceIn => SOURCE_IN,
            CompositingOperation::DestinationIn => DESTINATION_IN,
            CompositingOperation::SourceOut => SOURCE_OUT,
            CompositingOperation::DestinationOut => DESTINATION_OUT,
            CompositingOperation::SourceAtop => SOURCE_ATOP,
            CompositingOperation::DestinationAtop => DESTINATION_ATOP,
            CompositingOperation::Xor => XOR,
            CompositingOperation::Source | CompositingOperation::Destination | CompositingOperation::Lighter => {
                return None
            }
        })
    }
}

impl FromStr for CompositingOperation {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce(
            "CompositingOperation",
            s,
            &Self::ALL,
            CompositingOperation::name,
            CompositingOperation::value,
        )
    }
}

impl std::fmt::Display for CompositingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompositingOperation.{}", self.name().to_uppercase())
    }
}

#[derive(Debug, Clone, Copy)]
enum Operand {
    Backdrop,
    Source,
}

/// Draw one operand, optionally through a mask made from the other.
#[derive(Debug, Clone, Copy)]
struct Step {
    draw: Operand,
    mask_from: Option<Operand>,
    invert: bool,
}

const fn plain(draw: Operand) -> Step {
    Step { draw, mask_from: None, invert: false }
}

const fn masked(draw: Operand, mask_from: Operand, invert: bool) -> Step {
    Step { draw, mask_from: Some(mask_from), invert }
}

use Operand::{Backdrop, Source};

const SOURCE_OVER: &[Step] = &[plain(Backdrop), plain(Source)];
const DESTINATION_OVER: &[Step] = &[plain(Source), plain(Backdrop)];
const SOURCE_IN: &[Step] = &[masked(Source, Backdrop, false)];
const DESTINATION_IN: &[Step] = &[masked(Backdrop, Source, false)];
const SOURCE_OUT: &[Step] = &[masked(Source, Backdrop, true)];
const DESTINATION_OUT: &[Step] = &[masked(Backdrop, Source, true)];
const SOURCE_ATOP: &[Step] = &[masked(Backdrop, Source, true), masked(Source, Backdrop, false)];
const DESTINATION_ATOP: &[Step] = &[masked(Source, Backdrop, true), masked(Backdrop, Source, false)];
const XOR: &[Step] = &[masked(Source, Backdrop, true), masked(Backdrop, Source, true)];

// ============================================================================
// PaintSoftMask
// ============================================================================

const INVERT_TRANSFER: &str =
    " /TR <</FunctionType 2 /Domain [0 1] /Range [0 1] /C0 [1] /C1 [0] /N 1>>";

/// Alpha soft mask drawn from a path's coverage.
///
/// The mask path is a private copy painted solid white with a nonzero fill.
/// Its form is rendered once, when the mask is first registered; the object
/// id and the resources the form uses are recorded then.
///
/// Two masks are equal only when they are the same object.
#[derive(Debug)]
pub struct PaintSoftMask {
    mask_path: PaintedPath,
    invert: bool,
    resources: OnceLock<Vec<(ResourceType, Name)>>,
    object_id: OnceLock<u32>,
}

impl PaintSoftMask {
    pub fn new(mask_path: &PaintedPath, invert: bool) -> Result<Self> {
        let mut mask_path = mask_path.try_clone()?;
        let style = mask_path.style_mut();
        style.set_paint_rule(PathPaintRule::FillNonzero);
        style.set_fill_opacity(1.0)?;
        style.set_fill_color(color_from_hex_string("#ffffff")?);
        style.set_allow_transparency(false);
        Ok(Self {
            mask_path,
            invert,
            resources: OnceLock::new(),
            object_id: OnceLock::new(),
        })
    }

    pub fn mask_path(&self) -> &PaintedPath {
        &self.mask_path
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Object id of the registered form, if any.
    pub fn object_id(&self) -> Option<u32> {
        self.object_id.get().copied()
    }

    /// Record the form's object id. Only the first id sticks.
    pub fn set_object_id(&self, id: u32) {
        if self.object_id.set(id).is_err() {
            log::trace!("soft mask already registered, ignoring object id {id}");
        }
    }

    /// Bounding box of the mask path drawn from the origin.
    pub fn get_bounding_box(&self) -> (f64, f64, f64, f64) {
        let (bbox, _) = self.mask_path.bounding_box(Point::origin());
        bbox.to_tuple()
    }

    /// Resource dictionary for the rendered form.
    pub fn get_resource_dictionary(&self, registry: &dyn ResourceRegistry) -> Result<String> {
        let refs = self.resources.get().map(Vec::as_slice).unwrap_or(&[]);
        if let Some((_, name)) = refs.iter().find(|(kind, name)| registry.object_id(*kind, name).is_none()) {
            return Err(Error::UnknownResource(name.to_string()));
        }
        Ok(resource_dictionary(refs, |kind, name| registry.object_id(kind, name)))
    }

    /// Render the mask path's content stream, recording what it refers to.
    pub fn render(&self, registry: &mut dyn ResourceRegistry) -> Result<String> {
        let origin = Point::origin();
        let (stream, _, _) = self.mask_path.render(
            registry,
            self.mask_path.style(),
            &PathElement::Move(origin),
            origin,
            None,
            "",
        )?;
        let refs = registry.scan_stream(&stream);
        if self.resources.set(refs).is_err() {
            log::trace!("soft mask rendered again, keeping first resource list");
        }
        Ok(stream)
    }
}

impl PdfSerialize for PaintSoftMask {
    fn serialize(&self) -> String {
        let transfer = if self.invert { INVERT_TRANSFER } else { "" };
        format!("<</S /Alpha /G {} 0 R{transfer}>>", self.object_id().unwrap_or(0))
    }
}

impl PartialEq for PaintSoftMask {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

// ============================================================================
// PaintComposite
// ============================================================================

/// Two painted paths combined with a compositing operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintComposite {
    backdrop: PaintedPath,
    source: PaintedPath,
    mode: CompositingOperation,
}

impl PaintComposite {
    /// Fails with [`Error::Unsupported`] for modes with no PDF rendition.
    pub fn new(backdrop: PaintedPath, source: PaintedPath, mode: CompositingOperation) -> Result<Self> {
        if mode.steps().is_none() {
            return Err(Error::Unsupported(format!("compositing mode '{}'", mode.value())));
        }
        Ok(Self { backdrop, source, mode })
    }

    pub fn mode(&self) -> CompositingOperation {
        self.mode
    }

    pub fn backdrop(&self) -> &PaintedPath {
        &self.backdrop
    }

    pub fn source(&self) -> &PaintedPath {
        &self.source
    }

    fn pick(&self, operand: Operand) -> &PaintedPath {
        match operand {
            Operand::Backdrop => &self.backdrop,
            Operand::Source => &self.source,
        }
    }

    /// Union of both operands' boxes. The point returned is where the
    /// source leaves off.
    pub fn bounding_box(&self, start: Point) -> (BoundingBox, Point) {
        let (backdrop, _) = self.backdrop.bounding_box(start);
        let (source, end) = self.source.bounding_box(start);
        (backdrop.merge(&source), end)
    }

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
            out.push_str(&format!("{pfx}<PaintComposite mode={}>\n", self.mode));
        }
        let steps = self.mode.steps().unwrap_or(&[]);
        let mut last_item = *last_item;
        let mut initial_point = initial_point;
        let mut parts = Vec::with_capacity(steps.len());
        for step in steps {
            let drawn = self.pick(step.draw);
            let masked;
            let path = match step.mask_from {
                Some(from) => {
                    let mut copy = drawn.try_clone()?;
                    let mask = PaintSoftMask::new(self.pick(from), step.invert)?;
                    copy.style_mut().set_soft_mask(Arc::new(mask));
                    masked = copy;
                    &masked
                }
                None => drawn,
            };
            let (text, last, initial) =
                path.render(registry, style, &last_item, initial_point, debug.as_deref_mut(), pfx)?;
            last_item = last;
            initial_point = initial;
            parts.push(text);
        }
        Ok((parts.join(" "), last_item, initial_point))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DeviceRGB;
    use crate::resources::ResourceCatalog;

    fn square(x: f64, y: f64) -> PaintedPath {
        let mut path = PaintedPath::new(x, y);
        path.rectangle(x, y, 10.0, 10.0, 0.0, 0.0);
        path.style_mut().set_paint_rule(PathPaintRule::FillNonzero);
        path.style_mut().set_fill_color(DeviceRGB::new(1.0, 0.0, 0.0).unwrap());
        path
    }

    #[test]
    fn test_operation_from_str() {
        assert_eq!("source_over".parse::<CompositingOperation>().unwrap(), CompositingOperation::SourceOver);
        assert_eq!("SourceAtop".parse::<CompositingOperation>().unwrap(), CompositingOperation::SourceAtop);
        assert_eq!("XOR".parse::<CompositingOperation>().unwrap(), CompositingOperation::Xor);
        assert!("nope".parse::<CompositingOperation>().is_err());
    }

    #[test]
    fn test_unsupported_mode() {
        let err = PaintComposite::new(square(0.0, 0.0), square(5.0, 5.0), CompositingOperation::Lighter);
        assert!(matches!(err, Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_clear_renders_nothing() {
        let composite =
            PaintComposite::new(square(0.0, 0.0), square(5.0, 5.0), CompositingOperation::Clear).unwrap();
        let mut catalog = ResourceCatalog::new();
        let origin = Point::origin();
        let (text, last, _) = composite
            .render(&mut catalog, &GraphicsStyle::new(), &PathElement::Move(origin), origin, None, "")
            .unwrap();
        assert_eq!(text, "");
        assert_eq!(last, PathElement::Move(origin));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_source_over_draws_both_in_order() {
        let backdrop = square(0.0, 0.0);
        let source = square(5.0, 5.0);
        let composite = PaintComposite::new(backdrop, source, CompositingOperation::SourceOver).unwrap();
        let mut catalog = ResourceCatalog::new();
        let origin = Point::origin();
        let (text, _, _) = composite
            .render(&mut catalog, &GraphicsStyle::new(), &PathElement::Move(origin), origin, None, "")
            .unwrap();
        let first = text.find("0 0 10 10 re").unwrap();
        let second = text.find("5 5 10 10 re").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_source_in_registers_mask() {
        let composite =
            PaintComposite::new(square(0.0, 0.0), square(5.0, 5.0), CompositingOperation::SourceIn).unwrap();
        let mut catalog = ResourceCatalog::new();
        let origin = Point::origin();
        let (text, _, _) = composite
            .render(&mut catalog, &GraphicsStyle::new(), &PathElement::Move(origin), origin, None, "")
            .unwrap();
        assert!(text.contains("/GS1 gs"));
        assert!(text.contains("5 5 10 10 re"));
        assert!(!text.contains("0 0 10 10 re"));
        let form = catalog.objects().find(|(_, body)| body.contains("/Subtype /Form")).unwrap();
        assert!(form.1.contains("/BBox [0 0 10 10]"));
        assert!(form.1.contains("0 0 10 10 re"));
        let gs = catalog.objects().find(|(_, body)| body.contains("/SMask")).unwrap();
        assert!(gs.1.contains(&format!("/SMask <</S /Alpha /G {} 0 R>>", form.0)));
    }

    #[test]
    fn test_soft_mask_serialize_invert() {
        let mask = PaintSoftMask::new(&square(0.0, 0.0), true).unwrap();
        mask.set_object_id(7);
        mask.set_object_id(9);
        assert_eq!(
            mask.serialize(),
            "<</S /Alpha /G 7 0 R /TR <</FunctionType 2 /Domain [0 1] /Range [0 1] /C0 [1] /C1 [0] /N 1>>>>"
        );
        assert_eq!(mask.get_bounding_box(), (0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_soft_mask_identity_equality() {
        let a = PaintSoftMask::new(&square(0.0, 0.0), false).unwrap();
        let b = PaintSoftMask::new(&square(0.0, 0.0), false).unwrap();
        assert_eq!(a, a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_bounding_box_is_union() {
        let composite =
            PaintComposite::new(square(0.0, 0.0), square(5.0, 5.0), CompositingOperation::Xor).unwrap();
        let (bbox, _) = composite.bounding_box(Point::origin());
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 15.0, 15.0));
    }
}
