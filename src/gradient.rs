//! Axial and radial gradients.
//!
//! A [`Gradient`] holds color stops normalized to one device color space.
//! Registering it produces the PDF objects behind a shading: one Type 2
//! (exponential) function per pair of adjacent stops, stitched by a Type 3
//! function when there are more than two stops. Stops carrying alpha also
//! get a parallel gray ramp that can drive a soft mask.
//!
//! [`GradientPaint`] is what a style holds as a fill or stroke: the gradient
//! plus the coordinate system its geometry is expressed in.

use std::fmt;
use std::str::FromStr;

use crate::basics::{format_number, join_numbers};
use crate::bounding_rect::BoundingBox;
use crate::color::{DeviceColor, DeviceGray, DeviceRGB};
use crate::error::{Error, Result};
use crate::pdf_primitive::Name;
use crate::resources::{ResourceRegistry, ResourceType};
use crate::style::coerce;
use crate::trans_affine::Transform;

/// Offsets closer than this are one stop.
const STOP_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Functions
// ============================================================================

/// A PDF function over the domain `[0 1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfFunction {
    /// Type 2: linear interpolation from `c0` to `c1`.
    Exponential { c0: Vec<f64>, c1: Vec<f64> },
    /// Type 3: the preceding functions stitched together at `bounds`.
    Stitching { bounds: Vec<f64> },
}

impl PdfFunction {
    /// Dictionary text. A stitching function refers to the objects in
    /// `previous`, one per stitched segment.
    pub fn serialize(&self, previous: &[u32]) -> String {
        match self {
            PdfFunction::Exponential { c0, c1 } => format!(
                "<</FunctionType 2 /Domain [0 1] /C0 [{}] /C1 [{}] /N 1>>",
                join_numbers(c0, format_number),
                join_numbers(c1, format_number),
            ),
            PdfFunction::Stitching { bounds } => {
                let functions = previous
                    .iter()
                    .map(|id| format!("{id} 0 R"))
                    .collect::<Vec<_>>()
                    .join(" ");
                let encode = vec!["0 1"; previous.len()].join(" ");
                format!(
                    "<</FunctionType 3 /Domain [0 1] /Functions [{functions}] /Bounds [{}] /Encode [{encode}]>>",
                    join_numbers(bounds, format_number),
                )
            }
        }
    }
}

/// Chain of exponential functions between consecutive values, stitched
/// when there are more than two.
fn function_chain(values: &[Vec<f64>], bounds: &[f64]) -> Vec<PdfFunction> {
    let mut functions: Vec<PdfFunction> = values
        .windows(2)
        .map(|pair| PdfFunction::Exponential {
            c0: pair[0].clone(),
            c1: pair[1].clone(),
        })
        .collect();
    if functions.len() > 1 {
        functions.push(PdfFunction::Stitching {
            bounds: bounds.to_vec(),
        });
    }
    functions
}

/// Register a function chain, returning the id of the last function.
fn register_functions(functions: &[PdfFunction], registry: &mut dyn ResourceRegistry) -> u32 {
    let mut ids: Vec<u32> = Vec::with_capacity(functions.len());
    for function in functions {
        let id = registry.add_object(function.serialize(&ids));
        ids.push(id);
    }
    ids.last().copied().unwrap_or(0)
}

// ============================================================================
// Gradient
// ============================================================================

/// Geometry of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientGeometry {
    /// Axial, from one point to another.
    Linear { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Between a start circle and an end circle.
    Radial {
        fx: f64,
        fy: f64,
        fr: f64,
        cx: f64,
        cy: f64,
        r: f64,
    },
}

impl GradientGeometry {
    /// PDF shading type.
    pub fn shading_type(&self) -> u8 {
        match self {
            GradientGeometry::Linear { .. } => 2,
            GradientGeometry::Radial { .. } => 3,
        }
    }

    pub fn coords(&self) -> Vec<f64> {
        match *self {
            GradientGeometry::Linear { x1, y1, x2, y2 } => vec![x1, y1, x2, y2],
            GradientGeometry::Radial {
                fx,
                fy,
                fr,
                cx,
                cy,
                r,
            } => vec![fx, fy, fr, cx, cy, r],
        }
    }
}

/// Color stops over a gradient geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    geometry: GradientGeometry,
    color_space: &'static str,
    colors: Vec<DeviceColor>,
    alphas: Vec<f64>,
    background: Option<DeviceColor>,
    extend_before: bool,
    extend_after: bool,
    bounds: Vec<f64>,
}

impl Gradient {
    /// Gradient with evenly spaced colors and no extension.
    ///
    /// Fails with fewer than two colors or when CMYK is mixed with another
    /// color space.
    pub fn new(geometry: GradientGeometry, colors: &[DeviceColor]) -> Result<Self> {
        let (color_space, colors, alphas) = normalize_colors(colors)?;
        let n = colors.len();
        let bounds = (0..n - 2).map(|i| (i + 1) as f64 / (n - 1) as f64).collect();
        Ok(Self {
            geometry,
            color_space,
            colors,
            alphas,
            background: None,
            extend_before: false,
            extend_after: false,
            bounds,
        })
    }

    pub fn linear(x1: f64, y1: f64, x2: f64, y2: f64, colors: &[DeviceColor]) -> Result<Self> {
        Self::new(GradientGeometry::Linear { x1, y1, x2, y2 }, colors)
    }

    /// Radial gradient from the circle `(fx, fy, fr)` to `(cx, cy, r)`.
    pub fn radial(
        fx: f64,
        fy: f64,
        fr: f64,
        cx: f64,
        cy: f64,
        r: f64,
        colors: &[DeviceColor],
    ) -> Result<Self> {
        Self::new(
            GradientGeometry::Radial {
                fx,
                fy,
                fr,
                cx,
                cy,
                r,
            },
            colors,
        )
    }

    /// Stitching bounds; there must be two fewer than colors.
    pub fn with_bounds(mut self, bounds: Vec<f64>) -> Result<Self> {
        if bounds.len() + 2 != self.colors.len() {
            return Err(Error::GradientBounds {
                bounds: bounds.len(),
                colors: self.colors.len(),
            });
        }
        self.bounds = bounds;
        Ok(self)
    }

    /// Color painted outside the shading's extent, converted to the
    /// gradient's color space.
    pub fn with_background(mut self, background: DeviceColor) -> Result<Self> {
        let background = match (self.color_space, background) {
            ("DeviceCMYK", bg @ DeviceColor::Cmyk(_)) => bg,
            ("DeviceCMYK", _) | (_, DeviceColor::Cmyk(_)) => return Err(Error::MixedColorSpaces),
            ("DeviceGray", DeviceColor::Rgb(c)) => c.to_gray().into(),
            ("DeviceRGB", DeviceColor::Gray(c)) => c.to_rgb().into(),
            (_, bg) => bg,
        };
        self.background = Some(background);
        Ok(self)
    }

    pub fn with_extend(mut self, before: bool, after: bool) -> Self {
        self.extend_before = before;
        self.extend_after = after;
        self
    }

    pub fn geometry(&self) -> &GradientGeometry {
        &self.geometry
    }

    pub fn color_space(&self) -> &'static str {
        self.color_space
    }

    pub fn colors(&self) -> &[DeviceColor] {
        &self.colors
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn background(&self) -> Option<&DeviceColor> {
        self.background.as_ref()
    }

    pub fn extend(&self) -> (bool, bool) {
        (self.extend_before, self.extend_after)
    }

    /// Whether any stop is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.alphas.iter().any(|a| (a - 1.0).abs() > STOP_TOLERANCE)
    }

    /// Color functions, the last one being the shading's function.
    pub fn functions(&self) -> Vec<PdfFunction> {
        let values: Vec<Vec<f64>> = self.colors.iter().map(DeviceColor::components).collect();
        function_chain(&values, &self.bounds)
    }

    /// Gray functions ramping the stop alphas, if any stop has alpha.
    pub fn alpha_functions(&self) -> Option<Vec<PdfFunction>> {
        if !self.has_alpha() {
            return None;
        }
        let values: Vec<Vec<f64>> = self.alphas.iter().map(|&a| vec![a]).collect();
        Some(function_chain(&values, &self.bounds))
    }

    /// Shading dictionary whose function is object `function_id`.
    pub fn shading_dictionary(&self, function_id: u32) -> String {
        let background = self
            .background
            .map(|bg| format!(" /Background [{}]", join_numbers(&bg.components(), format_number)))
            .unwrap_or_default();
        format!(
            "<</ShadingType {}{background} /ColorSpace /{} /Coords [{}] /Function {function_id} 0 R /Extend [{} {}] /AntiAlias true>>",
            self.geometry.shading_type(),
            self.color_space,
            join_numbers(&self.geometry.coords(), format_number),
            self.extend_before,
            self.extend_after,
        )
    }

    /// Gray shading over the same geometry carrying the stop alphas.
    pub fn alpha_shading_dictionary(&self, function_id: u32) -> Option<String> {
        if !self.has_alpha() {
            return None;
        }
        Some(format!(
            "<</ShadingType {} /ColorSpace /DeviceGray /Coords [{}] /Function {function_id} 0 R /Extend [false false] /AntiAlias true>>",
            self.geometry.shading_type(),
            join_numbers(&self.geometry.coords(), format_number),
        ))
    }

    /// Register the functions and the shading, returning the shading's name.
    pub fn register_shading(&self, registry: &mut dyn ResourceRegistry) -> Name {
        let function_id = register_functions(&self.functions(), registry);
        registry.add(ResourceType::Shading, self.shading_dictionary(function_id), None)
    }

    /// Register the alpha ramp shading, if the gradient has one.
    pub fn register_alpha_shading(&self, registry: &mut dyn ResourceRegistry) -> Option<Name> {
        let functions = self.alpha_functions()?;
        let function_id = register_functions(&functions, registry);
        let body = self.alpha_shading_dictionary(function_id)?;
        Some(registry.add(ResourceType::Shading, body, None))
    }
}

/// Convert `colors` to one color space.
///
/// Gray mixed with RGB is promoted to RGB; RGB where every color is
/// achromatic becomes gray. Missing alphas count as opaque.
fn normalize_colors(colors: &[DeviceColor]) -> Result<(&'static str, Vec<DeviceColor>, Vec<f64>)> {
    if colors.len() < 2 {
        return Err(Error::GradientColors("a gradient must have at least two colors"));
    }
    let alphas: Vec<f64> = colors.iter().map(|c| c.alpha().unwrap_or(1.0)).collect();
    let cmyk = colors.iter().filter(|c| matches!(c, DeviceColor::Cmyk(_))).count();
    let gray = colors.iter().filter(|c| matches!(c, DeviceColor::Gray(_))).count();
    let rgb = colors.len() - cmyk - gray;

    if cmyk > 0 {
        if cmyk != colors.len() {
            return Err(Error::MixedColorSpaces);
        }
        return Ok(("DeviceCMYK", colors.to_vec(), alphas));
    }
    if rgb == 0 {
        return Ok(("DeviceGray", colors.to_vec(), alphas));
    }
    let as_rgb: Vec<DeviceRGB> = colors
        .iter()
        .filter_map(|c| match c {
            DeviceColor::Rgb(c) => Some(*c),
            DeviceColor::Gray(c) => Some(c.to_rgb()),
            DeviceColor::Cmyk(_) => None,
        })
        .collect();
    if gray == 0 && as_rgb.iter().all(DeviceRGB::is_achromatic) {
        let grays = as_rgb.iter().map(|c| DeviceColor::from(c.to_gray())).collect();
        return Ok(("DeviceGray", grays, alphas));
    }
    Ok(("DeviceRGB", as_rgb.into_iter().map(DeviceColor::from).collect(), alphas))
}

// ============================================================================
// Stop normalization
// ============================================================================

/// Clamp, sort and deduplicate stops, then make sure they cover `[0, 1]`.
///
/// Equal offsets keep the last stop given. A single stop becomes a flat
/// two-stop ramp.
fn normalize_stops(stops: &[(f64, DeviceColor)]) -> Result<Vec<(f64, DeviceColor)>> {
    if stops.is_empty() {
        return Err(Error::GradientColors("at least one stop is required"));
    }
    let mut sorted: Vec<(f64, DeviceColor)> =
        stops.iter().map(|&(offset, color)| (offset.clamp(0.0, 1.0), color)).collect();
    // stable, so ties keep input order
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, DeviceColor)> = Vec::with_capacity(sorted.len());
    for stop in sorted {
        match merged.last_mut() {
            Some(last) if (last.0 - stop.0).abs() <= STOP_TOLERANCE => *last = stop,
            _ => merged.push(stop),
        }
    }

    if let [(_, color)] = merged[..] {
        return Ok(vec![(0.0, color), (1.0, color)]);
    }
    if let Some(&(offset, color)) = merged.first() {
        if offset.abs() > STOP_TOLERANCE {
            merged.insert(0, (0.0, color));
        }
    }
    if let Some(&(offset, color)) = merged.last() {
        if (offset - 1.0).abs() > STOP_TOLERANCE {
            merged.push((1.0, color));
        }
    }
    Ok(merged)
}

fn split_stops(stops: Vec<(f64, DeviceColor)>) -> (Vec<DeviceColor>, Vec<f64>) {
    let bounds = stops[1..stops.len() - 1].iter().map(|s| s.0).collect();
    let colors = stops.into_iter().map(|s| s.1).collect();
    (colors, bounds)
}

/// Extended linear gradient from SVG-style `(offset, color)` stops.
pub fn shape_linear_gradient(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    stops: &[(f64, DeviceColor)],
) -> Result<Gradient> {
    let (colors, bounds) = split_stops(normalize_stops(stops)?);
    Ok(Gradient::linear(x1, y1, x2, y2, &colors)?
        .with_bounds(bounds)?
        .with_extend(true, true))
}

/// Extended radial gradient from SVG-style stops.
///
/// The focal circle defaults to the center; its radius is clamped to
/// `[0, r]`.
pub fn shape_radial_gradient(
    cx: f64,
    cy: f64,
    r: f64,
    stops: &[(f64, DeviceColor)],
    focal: Option<(f64, f64)>,
    fr: f64,
) -> Result<Gradient> {
    let (colors, bounds) = split_stops(normalize_stops(stops)?);
    if r < 0.0 {
        return Err(Error::NegativeRadius(r));
    }
    let (fx, fy) = focal.unwrap_or((cx, cy));
    let fr = fr.max(0.0).min(r);
    Ok(Gradient::radial(fx, fy, fr, cx, cy, r, &colors)?
        .with_bounds(bounds)?
        .with_extend(true, true))
}

// ============================================================================
// GradientPaint
// ============================================================================

/// Coordinate system of a gradient's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GradientUnits {
    /// The user space of the painted shape.
    #[default]
    UserSpaceOnUse,
    /// The unit square mapped onto the shape's bounding box.
    ObjectBoundingBox,
}

impl GradientUnits {
    pub const ALL: [GradientUnits; 2] = [GradientUnits::UserSpaceOnUse, GradientUnits::ObjectBoundingBox];

    pub fn name(&self) -> &'static str {
        match self {
            GradientUnits::UserSpaceOnUse => "user_space_on_use",
            GradientUnits::ObjectBoundingBox => "object_bounding_box",
        }
    }

    /// The SVG attribute value.
    pub fn value(&self) -> &'static str {
        match self {
            GradientUnits::UserSpaceOnUse => "userSpaceOnUse",
            GradientUnits::ObjectBoundingBox => "objectBoundingBox",
        }
    }
}

impl FromStr for GradientUnits {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce("gradient units", s, &Self::ALL, Self::name, Self::value)
    }
}

/// A gradient used as a fill or stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientPaint {
    pub gradient: Gradient,
    pub units: GradientUnits,
    pub gradient_transform: Transform,
}

impl GradientPaint {
    pub fn new(gradient: Gradient, units: GradientUnits, gradient_transform: Option<Transform>) -> Self {
        Self {
            gradient,
            units,
            gradient_transform: gradient_transform.unwrap_or_default(),
        }
    }

    /// Pattern matrix for a shape with bounding box `bbox`.
    pub fn matrix_for(&self, bbox: Option<&BoundingBox>) -> Result<Transform> {
        match self.units {
            GradientUnits::UserSpaceOnUse => Ok(self.gradient_transform),
            GradientUnits::ObjectBoundingBox => {
                let bbox = bbox.filter(|b| b.is_valid()).ok_or(Error::MissingBoundingBox)?;
                let unit_to_bbox = Transform::new(bbox.width(), 0.0, 0.0, bbox.height(), bbox.x0, bbox.y0);
                Ok(self.gradient_transform * unit_to_bbox)
            }
        }
    }

    fn register_pattern(&self, registry: &mut dyn ResourceRegistry, matrix: &Transform) -> Result<Name> {
        let shading = self.gradient.register_shading(registry);
        let shading_id = registry
            .object_id(ResourceType::Shading, &shading)
            .ok_or_else(|| Error::UnknownResource(shading.to_string()))?;
        let body = format!(
            "<</Type /Pattern /PatternType 2 /Shading {shading_id} 0 R /Matrix [{}]>>",
            join_numbers(&matrix.to_array(), format_number),
        );
        Ok(registry.add(ResourceType::Pattern, body, None))
    }

    /// Select the pattern as the fill color.
    pub fn emit_fill(&self, registry: &mut dyn ResourceRegistry, bbox: Option<&BoundingBox>) -> Result<String> {
        let matrix = self.matrix_for(bbox)?;
        let pattern = self.register_pattern(registry, &matrix)?;
        Ok(format!("/Pattern cs /{pattern} scn"))
    }

    /// Select the pattern as the stroke color.
    pub fn emit_stroke(&self, registry: &mut dyn ResourceRegistry, bbox: Option<&BoundingBox>) -> Result<String> {
        let matrix = self.matrix_for(bbox)?;
        let pattern = self.register_pattern(registry, &matrix)?;
        Ok(format!("/Pattern CS /{pattern} SCN"))
    }
}

impl fmt::Display for GradientPaint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GradientPaint(type={}, stops={}, units={})",
            self.gradient.geometry.shading_type(),
            self.gradient.colors.len(),
            self.units.value(),
        )
    }
}

impl From<Gradient> for GradientPaint {
    fn from(gradient: Gradient) -> Self {
        Self::new(gradient, GradientUnits::UserSpaceOnUse, None)
    }
}

// ============================================================================
// Tests
// ============================================================================
