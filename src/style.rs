//! Graphics style: a sparse, inheritable record of paint state.
//!
//! Each property is a [`StyleValue`]: a concrete value, explicitly
//! [`StyleValue::Unset`], or [`StyleValue::Inherit`] (take the parent's
//! value). Styles compose top-down through [`GraphicsStyle::merge`], and the
//! subset that PDF keeps in a graphics state parameter dictionary is emitted
//! by [`GraphicsStyle::serialize`].

use std::str::FromStr;
use std::sync::Arc;

use crate::basics::{check_unit, number_to_str};
use crate::color::{DeviceCMYK, DeviceColor, DeviceGray, DeviceRGB};
use crate::comp_op::PaintSoftMask;
use crate::error::{Error, Result};
use crate::gradient::GradientPaint;
use crate::pdf_primitive::{render_pdf_primitive, Name, PdfPrimitive, PdfSerialize};

// ============================================================================
// StyleValue
// ============================================================================

/// Tri-state style property.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue<T> {
    /// Use whatever the enclosing context has.
    Inherit,
    /// Explicitly no value.
    Unset,
    Value(T),
}

impl<T> StyleValue<T> {
    pub fn is_inherit(&self) -> bool {
        matches!(self, StyleValue::Inherit)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, StyleValue::Unset)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            StyleValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> StyleValue<&T> {
        match self {
            StyleValue::Inherit => StyleValue::Inherit,
            StyleValue::Unset => StyleValue::Unset,
            StyleValue::Value(v) => StyleValue::Value(v),
        }
    }
}

impl<T: Clone> StyleValue<T> {
    /// `self` unless it is `Inherit`, in which case `parent`.
    pub fn or_inherit(&self, parent: &StyleValue<T>) -> StyleValue<T> {
        match self {
            StyleValue::Inherit => parent.clone(),
            other => other.clone(),
        }
    }
}

impl<T> Default for StyleValue<T> {
    fn default() -> Self {
        StyleValue::Inherit
    }
}

impl<T> From<T> for StyleValue<T> {
    fn from(v: T) -> Self {
        StyleValue::Value(v)
    }
}

impl<T: std::fmt::Debug> std::fmt::Display for StyleValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleValue::Inherit => f.write_str("INHERIT"),
            StyleValue::Unset => f.write_str("None"),
            StyleValue::Value(v) => write!(f, "{v:?}"),
        }
    }
}

// ============================================================================
// Keyword enums
// ============================================================================

/// Look `s` up by operator/value (exact) first, then by name (any case).
pub(crate) fn coerce<T: Copy>(
    kind: &'static str,
    s: &str,
    all: &[T],
    name: fn(&T) -> &'static str,
    value: fn(&T) -> &'static str,
) -> Result<T> {
    all.iter()
        .find(|v| value(v) == s)
        .or_else(|| all.iter().find(|v| name(v).eq_ignore_ascii_case(s)))
        .copied()
        .ok_or_else(|| Error::UnknownKeyword {
            kind,
            value: s.to_string(),
        })
}

/// How a path is painted: the operator appended after its segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathPaintRule {
    Stroke,
    FillNonzero,
    FillEvenodd,
    StrokeFillNonzero,
    StrokeFillEvenodd,
    DontPaint,
    /// Pick from the style's fill and stroke state at render time.
    Auto,
}

impl PathPaintRule {
    pub const ALL: [PathPaintRule; 7] = [
        PathPaintRule::Stroke,
        PathPaintRule::FillNonzero,
        PathPaintRule::FillEvenodd,
        PathPaintRule::StrokeFillNonzero,
        PathPaintRule::StrokeFillEvenodd,
        PathPaintRule::DontPaint,
        PathPaintRule::Auto,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PathPaintRule::Stroke => "stroke",
            PathPaintRule::FillNonzero => "fill_nonzero",
            PathPaintRule::FillEvenodd => "fill_evenodd",
            PathPaintRule::StrokeFillNonzero => "stroke_fill_nonzero",
            PathPaintRule::StrokeFillEvenodd => "stroke_fill_evenodd",
            PathPaintRule::DontPaint => "dont_paint",
            PathPaintRule::Auto => "auto",
        }
    }

    /// Content stream operator. `Auto` has none and must be resolved first.
    pub fn operator(&self) -> &'static str {
        match self {
            PathPaintRule::Stroke => "S",
            PathPaintRule::FillNonzero => "f",
            PathPaintRule::FillEvenodd => "f*",
            PathPaintRule::StrokeFillNonzero => "B",
            PathPaintRule::StrokeFillEvenodd => "B*",
            PathPaintRule::DontPaint => "n",
            PathPaintRule::Auto => "auto",
        }
    }

    pub fn strokes(&self) -> bool {
        matches!(
            self,
            PathPaintRule::Stroke | PathPaintRule::StrokeFillNonzero | PathPaintRule::StrokeFillEvenodd
        )
    }
}

impl FromStr for PathPaintRule {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce("path paint rule", s, &Self::ALL, Self::name, Self::operator)
    }
}

/// Fill rule used to decide what is inside a self-intersecting path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntersectionRule {
    Nonzero,
    Evenodd,
}

impl IntersectionRule {
    pub const ALL: [IntersectionRule; 2] = [IntersectionRule::Nonzero, IntersectionRule::Evenodd];

    pub fn name(&self) -> &'static str {
        match self {
            IntersectionRule::Nonzero => "nonzero",
            IntersectionRule::Evenodd => "evenodd",
        }
    }
}

impl FromStr for IntersectionRule {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce("intersection rule", s, &Self::ALL, Self::name, Self::name)
    }
}

/// Clipping operator matching an [`IntersectionRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClippingPathIntersectionRule {
    Nonzero,
    Evenodd,
}

impl ClippingPathIntersectionRule {
    pub const ALL: [ClippingPathIntersectionRule; 2] = [
        ClippingPathIntersectionRule::Nonzero,
        ClippingPathIntersectionRule::Evenodd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClippingPathIntersectionRule::Nonzero => "nonzero",
            ClippingPathIntersectionRule::Evenodd => "evenodd",
        }
    }

    pub fn operator(&self) -> &'static str {
        match self {
            ClippingPathIntersectionRule::Nonzero => "W",
            ClippingPathIntersectionRule::Evenodd => "W*",
        }
    }
}

impl From<IntersectionRule> for ClippingPathIntersectionRule {
    fn from(rule: IntersectionRule) -> Self {
        match rule {
            IntersectionRule::Nonzero => ClippingPathIntersectionRule::Nonzero,
            IntersectionRule::Evenodd => ClippingPathIntersectionRule::Evenodd,
        }
    }
}

impl FromStr for ClippingPathIntersectionRule {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce("clipping path intersection rule", s, &Self::ALL, Self::name, Self::operator)
    }
}

/// Line cap style (`/LC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StrokeCapStyle {
    Butt = 0,
    Round = 1,
    Square = 2,
}

impl StrokeCapStyle {
    pub const ALL: [StrokeCapStyle; 3] = [StrokeCapStyle::Butt, StrokeCapStyle::Round, StrokeCapStyle::Square];

    pub fn name(&self) -> &'static str {
        match self {
            StrokeCapStyle::Butt => "butt",
            StrokeCapStyle::Round => "round",
            StrokeCapStyle::Square => "square",
        }
    }
}

impl TryFrom<u8> for StrokeCapStyle {
    type Error = Error;
    fn try_from(v: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| *s as u8 == v)
            .ok_or_else(|| Error::UnknownKeyword {
                kind: "stroke cap style",
                value: v.to_string(),
            })
    }
}

impl FromStr for StrokeCapStyle {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce("stroke cap style", s, &Self::ALL, Self::name, Self::name)
    }
}

/// Line join style (`/LJ`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StrokeJoinStyle {
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

impl StrokeJoinStyle {
    pub const ALL: [StrokeJoinStyle; 3] = [StrokeJoinStyle::Miter, StrokeJoinStyle::Round, StrokeJoinStyle::Bevel];

    pub fn name(&self) -> &'static str {
        match self {
            StrokeJoinStyle::Miter => "miter",
            StrokeJoinStyle::Round => "round",
            StrokeJoinStyle::Bevel => "bevel",
        }
    }
}

impl TryFrom<u8> for StrokeJoinStyle {
    type Error = Error;
    fn try_from(v: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| *s as u8 == v)
            .ok_or_else(|| Error::UnknownKeyword {
                kind: "stroke join style",
                value: v.to_string(),
            })
    }
}

impl FromStr for StrokeJoinStyle {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce("stroke join style", s, &Self::ALL, Self::name, Self::name)
    }
}

/// Separable and non-separable PDF blend modes (`/BM`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub const ALL: [BlendMode; 16] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color_dodge",
            BlendMode::ColorBurn => "color_burn",
            BlendMode::HardLight => "hard_light",
            BlendMode::SoftLight => "soft_light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
        }
    }

    /// PDF name, without the leading slash.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Hue => "Hue",
            BlendMode::Saturation => "Saturation",
            BlendMode::Color => "Color",
            BlendMode::Luminosity => "Luminosity",
        }
    }
}

impl FromStr for BlendMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        coerce("blend mode", s, &Self::ALL, Self::name, Self::pdf_name)
    }
}

// ============================================================================
// Paint
// ============================================================================

/// What a fill or stroke is painted with.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Color(DeviceColor),
    Gradient(GradientPaint),
}

impl Paint {
    pub fn alpha(&self) -> Option<f64> {
        match self {
            Paint::Color(c) => c.alpha(),
            Paint::Gradient(_) => None,
        }
    }
}

impl From<DeviceColor> for Paint {
    fn from(c: DeviceColor) -> Self {
        Paint::Color(c)
    }
}

impl From<DeviceRGB> for Paint {
    fn from(c: DeviceRGB) -> Self {
        Paint::Color(c.into())
    }
}

impl From<DeviceGray> for Paint {
    fn from(c: DeviceGray) -> Self {
        Paint::Color(c.into())
    }
}

impl From<DeviceCMYK> for Paint {
    fn from(c: DeviceCMYK) -> Self {
        Paint::Color(c.into())
    }
}

impl From<GradientPaint> for Paint {
    fn from(g: GradientPaint) -> Self {
        Paint::Gradient(g)
    }
}

impl From<DeviceColor> for StyleValue<Paint> {
    fn from(c: DeviceColor) -> Self {
        StyleValue::Value(c.into())
    }
}

impl From<DeviceRGB> for StyleValue<Paint> {
    fn from(c: DeviceRGB) -> Self {
        StyleValue::Value(c.into())
    }
}

impl From<DeviceGray> for StyleValue<Paint> {
    fn from(c: DeviceGray) -> Self {
        StyleValue::Value(c.into())
    }
}

impl From<DeviceCMYK> for StyleValue<Paint> {
    fn from(c: DeviceCMYK) -> Self {
        StyleValue::Value(c.into())
    }
}

impl From<GradientPaint> for StyleValue<Paint> {
    fn from(g: GradientPaint) -> Self {
        StyleValue::Value(g.into())
    }
}

// ============================================================================
// GraphicsStyle
// ============================================================================

/// Sparse paint state for one level of a drawing tree.
///
/// A fresh style has every property set to `Inherit`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicsStyle {
    paint_rule: StyleValue<PathPaintRule>,
    allow_transparency: StyleValue<bool>,
    auto_close: StyleValue<bool>,
    intersection_rule: StyleValue<IntersectionRule>,
    fill_color: StyleValue<Paint>,
    fill_opacity: StyleValue<f64>,
    stroke_color: StyleValue<Paint>,
    stroke_opacity: StyleValue<f64>,
    blend_mode: StyleValue<BlendMode>,
    stroke_width: StyleValue<f64>,
    stroke_cap_style: StyleValue<StrokeCapStyle>,
    stroke_join_style: StyleValue<StrokeJoinStyle>,
    stroke_miter_limit: StyleValue<f64>,
    stroke_dash_pattern: StyleValue<Vec<f64>>,
    stroke_dash_phase: StyleValue<f64>,
    soft_mask: StyleValue<Arc<PaintSoftMask>>,
}

impl GraphicsStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose `child` over `parent`: each property is the child's unless
    /// the child inherits it.
    ///
    /// Setter side effects (alpha carried by a color, the default stroke
    /// width) never leak here: every property they touch is picked on its
    /// own.
    pub fn merge(parent: &GraphicsStyle, child: &GraphicsStyle) -> GraphicsStyle {
        GraphicsStyle {
            paint_rule: child.paint_rule.or_inherit(&parent.paint_rule),
            allow_transparency: child.allow_transparency.or_inherit(&parent.allow_transparency),
            auto_close: child.auto_close.or_inherit(&parent.auto_close),
            intersection_rule: child.intersection_rule.or_inherit(&parent.intersection_rule),
            fill_color: child.fill_color.or_inherit(&parent.fill_color),
            fill_opacity: child.fill_opacity.or_inherit(&parent.fill_opacity),
            stroke_color: child.stroke_color.or_inherit(&parent.stroke_color),
            stroke_opacity: child.stroke_opacity.or_inherit(&parent.stroke_opacity),
            blend_mode: child.blend_mode.or_inherit(&parent.blend_mode),
            stroke_width: child.stroke_width.or_inherit(&parent.stroke_width),
            stroke_cap_style: child.stroke_cap_style.or_inherit(&parent.stroke_cap_style),
            stroke_join_style: child.stroke_join_style.or_inherit(&parent.stroke_join_style),
            stroke_miter_limit: child.stroke_miter_limit.or_inherit(&parent.stroke_miter_limit),
            stroke_dash_pattern: child.stroke_dash_pattern.or_inherit(&parent.stroke_dash_pattern),
            stroke_dash_phase: child.stroke_dash_phase.or_inherit(&parent.stroke_dash_phase),
            soft_mask: child.soft_mask.or_inherit(&parent.soft_mask),
        }
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    pub fn paint_rule(&self) -> StyleValue<PathPaintRule> {
        self.paint_rule.clone()
    }

    pub fn allow_transparency(&self) -> StyleValue<bool> {
        self.allow_transparency.clone()
    }

    pub fn auto_close(&self) -> StyleValue<bool> {
        self.auto_close.clone()
    }

    /// Whether open subpaths get closed. Only an explicit `false` or
    /// `Unset` turns it off.
    pub fn auto_close_enabled(&self) -> bool {
        !matches!(self.auto_close, StyleValue::Value(false) | StyleValue::Unset)
    }

    pub fn intersection_rule(&self) -> StyleValue<IntersectionRule> {
        self.intersection_rule.clone()
    }

    pub fn fill_color(&self) -> &StyleValue<Paint> {
        &self.fill_color
    }

    pub fn fill_opacity(&self) -> StyleValue<f64> {
        self.fill_opacity.clone()
    }

    pub fn stroke_color(&self) -> &StyleValue<Paint> {
        &self.stroke_color
    }

    pub fn stroke_opacity(&self) -> StyleValue<f64> {
        self.stroke_opacity.clone()
    }

    pub fn blend_mode(&self) -> StyleValue<BlendMode> {
        self.blend_mode.clone()
    }

    pub fn stroke_width(&self) -> StyleValue<f64> {
        self.stroke_width.clone()
    }

    pub fn stroke_cap_style(&self) -> StyleValue<StrokeCapStyle> {
        self.stroke_cap_style.clone()
    }

    pub fn stroke_join_style(&self) -> StyleValue<StrokeJoinStyle> {
        self.stroke_join_style.clone()
    }

    pub fn stroke_miter_limit(&self) -> StyleValue<f64> {
        self.stroke_miter_limit.clone()
    }

    pub fn stroke_dash_pattern(&self) -> &StyleValue<Vec<f64>> {
        &self.stroke_dash_pattern
    }

    pub fn stroke_dash_phase(&self) -> StyleValue<f64> {
        self.stroke_dash_phase.clone()
    }

    pub fn soft_mask(&self) -> &StyleValue<Arc<PaintSoftMask>> {
        &self.soft_mask
    }

    // ------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------

    /// `Unset` means "paint nothing".
    pub fn set_paint_rule(&mut self, rule: impl Into<StyleValue<PathPaintRule>>) {
        self.paint_rule = match rule.into() {
            StyleValue::Unset => StyleValue::Value(PathPaintRule::DontPaint),
            other => other,
        };
    }

    pub fn set_allow_transparency(&mut self, allow: impl Into<StyleValue<bool>>) {
        self.allow_transparency = allow.into();
    }

    pub fn set_auto_close(&mut self, auto_close: impl Into<StyleValue<bool>>) {
        self.auto_close = auto_close.into();
    }

    pub fn set_intersection_rule(&mut self, rule: impl Into<StyleValue<IntersectionRule>>) {
        self.intersection_rule = rule.into();
    }

    /// A color carrying alpha also sets the fill opacity.
    pub fn set_fill_color(&mut self, color: impl Into<StyleValue<Paint>>) {
        self.fill_color = color.into();
        if let Some(a) = self.fill_color.value().and_then(Paint::alpha) {
            self.fill_opacity = StyleValue::Value(a);
        }
    }

    pub fn set_fill_opacity(&mut self, opacity: impl Into<StyleValue<f64>>) -> Result<()> {
        self.fill_opacity = checked_opacity("fill opacity", opacity.into())?;
        Ok(())
    }

    /// A color carrying alpha also sets the stroke opacity. Any color gives
    /// an inherited stroke width a value of 1.
    pub fn set_stroke_color(&mut self, color: impl Into<StyleValue<Paint>>) {
        self.stroke_color = color.into();
        if let StyleValue::Value(paint) = &self.stroke_color {
            if let Some(a) = paint.alpha() {
                self.stroke_opacity = StyleValue::Value(a);
            }
            if self.stroke_width.is_inherit() {
                self.stroke_width = StyleValue::Value(1.0);
            }
        }
    }

    pub fn set_stroke_opacity(&mut self, opacity: impl Into<StyleValue<f64>>) -> Result<()> {
        self.stroke_opacity = checked_opacity("stroke opacity", opacity.into())?;
        Ok(())
    }

    pub fn set_blend_mode(&mut self, mode: impl Into<StyleValue<BlendMode>>) {
        self.blend_mode = mode.into();
    }

    pub fn set_stroke_width(&mut self, width: impl Into<StyleValue<f64>>) {
        self.stroke_width = width.into();
    }

    pub fn set_stroke_cap_style(&mut self, cap: impl Into<StyleValue<StrokeCapStyle>>) {
        self.stroke_cap_style = cap.into();
    }

    pub fn set_stroke_join_style(&mut self, join: impl Into<StyleValue<StrokeJoinStyle>>) {
        self.stroke_join_style = join.into();
    }

    pub fn set_stroke_miter_limit(&mut self, limit: impl Into<StyleValue<f64>>) {
        self.stroke_miter_limit = limit.into();
    }

    /// `Unset` clears the pattern to a solid line.
    pub fn set_stroke_dash_pattern(&mut self, pattern: impl Into<StyleValue<Vec<f64>>>) {
        self.stroke_dash_pattern = match pattern.into() {
            StyleValue::Unset => StyleValue::Value(Vec::new()),
            other => other,
        };
    }

    pub fn set_stroke_dash_phase(&mut self, phase: impl Into<StyleValue<f64>>) {
        self.stroke_dash_phase = phase.into();
    }

    pub fn set_soft_mask(&mut self, mask: impl Into<StyleValue<Arc<PaintSoftMask>>>) {
        self.soft_mask = mask.into();
    }

    // ------------------------------------------------------------------
    // Derived state
    // ------------------------------------------------------------------

    /// Graphics state parameter dictionary for this style, or `None` when
    /// no property maps to one.
    pub fn serialize(&self) -> Option<String> {
        let mut entries: Vec<(Name, PdfPrimitive)> = Vec::new();
        let mut push = |key: &str, value: Option<PdfPrimitive>| {
            if let Some(value) = value {
                entries.push((Name::new(key), value));
            }
        };
        let transparency = !matches!(self.allow_transparency, StyleValue::Value(false));

        if transparency {
            push("ca", self.fill_opacity.value().map(|&v| v.into()));
            push("BM", self.blend_mode.value().map(|m| Name::new(m.pdf_name()).into()));
            push("CA", self.stroke_opacity.value().map(|&v| v.into()));
        }
        push("LW", self.stroke_width.value().map(|&v| v.into()));
        push("LC", self.stroke_cap_style.value().map(|&c| (c as u8 as f64).into()));
        push("LJ", self.stroke_join_style.value().map(|&j| (j as u8 as f64).into()));
        push("ML", self.stroke_miter_limit.value().map(|&v| v.into()));
        if transparency {
            push(
                "SMask",
                self.soft_mask.value().map(|m| PdfPrimitive::custom(&**m)),
            );
        }
        if let StyleValue::Value(pattern) = &self.stroke_dash_pattern {
            if !pattern.is_empty() {
                let phase = self.stroke_dash_phase.value().copied().unwrap_or(0.0);
                push(
                    "D",
                    Some(PdfPrimitive::Array(vec![
                        PdfPrimitive::numbers(pattern),
                        phase.into(),
                    ])),
                );
            }
        }

        if entries.is_empty() {
            return None;
        }
        entries.insert(0, (Name::new("Type"), Name::new("ExtGState").into()));
        Some(render_pdf_primitive(&PdfPrimitive::Dict(entries)))
    }

    /// Concrete paint rule, resolving `Auto` from the fill and stroke state.
    ///
    /// Stroking needs both a width and a color that are not `Unset`; filling
    /// needs a fill color. Combinations missing from the table (an unset or
    /// inherited intersection rule) fall back to stroke+fill nonzero.
    pub fn resolve_paint_rule(&self) -> PathPaintRule {
        match self.paint_rule {
            StyleValue::Value(PathPaintRule::Auto) => {
                let stroke = !self.stroke_width.is_unset() && !self.stroke_color.is_unset();
                let fill = !self.fill_color.is_unset();
                match (stroke, fill, &self.intersection_rule) {
                    (false, false, _) => PathPaintRule::DontPaint,
                    (true, false, _) => PathPaintRule::Stroke,
                    (false, true, StyleValue::Value(IntersectionRule::Nonzero)) => PathPaintRule::FillNonzero,
                    (false, true, StyleValue::Value(IntersectionRule::Evenodd)) => PathPaintRule::FillEvenodd,
                    (true, true, StyleValue::Value(IntersectionRule::Nonzero)) => {
                        PathPaintRule::StrokeFillNonzero
                    }
                    (true, true, StyleValue::Value(IntersectionRule::Evenodd)) => {
                        PathPaintRule::StrokeFillEvenodd
                    }
                    (_, _, rule) => {
                        log::debug!(
                            "no paint rule for stroke={stroke} fill={fill} intersection={rule}, \
                             using stroke+fill nonzero"
                        );
                        PathPaintRule::StrokeFillNonzero
                    }
                }
            }
            StyleValue::Value(rule) => rule,
            StyleValue::Inherit => PathPaintRule::StrokeFillNonzero,
            StyleValue::Unset => PathPaintRule::DontPaint,
        }
    }

    /// Human-readable `(property, value)` pairs for every property that is
    /// not inherited, in merge order.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let all: [(&'static str, bool, String); 16] = [
            ("paint_rule", self.paint_rule.is_inherit(), self.paint_rule.to_string()),
            (
                "allow_transparency",
                self.allow_transparency.is_inherit(),
                self.allow_transparency.to_string(),
            ),
            ("auto_close", self.auto_close.is_inherit(), self.auto_close.to_string()),
            (
                "intersection_rule",
                self.intersection_rule.is_inherit(),
                self.intersection_rule.to_string(),
            ),
            ("fill_color", self.fill_color.is_inherit(), describe_paint(&self.fill_color)),
            ("fill_opacity", self.fill_opacity.is_inherit(), self.fill_opacity.to_string()),
            ("stroke_color", self.stroke_color.is_inherit(), describe_paint(&self.stroke_color)),
            ("stroke_opacity", self.stroke_opacity.is_inherit(), self.stroke_opacity.to_string()),
            ("blend_mode", self.blend_mode.is_inherit(), self.blend_mode.to_string()),
            ("stroke_width", self.stroke_width.is_inherit(), self.stroke_width.to_string()),
            (
                "stroke_cap_style",
                self.stroke_cap_style.is_inherit(),
                self.stroke_cap_style.to_string(),
            ),
            (
                "stroke_join_style",
                self.stroke_join_style.is_inherit(),
                self.stroke_join_style.to_string(),
            ),
            (
                "stroke_miter_limit",
                self.stroke_miter_limit.is_inherit(),
                self.stroke_miter_limit.to_string(),
            ),
            (
                "stroke_dash_pattern",
                self.stroke_dash_pattern.is_inherit(),
                self.stroke_dash_pattern.to_string(),
            ),
            (
                "stroke_dash_phase",
                self.stroke_dash_phase.is_inherit(),
                self.stroke_dash_phase.to_string(),
            ),
            (
                "soft_mask",
                self.soft_mask.is_inherit(),
                match &self.soft_mask {
                    StyleValue::Value(m) => m.serialize(),
                    other => other.as_ref().map_value_to_string(),
                },
            ),
        ];
        all.into_iter()
            .filter(|(_, inherit, _)| !inherit)
            .map(|(name, _, value)| (name, value))
            .collect()
    }
}

impl<T> StyleValue<&T> {
    fn map_value_to_string(&self) -> String {
        match self {
            StyleValue::Inherit => "INHERIT".to_string(),
            StyleValue::Unset => "None".to_string(),
            StyleValue::Value(_) => "...".to_string(),
        }
    }
}

fn describe_paint(paint: &StyleValue<Paint>) -> String {
    match paint {
        StyleValue::Value(Paint::Color(c)) => c.serialize(),
        StyleValue::Value(Paint::Gradient(g)) => format!("{g}"),
        other => other.as_ref().map_value_to_string(),
    }
}

fn checked_opacity(name: &'static str, value: StyleValue<f64>) -> Result<StyleValue<f64>> {
    if let StyleValue::Value(v) = value {
        check_unit(name, v)?;
    }
    Ok(value)
}

/// Render a dash pattern and phase as a `d` operator.
pub fn render_dash(pattern: &[f64], phase: f64) -> String {
    format!(
        "{} {} d",
        render_pdf_primitive(&PdfPrimitive::numbers(pattern)),
        number_to_str(phase)
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(g: f64) -> DeviceGray {
        DeviceGray::new(g).unwrap()
    }

    #[test]
    fn test_default_is_all_inherit() {
        let s = GraphicsStyle::default();
        assert!(s.paint_rule().is_inherit());
        assert!(s.fill_color().is_inherit());
        assert!(s.stroke_dash_pattern().is_inherit());
        assert!(s.describe().is_empty());
        assert_eq!(s.serialize(), None);
    }

    #[test]
    fn test_keyword_coercion() {
        assert_eq!("f*".parse::<PathPaintRule>().unwrap(), PathPaintRule::FillEvenodd);
        assert_eq!("STROKE".parse::<PathPaintRule>().unwrap(), PathPaintRule::Stroke);
        assert_eq!("dont_paint".parse::<PathPaintRule>().unwrap(), PathPaintRule::DontPaint);
        assert_eq!("W*".parse::<ClippingPathIntersectionRule>().unwrap(), ClippingPathIntersectionRule::Evenodd);
        assert_eq!("EvenOdd".parse::<IntersectionRule>().unwrap(), IntersectionRule::Evenodd);
        assert_eq!("color_dodge".parse::<BlendMode>().unwrap(), BlendMode::ColorDodge);
        assert_eq!("HardLight".parse::<BlendMode>().unwrap(), BlendMode::HardLight);
        assert_eq!(StrokeCapStyle::try_from(2).unwrap(), StrokeCapStyle::Square);
        assert_eq!("bevel".parse::<StrokeJoinStyle>().unwrap(), StrokeJoinStyle::Bevel);
        assert!(StrokeJoinStyle::try_from(3).is_err());
        assert!(matches!(
            "sideways".parse::<BlendMode>(),
            Err(Error::UnknownKeyword { kind: "blend mode", .. })
        ));
    }

    #[test]
    fn test_color_alpha_sets_opacity() {
        let mut s = GraphicsStyle::default();
        s.set_fill_color(DeviceRGB::with_alpha(1.0, 0.0, 0.0, Some(0.5)).unwrap());
        assert_eq!(s.fill_opacity(), StyleValue::Value(0.5));
        s.set_stroke_color(DeviceGray::with_alpha(0.0, Some(0.25)).unwrap());
        assert_eq!(s.stroke_opacity(), StyleValue::Value(0.25));
    }

    #[test]
    fn test_stroke_color_defaults_width() {
        let mut s = GraphicsStyle::default();
        s.set_stroke_color(gray(0.0));
        assert_eq!(s.stroke_width(), StyleValue::Value(1.0));

        let mut s = GraphicsStyle::default();
        s.set_stroke_width(3.0);
        s.set_stroke_color(gray(0.0));
        assert_eq!(s.stroke_width(), StyleValue::Value(3.0));
    }

    #[test]
    fn test_setter_normalization() {
        let mut s = GraphicsStyle::default();
        s.set_paint_rule(StyleValue::Unset);
        assert_eq!(s.paint_rule(), StyleValue::Value(PathPaintRule::DontPaint));
        s.set_stroke_dash_pattern(StyleValue::Unset);
        assert_eq!(s.stroke_dash_pattern(), &StyleValue::Value(vec![]));
        assert!(s.set_fill_opacity(1.5).is_err());
        assert!(s.set_stroke_opacity(-0.1).is_err());
        assert!(s.set_fill_opacity(StyleValue::Unset).is_ok());
    }

    #[test]
    fn test_auto_close_truthiness() {
        let mut s = GraphicsStyle::default();
        assert!(s.auto_close_enabled());
        s.set_auto_close(false);
        assert!(!s.auto_close_enabled());
        s.set_auto_close(StyleValue::Unset);
        assert!(!s.auto_close_enabled());
        s.set_auto_close(true);
        assert!(s.auto_close_enabled());
    }

    #[test]
    fn test_merge_takes_child_unless_inherit() {
        let mut parent = GraphicsStyle::default();
        parent.set_fill_color(gray(0.5));
        parent.set_stroke_width(2.0);
        parent.set_blend_mode(BlendMode::Multiply);

        let mut child = GraphicsStyle::default();
        child.set_stroke_width(5.0);
        child.set_fill_color(StyleValue::Unset);

        let merged = GraphicsStyle::merge(&parent, &child);
        assert_eq!(merged.stroke_width(), StyleValue::Value(5.0));
        assert!(merged.fill_color().is_unset());
        assert_eq!(merged.blend_mode(), StyleValue::Value(BlendMode::Multiply));
        assert!(merged.paint_rule().is_inherit());
    }

    #[test]
    fn test_merge_associative_when_fully_set() {
        let mut a = GraphicsStyle::default();
        a.set_stroke_width(1.0);
        a.set_fill_opacity(0.2).unwrap();
        let mut b = GraphicsStyle::default();
        b.set_stroke_width(2.0);
        b.set_blend_mode(BlendMode::Screen);
        let mut c = GraphicsStyle::default();
        c.set_fill_opacity(0.9).unwrap();
        c.set_stroke_miter_limit(4.0);

        let left = GraphicsStyle::merge(&GraphicsStyle::merge(&a, &b), &c);
        let right = GraphicsStyle::merge(&a, &GraphicsStyle::merge(&b, &c));
        assert_eq!(left, right);
    }

    #[test]
    fn test_merge_keeps_side_effect_targets_independent() {
        let parent = GraphicsStyle::default();
        let mut child = GraphicsStyle::default();
        child.set_stroke_color(gray(0.0));
        child.set_stroke_width(StyleValue::Inherit);
        let merged = GraphicsStyle::merge(&parent, &child);
        assert!(merged.stroke_width().is_inherit());
    }

    #[test]
    fn test_serialize_order_and_type() {
        let mut s = GraphicsStyle::default();
        s.set_fill_opacity(0.5).unwrap();
        assert_eq!(s.serialize().unwrap(), "<< /Type /ExtGState\n/ca 0.5 >>");

        let mut s = GraphicsStyle::default();
        s.set_stroke_width(2.0);
        s.set_blend_mode(BlendMode::Multiply);
        s.set_stroke_cap_style(StrokeCapStyle::Round);
        s.set_stroke_join_style(StrokeJoinStyle::Bevel);
        s.set_stroke_opacity(0.25).unwrap();
        s.set_stroke_miter_limit(10.0);
        s.set_stroke_dash_pattern(vec![3.0, 1.0]);
        s.set_stroke_dash_phase(0.5);
        assert_eq!(
            s.serialize().unwrap(),
            "<< /Type /ExtGState\n/BM /Multiply\n/CA 0.25\n/LW 2\n/LC 1\n/LJ 2\n/ML 10\n/D [[3 1] 0.5] >>"
        );
    }

    #[test]
    fn test_serialize_without_transparency() {
        let mut s = GraphicsStyle::default();
        s.set_fill_opacity(0.5).unwrap();
        s.set_blend_mode(BlendMode::Screen);
        s.set_allow_transparency(false);
        assert_eq!(s.serialize(), None);
        s.set_stroke_width(1.5);
        assert_eq!(s.serialize().unwrap(), "<< /Type /ExtGState\n/LW 1.5 >>");
    }

    #[test]
    fn test_serialize_dash_edge_cases() {
        let mut s = GraphicsStyle::default();
        s.set_stroke_dash_pattern(Vec::<f64>::new());
        assert_eq!(s.serialize(), None);
        s.set_stroke_dash_pattern(vec![2.0]);
        assert_eq!(s.serialize().unwrap(), "<< /Type /ExtGState\n/D [[2] 0] >>");
    }

    #[test]
    fn test_resolve_paint_rule_table() {
        let mut s = GraphicsStyle::default();
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::StrokeFillNonzero);

        s.set_paint_rule(PathPaintRule::Auto);
        s.set_intersection_rule(IntersectionRule::Evenodd);
        // inherited colors and width count as present
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::StrokeFillEvenodd);

        s.set_stroke_color(StyleValue::Unset);
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::FillEvenodd);

        s.set_fill_color(StyleValue::Unset);
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::DontPaint);

        s.set_stroke_color(gray(0.0));
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::Stroke);

        s.set_stroke_width(StyleValue::Unset);
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::DontPaint);
    }

    #[test]
    fn test_resolve_paint_rule_fallback() {
        let mut s = GraphicsStyle::default();
        s.set_paint_rule(PathPaintRule::Auto);
        s.set_fill_color(gray(0.0));
        // intersection rule left inherited has no table entry
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::StrokeFillNonzero);
        s.set_paint_rule(PathPaintRule::FillEvenodd);
        assert_eq!(s.resolve_paint_rule(), PathPaintRule::FillEvenodd);
    }

    #[test]
    fn test_describe_lists_set_properties() {
        let mut s = GraphicsStyle::default();
        s.set_fill_color(gray(0.5));
        s.set_stroke_width(StyleValue::Unset);
        let d = s.describe();
        assert_eq!(d, vec![("fill_color", "0.5 g".to_string()), ("stroke_width", "None".to_string())]);
    }

    #[test]
    fn test_render_dash() {
        assert_eq!(render_dash(&[], 0.0), "[] 0 d");
        assert_eq!(render_dash(&[3.0, 1.5], 2.0), "[3 1.5] 2 d");
    }
}
