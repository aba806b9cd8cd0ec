//! Device color models.
//!
//! Provides the three PDF device color spaces, each with an optional alpha:
//! - `DeviceRGB`: red, green, blue in `[0, 1]`
//! - `DeviceGray`: a single gray level in `[0, 1]`
//! - `DeviceCMYK`: cyan, magenta, yellow, black in `[0, 1]`
//!
//! An alpha of `None` means "no opacity requested", which is different from
//! fully opaque: the surrounding graphics state decides.

use crate::basics::{check_unit, number_to_str};
use crate::error::{Error, Result};

fn check_alpha(a: Option<f64>) -> Result<Option<f64>> {
    a.map(|a| check_unit("alpha", a)).transpose()
}

fn serialize_components(components: &[f64], operator: &str) -> String {
    let mut out = String::new();
    for c in components {
        out.push_str(&number_to_str(*c));
        out.push(' ');
    }
    out.push_str(operator);
    out
}

// ============================================================================
// DeviceRGB
// ============================================================================

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceRGB {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: Option<f64>,
}

impl DeviceRGB {
    /// Fill operator; the stroke operator is its uppercase form.
    pub const OPERATOR: &'static str = "rg";

    pub fn new(r: f64, g: f64, b: f64) -> Result<Self> {
        Self::with_alpha(r, g, b, None)
    }

    pub fn with_alpha(r: f64, g: f64, b: f64, a: Option<f64>) -> Result<Self> {
        Ok(Self {
            r: check_unit("red component", r)?,
            g: check_unit("green component", g)?,
            b: check_unit("blue component", b)?,
            a: check_alpha(a)?,
        })
    }

    /// Components `(r, g, b)` with alpha omitted.
    pub fn colors(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Components scaled to `0..=255`.
    pub fn colors255(&self) -> [f64; 3] {
        self.colors().map(|c| c * 255.0)
    }

    pub fn serialize(&self) -> String {
        serialize_components(&self.colors(), Self::OPERATOR)
    }

    /// True when all three channels are equal, ignoring float noise.
    pub fn is_achromatic(&self) -> bool {
        (self.r - self.g).abs() < 1e-9 && (self.g - self.b).abs() < 1e-9
    }

    /// Luminance as a gray level (Rec. 709 weights). Alpha is dropped.
    pub fn to_gray(&self) -> DeviceGray {
        let g = (0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b).clamp(0.0, 1.0);
        DeviceGray { g, a: None }
    }
}

// ============================================================================
// DeviceGray
// ============================================================================

/// A gray level, 0 is black and 1 is white.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceGray {
    pub g: f64,
    pub a: Option<f64>,
}

impl DeviceGray {
    pub const OPERATOR: &'static str = "g";

    pub fn new(g: f64) -> Result<Self> {
        Self::with_alpha(g, None)
    }

    pub fn with_alpha(g: f64, a: Option<f64>) -> Result<Self> {
        Ok(Self {
            g: check_unit("gray component", g)?,
            a: check_alpha(a)?,
        })
    }

    /// The gray level expanded to `(r, g, b)`.
    pub fn colors(&self) -> [f64; 3] {
        [self.g, self.g, self.g]
    }

    pub fn serialize(&self) -> String {
        serialize_components(&[self.g], Self::OPERATOR)
    }

    /// The same level as an RGB color, keeping alpha.
    pub fn to_rgb(&self) -> DeviceRGB {
        DeviceRGB {
            r: self.g,
            g: self.g,
            b: self.g,
            a: self.a,
        }
    }
}

// ============================================================================
// DeviceCMYK
// ============================================================================

/// A CMYK process color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCMYK {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
    pub a: Option<f64>,
}

impl DeviceCMYK {
    pub const OPERATOR: &'static str = "k";

    pub fn new(c: f64, m: f64, y: f64, k: f64) -> Result<Self> {
        Self::with_alpha(c, m, y, k, None)
    }

    pub fn with_alpha(c: f64, m: f64, y: f64, k: f64, a: Option<f64>) -> Result<Self> {
        Ok(Self {
            c: check_unit("cyan component", c)?,
            m: check_unit("magenta component", m)?,
            y: check_unit("yellow component", y)?,
            k: check_unit("black component", k)?,
            a: check_alpha(a)?,
        })
    }

    pub fn colors(&self) -> [f64; 4] {
        [self.c, self.m, self.y, self.k]
    }

    pub fn serialize(&self) -> String {
        serialize_components(&self.colors(), Self::OPERATOR)
    }
}

// ============================================================================
// DeviceColor
// ============================================================================

/// Any of the device colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceColor {
    Rgb(DeviceRGB),
    Gray(DeviceGray),
    Cmyk(DeviceCMYK),
}

impl DeviceColor {
    /// Fill-color operator text, e.g. `"1 0 0 rg"`. Stroke is the
    /// uppercased form.
    pub fn serialize(&self) -> String {
        match self {
            DeviceColor::Rgb(c) => c.serialize(),
            DeviceColor::Gray(c) => c.serialize(),
            DeviceColor::Cmyk(c) => c.serialize(),
        }
    }

    pub fn alpha(&self) -> Option<f64> {
        match self {
            DeviceColor::Rgb(c) => c.a,
            DeviceColor::Gray(c) => c.a,
            DeviceColor::Cmyk(c) => c.a,
        }
    }

    /// Components in the color's own space, alpha omitted.
    pub fn components(&self) -> Vec<f64> {
        match self {
            DeviceColor::Rgb(c) => c.colors().to_vec(),
            DeviceColor::Gray(c) => vec![c.g],
            DeviceColor::Cmyk(c) => c.colors().to_vec(),
        }
    }

    /// PDF color space name.
    pub fn color_space(&self) -> &'static str {
        match self {
            DeviceColor::Rgb(_) => "DeviceRGB",
            DeviceColor::Gray(_) => "DeviceGray",
            DeviceColor::Cmyk(_) => "DeviceCMYK",
        }
    }
}

impl From<DeviceRGB> for DeviceColor {
    fn from(c: DeviceRGB) -> Self {
        DeviceColor::Rgb(c)
    }
}

impl From<DeviceGray> for DeviceColor {
    fn from(c: DeviceGray) -> Self {
        DeviceColor::Gray(c)
    }
}

impl From<DeviceCMYK> for DeviceColor {
    fn from(c: DeviceCMYK) -> Self {
        DeviceColor::Cmyk(c)
    }
}

impl std::str::FromStr for DeviceColor {
    type Err = Error;

    /// Parses `#hex` and `rgb(...)` notations.
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with('#') {
            color_from_hex_string(s)
        } else {
            color_from_rgb_string(s)
        }
    }
}

// ============================================================================
// 8-bit constructors and parsing
// ============================================================================

/// Color from 8-bit RGB(A) values.
///
/// Without alpha, equal channels collapse to a [`DeviceGray`].
pub fn rgb8(r: u32, g: u32, b: u32, a: Option<u32>) -> Result<DeviceColor> {
    if a.is_none() && r == g && g == b {
        return Ok(DeviceGray::new(r as f64 / 255.0)?.into());
    }
    Ok(DeviceRGB::with_alpha(
        r as f64 / 255.0,
        g as f64 / 255.0,
        b as f64 / 255.0,
        a.map(|a| a as f64 / 255.0),
    )?
    .into())
}

/// Gray from an 8-bit level and optional 8-bit alpha.
pub fn gray8(g: u32, a: Option<u32>) -> Result<DeviceGray> {
    DeviceGray::with_alpha(g as f64 / 255.0, a.map(|a| a as f64 / 255.0))
}

/// CMYK from 8-bit components and optional 8-bit alpha.
pub fn cmyk8(c: u32, m: u32, y: u32, k: u32, a: Option<u32>) -> Result<DeviceCMYK> {
    DeviceCMYK::with_alpha(
        c as f64 / 255.0,
        m as f64 / 255.0,
        y as f64 / 255.0,
        k as f64 / 255.0,
        a.map(|a| a as f64 / 255.0),
    )
}

/// Parse a CSS-style hex color: `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`.
///
/// Forms without an alpha field leave opacity unspecified.
pub fn color_from_hex_string(hexstr: &str) -> Result<DeviceColor> {
    let invalid = || Error::InvalidColor(hexstr.to_string());
    let digits = hexstr.strip_prefix('#').ok_or_else(invalid)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channels: Vec<u32> = match digits.len() {
        3 | 4 => digits
            .chars()
            .map(|c| c.to_digit(16).map(|v| v * 17))
            .collect::<Option<_>>()
            .ok_or_else(invalid)?,
        6 | 8 => (0..digits.len())
            .step_by(2)
            .map(|i| u32::from_str_radix(&digits[i..i + 2], 16).ok())
            .collect::<Option<_>>()
            .ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    rgb8(channels[0], channels[1], channels[2], channels.get(3).copied())
}

/// Parse a CSS-style `rgb(R, G, B)` or `rgb(R, G, B, A)` string with 8-bit
/// components. Spaces are ignored.
pub fn color_from_rgb_string(rgbstr: &str) -> Result<DeviceColor> {
    let invalid = || Error::InvalidColor(rgbstr.to_string());
    let compact: String = rgbstr.chars().filter(|c| *c != ' ').collect();
    let inner = compact
        .strip_prefix("rgb(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(invalid)?;
    let channels: Vec<u32> = inner
        .split(',')
        .map(|c| c.parse::<u32>().ok())
        .collect::<Option<_>>()
        .ok_or_else(invalid)?;
    match channels.len() {
        3 => rgb8(channels[0], channels[1], channels[2], None),
        4 => rgb8(channels[0], channels[1], channels[2], Some(channels[3])),
        _ => Err(invalid()),
    }
}

/// Loose color input accepted by [`convert_to_device_color`].
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    /// An already-built device color.
    Device(DeviceColor),
    /// A `#hex` string.
    Hex(String),
    /// An 8-bit gray level.
    Gray8(u32),
    /// 8-bit RGB components.
    Rgb8(u32, u32, u32),
}

impl From<DeviceColor> for ColorSpec {
    fn from(c: DeviceColor) -> Self {
        ColorSpec::Device(c)
    }
}

impl From<DeviceRGB> for ColorSpec {
    fn from(c: DeviceRGB) -> Self {
        ColorSpec::Device(c.into())
    }
}

impl From<DeviceGray> for ColorSpec {
    fn from(c: DeviceGray) -> Self {
        ColorSpec::Device(c.into())
    }
}

impl From<DeviceCMYK> for ColorSpec {
    fn from(c: DeviceCMYK) -> Self {
        ColorSpec::Device(c.into())
    }
}

impl From<&str> for ColorSpec {
    fn from(s: &str) -> Self {
        ColorSpec::Hex(s.to_string())
    }
}

impl From<u32> for ColorSpec {
    fn from(g: u32) -> Self {
        ColorSpec::Gray8(g)
    }
}

impl From<(u32, u32, u32)> for ColorSpec {
    fn from((r, g, b): (u32, u32, u32)) -> Self {
        ColorSpec::Rgb8(r, g, b)
    }
}

/// Normalize any [`ColorSpec`] into a device color.
///
/// Black given as RGB becomes gray, like a lone gray level does.
pub fn convert_to_device_color(spec: impl Into<ColorSpec>) -> Result<DeviceColor> {
    match spec.into() {
        ColorSpec::Device(c) => Ok(c),
        ColorSpec::Hex(s) => color_from_hex_string(&s),
        ColorSpec::Gray8(g) => Ok(DeviceGray::new(g as f64 / 255.0)?.into()),
        ColorSpec::Rgb8(0, 0, 0) => Ok(DeviceGray::new(0.0)?.into()),
        ColorSpec::Rgb8(r, g, b) => Ok(DeviceRGB::new(
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0,
        )?
        .into()),
    }
}

// ============================================================================
// Tests
// ============================================================================
