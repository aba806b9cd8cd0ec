//! Error type shared by the whole crate.

use thiserror::Error;

/// Errors produced while building or serializing a drawing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A numeric input lies outside its permitted interval.
    #[error("{name} must be within its permitted range, got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    /// A color string could not be parsed.
    #[error("invalid color specification {0:?}")]
    InvalidColor(String),

    /// A keyword did not name any member of an enumeration.
    #[error("{value:?} is not a valid {kind}")]
    UnknownKeyword { kind: &'static str, value: String },

    /// Dictionary keys must be PDF names.
    #[error("dictionary keys must be Names")]
    NonNameKey,

    /// The transform has a zero determinant.
    #[error("transform with zero determinant cannot be inverted")]
    SingularTransform,

    /// A skew angle too close to a right angle.
    #[error("skew angle {0} degrees is too close to +/-90")]
    InvalidAngle(f64),

    /// CMYK colors cannot share a gradient with other color spaces.
    #[error("can't mix CMYK with other color spaces")]
    MixedColorSpaces,

    /// A gradient needs at least two colors (or one stop).
    #[error("{0}")]
    GradientColors(&'static str),

    /// Stitching bounds do not match the number of colors.
    #[error("bounds array length must be two less than the number of colors (got {bounds} bounds for {colors} colors)")]
    GradientBounds { bounds: usize, colors: usize },

    /// A radial gradient with a negative outer radius.
    #[error("outer radius must be >= 0, got {0}")]
    NegativeRadius(f64),

    /// An object-bounding-box paint was emitted for a shape with no extent.
    #[error("gradient paint in object bounding box units requires a bounding box")]
    MissingBoundingBox,

    /// A path was copied while a transform group was still open.
    #[error("cannot copy a path while it is being modified")]
    PathBeingModified,

    /// A resource was referenced before being registered.
    #[error("resource {0} has not been registered")]
    UnknownResource(String),

    /// The requested feature variant is recognized but not implemented.
    #[error("{0} is not yet supported")]
    Unsupported(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
