//! # pdf-graphics
//!
//! Vector graphics composition and PDF content stream serialization.
//!
//! A drawing is a tree of graphics contexts, painted paths and compositing
//! groups. Rendering the tree produces the operator text of a PDF content
//! stream, registering the graphics states, shadings, patterns and soft mask
//! forms it needs with a [`resources::ResourceRegistry`]. The same tree
//! reports exact bounding boxes, including stroke width.
//!
//! - Affine transforms in PDF matrix order
//! - Lines, cubic and quadratic Beziers, elliptical arcs, rectangles with
//!   rounded corners and ellipses, absolute or relative
//! - Inheritable graphics styles with explicit unset values
//! - Device colors, linear and radial gradients with alpha ramps
//! - Clipping paths and Porter-Duff compositing through soft masks
//!
//! ## Architecture
//!
//! 1. **Primitives**: numbers, points, transforms and PDF objects
//! 2. **Geometry**: path elements and their exact bounding boxes
//! 3. **Style & paint**: graphics styles, colors and gradients
//! 4. **Tree**: contexts, painted paths, composites and the drawing surface

// Phase 1: Primitives
pub mod basics;
pub mod error;
pub mod pdf_primitive;
pub mod point;
pub mod trans_affine;

// Phase 2: Geometry
pub mod bezier_arc;
pub mod bounding_rect;
pub mod curves;
pub mod ellipse;
pub mod path_element;
pub mod rounded_rect;

// Phase 3: Style & Paint
pub mod color;
pub mod gradient;
pub mod resources;
pub mod style;

// Phase 4: Drawing Tree
pub mod comp_op;
pub mod drawing_context;
pub mod graphics_context;
pub mod painted_path;

pub use error::{Error, Result};
