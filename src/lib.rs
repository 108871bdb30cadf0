//! Parse the geometry of SVG documents into Bézier paths and affine
//! transforms.
//!
//! The crate is built around three parsers for SVG attribute values:
//!
//! - [`parse_path_data`] turns a path data string (the `d` attribute) into a
//!   list of [`BezierPath`]s, one per subpath.
//! - [`parse_transform`] turns a `transform` attribute into a single
//!   [`AffineTransform`].
//! - [`to_length`] resolves length literals such as `50%` or `3mm` into user
//!   space values, given a [`LengthContext`].
//!
//! [`read_document`] combines them: it walks an SVG file and returns its shapes
//! as [`Figure`]s. Figures that fail to parse are logged and skipped.
//!
//! Flattening of Bézier curves is done using the
//! [Lyon](https://github.com/nical/lyon) library.
//!
//! You can optionally get serde 1 support by enabling the `serde` feature.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::single_match)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

mod bezier;
mod document;
mod error;
mod geom;
mod length;
mod path_data;
mod style;
mod transform;

use log::trace;

pub use crate::bezier::{to_path_data, BezierNode, BezierPath, C0_MASK, C1_MASK, C2_MASK};
pub use crate::document::{read_document, Document, Figure, FigureKind, ReadOptions};
pub use crate::error::{Error, Result};
pub use crate::geom::{AffineTransform, Point};
pub use crate::length::{
    parse_view_box, to_length, to_length_inherited, Axis, LengthContext, ViewBox,
    DEFAULT_FONT_SIZE, MAX_EM_DEPTH,
};
pub use crate::path_data::parse_path_data;
pub use crate::style::{parse_style_attribute, Color, Style};
pub use crate::transform::parse_transform;

/// Default tolerance for flattening curves into polylines.
pub const FLATTENING_TOLERANCE: f64 = 0.15;

/// A polyline is a vector of `Point` instances.
pub type Polyline = Vec<Point>;

/// Parse an SVG string into a vector of polylines, one per subpath.
///
/// Curves are flattened with the given tolerance; figure transforms are
/// applied.
pub fn parse(svg: &str, tolerance: f64) -> Result<Vec<Polyline>> {
    trace!("parse");
    let document = read_document(svg, &ReadOptions::default())?;
    let polylines = document.polylines(tolerance);
    trace!("parse: This results in {} polylines", polylines.len());
    Ok(polylines)
}
