//! Parser for the SVG `transform` attribute.

use log::trace;
use svgtypes::{TransformListParser, TransformListToken};

use crate::error::{svgtypes_offset, Error, Result};
use crate::geom::AffineTransform;

/// The `name(args...)` term around byte offset `pos`.
fn term_at(text: &str, pos: usize) -> &str {
    let start = text[..pos].rfind(')').map_or(0, |i| i + 1);
    let end = text[pos..].find(')').map_or(text.len(), |i| pos + i + 1);
    text[start..end].trim_matches(|c: char| c.is_ascii_whitespace() || c == ',')
}

fn term(token: TransformListToken) -> AffineTransform {
    match token {
        TransformListToken::Matrix { a, b, c, d, e, f } => AffineTransform::new(a, b, c, d, e, f),
        TransformListToken::Translate { tx, ty } => AffineTransform::translate(tx, ty),
        TransformListToken::Scale { sx, sy } => AffineTransform::scale(sx, sy),
        TransformListToken::Rotate { angle } => AffineTransform::rotate(angle.to_radians()),
        TransformListToken::SkewX { angle } => AffineTransform::skew_x(angle.to_radians()),
        TransformListToken::SkewY { angle } => AffineTransform::skew_y(angle.to_radians()),
    }
}

/// Parse an SVG transform list into a single affine transform.
///
/// Terms are concatenated left to right onto the identity, each one
/// post-multiplied, so the rightmost term is the first to act on a point.
/// `rotate(a cx cy)` arrives from the tokenizer as
/// `translate(cx cy) rotate(a) translate(-cx -cy)`. An empty string yields
/// the identity.
pub fn parse_transform(text: &str) -> Result<AffineTransform> {
    trace!("parse_transform");
    let mut result = AffineTransform::identity();
    for token in TransformListParser::from(text) {
        let token = token.map_err(|e| {
            Error::transform(term_at(text, svgtypes_offset(text, &e)), e.to_string())
        })?;
        trace!("parse_transform: {:?}", token);
        result = result.concat(&term(token));
    }
    if !result.is_finite() {
        return Err(Error::transform(text.trim(), "transform is not finite"));
    }
    Ok(result)
}
