//! Resolution of SVG length literals into user-space values.

use std::str::FromStr;

use log::trace;
use svgtypes::LengthUnit;

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const PX_PER_PT: f64 = 1.25;
const PX_PER_PC: f64 = 15.0;
const PX_PER_MM: f64 = 3.543_307;
const PX_PER_CM: f64 = 35.433_07;
const PX_PER_IN: f64 = 90.0;

/// Nested `em` font sizes are followed at most this deep.
pub const MAX_EM_DEPTH: usize = 32;

/// Font size used for `em` when no `font-size` is inherited.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// The axis a length is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    Width,
    Height,
    /// Radii and other lengths not tied to one axis.
    Number,
}

/// The `viewBox` attribute of an `svg` element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Parse a viewBox string like "0 0 100 100".
///
/// Returns `None` if a number is missing or invalid, or if the extent is not
/// positive.
pub fn parse_view_box(text: &str) -> Option<ViewBox> {
    match svgtypes::ViewBox::from_str(text) {
        Ok(vb) => Some(ViewBox {
            min_x: vb.x,
            min_y: vb.y,
            width: vb.w,
            height: vb.h,
        }),
        Err(e) => {
            trace!("parse_view_box: {:?}: {}", text, e);
            None
        }
    }
}

/// Scale factors in effect while resolving the lengths of one document.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LengthContext {
    /// User units per percent along the width axis.
    pub width_percent: f64,
    /// User units per percent along the height axis.
    pub height_percent: f64,
    /// User units per unitless number along the width axis.
    pub width_factor: f64,
    /// User units per unitless number along the height axis.
    pub height_factor: f64,
    pub default_font_size: f64,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self::identity()
    }
}

impl LengthContext {
    pub fn identity() -> Self {
        Self::from_factors(1.0, 1.0, 1.0, 1.0)
    }

    pub fn from_factors(
        width_percent: f64,
        height_percent: f64,
        width_factor: f64,
        height_factor: f64,
    ) -> Self {
        Self {
            width_percent,
            height_percent,
            width_factor,
            height_factor,
            default_font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Derive the factors from a viewport size and an optional viewBox.
    ///
    /// Percentages refer to the viewport. Unitless numbers are in viewBox
    /// units and are scaled to the viewport; without a usable viewBox they
    /// are taken as-is.
    pub fn new(viewport_width: f64, viewport_height: f64, view_box: Option<ViewBox>) -> Self {
        let factor = |viewport: f64, extent: f64| {
            if extent > 0.0 && viewport > 0.0 {
                viewport / extent
            } else {
                1.0
            }
        };
        let (width_factor, height_factor) = match view_box {
            Some(vb) => (
                factor(viewport_width, vb.width),
                factor(viewport_height, vb.height),
            ),
            None => (1.0, 1.0),
        };
        Self::from_factors(
            viewport_width / 100.0,
            viewport_height / 100.0,
            width_factor,
            height_factor,
        )
    }

    pub fn with_default_font_size(mut self, size: f64) -> Self {
        self.default_font_size = size;
        self
    }

    pub fn percent_factor(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Width => self.width_percent,
            Axis::Height => self.height_percent,
            Axis::Number => 1.0,
        }
    }

    pub fn length_factor(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Width => self.width_factor,
            Axis::Height => self.height_factor,
            Axis::Number => self.width_factor.min(self.height_factor),
        }
    }

    /// The factor applied to raw numbers in path data and point lists.
    pub fn number_factor(&self) -> f64 {
        self.length_factor(Axis::Number)
    }
}

/// Resolve a length literal such as `12`, `50%` or `3mm` along `axis`.
///
/// An empty string resolves to `0.0`. `em` lengths use the context's default
/// font size; see [`to_length_inherited`] to supply inherited font sizes.
pub fn to_length(raw: &str, axis: Axis, ctx: &LengthContext) -> Result<f64> {
    resolve::<&str>(raw, axis, ctx, &[], 0)
}

/// Like [`to_length`], with the inherited `font-size` values for `em`.
///
/// `font_sizes` lists the declared font sizes nearest-first, starting with the
/// element's own. A font size given in `em` is resolved against the next one
/// up the chain.
pub fn to_length_inherited<S: AsRef<str>>(
    raw: &str,
    axis: Axis,
    ctx: &LengthContext,
    font_sizes: &[S],
) -> Result<f64> {
    resolve(raw, axis, ctx, font_sizes, 0)
}

fn resolve<S: AsRef<str>>(
    raw: &str,
    axis: Axis,
    ctx: &LengthContext,
    font_sizes: &[S],
    depth: usize,
) -> Result<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    let length = svgtypes::Length::from_str(text).map_err(|e| Error::length(raw, e.to_string()))?;
    let factor = match length.unit {
        LengthUnit::None => ctx.length_factor(axis),
        LengthUnit::Percent => ctx.percent_factor(axis),
        LengthUnit::Px => 1.0,
        LengthUnit::Pt => PX_PER_PT,
        LengthUnit::Pc => PX_PER_PC,
        LengthUnit::Mm => PX_PER_MM,
        LengthUnit::Cm => PX_PER_CM,
        LengthUnit::In => PX_PER_IN,
        LengthUnit::Em => em_factor(raw, ctx, font_sizes, depth)?,
        _ => return Err(Error::length(raw, "unsupported unit")),
    };
    if !factor.is_finite() {
        return Err(Error::length(
            raw,
            format!("no usable scale factor for the {:?} axis", axis),
        ));
    }
    trace!("resolve: {:?} on {:?} -> factor {}", raw, axis, factor);
    Ok(length.number * factor)
}

fn em_factor<S: AsRef<str>>(
    raw: &str,
    ctx: &LengthContext,
    font_sizes: &[S],
    depth: usize,
) -> Result<f64> {
    if depth >= MAX_EM_DEPTH {
        return Err(Error::length(raw, "font-size nested too deeply"));
    }
    match font_sizes.split_first() {
        Some((size, inherited)) => resolve(size.as_ref(), Axis::Number, ctx, inherited, depth + 1),
        None => Ok(ctx.default_font_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::approx_eq;

    #[test]
    fn test_percent() {
        let ctx = LengthContext::from_factors(2.0, 3.0, 1.0, 1.0);
        assert_eq!(to_length("50%", Axis::Width, &ctx), Ok(100.0));
        assert_eq!(to_length("50%", Axis::Height, &ctx), Ok(150.0));
        assert_eq!(to_length("50%", Axis::Number, &ctx), Ok(50.0));
    }

    #[test]
    fn test_empty() {
        let ctx = LengthContext::from_factors(2.0, 3.0, 1.0, 1.0);
        assert_eq!(to_length("", Axis::Width, &ctx), Ok(0.0));
        assert_eq!(to_length("   ", Axis::Height, &ctx), Ok(0.0));
    }

    #[test]
    fn test_units() {
        let ctx = LengthContext::from_factors(2.0, 3.0, 4.0, 5.0);
        assert_eq!(to_length("12pt", Axis::Number, &ctx), Ok(15.0));
        assert_eq!(to_length("10px", Axis::Width, &ctx), Ok(10.0));
        assert_eq!(to_length("2pc", Axis::Width, &ctx), Ok(30.0));
        assert_eq!(to_length("1in", Axis::Height, &ctx), Ok(90.0));
        assert!(approx_eq(to_length("10mm", Axis::Width, &ctx).unwrap(), 35.43307));
        assert!(approx_eq(to_length("1cm", Axis::Width, &ctx).unwrap(), 35.43307));
    }

    #[test]
    fn test_unitless_uses_length_factor() {
        let ctx = LengthContext::from_factors(1.0, 1.0, 4.0, 5.0);
        assert_eq!(to_length("3", Axis::Width, &ctx), Ok(12.0));
        assert_eq!(to_length("3", Axis::Height, &ctx), Ok(15.0));
        assert_eq!(to_length("3", Axis::Number, &ctx), Ok(12.0));
        assert_eq!(to_length(" -1.5e1 ", Axis::Width, &ctx), Ok(-60.0));
    }

    #[test]
    fn test_em() {
        let ctx = LengthContext::identity().with_default_font_size(10.0);
        assert_eq!(to_length("2em", Axis::Width, &ctx), Ok(20.0));
        assert_eq!(
            to_length_inherited("2em", Axis::Width, &ctx, &["1.5em", "3em", "4pt"]),
            Ok(2.0 * 1.5 * 3.0 * 5.0)
        );
        // The chain runs out: the default font size applies.
        assert_eq!(
            to_length_inherited("1em", Axis::Width, &ctx, &["2em"]),
            Ok(20.0)
        );
    }

    #[test]
    fn test_em_depth_cap() {
        let ctx = LengthContext::identity();
        let chain = vec!["1em".to_string(); MAX_EM_DEPTH + 8];
        assert!(matches!(
            to_length_inherited("1em", Axis::Number, &ctx, &chain),
            Err(Error::UnresolvableLength { .. })
        ));
        let chain = vec!["1em".to_string(); MAX_EM_DEPTH - 1];
        assert_eq!(
            to_length_inherited("1em", Axis::Number, &ctx, &chain),
            Ok(DEFAULT_FONT_SIZE)
        );
    }

    #[test]
    fn test_unresolvable() {
        let ctx = LengthContext::identity();
        assert!(matches!(
            to_length("3ex", Axis::Width, &ctx),
            Err(Error::UnresolvableLength { .. })
        ));
        assert!(matches!(
            to_length("3 apples", Axis::Width, &ctx),
            Err(Error::UnresolvableLength { .. })
        ));
        let broken = LengthContext::from_factors(f64::NAN, 1.0, 1.0, 1.0);
        assert_eq!(
            to_length("10%", Axis::Width, &broken),
            Err(Error::length("10%", "no usable scale factor for the Width axis"))
        );
    }

    #[test]
    fn test_context_from_viewport() {
        let vb = parse_view_box("0 0 50 200").unwrap();
        let ctx = LengthContext::new(100.0, 100.0, Some(vb));
        assert_eq!(ctx.percent_factor(Axis::Width), 1.0);
        assert_eq!(ctx.length_factor(Axis::Width), 2.0);
        assert_eq!(ctx.length_factor(Axis::Height), 0.5);
        assert_eq!(ctx.number_factor(), 0.5);
        assert_eq!(ctx.percent_factor(Axis::Number), 1.0);

        let ctx = LengthContext::new(300.0, 200.0, None);
        assert_eq!(ctx.percent_factor(Axis::Height), 2.0);
        assert_eq!(ctx.number_factor(), 1.0);

        let ctx = LengthContext::new(300.0, 200.0, parse_view_box("0 0 0 0"));
        assert_eq!(ctx.number_factor(), 1.0);
    }

    #[test]
    fn test_parse_view_box() {
        assert_eq!(
            parse_view_box("-10, 5 100 50.5"),
            Some(ViewBox {
                min_x: -10.0,
                min_y: 5.0,
                width: 100.0,
                height: 50.5,
            })
        );
        assert_eq!(parse_view_box("0 0 100"), None);
        assert_eq!(parse_view_box("0 0 -1 10"), None);
        assert_eq!(parse_view_box("0 0 0 10"), None);
        assert_eq!(parse_view_box("a b c d"), None);
    }
}
