//! Presentation attributes of figures.

use std::collections::HashMap;
use std::str::FromStr;

use log::{debug, warn};

use crate::length::{to_length_inherited, Axis, LengthContext};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl From<svgtypes::Color> for Color {
    fn from(c: svgtypes::Color) -> Self {
        Self::new(c.red, c.green, c.blue)
    }
}

/// Resolved presentation attributes of one figure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Style {
    /// `None` means the figure is not filled.
    pub fill: Option<Color>,
    /// `None` means the figure is not stroked.
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    /// Group opacities multiply into this value.
    pub opacity: f64,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(Color::BLACK),
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

/// Split a `style` attribute into its declarations.
pub fn parse_style_attribute(style: &str) -> Vec<(&str, &str)> {
    style
        .split(';')
        .filter_map(|decl| {
            let mut parts = decl.splitn(2, ':');
            let name = parts.next()?.trim();
            let value = parts.next()?.trim();
            if name.is_empty() {
                None
            } else {
                Some((name, value))
            }
        })
        .collect()
}

/// Move the declarations of the `style` attribute into the attribute map.
/// Declarations win over attributes of the same name.
pub(crate) fn merge_style_attribute(attrs: &mut HashMap<String, String>) {
    if let Some(style) = attrs.remove("style") {
        for (name, value) in parse_style_attribute(&style) {
            attrs.insert(name.to_string(), value.to_string());
        }
    }
}

fn paint(value: &str, inherited: Option<Color>) -> Option<Color> {
    match svgtypes::Paint::from_str(value) {
        Ok(svgtypes::Paint::None) => None,
        Ok(svgtypes::Paint::Color(c)) => Some(c.into()),
        Ok(svgtypes::Paint::FuncIRI(link, _)) => {
            warn!("Ignoring paint server reference {:?}", link);
            inherited
        }
        Ok(other) => {
            debug!("paint: {:?} falls back to the inherited paint", other);
            inherited
        }
        Err(e) => {
            warn!("Ignoring invalid paint {:?}: {}", value, e);
            inherited
        }
    }
}

fn opacity(value: &str, inherited: f64) -> f64 {
    match svgtypes::Number::from_str(value) {
        Ok(n) => n.0.max(0.0).min(1.0),
        Err(e) => {
            warn!("Ignoring invalid opacity {:?}: {}", value, e);
            inherited
        }
    }
}

impl Style {
    /// Resolve the style of an element from its attributes and the style of
    /// its parent.
    ///
    /// `font_sizes` are the inherited font sizes, nearest first, used for
    /// `em` stroke widths.
    pub fn resolve<S: AsRef<str>>(
        parent: &Style,
        attrs: &HashMap<String, String>,
        ctx: &LengthContext,
        font_sizes: &[S],
    ) -> Style {
        let mut style = parent.clone();
        if let Some(value) = attrs.get("fill") {
            style.fill = paint(value, parent.fill);
        }
        if let Some(value) = attrs.get("stroke") {
            style.stroke = paint(value, parent.stroke);
        }
        if let Some(value) = attrs.get("stroke-width") {
            match to_length_inherited(value, Axis::Number, ctx, font_sizes) {
                Ok(width) => style.stroke_width = width,
                Err(e) => warn!("Ignoring stroke-width: {}", e),
            }
        }
        if let Some(value) = attrs.get("fill-opacity") {
            style.fill_opacity = opacity(value, parent.fill_opacity);
        }
        if let Some(value) = attrs.get("stroke-opacity") {
            style.stroke_opacity = opacity(value, parent.stroke_opacity);
        }
        if let Some(value) = attrs.get("opacity") {
            style.opacity = parent.opacity * opacity(value, 1.0);
        }
        style
    }
}
