//! Read an SVG document into figures.
//!
//! The XML tree is walked with `quick-xml`. The root `svg` element fixes the
//! length context of the whole document; groups contribute transforms and
//! inherited presentation attributes; shape elements become [`Figure`]s.

use std::collections::HashMap;
use std::str;

use log::{debug, trace, warn};
use quick_xml::events::{BytesStart, Event};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bezier::BezierPath;
use crate::error::{Error, Result};
use crate::geom::{AffineTransform, Point};
use crate::length::{
    parse_view_box, to_length, to_length_inherited, Axis, LengthContext, ViewBox,
    DEFAULT_FONT_SIZE,
};
use crate::path_data::parse_path_data;
use crate::style::{merge_style_attribute, Style};
use crate::transform::parse_transform;

/// Magic number for approximating a quarter ellipse with a cubic curve.
const KAPPA: f64 = 0.552_284_749_8;

/// Settings for [`read_document`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    /// Font size for `em` lengths when no `font-size` is inherited.
    pub default_font_size: f64,
    /// Viewport used when the root has neither a size nor a viewBox.
    pub default_viewport: (f64, f64),
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE,
            default_viewport: (640.0, 480.0),
        }
    }
}

/// The SVG element a figure was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FigureKind {
    Path,
    Polygon,
    Polyline,
    Line,
    Rect,
    Circle,
    Ellipse,
}

impl FigureKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "path" => Some(FigureKind::Path),
            "polygon" => Some(FigureKind::Polygon),
            "polyline" => Some(FigureKind::Polyline),
            "line" => Some(FigureKind::Line),
            "rect" => Some(FigureKind::Rect),
            "circle" => Some(FigureKind::Circle),
            "ellipse" => Some(FigureKind::Ellipse),
            _ => None,
        }
    }
}

/// A drawable shape read from the document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Figure {
    pub id: Option<String>,
    pub kind: FigureKind,
    /// Subpaths in the figure's own coordinate system.
    pub paths: Vec<BezierPath>,
    /// Maps figure coordinates to document coordinates.
    pub transform: AffineTransform,
    pub style: Style,
}

impl Figure {
    /// The subpaths in document coordinates.
    pub fn transformed_paths(&self) -> Vec<BezierPath> {
        self.paths
            .iter()
            .map(|path| path.transform(&self.transform))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Document {
    /// Viewport width in user units.
    pub width: f64,
    /// Viewport height in user units.
    pub height: f64,
    pub view_box: Option<ViewBox>,
    pub context: LengthContext,
    pub figures: Vec<Figure>,
}

impl Document {
    /// Flatten every figure, transform applied, into polylines.
    pub fn polylines(&self, tolerance: f64) -> Vec<Vec<Point>> {
        self.figures
            .iter()
            .flat_map(Figure::transformed_paths)
            .map(|path| path.flatten(tolerance))
            .collect()
    }
}

/// State inherited from an open element by its children.
#[derive(Debug, Clone)]
struct Frame {
    transform: AffineTransform,
    style: Style,
    /// The `font-size` declared on this element, if any.
    font_size: Option<String>,
    /// Inside an element whose children are never drawn directly.
    not_rendered: bool,
}

/// Containers whose content is only drawn through a reference.
const NON_RENDERING: &[&str] = &["defs", "clipPath", "mask", "symbol", "marker", "pattern"];

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name()).into_owned()
}

fn element_attributes(e: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().filter_map(std::result::Result::ok) {
        let key = match str::from_utf8(attr.key) {
            Ok(key) => key.to_string(),
            Err(_) => continue,
        };
        let value = attr
            .unescaped_value()
            .ok()
            .and_then(|v| str::from_utf8(&v).map(str::to_string).ok());
        if let Some(value) = value {
            // If an attribute is repeated, the first one wins.
            attrs.entry(key).or_insert(value);
        }
    }
    merge_style_attribute(&mut attrs);
    attrs
}

/// Viewport extent of the root along one axis.
fn viewport_extent(
    value: Option<&String>,
    axis: Axis,
    view_box_extent: Option<f64>,
    default: f64,
) -> f64 {
    let fallback = view_box_extent.filter(|e| *e > 0.0).unwrap_or(default);
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() && !v.ends_with('%') => {
            match to_length(v, axis, &LengthContext::identity()) {
                Ok(extent) if extent > 0.0 => extent,
                Ok(_) => fallback,
                Err(e) => {
                    warn!("Ignoring root {:?}: {}", axis, e);
                    fallback
                }
            }
        }
        _ => fallback,
    }
}

fn read_root(attrs: &HashMap<String, String>, options: &ReadOptions) -> (Document, Frame) {
    let view_box = attrs.get("viewBox").and_then(|v| {
        let vb = parse_view_box(v);
        if vb.is_none() {
            warn!("Ignoring malformed viewBox {:?}", v);
        }
        vb
    });
    let width = viewport_extent(
        attrs.get("width"),
        Axis::Width,
        view_box.map(|vb| vb.width),
        options.default_viewport.0,
    );
    let height = viewport_extent(
        attrs.get("height"),
        Axis::Height,
        view_box.map(|vb| vb.height),
        options.default_viewport.1,
    );
    let context =
        LengthContext::new(width, height, view_box).with_default_font_size(options.default_font_size);
    debug!(
        "read_root: viewport {}x{}, view box {:?}, context {:?}",
        width, height, view_box, context
    );

    let scale = context.number_factor();
    let transform = view_box.map_or_else(AffineTransform::identity, |vb| {
        AffineTransform::translate(-vb.min_x * scale, -vb.min_y * scale)
    });
    let font_size = attrs.get("font-size").cloned();
    let font_sizes: Vec<&str> = font_size.iter().map(String::as_str).collect();
    let style = Style::resolve(&Style::default(), attrs, &context, &font_sizes);
    let frame = Frame {
        transform,
        style,
        font_size,
        not_rendered: false,
    };
    let document = Document {
        width,
        height,
        view_box,
        context,
        figures: Vec::new(),
    };
    (document, frame)
}

/// Resolves the geometry attributes of one element.
struct Geometry<'a> {
    attrs: &'a HashMap<String, String>,
    ctx: &'a LengthContext,
    font_sizes: &'a [&'a str],
}

impl<'a> Geometry<'a> {
    fn length(&self, name: &str, axis: Axis) -> Result<f64> {
        let raw = self.attrs.get(name).map_or("", String::as_str);
        to_length_inherited(raw, axis, self.ctx, self.font_sizes)
    }

    fn optional_length(&self, name: &str, axis: Axis) -> Result<Option<f64>> {
        match self.attrs.get(name) {
            Some(_) => self.length(name, axis).map(Some),
            None => Ok(None),
        }
    }

    /// Build the subpaths of a figure. `None` means the element renders
    /// nothing (no path data, zero size).
    fn paths(&self, kind: FigureKind) -> Result<Option<Vec<BezierPath>>> {
        let scale = self.ctx.number_factor();
        let paths = match kind {
            FigureKind::Path => match self.attrs.get("d") {
                Some(d) => parse_path_data(d, scale)?,
                None => return Ok(None),
            },
            FigureKind::Polygon | FigureKind::Polyline => {
                let points = self.attrs.get("points").map_or("", String::as_str);
                if points.trim().is_empty() {
                    return Ok(None);
                }
                let close = if kind == FigureKind::Polygon { " Z" } else { "" };
                parse_path_data(&format!("M {}{}", points, close), scale)?
            }
            FigureKind::Line => {
                let mut path = BezierPath::new(Point::new(
                    self.length("x1", Axis::Width)?,
                    self.length("y1", Axis::Height)?,
                ));
                path.line_to(Point::new(
                    self.length("x2", Axis::Width)?,
                    self.length("y2", Axis::Height)?,
                ));
                vec![path]
            }
            FigureKind::Rect => {
                let x = self.length("x", Axis::Width)?;
                let y = self.length("y", Axis::Height)?;
                let w = self.length("width", Axis::Width)?;
                let h = self.length("height", Axis::Height)?;
                if w <= 0.0 || h <= 0.0 {
                    return Ok(None);
                }
                let rx = self.optional_length("rx", Axis::Width)?;
                let ry = self.optional_length("ry", Axis::Height)?;
                let (rx, ry) = match (rx, ry) {
                    (Some(rx), Some(ry)) => (rx, ry),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (None, None) => (0.0, 0.0),
                };
                vec![rect_path(x, y, w, h, rx.max(0.0).min(w / 2.0), ry.max(0.0).min(h / 2.0))]
            }
            FigureKind::Circle => {
                let r = self.length("r", Axis::Number)?;
                if r <= 0.0 {
                    return Ok(None);
                }
                let cx = self.length("cx", Axis::Width)?;
                let cy = self.length("cy", Axis::Height)?;
                vec![ellipse_path(cx, cy, r, r)]
            }
            FigureKind::Ellipse => {
                let rx = self.length("rx", Axis::Width)?;
                let ry = self.length("ry", Axis::Height)?;
                if rx <= 0.0 || ry <= 0.0 {
                    return Ok(None);
                }
                let cx = self.length("cx", Axis::Width)?;
                let cy = self.length("cy", Axis::Height)?;
                vec![ellipse_path(cx, cy, rx, ry)]
            }
        };
        Ok(Some(paths))
    }
}

#[allow(clippy::many_single_char_names)]
fn rect_path(x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> BezierPath {
    if rx <= 0.0 || ry <= 0.0 {
        let mut path = BezierPath::new(Point::new(x, y));
        path.line_to(Point::new(x + w, y));
        path.line_to(Point::new(x + w, y + h));
        path.line_to(Point::new(x, y + h));
        path.close();
        return path;
    }
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let (right, bottom) = (x + w, y + h);
    let mut path = BezierPath::new(Point::new(x + rx, y));
    path.line_to(Point::new(right - rx, y));
    path.curve_to(
        Point::new(right - rx + kx, y),
        Point::new(right, y + ry - ky),
        Point::new(right, y + ry),
    );
    path.line_to(Point::new(right, bottom - ry));
    path.curve_to(
        Point::new(right, bottom - ry + ky),
        Point::new(right - rx + kx, bottom),
        Point::new(right - rx, bottom),
    );
    path.line_to(Point::new(x + rx, bottom));
    path.curve_to(
        Point::new(x + rx - kx, bottom),
        Point::new(x, bottom - ry + ky),
        Point::new(x, bottom - ry),
    );
    path.line_to(Point::new(x, y + ry));
    path.curve_to(
        Point::new(x, y + ry - ky),
        Point::new(x + rx - kx, y),
        Point::new(x + rx, y),
    );
    path.close();
    path
}

fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> BezierPath {
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let mut path = BezierPath::new(Point::new(cx + rx, cy));
    path.curve_to(
        Point::new(cx + rx, cy + ky),
        Point::new(cx + kx, cy + ry),
        Point::new(cx, cy + ry),
    );
    path.curve_to(
        Point::new(cx - kx, cy + ry),
        Point::new(cx - rx, cy + ky),
        Point::new(cx - rx, cy),
    );
    path.curve_to(
        Point::new(cx - rx, cy - ky),
        Point::new(cx - kx, cy - ry),
        Point::new(cx, cy - ry),
    );
    path.curve_to(
        Point::new(cx + kx, cy - ry),
        Point::new(cx + rx, cy - ky),
        Point::new(cx + rx, cy),
    );
    path.close();
    path
}

/// Handle one start or empty element and return the frame its children
/// inherit.
fn visit(
    e: &BytesStart,
    document: &mut Option<Document>,
    stack: &[Frame],
    options: &ReadOptions,
) -> Result<Frame> {
    let name = element_name(e);
    let attrs = element_attributes(e);
    trace!("visit: <{}>", name);

    let doc = match document {
        Some(doc) => doc,
        None => {
            if name != "svg" {
                return Err(Error::SvgParse(format!(
                    "Expecting <svg> root element, found <{}>",
                    name
                )));
            }
            let (doc, frame) = read_root(&attrs, options);
            *document = Some(doc);
            return Ok(frame);
        }
    };
    let parent = stack
        .last()
        .ok_or_else(|| Error::SvgParse(format!("Unexpected <{}> after the root element", name)))?;

    let font_size = attrs.get("font-size").cloned();
    let font_sizes: Vec<&str> = font_size
        .iter()
        .map(String::as_str)
        .chain(stack.iter().rev().filter_map(|f| f.font_size.as_deref()))
        .collect();
    let ctx = doc.context;
    let style = Style::resolve(&parent.style, &attrs, &ctx, &font_sizes);
    let transform = match attrs.get("transform") {
        Some(t) => parse_transform(t).map(|t| parent.transform.concat(&t)),
        None => Ok(parent.transform),
    };

    let not_rendered = parent.not_rendered || NON_RENDERING.contains(&name.as_str());
    match FigureKind::from_name(&name).filter(|_| !not_rendered) {
        Some(kind) => {
            let geometry = Geometry {
                attrs: &attrs,
                ctx: &ctx,
                font_sizes: &font_sizes,
            };
            let figure = transform
                .clone()
                .and_then(|t| geometry.paths(kind).map(|paths| (t, paths)));
            match figure {
                Ok((transform, Some(paths))) => {
                    trace!("visit: <{}> has {} subpaths", name, paths.len());
                    doc.figures.push(Figure {
                        id: attrs.get("id").cloned(),
                        kind,
                        paths,
                        transform,
                        style: style.clone(),
                    });
                }
                Ok((_, None)) => debug!("Skipping empty <{}>", name),
                Err(e) => warn!("Skipping <{}>: {}", name, e),
            }
        }
        None => {
            if let Err(e) = &transform {
                warn!("Ignoring transform of <{}>: {}", name, e);
            }
        }
    }

    Ok(Frame {
        transform: transform.unwrap_or(parent.transform),
        style,
        font_size,
        not_rendered,
    })
}

/// Parse an SVG document into figures.
///
/// A figure whose path data, transform or lengths cannot be parsed is logged
/// and skipped. Only malformed XML or a root element other than `svg` fails
/// the whole read.
pub fn read_document(svg: &str, options: &ReadOptions) -> Result<Document> {
    trace!("read_document");

    let mut reader = quick_xml::Reader::from_str(svg);
    reader.trim_text(true);

    let mut document = None;
    let mut stack: Vec<Frame> = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let frame = visit(e, &mut document, &stack, options)?;
                stack.push(frame);
            }
            Ok(Event::Empty(ref e)) => {
                visit(e, &mut document, &stack, options)?;
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => {
                trace!("read_document: EOF");
                break;
            }
            Ok(_) => {}
            Err(e) => return Err(Error::SvgParse(format!("Error when parsing XML: {}", e))),
        }

        // If we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
        buf.clear();
    }

    let document =
        document.ok_or_else(|| Error::SvgParse("Expecting <svg> root element".to_string()))?;
    trace!("read_document: {} figures", document.figures.len());
    Ok(document)
}
